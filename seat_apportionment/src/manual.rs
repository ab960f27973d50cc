/*!

This is the long-form manual for `seat_apportionment` and the `apportion` command.

## Methods

### Huntington-Hill (default)

Every entity first receives the minimum number of seats (one by default). The
remaining seats are then awarded one at a time. For each seat, the priority of an
entity holding `s` seats is

```text
population / sqrt(s * (s + 1))
```

and the seat goes to the entity with the highest priority. This is the method used
to apportion the U.S. House of Representatives. The ordered list of these awards is
the *priority list*; it is returned in `ApportionmentResult::priority_list` and
written in the JSON summary.

Priorities are compared exactly: two entities tie only when their priorities are
mathematically equal.

### Hamilton (`--hamilton`)

Each entity receives the integer part of its quota
`population * seats / total population`, and the leftover seats go to the largest
fractional parts. There is no minimum number of seats with this method.

## Ties

The tie-break mode is part of the rules:
* `largestPopulation` (default): the larger population wins, then the entity with
  fewer seats, then the name that comes first alphabetically.
* `useEntityOrder`: the entity with fewer seats wins, then the first one in the input.
* `random`: the entity with fewer seats wins, then a permutation derived from the
  seed. The same seed always produces the same permutation.

## Input formats

The input is a table with a header row. The columns are found by their header
labels (`State` and `Population` by default, case-insensitive).

### `csv`

Comma Separated Values. Population cells may contain `,` or `_` as digit
separators (for example `"39,538,223"`).

### `xlsx`

Excel spreadsheet. The first worksheet is read, unless a worksheet name is provided
with `--excel-worksheet-name`. Population cells may be numbers or text.

Rows where both cells are blank are ignored. Any other row that does not have a name
and a non-negative whole population is an error, unless `--skip-invalid-rows` is
passed, in which case the row is skipped with a warning.

## Configuration

Instead of passing all the options on the command line, a JSON file can be provided
with `--config`. Command line options take precedence over the file.

```json
{
  "outputSettings": {
    "apportionmentName": "2020 census",
    "outputFile": "apportionment_2020.json"
  },
  "inputSource": {
    "provider": "csv",
    "filePath": "census_2020.csv",
    "stateColumn": "State",
    "populationColumn": "Resident Population"
  },
  "rules": {
    "method": "huntingtonHill",
    "totalSeats": 435,
    "minimumSeats": 1,
    "tiebreakMode": "largestPopulation"
  }
}
```

The `filePath` is relative to the directory of the configuration file.

## Output

The apportionment is printed as one `Name - seats` line per entity, sorted by name.
With `--out`, a JSON summary is also written:

```json
{
  "config": { "name": "2020 census", "method": "huntingtonHill", "totalSeats": 435 },
  "results": [ { "name": "Alabama", "population": 5030053, "seats": 7 } ],
  "priorityList": [ { "seat": 51, "name": "California", "priority": 27984993.252072163 } ]
}
```

With `--reference`, the `results` of a previous summary are compared with the
computed ones and the program fails if they differ.

*/
