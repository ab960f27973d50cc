// Primitives for reading CSV files.

use std::io::Read;

use log::debug;
use snafu::prelude::*;

use crate::apportion::{io_common::*, *};

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    // The header is looked up by hand to allow for case-insensitive labels.
    builder
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All);
    builder
}

pub fn read_csv_populations(path: &str, input: &InputSettings) -> ApResult<Vec<ParsedRecord>> {
    let rdr = reader_builder()
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    read_csv_records(rdr, input)
}

pub fn read_csv_records<R: Read>(
    rdr: csv::Reader<R>,
    input: &InputSettings,
) -> ApResult<Vec<ParsedRecord>> {
    let path = input.path.as_str();
    let mut records = rdr.into_records();
    let header: Vec<String> = records
        .next()
        .context(EmptyInputFileSnafu { path })?
        .context(CsvLineParseSnafu { path, lineno: 1usize })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    debug!("read_csv_records: header: {:?}", header);
    let (state_idx, population_idx) = find_columns(&header, input)?;

    let mut res: Vec<ParsedRecord> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        // Blank lines are skipped by the reader, use the recorded position when possible.
        let default_lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {
            path,
            lineno: default_lineno,
        })?;
        let lineno = line
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(default_lineno);
        let pr = ParsedRecord {
            lineno,
            name: line.get(state_idx).unwrap_or("").to_string(),
            population: line.get(population_idx).unwrap_or("").to_string(),
        };
        debug!("read_csv_records: {:?}", pr);
        res.push(pr);
    }
    Ok(res)
}
