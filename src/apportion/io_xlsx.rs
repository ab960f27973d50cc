use calamine::{open_workbook, DataType, Reader, Xlsx};
use log::debug;
use snafu::prelude::*;

use crate::apportion::{io_common::*, *};

pub fn read_excel_populations(path: &str, input: &InputSettings) -> ApResult<Vec<ParsedRecord>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match &input.worksheet {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu {
                name: name.as_str(),
                path,
            })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyInputFileSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };
    // The range starts at the first non-empty row of the sheet.
    let header_lineno = wrange.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
    debug!(
        "read_excel_populations: {} rows in {}, header on line {}",
        wrange.height(),
        path,
        header_lineno
    );
    read_rows(wrange.rows(), header_lineno, input)
}

/// Reads the rows of a worksheet. The first row is the header, found on line
/// `header_lineno` of the sheet.
pub fn read_rows<'a, I>(
    mut rows: I,
    header_lineno: usize,
    input: &InputSettings,
) -> ApResult<Vec<ParsedRecord>>
where
    I: Iterator<Item = &'a [DataType]>,
{
    let path = input.path.as_str();
    let header: Vec<String> = rows
        .next()
        .context(EmptyInputFileSnafu { path })?
        .iter()
        .map(cell_to_string)
        .collect();
    debug!("read_rows: header: {:?}", header);
    let (state_idx, population_idx) = find_columns(&header, input)?;

    let mut res: Vec<ParsedRecord> = Vec::new();
    for (idx, row) in rows.enumerate() {
        let pr = ParsedRecord {
            lineno: header_lineno + idx + 1,
            name: row.get(state_idx).map(cell_to_string).unwrap_or_default(),
            population: row
                .get(population_idx)
                .map(cell_to_string)
                .unwrap_or_default(),
        };
        debug!("read_rows: {:?}", pr);
        res.push(pr);
    }
    Ok(res)
}

fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Int(i) => i.to_string(),
        // Spreadsheets store all the numbers as floats. Only whole numbers are
        // written without a fractional part, the others are rejected later.
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => format!("{}", *f as i64),
        DataType::Float(f) => f.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::Empty => "".to_string(),
        _ => format!("{:?}", cell),
    }
}
