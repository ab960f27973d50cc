use log::{debug, info, warn};

use seat_apportionment::builder::Builder;
use seat_apportionment::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::apportion::config_reader::*;
use crate::apportion::io_common::*;
use crate::args::Args;

mod config_reader;
mod io_common;
mod io_csv;
mod io_xlsx;

/// The size of the U.S. House of Representatives.
pub const DEFAULT_SEATS: u32 = 435;

pub const STDOUT: &str = "stdout";

#[derive(Debug, Snafu)]
pub enum ApportionError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The worksheet {name:?} does not exist in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("The file {path} is empty"))]
    EmptyInputFile { path: String },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("The header of {path} has no column named {column:?}"))]
    MissingColumn { path: String, column: String },
    #[snafu(display("Line {lineno} of {path}: {reason}"))]
    InvalidRow {
        path: String,
        lineno: usize,
        reason: String,
    },
    #[snafu(display("Line {lineno} of {path}: {source}"))]
    InvalidEntity {
        source: ApportionmentErrors,
        path: String,
        lineno: usize,
    },
    #[snafu(display("No valid states with valid populations were found in {path}"))]
    NoValidRows { path: String },
    #[snafu(display("Unsupported file type for {path}. Use .csv or .xlsx"))]
    UnsupportedFileType { path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a non-negative integer for {field}"))]
    ParsingJsonNumber { field: String },
    #[snafu(display("The reference summary does not contain any results"))]
    MissingReferenceResults {},
    #[snafu(display("Cannot find the directory of the configuration file"))]
    MissingParentDir {},
    #[snafu(display("{source}"))]
    Apportionment { source: ApportionmentErrors },
    #[snafu(display(
        "Difference detected between the computed apportionment and the reference summary"
    ))]
    ReferenceMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ApResult<T> = Result<T, ApportionError>;

pub fn read_populations(input: &InputSettings) -> ApResult<Vec<ParsedRecord>> {
    info!("Attempting to read population file {:?}", input.path);
    let records = match input.provider {
        Provider::Csv => io_csv::read_csv_populations(&input.path, input)?,
        Provider::Xlsx => io_xlsx::read_excel_populations(&input.path, input)?,
    };
    info!("Read {} rows from {}", records.len(), input.path);
    Ok(records)
}

/// Checks the records and turns them into entities.
///
/// Rows where both the name and the population are blank are ignored. Other
/// invalid rows are errors, or are skipped with a warning if the input allows it.
fn build_entities(
    records: &[ParsedRecord],
    input: &InputSettings,
    rules: &ApportionmentRules,
) -> ApResult<Builder> {
    let path = input.path.as_str();
    let mut builder = Builder::new(rules).context(ApportionmentSnafu {})?;
    for pr in records.iter() {
        let name = pr.name.trim();
        let raw_population = pr.population.trim();
        if name.is_empty() && raw_population.is_empty() {
            debug!("build_entities: skipping blank line {}", pr.lineno);
            continue;
        }
        let checked = if name.is_empty() {
            Err("missing state name".to_string())
        } else {
            parse_population(raw_population)
        };
        match checked {
            Ok(population) => builder
                .add_entity(name, population)
                .context(InvalidEntitySnafu {
                    path,
                    lineno: pr.lineno,
                })?,
            Err(reason) if input.skip_invalid_rows => {
                warn!("Skipping line {} of {}: {}", pr.lineno, path, reason);
            }
            Err(reason) => {
                return InvalidRowSnafu {
                    path,
                    lineno: pr.lineno,
                    reason,
                }
                .fail();
            }
        }
    }
    if builder.entities().is_empty() {
        return NoValidRowsSnafu { path }.fail();
    }
    Ok(builder)
}

/// The entities sorted by name, ignoring the case.
fn sorted_results(result: &ApportionmentResult) -> Vec<&EntitySeats> {
    let mut res: Vec<&EntitySeats> = result.seats.iter().collect();
    res.sort_by(|es1, es2| {
        es1.name
            .to_lowercase()
            .cmp(&es2.name.to_lowercase())
            .then_with(|| es1.name.cmp(&es2.name))
    });
    res
}

pub fn format_report(result: &ApportionmentResult) -> String {
    let mut report = String::new();
    for es in sorted_results(result) {
        report.push_str(&format!("{} - {}\n", es.name, es.seats));
    }
    report
}

fn results_to_json(result: &ApportionmentResult) -> Vec<JSValue> {
    sorted_results(result)
        .iter()
        .map(|es| {
            json!({
                "name": es.name,
                "population": es.population,
                "seats": es.seats
            })
        })
        .collect()
}

fn priority_list_to_json(result: &ApportionmentResult) -> Vec<JSValue> {
    result
        .priority_list
        .iter()
        .map(|sa| {
            json!({
                "seat": sa.seat,
                "name": sa.name,
                "priority": sa.priority
            })
        })
        .collect()
}

fn build_summary_js(settings: &Settings, result: &ApportionmentResult) -> JSValue {
    let c = OutputConfig {
        name: settings.name.clone(),
        method: method_name(result.method).to_string(),
        total_seats: result.total_seats,
        minimum_seats: settings.rules.minimum_seats,
        tiebreak_mode: tiebreak_mode_name(settings.rules.tiebreak_mode).to_string(),
    };
    json!({
        "config": c,
        "results": results_to_json(result),
        "priorityList": priority_list_to_json(result)
    })
}

fn write_summary(out: &str, summary: &JSValue) -> ApResult<()> {
    let pretty_js = serde_json::to_string_pretty(summary).context(ParsingJsonSnafu {})?;
    if out == STDOUT {
        println!("{}", pretty_js);
    } else {
        info!("Writing summary to {}", out);
        fs::write(out, pretty_js).context(WritingJsonSnafu { path: out })?;
    }
    Ok(())
}

/// Compares the results of the summary with the results of a reference summary.
fn check_reference(reference_path: &str, summary: &JSValue) -> ApResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let results_ref = summary_ref
        .get("results")
        .context(MissingReferenceResultsSnafu {})?;
    let pretty_ref = serde_json::to_string_pretty(results_ref).context(ParsingJsonSnafu {})?;
    let pretty_computed =
        serde_json::to_string_pretty(&summary["results"]).context(ParsingJsonSnafu {})?;
    if pretty_ref != pretty_computed {
        warn!("Found differences with the reference {}", reference_path);
        print_diff(pretty_ref.as_str(), pretty_computed.as_str(), "\n");
        return ReferenceMismatchSnafu {}.fail();
    }
    info!("The apportionment matches the reference {}", reference_path);
    Ok(())
}

pub fn run_apportionment_cli(args: &Args) -> ApResult<()> {
    let settings = resolve_settings(args)?;
    info!("settings: {:?}", settings);

    let records = read_populations(&settings.input)?;
    let builder = build_entities(&records, &settings.input, &settings.rules)?;
    // The priority list is only needed for the summary file.
    let result = if settings.out.is_some() {
        builder.apportion(settings.total_seats)
    } else {
        builder.apportion_seats(settings.total_seats)
    }
    .context(ApportionmentSnafu {})?;

    print!("{}", format_report(&result));

    let summary = build_summary_js(&settings, &result);
    if let Some(out) = &settings.out {
        write_summary(out, &summary)?;
    }
    if let Some(reference) = &settings.reference {
        check_reference(reference, &summary)?;
    }
    Ok(())
}
