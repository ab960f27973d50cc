use log::debug;
use snafu::prelude::*;
use std::path::Path;

use crate::apportion::*;

pub const DEFAULT_STATE_COLUMN: &str = "State";
pub const DEFAULT_POPULATION_COLUMN: &str = "Population";

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Provider {
    Csv,
    Xlsx,
}

impl Provider {
    pub fn from_name(name: &str) -> Option<Provider> {
        match name.to_lowercase().as_str() {
            "csv" => Some(Provider::Csv),
            "xlsx" | "excel" => Some(Provider::Xlsx),
            _ => None,
        }
    }

    /// Guesses the provider from the extension of the file.
    pub fn from_path(path: &str) -> Option<Provider> {
        let ext = Path::new(path).extension()?.to_str()?;
        match ext.to_lowercase().as_str() {
            "csv" => Some(Provider::Csv),
            "xlsx" => Some(Provider::Xlsx),
            _ => None,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct InputSettings {
    pub path: String,
    pub provider: Provider,
    pub state_column: String,
    pub population_column: String,
    pub worksheet: Option<String>,
    pub skip_invalid_rows: bool,
}

/// A row of the input, as read by the readers.
/// This is before checking the names and parsing the populations.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedRecord {
    // The line number in the file, starting at 1 for the header.
    pub lineno: usize,
    pub name: String,
    pub population: String,
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Returns the indexes of the name column and of the population column.
pub fn find_columns(header: &[String], input: &InputSettings) -> ApResult<(usize, usize)> {
    let find = |label: &str| -> ApResult<usize> {
        let norm = label.trim().to_lowercase();
        header
            .iter()
            .position(|h| h.trim().to_lowercase() == norm)
            .context(MissingColumnSnafu {
                path: input.path.as_str(),
                column: label,
            })
    };
    let state_idx = find(&input.state_column)?;
    let population_idx = find(&input.population_column)?;
    debug!(
        "find_columns: state column: {} population column: {}",
        state_idx, population_idx
    );
    Ok((state_idx, population_idx))
}

/// Parses a population count. The digit separators ',' and '_' are accepted.
///
/// The error is a description of the problem, for the user.
pub fn parse_population(raw: &str) -> Result<u64, String> {
    let raw = raw.trim();
    let cleaned: String = raw.chars().filter(|c| *c != ',' && *c != '_').collect();
    if cleaned.is_empty() {
        return Err("missing population".to_string());
    }
    if cleaned.starts_with('-') {
        return Err(format!("negative population {:?}", raw));
    }
    cleaned
        .parse::<u64>()
        .map_err(|_| format!("invalid population {:?}", raw))
}

#[cfg(test)]
pub mod tests {
    use super::*;

    pub fn test_input(path: &str) -> InputSettings {
        InputSettings {
            path: path.to_string(),
            provider: Provider::Csv,
            state_column: DEFAULT_STATE_COLUMN.to_string(),
            population_column: DEFAULT_POPULATION_COLUMN.to_string(),
            worksheet: None,
            skip_invalid_rows: false,
        }
    }

    #[test]
    fn providers() {
        assert_eq!(Provider::from_path("data/1990census.CSV"), Some(Provider::Csv));
        assert_eq!(Provider::from_path("census2020.xlsx"), Some(Provider::Xlsx));
        assert_eq!(Provider::from_path("census2020.xls"), None);
        assert_eq!(Provider::from_path("census"), None);
        assert_eq!(Provider::from_name("Excel"), Some(Provider::Xlsx));
    }

    #[test]
    fn populations() {
        assert_eq!(parse_population(" 39,538,223 "), Ok(39_538_223));
        assert_eq!(parse_population("1_000"), Ok(1000));
        assert_eq!(parse_population("0"), Ok(0));
        assert!(parse_population("").is_err());
        assert!(parse_population("-12").is_err());
        assert!(parse_population("12.5").is_err());
        assert!(parse_population("many").is_err());
    }

    #[test]
    fn columns_are_case_insensitive() {
        let header: Vec<String> = vec![" population ", "Area", "STATE"]
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(find_columns(&header, &test_input("x.csv")).unwrap(), (2, 0));
        let header: Vec<String> = vec!["Name".to_string(), "Population".to_string()];
        assert!(find_columns(&header, &test_input("x.csv")).is_err());
    }
}
