use log::debug;
use seat_apportionment::*;
use snafu::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

use crate::apportion::io_common::*;
use crate::apportion::*;
use crate::args::Args;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "apportionmentName")]
    pub apportionment_name: Option<String>,
    #[serde(rename = "outputFile")]
    pub output_file: Option<String>,
}

/// The section of the summary that describes how the apportionment was run.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub name: String,
    pub method: String,
    #[serde(rename = "totalSeats")]
    pub total_seats: u32,
    #[serde(rename = "minimumSeats")]
    pub minimum_seats: u32,
    #[serde(rename = "tiebreakMode")]
    pub tiebreak_mode: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct InputSource {
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "stateColumn")]
    pub state_column: Option<String>,
    #[serde(rename = "populationColumn")]
    pub population_column: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "skipInvalidRows")]
    pub skip_invalid_rows: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    pub method: Option<String>,
    #[serde(rename = "totalSeats")]
    _total_seats: Option<JSValue>,
    #[serde(rename = "minimumSeats")]
    _minimum_seats: Option<JSValue>,
    #[serde(rename = "tiebreakMode")]
    pub tiebreak_mode: Option<String>,
    #[serde(rename = "randomSeed")]
    _random_seed: Option<JSValue>,
}

impl RulesConfig {
    pub fn total_seats(&self) -> ApResult<Option<u32>> {
        read_js_u32(&self._total_seats, "totalSeats")
    }

    pub fn minimum_seats(&self) -> ApResult<Option<u32>> {
        read_js_u32(&self._minimum_seats, "minimumSeats")
    }

    pub fn method(&self) -> ApResult<ApportionmentMethod> {
        match self.method.as_deref() {
            None | Some("huntingtonHill") => Ok(ApportionmentMethod::HuntingtonHill),
            Some("hamilton") => Ok(ApportionmentMethod::Hamilton),
            Some(x) => whatever!("unknown apportionment method: {}", x),
        }
    }

    pub fn tiebreak_mode(&self) -> ApResult<TieBreakMode> {
        match self.tiebreak_mode.as_deref() {
            None | Some("largestPopulation") => Ok(TieBreakMode::LargestPopulationThenName),
            Some("useEntityOrder") => Ok(TieBreakMode::UseEntityOrder),
            Some("random") => match read_js_u32(&self._random_seed, "randomSeed")? {
                Some(seed) => Ok(TieBreakMode::Random(seed)),
                None => whatever!("The tiebreak mode random requires a randomSeed"),
            },
            Some(x) => whatever!("unknown tiebreak mode: {}", x),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApportionmentConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "inputSource")]
    pub input_source: InputSource,
    #[serde(default)]
    pub rules: RulesConfig,
}

/// All the settings of a run, after merging the command line and the configuration file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Settings {
    pub name: String,
    pub input: InputSettings,
    pub total_seats: u32,
    pub rules: ApportionmentRules,
    pub out: Option<String>,
    pub reference: Option<String>,
}

pub fn read_config(path: &str) -> ApResult<ApportionmentConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: ApportionmentConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> ApResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// Merges the command line arguments with the configuration file, if any.
/// The command line takes precedence.
pub fn resolve_settings(args: &Args) -> ApResult<Settings> {
    let config: Option<ApportionmentConfig> = match &args.config {
        Some(p) => Some(read_config(p)?),
        None => None,
    };

    // Paths in the configuration file are relative to the file itself.
    let root_p: PathBuf = match &args.config {
        Some(p) => Path::new(p)
            .parent()
            .map(|x| x.to_path_buf())
            .context(MissingParentDirSnafu {})?,
        None => PathBuf::new(),
    };

    let source = config.as_ref().map(|c| &c.input_source);
    let rules_config: RulesConfig = config
        .as_ref()
        .map(|c| c.rules.clone())
        .unwrap_or_default();
    let output_settings: OutputSettings = config
        .as_ref()
        .map(|c| c.output_settings.clone())
        .unwrap_or_default();

    let (path, provider) = match (&args.input, source) {
        (Some(p), _) => (p.clone(), Provider::from_path(p)),
        (None, Some(s)) => {
            let p: PathBuf = root_p.join(&s.file_path);
            let p2 = p.as_path().display().to_string();
            let provider = match &s.provider {
                Some(name) => Some(
                    Provider::from_name(name)
                        .whatever_context(format!("unknown input provider: {}", name))?,
                ),
                None => Provider::from_path(&p2),
            };
            (p2, provider)
        }
        (None, None) => {
            whatever!("No input file: pass a .csv or .xlsx file, or a configuration file with --config")
        }
    };
    let provider = provider.context(UnsupportedFileTypeSnafu { path: path.as_str() })?;

    let input = InputSettings {
        provider,
        state_column: args
            .state_column
            .clone()
            .or_else(|| source.and_then(|s| s.state_column.clone()))
            .unwrap_or_else(|| DEFAULT_STATE_COLUMN.to_string()),
        population_column: args
            .population_column
            .clone()
            .or_else(|| source.and_then(|s| s.population_column.clone()))
            .unwrap_or_else(|| DEFAULT_POPULATION_COLUMN.to_string()),
        worksheet: args
            .excel_worksheet_name
            .clone()
            .or_else(|| source.and_then(|s| s.excel_worksheet_name.clone())),
        skip_invalid_rows: args.skip_invalid_rows
            || source.and_then(|s| s.skip_invalid_rows).unwrap_or(false),
        path,
    };

    let total_seats = match args.seats {
        Some(x) => x,
        None => rules_config.total_seats()?.unwrap_or(DEFAULT_SEATS),
    };
    if total_seats == 0 {
        whatever!("Invalid total seats: 0. Must be a positive integer.");
    }

    let method = if args.hamilton {
        ApportionmentMethod::Hamilton
    } else {
        rules_config.method()?
    };
    let minimum_seats = match method {
        // No guaranteed seats with a quota method.
        ApportionmentMethod::Hamilton => 0,
        ApportionmentMethod::HuntingtonHill => match args.minimum_seats {
            Some(x) => x,
            None => rules_config.minimum_seats()?.unwrap_or(1),
        },
    };
    let rules = ApportionmentRules {
        method,
        minimum_seats,
        tiebreak_mode: rules_config.tiebreak_mode()?,
    };

    let name = output_settings
        .apportionment_name
        .clone()
        .unwrap_or_else(|| simplify_file_name(&input.path));
    // An output file from the configuration is also relative to it.
    let out = match (&args.out, &output_settings.output_file) {
        (Some(o), _) => Some(o.clone()),
        (None, Some(o)) if o == STDOUT => Some(o.clone()),
        (None, Some(o)) => Some(root_p.join(o).display().to_string()),
        (None, None) => None,
    };

    Ok(Settings {
        name,
        input,
        total_seats,
        rules,
        out,
        reference: args.reference.clone(),
    })
}

fn read_js_u32(x: &Option<JSValue>, field: &str) -> ApResult<Option<u32>> {
    match x {
        None | Some(JSValue::Null) => Ok(None),
        Some(JSValue::Number(n)) => n
            .as_u64()
            .and_then(|x| u32::try_from(x).ok())
            .map(Some)
            .context(ParsingJsonNumberSnafu { field }),
        Some(JSValue::String(s)) => s
            .trim()
            .parse::<u32>()
            .ok()
            .map(Some)
            .context(ParsingJsonNumberSnafu { field }),
        _ => None.context(ParsingJsonNumberSnafu { field }),
    }
}

pub fn method_name(method: ApportionmentMethod) -> &'static str {
    match method {
        ApportionmentMethod::HuntingtonHill => "huntingtonHill",
        ApportionmentMethod::Hamilton => "hamilton",
    }
}

pub fn tiebreak_mode_name(mode: TieBreakMode) -> &'static str {
    match mode {
        TieBreakMode::LargestPopulationThenName => "largestPopulation",
        TieBreakMode::UseEntityOrder => "useEntityOrder",
        TieBreakMode::Random(_) => "random",
    }
}
