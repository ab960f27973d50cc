use clap::Parser;

/// Apportions the seats of a house among states, using the Huntington-Hill method.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The file containing the states and their populations, in CSV (.csv) or
    /// Excel (.xlsx) format. The first row must contain the 'State' and 'Population' headers.
    #[clap(value_parser)]
    pub input: Option<String>,

    /// (positive integer, default 435) The total number of seats to apportion.
    #[clap(value_parser)]
    pub seats: Option<u32>,

    /// (file path, optional) A JSON file describing the apportionment. Options passed on the
    /// command line override the values of this file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// If passed as an argument, the Hamilton (largest remainder) method is used instead of
    /// Huntington-Hill.
    #[clap(long, takes_value = false)]
    pub hamilton: bool,

    /// (default 1) The number of seats every state receives before the priority rounds.
    #[clap(long, value_parser)]
    pub minimum_seats: Option<u32>,

    /// (file path or 'stdout') If specified, a summary of the apportionment will be written in
    /// JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing a summary in JSON format. If provided, the
    /// computed seats are checked against the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use (default: the first one).
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (default State) The header of the column with the names.
    #[clap(long, value_parser)]
    pub state_column: Option<String>,

    /// (default Population) The header of the column with the populations.
    #[clap(long, value_parser)]
    pub population_column: Option<String>,

    /// If passed as an argument, rows with a missing name or an invalid population are
    /// skipped with a warning instead of stopping the program.
    #[clap(long, takes_value = false)]
    pub skip_invalid_rows: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
