use clap::Parser;

/// This is an interactive dashboard over election candidate data.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A configuration file in JSON format. See the manual of
    /// the candidate_stats crate for the format of this file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, optional) The file containing the candidates. Setting this option overrides
    /// the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default excel) The type of the input: excel or csv.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: first worksheet) When using a spreadsheet, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (repeatable) Keeps only the candidates from this party. All the parties are kept if not specified.
    #[clap(long, value_parser)]
    pub party: Option<Vec<String>>,

    /// (repeatable) Keeps only the candidates of this gender. All the genders are kept if not specified.
    #[clap(long, value_parser)]
    pub gender: Option<Vec<String>>,

    /// (repeatable) Keeps only the candidates from this district. All the districts are kept if not specified.
    #[clap(long, value_parser)]
    pub district: Option<Vec<String>>,

    /// (address, optional) Serves the interactive dashboard on this address, by default
    /// 127.0.0.1:8501. The selection can then be changed from the page.
    #[clap(long, value_parser, min_values = 0, default_missing_value = "127.0.0.1:8501")]
    pub serve: Option<String>,

    /// (file path or 'stdout', default dashboard.html unless serving) Where to write a static
    /// copy of the dashboard page.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or 'stdout', optional) If specified, a summary of the filtered data will be written
    /// in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub summary: Option<String>,

    /// (file path) A reference file containing a summary in JSON format. If provided, candash will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
