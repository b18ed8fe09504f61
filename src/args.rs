use clap::Parser;

/// This program checks and tallies the votes collected with an online form.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the check: archive, voter list and column names.
    /// All the other options override what is specified in this file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The zip archive downloaded from the form service.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default Vote.csv) The name of the CSV file inside the archive.
    #[clap(long, value_parser)]
    pub entry: Option<String>,

    /// (file path) The list of valid voter ids, as a JSON array or a TOML file with a `voters` array.
    #[clap(long, value_parser)]
    pub voters: Option<String>,

    /// (default 'Voter ID') The header of the column with the voter ids.
    #[clap(long, value_parser)]
    pub voter_column: Option<String>,

    /// (default Timestamp) The header of the column with the submission times.
    #[clap(long, value_parser)]
    pub timestamp_column: Option<String>,

    /// (default "I'm voting for") The header of the column with the choices.
    #[clap(long, value_parser)]
    pub choice_column: Option<String>,

    /// (chrono format string, optional) The format of the timestamps, if none of the usual
    /// form export formats apply. Example: '%d.%m.%Y %H:%M:%S'
    #[clap(long, value_parser)]
    pub timestamp_format: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, the tally will be checked
    /// against it.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, the summary of the tally is printed in JSON format.
    #[clap(long, takes_value = false)]
    pub summary: bool,

    /// If passed as an argument, the output is not colored.
    #[clap(long, takes_value = false)]
    pub no_color: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard error.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
