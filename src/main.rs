mod args;
mod ballots;

use clap::Parser;
use log::{debug, warn};

use std::error::Error;
use std::io::IsTerminal;
use std::process::exit;

use crate::args::Args;
use crate::ballots::config_reader::{read_config, CheckConfig};
use crate::ballots::report::ConsoleReporter;
use crate::ballots::{run_ballot_check, BallotError, BallotResult};

fn build_config(args: &Args) -> BallotResult<CheckConfig> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => CheckConfig::default(),
    };
    let overrides = [
        (&args.input, &mut config.archive_path),
        (&args.entry, &mut config.entry_name),
        (&args.voters, &mut config.voter_list_path),
        (&args.voter_column, &mut config.voter_column),
        (&args.timestamp_column, &mut config.timestamp_column),
        (&args.choice_column, &mut config.choice_column),
    ];
    for (arg, field) in overrides {
        if let Some(value) = arg {
            *field = value.clone();
        }
    }
    if args.timestamp_format.is_some() {
        config.timestamp_format = args.timestamp_format.clone();
    }
    Ok(config)
}

fn report_error(e: &BallotError) -> ! {
    warn!("Error occured {:?}", e);
    eprintln!("An error occured: {}", e);
    let mut source = e.source();
    while let Some(s) = source {
        eprintln!("  caused by: {}", s);
        source = s.source();
    }
    exit(e.exit_code())
}

fn main() {
    let args = Args::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();
    debug!("args: {:?}", args);

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => report_error(&e),
    };
    debug!("config: {:?}", config);

    let color = !args.no_color && std::io::stdout().is_terminal();
    let mut reporter = ConsoleReporter::new(std::io::stdout(), color);
    if let Err(e) = run_ballot_check(&config, args.reference.clone(), args.summary, &mut reporter) {
        report_error(&e);
    }
}
