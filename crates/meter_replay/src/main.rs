use std::process::exit;

use clap::Parser;
use log::{error, LevelFilter};
use meter_replay::cli::{run, write_report, Cli};

fn main() {
    let cli = Cli::parse();

    let mut logger = env_logger::builder();
    logger.parse_env("METER_LOG");
    if cli.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    let result = run(&cli).and_then(|report| write_report(&report, cli.output.as_deref()));
    if let Err(err) = result {
        error!("{err}");
        eprintln!("error: {err}");
        exit(1);
    }
}
