use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::info;
use meter_core::clock::{Clock, SystemClock};
use meter_core::replay::ReplayEvent;
use meter_core::simulate::{trip_events, RouteSimulator};

use crate::error::ReplayError;
use crate::events::read_event_log;
use crate::session::{load_config, run_session, FareOptions, RunReport};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "meter_replay",
    about = "Replay taximeter trips offline",
    long_about = "Feeds recorded event logs or simulated GPS routes through the\n\
                  taximeter engine and prints every trip receipt as JSON."
)]
pub struct Cli {
    /// JSON file overriding the fare schedule, odometer or watch options
    #[arg(long, global = true, env = "METER_CONFIG")]
    pub config: Option<PathBuf>,
    /// Driver whose ledger receives the receipts
    #[arg(long, global = true, default_value = "driver-1")]
    pub driver: String,
    /// Write the report here instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,
    /// Log every fix and fare update
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(flatten)]
    pub fare: FareArgs,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Default)]
pub struct FareArgs {
    /// Trip type id from the catalog (normal, walmart, tecnologico, cristoRey, colmena)
    #[arg(long, global = true)]
    pub trip_type: Option<String>,
    /// Sub-trip id of the chosen trip type
    #[arg(long, global = true)]
    pub sub_trip: Option<String>,
    /// Special zone charged at the flat zone fare
    #[arg(long, global = true)]
    pub zone: Option<String>,
    /// Use the special fare tier
    #[arg(long, global = true)]
    pub special_tier: bool,
}

impl From<&FareArgs> for FareOptions {
    fn from(args: &FareArgs) -> Self {
        FareOptions {
            trip_type: args.trip_type.clone(),
            sub_trip: args.sub_trip.clone(),
            zone: args.zone.clone(),
            special_tier: args.special_tier,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a CSV event log (timestamp_ms,event,latitude,longitude)
    Replay {
        /// Event log path
        log: PathBuf,
    },
    /// Drive a seeded random route and stop at the end
    Simulate {
        /// Length of the true track in kilometers (0 < km <= 1000)
        #[arg(long, default_value_t = 5.0, value_parser = parse_km)]
        km: f64,
        /// RNG seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Maximum GPS error per fix in meters
        #[arg(long, default_value_t = 3.0)]
        jitter: f64,
        /// Timestamp of the first fix; defaults to now
        #[arg(long)]
        start_ms: Option<u64>,
    },
}

const MAX_SIMULATED_KM: f64 = 1_000.0;

fn parse_km(value: &str) -> Result<f64, String> {
    let km: f64 = value.parse().map_err(|_| format!("`{value}` is not a number"))?;
    if km.is_finite() && km > 0.0 && km <= MAX_SIMULATED_KM {
        Ok(km)
    } else {
        Err(format!("must be greater than 0 and at most {MAX_SIMULATED_KM}"))
    }
}

// ── execution ──────────────────────────────────────────────────────

pub fn events_for(command: &Commands) -> Result<Vec<ReplayEvent>, ReplayError> {
    match command {
        Commands::Replay { log } => {
            let events = read_event_log(log)?;
            info!("loaded {} events from {}", events.len(), log.display());
            Ok(events)
        }
        Commands::Simulate {
            km,
            seed,
            jitter,
            start_ms,
        } => {
            let start_ms = start_ms.unwrap_or_else(|| SystemClock.now_ms());
            let fixes = RouteSimulator::default()
                .with_seed(*seed)
                .with_jitter_m(*jitter)
                .fixes(km * 1000.0, start_ms);
            info!("simulated {} fixes over {km} km (seed {seed})", fixes.len());
            Ok(trip_events(&fixes))
        }
    }
}

pub fn run(cli: &Cli) -> Result<RunReport, ReplayError> {
    let config = load_config(cli.config.as_deref())?;
    let events = events_for(&cli.command)?;
    run_session(config, &FareOptions::from(&cli.fare), &cli.driver, events)
}

pub fn write_report(report: &RunReport, output: Option<&std::path::Path>) -> Result<(), ReplayError> {
    match output {
        Some(path) => {
            let file = File::create(path).map_err(|source| ReplayError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::to_writer_pretty(file, report)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, report)?;
            // A closed pipe is not worth failing the run over.
            let _ = writeln!(handle);
        }
    }
    Ok(())
}
