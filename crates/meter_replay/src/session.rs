//! Drives one controller through a queue of events and collects the receipts.

use std::fs::File;
use std::path::Path;

use log::{info, warn};
use meter_core::clock::ManualClock;
use meter_core::config::MeterConfig;
use meter_core::controller::TripController;
use meter_core::gps::FeedSource;
use meter_core::ledger::{EarningsLedger, SummarySink};
use meter_core::replay::{run_replay, ReplayEvent, ReplayQueue, TripAction};
use meter_core::schedule::FareTier;
use meter_core::summary::TripSummary;
use meter_core::trip::TripPhase;
use serde::Serialize;

use crate::error::ReplayError;

pub fn load_config(path: Option<&Path>) -> Result<MeterConfig, ReplayError> {
    let Some(path) = path else {
        return Ok(MeterConfig::default());
    };
    let file = File::open(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_reader(file)?)
}

/// Operator choices applied before every trip in the log.
#[derive(Debug, Clone, Default)]
pub struct FareOptions {
    pub trip_type: Option<String>,
    pub sub_trip: Option<String>,
    pub zone: Option<String>,
    pub special_tier: bool,
}

impl FareOptions {
    fn apply(&self, controller: &mut TripController<FeedSource, ManualClock>) -> Result<(), ReplayError> {
        if let Some(id) = &self.trip_type {
            controller.select_trip_type(id)?;
        }
        if let Some(id) = &self.sub_trip {
            controller.select_sub_trip(id)?;
        }
        if let Some(zone) = &self.zone {
            controller.select_special_zone(zone)?;
        }
        if self.special_tier {
            controller.set_fare_tier(FareTier::Special)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRecord {
    pub timestamp_ms: u64,
    pub action: TripAction,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub driver: String,
    pub trips: Vec<TripSummary>,
    pub rejected: Vec<RejectedRecord>,
    pub jitter_discarded: usize,
    pub daily_total: f64,
}

/// Replays `events` for `driver`. Every receipt the replay acknowledges is
/// recorded in the driver's ledger.
pub fn run_session(
    config: MeterConfig,
    options: &FareOptions,
    driver: &str,
    events: Vec<ReplayEvent>,
) -> Result<RunReport, ReplayError> {
    let start_ms = events.iter().map(|e| e.timestamp_ms).min().unwrap_or(0);
    let clock = ManualClock::starting_at(start_ms);
    let mut controller = TripController::new(config, FeedSource::default(), clock.clone());
    let mut queue = ReplayQueue::from_events(events);
    let mut ledger = EarningsLedger::default();

    let mut report = RunReport {
        driver: driver.to_string(),
        trips: Vec::new(),
        rejected: Vec::new(),
        jitter_discarded: 0,
        daily_total: 0.0,
    };

    while !queue.is_empty() {
        if controller.phase() == TripPhase::Idle {
            options.apply(&mut controller)?;
        }
        let step = run_replay(&mut controller, &clock, &mut queue, 1);
        report.jitter_discarded += step.jitter_discarded;
        for rejected in step.rejected {
            warn!("{:?} at {} rejected: {}", rejected.action, rejected.timestamp_ms, rejected.error);
            report.rejected.push(RejectedRecord {
                timestamp_ms: rejected.timestamp_ms,
                action: rejected.action,
                error: rejected.error.to_string(),
            });
        }
        for summary in step.summaries {
            ledger.driver_mut(driver).record(&summary);
            info!(
                "trip {}: {:.2} km, waiting {}, cost {:.2}",
                report.trips.len() + 1,
                summary.distance_km,
                summary.waiting_time_display(),
                summary.cost
            );
            report.trips.push(summary);
        }
    }

    if controller.phase() != TripPhase::Idle {
        warn!("log ended with the trip still {}", controller.phase());
    }
    report.daily_total = ledger.driver(driver).map(|d| d.daily_total()).unwrap_or(0.0);
    Ok(report)
}
