//! CSV event logs.
//!
//! One event per row, `timestamp_ms,event,latitude,longitude`. Coordinates are
//! only read for `fix` rows and may be left empty otherwise.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use meter_core::replay::{ReplayEvent, TripAction};
use serde::Deserialize;

use crate::error::ReplayError;

#[derive(Debug, Deserialize)]
struct EventRecord {
    timestamp_ms: u64,
    event: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

pub fn read_event_log(path: &Path) -> Result<Vec<ReplayEvent>, ReplayError> {
    let file = File::open(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_event_log(file)
}

pub fn parse_event_log<R: Read>(reader: R) -> Result<Vec<ReplayEvent>, ReplayError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut events = Vec::new();
    for (row, record) in rdr.deserialize::<EventRecord>().enumerate() {
        // Header is line 1.
        let line = row as u64 + 2;
        events.push(to_event(record?, line)?);
    }
    Ok(events)
}

fn to_event(record: EventRecord, line: u64) -> Result<ReplayEvent, ReplayError> {
    let action = match record.event.to_ascii_lowercase().as_str() {
        "start" => TripAction::Start,
        "fix" => match (record.latitude, record.longitude) {
            (Some(latitude), Some(longitude)) => TripAction::Fix { latitude, longitude },
            _ => return Err(ReplayError::MissingCoordinates { line }),
        },
        "gps_lost" => TripAction::GpsLost,
        "pause" => TripAction::Pause,
        "resume" => TripAction::Resume,
        "quick_stop" => TripAction::QuickStop,
        "service_stop" => TripAction::ServiceStop,
        "stop" => TripAction::Stop,
        "tick" => TripAction::Tick,
        _ => {
            return Err(ReplayError::UnknownEvent {
                line,
                event: record.event,
            })
        }
    };
    Ok(ReplayEvent {
        timestamp_ms: record.timestamp_ms,
        action,
    })
}
