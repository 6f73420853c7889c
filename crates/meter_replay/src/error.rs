use std::path::PathBuf;

use meter_core::error::TripError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed event log: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("line {line}: unknown event `{event}`")]
    UnknownEvent { line: u64, event: String },
    #[error("line {line}: `fix` needs latitude and longitude")]
    MissingCoordinates { line: u64 },
    #[error(transparent)]
    Trip(#[from] TripError),
}
