use thiserror::Error;

use crate::trip::TripPhase;

/// Errors returned by [crate::controller::TripController].
///
/// `NoPosition` is recoverable: retry once a fix arrives. `SummaryPending` clears
/// once the last receipt is acknowledged. `InvalidTransition` and
/// `TripInProgress` signal caller bugs and leave the state untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TripError {
    #[error("cannot start a trip without a current position")]
    NoPosition,

    #[error("the last trip receipt has not been acknowledged")]
    SummaryPending,

    #[error("cannot {action} while {state}")]
    InvalidTransition { action: &'static str, state: TripPhase },

    #[error("{setting} cannot change while a trip is running")]
    TripInProgress { setting: &'static str },

    #[error("unknown trip type `{0}`")]
    UnknownTripType(String),

    #[error("trip type `{trip_type}` has no sub-trip `{sub_trip}`")]
    UnknownSubTrip { trip_type: String, sub_trip: String },

    #[error("unknown special zone `{0}`")]
    UnknownZone(String),
}

/// Position-source failures. The controller records these as a status, never as trip errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GpsError {
    #[error("location permission denied")]
    Denied,

    #[error("location unavailable")]
    Unavailable,

    #[error("timed out waiting for a fix")]
    Timeout,
}
