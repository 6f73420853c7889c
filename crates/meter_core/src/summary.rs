//! Trip receipts.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::pricing::FareBreakdown;
use crate::schedule::FareTier;
use crate::surcharges::{
    ExtraPassengersConfig, PetConfig, SpecialServiceConfig, SpecialZoneSelection, StopAggregate,
};
use crate::trip::{FareSelection, TripState};

/// Immutable receipt for one completed trip. Every field is an owned copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripSummary {
    pub trip_type: String,
    pub sub_trip: Option<String>,
    pub tier: FareTier,
    pub distance_km: f64,
    pub raw_distance_km: f64,
    pub waiting_time_secs: u64,
    pub cost: f64,
    pub stopped_at_ms: u64,
    pub timestamp: String,
    pub special_zone: SpecialZoneSelection,
    pub pet: PetConfig,
    pub special_service: SpecialServiceConfig,
    pub extra_passengers: ExtraPassengersConfig,
    pub stops: StopAggregate,
    pub breakdown: FareBreakdown,
}

impl TripSummary {
    pub fn waiting_time_display(&self) -> String {
        format_waiting_time(self.waiting_time_secs)
    }
}

/// Snapshot the live trip into a receipt.
///
/// `state.cost` is taken as-is; the receipt never reprices.
pub fn build_summary(
    state: &TripState,
    selection: &FareSelection,
    stops: &StopAggregate,
    breakdown: &FareBreakdown,
    stopped_at_ms: u64,
) -> TripSummary {
    TripSummary {
        trip_type: selection.trip_type.name.clone(),
        sub_trip: selection.sub_trip.as_ref().map(|s| s.name.clone()),
        tier: selection.tier,
        distance_km: state.distance_km,
        raw_distance_km: state.raw_distance_km,
        waiting_time_secs: state.waiting_time_secs,
        cost: state.cost,
        stopped_at_ms,
        timestamp: format_timestamp(stopped_at_ms),
        special_zone: selection.zone.clone(),
        pet: selection.pet,
        special_service: selection.special_service,
        extra_passengers: selection.extra_passengers,
        stops: *stops,
        breakdown: *breakdown,
    }
}

/// `m:ss` rendering of a waiting time.
pub fn format_waiting_time(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn format_timestamp(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}
