//! Live trip state and the fare selection it is priced against.

use serde::Serialize;

use crate::schedule::{FareSchedule, FareTier, SubTrip, TripType};
use crate::surcharges::{
    ExtraPassengersConfig, PetConfig, SpecialServiceConfig, SpecialZoneSelection,
};

/// Lifecycle phase derived from the running/paused flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TripPhase {
    Idle,
    Running,
    Paused,
}

impl std::fmt::Display for TripPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TripPhase::Idle => "idle",
            TripPhase::Running => "running",
            TripPhase::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// Distance, waiting time and the cached cost of the current trip.
///
/// `cost` is derived: the controller rewrites it after every mutation of the
/// inputs it depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TripState {
    pub raw_distance_km: f64,
    pub distance_km: f64,
    pub waiting_time_secs: u64,
    pub is_running: bool,
    pub is_paused: bool,
    pub cost: f64,
}

impl TripState {
    pub fn phase(&self) -> TripPhase {
        match (self.is_running, self.is_paused) {
            (false, _) => TripPhase::Idle,
            (true, false) => TripPhase::Running,
            (true, true) => TripPhase::Paused,
        }
    }

    /// Whole waiting minutes billed by the fare.
    pub fn waiting_minutes(&self) -> u64 {
        self.waiting_time_secs / 60
    }
}

/// Every operator choice that feeds the fare besides distance, waiting time and stops.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FareSelection {
    pub trip_type: TripType,
    pub sub_trip: Option<SubTrip>,
    pub tier: FareTier,
    pub zone: SpecialZoneSelection,
    pub pet: PetConfig,
    pub special_service: SpecialServiceConfig,
    pub extra_passengers: ExtraPassengersConfig,
}

impl FareSelection {
    pub fn new(schedule: &FareSchedule) -> Self {
        Self {
            trip_type: schedule.default_trip_type(),
            sub_trip: None,
            tier: FareTier::Normal,
            zone: SpecialZoneSelection::default(),
            pet: PetConfig::default(),
            special_service: SpecialServiceConfig::default(),
            extra_passengers: ExtraPassengersConfig::default(),
        }
    }

    pub fn with_trip_type(mut self, trip_type: TripType) -> Self {
        self.trip_type = trip_type;
        self.sub_trip = None;
        self
    }

    pub fn with_sub_trip(mut self, sub_trip: SubTrip) -> Self {
        self.sub_trip = Some(sub_trip);
        self
    }

    pub fn with_tier(mut self, tier: FareTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_zone(mut self, zone: Option<&str>) -> Self {
        self.zone = SpecialZoneSelection {
            active: true,
            zone: zone.map(str::to_string),
        };
        self
    }

    pub fn with_pet(mut self, pet: PetConfig) -> Self {
        self.pet = pet;
        self
    }

    pub fn with_special_service(mut self, service: SpecialServiceConfig) -> Self {
        self.special_service = service;
        self
    }

    pub fn with_extra_passengers(mut self, passengers: ExtraPassengersConfig) -> Self {
        self.extra_passengers = passengers;
        self
    }
}
