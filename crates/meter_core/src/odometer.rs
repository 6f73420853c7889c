//! Distance accumulation from a stream of GPS fixes.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geo::{geodesic_distance_m, Position};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OdometerConfig {
    /// Movements at or below this many meters are treated as jitter.
    pub noise_threshold_m: f64,
    /// Kilometers credited back for every whole raw kilometer.
    pub discount_per_km: f64,
}

impl Default for OdometerConfig {
    fn default() -> Self {
        Self {
            noise_threshold_m: 15.0,
            discount_per_km: 0.125,
        }
    }
}

/// Result of feeding one fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixOutcome {
    /// First fix of a leg: stored, no movement.
    Reference,
    /// Within the noise threshold: discarded, reference unchanged.
    Jitter { meters: f64 },
    Moved {
        meters: f64,
        raw_distance_km: f64,
        distance_km: f64,
    },
}

/// Accumulates raw distance between accepted fixes and derives the discounted distance.
#[derive(Debug, Clone, Default)]
pub struct DistanceAccumulator {
    config: OdometerConfig,
    reference: Option<Position>,
    raw_distance_km: f64,
}

impl DistanceAccumulator {
    pub fn new(config: OdometerConfig) -> Self {
        Self {
            config,
            reference: None,
            raw_distance_km: 0.0,
        }
    }

    pub fn push(&mut self, fix: Position) -> FixOutcome {
        let Some(reference) = self.reference else {
            self.reference = Some(fix);
            return FixOutcome::Reference;
        };

        let meters = geodesic_distance_m(&reference, &fix);
        if meters <= self.config.noise_threshold_m {
            debug!("discarding {meters:.1} m of GPS jitter");
            return FixOutcome::Jitter { meters };
        }

        self.raw_distance_km += meters / 1000.0;
        self.reference = Some(fix);
        FixOutcome::Moved {
            meters,
            raw_distance_km: self.raw_distance_km,
            distance_km: self.distance_km(),
        }
    }

    pub fn raw_distance_km(&self) -> f64 {
        self.raw_distance_km
    }

    /// Raw distance minus the per-kilometer discount, never negative.
    pub fn distance_km(&self) -> f64 {
        discounted_distance_km(self.raw_distance_km, self.config.discount_per_km)
    }

    pub fn reference(&self) -> Option<&Position> {
        self.reference.as_ref()
    }

    /// Starts a fresh leg: zero distance and no reference.
    pub fn reset(&mut self) {
        self.reference = None;
        self.raw_distance_km = 0.0;
    }
}

pub fn discounted_distance_km(raw_distance_km: f64, discount_per_km: f64) -> f64 {
    (raw_distance_km - raw_distance_km.floor() * discount_per_km).max(0.0)
}
