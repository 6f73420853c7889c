use serde::{Deserialize, Serialize};

use crate::gps::WatchOptions;
use crate::odometer::OdometerConfig;
use crate::schedule::FareSchedule;

/// Everything a [crate::controller::TripController] is configured with.
///
/// Every section has production defaults, so a JSON override only needs the
/// fields it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    pub schedule: FareSchedule,
    pub odometer: OdometerConfig,
    pub watch: WatchOptions,
}

impl MeterConfig {
    pub fn with_schedule(mut self, schedule: FareSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_noise_threshold_m(mut self, meters: f64) -> Self {
        self.odometer.noise_threshold_m = meters;
        self
    }

    pub fn with_maximum_fix_age_ms(mut self, ms: u64) -> Self {
        self.watch.maximum_age_ms = ms;
        self
    }
}
