#![allow(dead_code)]

use meter_core::clock::{Clock, ManualClock};
use meter_core::config::MeterConfig;
use meter_core::controller::TripController;
use meter_core::geo::Position;
use meter_core::odometer::FixOutcome;
use meter_core::test_helpers::{straight_route, test_origin, ScriptedSource};

/// Driving bearing for test routes. East-west legs at this latitude measure
/// within 0.2% of the requested distance.
pub const EAST: f64 = 90.0;

/// Seconds between consecutive fixes in driven legs.
pub const FIX_INTERVAL_SECS: u64 = 10;

pub type TestController = TripController<ScriptedSource, ManualClock>;

/// Controller wired to a scripted source and a manual clock, with GPS already available.
pub struct TestMeter {
    pub controller: TestController,
    pub source: ScriptedSource,
    pub clock: ManualClock,
}

impl TestMeter {
    pub fn new() -> Self {
        Self::with_config(MeterConfig::default())
    }

    pub fn with_config(config: MeterConfig) -> Self {
        let clock = ManualClock::starting_at(1_700_000_000_000);
        let source = ScriptedSource::with_position(test_origin());
        let mut controller = TripController::new(config, source.clone(), clock.clone());
        controller.refresh_gps();
        Self {
            controller,
            source,
            clock,
        }
    }

    /// Last fix the controller has seen, or the test origin.
    pub fn here(&self) -> Position {
        self.controller
            .current_position()
            .copied()
            .unwrap_or_else(test_origin)
    }

    /// Delivers a fix at the current position (the reference after start or a service stop).
    pub fn anchor(&mut self) -> Option<FixOutcome> {
        let fix = Position {
            timestamp: self.clock.now_ms(),
            ..self.here()
        };
        self.controller.on_position(fix)
    }

    /// Drives east from the current position, one fix per leg in `measured_m`,
    /// advancing the clock so no fix is stale.
    pub fn drive(&mut self, measured_m: &[f64]) -> Vec<Option<FixOutcome>> {
        let start = self.clock.now_ms();
        let route = straight_route(self.here(), EAST, measured_m, start, FIX_INTERVAL_SECS * 1000);
        route
            .into_iter()
            .skip(1)
            .map(|fix| {
                self.clock.set(fix.timestamp);
                self.controller.tick();
                self.controller.on_position(fix)
            })
            .collect()
    }

    pub fn wait(&mut self, secs: u64) {
        for _ in 0..secs {
            self.clock.advance_secs(1);
            self.controller.tick();
        }
    }
}
