//! Synthetic GPS routes for demos, benches and tests.
//!
//! A route is a seeded random walk: the heading drifts a little each step and
//! every reported fix is displaced from the true track by up to `jitter_m`.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::geo::{destination, Position};
use crate::replay::{ReplayEvent, TripAction};

/// Upper bound on generated steps per route.
pub const MAX_ROUTE_STEPS: u64 = 100_000;

#[derive(Debug, Clone)]
pub struct RouteSimulator {
    pub origin: Position,
    pub bearing_deg: f64,
    /// True (uncorrected) distance between consecutive fixes.
    pub step_m: f64,
    pub step_ms: u64,
    /// Maximum heading change per step.
    pub max_turn_deg: f64,
    /// Maximum displacement of a reported fix from the true track.
    pub jitter_m: f64,
    /// Seed for RNG (for reproducibility).
    pub seed: u64,
}

impl Default for RouteSimulator {
    fn default() -> Self {
        Self {
            origin: Position::new(19.7050, -103.4617, 0),
            bearing_deg: 0.0,
            step_m: 100.0,
            step_ms: 5_000,
            max_turn_deg: 10.0,
            jitter_m: 3.0,
            seed: 0,
        }
    }
}

impl RouteSimulator {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_jitter_m(mut self, jitter_m: f64) -> Self {
        self.jitter_m = jitter_m.max(0.0);
        self
    }

    /// Fixes covering roughly `true_distance_m` of track, starting at `start_ms`.
    ///
    /// Routes are cut at [MAX_ROUTE_STEPS] steps; a non-finite or non-positive
    /// distance yields only the origin.
    pub fn fixes(&self, true_distance_m: f64, start_ms: u64) -> Vec<Position> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let steps = (true_distance_m / self.step_m).ceil();
        let steps = if steps.is_finite() && steps > 0.0 {
            steps.min(MAX_ROUTE_STEPS as f64) as u64
        } else {
            0
        };

        let mut track = Position {
            timestamp: start_ms,
            ..self.origin
        };
        let mut bearing = self.bearing_deg;
        let mut fixes = Vec::with_capacity(steps as usize + 1);
        fixes.push(track);
        for step in 1..=steps {
            if self.max_turn_deg > 0.0 {
                bearing += rng.gen_range(-self.max_turn_deg..=self.max_turn_deg);
            }
            let timestamp = start_ms + step * self.step_ms;
            track = destination(&track, bearing, self.step_m, timestamp);
            fixes.push(self.displace(&track, &mut rng));
        }
        fixes
    }

    fn displace(&self, fix: &Position, rng: &mut StdRng) -> Position {
        if self.jitter_m <= 0.0 {
            return *fix;
        }
        let direction = rng.gen_range(0.0..360.0);
        let offset = rng.gen_range(0.0..=self.jitter_m);
        destination(fix, direction, offset, fix.timestamp)
    }
}

/// Events that drive one whole trip over `fixes`: the first fix establishes the
/// position, the trip starts, every fix is delivered, and the trip stops after the last.
pub fn trip_events(fixes: &[Position]) -> Vec<ReplayEvent> {
    let Some(first) = fixes.first() else {
        return Vec::new();
    };
    let fix_event = |p: &Position| ReplayEvent {
        timestamp_ms: p.timestamp,
        action: TripAction::Fix {
            latitude: p.latitude,
            longitude: p.longitude,
        },
    };

    let mut events = Vec::with_capacity(fixes.len() + 3);
    events.push(fix_event(first));
    events.push(ReplayEvent {
        timestamp_ms: first.timestamp,
        action: TripAction::Start,
    });
    events.extend(fixes.iter().map(fix_event));
    let end = fixes.last().map(|p| p.timestamp).unwrap_or(first.timestamp);
    events.push(ReplayEvent {
        timestamp_ms: end,
        action: TripAction::Stop,
    });
    events
}
