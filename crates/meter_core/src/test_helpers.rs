//! Test helpers shared by unit tests, integration tests and benches.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::GpsError;
use crate::geo::{destination, Position, GPS_CORRECTION_FACTOR};
use crate::pricing::calculate_fare;
use crate::schedule::FareSchedule;
use crate::summary::{build_summary, TripSummary};
use crate::surcharges::StopAggregate;
use crate::gps::{PositionSource, WatchId, WatchOptions};
use crate::trip::{FareSelection, TripState};

/// Ciudad Guzmán town centre.
pub const TEST_ORIGIN: (f64, f64) = (19.7050, -103.4617);

pub fn test_origin() -> Position {
    Position::new(TEST_ORIGIN.0, TEST_ORIGIN.1, 0)
}

#[derive(Debug, Default)]
struct SourceState {
    position: Option<Position>,
    error: Option<GpsError>,
    next_watch: u64,
    active: Vec<WatchId>,
    opened: usize,
}

/// In-memory [PositionSource]. Clones share state so a test can inspect
/// subscriptions after handing a clone to the controller.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    state: Rc<RefCell<SourceState>>,
}

impl ScriptedSource {
    pub fn with_position(position: Position) -> Self {
        let source = Self::default();
        source.set_position(Some(position));
        source
    }

    pub fn set_position(&self, position: Option<Position>) {
        self.state.borrow_mut().position = position;
    }

    pub fn fail_with(&self, error: Option<GpsError>) {
        self.state.borrow_mut().error = error;
    }

    pub fn has_active_watch(&self) -> bool {
        !self.state.borrow().active.is_empty()
    }

    pub fn watches_opened(&self) -> usize {
        self.state.borrow().opened
    }
}

impl PositionSource for ScriptedSource {
    fn current_position(&mut self, _options: &WatchOptions) -> Result<Position, GpsError> {
        let state = self.state.borrow();
        if let Some(err) = state.error {
            return Err(err);
        }
        state.position.ok_or(GpsError::Unavailable)
    }

    fn watch(&mut self, _options: &WatchOptions) -> WatchId {
        let mut state = self.state.borrow_mut();
        state.next_watch += 1;
        state.opened += 1;
        let id = WatchId(state.next_watch);
        state.active.push(id);
        id
    }

    fn clear_watch(&mut self, id: WatchId) {
        self.state.borrow_mut().active.retain(|w| *w != id);
    }
}

/// Fixes along a straight line whose consecutive corrected distances are
/// approximately `measured_m[i]`. The first fix is `origin` stamped `start_ms`.
pub fn straight_route(
    origin: Position,
    bearing_deg: f64,
    measured_m: &[f64],
    start_ms: u64,
    step_ms: u64,
) -> Vec<Position> {
    let mut fixes = vec![Position {
        timestamp: start_ms,
        ..origin
    }];
    let mut current = fixes[0];
    for (i, meters) in measured_m.iter().enumerate() {
        let timestamp = start_ms + (i as u64 + 1) * step_ms;
        current = destination(&current, bearing_deg, meters / GPS_CORRECTION_FACTOR, timestamp);
        fixes.push(current);
    }
    fixes
}

/// Minimal receipt with a given cost, for sink tests.
pub fn summary_with_cost(cost: f64) -> TripSummary {
    let schedule = FareSchedule::default();
    let selection = FareSelection::new(&schedule);
    let stops = StopAggregate::default();
    let state = TripState {
        cost,
        ..Default::default()
    };
    let breakdown = calculate_fare(&schedule, 0.0, 0, &selection, &stops);
    build_summary(&state, &selection, &stops, &breakdown, 0)
}
