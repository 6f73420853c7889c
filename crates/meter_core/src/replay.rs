//! Replay of recorded trip events.
//!
//! Events are queued by timestamp and fed to a controller whose clock is a
//! [ManualClock]. Each step moves the clock to the event time, lets the waiting
//! timer catch up, then applies the action. Rejected actions are collected
//! rather than aborting the replay. Each receipt is acknowledged into the
//! outcome as soon as its trip stops, so a log may hold several trips.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::clock::ManualClock;
use crate::error::{GpsError, TripError};
use crate::geo::Position;
use crate::gps::PositionSource;
use crate::controller::TripController;
use crate::odometer::FixOutcome;
use crate::surcharges::StopKind;
use crate::summary::TripSummary;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TripAction {
    Start,
    Fix { latitude: f64, longitude: f64 },
    GpsLost,
    Pause,
    Resume,
    QuickStop,
    ServiceStop,
    Stop,
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplayEvent {
    pub timestamp_ms: u64,
    #[serde(flatten)]
    pub action: TripAction,
}

#[derive(Debug, Clone, Copy)]
struct Queued {
    event: ReplayEvent,
    seq: u64,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap pops the earliest event; ties keep insertion order.
        other
            .event
            .timestamp_ms
            .cmp(&self.event.timestamp_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
pub struct ReplayQueue {
    now: u64,
    next_seq: u64,
    events: BinaryHeap<Queued>,
}

impl ReplayQueue {
    pub fn from_events(events: impl IntoIterator<Item = ReplayEvent>) -> Self {
        let mut queue = Self::default();
        for event in events {
            queue.schedule(event);
        }
        queue
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn schedule(&mut self, event: ReplayEvent) {
        debug_assert!(
            event.timestamp_ms >= self.now,
            "event timestamp must be >= current time"
        );
        self.events.push(Queued {
            event,
            seq: self.next_seq,
        });
        self.next_seq += 1;
    }

    pub fn pop_next(&mut self) -> Option<ReplayEvent> {
        let queued = self.events.pop()?;
        self.now = queued.event.timestamp_ms;
        Some(queued.event)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedAction {
    pub timestamp_ms: u64,
    pub action: TripAction,
    pub error: TripError,
}

#[derive(Debug, Clone, Default)]
pub struct ReplayOutcome {
    pub steps: usize,
    pub summaries: Vec<TripSummary>,
    pub rejected: Vec<RejectedAction>,
    pub jitter_discarded: usize,
}

/// Replays queued events until the queue is empty or `max_steps` events were applied.
pub fn run_replay<S: PositionSource>(
    controller: &mut TripController<S, ManualClock>,
    clock: &ManualClock,
    queue: &mut ReplayQueue,
    max_steps: usize,
) -> ReplayOutcome {
    let mut outcome = ReplayOutcome::default();
    while outcome.steps < max_steps {
        let Some(event) = queue.pop_next() else {
            break;
        };
        clock.set(event.timestamp_ms);
        controller.tick();

        let result = apply(controller, event, &mut outcome);
        if let Err(error) = result {
            debug!("rejected {:?} at {}: {error}", event.action, event.timestamp_ms);
            outcome.rejected.push(RejectedAction {
                timestamp_ms: event.timestamp_ms,
                action: event.action,
                error,
            });
        }
        outcome.steps += 1;
    }
    outcome
}

fn apply<S: PositionSource>(
    controller: &mut TripController<S, ManualClock>,
    event: ReplayEvent,
    outcome: &mut ReplayOutcome,
) -> Result<(), TripError> {
    match event.action {
        TripAction::Start => controller.start(),
        TripAction::Fix { latitude, longitude } => {
            let fix = Position::new(latitude, longitude, event.timestamp_ms);
            if let Some(FixOutcome::Jitter { .. }) = controller.on_position(fix) {
                outcome.jitter_discarded += 1;
            }
            Ok(())
        }
        TripAction::GpsLost => {
            controller.on_position_error(GpsError::Unavailable);
            Ok(())
        }
        TripAction::Pause => controller.pause(),
        TripAction::Resume => controller.resume(),
        TripAction::QuickStop => controller.add_stop(StopKind::Quick),
        TripAction::ServiceStop => controller.add_stop(StopKind::Service),
        TripAction::Stop => {
            controller.stop()?;
            controller.acknowledge_summary(&mut outcome.summaries);
            Ok(())
        }
        TripAction::Tick => Ok(()),
    }
}
