use std::cell::Cell;
use std::rc::Rc;

use chrono::Utc;

/// Millisecond wall clock consulted by the controller.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// Clock advanced by hand. Clones share the same time, so a test or replay can
/// keep a handle while the controller owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(now_ms)),
        }
    }

    pub fn set(&self, now_ms: u64) {
        debug_assert!(now_ms >= self.now.get(), "manual clock must not go backwards");
        self.now.set(now_ms);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.now.set(self.now.get() + secs * 1000);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Waiting-time accumulator for paused periods.
///
/// Elapsed time is always recomputed from the recorded start timestamp, so the
/// reported value does not drift when ticks are late or missed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaitingTimer {
    accumulated_secs: u64,
    started_at: Option<u64>,
}

impl WaitingTimer {
    pub fn is_open(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn open(&mut self, now_ms: u64) {
        debug_assert!(self.started_at.is_none(), "waiting timer already open");
        self.started_at = Some(now_ms);
    }

    /// Waiting seconds including the open period, if any.
    pub fn current_secs(&self, now_ms: u64) -> u64 {
        self.accumulated_secs + self.open_elapsed_secs(now_ms)
    }

    /// Folds the open period into the accumulated total and closes the timer.
    pub fn flush(&mut self, now_ms: u64) -> u64 {
        self.accumulated_secs += self.open_elapsed_secs(now_ms);
        self.started_at = None;
        self.accumulated_secs
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn open_elapsed_secs(&self, now_ms: u64) -> u64 {
        self.started_at
            .map(|start| now_ms.saturating_sub(start) / 1000)
            .unwrap_or(0)
    }
}
