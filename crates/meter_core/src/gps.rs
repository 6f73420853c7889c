//! Position source abstraction and GPS availability status.

use serde::{Deserialize, Serialize};

use crate::error::GpsError;
use crate::geo::Position;

/// Options handed to the position source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    /// Fixes older than this (relative to the controller clock) are ignored.
    pub maximum_age_ms: u64,
    pub timeout_ms: u64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age_ms: 500,
            timeout_ms: 10_000,
        }
    }
}

impl WatchOptions {
    pub fn is_stale(&self, fix: &Position, now_ms: u64) -> bool {
        now_ms.saturating_sub(fix.timestamp) > self.maximum_age_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// Source of GPS fixes.
///
/// `watch` subscribes to live updates; the caller delivers each fix to
/// [crate::controller::TripController::on_position]. A subscription must stay
/// open until `clear_watch` is called with its id.
pub trait PositionSource {
    /// Pull a single fix.
    fn current_position(&mut self, options: &WatchOptions) -> Result<Position, GpsError>;

    fn watch(&mut self, options: &WatchOptions) -> WatchId;

    fn clear_watch(&mut self, id: WatchId);
}

/// Source for callers that push fixes themselves (log replay, simulation).
///
/// It only tracks the subscription; `current_position` reports the last fix
/// handed to [FeedSource::remember].
#[derive(Debug, Clone, Default)]
pub struct FeedSource {
    last: Option<Position>,
    next_watch: u64,
    active: Option<WatchId>,
}

impl FeedSource {
    pub fn remember(&mut self, fix: Position) {
        self.last = Some(fix);
    }

    pub fn active_watch(&self) -> Option<WatchId> {
        self.active
    }
}

impl PositionSource for FeedSource {
    fn current_position(&mut self, _options: &WatchOptions) -> Result<Position, GpsError> {
        self.last.ok_or(GpsError::Unavailable)
    }

    fn watch(&mut self, _options: &WatchOptions) -> WatchId {
        self.next_watch += 1;
        let id = WatchId(self.next_watch);
        self.active = Some(id);
        id
    }

    fn clear_watch(&mut self, id: WatchId) {
        if self.active == Some(id) {
            self.active = None;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GpsStatus {
    #[default]
    Requesting,
    Available,
    Denied,
    Unavailable,
}

impl From<GpsError> for GpsStatus {
    fn from(err: GpsError) -> Self {
        match err {
            GpsError::Denied => GpsStatus::Denied,
            GpsError::Unavailable | GpsError::Timeout => GpsStatus::Unavailable,
        }
    }
}
