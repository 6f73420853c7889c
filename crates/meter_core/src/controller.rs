//! Trip lifecycle: Idle → Running ⇄ Paused → (stop) → Idle.
//!
//! The controller is the single writer of [TripState]. Every mutation that
//! feeds the fare ends with [TripController::recompute], so `state().cost` is
//! never stale. Position fixes, timer ticks and operator actions all arrive as
//! plain method calls on one thread.

use log::{debug, info, warn};

use crate::clock::{Clock, WaitingTimer};
use crate::config::MeterConfig;
use crate::error::{GpsError, TripError};
use crate::geo::Position;
use crate::gps::{GpsStatus, PositionSource, WatchId};
use crate::ledger::SummarySink;
use crate::odometer::{DistanceAccumulator, FixOutcome};
use crate::pricing::{calculate_fare, FareBreakdown};
use crate::schedule::{FareSchedule, FareTier};
use crate::summary::{build_summary, TripSummary};
use crate::surcharges::{
    PassengerKind, PetCarrier, PetConfig, ServiceKind, SpecialServiceConfig, SpecialZoneSelection,
    StopAggregate, StopKind,
};
use crate::trip::{FareSelection, TripPhase, TripState};

pub struct TripController<S: PositionSource, C: Clock> {
    config: MeterConfig,
    source: S,
    clock: C,
    gps_status: GpsStatus,
    current_position: Option<Position>,
    watch: Option<WatchId>,
    odometer: DistanceAccumulator,
    waiting: WaitingTimer,
    state: TripState,
    selection: FareSelection,
    stops: StopAggregate,
    breakdown: FareBreakdown,
    last_summary: Option<TripSummary>,
}

impl<S: PositionSource, C: Clock> TripController<S, C> {
    pub fn new(config: MeterConfig, source: S, clock: C) -> Self {
        let selection = FareSelection::new(&config.schedule);
        let stops = StopAggregate::default();
        let breakdown = calculate_fare(&config.schedule, 0.0, 0, &selection, &stops);
        let odometer = DistanceAccumulator::new(config.odometer);
        let mut controller = Self {
            config,
            source,
            clock,
            gps_status: GpsStatus::Requesting,
            current_position: None,
            watch: None,
            odometer,
            waiting: WaitingTimer::default(),
            state: TripState::default(),
            selection,
            stops,
            breakdown,
            last_summary: None,
        };
        controller.recompute();
        controller
    }

    pub fn state(&self) -> &TripState {
        &self.state
    }

    pub fn phase(&self) -> TripPhase {
        self.state.phase()
    }

    pub fn selection(&self) -> &FareSelection {
        &self.selection
    }

    pub fn stops(&self) -> &StopAggregate {
        &self.stops
    }

    pub fn breakdown(&self) -> &FareBreakdown {
        &self.breakdown
    }

    pub fn schedule(&self) -> &FareSchedule {
        &self.config.schedule
    }

    pub fn gps_status(&self) -> GpsStatus {
        self.gps_status
    }

    pub fn current_position(&self) -> Option<&Position> {
        self.current_position.as_ref()
    }

    /// Reference fix the next movement is measured from.
    pub fn distance_reference(&self) -> Option<&Position> {
        self.odometer.reference()
    }

    pub fn is_watching(&self) -> bool {
        self.watch.is_some()
    }

    pub fn last_summary(&self) -> Option<&TripSummary> {
        self.last_summary.as_ref()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    // ── GPS ────────────────────────────────────────────────────────────

    /// Pulls one fix from the source to establish GPS availability.
    pub fn refresh_gps(&mut self) -> GpsStatus {
        match self.source.current_position(&self.config.watch) {
            Ok(fix) if fix.is_valid() => {
                self.current_position = Some(fix);
                self.gps_status = GpsStatus::Available;
            }
            Ok(fix) => {
                warn!("position source returned invalid fix {fix:?}");
                self.gps_status = GpsStatus::Unavailable;
            }
            Err(err) => self.on_position_error(err),
        }
        self.gps_status
    }

    pub fn on_position_error(&mut self, err: GpsError) {
        warn!("gps error: {err}");
        self.gps_status = err.into();
    }

    /// Handles one fix from the watch.
    ///
    /// Returns the odometer outcome when the fix was measured; `None` when the
    /// trip is not moving, the fix is invalid or stale.
    pub fn on_position(&mut self, fix: Position) -> Option<FixOutcome> {
        if !fix.is_valid() {
            debug!("ignoring invalid fix {fix:?}");
            return None;
        }
        self.current_position = Some(fix);
        self.gps_status = GpsStatus::Available;

        if self.watch.is_none() || self.phase() != TripPhase::Running {
            return None;
        }
        let now = self.clock.now_ms();
        if self.config.watch.is_stale(&fix, now) {
            debug!("ignoring fix {} ms old", now.saturating_sub(fix.timestamp));
            return None;
        }

        let outcome = self.odometer.push(fix);
        if let FixOutcome::Moved {
            raw_distance_km,
            distance_km,
            ..
        } = outcome
        {
            self.state.raw_distance_km = raw_distance_km;
            self.state.distance_km = distance_km;
            self.recompute();
        }
        Some(outcome)
    }

    // ── Timer ──────────────────────────────────────────────────────────

    /// Waiting-timer callback, nominally once per second.
    pub fn tick(&mut self) {
        if !self.waiting.is_open() {
            return;
        }
        let secs = self.waiting.current_secs(self.clock.now_ms());
        if secs != self.state.waiting_time_secs {
            self.state.waiting_time_secs = secs;
            self.recompute();
        }
    }

    // ── Lifecycle ──────────────────────────────────────────────────────

    pub fn start(&mut self) -> Result<(), TripError> {
        self.expect_phase("start", &[TripPhase::Idle])?;
        if self.last_summary.is_some() {
            return Err(TripError::SummaryPending);
        }
        if self.current_position.is_none() {
            return Err(TripError::NoPosition);
        }

        self.odometer.reset();
        self.waiting.reset();
        self.stops = StopAggregate::default();
        self.state = TripState {
            is_running: true,
            ..TripState::default()
        };
        self.watch = Some(self.source.watch(&self.config.watch));
        self.recompute();
        info!("trip started ({})", self.selection.trip_type.name);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), TripError> {
        self.expect_phase("pause", &[TripPhase::Running])?;
        self.waiting.open(self.clock.now_ms());
        self.state.is_paused = true;
        info!("trip paused");
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), TripError> {
        self.expect_phase("resume", &[TripPhase::Paused])?;
        self.state.waiting_time_secs = self.waiting.flush(self.clock.now_ms());
        self.state.is_paused = false;
        self.recompute();
        info!("trip resumed after {} s total waiting", self.state.waiting_time_secs);
        Ok(())
    }

    pub fn add_stop(&mut self, kind: StopKind) -> Result<(), TripError> {
        self.expect_phase("add a stop", &[TripPhase::Running])?;
        self.stops.record(kind, &self.config.schedule.stop_fees);
        if kind.resets_distance() {
            self.odometer.reset();
            self.state.raw_distance_km = 0.0;
            self.state.distance_km = 0.0;
        }
        self.recompute();
        info!("{kind:?} stop #{} recorded", self.stops.count);
        Ok(())
    }

    /// Ends the trip and returns its receipt. All trip, surcharge, zone and
    /// stop state returns to defaults.
    pub fn stop(&mut self) -> Result<TripSummary, TripError> {
        self.expect_phase("stop", &[TripPhase::Running, TripPhase::Paused])?;
        let now = self.clock.now_ms();

        self.state.waiting_time_secs = self.waiting.flush(now);
        self.recompute();
        let summary = build_summary(&self.state, &self.selection, &self.stops, &self.breakdown, now);

        self.cancel_watch();
        self.odometer.reset();
        self.waiting.reset();
        self.stops = StopAggregate::default();
        self.selection = FareSelection::new(&self.config.schedule);
        self.state = TripState::default();
        self.recompute();

        info!(
            "trip stopped: {:.2} km, {} s waiting, cost {:.2}",
            summary.distance_km, summary.waiting_time_secs, summary.cost
        );
        self.last_summary = Some(summary.clone());
        Ok(summary)
    }

    /// Hands the pending receipt to `sink` and forgets it. The next trip cannot
    /// start until this has been called.
    pub fn acknowledge_summary(&mut self, sink: &mut dyn SummarySink) -> Option<TripSummary> {
        let summary = self.last_summary.take()?;
        sink.record(&summary);
        Some(summary)
    }

    // ── Selection ──────────────────────────────────────────────────────

    pub fn select_trip_type(&mut self, id: &str) -> Result<(), TripError> {
        let trip_type = self
            .config
            .schedule
            .trip_type(id)
            .cloned()
            .ok_or_else(|| TripError::UnknownTripType(id.to_string()))?;
        self.selection.trip_type = trip_type;
        self.selection.sub_trip = None;
        self.recompute();
        Ok(())
    }

    pub fn select_sub_trip(&mut self, id: &str) -> Result<(), TripError> {
        let sub_trip = self
            .selection
            .trip_type
            .sub_trip(id)
            .cloned()
            .ok_or_else(|| TripError::UnknownSubTrip {
                trip_type: self.selection.trip_type.id.clone(),
                sub_trip: id.to_string(),
            })?;
        self.selection.sub_trip = Some(sub_trip);
        self.recompute();
        Ok(())
    }

    pub fn clear_sub_trip(&mut self) {
        self.selection.sub_trip = None;
        self.recompute();
    }

    pub fn set_fare_tier(&mut self, tier: FareTier) -> Result<(), TripError> {
        if self.state.is_running {
            return Err(TripError::TripInProgress {
                setting: "fare tier",
            });
        }
        self.selection.tier = tier;
        self.recompute();
        Ok(())
    }

    /// Turns the special-zone toggle on or off. Turning it off clears the chosen zone.
    pub fn set_special_zone_active(&mut self, active: bool) {
        self.selection.zone = SpecialZoneSelection {
            active,
            zone: if active {
                self.selection.zone.zone.take()
            } else {
                None
            },
        };
        self.recompute();
    }

    pub fn select_special_zone(&mut self, name: &str) -> Result<(), TripError> {
        if !self.config.schedule.is_special_zone(name) {
            return Err(TripError::UnknownZone(name.to_string()));
        }
        self.selection.zone = SpecialZoneSelection {
            active: true,
            zone: Some(name.to_string()),
        };
        self.recompute();
        Ok(())
    }

    pub fn select_pet(&mut self, carrier: Option<PetCarrier>) {
        self.selection.pet = carrier
            .map(|c| PetConfig::select(c, &self.config.schedule.surcharges))
            .unwrap_or_default();
        self.recompute();
    }

    pub fn select_special_service(&mut self, kind: Option<ServiceKind>) {
        self.selection.special_service = kind
            .map(|k| SpecialServiceConfig::select(k, &self.config.schedule.surcharges))
            .unwrap_or_default();
        self.recompute();
    }

    pub fn adjust_passengers(&mut self, kind: PassengerKind, delta: i32) {
        self.selection.extra_passengers = self.selection.extra_passengers.adjusted(
            kind,
            delta,
            &self.config.schedule.surcharges,
        );
        self.recompute();
    }

    /// Re-derives the cost from the current snapshot.
    pub fn recompute(&mut self) {
        self.breakdown = calculate_fare(
            &self.config.schedule,
            self.state.distance_km,
            self.state.waiting_minutes(),
            &self.selection,
            &self.stops,
        );
        self.state.cost = self.breakdown.total();
        debug!(
            "fare {:.2} at {:.3} km, {} min waiting",
            self.state.cost,
            self.state.distance_km,
            self.state.waiting_minutes()
        );
    }

    fn expect_phase(&self, action: &'static str, allowed: &[TripPhase]) -> Result<(), TripError> {
        let state = self.phase();
        if allowed.contains(&state) {
            Ok(())
        } else {
            Err(TripError::InvalidTransition { action, state })
        }
    }

    fn cancel_watch(&mut self) {
        if let Some(id) = self.watch.take() {
            self.source.clear_watch(id);
            debug!("position watch {id:?} cleared");
        }
    }
}

impl<S: PositionSource, C: Clock> Drop for TripController<S, C> {
    fn drop(&mut self) {
        self.cancel_watch();
    }
}
