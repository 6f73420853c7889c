mod support;

use chrono::NaiveDate;
use meter_core::clock::ManualClock;
use meter_core::config::MeterConfig;
use meter_core::controller::TripController;
use meter_core::error::TripError;
use meter_core::gps::{FeedSource, GpsStatus};
use meter_core::ledger::{EarningsLedger, MonthKey, SummarySink};
use meter_core::replay::{run_replay, ReplayEvent, ReplayQueue, TripAction};
use meter_core::simulate::{trip_events, RouteSimulator};
use meter_core::trip::{TripPhase, TripState};

const EPOCH_MS: u64 = 1_790_000_000_000;

fn replay_controller() -> (TripController<FeedSource, ManualClock>, ManualClock) {
    let clock = ManualClock::starting_at(EPOCH_MS);
    let controller = TripController::new(MeterConfig::default(), FeedSource::default(), clock.clone());
    (controller, clock)
}

fn at(offset_secs: u64, action: TripAction) -> ReplayEvent {
    ReplayEvent {
        timestamp_ms: EPOCH_MS + offset_secs * 1000,
        action,
    }
}

fn fix(offset_secs: u64, latitude: f64, longitude: f64) -> ReplayEvent {
    at(offset_secs, TripAction::Fix { latitude, longitude })
}

#[test]
fn simulated_route_replays_into_one_receipt() {
    let (mut controller, clock) = replay_controller();
    let fixes = RouteSimulator::default().with_seed(7).fixes(5_000.0, EPOCH_MS);
    let mut queue = ReplayQueue::from_events(trip_events(&fixes));

    let outcome = run_replay(&mut controller, &clock, &mut queue, usize::MAX);
    assert!(queue.is_empty());
    assert!(outcome.rejected.is_empty(), "{:?}", outcome.rejected);
    assert_eq!(outcome.steps, fixes.len() + 3);
    assert_eq!(outcome.summaries.len(), 1);

    let summary = &outcome.summaries[0];
    // 5 km of true track, scaled by the correction factor.
    assert!(summary.raw_distance_km > 5.6 && summary.raw_distance_km < 6.0, "{}", summary.raw_distance_km);
    assert!(summary.distance_km < summary.raw_distance_km);
    assert_eq!(summary.cost, summary.breakdown.total());
    assert_eq!(controller.phase(), TripPhase::Idle);
    assert_eq!(controller.source().active_watch(), None);
    assert_eq!(controller.gps_status(), GpsStatus::Available);
}

#[test]
fn same_seed_replays_to_the_same_fare() {
    let run = |seed: u64| {
        let (mut controller, clock) = replay_controller();
        let fixes = RouteSimulator::default().with_seed(seed).fixes(7_500.0, EPOCH_MS);
        let mut queue = ReplayQueue::from_events(trip_events(&fixes));
        let outcome = run_replay(&mut controller, &clock, &mut queue, usize::MAX);
        outcome.summaries[0].clone()
    };
    let first = run(11);
    let second = run(11);
    assert_eq!(first.cost, second.cost);
    assert_eq!(first.raw_distance_km, second.raw_distance_km);
}

#[test]
fn heavy_jitter_is_discarded_while_parked() {
    let (mut controller, clock) = replay_controller();
    let (lat, lon) = (19.7050, -103.4617);
    let mut events = vec![fix(0, lat, lon), at(1, TripAction::Start), fix(1, lat, lon)];
    // A parked car whose fixes wander up to about ten meters.
    for i in 0..20u64 {
        let offset = (i % 5) as f64 * 0.00002;
        events.push(fix(2 + i, lat + offset, lon));
    }
    events.push(at(30, TripAction::Stop));

    let mut queue = ReplayQueue::from_events(events);
    let outcome = run_replay(&mut controller, &clock, &mut queue, usize::MAX);
    assert_eq!(outcome.jitter_discarded, 20);
    assert_eq!(outcome.summaries[0].raw_distance_km, 0.0);
    assert_eq!(outcome.summaries[0].cost, 50.0);
}

#[test]
fn out_of_order_actions_are_rejected_without_aborting() {
    let (mut controller, clock) = replay_controller();
    let (lat, lon) = (19.7050, -103.4617);
    let mut queue = ReplayQueue::from_events([
        at(0, TripAction::Start),
        fix(1, lat, lon),
        at(2, TripAction::Pause),
        at(3, TripAction::Start),
        at(5, TripAction::Pause),
        at(185, TripAction::QuickStop),
        at(190, TripAction::Resume),
        at(191, TripAction::ServiceStop),
        at(200, TripAction::Stop),
        at(201, TripAction::Stop),
    ]);

    let outcome = run_replay(&mut controller, &clock, &mut queue, usize::MAX);
    let rejected: Vec<(TripAction, TripError)> = outcome
        .rejected
        .iter()
        .map(|r| (r.action, r.error.clone()))
        .collect();
    assert_eq!(
        rejected,
        vec![
            (TripAction::Start, TripError::NoPosition),
            (
                TripAction::Pause,
                TripError::InvalidTransition {
                    action: "pause",
                    state: TripPhase::Idle
                }
            ),
            (
                TripAction::QuickStop,
                TripError::InvalidTransition {
                    action: "add a stop",
                    state: TripPhase::Paused
                }
            ),
            (
                TripAction::Stop,
                TripError::InvalidTransition {
                    action: "stop",
                    state: TripPhase::Idle
                }
            ),
        ]
    );

    let summary = &outcome.summaries[0];
    assert_eq!(summary.waiting_time_secs, 185);
    assert_eq!(summary.stops.count, 1);
    // Base, one service stop, three waiting minutes.
    assert_eq!(summary.cost, 50.0 + 50.0 + 9.0);
}

#[test]
fn tick_events_advance_waiting_time() {
    let (mut controller, clock) = replay_controller();
    let mut queue = ReplayQueue::from_events([
        fix(0, 19.7050, -103.4617),
        at(0, TripAction::Start),
        at(10, TripAction::Pause),
        at(70, TripAction::Tick),
    ]);
    run_replay(&mut controller, &clock, &mut queue, usize::MAX);
    assert_eq!(controller.state().waiting_time_secs, 60);
    assert_eq!(controller.state().cost, 53.0);
}

#[test]
fn max_steps_leaves_the_rest_queued() {
    let (mut controller, clock) = replay_controller();
    let fixes = RouteSimulator::default().fixes(1_000.0, EPOCH_MS);
    let mut queue = ReplayQueue::from_events(trip_events(&fixes));
    let total = queue.len();

    let first = run_replay(&mut controller, &clock, &mut queue, 5);
    assert_eq!(first.steps, 5);
    assert_eq!(queue.len(), total - 5);
    assert_eq!(controller.phase(), TripPhase::Running);

    let rest = run_replay(&mut controller, &clock, &mut queue, usize::MAX);
    assert_eq!(rest.steps, total - 5);
    assert_eq!(rest.summaries.len(), 1);
    assert_eq!(controller.state(), &TripState {
        cost: 50.0,
        ..TripState::default()
    });
}

#[test]
fn acknowledged_receipts_land_in_the_driver_ledger() {
    let mut ledger = EarningsLedger::default();
    let mut total = 0.0;
    for seed in 0..3u64 {
        let (mut controller, clock) = replay_controller();
        let fixes = RouteSimulator::default()
            .with_seed(seed)
            .fixes(2_000.0 + seed as f64 * 3_000.0, EPOCH_MS);
        let mut queue = ReplayQueue::from_events(trip_events(&fixes));
        let outcome = run_replay(&mut controller, &clock, &mut queue, usize::MAX);
        assert!(controller.last_summary().is_none());

        for summary in &outcome.summaries {
            ledger.driver_mut("unit-12").record(summary);
            total += summary.cost;
        }
    }

    let driver = ledger.driver_mut("unit-12");
    assert!((driver.daily_total() - total).abs() < 1e-9);
    let date = NaiveDate::from_ymd_opt(2026, 9, 21).expect("date");
    driver.close_day(date).expect("closed day");
    let september = driver.month(MonthKey::of(date));
    assert!((september.total - total).abs() < 1e-9);
    assert_eq!(september.days.len(), 1);
}

#[test]
fn events_parse_from_json_lines() {
    let log = r#"
{"timestamp_ms": 1000, "action": "fix", "latitude": 19.705, "longitude": -103.4617}
{"timestamp_ms": 1000, "action": "start"}
{"timestamp_ms": 9000, "action": "quick_stop"}
{"timestamp_ms": 9500, "action": "stop"}
"#;
    let events: Vec<ReplayEvent> = log
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("event"))
        .collect();
    assert_eq!(events.len(), 4);

    let clock = ManualClock::starting_at(0);
    let mut controller = TripController::new(MeterConfig::default(), FeedSource::default(), clock.clone());
    let mut queue = ReplayQueue::from_events(events);
    let outcome = run_replay(&mut controller, &clock, &mut queue, usize::MAX);
    assert_eq!(outcome.summaries[0].cost, 70.0);
}
