//! Integration tests for the ranging loop.
//!
//! Drives a `RangingLoop` with frames from a simulated master and tag and
//! checks the synchronized timestamps against the master's own counter.

use std::sync::Once;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use uwb_clocksync::constants::{MASTER_ID, TIMESTAMP_MASK};
use uwb_clocksync::sync::{DropReason, ReceiveOutcome, SyncEvent};
use uwb_clocksync::testing::{ClockScenario, MockRadio};
use uwb_clocksync::{DeviceTimestamp, RangingLoop, SyncConfig, create_shared_synchronizer};

static INIT: Once = Once::new();

fn init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("info")
            .with_test_writer()
            .try_init();
    });
}

const MASTER_PERIOD_NS: f64 = 100_000_000.0;
const TOLERANCE_NS: i64 = 16;

/// Master frames every 100 ms with one tag frame halfway between.
fn schedule(scenario: &mut ClockScenario, cycles: u8) -> Vec<(ReceiveOutcome, f64)> {
    let mut outcomes = Vec::new();
    for i in 0..cycles {
        let t = f64::from(i) * MASTER_PERIOD_NS;
        outcomes.push((ReceiveOutcome::Received(scenario.master_frame(t)), t));
        let tag_t = t + MASTER_PERIOD_NS / 2.0;
        outcomes.push((
            ReceiveOutcome::Received(scenario.tag_frame(tag_t, i, *b"T1")),
            tag_t,
        ));
    }
    outcomes
}

async fn run_schedule(
    config: SyncConfig,
    outcomes: Vec<ReceiveOutcome>,
) -> (Vec<SyncEvent>, uwb_clocksync::SyncStats) {
    let (outcome_tx, outcome_rx) = mpsc::channel(outcomes.len() + 1);
    let (event_tx, mut event_rx) = mpsc::channel(outcomes.len() + 1);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    for outcome in outcomes {
        outcome_tx.send(outcome).await.unwrap();
    }
    drop(outcome_tx);

    let ranging = RangingLoop::new(config, MockRadio::new(), outcome_rx, event_tx);
    let stats = ranging.spawn(shutdown_rx).await.unwrap().unwrap();

    let mut events = Vec::new();
    while let Some(event) = event_rx.recv().await {
        events.push(event);
    }
    (events, stats)
}

fn synced_frames(events: &[SyncEvent]) -> Vec<uwb_clocksync::SyncedFrame> {
    events
        .iter()
        .filter_map(|e| match e {
            SyncEvent::Synced { frame, .. } => Some(*frame),
            _ => None,
        })
        .collect()
}

// ===== Drift tracking =====

#[tokio::test]
async fn test_tracks_drifting_master() {
    init();

    let mut scenario = ClockScenario::new(MASTER_ID)
        .master_ppm(20.0)
        .origins(100_000_000_000, 300_000_000_000);
    let plan = schedule(&mut scenario, 10);
    let tag_times: Vec<f64> = plan.iter().skip(1).step_by(2).map(|(_, t)| *t).collect();

    let config = SyncConfig::default().initial_distance_m(0.0);
    let (events, stats) = run_schedule(config, plan.into_iter().map(|(o, _)| o).collect()).await;

    assert_eq!(stats.master_frames, 10);
    assert_eq!(stats.uncalibrated_drops, 1);
    assert_eq!(stats.synced_frames, 9);

    // First tag arrives after only one master frame.
    assert!(events.iter().any(|e| matches!(
        e,
        SyncEvent::Dropped {
            sequence: Some(0),
            reason: DropReason::Uncalibrated { master_frames: 1 },
        }
    )));

    for (frame, t) in synced_frames(&events).iter().zip(tag_times.iter().skip(1)) {
        let expected = scenario.master_at(*t).to_nanos();
        let error = (frame.synced_master_ns - expected).abs();
        assert!(
            error <= TOLERANCE_NS,
            "tag {} off by {error} ns",
            frame.sequence
        );
    }
}

#[tokio::test]
async fn test_drift_ratio_reports_ppm() {
    init();

    let mut scenario = ClockScenario::new(MASTER_ID).master_ppm(-35.0);
    let plan = schedule(&mut scenario, 3);

    let shared = create_shared_synchronizer(&SyncConfig::default().initial_distance_m(0.0));
    for (outcome, _) in plan {
        if let ReceiveOutcome::Received(frame) = outcome {
            let mut sync = shared.write().await;
            let _ = sync.process_payload(&frame.payload, 20, frame.rx_timestamp);
        }
    }

    let sync = shared.read().await;
    let ppm = sync.model().drift_ratio().unwrap().ppm();
    assert!((ppm + 35.0).abs() < 0.5, "ppm {ppm}");
}

// ===== Rollover =====

#[tokio::test]
async fn test_local_counter_wrap() {
    init();

    // Local counter wraps ~0.31 s in.
    let mut scenario = ClockScenario::new(MASTER_ID)
        .master_ppm(5.0)
        .origins(1_000_000_000, TIMESTAMP_MASK - 20_000_000_000);
    let plan = schedule(&mut scenario, 8);
    let tag_times: Vec<f64> = plan.iter().skip(1).step_by(2).map(|(_, t)| *t).collect();

    // Period of the 40-bit counter in nanoseconds.
    let period = DeviceTimestamp::MAX.to_nanos() + 1;
    let config = SyncConfig::default()
        .initial_distance_m(0.0)
        .rollover_period_ns(period);
    let (events, stats) = run_schedule(config, plan.into_iter().map(|(o, _)| o).collect()).await;

    assert_eq!(stats.synced_frames, 7);
    for (frame, t) in synced_frames(&events).iter().zip(tag_times.iter().skip(1)) {
        let expected = scenario.master_at(*t).to_nanos();
        assert!((frame.synced_master_ns - expected).abs() <= TOLERANCE_NS);
    }
}

// ===== Failure handling =====

#[tokio::test]
async fn test_timeouts_and_errors_do_not_disturb_sync() {
    init();

    let mut scenario = ClockScenario::new(MASTER_ID);
    let mut outcomes = vec![
        ReceiveOutcome::Received(scenario.master_frame(0.0)),
        ReceiveOutcome::Timeout,
        ReceiveOutcome::Error(uwb_clocksync::RxErrorKind::Crc),
        ReceiveOutcome::Received(scenario.master_frame(MASTER_PERIOD_NS)),
        ReceiveOutcome::Timeout,
    ];
    outcomes.push(ReceiveOutcome::Received(scenario.tag_frame(
        1.5 * MASTER_PERIOD_NS,
        7,
        *b"T9",
    )));

    let config = SyncConfig::default().initial_distance_m(0.0);
    let (events, stats) = run_schedule(config, outcomes).await;

    assert_eq!(stats.timeouts, 2);
    assert_eq!(stats.rx_errors, 1);
    let synced = synced_frames(&events);
    assert_eq!(synced.len(), 1);
    assert_eq!(synced[0].sender, *b"T9");
    assert_eq!(synced[0].master_frames_received, 2);
}

#[tokio::test]
async fn test_shutdown_while_waiting() {
    init();

    let (_outcome_tx, outcome_rx) = mpsc::channel::<ReceiveOutcome>(1);
    let (event_tx, _event_rx) = mpsc::channel(1);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let radio = MockRadio::new();

    let handle = RangingLoop::new(SyncConfig::default(), radio.clone(), outcome_rx, event_tx)
        .spawn(shutdown_rx);
    tokio::time::sleep(Duration::from_millis(20)).await;
    shutdown_tx.send(true).unwrap();

    let stats = tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(stats.receptions, 0);
    assert_eq!(radio.enables(), 1);
}
