//! Failure tests for the monitoring cycle
//!
//! These tests verify that no failure is fatal and that failures never
//! corrupt the stored state:
//! - Metric fetch failures and timeouts
//! - Directory failures
//! - Delivery failures
//! - Persistence failures

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use tvl_monitor::{
    dispatch::DispatchOutcome,
    engine::ChangeEvaluation,
    notify::{NotificationKind, NotifyError},
    sources::FetchError,
    state::MonitorState,
    storage::{MemoryStore, StateStore},
};

use crate::helpers::*;

fn latched_state() -> MonitorState {
    MonitorState {
        last_value: Some(1_000_000.0),
        threshold: 3.0,
        alert_sent: true,
        last_checked_at: Some(start_time()),
        alert_reference: Some(960_000.0),
        last_status_at: Some(start_time()),
        samples_since_status: 4,
    }
}

#[tokio::test]
async fn test_fetch_failure_leaves_state_untouched() {
    let store = Arc::new(MemoryStore::with_state(latched_state()));
    let directory = Arc::new(ScriptedDirectory::fixed(&["a@example.com"]));
    let notifier = Arc::new(RecordingNotifier::new());

    let mut monitor = create_test_monitor(
        Arc::new(ScriptedSource::new(vec![Err(FetchError::Status(502))])),
        store.clone(),
        directory.clone(),
        notifier.clone(),
    );

    let report = monitor.run_cycle(minutes(1)).await;

    assert_eq!(report.change, ChangeEvaluation::Unavailable);
    assert_eq!(report.fetch_error, Some(FetchError::Status(502)));
    assert_eq!(report.state, latched_state());
    assert!(!report.persisted);
    assert!(report.deliveries.is_empty());

    assert_eq!(store.snapshot().await, Some(latched_state()));
    assert_eq!(store.save_count(), 0);
    assert_eq!(directory.call_count(), 0);
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn test_outage_is_not_a_drop_to_zero() {
    let notifier = Arc::new(RecordingNotifier::new());
    let store = Arc::new(MemoryStore::new());

    let mut monitor = create_test_monitor(
        Arc::new(ScriptedSource::new(vec![
            Ok(1_000_000.0),
            Err(FetchError::Request("connection reset".to_string())),
            Err(FetchError::Malformed("'tvl' field is missing".to_string())),
            Ok(1_010_000.0),
        ])),
        store.clone(),
        Arc::new(ScriptedDirectory::fixed(&["a@example.com"])),
        notifier.clone(),
    );

    for cycle in 0..4 {
        monitor.run_cycle(minutes(cycle)).await;
    }

    // only the baseline went out; the recovery compares against the last real value
    assert_eq!(notifier.subjects(), vec!["TVL Monitoring Started"]);
    let state = store.snapshot().await.unwrap();
    assert_eq!(state.last_value, Some(1_010_000.0));
    assert!(!state.alert_sent);
}

#[tokio::test]
async fn test_slow_source_times_out() {
    let store = Arc::new(MemoryStore::with_state(latched_state()));

    let mut monitor = create_test_monitor(
        Arc::new(ScriptedSource::slow(2_000_000.0, Duration::from_secs(5))),
        store.clone(),
        Arc::new(ScriptedDirectory::fixed(&["a@example.com"])),
        Arc::new(RecordingNotifier::new()),
    );

    let report = monitor.run_cycle(minutes(1)).await;

    assert_eq!(report.fetch_error, Some(FetchError::Timeout));
    assert_eq!(store.snapshot().await, Some(latched_state()));
}

#[tokio::test]
async fn test_directory_failure_still_saves_state() {
    let store = Arc::new(MemoryStore::with_state(MonitorState {
        last_value: Some(1_000_000.0),
        threshold: 3.0,
        ..Default::default()
    }));
    let notifier = Arc::new(RecordingNotifier::new());

    let mut monitor = create_test_monitor(
        Arc::new(ScriptedSource::values(&[1_050_000.0])),
        store.clone(),
        Arc::new(ScriptedDirectory::failing()),
        notifier.clone(),
    );

    let report = monitor.run_cycle(minutes(1)).await;

    assert!(report.persisted);
    assert_eq!(
        report.deliveries,
        vec![DispatchOutcome::DirectoryUnavailable {
            kind: NotificationKind::Alert,
            error: FetchError::Status(500),
        }]
    );
    assert!(report.deliveries[0].is_failure());
    assert!(notifier.messages().is_empty());

    // the missed alert is not redelivered, the latch stays set
    let state = store.snapshot().await.unwrap();
    assert!(state.alert_sent);
    assert_eq!(state.last_value, Some(1_050_000.0));
}

#[tokio::test]
async fn test_delivery_failure_does_not_roll_back() {
    let store = Arc::new(MemoryStore::with_state(MonitorState {
        last_value: Some(1_000_000.0),
        threshold: 3.0,
        ..Default::default()
    }));

    let mut monitor = create_test_monitor(
        Arc::new(ScriptedSource::values(&[950_000.0])),
        store.clone(),
        Arc::new(ScriptedDirectory::fixed(&["a@example.com"])),
        Arc::new(RecordingNotifier::down()),
    );

    let report = monitor.run_cycle(minutes(1)).await;

    assert_matches!(
        &report.deliveries[..],
        [DispatchOutcome::DeliveryFailed {
            kind: NotificationKind::Alert,
            error: NotifyError::Transport(_),
        }]
    );
    assert!(report.persisted);
    assert!(store.snapshot().await.unwrap().alert_sent);
}

#[tokio::test]
async fn test_partial_delivery_is_reported_per_address() {
    let notifier = Arc::new(RecordingNotifier::failing_for(&["bounce@example.com"]));

    let mut monitor = create_test_monitor(
        Arc::new(ScriptedSource::values(&[100.0])),
        Arc::new(MemoryStore::new()),
        Arc::new(ScriptedDirectory::fixed(&[
            "a@example.com",
            "bounce@example.com",
            "c@example.com",
        ])),
        notifier.clone(),
    );

    let report = monitor.run_cycle(start_time()).await;

    let DispatchOutcome::Delivered { report: delivery, .. } = &report.deliveries[0] else {
        panic!("expected a delivery report, got {:?}", report.deliveries);
    };
    assert_eq!(
        delivery.delivered,
        recipients(&["a@example.com", "c@example.com"])
    );
    assert_eq!(delivery.failed.len(), 1);
    assert_eq!(delivery.failed[0].0, "bounce@example.com");
    assert!(report.deliveries[0].is_failure());
}

#[tokio::test]
async fn test_failed_save_is_carried_to_next_cycle() {
    let store = Arc::new(MemoryStore::new());
    store.set_fail_saves(true);
    let notifier = Arc::new(RecordingNotifier::new());
    let source = Arc::new(ScriptedSource::values(&[1_000_000.0, 1_001_000.0, 1_002_000.0]));

    let mut monitor = create_test_monitor(
        source.clone(),
        store.clone(),
        Arc::new(ScriptedDirectory::fixed(&["a@example.com"])),
        notifier.clone(),
    );

    let first = monitor.run_cycle(minutes(0)).await;
    assert!(!first.persisted);
    assert_eq!(first.change, ChangeEvaluation::Baseline);
    assert!(store.snapshot().await.is_none());

    // the in-memory state is used; no second baseline
    let second = monitor.run_cycle(minutes(1)).await;
    assert!(!second.persisted);
    assert_eq!(second.change, ChangeEvaluation::Stable);

    store.set_fail_saves(false);
    let third = monitor.run_cycle(minutes(2)).await;
    assert!(third.persisted);
    assert_eq!(store.load().await.last_value, Some(1_002_000.0));

    assert_eq!(notifier.subjects(), vec!["TVL Monitoring Started"]);
    assert_eq!(source.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_long_recipient_list_is_not_cut_off() {
    let addresses = [
        "a@example.com",
        "b@example.com",
        "c@example.com",
        "d@example.com",
        "e@example.com",
    ];
    // 5 x 200ms in total is well past the 500ms per-call timeout
    let notifier = Arc::new(RecordingNotifier::slow(Duration::from_millis(200)));

    let mut monitor = create_test_monitor(
        Arc::new(ScriptedSource::values(&[1_000_000.0])),
        Arc::new(MemoryStore::new()),
        Arc::new(ScriptedDirectory::fixed(&addresses)),
        notifier.clone(),
    );

    let report = monitor.run_cycle(start_time()).await;

    let DispatchOutcome::Delivered { report: delivery, .. } = &report.deliveries[0] else {
        panic!("expected a delivery report, got {:?}", report.deliveries);
    };
    assert_eq!(delivery.delivered, recipients(&addresses));
    assert!(delivery.failed.is_empty());
    assert!(!report.deliveries[0].is_failure());
    assert_eq!(notifier.messages()[0].to, recipients(&addresses));
}
