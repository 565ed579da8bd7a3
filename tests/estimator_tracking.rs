// tests/estimator_tracking.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use scriptrun::estimate::{ProgressEstimator, ProgressEvent, WeightSettings};
use scriptrun::exec::RunningFlag;

fn estimator() -> Arc<ProgressEstimator> {
    Arc::new(ProgressEstimator::new(
        WeightSettings::default(),
        Duration::from_millis(50),
    ))
}

/// Start tracking, keep the run active for `run_for`, then finish it.
async fn track_run(
    estimator: &Arc<ProgressEstimator>,
    run_for: Duration,
) -> (Option<Duration>, Vec<ProgressEvent>) {
    let (flag, signal) = RunningFlag::new();
    let (tx, mut rx) = mpsc::channel(256);

    let est = Arc::clone(estimator);
    let tracker = tokio::spawn(async move { est.track(signal, tx).await });

    flag.start();
    tokio::time::sleep(run_for).await;
    flag.finish();

    let duration = tracker.await.expect("tracker task panicked");

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    (duration, events)
}

#[tokio::test(start_paused = true)]
async fn halfway_through_a_one_second_estimate() {
    let est = estimator();
    est.record_run(1000.0).await;
    est.record_run(1000.0).await;
    assert!((est.estimate_ms().await - 1000.0).abs() < 1e-9);

    let (duration, events) = track_run(&est, Duration::from_millis(500)).await;

    assert_eq!(events.last(), Some(&ProgressEvent::Finished));
    assert_eq!(
        events
            .iter()
            .filter(|e| **e == ProgressEvent::Finished)
            .count(),
        1
    );

    let progress: Vec<f64> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert!(!progress.is_empty());
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    let last = *progress.last().unwrap();
    assert!((0.4..=0.5).contains(&last), "last progress {last}");

    for event in &events {
        if let ProgressEvent::Eta(secs) = event {
            assert!(*secs <= 1, "eta {secs}");
        }
    }

    let duration = duration.expect("run was started");
    assert!(duration >= Duration::from_millis(500));
    assert!(duration < Duration::from_millis(600));

    let history = est.history().await;
    assert_eq!(history.len(), 3);
    assert!((history[0] - duration.as_secs_f64() * 1000.0).abs() < 1e-6);
}

#[tokio::test(start_paused = true)]
async fn empty_history_only_reports_the_finish() {
    let est = estimator();

    let (duration, events) = track_run(&est, Duration::from_millis(300)).await;

    assert_eq!(events, vec![ProgressEvent::Finished]);
    assert!(duration.is_some());
    assert_eq!(est.history().await.len(), 1);
    // One run is still not enough for an estimate.
    assert_eq!(est.estimate_ms().await, 0.0);
}

#[tokio::test(start_paused = true)]
async fn overrun_clamps_progress_and_eta() {
    let est = estimator();
    est.record_run(100.0).await;
    est.record_run(100.0).await;

    let (_, events) = track_run(&est, Duration::from_millis(400)).await;

    let mut saw_full = false;
    for event in &events {
        match event {
            ProgressEvent::Progress(p) => {
                assert!((0.0..=1.0).contains(p));
                saw_full |= *p == 1.0;
            }
            ProgressEvent::Eta(secs) => assert!(*secs <= 1),
            ProgressEvent::Finished => {}
        }
    }
    assert!(saw_full);
}

#[tokio::test(start_paused = true)]
async fn run_that_never_starts_is_not_recorded() {
    let est = estimator();
    let (flag, signal) = RunningFlag::new();
    let (tx, mut rx) = mpsc::channel(8);

    let est2 = Arc::clone(&est);
    let tracker = tokio::spawn(async move { est2.track(signal, tx).await });
    drop(flag);

    assert_eq!(tracker.await.unwrap(), None);
    assert!(rx.recv().await.is_none());
    assert!(est.history().await.is_empty());
}

/// Spawn a tracker for an already started run and give it a chance to run.
async fn spawn_tracker(
    est: &Arc<ProgressEstimator>,
    signal: scriptrun::exec::RunningSignal,
) -> (
    tokio::task::JoinHandle<Option<Duration>>,
    mpsc::Receiver<ProgressEvent>,
) {
    let (tx, rx) = mpsc::channel(256);
    let est = Arc::clone(est);
    let handle = tokio::spawn(async move { est.track(signal, tx).await });
    tokio::task::yield_now().await;
    (handle, rx)
}

fn assert_durations(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-6, "{actual:?} vs {expected:?}");
    }
}

async fn drain(mut rx: mpsc::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test(start_paused = true)]
async fn overlapping_tracks_record_their_own_durations() {
    let est = estimator();

    let (flag_a, signal_a) = RunningFlag::new();
    let (flag_b, signal_b) = RunningFlag::new();
    flag_a.start();
    flag_b.start();

    let (a, rx_a) = spawn_tracker(&est, signal_a).await;
    let (b, rx_b) = spawn_tracker(&est, signal_b).await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    flag_a.finish();
    tokio::time::sleep(Duration::from_millis(200)).await;
    flag_b.finish();

    assert_eq!(a.await.unwrap(), Some(Duration::from_millis(200)));
    assert_eq!(b.await.unwrap(), Some(Duration::from_millis(400)));
    assert_durations(&est.history().await, &[400.0, 200.0]);
    assert_eq!(drain(rx_a).await, vec![ProgressEvent::Finished]);
    assert_eq!(drain(rx_b).await, vec![ProgressEvent::Finished]);
}

#[tokio::test(start_paused = true)]
async fn run_finishing_while_waiting_for_the_lock_keeps_its_duration() {
    let est = estimator();

    let (flag_a, signal_a) = RunningFlag::new();
    let (flag_b, signal_b) = RunningFlag::new();
    flag_a.start();
    flag_b.start();

    // A takes the history first and keeps it for a full second.
    let (a, rx_a) = spawn_tracker(&est, signal_a).await;
    let (b, rx_b) = spawn_tracker(&est, signal_b).await;

    tokio::time::sleep(Duration::from_millis(300)).await;
    flag_b.finish();
    tokio::time::sleep(Duration::from_millis(700)).await;
    flag_a.finish();

    assert_eq!(a.await.unwrap(), Some(Duration::from_millis(1000)));
    assert_eq!(b.await.unwrap(), Some(Duration::from_millis(300)));

    let history = est.history().await;
    assert_durations(&history, &[300.0, 1000.0]);

    assert_eq!(drain(rx_a).await, vec![ProgressEvent::Finished]);
    // B was already over when it got its turn: no samples, just the finish.
    assert_eq!(drain(rx_b).await, vec![ProgressEvent::Finished]);
}
