// src/estimate/tracker.rs

//! Live progress/ETA reporting for a run, backed by [`RunHistory`].

use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::config::EstimatorSection;
use crate::estimate::history::{RunHistory, WeightSettings};
use crate::exec::RunningSignal;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Updates produced while a run is tracked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressEvent {
    /// Estimated seconds remaining, never negative.
    Eta(u64),
    /// Fraction of the estimate already elapsed, within `[0, 1]`.
    Progress(f64),
    /// The run is over. Sent exactly once, after every other update.
    Finished,
}

/// Callback view of [`ProgressEvent`]s.
pub trait ProgressObserver: Send {
    fn on_eta_update(&mut self, seconds_left: u64);
    fn on_progress_update(&mut self, fraction: f64);
    fn on_run_finished(&mut self);
}

impl ProgressEvent {
    pub fn deliver(&self, observer: &mut (impl ProgressObserver + ?Sized)) {
        match *self {
            ProgressEvent::Eta(secs) => observer.on_eta_update(secs),
            ProgressEvent::Progress(fraction) => observer.on_progress_update(fraction),
            ProgressEvent::Finished => observer.on_run_finished(),
        }
    }
}

/// Drain a progress channel into `observer` until the sender side closes.
pub async fn dispatch_progress(
    mut rx: mpsc::Receiver<ProgressEvent>,
    observer: &mut (impl ProgressObserver + ?Sized),
) {
    while let Some(event) = rx.recv().await {
        event.deliver(observer);
    }
}

/// One sample of progress for a given estimate and elapsed time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    pub eta_secs: u64,
    pub fraction: f64,
}

impl ProgressSample {
    /// Both arguments in milliseconds; `estimated_total_ms` must be positive.
    pub fn compute(estimated_total_ms: f64, elapsed_ms: f64) -> Self {
        let eta = ((estimated_total_ms - elapsed_ms) / 1000.0).round().max(0.0);
        let fraction = (elapsed_ms / estimated_total_ms).clamp(0.0, 1.0);
        Self {
            eta_secs: eta as u64,
            fraction,
        }
    }
}

/// Predicts run time from past runs and reports progress while a run is
/// active.
///
/// The history sits behind an async mutex. [`ProgressEstimator::track`]
/// holds it from the moment it starts sampling until the duration is
/// recorded, so overlapping runs on one estimator take turns instead of
/// interleaving their history updates. Durations come from the instants
/// stamped on the running signal, so a run that waited for the lock is
/// still recorded with its real length.
#[derive(Debug)]
pub struct ProgressEstimator {
    history: Mutex<RunHistory>,
    poll_interval: Duration,
}

impl Default for ProgressEstimator {
    fn default() -> Self {
        Self::new(WeightSettings::default(), DEFAULT_POLL_INTERVAL)
    }
}

impl ProgressEstimator {
    pub fn new(settings: WeightSettings, poll_interval: Duration) -> Self {
        Self {
            history: Mutex::new(RunHistory::new(settings)),
            poll_interval,
        }
    }

    pub fn from_config(cfg: &EstimatorSection) -> Self {
        Self::new(WeightSettings::from_config(cfg), cfg.poll_interval())
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Current weighted estimate in milliseconds (0 when unavailable).
    pub async fn estimate_ms(&self) -> f64 {
        self.history.lock().await.estimate_ms()
    }

    /// Recorded durations in milliseconds, most recent first.
    pub async fn history(&self) -> Vec<f64> {
        self.history.lock().await.durations().collect()
    }

    /// Add a duration without tracking a run.
    pub async fn record_run(&self, duration_ms: f64) {
        self.history.lock().await.record(duration_ms);
    }

    /// Forget all recorded runs.
    pub async fn clear_runs(&self) {
        self.history.lock().await.clear();
        debug!("run history cleared");
    }

    /// Follow one run from start to finish.
    ///
    /// Waits for `signal` to leave idle, then samples progress every poll
    /// interval while the run is active. Without an estimate (fewer than
    /// two recorded runs) it only waits. When the run ends it sends
    /// `Finished` and records the observed duration.
    ///
    /// Returns the observed duration, or `None` if the run never started.
    pub async fn track(
        &self,
        mut signal: RunningSignal,
        events: mpsc::Sender<ProgressEvent>,
    ) -> Option<Duration> {
        if !signal.wait_started().await {
            debug!("run never started; nothing to track");
            return None;
        }
        let start = signal.started_at().unwrap_or_else(Instant::now);

        let mut history = self.history.lock().await;
        let estimated_total_ms = history.estimate_ms();
        debug!(
            estimated_total_ms,
            history_len = history.len(),
            waited_ms = start.elapsed().as_millis() as u64,
            "tracking run progress"
        );

        while signal.is_running() {
            if estimated_total_ms > 0.0 {
                let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
                let sample = ProgressSample::compute(estimated_total_ms, elapsed_ms);
                let _ = events.send(ProgressEvent::Eta(sample.eta_secs)).await;
                let _ = events.send(ProgressEvent::Progress(sample.fraction)).await;
            }

            tokio::select! {
                _ = sleep(self.poll_interval) => {}
                _ = signal.wait_finished() => {}
            }
        }

        let _ = events.send(ProgressEvent::Finished).await;

        let end = signal.finished_at().unwrap_or_else(Instant::now);
        let elapsed = end.saturating_duration_since(start);
        history.record(elapsed.as_secs_f64() * 1000.0);
        info!(
            duration_ms = elapsed.as_millis() as u64,
            estimated_total_ms,
            "recorded run duration"
        );

        Some(elapsed)
    }
}
