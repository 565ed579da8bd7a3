// src/exec/signal.rs

//! The shared "is this run still active" signal.
//!
//! Exactly one writer ([`RunningFlag`], owned by the runner) and any number
//! of readers ([`RunningSignal`]). Built on a `tokio::sync::watch` channel so
//! readers can either sample the current value or await the transition.
//!
//! The writer stamps each transition with the instant it happened, so a
//! reader that only gets to look later still sees when the run really
//! started and ended.

use tokio::sync::watch;
use tokio::time::Instant;

/// Lifecycle of a single run as seen through the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
    Finished,
}

#[derive(Debug, Clone, Copy)]
struct RunState {
    phase: RunPhase,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
}

/// Write side. Not `Clone`: only the runner may move the phase forward.
#[derive(Debug)]
pub struct RunningFlag {
    tx: watch::Sender<RunState>,
}

/// Read side.
#[derive(Debug, Clone)]
pub struct RunningSignal {
    rx: watch::Receiver<RunState>,
}

impl RunningFlag {
    /// Create a fresh idle flag and its first reader.
    pub fn new() -> (RunningFlag, RunningSignal) {
        let (tx, rx) = watch::channel(RunState {
            phase: RunPhase::Idle,
            started_at: None,
            finished_at: None,
        });
        (RunningFlag { tx }, RunningSignal { rx })
    }

    /// Idle -> Running. No-op in any other phase.
    pub fn start(&self) {
        self.tx.send_if_modified(|state| {
            if state.phase == RunPhase::Idle {
                state.phase = RunPhase::Running;
                state.started_at = Some(Instant::now());
                true
            } else {
                false
            }
        });
    }

    /// Mark the run finished. Consumes the flag, so this happens at most once.
    pub fn finish(self) {
        self.tx.send_modify(|state| {
            state.phase = RunPhase::Finished;
            state.finished_at = Some(Instant::now());
        });
    }
}

impl RunningSignal {
    /// Current phase. A dropped writer counts as `Finished`.
    pub fn phase(&self) -> RunPhase {
        if self.rx.has_changed().is_err() {
            return RunPhase::Finished;
        }
        self.rx.borrow().phase
    }

    pub fn is_running(&self) -> bool {
        self.phase() == RunPhase::Running
    }

    /// When the run entered `Running`, if it did.
    pub fn started_at(&self) -> Option<Instant> {
        self.rx.borrow().started_at
    }

    /// When the run was marked finished. `None` while running, and also
    /// when the writer was dropped without calling `finish`.
    pub fn finished_at(&self) -> Option<Instant> {
        self.rx.borrow().finished_at
    }

    /// Wait until the run leaves `Idle`.
    ///
    /// Returns `false` if the writer went away before the run ever started
    /// (e.g. the interpreter could not be spawned).
    pub async fn wait_started(&mut self) -> bool {
        self.rx
            .wait_for(|state| state.phase != RunPhase::Idle)
            .await
            .is_ok()
    }

    /// Wait until the run is no longer running.
    pub async fn wait_finished(&mut self) {
        let _ = self
            .rx
            .wait_for(|state| state.phase == RunPhase::Finished)
            .await;
    }
}
