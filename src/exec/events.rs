// src/exec/events.rs

//! Typed events produced by a run, and the callback-style adapter for
//! front ends that prefer observers over channels.

use std::fmt;

use tokio::sync::mpsc;

/// Terminal result of one run. Produced exactly once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The interpreter exited on its own within the timeout.
    ExitCode(i32),
    /// The timeout elapsed first; no exit code is available.
    TimedOut,
    /// The run ended abnormally without a meaningful exit code: a stream
    /// could not be read, or the process was terminated by a signal.
    Aborted(String),
}

impl RunOutcome {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            RunOutcome::ExitCode(code) => Some(*code),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::ExitCode(0))
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::ExitCode(code) => write!(f, "exit code: {code}"),
            RunOutcome::TimedOut => write!(f, "timed out"),
            RunOutcome::Aborted(reason) => write!(f, "aborted: {reason}"),
        }
    }
}

/// Events flowing out of the runner, in delivery order:
/// stdout lines, then stderr lines, then exactly one `Finished`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// One line of standard output, without the trailing newline.
    Stdout(String),
    /// One line of standard error, without the trailing newline.
    Stderr(String),
    Finished(RunOutcome),
}

/// Callback view of [`RunEvent`]s.
pub trait RunObserver: Send {
    fn on_output_line(&mut self, line: &str);
    fn on_error_line(&mut self, line: &str);
    fn on_finish(&mut self, outcome: &RunOutcome);
}

impl RunEvent {
    /// Hand this event to the matching observer callback.
    pub fn deliver(&self, observer: &mut (impl RunObserver + ?Sized)) {
        match self {
            RunEvent::Stdout(line) => observer.on_output_line(line),
            RunEvent::Stderr(line) => observer.on_error_line(line),
            RunEvent::Finished(outcome) => observer.on_finish(outcome),
        }
    }
}

/// Drain a run event channel into `observer` until the sender side closes.
pub async fn dispatch_events(
    mut rx: mpsc::Receiver<RunEvent>,
    observer: &mut (impl RunObserver + ?Sized),
) {
    while let Some(event) = rx.recv().await {
        event.deliver(observer);
    }
}
