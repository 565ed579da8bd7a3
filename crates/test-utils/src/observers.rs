#![allow(dead_code)]

use scriptrun::estimate::ProgressObserver;
use scriptrun::exec::{RunObserver, RunOutcome};

/// Everything an observer can be told, in delivery order.
#[derive(Debug, Clone, PartialEq)]
pub enum Seen {
    Stdout(String),
    Stderr(String),
    Finished(RunOutcome),
    Eta(u64),
    Progress(f64),
    RunFinished,
}

/// Observer that records every callback for later assertions.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub seen: Vec<Seen>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdout_lines(&self) -> Vec<&str> {
        self.seen
            .iter()
            .filter_map(|s| match s {
                Seen::Stdout(line) => Some(line.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn stderr_lines(&self) -> Vec<&str> {
        self.seen
            .iter()
            .filter_map(|s| match s {
                Seen::Stderr(line) => Some(line.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn outcomes(&self) -> Vec<&RunOutcome> {
        self.seen
            .iter()
            .filter_map(|s| match s {
                Seen::Finished(outcome) => Some(outcome),
                _ => None,
            })
            .collect()
    }

    /// Run-side events only (output lines and the outcome), in order.
    pub fn run_events(&self) -> Vec<&Seen> {
        self.seen
            .iter()
            .filter(|s| matches!(s, Seen::Stdout(_) | Seen::Stderr(_) | Seen::Finished(_)))
            .collect()
    }
}

impl RunObserver for RecordingObserver {
    fn on_output_line(&mut self, line: &str) {
        self.seen.push(Seen::Stdout(line.to_string()));
    }

    fn on_error_line(&mut self, line: &str) {
        self.seen.push(Seen::Stderr(line.to_string()));
    }

    fn on_finish(&mut self, outcome: &RunOutcome) {
        self.seen.push(Seen::Finished(outcome.clone()));
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_eta_update(&mut self, seconds_left: u64) {
        self.seen.push(Seen::Eta(seconds_left));
    }

    fn on_progress_update(&mut self, fraction: f64) {
        self.seen.push(Seen::Progress(fraction));
    }

    fn on_run_finished(&mut self) {
        self.seen.push(Seen::RunFinished);
    }
}
