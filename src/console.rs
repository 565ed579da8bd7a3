// src/console.rs

//! Terminal front end for a run.
//!
//! Script stdout goes to our stdout untouched. Everything else (the stderr
//! block, progress and the final result) goes to our stderr.

use std::io::{self, IsTerminal, Write};

use crate::estimate::ProgressObserver;
use crate::exec::{RunObserver, RunOutcome};

pub const ERROR_HEADER: &str = "Error occurred during the execution:";

const BAR_WIDTH: usize = 30;

/// Observer that renders a run to two writers.
///
/// When `interactive` is set the progress line is redrawn in place;
/// otherwise an ETA line is printed only when the value changes.
#[derive(Debug)]
pub struct ConsoleObserver<O, E> {
    out: O,
    err: E,
    interactive: bool,
    error_header_shown: bool,
    progress_shown: bool,
    eta: Option<u64>,
    fraction: f64,
    last_printed_eta: Option<u64>,
    outcome: Option<RunOutcome>,
}

impl ConsoleObserver<io::Stdout, io::Stderr> {
    /// Observer on the process' own stdout and stderr.
    pub fn stdio() -> Self {
        let interactive = io::stderr().is_terminal();
        Self::new(io::stdout(), io::stderr(), interactive)
    }
}

impl<O: Write, E: Write> ConsoleObserver<O, E> {
    pub fn new(out: O, err: E, interactive: bool) -> Self {
        Self {
            out,
            err,
            interactive,
            error_header_shown: false,
            progress_shown: false,
            eta: None,
            fraction: 0.0,
            last_printed_eta: None,
            outcome: None,
        }
    }

    /// Reset per-run state and print the initial estimate line.
    pub fn begin_run(&mut self, has_estimate: bool) {
        self.error_header_shown = false;
        self.progress_shown = false;
        self.eta = None;
        self.fraction = 0.0;
        self.last_printed_eta = None;
        self.outcome = None;
        if !has_estimate {
            let _ = writeln!(self.err, "{}", eta_label(None));
        }
    }

    /// Outcome of the last finished run.
    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    pub fn into_writers(self) -> (O, E) {
        (self.out, self.err)
    }

    fn clear_progress(&mut self) {
        if self.interactive && self.progress_shown {
            let _ = write!(self.err, "\r\x1b[2K");
            let _ = self.err.flush();
            self.progress_shown = false;
        }
    }

    fn draw_progress(&mut self) {
        if self.interactive {
            let filled = ((self.fraction * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
            let _ = write!(
                self.err,
                "\r\x1b[2K[{}{}] {:>3}%  {}",
                "#".repeat(filled),
                "-".repeat(BAR_WIDTH - filled),
                (self.fraction * 100.0).round() as u64,
                eta_label(self.eta)
            );
            let _ = self.err.flush();
            self.progress_shown = true;
        } else if self.eta != self.last_printed_eta {
            let _ = writeln!(self.err, "{}", eta_label(self.eta));
            self.last_printed_eta = self.eta;
        }
    }
}

/// `ETA: N/A` without an estimate, `ETA: 3 s` otherwise.
pub fn eta_label(seconds_left: Option<u64>) -> String {
    match seconds_left {
        Some(secs) => format!("ETA: {secs} s"),
        None => "ETA: N/A".to_string(),
    }
}

impl<O: Write + Send, E: Write + Send> RunObserver for ConsoleObserver<O, E> {
    fn on_output_line(&mut self, line: &str) {
        self.clear_progress();
        let _ = writeln!(self.out, "{line}");
        let _ = self.out.flush();
    }

    fn on_error_line(&mut self, line: &str) {
        self.clear_progress();
        if !self.error_header_shown {
            let _ = writeln!(self.err, "{ERROR_HEADER}");
            self.error_header_shown = true;
        }
        let _ = writeln!(self.err, "{line}");
    }

    fn on_finish(&mut self, outcome: &RunOutcome) {
        self.clear_progress();
        let _ = writeln!(self.err, "{outcome}");
        let _ = self.err.flush();
        self.outcome = Some(outcome.clone());
    }
}

impl<O: Write + Send, E: Write + Send> ProgressObserver for ConsoleObserver<O, E> {
    fn on_eta_update(&mut self, seconds_left: u64) {
        self.eta = Some(seconds_left);
    }

    fn on_progress_update(&mut self, fraction: f64) {
        self.fraction = fraction;
        self.draw_progress();
    }

    fn on_run_finished(&mut self) {
        self.clear_progress();
    }
}
