// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running a script through the
//! configured interpreter, using `tokio::process::Command`, and reporting
//! what happens as typed events.
//!
//! - [`command`] builds the interpreter invocation per platform.
//! - [`runner`] owns one invocation: spawn, drain, timeout, outcome.
//! - [`events`] defines `RunEvent`/`RunOutcome` and the observer adapter.
//! - [`signal`] is the single-writer "run is active" flag shared with the
//!   progress estimator.

pub mod command;
pub mod events;
pub mod runner;
pub mod signal;

pub use command::InterpreterCommand;
pub use events::{dispatch_events, RunEvent, RunObserver, RunOutcome};
pub use runner::{ProcessRunner, RunRequest, DEFAULT_TIMEOUT};
pub use signal::{RunPhase, RunningFlag, RunningSignal};
