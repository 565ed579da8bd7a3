// src/engine/mod.rs

//! Orchestration of a run: the runner and the progress estimator are
//! started together on one running signal, and their event streams are
//! relayed to a single front-end observer.

use std::time::Duration;

use crate::estimate::ProgressObserver;
use crate::exec::{RunObserver, RunOutcome};

pub mod relay;
pub mod session;

pub use relay::relay_events;
pub use session::Session;

/// Capacity of the per-run event channels.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Everything a front end needs to observe a run.
pub trait SessionObserver: RunObserver + ProgressObserver {}

impl<T: RunObserver + ProgressObserver + ?Sized> SessionObserver for T {}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Duration observed by the estimator (and recorded into its history).
    pub duration: Option<Duration>,
}
