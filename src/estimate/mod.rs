// src/estimate/mod.rs

//! Run-time estimation from past runs.
//!
//! - [`history`] keeps the bounded duration history and the weight vector.
//! - [`tracker`] turns the estimate into live progress/ETA updates for a
//!   running script and records how long it actually took.

pub mod history;
pub mod tracker;

pub use history::{RunHistory, WeightSettings, WeightVector};
pub use tracker::{
    dispatch_progress, ProgressEstimator, ProgressEvent, ProgressObserver, ProgressSample,
    DEFAULT_POLL_INTERVAL,
};
