// src/engine/session.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::engine::{relay_events, RunReport, SessionObserver, EVENT_CHANNEL_CAPACITY};
use crate::errors::Result;
use crate::estimate::{ProgressEstimator, ProgressEvent};
use crate::exec::{InterpreterCommand, ProcessRunner, RunEvent, RunRequest, RunningFlag};
use crate::store::{normalize_name, ScriptStore};

/// Editor-side state: the script store, the active script and the run
/// machinery, all passed in explicitly.
///
/// Run history lives in the estimator and is tied to the active script:
/// switching to a different stored script clears it.
#[derive(Debug)]
pub struct Session {
    store: Arc<dyn ScriptStore>,
    runner: ProcessRunner,
    estimator: Arc<ProgressEstimator>,
    interpreter: InterpreterCommand,
    timeout: Duration,
    extension: String,
    active: Option<String>,
}

impl Session {
    pub fn from_config(cfg: &ConfigFile, store: Arc<dyn ScriptStore>) -> Self {
        Self {
            store,
            runner: ProcessRunner::from_config(&cfg.run),
            estimator: Arc::new(ProgressEstimator::from_config(&cfg.estimator)),
            interpreter: InterpreterCommand::from_config(&cfg.interpreter),
            timeout: cfg.run.timeout(),
            extension: cfg.store.extension.clone(),
            active: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<dyn ScriptStore> {
        &self.store
    }

    pub fn estimator(&self) -> &ProgressEstimator {
        &self.estimator
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Name of the script currently open, if any.
    pub fn active_script(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Make `name` the active script and return its contents.
    ///
    /// Opening a different script than the active one clears the run
    /// history, so timings of one script never feed estimates for another.
    pub async fn open(&mut self, name: &str) -> Result<String> {
        let content = self.store.load(name)?;
        let name = normalize_name(name, &self.extension)?;

        if self.active.as_deref() != Some(name.as_str()) {
            debug!(
                previous = ?self.active,
                next = %name,
                "active script changed; clearing run history"
            );
            self.estimator.clear_runs().await;
            self.active = Some(name);
        }

        Ok(content)
    }

    /// Open and run a stored script.
    pub async fn run_stored<O>(&mut self, name: &str, observer: &mut O) -> Result<RunReport>
    where
        O: SessionObserver + ?Sized,
    {
        self.open(name).await?;
        let path = self.store.path_of(name)?;
        self.run_path(&path, observer).await
    }

    /// Run unsaved text by writing it to the store's scratch script first.
    ///
    /// The scratch script is removed again once the run is over, whatever
    /// its outcome. The active script and its history are left alone.
    pub async fn run_text<O>(&mut self, text: &str, observer: &mut O) -> Result<RunReport>
    where
        O: SessionObserver + ?Sized,
    {
        let path = self.store.save_scratch(text)?;

        let report = self.run_path(&path, observer).await;

        if let Err(e) = self.store.remove_scratch() {
            warn!(error = %e, "failed to remove scratch script");
        }
        report
    }

    /// Run the script at `path` with live progress.
    ///
    /// The runner and the estimator run as separate tasks sharing one
    /// running signal; their events are relayed to `observer` from the
    /// calling task. A start failure is returned as an error and no
    /// observer callback is invoked.
    pub async fn run_path<O>(&self, path: &Path, observer: &mut O) -> Result<RunReport>
    where
        O: SessionObserver + ?Sized,
    {
        let request = RunRequest::new(PathBuf::from(path), self.interpreter.clone())
            .with_timeout(self.timeout);

        let (flag, signal) = RunningFlag::new();
        let (run_tx, run_rx) = mpsc::channel::<RunEvent>(EVENT_CHANNEL_CAPACITY);
        let (progress_tx, progress_rx) = mpsc::channel::<ProgressEvent>(EVENT_CHANNEL_CAPACITY);

        let estimator = Arc::clone(&self.estimator);
        let tracker = tokio::spawn(async move { estimator.track(signal, progress_tx).await });

        let runner = self.runner;
        let run = tokio::spawn(async move { runner.run(&request, run_tx, flag).await });

        relay_events(run_rx, progress_rx, observer).await;

        let outcome = run.await.map_err(anyhow::Error::from)??;
        let duration = tracker.await.map_err(anyhow::Error::from)?;

        info!(
            script = %path.display(),
            outcome = %outcome,
            duration_ms = ?duration.map(|d| d.as_millis() as u64),
            "run complete"
        );

        Ok(RunReport { outcome, duration })
    }
}
