// src/exec/runner.rs

//! One script invocation: spawn the interpreter, drain its output, race the
//! timeout and report a single terminal outcome.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::RunSection;
use crate::errors::{Result, ScriptrunError};
use crate::exec::command::InterpreterCommand;
use crate::exec::events::{RunEvent, RunOutcome};
use crate::exec::signal::RunningFlag;
use crate::types::{DrainPolicy, TimeoutAction};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(600_000);

/// How long output may keep draining after the interpreter has exited.
pub const EXIT_DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Everything needed for one invocation. Immutable once built.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub script: PathBuf,
    pub timeout: Duration,
    pub interpreter: InterpreterCommand,
}

impl RunRequest {
    pub fn new(script: impl Into<PathBuf>, interpreter: InterpreterCommand) -> Self {
        Self {
            script: script.into(),
            timeout: DEFAULT_TIMEOUT,
            interpreter,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Runs scripts through an external interpreter.
///
/// The runner itself holds only policy; every call to [`ProcessRunner::run`]
/// is an independent invocation with its own child process and its own
/// [`RunningFlag`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner {
    drain: DrainPolicy,
    on_timeout: TimeoutAction,
}

impl ProcessRunner {
    pub fn new(drain: DrainPolicy, on_timeout: TimeoutAction) -> Self {
        Self { drain, on_timeout }
    }

    pub fn from_config(cfg: &RunSection) -> Self {
        Self::new(cfg.drain, cfg.on_timeout)
    }

    /// Execute `request`, streaming output into `events`.
    ///
    /// Delivery order on `events`: all `Stdout` lines, then all `Stderr`
    /// lines, then exactly one `Finished`. `flag` is moved to running once
    /// the child is spawned and to finished right after `Finished` is sent.
    ///
    /// If the interpreter cannot be started this returns
    /// [`ScriptrunError::StartFailure`] without sending any event, and the
    /// flag is dropped without ever reaching the running phase.
    pub async fn run(
        &self,
        request: &RunRequest,
        events: mpsc::Sender<RunEvent>,
        flag: RunningFlag,
    ) -> Result<RunOutcome> {
        let mut child = self.spawn(request)?;
        flag.start();

        info!(
            script = %request.script.display(),
            interpreter = %request.interpreter,
            pid = ?child.id(),
            drain = ?self.drain,
            timeout_ms = request.timeout.as_millis() as u64,
            "script process started"
        );

        let outcome = match self.drain {
            DrainPolicy::Sequential => {
                self.run_sequential(&mut child, request.timeout, &events)
                    .await
            }
            DrainPolicy::Concurrent => {
                self.run_concurrent(&mut child, request.timeout, &events)
                    .await
            }
        };

        info!(
            script = %request.script.display(),
            outcome = %outcome,
            "script process finished"
        );

        if events.send(RunEvent::Finished(outcome.clone())).await.is_err() {
            debug!("run event receiver dropped before outcome delivery");
        }
        flag.finish();

        Ok(outcome)
    }

    fn spawn(&self, request: &RunRequest) -> Result<Child> {
        if !request.script.is_file() {
            return Err(ScriptrunError::StartFailure(format!(
                "script '{}' does not exist",
                request.script.display()
            )));
        }

        let mut cmd = request.interpreter.build(&request.script);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(self.on_timeout == TimeoutAction::Kill);

        cmd.spawn().map_err(|e| {
            error!(
                script = %request.script.display(),
                interpreter = %request.interpreter,
                error = %e,
                "failed to spawn interpreter"
            );
            ScriptrunError::StartFailure(format!(
                "spawning '{}' for '{}': {e}",
                request.interpreter,
                request.script.display()
            ))
        })
    }

    /// stdout to EOF, then stderr to EOF, then the exit wait bounded by
    /// `limit`. The timeout only covers the final step.
    async fn run_sequential(
        &self,
        child: &mut Child,
        limit: Duration,
        events: &mpsc::Sender<RunEvent>,
    ) -> RunOutcome {
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        if let Err(err) = drain_sequential(stdout, stderr, events).await {
            return self.abort(child, err).await;
        }

        match timeout(limit, child.wait()).await {
            Ok(Ok(status)) => outcome_from_status(status),
            Ok(Err(e)) => {
                let err = anyhow::Error::new(e).context("waiting for interpreter");
                self.abort(child, err).await
            }
            Err(_) => {
                self.handle_timeout(child).await;
                RunOutcome::TimedOut
            }
        }
    }

    /// Both pipes drained from spawn onwards while the exit wait races
    /// `limit`. Stderr lines arriving before stdout reaches EOF are parked
    /// and released afterwards, so the stdout-before-stderr order holds.
    ///
    /// Once the interpreter has exited its status is final. A background
    /// process may still hold the pipes open, so the remaining drain only
    /// gets [`EXIT_DRAIN_GRACE`].
    async fn run_concurrent(
        &self,
        child: &mut Child,
        limit: Duration,
        events: &mpsc::Sender<RunEvent>,
    ) -> RunOutcome {
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (err_tx, mut err_rx) = mpsc::unbounded_channel::<String>();

        let exited = {
            let stdout_side = async {
                if let Some(out) = stdout {
                    forward_lines(out, events, RunEvent::Stdout)
                        .await
                        .context("reading stdout")?;
                }
                while let Some(line) = err_rx.recv().await {
                    let _ = events.send(RunEvent::Stderr(line)).await;
                }
                Ok::<_, anyhow::Error>(())
            };

            let stderr_side = async move {
                if let Some(err) = stderr {
                    park_lines(err, &err_tx)
                        .await
                        .context("reading stderr")?;
                }
                Ok::<_, anyhow::Error>(())
            };

            let mut drain = Box::pin(async {
                tokio::try_join!(stdout_side, stderr_side).map(|_| ())
            });

            let wait = timeout(limit, async {
                let mut drained = false;
                loop {
                    tokio::select! {
                        res = &mut drain, if !drained => {
                            res?;
                            drained = true;
                        }
                        status = child.wait() => {
                            let status = status.context("waiting for interpreter")?;
                            return Ok::<_, anyhow::Error>((status, drained));
                        }
                    }
                }
            })
            .await;

            match wait {
                Ok(Ok((status, false))) => match timeout(EXIT_DRAIN_GRACE, &mut drain).await {
                    Ok(Ok(())) => Ok(Ok(status)),
                    Ok(Err(err)) => Ok(Err(err)),
                    Err(_) => {
                        warn!(
                            grace_ms = EXIT_DRAIN_GRACE.as_millis() as u64,
                            "interpreter exited but its output is still open; \
                             a background process may be holding it"
                        );
                        Ok(Ok(status))
                    }
                },
                Ok(Ok((status, true))) => Ok(Ok(status)),
                Ok(Err(err)) => Ok(Err(err)),
                Err(elapsed) => Err(elapsed),
            }
        };

        // The drain is gone by now; whatever stderr it left parked still
        // goes out after the stdout lines.
        while let Ok(line) = err_rx.try_recv() {
            let _ = events.send(RunEvent::Stderr(line)).await;
        }

        match exited {
            Ok(Ok(status)) => outcome_from_status(status),
            Ok(Err(err)) => self.abort(child, err).await,
            Err(_) => {
                self.handle_timeout(child).await;
                RunOutcome::TimedOut
            }
        }
    }

    async fn handle_timeout(&self, child: &mut Child) {
        match self.on_timeout {
            TimeoutAction::Kill => {
                warn!(pid = ?child.id(), "timeout elapsed; killing interpreter");
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill interpreter after timeout");
                }
            }
            TimeoutAction::Detach => {
                warn!(pid = ?child.id(), "timeout elapsed; leaving interpreter running");
            }
        }
    }

    /// Stream or wait failure: stop the child and report an abnormal outcome.
    async fn abort(&self, child: &mut Child, err: anyhow::Error) -> RunOutcome {
        error!(error = %format!("{err:#}"), "script run aborted");
        if let Err(e) = child.kill().await {
            debug!(error = %e, "kill after abort failed; process may already be gone");
        }
        RunOutcome::Aborted(format!("{err:#}"))
    }
}

fn outcome_from_status(status: ExitStatus) -> RunOutcome {
    match status.code() {
        Some(code) => RunOutcome::ExitCode(code),
        None => RunOutcome::Aborted(describe_codeless_exit(status)),
    }
}

#[cfg(unix)]
fn describe_codeless_exit(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(sig) => format!("terminated by signal {sig}"),
        None => "terminated without an exit code".to_string(),
    }
}

#[cfg(not(unix))]
fn describe_codeless_exit(_status: ExitStatus) -> String {
    "terminated without an exit code".to_string()
}

/// stdout to EOF, then stderr to EOF. Any read error ends the drain.
async fn drain_sequential<O, E>(
    stdout: Option<O>,
    stderr: Option<E>,
    events: &mpsc::Sender<RunEvent>,
) -> anyhow::Result<()>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    if let Some(out) = stdout {
        forward_lines(out, events, RunEvent::Stdout)
            .await
            .context("reading stdout")?;
    }
    if let Some(err) = stderr {
        forward_lines(err, events, RunEvent::Stderr)
            .await
            .context("reading stderr")?;
    }
    Ok(())
}

/// Read `reader` line by line and send each line as an event.
///
/// A closed receiver does not stop the loop; the pipe keeps being drained so
/// the child never blocks on a full buffer.
async fn forward_lines<R>(
    reader: R,
    events: &mpsc::Sender<RunEvent>,
    wrap: fn(String) -> RunEvent,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    while let Some(line) = next_line_lossy(&mut reader, &mut buf).await? {
        let _ = events.send(wrap(line)).await;
    }
    Ok(())
}

async fn park_lines<R>(reader: R, parked: &mpsc::UnboundedSender<String>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    while let Some(line) = next_line_lossy(&mut reader, &mut buf).await? {
        let _ = parked.send(line);
    }
    Ok(())
}

/// Like `AsyncBufReadExt::lines`, but tolerant of invalid UTF-8 and CRLF.
async fn next_line_lossy<R>(
    reader: &mut BufReader<R>,
    buf: &mut Vec<u8>,
) -> std::io::Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}
