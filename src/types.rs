use std::str::FromStr;
use serde::Deserialize;

/// How the runner drains the child's stdout/stderr relative to the
/// timeout-bounded exit wait.
///
/// - `Concurrent`: both pipes are drained from the moment the child is
///   spawned and the whole run is raced against the timeout (default).
/// - `Sequential`: stdout is read to EOF, then stderr, and only then is the
///   exit wait bounded by the timeout. A child that never closes stdout can
///   block this mode forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrainPolicy {
    Concurrent,
    Sequential,
}

impl Default for DrainPolicy {
    fn default() -> Self {
        DrainPolicy::Concurrent
    }
}

impl FromStr for DrainPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "concurrent" => Ok(DrainPolicy::Concurrent),
            "sequential" => Ok(DrainPolicy::Sequential),
            other => Err(format!(
                "invalid drain policy: {other} (expected \"concurrent\" or \"sequential\")"
            )),
        }
    }
}

/// What happens to the child process once the timeout fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutAction {
    /// Kill the child.
    Kill,
    /// Leave it running; only the outcome is reported.
    Detach,
}

impl Default for TimeoutAction {
    fn default() -> Self {
        TimeoutAction::Kill
    }
}

impl FromStr for TimeoutAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kill" => Ok(TimeoutAction::Kill),
            "detach" => Ok(TimeoutAction::Detach),
            other => Err(format!(
                "invalid on_timeout: {other} (expected \"kill\" or \"detach\")"
            )),
        }
    }
}

/// Whether the interpreter is started through the platform command shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellMode {
    /// `cmd /C` on Windows, direct execution elsewhere.
    Auto,
    Always,
    Never,
}

impl Default for ShellMode {
    fn default() -> Self {
        ShellMode::Auto
    }
}

impl ShellMode {
    /// Resolve against the current target platform.
    pub fn uses_shell(self) -> bool {
        match self {
            ShellMode::Auto => cfg!(windows),
            ShellMode::Always => true,
            ShellMode::Never => false,
        }
    }
}
