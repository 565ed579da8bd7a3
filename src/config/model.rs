// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::{DrainPolicy, ShellMode, TimeoutAction};

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [interpreter]
/// command = "kotlinc"
/// args = ["-script"]
///
/// [run]
/// timeout_ms = 600000
/// drain = "concurrent"
///
/// [estimator]
/// poll_interval_ms = 50
/// history_capacity = 10
///
/// [store]
/// dir = "scripts"
/// extension = "kts"
///
/// [editor]
/// keywords_file = "keywords.txt"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub interpreter: InterpreterSection,

    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub estimator: EstimatorSection,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub editor: EditorSection,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`) or
/// `Default`, so holders can rely on the invariants checked there.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub interpreter: InterpreterSection,
    pub run: RunSection,
    pub estimator: EstimatorSection,
    pub store: StoreSection,
    pub editor: EditorSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            interpreter: raw.interpreter,
            run: raw.run,
            estimator: raw.estimator,
            store: raw.store,
            editor: raw.editor,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }
}

/// `[interpreter]` section: the external command every script is run with.
#[derive(Debug, Clone, Deserialize)]
pub struct InterpreterSection {
    /// Interpreter binary, resolved through `PATH`.
    #[serde(default = "default_command")]
    pub command: String,

    /// Fixed flags placed between the binary and the script path.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// `"auto"`, `"always"` or `"never"`.
    #[serde(default)]
    pub shell: ShellMode,
}

fn default_command() -> String {
    "kotlinc".to_string()
}

fn default_args() -> Vec<String> {
    vec!["-script".to_string()]
}

impl Default for InterpreterSection {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            shell: ShellMode::default(),
        }
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub drain: DrainPolicy,

    #[serde(default)]
    pub on_timeout: TimeoutAction,
}

fn default_timeout_ms() -> u64 {
    600_000
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            drain: DrainPolicy::default(),
            on_timeout: TimeoutAction::default(),
        }
    }
}

impl RunSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// `[estimator]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct EstimatorSection {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How many past run durations are remembered.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Share of the history slots (most recent first) that get the high
    /// weight. At least one slot is always high-weighted.
    #[serde(default = "default_high_weight_fraction")]
    pub high_weight_fraction: f64,

    /// Weight carried by the high-weighted slots.
    #[serde(default = "default_high_weight")]
    pub high_weight: f64,
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_history_capacity() -> usize {
    10
}

fn default_high_weight_fraction() -> f64 {
    0.1
}

fn default_high_weight() -> f64 {
    0.9
}

impl Default for EstimatorSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            history_capacity: default_history_capacity(),
            high_weight_fraction: default_high_weight_fraction(),
            high_weight: default_high_weight(),
        }
    }
}

impl EstimatorSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    /// Directory holding the stored scripts. Relative paths are resolved
    /// against the directory of the config file.
    #[serde(default = "default_store_dir")]
    pub dir: PathBuf,

    /// Supported script extension, without the leading dot.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Name of the scratch script used when running unsaved text.
    #[serde(default = "default_scratch_name")]
    pub scratch_name: String,
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("scripts")
}

fn default_extension() -> String {
    "kts".to_string()
}

fn default_scratch_name() -> String {
    crate::store::DEFAULT_SCRATCH_NAME.to_string()
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
            extension: default_extension(),
            scratch_name: default_scratch_name(),
        }
    }
}

/// `[editor]` section: presentation of stored scripts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditorSection {
    /// File with one highlight keyword per line, replacing the built-in
    /// list. Relative paths are resolved against the directory of the
    /// config file.
    #[serde(default)]
    pub keywords_file: Option<PathBuf>,
}
