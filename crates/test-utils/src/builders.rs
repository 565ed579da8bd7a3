#![allow(dead_code)]

use scriptrun::config::{ConfigFile, RawConfigFile};
use scriptrun::types::{DrainPolicy, ShellMode};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the defaults and validates on `build`, so a builder that
/// produces an invalid config fails the test loudly.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    /// Run scripts as `sh <script>`.
    pub fn with_sh_interpreter(self) -> Self {
        self.with_interpreter("sh", &[])
    }

    pub fn with_interpreter(mut self, command: &str, args: &[&str]) -> Self {
        self.config.interpreter.command = command.to_string();
        self.config.interpreter.args = args.iter().map(|a| a.to_string()).collect();
        self.config.interpreter.shell = ShellMode::Never;
        self
    }

    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.config.run.timeout_ms = ms;
        self
    }

    pub fn with_drain(mut self, drain: DrainPolicy) -> Self {
        self.config.run.drain = drain;
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.estimator.poll_interval_ms = ms;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.config.estimator.history_capacity = capacity;
        self
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.config.store.extension = extension.to_string();
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
