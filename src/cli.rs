// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `scriptrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "scriptrun",
    version,
    about = "Store scripts, run them through an external interpreter, and watch live output with a run-time estimate.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// If omitted, `Scriptrun.toml` in the current working directory is
    /// used when present, otherwise built-in defaults.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SCRIPTRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run a stored script.
    Run {
        /// Script name (the extension may be omitted).
        name: String,

        /// Run the script this many times in a row; later runs get an
        /// estimate from the earlier ones.
        #[arg(long, default_value_t = 1, value_name = "N")]
        repeat: u32,

        /// Override `[run].timeout_ms`.
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
    },

    /// Run the contents of a file (or stdin with `-`) as unsaved text
    /// through the scratch script.
    RunFile {
        path: PathBuf,

        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
    },

    /// List stored scripts.
    List,

    /// Print a stored script.
    Show {
        name: String,

        /// Colour keywords (built-in list or `[editor].keywords_file`).
        #[arg(long)]
        highlight: bool,
    },

    /// Store a script from a file or stdin.
    Save {
        name: String,

        /// Read the script from this file instead of stdin.
        #[arg(long, value_name = "PATH")]
        from: Option<PathBuf>,

        /// Replace an existing script with the same name.
        #[arg(long)]
        force: bool,
    },

    /// Copy an existing script file into the store.
    Import { path: PathBuf },

    /// Remove a stored script.
    Delete { name: String },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
