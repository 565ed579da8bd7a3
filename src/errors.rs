// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Script not found: {0}")]
    ScriptNotFound(String),

    #[error("Script already exists: {0}")]
    ScriptExists(String),

    #[error("Invalid script name: {0}")]
    InvalidScriptName(String),

    #[error("Failed to start interpreter: {0}")]
    StartFailure(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ScriptrunError>;
