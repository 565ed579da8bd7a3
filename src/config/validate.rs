// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, ScriptrunError};
use crate::store::normalize_name;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::ScriptrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_interpreter(cfg)?;
    validate_run(cfg)?;
    validate_estimator(cfg)?;
    validate_store(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> ScriptrunError {
    ScriptrunError::ConfigError(msg.into())
}

fn validate_interpreter(cfg: &RawConfigFile) -> Result<()> {
    if cfg.interpreter.command.trim().is_empty() {
        return Err(config_error("[interpreter].command must not be empty"));
    }
    Ok(())
}

fn validate_run(cfg: &RawConfigFile) -> Result<()> {
    // drain / on_timeout are strongly typed and validated during
    // deserialization.
    if cfg.run.timeout_ms == 0 {
        return Err(config_error("[run].timeout_ms must be >= 1 (got 0)"));
    }
    Ok(())
}

fn validate_estimator(cfg: &RawConfigFile) -> Result<()> {
    let est = &cfg.estimator;

    if est.poll_interval_ms == 0 {
        return Err(config_error(
            "[estimator].poll_interval_ms must be >= 1 (got 0)",
        ));
    }

    if est.history_capacity == 0 {
        return Err(config_error(
            "[estimator].history_capacity must be >= 1 (got 0)",
        ));
    }

    if !(0.0..=1.0).contains(&est.high_weight) {
        return Err(config_error(format!(
            "[estimator].high_weight must be within [0, 1] (got {})",
            est.high_weight
        )));
    }

    if !(est.high_weight_fraction > 0.0 && est.high_weight_fraction <= 1.0) {
        return Err(config_error(format!(
            "[estimator].high_weight_fraction must be within (0, 1] (got {})",
            est.high_weight_fraction
        )));
    }

    Ok(())
}

fn validate_store(cfg: &RawConfigFile) -> Result<()> {
    let ext = cfg.store.extension.trim_start_matches('.');
    if ext.is_empty() {
        return Err(config_error("[store].extension must not be empty"));
    }
    if normalize_name(&cfg.store.scratch_name, ext).is_err() {
        return Err(config_error(format!(
            "[store].scratch_name {:?} is not a valid script name",
            cfg.store.scratch_name
        )));
    }
    Ok(())
}
