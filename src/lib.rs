// src/lib.rs

pub mod cli;
pub mod config;
pub mod console;
pub mod engine;
pub mod errors;
pub mod estimate;
pub mod exec;
pub mod fs;
pub mod highlight;
pub mod logging;
pub mod store;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::{default_config_path, load_and_validate, load_or_default, ConfigFile};
use crate::console::ConsoleObserver;
use crate::engine::Session;
use crate::errors::ScriptrunError;
use crate::exec::RunOutcome;
use crate::fs::RealFileSystem;
use crate::highlight::Highlighter;
use crate::store::{FsScriptStore, SaveOutcome, ScriptStore};

/// Process exit code reported when a run hits its timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// High-level entry point used by `main.rs`.
///
/// Loads the config, opens the script store and dispatches the subcommand.
/// Returns the exit code the process should end with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let (cfg, config_path) = match &args.config {
        Some(path) => (load_and_validate(path)?, path.clone()),
        None => {
            let path = default_config_path();
            (load_or_default(&path)?, path)
        }
    };
    debug!(config = %config_path.display(), ?cfg, "configuration loaded");

    let root = config_root_dir(&config_path);
    let store: Arc<dyn ScriptStore> = Arc::new(FsScriptStore::from_config(&cfg.store, &root)?);

    match args.command {
        Command::Run {
            name,
            repeat,
            timeout_ms,
        } => {
            let mut session = session_for(&cfg, store, timeout_ms)?;
            run_stored(&mut session, &name, repeat).await
        }
        Command::RunFile { path, timeout_ms } => {
            let text = read_source(Some(&path)).await?;
            let mut session = session_for(&cfg, store, timeout_ms)?;
            let mut observer = ConsoleObserver::stdio();
            observer.begin_run(false);
            let report = session.run_text(&text, &mut observer).await?;
            Ok(exit_code_for(&report.outcome))
        }
        Command::List => {
            for name in store.list()? {
                println!("{name}");
            }
            Ok(0)
        }
        Command::Show { name, highlight } => {
            let content = store.load(&name)?;
            if highlight {
                let highlighter = Highlighter::from_config(&cfg.editor, &root, &RealFileSystem)?;
                print!("{}", highlighter.highlight(&content));
            } else {
                print!("{content}");
            }
            Ok(0)
        }
        Command::Save { name, from, force } => {
            let content = read_source(from.as_deref()).await?;
            if force {
                store.save_overwrite(&name, &content)?;
            } else if store.save(&name, &content)? == SaveOutcome::AlreadyExists {
                return Err(ScriptrunError::ScriptExists(name).into());
            }
            info!(%name, "script saved");
            Ok(0)
        }
        Command::Import { path } => {
            let stored = store.import_file(&path)?;
            println!("{stored}");
            Ok(0)
        }
        Command::Delete { name } => {
            store.delete(&name)?;
            info!(%name, "script deleted");
            Ok(0)
        }
    }
}

fn session_for(
    cfg: &ConfigFile,
    store: Arc<dyn ScriptStore>,
    timeout_ms: Option<u64>,
) -> Result<Session> {
    let session = Session::from_config(cfg, store);
    let session = match timeout_ms {
        Some(0) => bail!("--timeout-ms must be greater than zero"),
        Some(ms) => session.with_timeout(Duration::from_millis(ms)),
        None => session,
    };
    debug!(
        timeout_ms = session.timeout().as_millis() as u64,
        overridden = timeout_ms.is_some(),
        "session ready"
    );
    Ok(session)
}

/// Run a stored script `repeat` times, stopping at the first run that does
/// not exit with code 0.
async fn run_stored(session: &mut Session, name: &str, repeat: u32) -> Result<i32> {
    let mut observer = ConsoleObserver::stdio();
    let mut code = 0;

    for attempt in 1..=repeat.max(1) {
        session.open(name).await?;
        let has_estimate = session.estimator().estimate_ms().await > 0.0;
        debug!(%name, attempt, has_estimate, "starting run");

        observer.begin_run(has_estimate);
        let report = session.run_stored(name, &mut observer).await?;
        code = exit_code_for(&report.outcome);
        if code != 0 {
            break;
        }
    }

    Ok(code)
}

/// Exit code mirroring the script's own, with fixed codes for runs that
/// produced none.
pub fn exit_code_for(outcome: &RunOutcome) -> i32 {
    match outcome {
        RunOutcome::ExitCode(code) => *code,
        RunOutcome::TimedOut => TIMEOUT_EXIT_CODE,
        RunOutcome::Aborted(_) => 1,
    }
}

/// Read script text from `path`, or from stdin when `path` is absent or `-`.
async fn read_source(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => tokio::fs::read_to_string(p)
            .await
            .with_context(|| format!("reading script source {:?}", p)),
        _ => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("reading script source from stdin")?;
            Ok(text)
        }
    }
}

/// Directory that relative `[store].dir` paths are resolved against.
///
/// - If the config path has a non-empty parent (e.g. "conf/Scriptrun.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Scriptrun.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
