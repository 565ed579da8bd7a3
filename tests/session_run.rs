// tests/session_run.rs
#![cfg(unix)]

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use scriptrun::engine::Session;
use scriptrun::errors::ScriptrunError;
use scriptrun::exec::RunOutcome;
use scriptrun::fs::RealFileSystem;
use scriptrun::store::{FsScriptStore, SaveOutcome, ScriptStore};
use scriptrun::types::DrainPolicy;
use scriptrun_test_utils::builders::ConfigFileBuilder;
use scriptrun_test_utils::fixtures::ScriptDir;
use scriptrun_test_utils::observers::{RecordingObserver, Seen};
use scriptrun_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn sh_session(dir: &ScriptDir, interpreter: &str) -> Result<Session, Box<dyn Error>> {
    let builder = ConfigFileBuilder::new()
        .with_interpreter(interpreter, &[])
        .with_timeout_ms(5_000);
    session_with(dir, builder)
}

fn session_with(dir: &ScriptDir, builder: ConfigFileBuilder) -> Result<Session, Box<dyn Error>> {
    let cfg = builder.with_extension("sh").build();
    let store: Arc<dyn ScriptStore> = Arc::new(FsScriptStore::open(
        Arc::new(RealFileSystem),
        dir.path().join("scripts"),
        "sh",
    )?);
    Ok(Session::from_config(&cfg, store))
}

#[tokio::test]
async fn stored_script_streams_to_the_observer() -> TestResult {
    init_tracing();
    let dir = ScriptDir::new();
    let mut session = sh_session(&dir, "sh")?;
    session
        .store()
        .save("greet", "echo hello\necho oops >&2\nexit 2\n")?;

    let mut observer = RecordingObserver::new();
    let report = with_timeout(session.run_stored("greet", &mut observer)).await?;

    assert_eq!(report.outcome, RunOutcome::ExitCode(2));
    assert!(report.duration.is_some());
    assert_eq!(observer.stdout_lines(), vec!["hello"]);
    assert_eq!(observer.stderr_lines(), vec!["oops"]);
    assert_eq!(observer.outcomes(), vec![&RunOutcome::ExitCode(2)]);
    assert!(matches!(observer.run_events().last(), Some(Seen::Finished(_))));
    assert_eq!(
        observer
            .seen
            .iter()
            .filter(|s| **s == Seen::RunFinished)
            .count(),
        1
    );
    assert_eq!(session.active_script(), Some("greet.sh"));
    Ok(())
}

#[tokio::test]
async fn run_text_removes_the_scratch_script() -> TestResult {
    init_tracing();
    let dir = ScriptDir::new();
    let mut session = sh_session(&dir, "sh")?;

    let mut observer = RecordingObserver::new();
    let report = with_timeout(session.run_text("echo from buffer\n", &mut observer)).await?;

    assert_eq!(report.outcome, RunOutcome::ExitCode(0));
    assert_eq!(observer.stdout_lines(), vec!["from buffer"]);
    assert!(session.store().list()?.is_empty());
    assert!(!dir.path().join("scripts").join("tmp.sh").exists());
    Ok(())
}

#[tokio::test]
async fn start_failure_reaches_no_observer_and_still_cleans_up() -> TestResult {
    init_tracing();
    let dir = ScriptDir::new();
    let mut session = sh_session(&dir, "scriptrun-no-such-interpreter")?;

    let mut observer = RecordingObserver::new();
    let result = with_timeout(session.run_text("echo never\n", &mut observer)).await;

    assert!(matches!(result, Err(ScriptrunError::StartFailure(_))));
    assert!(observer.seen.is_empty());
    assert!(session.store().list()?.is_empty());
    assert!(session.estimator().history().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn repeated_runs_feed_the_history_until_the_script_changes() -> TestResult {
    init_tracing();
    let dir = ScriptDir::new();
    let mut session = sh_session(&dir, "sh")?;
    session.store().save("one", "echo 1\n")?;
    session.store().save("two", "echo 2\n")?;

    for _ in 0..3 {
        let mut observer = RecordingObserver::new();
        with_timeout(session.run_stored("one", &mut observer)).await?;
    }
    assert_eq!(session.estimator().history().await.len(), 3);

    // Reopening the same script keeps the history.
    session.open("one.sh").await?;
    assert_eq!(session.estimator().history().await.len(), 3);

    let content = session.open("two").await?;
    assert_eq!(content, "echo 2\n");
    assert_eq!(session.active_script(), Some("two.sh"));
    assert!(session.estimator().history().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn opening_a_missing_script_keeps_the_active_one() -> TestResult {
    init_tracing();
    let dir = ScriptDir::new();
    let mut session = sh_session(&dir, "sh")?;
    session.store().save("one", "echo 1\n")?;
    session.open("one").await?;
    session.estimator().record_run(10.0).await;

    assert!(matches!(
        session.open("missing").await,
        Err(ScriptrunError::ScriptNotFound(_))
    ));
    assert_eq!(session.active_script(), Some("one.sh"));
    assert_eq!(session.estimator().history().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn configured_timeout_applies_to_stored_scripts() -> TestResult {
    init_tracing();
    let dir = ScriptDir::new();
    let builder = ConfigFileBuilder::new()
        .with_sh_interpreter()
        .with_timeout_ms(200);
    let mut session = session_with(&dir, builder)?;
    assert_eq!(session.timeout(), Duration::from_millis(200));
    session.store().save("stuck", "exec sleep 5\n")?;

    let mut observer = RecordingObserver::new();
    let report = with_timeout(session.run_stored("stuck", &mut observer)).await?;

    assert_eq!(report.outcome, RunOutcome::TimedOut);
    assert_eq!(observer.outcomes(), vec![&RunOutcome::TimedOut]);
    Ok(())
}

#[tokio::test]
async fn sequential_drain_from_config_keeps_the_stream_order() -> TestResult {
    init_tracing();
    let dir = ScriptDir::new();
    let builder = ConfigFileBuilder::new()
        .with_sh_interpreter()
        .with_drain(DrainPolicy::Sequential);
    let mut session = session_with(&dir, builder)?;

    let mut observer = RecordingObserver::new();
    let report = with_timeout(session.run_text("echo err >&2\necho out\n", &mut observer)).await?;

    assert_eq!(report.outcome, RunOutcome::ExitCode(0));
    assert_eq!(
        observer.run_events(),
        vec![
            &Seen::Stdout("out".into()),
            &Seen::Stderr("err".into()),
            &Seen::Finished(RunOutcome::ExitCode(0)),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn unsaved_text_never_touches_user_scripts() -> TestResult {
    init_tracing();
    let dir = ScriptDir::new();
    let mut session = sh_session(&dir, "sh")?;

    assert!(matches!(
        session.store().save("tmp", "echo mine\n"),
        Err(ScriptrunError::InvalidScriptName(_))
    ));
    assert_eq!(session.store().save("keep", "echo kept\n")?, SaveOutcome::Saved);

    let mut observer = RecordingObserver::new();
    with_timeout(session.run_text("echo scratch\n", &mut observer)).await?;

    assert_eq!(observer.stdout_lines(), vec!["scratch"]);
    assert_eq!(session.store().list()?, vec!["keep.sh"]);
    assert_eq!(session.store().load("keep")?, "echo kept\n");
    Ok(())
}
