// tests/store_and_config.rs

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use scriptrun::config::{load_and_validate, load_from_path, load_or_default, StoreSection};
use scriptrun::errors::ScriptrunError;
use scriptrun::fs::RealFileSystem;
use scriptrun::highlight::Highlighter;
use scriptrun::store::{FsScriptStore, SaveOutcome, ScriptStore};
use scriptrun::types::{DrainPolicy, ShellMode, TimeoutAction};
use scriptrun_test_utils::builders::ConfigFileBuilder;
use scriptrun_test_utils::fixtures::ScriptDir;

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(dir: &ScriptDir, body: &str) -> std::path::PathBuf {
    dir.write_script("Scriptrun.toml", body)
}

#[test]
fn full_config_file_is_loaded() -> TestResult {
    let dir = ScriptDir::new();
    let path = write_config(
        &dir,
        r#"
[interpreter]
command = "python3"
args = ["-u"]
shell = "never"

[run]
timeout_ms = 1500
drain = "sequential"
on_timeout = "detach"

[estimator]
poll_interval_ms = 20
history_capacity = 5

[store]
dir = "py"
extension = "py"
scratch_name = "buffer"

[editor]
keywords_file = "kw.txt"
"#,
    );

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.interpreter.command, "python3");
    assert_eq!(cfg.interpreter.args, vec!["-u"]);
    assert_eq!(cfg.interpreter.shell, ShellMode::Never);
    assert_eq!(cfg.run.timeout_ms, 1500);
    assert_eq!(cfg.run.drain, DrainPolicy::Sequential);
    assert_eq!(cfg.run.on_timeout, TimeoutAction::Detach);
    assert_eq!(cfg.estimator.history_capacity, 5);
    assert_eq!(cfg.estimator.high_weight, 0.9);
    assert_eq!(cfg.store.extension, "py");
    assert_eq!(cfg.store.scratch_name, "buffer");
    assert_eq!(cfg.editor.keywords_file, Some(PathBuf::from("kw.txt")));
    Ok(())
}

#[test]
fn unknown_drain_policy_is_a_toml_error() {
    let dir = ScriptDir::new();
    let path = write_config(&dir, "[run]\ndrain = \"parallel\"\n");

    assert!(matches!(
        load_from_path(&path),
        Err(ScriptrunError::TomlError(_))
    ));
}

#[test]
fn out_of_range_values_are_config_errors() {
    let dir = ScriptDir::new();
    for body in [
        "[run]\ntimeout_ms = 0\n",
        "[estimator]\nhigh_weight = 1.5\n",
        "[estimator]\nhistory_capacity = 0\n",
        "[interpreter]\ncommand = \"  \"\n",
        "[store]\nextension = \"\"\n",
    ] {
        let path = write_config(&dir, body);
        let err = load_and_validate(&path).unwrap_err();
        assert!(
            matches!(err, ScriptrunError::ConfigError(_)),
            "{body:?} gave {err:?}"
        );
    }
}

#[test]
fn missing_default_config_falls_back_but_explicit_one_fails() -> TestResult {
    let dir = ScriptDir::new();
    let missing = dir.path().join("Scriptrun.toml");

    let cfg = load_or_default(&missing)?;
    assert_eq!(cfg.interpreter.command, "kotlinc");
    assert_eq!(cfg.run.timeout_ms, 600_000);

    assert!(matches!(
        load_and_validate(&missing),
        Err(ScriptrunError::IoError(_))
    ));
    Ok(())
}

#[test]
fn builder_rejects_nothing_it_produces() {
    let cfg = ConfigFileBuilder::new()
        .with_sh_interpreter()
        .with_poll_interval_ms(10)
        .with_history_capacity(3)
        .build();
    assert_eq!(cfg.interpreter.command, "sh");
    assert!(cfg.interpreter.args.is_empty());
    assert_eq!(cfg.estimator.history_capacity, 3);
}

#[test]
fn store_on_disk_saves_imports_and_deletes() -> TestResult {
    let dir = ScriptDir::new();
    let store = FsScriptStore::open(Arc::new(RealFileSystem), dir.path().join("scripts"), "kts")?;

    assert_eq!(store.save("first", "println(1)")?, SaveOutcome::Saved);
    assert_eq!(store.save("first", "println(2)")?, SaveOutcome::AlreadyExists);

    let outside = dir.write_script("second.kts", "println(2)");
    assert_eq!(store.import_file(&outside)?, "second.kts");
    assert!(matches!(
        store.import_file(&outside),
        Err(ScriptrunError::ScriptExists(_))
    ));

    let wrong = dir.write_script("notes.txt", "hello");
    assert!(matches!(
        store.import_file(&wrong),
        Err(ScriptrunError::InvalidScriptName(_))
    ));

    assert_eq!(store.list()?, vec!["first.kts", "second.kts"]);
    assert_eq!(
        store.path_of("second")?,
        dir.path().join("scripts").join("second.kts")
    );

    store.delete("first")?;
    assert_eq!(store.list()?, vec!["second.kts"]);
    assert!(matches!(
        store.save("../escape", "x"),
        Err(ScriptrunError::InvalidScriptName(_))
    ));
    Ok(())
}

#[test]
fn relative_store_dir_resolves_against_the_base() -> TestResult {
    let dir = ScriptDir::new();
    let section = StoreSection::default();

    let store = FsScriptStore::from_config(&section, dir.path())?;

    assert_eq!(store.dir(), dir.path().join("scripts"));
    assert!(Path::new(store.dir()).is_dir());
    assert_eq!(store.scratch_name(), "tmp.kts");
    Ok(())
}

#[test]
fn configured_scratch_name_is_reserved_on_disk() -> TestResult {
    let dir = ScriptDir::new();
    let section = StoreSection {
        scratch_name: "buffer".into(),
        ..StoreSection::default()
    };
    let store = FsScriptStore::from_config(&section, dir.path())?;

    assert!(matches!(
        store.save("buffer", "x"),
        Err(ScriptrunError::InvalidScriptName(_))
    ));
    let scratch = store.save_scratch("println(0)")?;
    assert_eq!(scratch, dir.path().join("scripts").join("buffer.kts"));
    assert!(store.list()?.is_empty());
    store.remove_scratch()?;
    assert!(!scratch.exists());
    Ok(())
}

#[test]
fn missing_editor_section_uses_builtin_keywords() -> TestResult {
    let dir = ScriptDir::new();
    let path = write_config(&dir, "[run]\ntimeout_ms = 10\n");
    let cfg = load_and_validate(&path)?;

    let highlighter = Highlighter::from_config(&cfg.editor, dir.path(), &RealFileSystem)?;
    assert!(highlighter.is_keyword("while"));
    Ok(())
}

#[test]
fn keyword_file_resolves_against_the_config_dir() -> TestResult {
    let dir = ScriptDir::new();
    dir.write_script("kw.txt", "def\nlambda\n");
    let path = write_config(&dir, "[editor]\nkeywords_file = \"kw.txt\"\n");
    let cfg = load_and_validate(&path)?;

    let highlighter = Highlighter::from_config(&cfg.editor, dir.path(), &RealFileSystem)?;
    assert!(highlighter.is_keyword("lambda"));
    assert!(!highlighter.is_keyword("while"));
    Ok(())
}
