// src/store/mod.rs

//! Named script storage.
//!
//! The runner never touches the store; callers resolve a script name to a
//! path through [`ScriptStore::path_of`] and hand that path to the runner.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use crate::errors::{Result, ScriptrunError};

pub mod fs_store;

pub use fs_store::{FsScriptStore, DEFAULT_SCRATCH_NAME};

/// Result of a non-overwriting save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    AlreadyExists,
}

/// Storage for named scripts.
///
/// Names are file names inside the store; a name given without the
/// supported extension gets it appended. One name is reserved for the
/// scratch script used to run unsaved text.
pub trait ScriptStore: Send + Sync + Debug {
    /// Stored script names, sorted.
    fn list(&self) -> Result<Vec<String>>;

    /// Store `content` under `name` unless a script with that name exists.
    fn save(&self, name: &str, content: &str) -> Result<SaveOutcome>;

    /// Store `content` under `name`, replacing any existing script.
    fn save_overwrite(&self, name: &str, content: &str) -> Result<()>;

    /// Contents of a stored script.
    fn load(&self, name: &str) -> Result<String>;

    /// Copy an external file into the store, returning its stored name.
    fn import_file(&self, path: &Path) -> Result<String>;

    /// Remove a stored script.
    fn delete(&self, name: &str) -> Result<()>;

    /// Filesystem path of a stored script, whether or not it exists yet.
    fn path_of(&self, name: &str) -> Result<PathBuf>;

    /// Write unsaved text to the reserved scratch script and return its path.
    ///
    /// The scratch name is never accepted by the named operations above and
    /// never shows up in [`ScriptStore::list`].
    fn save_scratch(&self, content: &str) -> Result<PathBuf>;

    /// Remove the scratch script. Missing is not an error.
    fn remove_scratch(&self) -> Result<()>;
}

/// Validate `name` and make sure it carries `.{extension}`.
pub fn normalize_name(name: &str, extension: &str) -> Result<String> {
    let name = name.trim();
    let extension = extension.trim_start_matches('.');

    if name.is_empty() || name.starts_with('.') {
        return Err(ScriptrunError::InvalidScriptName(name.to_string()));
    }
    if name.contains(['/', '\\']) || name.contains("..") {
        return Err(ScriptrunError::InvalidScriptName(name.to_string()));
    }

    let suffix = format!(".{extension}");
    if name.ends_with(&suffix) {
        Ok(name.to_string())
    } else {
        Ok(format!("{name}{suffix}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_appended_once() {
        assert_eq!(normalize_name("hello", "kts").unwrap(), "hello.kts");
        assert_eq!(normalize_name("hello.kts", ".kts").unwrap(), "hello.kts");
    }

    #[test]
    fn path_like_names_are_rejected() {
        for bad in ["", "  ", "../evil", "a/b", r"a\b", ".hidden"] {
            assert!(
                matches!(normalize_name(bad, "kts"), Err(ScriptrunError::InvalidScriptName(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
