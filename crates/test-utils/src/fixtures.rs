#![allow(dead_code)]

use std::path::{Path, PathBuf};

use scriptrun::exec::InterpreterCommand;
use tempfile::TempDir;

/// A temporary directory of scripts, removed on drop.
pub struct ScriptDir {
    dir: TempDir,
}

impl ScriptDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("creating temp script dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `body` to `name` inside the directory and return its path.
    pub fn write_script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, body).expect("writing script fixture");
        path
    }
}

impl Default for ScriptDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Interpreter that runs scripts with `sh <script>`.
pub fn sh_interpreter() -> InterpreterCommand {
    InterpreterCommand::new("sh", Vec::new())
}
