// src/store/fs_store.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::StoreSection;
use crate::errors::{Result, ScriptrunError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::store::{normalize_name, SaveOutcome, ScriptStore};

/// Scratch script name used unless the config picks another.
pub const DEFAULT_SCRATCH_NAME: &str = "tmp";

/// Script store backed by a directory on a [`FileSystem`].
#[derive(Debug, Clone)]
pub struct FsScriptStore {
    fs: Arc<dyn FileSystem>,
    dir: PathBuf,
    extension: String,
    /// Normalized file name of the reserved scratch script.
    scratch: String,
}

impl FsScriptStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(
        fs: Arc<dyn FileSystem>,
        dir: impl Into<PathBuf>,
        extension: impl Into<String>,
    ) -> Result<Self> {
        let dir = dir.into();
        let extension = extension.into().trim_start_matches('.').to_string();
        if !fs.exists(&dir) {
            info!(dir = %dir.display(), "creating script directory");
        }
        fs.create_dir_all(&dir)?;
        let scratch = normalize_name(DEFAULT_SCRATCH_NAME, &extension)?;
        Ok(Self {
            fs,
            dir,
            extension,
            scratch,
        })
    }

    /// Reserve `name` for the scratch script instead of the default.
    pub fn with_scratch_name(mut self, name: &str) -> Result<Self> {
        self.scratch = normalize_name(name, &self.extension)?;
        Ok(self)
    }

    /// Store on the real filesystem, with `dir` resolved against `base`
    /// when relative.
    pub fn from_config(cfg: &StoreSection, base: &Path) -> Result<Self> {
        let dir = if cfg.dir.is_absolute() {
            cfg.dir.clone()
        } else {
            base.join(&cfg.dir)
        };
        Self::open(Arc::new(RealFileSystem), dir, cfg.extension.clone())?
            .with_scratch_name(&cfg.scratch_name)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn scratch_name(&self) -> &str {
        &self.scratch
    }

    /// Normalize a user-supplied name, refusing the scratch name.
    fn user_name(&self, name: &str) -> Result<String> {
        let name = normalize_name(name, &self.extension)?;
        if name == self.scratch {
            debug!(%name, "name is reserved for the scratch script");
            return Err(ScriptrunError::InvalidScriptName(format!(
                "{name} (reserved for unsaved text)"
            )));
        }
        Ok(name)
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == self.extension)
    }

    fn existing_path(&self, name: &str) -> Result<PathBuf> {
        let path = self.path_of(name)?;
        if !self.fs.is_file(&path) {
            return Err(ScriptrunError::ScriptNotFound(name.to_string()));
        }
        Ok(path)
    }
}

impl ScriptStore for FsScriptStore {
    fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .fs
            .read_dir(&self.dir)?
            .into_iter()
            .filter(|p| self.fs.is_file(p) && self.has_extension(p))
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .filter(|n| *n != self.scratch)
            .collect();
        names.sort();
        Ok(names)
    }

    fn save(&self, name: &str, content: &str) -> Result<SaveOutcome> {
        let path = self.path_of(name)?;
        if self.fs.exists(&path) {
            debug!(path = %path.display(), "refusing to overwrite existing script");
            return Ok(SaveOutcome::AlreadyExists);
        }
        self.fs.write(&path, content.as_bytes())?;
        info!(path = %path.display(), "script saved");
        Ok(SaveOutcome::Saved)
    }

    fn save_overwrite(&self, name: &str, content: &str) -> Result<()> {
        let path = self.path_of(name)?;
        self.fs.write(&path, content.as_bytes())?;
        debug!(path = %path.display(), "script written");
        Ok(())
    }

    fn load(&self, name: &str) -> Result<String> {
        let path = self.existing_path(name)?;
        Ok(self.fs.read_to_string(&path)?)
    }

    fn import_file(&self, path: &Path) -> Result<String> {
        if !self.fs.is_file(path) {
            return Err(ScriptrunError::ScriptNotFound(path.display().to_string()));
        }
        if !self.has_extension(path) {
            return Err(ScriptrunError::InvalidScriptName(format!(
                "{} (expected a .{} file)",
                path.display(),
                self.extension
            )));
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ScriptrunError::InvalidScriptName(path.display().to_string()))?;
        let name = self.user_name(file_name)?;
        let target = self.dir.join(&name);

        if self.fs.exists(&target) {
            return Err(ScriptrunError::ScriptExists(name));
        }
        self.fs.copy(path, &target)?;
        info!(from = %path.display(), name = %name, "script imported");
        Ok(name)
    }

    fn delete(&self, name: &str) -> Result<()> {
        let path = self.existing_path(name)?;
        self.fs.remove_file(&path)?;
        info!(path = %path.display(), "script deleted");
        Ok(())
    }

    fn path_of(&self, name: &str) -> Result<PathBuf> {
        Ok(self.dir.join(self.user_name(name)?))
    }

    fn save_scratch(&self, content: &str) -> Result<PathBuf> {
        let path = self.dir.join(&self.scratch);
        self.fs.write(&path, content.as_bytes())?;
        debug!(path = %path.display(), "scratch script written");
        Ok(path)
    }

    fn remove_scratch(&self) -> Result<()> {
        let path = self.dir.join(&self.scratch);
        if self.fs.is_file(&path) {
            self.fs.remove_file(&path)?;
            debug!(path = %path.display(), "scratch script removed");
        }
        Ok(())
    }
}
