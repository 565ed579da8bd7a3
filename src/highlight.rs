// src/highlight.rs

//! Keyword highlighting for `show --highlight`.
//!
//! Words are the runs of text between spaces and newlines; a word that is
//! exactly a keyword is wrapped in an ANSI colour. Everything else, the
//! separators included, is copied through unchanged.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::EditorSection;
use crate::errors::Result;
use crate::fs::FileSystem;

/// Keywords used when no keyword file is configured.
pub const DEFAULT_KEYWORDS: [&str; 12] = [
    "val", "var", "while", "for", "class", "fun", "public", "private", "object", "true", "false",
    "if",
];

const KEYWORD_COLOR: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighter {
    keywords: BTreeSet<String>,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::from_keywords(DEFAULT_KEYWORDS)
    }
}

impl Highlighter {
    pub fn from_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    /// Read keywords from `path`, one per line. Blank lines are skipped.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let text = fs.read_to_string(path)?;
        let highlighter = Self::from_keywords(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        );
        if highlighter.keywords.is_empty() {
            warn!(path = %path.display(), "keyword file is empty; nothing will be highlighted");
        }
        debug!(
            path = %path.display(),
            count = highlighter.keywords.len(),
            "highlight keywords loaded"
        );
        Ok(highlighter)
    }

    /// The configured keyword file, or the built-in list when none is set.
    pub fn from_config(cfg: &EditorSection, base: &Path, fs: &dyn FileSystem) -> Result<Self> {
        match &cfg.keywords_file {
            Some(file) => Self::load(fs, &resolve(base, file)),
            None => Ok(Self::default()),
        }
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords.contains(word)
    }

    pub fn highlight(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for piece in text.split_inclusive(is_separator) {
            let word = piece.strip_suffix(is_separator).unwrap_or(piece);
            if self.is_keyword(word) {
                out.push_str(KEYWORD_COLOR);
                out.push_str(word);
                out.push_str(RESET);
                out.push_str(&piece[word.len()..]);
            } else {
                out.push_str(piece);
            }
        }
        out
    }
}

fn is_separator(c: char) -> bool {
    c == ' ' || c == '\n'
}

fn resolve(base: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        base.join(file)
    }
}
