// src/exec/command.rs

//! Building the interpreter invocation for a script.

use std::fmt;
use std::path::Path;

use tokio::process::Command;

use crate::config::InterpreterSection;

/// External interpreter binary plus its fixed script-execution flags.
///
/// The script path is always appended last: `<program> <args...> <script>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterCommand {
    program: String,
    args: Vec<String>,
    via_shell: bool,
}

impl InterpreterCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            via_shell: false,
        }
    }

    /// Route the invocation through the platform command shell
    /// (`cmd /C` on Windows, `sh -c` elsewhere).
    pub fn with_shell(mut self, via_shell: bool) -> Self {
        self.via_shell = via_shell;
        self
    }

    pub fn from_config(cfg: &InterpreterSection) -> Self {
        Self::new(cfg.command.clone(), cfg.args.clone()).with_shell(cfg.shell.uses_shell())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn via_shell(&self) -> bool {
        self.via_shell
    }

    /// Build a `tokio::process::Command` that runs `script`.
    ///
    /// Stdio configuration is left to the caller.
    pub fn build(&self, script: &Path) -> Command {
        if !self.via_shell {
            let mut c = Command::new(&self.program);
            c.args(&self.args).arg(script);
            return c;
        }

        if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.program).args(&self.args).arg(script);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(self.shell_line(script));
            c
        }
    }

    /// Single `sh`-quoted command line, used for `sh -c`.
    fn shell_line(&self, script: &Path) -> String {
        let script = script.to_string_lossy();
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .chain(std::iter::once(script.as_ref()))
            .map(sh_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for InterpreterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

fn sh_quote(s: &str) -> String {
    let safe = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:+,@%".contains(c));
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShellMode;

    #[test]
    fn from_config_uses_kotlinc_defaults() {
        let cmd = InterpreterCommand::from_config(&InterpreterSection::default());
        assert_eq!(cmd.program(), "kotlinc");
        assert_eq!(cmd.args(), ["-script".to_string()]);
        assert_eq!(cmd.via_shell(), cfg!(windows));
        assert_eq!(cmd.to_string(), "kotlinc -script");
    }

    #[test]
    fn explicit_never_disables_shell() {
        let cfg = InterpreterSection {
            shell: ShellMode::Never,
            ..InterpreterSection::default()
        };
        assert!(!InterpreterCommand::from_config(&cfg).via_shell());
    }

    #[test]
    fn shell_line_quotes_awkward_arguments() {
        let cmd = InterpreterCommand::new("kotlinc", vec!["-script".into()]);
        let line = cmd.shell_line(Path::new("my scripts/it's.kts"));
        assert_eq!(line, r"kotlinc -script 'my scripts/it'\''s.kts'");
    }

    #[test]
    fn plain_words_are_left_unquoted() {
        assert_eq!(sh_quote("scripts/tmp.kts"), "scripts/tmp.kts");
        assert_eq!(sh_quote(""), "''");
    }
}
