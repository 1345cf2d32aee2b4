use crate::config;
use crate::history::HistoryLog;
use std::collections::HashMap;
use std::env as stdenv;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Mutable state of one shell session, passed explicitly to every stage.
///
/// The session contains:
/// - `vars`: environment variables visible to executed commands.
/// - `current_dir`: the working directory, kept in step with the process.
/// - `history`: commands accepted so far.
/// - `history_file`: where `history -w` writes, if anywhere.
/// - `should_exit`: set by `exit`; the session loop stops after the current line.
///
/// A [detached](Session::detached) session never touches the process and
/// is thrown away after use.
#[derive(Debug, Clone)]
pub struct Session {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
    pub history: HistoryLog,
    pub history_file: Option<PathBuf>,
    pub should_exit: bool,
    detached: bool,
}

impl Session {
    /// Capture the current process environment with an empty history.
    pub fn new() -> Self {
        let vars: HashMap<String, String> = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let history_file = config::history_file_path(&vars);
        Self {
            vars,
            current_dir,
            history: HistoryLog::new(),
            history_file,
            should_exit: false,
            detached: false,
        }
    }

    /// A copy of this session for a stage whose effects must not reach the
    /// shell, such as a builtin feeding a pipe.
    pub fn detached(&self) -> Self {
        Self {
            detached: true,
            ..self.clone()
        }
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Change the process working directory and record the result.
    ///
    /// Relative targets are taken from `current_dir`. A detached session
    /// only records the new directory.
    pub fn change_dir(&mut self, target: &Path) -> io::Result<()> {
        let target = if target.is_absolute() {
            target.to_path_buf()
        } else {
            self.current_dir.join(target)
        };
        if self.detached {
            let resolved = fs::canonicalize(&target)?;
            if !resolved.is_dir() {
                return Err(io::ErrorKind::NotADirectory.into());
            }
            self.current_dir = resolved;
            return Ok(());
        }
        stdenv::set_current_dir(&target)?;
        self.current_dir = stdenv::current_dir().unwrap_or(target);
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
