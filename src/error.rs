//! Error types produced while interpreting a command line.

use std::io;
use thiserror::Error;

/// Errors found in the structure of a command line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A redirection operator (`<`, `>`, `>>`) with no file name after it.
    #[error("{0}: Missing file name")]
    MissingFilename(String),
    /// An operator in a position where a command was expected, e.g. `a && || b`.
    /// `newline` is used when the line ended instead.
    #[error("syntax error near unexpected token `{0}'")]
    UnexpectedToken(String),
}

/// Every failure the interpreter reports to the user.
///
/// None of these end the session: the caller reports them with the shell
/// name as a prefix and carries on with the next stage or line.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A redirection source or script file that does not exist.
    #[error("{path}: No such file or directory")]
    NotFound { path: String },

    /// Any other failure opening, reading or writing a file.
    #[error("{path}: {}", describe(.source))]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Invalid or out-of-range `!` history reference. Aborts the whole line.
    #[error("{0}: event not found")]
    EventNotFound(String),

    /// The external program could not be located or started.
    #[error("{0}: command not found")]
    CommandNotFound(String),

    #[error("cd: {0}")]
    ChangeDir(String),

    #[error("history: {0}")]
    History(String),
}

impl ShellError {
    /// Wrap an I/O error on `path`, folding "not found" into [`ShellError::NotFound`].
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            ShellError::NotFound { path }
        } else {
            ShellError::Io { path, source }
        }
    }
}

fn describe(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::PermissionDenied => "Permission denied".to_string(),
        io::ErrorKind::IsADirectory => "Is a directory".to_string(),
        _ => err.to_string(),
    }
}
