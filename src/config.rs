//! Fixed names used by the shell and resolution of the persisted history file.

use std::collections::HashMap;
use std::path::PathBuf;

/// Name used as the prefix of every diagnostic.
pub const SHELL_NAME: &str = "alsh";

/// Everything from this character to the end of the line is ignored.
pub const COMMENT_CHAR: char = '#';

pub const EXIT_COMMAND: &str = "exit";

pub const HISTORY_COMMAND: &str = "history";

/// History file name, relative to the home directory.
pub const HISTORY_FILE_NAME: &str = ".alsh_history";

/// Overrides the history file location when set.
pub const HISTORY_FILE_VAR: &str = "ALSH_HISTFILE";

/// Tracing filter directives for the binary, e.g. `ALSH_LOG=debug`.
pub const LOG_FILTER_VAR: &str = "ALSH_LOG";

/// Resolve where `history -w` writes and where the session loads history from.
///
/// `$ALSH_HISTFILE` wins; otherwise the file lives in `$HOME`. Returns `None`
/// when neither variable is usable.
pub fn history_file_path(vars: &HashMap<String, String>) -> Option<PathBuf> {
    if let Some(path) = vars.get(HISTORY_FILE_VAR).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    vars.get("HOME")
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(HISTORY_FILE_NAME))
}
