use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Launched, Stdin, Stdout};
use crate::config::SHELL_NAME;
use crate::error::ShellError;
use crate::interpreter::Factory;
use crate::session::Session;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::io::{BufWriter, Read, Write};
use std::path::PathBuf;
use tracing::debug;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process, before any external program is looked up.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd".
    fn name() -> &'static str;

    /// Return value follows shell conventions: 0 for success, non-zero for error.
    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    /// Run to completion. Failures are reported on stderr and become status 1.
    fn launch(
        self: Box<Self>,
        mut stdin: Box<dyn Stdin>,
        stdout: Box<dyn Stdout>,
        session: &mut Session,
    ) -> Result<Launched, ShellError> {
        let mut out = BufWriter::new(stdout);
        let result = T::execute(*self, &mut stdin, &mut out, session)
            .and_then(|code| out.flush().map(|_| code).context("write error"));
        match result {
            Ok(code) => Ok(Launched::Finished(code)),
            Err(e) => {
                eprintln!("{SHELL_NAME}: {e:#}");
                Ok(Launched::Finished(1))
            }
        }
    }
}

/// Output of argh when the arguments were rejected or help was requested.
struct InvalidArgs {
    name: &'static str,
    output: String,
    is_error: bool,
}

impl InvalidArgs {
    /// The diagnostic for rejected arguments. An unknown flag reads
    /// `-x: invalid option`; anything else is argh's own text.
    fn message(&self) -> String {
        let first_line = self.output.lines().next().unwrap_or_default();
        match first_line.strip_prefix("Unrecognized argument: ") {
            Some(flag) if flag.starts_with('-') => {
                format!("{SHELL_NAME}: {}: {flag}: invalid option", self.name)
            }
            _ => format!("{SHELL_NAME}: {}: {}", self.name, self.output.trim_end()),
        }
    }
}

impl ExecutableCommand for InvalidArgs {
    fn launch(
        self: Box<Self>,
        _stdin: Box<dyn Stdin>,
        mut stdout: Box<dyn Stdout>,
        _session: &mut Session,
    ) -> Result<Launched, ShellError> {
        if self.is_error {
            eprintln!("{}", self.message());
            return Ok(Launched::Finished(1));
        }
        stdout
            .write_all(self.output.as_bytes())
            .map_err(|e| ShellError::io("stdout", e))?;
        Ok(Launched::Finished(0))
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _session: &Session,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    name: T::name(),
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; `..` goes up one level. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<ExitCode> {
        let (target, failure) = match self.target.as_deref() {
            None => (
                session.get_var("HOME").filter(|h| !h.is_empty()).map(PathBuf::from),
                "Failed to change to home directory".to_string(),
            ),
            Some("..") => (
                Some(
                    session
                        .current_dir
                        .parent()
                        .unwrap_or(&session.current_dir)
                        .to_path_buf(),
                ),
                "Failed to go up one directory".to_string(),
            ),
            Some(dir) => (
                Some(PathBuf::from(dir)),
                format!("{dir}: No such file or directory"),
            ),
        };

        let target = target.ok_or_else(|| ShellError::ChangeDir(failure.clone()))?;
        session.change_dir(&target).map_err(|err| {
            debug!(target = %target.display(), error = %err, "chdir failed");
            ShellError::ChangeDir(failure)
        })?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Display the command history, or clear it or save it to the history file.
pub struct History {
    #[argh(switch, short = 'c')]
    /// clear the history list.
    pub clear: bool,

    #[argh(switch, short = 'w')]
    /// write the history list to the history file.
    pub write: bool,
}

impl BuiltinCommand for History {
    fn name() -> &'static str {
        crate::config::HISTORY_COMMAND
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<ExitCode> {
        if self.clear {
            session.history.clear();
        }
        if self.write {
            let path = session
                .history_file
                .clone()
                .ok_or_else(|| ShellError::History("no history file (HOME is not set)".into()))?;
            session
                .history
                .save(&path)
                .map_err(|e| ShellError::io(path.display().to_string(), e))
                .context("history")?;
            debug!(path = %path.display(), entries = session.history.len(), "history written");
        }
        if !self.clear && !self.write {
            for (i, entry) in session.history.iter().enumerate() {
                writeln!(stdout, "    {}. {}", i + 1, entry)?;
            }
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Leave the shell once the current line has finished.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        crate::config::EXIT_COMMAND
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<ExitCode> {
        session.should_exit = true;
        Ok(0)
    }
}
