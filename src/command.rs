use crate::error::ShellError;
use crate::session::Session;
use std::io::{Read, Write};
use std::process::{Child, Stdio};
use tracing::warn;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// Builtins report status the same way external programs do.
pub type ExitCode = i32;

/// Abstraction over a readable input stream that can also be converted into
/// a [`Stdio`] handle for spawning external processes.
///
/// A stage's input is a pipe, a redirection file, or a duplicate of the
/// shell's own standard input; all of them get this through the blanket impl.
pub trait Stdin: Read {
    /// Convert this input into a [`Stdio`] handle suitable for `std::process::Command`.
    fn stdio(self: Box<Self>) -> Stdio;
}

impl<T: Read + Into<Stdio>> Stdin for T {
    fn stdio(self: Box<Self>) -> Stdio {
        (*self).into()
    }
}

/// Writable counterpart of [`Stdin`].
pub trait Stdout: Write {
    /// Convert this output into a [`Stdio`] handle suitable for `std::process::Command`.
    fn stdio(self: Box<Self>) -> Stdio;
}

impl<T: Write + Into<Stdio>> Stdout for T {
    fn stdio(self: Box<Self>) -> Stdio {
        (*self).into()
    }
}

/// What starting a stage produced.
#[derive(Debug)]
pub enum Launched {
    /// Ran in-process (builtins) or never started; the status is final.
    Finished(ExitCode),
    /// A child process that still has to be waited for.
    Running(Child),
}

impl Launched {
    /// Block until the stage is done and return its status.
    pub fn wait(self) -> ExitCode {
        match self {
            Launched::Finished(code) => code,
            Launched::Running(mut child) => match child.wait() {
                Ok(status) => crate::external::exit_code(status),
                Err(err) => {
                    warn!(pid = child.id(), error = %err, "failed to wait for child");
                    1
                }
            },
        }
    }
}

/// Object-safe trait for any command that can run as a pipeline stage.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
/// The streams are owned by the stage and released when `launch` returns;
/// a spawned child keeps its own copies.
pub trait ExecutableCommand {
    fn launch(
        self: Box<Self>,
        stdin: Box<dyn Stdin>,
        stdout: Box<dyn Stdout>,
        session: &mut Session,
    ) -> Result<Launched, ShellError>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    fn try_create(
        &self,
        session: &Session,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;
}
