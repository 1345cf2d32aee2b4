//! Running a pipeline: wiring stages together and collecting the final status.

use crate::command::{CommandFactory, ExitCode, Launched, Stdin, Stdout};
use crate::config::SHELL_NAME;
use crate::error::ShellError;
use crate::lexer::Token;
use crate::parser::{Pipeline, Stage};
use crate::redirect;
use crate::session::Session;
use std::fs::File;
use std::io::{self, PipeWriter, Write};
use std::os::fd::AsFd;
use tracing::{debug, warn};

/// Run every stage of `pipeline` and return the status of the last one.
///
/// All stages are started before any is waited for, each reading the
/// previous stage's output through an anonymous pipe. Stages are started
/// from the last to the first, so a builtin writing into a pipe always has
/// its reader running already. Every child is reaped; the statuses of the
/// stages before the last are discarded.
///
/// Only the last stage runs against `session` itself. Earlier stages get a
/// detached copy taken before anything starts, so `cd`, `history -c` or
/// `exit` feeding a pipe leave the shell as it was.
pub fn run_pipeline(
    pipeline: &Pipeline,
    factories: &[Box<dyn CommandFactory>],
    session: &mut Session,
) -> ExitCode {
    if let Err(err) = io::stdout().flush() {
        warn!(error = %err, "cannot flush stdout");
    }

    let count = pipeline.stages.len();
    let mut launched = Vec::with_capacity(count);
    let mut downstream: Option<PipeWriter> = None;
    let snapshot = (count > 1).then(|| session.detached());

    for (index, stage) in pipeline.stages.iter().enumerate().rev() {
        let stdout: io::Result<Box<dyn Stdout>> = match downstream.take() {
            Some(writer) => Ok(Box::new(writer)),
            None => shell_stdout().map(|f| Box::new(f) as Box<dyn Stdout>),
        };
        let stdin: io::Result<Box<dyn Stdin>> = if index > 0 {
            io::pipe().map(|(reader, writer)| {
                downstream = Some(writer);
                Box::new(reader) as Box<dyn Stdin>
            })
        } else {
            shell_stdin().map(|f| Box::new(f) as Box<dyn Stdin>)
        };

        let outcome = match (stdin, stdout) {
            (Ok(stdin), Ok(stdout)) => match &snapshot {
                Some(snapshot) if index + 1 < count => {
                    launch_stage(stage, stdin, stdout, factories, &mut snapshot.clone())
                }
                _ => launch_stage(stage, stdin, stdout, factories, session),
            },
            (Err(err), _) | (_, Err(err)) => {
                eprintln!("{SHELL_NAME}: {err}");
                Launched::Finished(1)
            }
        };
        launched.push(outcome);
    }
    drop(downstream);

    // `launched` runs last stage first.
    let mut statuses = launched.into_iter().map(Launched::wait);
    let status = statuses.next().unwrap_or(0);
    statuses.for_each(drop);
    debug!(stages = count, status, "pipeline finished");
    status
}

/// Resolve one stage's redirections and command, then start it.
///
/// Failures are reported here and only fail this stage, with status 1.
/// The streams handed in are released when this returns.
fn launch_stage(
    stage: &Stage,
    stdin: Box<dyn Stdin>,
    stdout: Box<dyn Stdout>,
    factories: &[Box<dyn CommandFactory>],
    session: &mut Session,
) -> Launched {
    match try_launch_stage(stage, stdin, stdout, factories, session) {
        Ok(launched) => launched,
        Err(err) => {
            eprintln!("{SHELL_NAME}: {err}");
            Launched::Finished(1)
        }
    }
}

fn try_launch_stage(
    stage: &Stage,
    mut stdin: Box<dyn Stdin>,
    mut stdout: Box<dyn Stdout>,
    factories: &[Box<dyn CommandFactory>],
    session: &mut Session,
) -> Result<Launched, ShellError> {
    debug!(stage = %stage, "launching stage");
    let mut tokens = stage.tokens.clone();
    let redirections = redirect::resolve(&mut tokens)?;

    if let Some(input) = &redirections.input {
        stdin = Box::new(input.open()?);
    }
    if let Some(output) = &redirections.output {
        stdout = Box::new(output.open()?);
    }

    let argv = stage_argv(tokens);
    let Some((name, args)) = argv.split_first() else {
        return Ok(Launched::Finished(0));
    };
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let command = factories
        .iter()
        .find_map(|factory| factory.try_create(session, name, &args))
        .ok_or_else(|| ShellError::CommandNotFound(name.clone()))?;
    command.launch(stdin, stdout, session)
}

/// Words of a stage whose redirections were already taken out. A bare `ls`
/// gets `--color=auto`.
fn stage_argv(tokens: Vec<Token>) -> Vec<String> {
    let mut argv: Vec<String> = tokens
        .into_iter()
        .filter_map(|token| match token {
            Token::Word(word) => Some(word),
            _ => None,
        })
        .collect();
    if argv.len() == 1 && argv[0] == "ls" {
        argv.push("--color=auto".to_string());
    }
    argv
}

/// A private duplicate of the shell's standard input.
fn shell_stdin() -> io::Result<File> {
    Ok(File::from(io::stdin().as_fd().try_clone_to_owned()?))
}

/// A private duplicate of the shell's standard output.
fn shell_stdout() -> io::Result<File> {
    Ok(File::from(io::stdout().as_fd().try_clone_to_owned()?))
}
