use argh::FromArgs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(FromArgs)]
/// A small line-oriented shell. Reads commands from the terminal, from
/// piped standard input, or from a script file.
struct Args {
    #[argh(positional)]
    /// script to run instead of reading standard input.
    script: Option<PathBuf>,
}

#[cfg(unix)]
fn main() -> ExitCode {
    use alsh::{Interpreter, logging, signal};
    use std::io::{self, IsTerminal};

    let args: Args = argh::from_env();
    logging::init();
    if let Err(err) = signal::install_interrupt_handler() {
        tracing::warn!(error = %err, "cannot install SIGINT handler");
    }

    let mut shell = Interpreter::default();
    let result = match args.script {
        Some(path) => shell.run_script(&path).map_err(anyhow::Error::from),
        None => {
            shell.load_history();
            if io::stdin().is_terminal() {
                shell.repl()
            } else {
                shell.run_stream(io::stdin().lock())
            }
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("alsh: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(unix))]
fn main() -> ExitCode {
    let _: Args = argh::from_env();
    eprintln!("alsh: this platform is not supported, alsh needs a Unix system");
    ExitCode::FAILURE
}
