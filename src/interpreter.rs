use crate::command::{CommandFactory, ExitCode};
use crate::config::{COMMENT_CHAR, EXIT_COMMAND, HISTORY_COMMAND, SHELL_NAME};
use crate::error::ShellError;
use crate::expand::expand_history;
use crate::history::HistoryLog;
use crate::lexer;
use crate::parser::{self, Chain};
use crate::pipeline;
use crate::session::Session;
use anyhow::Context;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate: the builtins and ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A line-oriented command interpreter.
///
/// The interpreter owns a [`Session`] and a list of [`CommandFactory`] objects
/// that are queried, in order, to create each pipeline stage by name. See
/// [`Default`] for the factories included out of the box.
///
/// Example
/// ```
/// use alsh::Interpreter;
/// let mut sh = Interpreter::default();
/// assert_eq!(sh.run_command("false || true").unwrap(), 0);
/// assert_eq!(sh.run_command("true && false").unwrap(), 1);
/// ```
pub struct Interpreter {
    session: Session,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(session: Session, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { session, commands }
    }

    /// An interpreter with the default commands running in `session`.
    pub fn with_session(session: Session) -> Self {
        Self::new(session, default_commands())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Load the persisted history into the session. A missing file is fine.
    pub fn load_history(&mut self) {
        let Some(path) = self.session.history_file.clone() else {
            return;
        };
        match HistoryLog::load(&path) {
            Ok(log) => {
                debug!(path = %path.display(), entries = log.len(), "history loaded");
                self.session.history = log;
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %path.display(), error = %err, "cannot read history file"),
        }
    }

    /// Parse and evaluate one command line without touching the history.
    ///
    /// Returns the status of the last segment that ran. Parse errors abort
    /// the line before anything runs.
    pub fn run_command(&mut self, line: &str) -> Result<ExitCode, ShellError> {
        let chain = parser::construct_ast(lexer::split_into_tokens(line))?;
        debug!(?chain, "parsed");
        Ok(self.eval(&chain))
    }

    /// Handle a line typed by the user or read from piped input.
    ///
    /// See [`Interpreter::interact_with`]; the echo goes to stdout.
    pub fn interact(&mut self, line: &str) -> Result<Option<ExitCode>, ShellError> {
        self.interact_with(line, &mut io::stdout())
    }

    /// Expand, echo, record and run one line.
    ///
    /// History references are expanded first and the expanded line is written
    /// to `echo` if it changed. Blank and comment lines, and a line holding a
    /// lone `!`, are ignored; anything else is recorded in the history and
    /// run. On an expansion error nothing runs and nothing is recorded.
    pub fn interact_with(
        &mut self,
        line: &str,
        echo: &mut dyn Write,
    ) -> Result<Option<ExitCode>, ShellError> {
        let line = line.trim();
        if line == "!" {
            return Ok(None);
        }
        let expanded = expand_history(line, &self.session.history)?;
        if expanded != line
            && let Err(err) = writeln!(echo, "{expanded}").and_then(|_| echo.flush())
        {
            warn!(error = %err, "cannot echo expanded line");
        }
        if expanded.is_empty() || expanded.starts_with(COMMENT_CHAR) {
            return Ok(None);
        }

        self.record(&expanded);
        self.run_command(&expanded).map(Some)
    }

    fn record(&mut self, line: &str) {
        let history = &mut self.session.history;
        if line == HISTORY_COMMAND && history.last() == Some(HISTORY_COMMAND) {
            return;
        }
        history.add(line);
    }

    /// Evaluate a control chain.
    ///
    /// `;` segments all run; `||` stops at the first success and yields 1 if
    /// none succeeded; `&&` stops at the first failure and yields its status.
    /// Nothing further runs once `exit` has been executed.
    fn eval(&mut self, chain: &Chain) -> ExitCode {
        match chain {
            Chain::Sequence(segments) => {
                let mut status = 0;
                for segment in segments {
                    status = self.eval(segment);
                    if self.session.should_exit {
                        break;
                    }
                }
                status
            }
            Chain::Any(branches) => {
                for branch in branches {
                    if self.eval(branch) == 0 {
                        return 0;
                    }
                    if self.session.should_exit {
                        break;
                    }
                }
                1
            }
            Chain::All(steps) => {
                for step in steps {
                    let status = self.eval(step);
                    if status != 0 {
                        return status;
                    }
                    if self.session.should_exit {
                        break;
                    }
                }
                0
            }
            Chain::Pipeline(p) => pipeline::run_pipeline(p, &self.commands, &mut self.session),
        }
    }

    /// Interactive read-eval-print loop on a terminal.
    pub fn repl(&mut self) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new()?;
        for entry in self.session.history.iter() {
            rl.add_history_entry(entry)?;
        }

        println!("Welcome to {SHELL_NAME}!");
        println!("Type '{EXIT_COMMAND}' to exit.\n");

        while !self.session.should_exit {
            match rl.readline(&self.prompt()) {
                Ok(line) => {
                    let before = self.session.history.len();
                    report(self.interact(&line));
                    if self.session.history.len() > before
                        && let Some(entry) = self.session.history.last()
                    {
                        rl.add_history_entry(entry)?;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err).context("cannot read input"),
            }
        }

        println!("{EXIT_COMMAND}");
        Ok(())
    }

    /// Read commands line by line from a non-interactive input.
    pub fn run_stream(&mut self, input: impl BufRead) -> anyhow::Result<()> {
        for line in input.lines() {
            let line = line.context("cannot read input")?;
            report(self.interact(&line));
            if self.session.should_exit {
                break;
            }
        }
        Ok(())
    }

    /// Run a script file. History is neither expanded nor recorded.
    pub fn run_script(&mut self, path: &Path) -> Result<(), ShellError> {
        let file = File::open(path).map_err(|e| ShellError::io(path.display().to_string(), e))?;
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| ShellError::io(path.display().to_string(), e))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with(COMMENT_CHAR) {
                continue;
            }
            report(self.run_command(line));
            if self.session.should_exit {
                break;
            }
        }
        Ok(())
    }

    fn prompt(&self) -> String {
        let cwd = self.session.current_dir.display();
        if nix::unistd::Uid::effective().is_root() {
            format!("\x1b[1;31m{SHELL_NAME}-root:\x1b[1;34m{cwd}\x1b[0m# ")
        } else {
            format!("{SHELL_NAME}:\x1b[1;34m{cwd}\x1b[0m$ ")
        }
    }
}

fn report<T>(result: Result<T, ShellError>) {
    if let Err(err) = result {
        eprintln!("{SHELL_NAME}: {err}");
    }
}

fn default_commands() -> Vec<Box<dyn CommandFactory>> {
    use crate::builtin::*;
    use crate::external::ExternalCommand;
    vec![
        Box::new(Factory::<Cd>::default()),
        Box::new(Factory::<History>::default()),
        Box::new(Factory::<Exit>::default()),
        Box::new(Factory::<ExternalCommand>::default()),
    ]
}

impl Default for Interpreter {
    /// Create an interpreter for the current process environment with the
    /// builtins `cd`, `history`, `exit` and the external command launcher.
    fn default() -> Self {
        Self::with_session(Session::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use std::path::PathBuf;

    struct Scratch {
        dir: tempfile::TempDir,
    }

    impl Scratch {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn path(&self, name: &str) -> String {
            self.dir.path().join(name).to_string_lossy().into_owned()
        }

        fn read(&self, name: &str) -> Option<String> {
            fs::read_to_string(self.dir.path().join(name)).ok()
        }
    }

    fn interpreter() -> Interpreter {
        let mut session = Session::new();
        session.history_file = None;
        Interpreter::with_session(session)
    }

    #[test]
    fn redirect_then_read_back() {
        let scratch = Scratch::new();
        let mut sh = interpreter();
        let line = format!(
            "echo hi > {out}; cat {out} > {copy}",
            out = scratch.path("out.txt"),
            copy = scratch.path("copy.txt")
        );

        assert_eq!(sh.run_command(&line).unwrap(), 0);
        assert_eq!(scratch.read("out.txt").as_deref(), Some("hi\n"));
        assert_eq!(scratch.read("copy.txt").as_deref(), Some("hi\n"));
    }

    #[test]
    fn and_runs_right_side_only_after_success() {
        let scratch = Scratch::new();
        let mut sh = interpreter();

        let status = sh
            .run_command(&format!("false && echo no > {}", scratch.path("no.txt")))
            .unwrap();
        assert_eq!(status, 1);
        assert_eq!(scratch.read("no.txt"), None);

        let status = sh
            .run_command(&format!("true && echo yes > {}", scratch.path("yes.txt")))
            .unwrap();
        assert_eq!(status, 0);
        assert_eq!(scratch.read("yes.txt").as_deref(), Some("yes\n"));
    }

    #[test]
    fn and_returns_first_failing_status() {
        let mut sh = interpreter();
        assert_eq!(sh.run_command("true && ls /definitely/not/here && true").unwrap(), 2);
        assert_eq!(sh.run_command("true && true").unwrap(), 0);
    }

    #[test]
    fn or_runs_right_side_only_after_failure() {
        let scratch = Scratch::new();
        let mut sh = interpreter();

        let status = sh
            .run_command(&format!("false || echo yes > {}", scratch.path("yes.txt")))
            .unwrap();
        assert_eq!(status, 0);
        assert_eq!(scratch.read("yes.txt").as_deref(), Some("yes\n"));

        let status = sh
            .run_command(&format!("true || echo no > {}", scratch.path("no.txt")))
            .unwrap();
        assert_eq!(status, 0);
        assert_eq!(scratch.read("no.txt"), None);
    }

    #[test]
    fn or_of_failures_is_one() {
        let mut sh = interpreter();
        assert_eq!(sh.run_command("false || ls /definitely/not/here").unwrap(), 1);
    }

    #[test]
    fn semicolon_always_runs_both() {
        let scratch = Scratch::new();
        let mut sh = interpreter();
        let line = format!(
            "false; echo a > {a}; definitely_not_a_command_alsh; echo b > {b}",
            a = scratch.path("a.txt"),
            b = scratch.path("b.txt")
        );

        assert_eq!(sh.run_command(&line).unwrap(), 0);
        assert_eq!(scratch.read("a.txt").as_deref(), Some("a\n"));
        assert_eq!(scratch.read("b.txt").as_deref(), Some("b\n"));
    }

    #[test]
    fn comment_truncates_even_inside_redirection() {
        let scratch = Scratch::new();
        let mut sh = interpreter();
        let line = format!("echo kept > {}#; echo dropped", scratch.path("out.txt"));

        assert_eq!(sh.run_command(&line).unwrap(), 0);
        assert_eq!(scratch.read("out.txt").as_deref(), Some("kept\n"));

        // The file name itself is cut off, leaving `>` with nothing after it.
        assert_eq!(sh.run_command("echo lost >#out.txt").unwrap(), 1);
    }

    #[test]
    fn parse_errors_run_nothing() {
        let scratch = Scratch::new();
        let mut sh = interpreter();
        let line = format!("echo a > {} && ", scratch.path("a.txt"));

        let err = sh.run_command(&line).unwrap_err();
        assert_eq!(err.to_string(), "syntax error near unexpected token `newline'");
        assert_eq!(scratch.read("a.txt"), None);
    }

    #[test]
    fn interact_records_expanded_lines() {
        let mut sh = interpreter();
        sh.interact("true").unwrap();
        sh.interact("  ").unwrap();
        sh.interact("# a comment").unwrap();
        assert_eq!(sh.interact("!!").unwrap(), Some(0));
        assert_eq!(sh.interact("!-2 && false").unwrap(), Some(1));

        let entries: Vec<_> = sh.session().history.iter().collect();
        assert_eq!(entries, vec!["true", "true", "true && false"]);
    }

    #[test]
    fn changed_lines_are_echoed() {
        let mut sh = interpreter();
        let mut echo = Vec::new();
        sh.interact_with("true", &mut echo).unwrap();
        assert!(echo.is_empty());

        sh.interact_with("!! && !1", &mut echo).unwrap();
        assert_eq!(String::from_utf8(echo).unwrap(), "true && true\n");
    }

    #[test]
    fn lone_bang_is_ignored() {
        let mut sh = interpreter();
        sh.interact("true").unwrap();
        let mut echo = Vec::new();

        assert_eq!(sh.interact_with("  !  ", &mut echo).unwrap(), None);
        assert!(echo.is_empty());
        assert_eq!(sh.session().history.len(), 1);

        let err = sh.interact_with("! true", &mut echo).unwrap_err();
        assert_eq!(err.to_string(), "!: event not found");
        assert_eq!(sh.session().history.len(), 1);
    }

    #[test]
    fn bad_event_runs_and_records_nothing() {
        let scratch = Scratch::new();
        let mut sh = interpreter();
        sh.interact("true").unwrap();
        sh.interact("false").unwrap();

        let line = format!("echo ran > {} ; !5", scratch.path("ran.txt"));
        let err = sh.interact(&line).unwrap_err();

        assert_eq!(err.to_string(), "!5: event not found");
        assert_eq!(sh.session().history.len(), 2);
        assert_eq!(scratch.read("ran.txt"), None);
    }

    #[test]
    fn repeated_history_command_is_recorded_once() {
        let scratch = Scratch::new();
        let mut sh = interpreter();
        sh.interact("true").unwrap();
        sh.interact("history").unwrap();
        sh.interact("history").unwrap();
        sh.interact(&format!("history > {}", scratch.path("h.txt"))).unwrap();

        let entries: Vec<_> = sh.session().history.iter().collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(
            scratch.read("h.txt").unwrap(),
            format!(
                "    1. true\n    2. history\n    3. history > {}\n",
                scratch.path("h.txt")
            )
        );
    }

    #[test]
    fn exit_stops_the_rest_of_the_line() {
        let scratch = Scratch::new();
        let mut sh = interpreter();
        let line = format!("exit; echo after > {}", scratch.path("after.txt"));

        assert_eq!(sh.run_command(&line).unwrap(), 0);
        assert!(sh.session().should_exit);
        assert_eq!(scratch.read("after.txt"), None);
    }

    #[test]
    fn stream_stops_at_exit() {
        let scratch = Scratch::new();
        let mut sh = interpreter();
        let input = format!(
            "echo one > {a}\n!!\nexit\necho two > {b}\n",
            a = scratch.path("a.txt"),
            b = scratch.path("b.txt")
        );

        sh.run_stream(Cursor::new(input)).unwrap();
        assert_eq!(scratch.read("a.txt").as_deref(), Some("one\n"));
        assert_eq!(scratch.read("b.txt"), None);
        assert_eq!(sh.session().history.len(), 3);
    }

    #[test]
    fn script_lines_are_not_expanded_or_recorded() {
        let scratch = Scratch::new();
        let script = PathBuf::from(scratch.path("script.alsh"));
        fs::write(
            &script,
            format!(
                "# setup\necho first > {a}\n\n   echo second >> {a}   \n",
                a = scratch.path("a.txt")
            ),
        )
        .unwrap();

        let mut sh = interpreter();
        sh.run_script(&script).unwrap();
        assert_eq!(scratch.read("a.txt").as_deref(), Some("first\nsecond\n"));
        assert!(sh.session().history.is_empty());
    }

    #[test]
    fn missing_script_is_an_error() {
        let scratch = Scratch::new();
        let mut sh = interpreter();
        let missing = PathBuf::from(scratch.path("nope.alsh"));

        let err = sh.run_script(&missing).unwrap_err();
        assert!(matches!(err, ShellError::NotFound { .. }));
    }

    #[test]
    fn history_round_trips_through_file() {
        let scratch = Scratch::new();
        let file = PathBuf::from(scratch.path(".alsh_history"));

        let mut sh = interpreter();
        sh.session_mut().history_file = Some(file.clone());
        sh.interact("true").unwrap();
        sh.interact("false || true").unwrap();
        sh.interact("history -w").unwrap();

        let mut reloaded = interpreter();
        reloaded.session_mut().history_file = Some(file);
        reloaded.load_history();
        assert_eq!(reloaded.session().history, sh.session().history);
    }

    #[test]
    fn cd_then_run_in_new_directory() {
        let _lock = crate::builtin::tests::lock_current_dir();
        let orig = std::env::current_dir().unwrap();
        let scratch = Scratch::new();
        let mut sh = interpreter();

        let status = sh
            .run_command(&format!("cd {} && pwd > where.txt", scratch.path("")))
            .unwrap();
        std::env::set_current_dir(&orig).unwrap();

        assert_eq!(status, 0);
        let expected = fs::canonicalize(scratch.dir.path()).unwrap();
        assert_eq!(
            scratch.read("where.txt").map(|s| PathBuf::from(s.trim())),
            Some(expected)
        );
    }
}
