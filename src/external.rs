use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Launched, Stdin, Stdout};
use crate::error::ShellError;
use crate::interpreter::Factory;
use crate::session::Session;
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use tracing::debug;

/// Command that is not a builtin, resolved to an executable on disk.
pub struct ExternalCommand {
    name: String,
    program: OsString,
    args: Vec<OsString>,
}

impl ExternalCommand {
    pub fn new(name: String, program: OsString, args: Vec<OsString>) -> Self {
        Self {
            name,
            program,
            args,
        }
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(
        &self,
        session: &Session,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        let search_paths = session.get_var("PATH").unwrap_or_default();
        let executable = find_command_path(OsStr::new(&search_paths), Path::new(name))?;
        Some(Box::new(ExternalCommand::new(
            name.to_string(),
            executable.as_os_str().to_owned(),
            args.iter().map(OsString::from).collect(),
        )))
    }
}

impl ExecutableCommand for ExternalCommand {
    /// Spawn the program without waiting for it.
    fn launch(
        self: Box<Self>,
        stdin: Box<dyn Stdin>,
        stdout: Box<dyn Stdout>,
        session: &mut Session,
    ) -> Result<Launched, ShellError> {
        let spawned = std::process::Command::new(&self.program)
            .arg0(&self.name)
            .args(&self.args)
            .stdin(stdin.stdio())
            .stdout(stdout.stdio())
            .envs(session.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&session.current_dir)
            .spawn();
        match spawned {
            Ok(child) => {
                debug!(pid = child.id(), program = ?self.program, "spawned");
                Ok(Launched::Running(child))
            }
            Err(err) => {
                debug!(program = ?self.program, error = %err, "spawn failed");
                Err(ShellError::CommandNotFound(self.name))
            }
        }
    }
}

/// Status of a finished child, with `128 + signal` for signal deaths.
pub fn exit_code(exit_status: ExitStatus) -> ExitCode {
    if let Some(code) = exit_status.code() {
        code
    } else if let Some(signal) = exit_status.signal() {
        128 + signal
    } else if exit_status.core_dumped() {
        255
    } else {
        -1
    }
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh`): returns it if it exists.
/// - `./foo`: returns it if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first existing match.
/// - Empty path: returns `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() || path.starts_with("./") {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|candidate| candidate.is_file())
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::os::unix::fs::PermissionsExt;
    use std::process::Command;

    fn osstr(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    #[test]
    fn absolute_existing() {
        let path = Path::new("/bin/sh");
        let found = find_command_path(osstr("/nowhere"), path).expect("absolute /bin/sh");
        assert_eq!(found.as_ref(), path);
    }

    #[test]
    fn absolute_nonexisting() {
        let path = Path::new("/bin/nonexisting");
        assert!(find_command_path(osstr("/bin"), path).is_none());
    }

    #[test]
    fn single_component_found_in_path() {
        let found = find_command_path(osstr("/nowhere:/bin"), Path::new("sh"))
            .expect("Expected to find 'sh' in /bin via PATH search");
        assert_eq!(found.as_ref(), Path::new("/bin/sh"));
    }

    #[test]
    fn single_component_not_found_in_path() {
        assert!(find_command_path(osstr("/bin"), Path::new("nonexisting")).is_none());
    }

    #[test]
    fn directories_in_path_are_not_commands() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("tool")).unwrap();
        let search = dir.path().as_os_str().to_owned();
        assert!(find_command_path(&search, Path::new("tool")).is_none());

        let script = dir.path().join("runme");
        File::create(&script).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        let found = find_command_path(&search, Path::new("runme")).unwrap();
        assert_eq!(found.as_ref(), script.as_path());
    }

    #[test]
    fn multiple_components_are_taken_as_is() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("bin")).unwrap();
        let tool = dir.path().join("bin").join("tool");
        File::create(&tool).unwrap();

        let found = find_command_path(osstr("/does/not/matter"), &tool).unwrap();
        assert_eq!(found.as_ref(), tool.as_path());
    }

    #[test]
    fn empty_path_is_none() {
        assert!(find_command_path(osstr("/bin"), Path::new("")).is_none());
    }

    #[test]
    fn exit_codes_from_status() {
        let ok = Command::new("/bin/sh").args(["-c", "exit 0"]).status().unwrap();
        assert_eq!(exit_code(ok), 0);

        let failed = Command::new("/bin/sh").args(["-c", "exit 3"]).status().unwrap();
        assert_eq!(exit_code(failed), 3);

        let killed = Command::new("/bin/sh")
            .args(["-c", "kill -TERM $$"])
            .status()
            .unwrap();
        assert_eq!(exit_code(killed), 128 + 15);
    }
}
