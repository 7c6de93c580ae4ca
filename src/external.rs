use crate::command::{CommandFactory, ExecutableCommand, ExitCode, FAILURE, Launch, SUCCESS};
use crate::env::Environment;
use crate::error::ShellError;
use crate::interpreter::Factory;
use anyhow::Result;
use log::debug;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// Command that is not a builtin.
pub struct ExternalCommand {
    /// Resolved location of the program.
    program: PathBuf,
    /// Full argument vector, `argv[0]` as typed by the user.
    argv: Vec<String>,
}

impl ExternalCommand {
    pub fn new(program: PathBuf, argv: Vec<String>) -> Self {
        Self { program, argv }
    }

    fn name(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        let executable = resolve(env, name)?;
        let argv = std::iter::once(name)
            .chain(args.iter().copied())
            .map(str::to_owned)
            .collect();
        Some(Box::new(ExternalCommand::new(executable, argv)))
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(
        self: Box<Self>,
        _stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
        launch: Launch,
    ) -> Result<ExitCode> {
        let mut child = command_for(&self.program, &self.argv, env)
            .spawn()
            .map_err(|e| ShellError::from_spawn(self.name(), e))?;

        if launch == Launch::Background {
            env.jobs.launch(self.name(), child);
            return Ok(SUCCESS);
        }

        let status = child.wait().map_err(|source| ShellError::Wait {
            program: self.name().to_owned(),
            source,
        })?;
        Ok(exit_code(self.name(), status, stderr))
    }
}

/// Build the process invocation shared by single commands and pipeline stages.
///
/// The environment is inherited untouched; the working directory comes from
/// the interpreter's provider so `cd` is honoured even when it is virtual.
pub(crate) fn command_for(program: &Path, argv: &[String], env: &Environment) -> Command {
    let mut cmd = Command::new(program);
    if let Some((arg0, rest)) = argv.split_first() {
        cmd.arg0(arg0).args(rest);
    }
    if let Some(dir) = env.spawn_dir() {
        cmd.current_dir(dir);
    }
    cmd
}

/// Resolve `name` against the environment's search path.
///
/// Relative paths with a directory part are anchored at the interpreter's
/// working directory, not the process one.
pub(crate) fn resolve(env: &Environment, name: &str) -> Option<PathBuf> {
    let search_paths = env.search_path.as_deref().unwrap_or_default();
    let path = Path::new(name);
    match env.spawn_dir() {
        Some(dir) if path.is_relative() && path.components().count() > 1 => {
            find_command_path(search_paths, &dir.join(path)).map(Cow::into_owned)
        }
        _ => find_command_path(search_paths, path).map(Cow::into_owned),
    }
}

/// Translate a foreground child's status. Abnormal termination is reported
/// without the signal number and collapses to [`FAILURE`].
fn exit_code(name: &str, status: ExitStatus, stderr: &mut dyn Write) -> ExitCode {
    match status.code() {
        Some(code) => code,
        None => {
            debug!("{name} terminated abnormally: {status}");
            let _ = writeln!(stderr, "chainsh: {name}: terminated abnormally");
            FAILURE
        }
    }
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh`): returns it if it exists.
/// - `./foo`-prefixed paths: returns it if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first existing match.
/// - Empty path: returns `None`.
///
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    if path.starts_with("./") && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|path| is_executable(path))
}

/// Regular file with at least one execute bit, the entries `execvp` would try.
fn is_executable(path: &Path) -> bool {
    path.metadata()
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}
