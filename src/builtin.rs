use crate::command::{CommandFactory, ExecutableCommand, ExitCode, FAILURE, Launch, SUCCESS};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use log::debug;
use std::io::Write;
use std::path::Path;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process, so they always run in the
/// foreground and only inside single-stage sub-commands.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "pwd" or "cd".
    fn name() -> &'static str;

    /// Treat every argument as an operand, so `cd --help` means the
    /// directory `--help` rather than a usage request.
    const OPERANDS_ONLY: bool = false;

    /// Executes the command using provided output stream and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
        launch: Launch,
    ) -> Result<ExitCode> {
        if launch == Launch::Background {
            debug!("{} runs in-process, ignoring background request", T::name());
        }
        match <T as BuiltinCommand>::execute(*self, stdout, env) {
            Ok(x) => Ok(x),
            Err(e) => {
                writeln!(stderr, "{}: {:#}", T::name(), e)?;
                Ok(FAILURE)
            }
        }
    }
}

/// Outcome of an argument vector `argh` refused, e.g. a missing operand.
struct InvalidArgs {
    name: &'static str,
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        _env: &mut Environment,
        _launch: Launch,
    ) -> Result<ExitCode> {
        if self.is_error {
            write!(stderr, "{}: {}", self.name, self.output)?;
            Ok(FAILURE)
        } else {
            stdout.write_all(self.output.as_bytes())?;
            Ok(SUCCESS)
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            let operands: Vec<&str>;
            let args = if T::OPERANDS_ONLY {
                operands = std::iter::once("--").chain(args.iter().copied()).collect();
                &operands[..]
            } else {
                args
            };
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
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let dir = env
            .working_dir
            .current()
            .context("can't resolve the current directory")?;
        writeln!(stdout, "{}", dir.display())?;
        Ok(SUCCESS)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: String,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    const OPERANDS_ONLY: bool = true;

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.working_dir
            .change(Path::new(&self.target))
            .with_context(|| format!("can't change directory to {}", self.target))?;
        Ok(SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{ProcessWorkingDirectory, VirtualWorkingDirectory, WorkingDirectory};
    use std::env as stdenv;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn virtual_env(dir: impl Into<PathBuf>) -> Environment {
        Environment::with_working_dir(Box::new(VirtualWorkingDirectory::new(dir)))
    }

    fn create(name: &str, args: &[&str], env: &Environment) -> Box<dyn ExecutableCommand> {
        let created = if name == "cd" {
            Factory::<Cd>::default().try_create(env, name, args)
        } else {
            Factory::<Pwd>::default().try_create(env, name, args)
        };
        created.expect("builtin factory should accept its own name")
    }

    fn run(name: &str, args: &[&str], env: &mut Environment) -> (ExitCode, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = create(name, args, env)
            .execute(&mut out, &mut err, env, Launch::Foreground)
            .unwrap();
        (
            code,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_pwd_prints_current_dir() {
        let root = tempfile::tempdir().unwrap();
        let mut env = virtual_env(root.path());

        let (code, out, err) = run("pwd", &[], &mut env);
        assert_eq!(code, SUCCESS);
        assert_eq!(out, format!("{}\n", root.path().display()));
        assert!(err.is_empty());
    }

    #[test]
    fn test_pwd_fails_when_directory_is_gone() {
        let root = tempfile::tempdir().unwrap();
        let doomed = root.path().join("doomed");
        fs::create_dir(&doomed).unwrap();
        let mut env = virtual_env(&doomed);
        fs::remove_dir(&doomed).unwrap();

        let (code, out, err) = run("pwd", &[], &mut env);
        assert_eq!(code, FAILURE);
        assert!(out.is_empty());
        assert!(err.starts_with("pwd: can't resolve the current directory"), "{err}");
    }

    #[test]
    fn test_pwd_rejects_arguments() {
        let root = tempfile::tempdir().unwrap();
        let mut env = virtual_env(root.path());
        let (code, _, err) = run("pwd", &["extra"], &mut env);
        assert_eq!(code, FAILURE);
        assert!(err.starts_with("pwd: "));
    }

    #[test]
    fn test_cd_then_pwd() {
        let root = tempfile::tempdir().unwrap();
        let base = fs::canonicalize(root.path()).unwrap();
        fs::create_dir(base.join("sub")).unwrap();
        let mut env = virtual_env(&base);

        let (code, _, err) = run("cd", &["sub"], &mut env);
        assert_eq!(code, SUCCESS, "stderr: {err}");

        let (_, out, _) = run("pwd", &[], &mut env);
        assert_eq!(out, format!("{}\n", base.join("sub").display()));
    }

    #[test]
    fn test_cd_without_argument_fails() {
        let root = tempfile::tempdir().unwrap();
        let mut env = virtual_env(root.path());

        let (code, out, err) = run("cd", &[], &mut env);
        assert_eq!(code, FAILURE);
        assert!(out.is_empty());
        assert!(err.starts_with("cd: "), "{err}");
        assert_eq!(env.working_dir.current().unwrap(), root.path());
    }

    #[test]
    fn test_cd_with_two_arguments_fails() {
        let root = tempfile::tempdir().unwrap();
        let mut env = virtual_env(root.path());

        let (code, _, _) = run("cd", &["/", "/tmp"], &mut env);
        assert_eq!(code, FAILURE);
        assert_eq!(env.working_dir.current().unwrap(), root.path());
    }

    #[test]
    fn test_cd_help_is_a_directory_name() {
        let root = tempfile::tempdir().unwrap();
        let base = fs::canonicalize(root.path()).unwrap();
        let mut env = virtual_env(&base);

        let (code, out, _) = run("cd", &["--help"], &mut env);
        assert_eq!(code, FAILURE);
        assert!(out.is_empty());
        assert_eq!(env.working_dir.current().unwrap(), base);

        fs::create_dir(base.join("--help")).unwrap();
        let (code, _, err) = run("cd", &["--help"], &mut env);
        assert_eq!(code, SUCCESS, "stderr: {err}");
        assert_eq!(env.working_dir.current().unwrap(), base.join("--help"));

        fs::create_dir(base.join("--help").join("help")).unwrap();
        let (code, _, _) = run("cd", &["help"], &mut env);
        assert_eq!(code, SUCCESS);
        assert_eq!(
            env.working_dir.current().unwrap(),
            base.join("--help").join("help")
        );
    }

    #[test]
    fn test_cd_nonexistent_path_errors() {
        let root = tempfile::tempdir().unwrap();
        let mut env = virtual_env(root.path());

        let (code, _, err) = run("cd", &["nonexistent_dir_for_cd_test"], &mut env);
        assert_eq!(code, FAILURE);
        assert!(
            err.starts_with("cd: can't change directory to nonexistent_dir_for_cd_test"),
            "{err}"
        );
        assert_eq!(env.working_dir.current().unwrap(), root.path());
    }

    #[test]
    fn test_cd_changes_process_directory() {
        let _lock = lock_current_dir();
        let root = tempfile::tempdir().unwrap();
        let canonical = fs::canonicalize(root.path()).unwrap();
        let orig = stdenv::current_dir().unwrap();

        let mut env = Environment::with_working_dir(Box::new(ProcessWorkingDirectory));
        let (code, _, _) = run("cd", &[canonical.to_str().unwrap()], &mut env);
        let now = stdenv::current_dir().unwrap();
        stdenv::set_current_dir(&orig).expect("failed to restore cwd");

        assert_eq!(code, SUCCESS);
        assert_eq!(fs::canonicalize(now).unwrap(), canonical);
        assert_eq!(ProcessWorkingDirectory.current().unwrap(), orig);
    }

    #[test]
    fn test_factory_ignores_other_names() {
        let env = virtual_env("/");
        assert!(Factory::<Cd>::default().try_create(&env, "ls", &[]).is_none());
        assert!(Factory::<Pwd>::default().try_create(&env, "cd", &[]).is_none());
    }
}
