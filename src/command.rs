use crate::env::Environment;
use anyhow::Result;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// The command completed successfully.
pub const SUCCESS: ExitCode = 0;

/// Generic failure: builtin usage errors, spawn failures, malformed pipelines
/// and children terminated by a signal.
pub const FAILURE: ExitCode = 1;

/// The program could not be found or executed.
pub const NOT_FOUND: ExitCode = 127;

/// Whether the interpreter blocks on a command before moving on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launch {
    /// Wait for the command to terminate and report its real exit code.
    Foreground,
    /// Spawn the command and return [`SUCCESS`] immediately.
    Background,
}

impl Launch {
    /// `true` for every sub-command the splitter marked as background.
    pub fn from_background(background: bool) -> Self {
        if background {
            Launch::Background
        } else {
            Launch::Foreground
        }
    }
}

/// Object-safe trait for any command that can be executed by the shell.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
/// Builtins always run in-process and to completion, so they ignore `launch`.
pub trait ExecutableCommand {
    /// Executes the command.
    ///
    /// `stdout` and `stderr` are only used by in-process commands; spawned
    /// programs inherit the interpreter's standard streams.
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
        launch: Launch,
    ) -> Result<ExitCode>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
/// Implementations can use the environment to resolve executables (e.g., using PATH).
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;
}
