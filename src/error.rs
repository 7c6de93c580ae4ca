use crate::command::{ExitCode, FAILURE, NOT_FOUND};
use std::io;
use thiserror::Error;

/// Failures raised by the execution engine itself, as opposed to the
/// programs it runs.
///
/// None of these are fatal: the interpreter reports them on the error stream
/// and carries [`ShellError::exit_code`] into the chain evaluation.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("malformed pipeline: expected at least 2 stages, found {stages}")]
    MalformedPipeline { stages: usize },

    #[error("malformed pipeline: stage {index} is empty")]
    EmptyStage { index: usize },

    #[error("{program}: command not found")]
    NotFound { program: String },

    #[error("{program}: {source}")]
    NotExecutable {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program}: can't spawn: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program}: can't wait: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("can't create pipe: {0}")]
    Pipe(#[from] nix::Error),
}

impl ShellError {
    /// Classify a failed spawn: programs that exist but can't be executed
    /// share the "not found" status, everything else is a generic failure.
    pub fn from_spawn(program: &str, source: io::Error) -> Self {
        let program = program.to_owned();
        match source.kind() {
            io::ErrorKind::NotFound => ShellError::NotFound { program },
            io::ErrorKind::PermissionDenied => ShellError::NotExecutable { program, source },
            _ => ShellError::Spawn { program, source },
        }
    }

    /// Status carried into the chain evaluator for this failure.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ShellError::NotFound { .. } | ShellError::NotExecutable { .. } => NOT_FOUND,
            _ => FAILURE,
        }
    }
}
