//! Multi-stage pipelines: `a | b | c`.
//!
//! Every stage is its own process. Stage *i* writes into pipe *i* and stage
//! *i + 1* reads from it. Pipe ends are created close-on-exec and handed to
//! exactly one child, which gets them as stdin/stdout; the parent's copies are
//! dropped as soon as the owning stage has been spawned. No process ever
//! keeps a write end it doesn't use, so readers always see EOF.

use crate::command::{ExitCode, Launch, SUCCESS};
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::{command_for, resolve};
use crate::parser::{self, Stage};
use log::{debug, warn};
use nix::fcntl::{FcntlArg, FdFlag, fcntl};
use nix::unistd;
use std::io::Write;
use std::os::fd::{AsRawFd, OwnedFd};
use std::process::{Child, Stdio};

/// A validated pipeline of at least two non-empty stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

/// Both ends of one anonymous pipe. Each end is taken by the stage that uses it.
struct PipeEnds {
    read: Option<OwnedFd>,
    write: Option<OwnedFd>,
}

impl Pipeline {
    /// Split `text` on `|` and validate the result.
    pub fn parse(text: &str) -> Result<Self, ShellError> {
        let stages = parser::split_stages(text);
        if stages.len() < 2 {
            return Err(ShellError::MalformedPipeline {
                stages: stages.len(),
            });
        }
        if let Some(index) = stages.iter().position(|stage| stage.argv.is_empty()) {
            return Err(ShellError::EmptyStage { index });
        }
        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Spawn every stage, then wait for all of them unless `launch` is
    /// [`Launch::Background`].
    ///
    /// A stage that can't be spawned is reported on `stderr`; its neighbours
    /// still run and see EOF or a broken pipe. The pipeline status is always
    /// [`SUCCESS`], whatever the stages exit with.
    pub fn run(
        self,
        env: &mut Environment,
        launch: Launch,
        stderr: &mut dyn Write,
    ) -> Result<ExitCode, ShellError> {
        let count = self.stages.len();
        let mut pipes = (1..count)
            .map(|_| cloexec_pipe())
            .collect::<Result<Vec<_>, _>>()?;

        let mut children: Vec<(String, Child)> = Vec::with_capacity(count);
        for (index, stage) in self.stages.iter().enumerate() {
            let stdin = match index {
                0 => None,
                _ => pipes[index - 1].read.take(),
            };
            let stdout = match index {
                i if i + 1 < count => pipes[i].write.take(),
                _ => None,
            };
            // Dropping the unspawned ends here closes the parent's copies.
            match spawn_stage(stage, env, stdin, stdout) {
                Ok(child) => children.push((stage.argv[0].clone(), child)),
                Err(e) => {
                    let _ = writeln!(stderr, "chainsh: {e}");
                }
            }
        }
        drop(pipes);
        debug!("pipeline spawned {}/{} stages", children.len(), count);

        match launch {
            Launch::Background => {
                for (program, child) in children {
                    env.jobs.launch(program, child);
                }
            }
            Launch::Foreground => {
                for (program, mut child) in children {
                    if let Err(e) = child.wait() {
                        warn!("can't wait for pipeline stage {program}: {e}");
                    }
                }
            }
        }
        Ok(SUCCESS)
    }
}

fn spawn_stage(
    stage: &Stage,
    env: &Environment,
    stdin: Option<OwnedFd>,
    stdout: Option<OwnedFd>,
) -> Result<Child, ShellError> {
    let name = &stage.argv[0];
    let program = resolve(env, name).ok_or_else(|| ShellError::NotFound {
        program: name.clone(),
    })?;

    let mut cmd = command_for(&program, &stage.argv, env);
    if let Some(fd) = stdin {
        cmd.stdin(Stdio::from(fd));
    }
    if let Some(fd) = stdout {
        cmd.stdout(Stdio::from(fd));
    }
    cmd.spawn().map_err(|e| ShellError::from_spawn(name, e))
}

/// An anonymous pipe whose ends are not inherited across `exec`.
///
/// Children only keep the ends installed as their stdin/stdout, which `dup2`
/// copies without the close-on-exec flag.
fn cloexec_pipe() -> Result<PipeEnds, ShellError> {
    let (read, write) = unistd::pipe()?;
    for fd in [&read, &write] {
        fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;
    }
    Ok(PipeEnds {
        read: Some(read),
        write: Some(write),
    })
}
