use crate::command::{CommandFactory, ExitCode, FAILURE, Launch, SUCCESS};
use crate::env::Environment;
use crate::error::ShellError;
use crate::lexer;
use crate::parser::{self, Operator, SubCommand};
use crate::pipeline::Pipeline;
use log::debug;
use std::io::{self, Write};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate: builtins and `ExternalCommand`.
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

/// The command-chain execution engine.
///
/// The interpreter maintains an [`Environment`] and a list of [`CommandFactory`] objects
/// that are queried to create single commands by name. See [`Default`] for the
/// factories included out of the box.
///
/// Example
/// ```
/// use chainsh::Interpreter;
/// let mut sh = Interpreter::default();
/// assert_eq!(sh.eval_line("false || true"), 0);
/// assert_ne!(sh.eval_line("true && false"), 0);
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(),
            commands,
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
        }
    }

    /// Replace the environment, e.g. to use a virtual working directory.
    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Redirect what the interpreter writes itself: builtin output and
    /// diagnostics. Spawned programs keep the inherited streams.
    pub fn with_output(mut self, stdout: Box<dyn Write>, stderr: Box<dyn Write>) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Evaluate one input line and return the status of the last segment that
    /// actually ran.
    ///
    /// Segments run left to right. The first always runs; after that the
    /// operator written before a segment decides, from the carried status,
    /// whether it runs. Skipped and empty segments leave the status untouched.
    pub fn eval_line(&mut self, line: &str) -> ExitCode {
        self.env.jobs.reap();

        let mut status = SUCCESS;
        let mut gate = Operator::Sequence;
        for segment in parser::split_chain(line) {
            if !gate.permits(status) {
                debug!("skip {:?} after `{}` (status {status})", segment.text, gate.as_str());
            } else if segment.text.is_empty() {
                debug!("empty segment before `{}`", segment.operator.as_str());
            } else {
                status = self.run_segment(segment.text);
                debug!("{:?} -> {status}", segment.text);
            }
            gate = segment.operator;
        }
        let _ = self.stdout.flush();
        status
    }

    /// Run every `&`-separated sub-command of a segment, in order.
    ///
    /// The segment's status is the status of its last (foreground) sub-command.
    pub fn run_segment(&mut self, segment: &str) -> ExitCode {
        let mut status = SUCCESS;
        for sub in parser::split_subcommands(segment) {
            status = self.run_subcommand(sub);
        }
        status
    }

    /// Route one sub-command to the pipeline executor or the dispatcher and
    /// turn any failure into a diagnostic plus exit status.
    pub fn run_subcommand(&mut self, sub: SubCommand<'_>) -> ExitCode {
        let launch = Launch::from_background(sub.background);
        let result = if sub.is_pipeline() {
            self.run_pipeline(sub.text, launch).map_err(anyhow::Error::from)
        } else {
            self.dispatch(sub.text, launch)
        };
        result.unwrap_or_else(|err| self.report(err))
    }

    /// Run a single, non-piped command: builtins in-process, anything else as
    /// one child process.
    ///
    /// An empty command succeeds without doing anything.
    pub fn dispatch(&mut self, text: &str, launch: Launch) -> anyhow::Result<ExitCode> {
        let argv = lexer::split_words(text);
        let Some((name, rest)) = argv.split_first() else {
            return Ok(SUCCESS);
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();

        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(&self.env, name, &args) {
                self.stdout.flush()?;
                return cmd.execute(&mut *self.stdout, &mut *self.stderr, &mut self.env, launch);
            }
        }
        Err(ShellError::NotFound {
            program: name.clone(),
        }
        .into())
    }

    fn run_pipeline(&mut self, text: &str, launch: Launch) -> Result<ExitCode, ShellError> {
        let pipeline = Pipeline::parse(text)?;
        let _ = self.stdout.flush();
        pipeline.run(&mut self.env, launch, &mut *self.stderr)
    }

    /// Print a diagnostic for `err` and return the status it stands for.
    fn report(&mut self, err: anyhow::Error) -> ExitCode {
        let _ = writeln!(self.stderr, "chainsh: {err:#}");
        err.downcast_ref::<ShellError>()
            .map_or(FAILURE, ShellError::exit_code)
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of commands:
    /// - built-ins: `pwd`, `cd`
    /// - external command launcher
    fn default() -> Self {
        use crate::builtin::*;
        use crate::external::ExternalCommand;
        Self::new(vec![
            Box::new(Factory::<Pwd>::default()),
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<ExternalCommand>::default()),
        ])
    }
}
