//! The read loop around the interpreter.

use crate::command::{ExitCode, SUCCESS};
use crate::interpreter::Interpreter;
use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{BufRead, Write};
use std::ops::ControlFlow;

/// Where input lines come from.
pub trait LineSource {
    /// Show `prompt` and read one line without its trailing newline.
    ///
    /// `Ok(None)` means end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Interactive terminal input through `rustyline`. Nothing is added to history.
pub struct Editor {
    rl: DefaultEditor,
}

impl Editor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            rl: DefaultEditor::new()?,
        })
    }
}

impl LineSource for Editor {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.rl.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            // Ctrl-C drops the current line and prompts again.
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// Plain buffered input for pipes and files. The prompt still goes to `output`.
pub struct Plain<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Plain<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> LineSource for Plain<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.output.write_all(prompt.as_bytes())?;
        self.output.flush()?;

        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        if buf.ends_with(b"\n") {
            buf.pop();
            if buf.ends_with(b"\r") {
                buf.pop();
            }
        }
        // Invalid UTF-8 is replaced rather than ending the loop.
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}

/// `[<tag>:<cwd>]$ `, with `?` when the working directory can't be resolved.
pub fn prompt(interp: &Interpreter, tag: &str) -> String {
    let cwd = interp
        .env()
        .working_dir
        .current()
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|_| "?".to_owned());
    format!("[{tag}:{cwd}]$ ")
}

/// Handle one raw input line.
///
/// Blank lines are ignored (`Continue(None)`), `exit` breaks the loop, anything
/// else is evaluated and its status returned.
pub fn evaluate(interp: &mut Interpreter, raw: &str) -> ControlFlow<(), Option<ExitCode>> {
    match raw.trim() {
        "" => ControlFlow::Continue(None),
        "exit" => ControlFlow::Break(()),
        line => ControlFlow::Continue(Some(interp.eval_line(line))),
    }
}

/// Prompt, read and evaluate until `exit` or end of input.
///
/// Returns the status of the last evaluated line, [`SUCCESS`] if there was none.
pub fn run(interp: &mut Interpreter, source: &mut dyn LineSource, tag: &str) -> Result<ExitCode> {
    let mut last = SUCCESS;
    loop {
        interp.env_mut().jobs.reap();
        let Some(line) = source.read_line(&prompt(interp, tag))? else {
            break;
        };
        match evaluate(interp, &line) {
            ControlFlow::Break(()) => break,
            ControlFlow::Continue(Some(status)) => last = status,
            ControlFlow::Continue(None) => {}
        }
    }
    Ok(last)
}
