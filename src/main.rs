use chainsh::Interpreter;
use chainsh::config::Config;
use chainsh::repl::{self, Editor, LineSource, Plain};
use chainsh::{command, logging};
use log::{debug, error};
use std::io::{self, IsTerminal};
use std::ops::ControlFlow;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = Config::from_env();
    logging::init(config.log_level);
    debug!("{config:?}");

    let mut interp = Interpreter::default();
    let status = match &config.command {
        Some(line) => match repl::evaluate(&mut interp, line) {
            ControlFlow::Continue(status) => status.unwrap_or(command::SUCCESS),
            ControlFlow::Break(()) => command::SUCCESS,
        },
        None => match interactive(&mut interp, &config) {
            Ok(status) => status,
            Err(e) => {
                error!("{e:#}");
                command::FAILURE
            }
        },
    };
    ExitCode::from((status & 0xff) as u8)
}

fn interactive(interp: &mut Interpreter, config: &Config) -> anyhow::Result<command::ExitCode> {
    let mut source: Box<dyn LineSource> = if io::stdin().is_terminal() {
        Box::new(Editor::new()?)
    } else {
        Box::new(Plain::new(io::stdin().lock(), io::stdout()))
    };
    repl::run(interp, source.as_mut(), &config.prompt_tag)
}
