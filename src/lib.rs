//! A line-oriented command interpreter.
//!
//! A line is split into segments joined by `;`, `&&` and `||`, each segment
//! into `&`-separated sub-commands (all but the last run in the background),
//! and each sub-command into `|`-separated pipeline stages. Segments are
//! evaluated left to right with shell short-circuit rules.
//!
//! The main entry point is [`Interpreter`]. The read loop in [`repl`] and the
//! [`config`] and [`logging`] modules are what the `chainsh` binary is built from.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
mod external;
mod interpreter;
pub mod io_adapters;
pub mod jobs;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod repl;

/// Just a convenient re-export of the command-chain interpreter.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
