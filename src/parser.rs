use crate::command::{ExitCode, SUCCESS};
use crate::lexer;

/// Control operator that follows a [`Segment`] and decides whether the next
/// segment runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `;`: the next segment always runs.
    Sequence,
    /// `&&`: the next segment runs only after success.
    And,
    /// `||`: the next segment runs only after failure.
    Or,
    /// End of input, nothing follows.
    End,
}

/// Operators in matching priority order. `&&` and `||` must be tried before
/// anything shorter so a doubled character is never read as two operators.
const OPERATORS: [(&str, Operator); 3] = [
    ("&&", Operator::And),
    ("||", Operator::Or),
    (";", Operator::Sequence),
];

impl Operator {
    /// Textual form as written on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Sequence => ";",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::End => "",
        }
    }

    /// Whether the segment after this operator runs, given the status of the
    /// segment before it.
    pub fn permits(self, previous: ExitCode) -> bool {
        match self {
            Operator::Sequence => true,
            Operator::And => previous == SUCCESS,
            Operator::Or => previous != SUCCESS,
            Operator::End => false,
        }
    }
}

/// One chain unit between control operators, trimmed of surrounding whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    /// Operator written right after this segment.
    pub operator: Operator,
}

/// Split a line into segments joined by `;`, `&&` and `||`.
///
/// The result is never empty and its last element always carries
/// [`Operator::End`]. An operator at the very end of the line therefore
/// produces an empty trailing segment.
pub fn split_chain(line: &str) -> Vec<Segment<'_>> {
    let bytes = line.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        let matched = OPERATORS
            .iter()
            .find(|(token, _)| bytes[pos..].starts_with(token.as_bytes()));
        match matched {
            Some(&(token, operator)) => {
                segments.push(Segment {
                    text: line[start..pos].trim(),
                    operator,
                });
                pos += token.len();
                start = pos;
            }
            None => pos += 1,
        }
    }

    segments.push(Segment {
        text: line[start..].trim(),
        operator: Operator::End,
    });
    segments
}

/// One `&`-separated unit of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubCommand<'a> {
    pub text: &'a str,
    pub background: bool,
}

impl SubCommand<'_> {
    /// Whether this sub-command has to go through the pipeline executor.
    pub fn is_pipeline(&self) -> bool {
        self.text.contains('|')
    }
}

/// Split a segment on `&`. Every piece except the last runs in the background.
///
/// A segment ending in `&` yields an empty foreground sub-command last, so the
/// command before the `&` is the one that gets backgrounded.
pub fn split_subcommands(segment: &str) -> Vec<SubCommand<'_>> {
    let mut pieces: Vec<SubCommand<'_>> = segment
        .split('&')
        .map(|text| SubCommand {
            text: text.trim(),
            background: true,
        })
        .collect();
    if let Some(last) = pieces.last_mut() {
        last.background = false;
    }
    pieces
}

/// One `|`-separated unit of a sub-command, ready to be spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub argv: Vec<String>,
}

impl Stage {
    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }
}

/// Split a sub-command into stages. Empty stages are kept so the executor can
/// reject them.
pub fn split_stages(text: &str) -> Vec<Stage> {
    text.split('|')
        .map(|stage| Stage {
            argv: lexer::split_words(stage),
        })
        .collect()
}
