//! Word splitting for a single pipeline stage.
//!
//! There is no quoting, escaping or expansion: a word is a maximal run of
//! non-whitespace characters. Consecutive separators never produce empty words.

/// Split `stage` into the argument vector handed to a command.
///
/// The input is only borrowed; owned strings are created per word.
pub fn split_words(stage: &str) -> Vec<String> {
    stage.split_whitespace().map(str::to_owned).collect()
}
