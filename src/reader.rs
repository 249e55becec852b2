//! Escape-aware token reader used for patterns and replacements.

use crate::buffer::ProgramBuffer;

/// `\` makes the next character literal, wherever it appears.
pub const ESCAPE: char = '\\';

/// `/` starts a directive and terminates patterns and replacements.
pub const DELIMITER: char = '/';

/// Outcome of reading one delimited token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Read {
    /// The terminator was found and consumed.
    Token(String),
    /// The buffer ran out before the terminator.
    Unterminated,
    /// The buffer ended on a lone escape character.
    DanglingEscape,
}

/// Consume characters up to and including an unescaped `terminator`.
///
/// Every character examined is removed from `buffer`, whether or not the read
/// succeeds. On failure the partial token is discarded.
pub fn read_until(buffer: &mut ProgramBuffer, terminator: char) -> Read {
    let mut token = String::new();
    while let Some(c) = buffer.pop_front() {
        if c == ESCAPE {
            match buffer.pop_front() {
                Some(literal) => token.push(literal),
                None => return Read::DanglingEscape,
            }
        } else if c == terminator {
            return Read::Token(token);
        } else {
            token.push(c);
        }
    }
    Read::Unterminated
}
