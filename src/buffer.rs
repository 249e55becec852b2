//! The program buffer: the text of a `///` program that has not been consumed yet.
//!
//! A `///` program is both code and data. Execution eats characters from the
//! front and substitutions rewrite whatever is left, so the buffer supports
//! exactly two mutations: removal from the front and in-place replacement of
//! the leftmost occurrence of a pattern.
//!
//! Consumed characters are tracked with a byte cursor instead of being shifted
//! out immediately; the dead prefix is dropped once it dominates the
//! allocation.

use std::fmt;

/// Dead prefix size (in bytes) below which the buffer never compacts.
const COMPACT_THRESHOLD: usize = 4096;

// ============================================================================
// PROGRAM BUFFER
// ============================================================================

/// Mutable, exclusively owned remainder of a running program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramBuffer {
    text: String,
    head: usize,
}

impl ProgramBuffer {
    /// Create a buffer holding the full program text.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            text: program.into(),
            head: 0,
        }
    }

    /// The unconsumed program text.
    pub fn as_str(&self) -> &str {
        &self.text[self.head..]
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.text.len()
    }

    /// Number of characters left, not bytes.
    pub fn char_len(&self) -> usize {
        self.as_str().chars().count()
    }

    /// Look at the front character without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.as_str().chars().next()
    }

    /// Remove and return the front character.
    pub fn pop_front(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.head += c.len_utf8();
        self.compact();
        Some(c)
    }

    /// Replace the leftmost occurrence of `pattern` with `replacement`.
    ///
    /// Returns `false` and leaves the buffer untouched when there is no
    /// occurrence. The empty pattern occurs at the front of every buffer,
    /// so it always matches.
    pub fn replace_first(&mut self, pattern: &str, replacement: &str) -> bool {
        match self.as_str().find(pattern) {
            Some(offset) => {
                let start = self.head + offset;
                self.text
                    .replace_range(start..start + pattern.len(), replacement);
                true
            }
            None => false,
        }
    }

    fn compact(&mut self) {
        if self.head >= COMPACT_THRESHOLD && self.head * 2 >= self.text.len() {
            self.text.drain(..self.head);
            self.head = 0;
        }
    }
}

impl fmt::Display for ProgramBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_characters_in_order() {
        let mut buffer = ProgramBuffer::new("aé/");
        assert_eq!(buffer.pop_front(), Some('a'));
        assert_eq!(buffer.pop_front(), Some('é'));
        assert_eq!(buffer.as_str(), "/");
        assert_eq!(buffer.pop_front(), Some('/'));
        assert!(buffer.is_empty());
        assert_eq!(buffer.pop_front(), None);
    }

    #[test]
    fn replaces_only_the_leftmost_occurrence() {
        let mut buffer = ProgramBuffer::new("xabab");
        buffer.pop_front();
        assert!(buffer.replace_first("ab", "c"));
        assert_eq!(buffer.as_str(), "cab");
        assert!(!buffer.replace_first("zz", "c"));
        assert_eq!(buffer.as_str(), "cab");
    }

    #[test]
    fn consumed_prefix_is_never_searched() {
        let mut buffer = ProgramBuffer::new("ab");
        buffer.pop_front();
        assert!(!buffer.replace_first("a", "z"));
        assert_eq!(buffer.as_str(), "b");
    }

    #[test]
    fn empty_pattern_matches_at_the_front() {
        let mut buffer = ProgramBuffer::new("rest");
        assert!(buffer.replace_first("", ">"));
        assert_eq!(buffer.as_str(), ">rest");
    }

    #[test]
    fn compaction_preserves_remaining_text() {
        let program = "a".repeat(COMPACT_THRESHOLD * 2) + "tail";
        let mut buffer = ProgramBuffer::new(program);
        for _ in 0..COMPACT_THRESHOLD * 2 {
            buffer.pop_front();
        }
        assert_eq!(buffer.as_str(), "tail");
        assert_eq!(buffer.char_len(), 4);
    }
}
