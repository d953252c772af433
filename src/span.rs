//! Source span arithmetic.
//!
//! A [`Span`] is a half-open source region with 1-based line and column
//! numbers. Spans are value types: every token and every AST node carries
//! one, and the diagnostic engine consumes them for rendering.

use serde::{Deserialize, Serialize};

/// A half-open region of source text.
///
/// `start_line`/`start_column` name the first character of the span;
/// `end_line`/`end_column` name the position just past the last character.
/// `length` is the byte length of the covered lexeme and is kept alongside
/// the endpoints rather than derived, since multi-byte UTF-8 content makes
/// "end column minus start column" an unreliable stand-in for byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub length: usize,
}

impl Span {
    /// A span covering a single token on one line.
    pub fn single_line(line: usize, column: usize, length: usize) -> Self {
        Span {
            start_line: line,
            start_column: column,
            end_line: line,
            end_column: column + length,
            length,
        }
    }

    /// A zero-width span at a given position, used for synthetic nodes
    /// produced by constant folding and sugar lowering (they keep the
    /// span of the node they replace, so this constructor mostly exists
    /// for tests and error reporting about a bare position).
    pub fn point(line: usize, column: usize) -> Self {
        Span {
            start_line: line,
            start_column: column,
            end_line: line,
            end_column: column,
            length: 0,
        }
    }

    /// The smallest span covering both `self` and `other`, in source order.
    pub fn merge(self, other: Span) -> Span {
        let (start_line, start_column) = if self.start_line != other.start_line {
            if self.start_line < other.start_line {
                (self.start_line, self.start_column)
            } else {
                (other.start_line, other.start_column)
            }
        } else {
            (self.start_line, self.start_column.min(other.start_column))
        };
        let (end_line, end_column) = if self.end_line != other.end_line {
            if self.end_line > other.end_line {
                (self.end_line, self.end_column)
            } else {
                (other.end_line, other.end_column)
            }
        } else {
            (self.end_line, self.end_column.max(other.end_column))
        };
        let length = if start_line == end_line {
            end_column - start_column
        } else {
            self.length.max(other.length)
        };
        Span {
            start_line,
            start_column,
            end_line,
            end_column,
            length,
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Span::point(1, 1)
    }
}
