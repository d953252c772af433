//! Lexer error kinds.

use std::fmt;

use crate::span::Span;

/// The reason a [`LexError`](super::LexError) was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    InvalidCharacter,
    TabsUnsupported,
    NotClosedString,
    NotClosedChar,
    InvalidScientificNotation,
    TooLongIdentifier,
    TooLongNumber,
    TooLongString,
}

impl LexErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LexErrorKind::InvalidCharacter => "INVALID_CHARACTER",
            LexErrorKind::TabsUnsupported => "TABS_UNSUPPORTED",
            LexErrorKind::NotClosedString => "NOT_CLOSED_STRING",
            LexErrorKind::NotClosedChar => "NOT_CLOSED_CHAR",
            LexErrorKind::InvalidScientificNotation => "INVALID_SCIENTIFIC_NOTATION",
            LexErrorKind::TooLongIdentifier => "TOO_LONG_IDENTIFIER",
            LexErrorKind::TooLongNumber => "TOO_LONG_NUMBER",
            LexErrorKind::TooLongString => "TOO_LONG_STRING",
        }
    }
}

/// A lexical error: the first disallowed construct the tokenizer found.
///
/// Tokenization halts at the first `LexError`; the tokenizer never
/// accumulates more than one of these (unlike the semantic passes, which
/// collect every diagnostic before failing the stage).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
    pub message: String,
}

impl LexError {
    pub fn new(kind: LexErrorKind, span: Span, message: impl Into<String>) -> Self {
        LexError {
            kind,
            span,
            message: message.into(),
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for LexError {}
