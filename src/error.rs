//! Stage error types and the top-level `CompilerError` that wraps them.
//!
//! One manual enum per pipeline stage, each with a hand-written `Display`
//! rather than a derive macro — the diagnostic engine renders these
//! directly and needs full control over the message text it produces.

use std::fmt;

use crate::span::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub span: Span,
    pub message: String,
}

impl ParseError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        ParseError {
            span,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticErrorKind {
    NameResolution,
    TypeCheck,
    Validation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub span: Span,
    pub message: String,
}

impl SemanticError {
    pub fn new(kind: SemanticErrorKind, span: Span, message: impl Into<String>) -> Self {
        SemanticError {
            kind,
            span,
            message: message.into(),
        }
    }
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SemanticError {}

/// Declared for the emitter's interface; the core never constructs one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenError {
    pub span: Option<Span>,
    pub message: String,
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CodegenError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerError {
    pub span: Option<Span>,
    pub message: String,
}

impl CompilerError {
    pub fn new(message: impl Into<String>) -> Self {
        CompilerError {
            span: None,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        CompilerError::new(message)
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CompilerError {}

impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::io(err.to_string())
    }
}
