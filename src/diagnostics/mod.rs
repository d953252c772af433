//! Phase 4.7: the diagnostic engine.
//!
//! Every stage error (lex, parse, semantic) converges here to be rendered
//! the same way: a one-line header followed by a source frame with a
//! line-number gutter and a caret under the offending column.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::error::{CodegenError, CompilerError, ParseError, SemanticError, SemanticErrorKind};
use crate::lexer::error::LexError;
use crate::span::Span;

/// The stage a diagnostic originated from, used only to pick a color when
/// rendering to a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Lex,
    Parse,
    NameResolution,
    TypeCheck,
    Validation,
    Codegen,
    Io,
}

impl Category {
    fn color(self) -> Color {
        match self {
            Category::Lex => Color::Yellow,
            Category::Parse => Color::Red,
            Category::NameResolution => Color::Magenta,
            Category::TypeCheck => Color::Cyan,
            Category::Validation => Color::Blue,
            Category::Codegen => Color::Red,
            Category::Io => Color::Red,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: Category,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(category: Category, message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            category,
            message: message.into(),
            span,
        }
    }

    /// `error: <message> [line L: col C]`, the header every diagnostic
    /// shares regardless of category.
    pub fn header(&self) -> String {
        format!(
            "error: {} [line {}: col {}]",
            self.message, self.span.start_line, self.span.start_column
        )
    }

    /// Renders the header plus a source frame. Files of five lines or
    /// fewer show every line; longer files show two lines of context
    /// before and after the error's line.
    pub fn render(&self, source_lines: &[String]) -> String {
        let mut out = String::new();
        out.push_str(&self.header());
        out.push('\n');
        out.push_str(&render_frame(source_lines, self.span));
        out
    }
}

fn render_frame(source_lines: &[String], span: Span) -> String {
    if source_lines.is_empty() {
        return String::new();
    }
    let total = source_lines.len();
    let error_line = span.start_line.max(1).min(total);
    let (first, last) = if total <= 5 {
        (1, total)
    } else {
        (error_line.saturating_sub(2).max(1), (error_line + 2).min(total))
    };
    let width = last.to_string().len();
    let mut out = String::new();
    for line_no in first..=last {
        let text = source_lines.get(line_no - 1).map(|s| s.as_str()).unwrap_or("");
        out.push_str(&format!("{:<width$} ┃ {}\n", line_no, text, width = width));
        if line_no == error_line {
            let col = span.start_column.max(1);
            out.push_str(&format!("{:<width$} ┃ {}▲\n", "", " ".repeat(col - 1), width = width));
        }
    }
    if out.ends_with('\n') {
        out.pop();
    }
    out
}

/// Renders several diagnostics, ordered by where they start in the file.
pub fn render_all(diagnostics: &[Diagnostic], source_lines: &[String]) -> String {
    let mut sorted: Vec<&Diagnostic> = diagnostics.iter().collect();
    sorted.sort_by_key(|d| (d.span.start_line, d.span.start_column));
    sorted
        .iter()
        .map(|d| d.render(source_lines))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Writes diagnostics to a terminal, colorizing the header by category
/// when the stream is a real TTY (`ColorChoice::Auto` degrades to plain
/// text otherwise, e.g. when output is piped to a file).
pub fn print_all(diagnostics: &[Diagnostic], source_lines: &[String]) -> std::io::Result<()> {
    let choice = if atty::is(atty::Stream::Stderr) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stream = StandardStream::stderr(choice);
    let mut sorted: Vec<&Diagnostic> = diagnostics.iter().collect();
    sorted.sort_by_key(|d| (d.span.start_line, d.span.start_column));
    for (i, diag) in sorted.iter().enumerate() {
        if i > 0 {
            writeln!(stream)?;
        }
        stream.set_color(ColorSpec::new().set_fg(Some(diag.category.color())).set_bold(true))?;
        writeln!(stream, "{}", diag.header())?;
        stream.reset()?;
        writeln!(stream, "{}", render_frame(source_lines, diag.span))?;
    }
    Ok(())
}

impl From<&LexError> for Diagnostic {
    fn from(err: &LexError) -> Self {
        Diagnostic::new(Category::Lex, err.message.clone(), err.span)
    }
}

impl From<&ParseError> for Diagnostic {
    fn from(err: &ParseError) -> Self {
        Diagnostic::new(Category::Parse, err.message.clone(), err.span)
    }
}

impl From<&SemanticError> for Diagnostic {
    fn from(err: &SemanticError) -> Self {
        let category = match err.kind {
            SemanticErrorKind::NameResolution => Category::NameResolution,
            SemanticErrorKind::TypeCheck => Category::TypeCheck,
            SemanticErrorKind::Validation => Category::Validation,
        };
        Diagnostic::new(category, err.message.clone(), err.span)
    }
}

impl From<&CodegenError> for Diagnostic {
    fn from(err: &CodegenError) -> Self {
        Diagnostic::new(Category::Codegen, err.message.clone(), err.span.unwrap_or_default())
    }
}

impl From<&CompilerError> for Diagnostic {
    fn from(err: &CompilerError) -> Self {
        Diagnostic::new(Category::Io, err.message.clone(), err.span.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(src: &str) -> Vec<String> {
        src.lines().map(|s| s.to_string()).collect()
    }

    #[test]
    fn short_file_shows_every_line() {
        let src = "x := §";
        let diag = Diagnostic::new(Category::Lex, "Unexpected character: '§'", Span::single_line(1, 6, 1));
        let rendered = diag.render(&lines(src));
        assert_eq!(
            rendered,
            "error: Unexpected character: '§' [line 1: col 6]\n1 ┃ x := §\n  ┃      ▲"
        );
    }

    #[test]
    fn long_file_shows_two_lines_of_context() {
        let src = (1..=10).map(|n| format!("line{n}")).collect::<Vec<_>>().join("\n");
        let diag = Diagnostic::new(Category::Parse, "oops", Span::single_line(7, 1, 1));
        let rendered = diag.render(&lines(&src));
        assert!(rendered.contains("5 ┃ line5"));
        assert!(rendered.contains("9 ┃ line9"));
        assert!(!rendered.contains("line4"));
        assert!(!rendered.contains("line10"));
    }

    #[test]
    fn header_format_matches_contract() {
        let diag = Diagnostic::new(Category::TypeCheck, "type mismatch", Span::single_line(3, 9, 1));
        assert_eq!(diag.header(), "error: type mismatch [line 3: col 9]");
    }

    #[test]
    fn render_all_orders_by_position() {
        let a = Diagnostic::new(Category::Parse, "second", Span::single_line(5, 1, 1));
        let b = Diagnostic::new(Category::Parse, "first", Span::single_line(1, 1, 1));
        let out = render_all(&[a, b], &lines("a\nb\nc\nd\ne"));
        assert!(out.find("first").unwrap() < out.find("second").unwrap());
    }
}
