//! Phase 1: tokenizer.
//!
//! Converts A7 source text into a flat stream of [`Token`]s. The tokenizer
//! halts at the first disallowed construct (`tokenize` returns `Err`); it
//! does not attempt error recovery the way the parser does, since a lexical
//! error almost always invalidates everything after it.

pub mod error;

pub use error::{LexError, LexErrorKind};

use crate::token::{lookup_keyword, Token, TokenKind};
use crate::span::Span;

const MAX_IDENTIFIER_LENGTH: usize = 100;
const MAX_NUMBER_LENGTH: usize = 100;
const MAX_STRING_LENGTH: usize = (1 << 15) - 1;

/// Tokenize `source`, returning the token stream (always `EOF`-terminated)
/// or the first lexical error encountered.
pub fn tokenize(source: &str, filename: Option<&str>) -> Result<Vec<Token>, LexError> {
    let _ = filename;
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.position + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn error(&self, kind: LexErrorKind, line: usize, column: usize, length: usize) -> LexError {
        let message = match kind {
            LexErrorKind::InvalidCharacter => format!(
                "Unexpected character: '{}'",
                self.chars.get(self.position).copied().unwrap_or(' ')
            ),
            LexErrorKind::TabsUnsupported => "Tabs '\\t' are unsupported".to_string(),
            LexErrorKind::NotClosedString => "Unterminated string literal".to_string(),
            LexErrorKind::NotClosedChar => "Unterminated or invalid char literal".to_string(),
            LexErrorKind::InvalidScientificNotation => {
                "Invalid scientific notation: expected digits after exponent".to_string()
            }
            LexErrorKind::TooLongIdentifier => {
                format!("Identifier exceeds maximum length of {MAX_IDENTIFIER_LENGTH}")
            }
            LexErrorKind::TooLongNumber => {
                format!("Number literal exceeds maximum length of {MAX_NUMBER_LENGTH}")
            }
            LexErrorKind::TooLongString => {
                format!("String literal exceeds maximum length of {MAX_STRING_LENGTH}")
            }
        };
        LexError::new(kind, Span::single_line(line, column, length), message)
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        while self.position < self.chars.len() {
            self.skip_whitespace()?;
            let Some(ch) = self.current() else { break };

            if ch == '\n' {
                self.add_terminator();
                self.advance();
                continue;
            }

            if self.try_comment() {
                continue;
            }

            if ch.is_ascii_digit() {
                self.tokenize_number()?;
                continue;
            }

            if ch == '"' {
                self.tokenize_string()?;
                continue;
            }

            if ch == '\'' {
                self.tokenize_char()?;
                continue;
            }

            if ch.is_ascii_alphabetic() || ch == '_' {
                self.tokenize_identifier()?;
                continue;
            }

            if ch == '@' {
                self.tokenize_builtin();
                continue;
            }

            if ch == '$' && self.try_generic_type() {
                continue;
            }

            if self.try_operator() {
                continue;
            }

            return Err(self.error(LexErrorKind::InvalidCharacter, self.line, self.column, 1));
        }

        self.add_token(TokenKind::Eof, "");
        Ok(self.tokens)
    }

    fn skip_whitespace(&mut self) -> Result<(), LexError> {
        loop {
            match self.current() {
                Some(' ') | Some('\r') => {
                    self.advance();
                }
                Some('\t') => {
                    return Err(self.error(LexErrorKind::TabsUnsupported, self.line, self.column, 1));
                }
                _ => return Ok(()),
            }
        }
    }

    fn add_token(&mut self, kind: TokenKind, lexeme: impl Into<String>) {
        self.tokens.push(Token::new(kind, lexeme, self.line, self.column));
    }

    /// Adds a token whose lexeme starts `length` characters back from the
    /// current position (used once a multi-char lexeme has been scanned).
    fn add_token_back(&mut self, kind: TokenKind, lexeme: impl Into<String>, length: usize) {
        let lexeme = lexeme.into();
        let column = self.column - length;
        self.tokens.push(Token::new(kind, lexeme, self.line, column));
    }

    fn add_terminator(&mut self) {
        if matches!(self.tokens.last(), Some(t) if t.kind == TokenKind::Terminator) {
            return;
        }
        self.tokens.push(Token::new(TokenKind::Terminator, "\n", self.line, self.column));
    }

    fn try_comment(&mut self) -> bool {
        if self.current() == Some('/') && self.peek(1) == Some('/') {
            while self.current().is_some() && self.current() != Some('\n') {
                self.advance();
            }
            if self.current() == Some('\n') {
                self.advance();
            }
            return true;
        }
        if self.current() == Some('#') {
            while self.current().is_some() && self.current() != Some('\n') {
                self.advance();
            }
            if self.current() == Some('\n') {
                self.advance();
            }
            return true;
        }
        if self.current() == Some('/') && self.peek(1) == Some('*') {
            self.advance();
            self.advance();
            let mut depth = 1;
            while self.current().is_some() && depth > 0 {
                if self.current() == Some('/') && self.peek(1) == Some('*') {
                    self.advance();
                    self.advance();
                    depth += 1;
                } else if self.current() == Some('*') && self.peek(1) == Some('/') {
                    self.advance();
                    self.advance();
                    depth -= 1;
                } else {
                    self.advance();
                }
            }
            // An unterminated block comment is accepted and consumes to EOF.
            return true;
        }
        false
    }

    fn tokenize_number(&mut self) -> Result<(), LexError> {
        let start_line = self.line;
        let start_column = self.column;
        let mut text = String::new();
        let mut is_float = false;

        let radix_prefix = if self.current() == Some('0') {
            match self.peek(1) {
                Some('b') => Some(('b', 2)),
                Some('x') => Some(('x', 16)),
                Some('o') => Some(('o', 8)),
                _ => None,
            }
        } else {
            None
        };

        if let Some((marker, radix)) = radix_prefix {
            text.push(self.advance().unwrap()); // '0'
            text.push(self.advance().unwrap()); // marker
            let _ = marker;
            while let Some(c) = self.current() {
                if c.is_digit(radix) {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            self.check_number_length(&text, start_line, start_column)?;
            self.add_token_back(TokenKind::IntegerLiteral, text.clone(), text.chars().count());
            return Ok(());
        }

        while let Some(c) = self.current() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if self.current() == Some('.') && self.peek(1) != Some('.') {
            is_float = true;
            text.push(self.advance().unwrap());
            while let Some(c) = self.current() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        if matches!(self.current(), Some('e') | Some('E')) {
            is_float = true;
            text.push(self.advance().unwrap());
            if matches!(self.current(), Some('+') | Some('-')) {
                text.push(self.advance().unwrap());
            }
            if !matches!(self.current(), Some(c) if c.is_ascii_digit()) {
                return Err(self.error(
                    LexErrorKind::InvalidScientificNotation,
                    self.line,
                    self.column,
                    1,
                ));
            }
            while let Some(c) = self.current() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        self.check_number_length(&text, start_line, start_column)?;
        let kind = if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntegerLiteral
        };
        let length = text.chars().count();
        self.add_token_back(kind, text, length);
        Ok(())
    }

    fn check_number_length(&self, text: &str, line: usize, column: usize) -> Result<(), LexError> {
        if text.chars().count() > MAX_NUMBER_LENGTH {
            return Err(self.error(LexErrorKind::TooLongNumber, line, column, text.chars().count()));
        }
        Ok(())
    }

    fn tokenize_string(&mut self) -> Result<(), LexError> {
        let start_line = self.line;
        let start_column = self.column;
        let mut text = String::new();
        text.push(self.advance().unwrap()); // opening quote

        loop {
            match self.current() {
                None => {
                    let length = text.chars().count();
                    return Err(self.error(LexErrorKind::NotClosedString, start_line, start_column, length));
                }
                Some('"') => break,
                Some('\\') => {
                    text.push(self.advance().unwrap());
                    if let Some(escaped) = self.current() {
                        text.push(escaped);
                        self.advance();
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
        text.push(self.advance().unwrap()); // closing quote

        if text.chars().count() > MAX_STRING_LENGTH {
            return Err(self.error(LexErrorKind::TooLongString, start_line, start_column, text.chars().count()));
        }

        let length = text.chars().count();
        self.add_token_back(TokenKind::StringLiteral, text, length);
        Ok(())
    }

    fn tokenize_char(&mut self) -> Result<(), LexError> {
        let start_line = self.line;
        let start_column = self.column;
        let mut text = String::new();
        text.push(self.advance().unwrap()); // opening quote

        match self.current() {
            None | Some('\'') => {
                return Err(self.error(LexErrorKind::NotClosedChar, self.line, self.column, 1));
            }
            Some('\\') => {
                text.push(self.advance().unwrap());
                match self.current() {
                    None => return Err(self.error(LexErrorKind::NotClosedChar, self.line, self.column, 1)),
                    Some('x') => {
                        text.push(self.advance().unwrap());
                        for _ in 0..2 {
                            match self.current() {
                                Some(c) if c.is_ascii_hexdigit() => {
                                    text.push(c);
                                    self.advance();
                                }
                                _ => {
                                    return Err(self.error(
                                        LexErrorKind::NotClosedChar,
                                        self.line,
                                        self.column,
                                        1,
                                    ))
                                }
                            }
                        }
                    }
                    Some(c) if "ntr\\'\"0".contains(c) => {
                        text.push(c);
                        self.advance();
                    }
                    Some(_) => {
                        return Err(self.error(LexErrorKind::NotClosedChar, self.line, self.column, 1));
                    }
                }
            }
            Some(c) => {
                text.push(c);
                self.advance();
                if !matches!(self.current(), Some('\'')) {
                    return Err(self.error(LexErrorKind::NotClosedChar, self.line, self.column, 1));
                }
            }
        }

        if self.current() != Some('\'') {
            return Err(self.error(LexErrorKind::NotClosedChar, self.line, self.column, 1));
        }
        text.push(self.advance().unwrap()); // closing quote

        let length = text.chars().count();
        self.add_token_back(TokenKind::CharLiteral, text, length);
        Ok(())
    }

    fn tokenize_identifier(&mut self) -> Result<(), LexError> {
        let start_line = self.line;
        let start_column = self.column;
        let mut text = String::new();
        while let Some(c) = self.current() {
            if c.is_ascii_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if text.chars().count() > MAX_IDENTIFIER_LENGTH {
            return Err(self.error(
                LexErrorKind::TooLongIdentifier,
                start_line,
                start_column,
                text.chars().count(),
            ));
        }

        let kind = lookup_keyword(&text).unwrap_or(TokenKind::Identifier);
        let length = text.chars().count();
        self.add_token_back(kind, text, length);
        Ok(())
    }

    fn tokenize_builtin(&mut self) {
        let mut text = String::new();
        text.push(self.advance().unwrap()); // '@'
        while let Some(c) = self.current() {
            if c.is_ascii_alphabetic() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let length = text.chars().count();
        self.add_token_back(TokenKind::BuiltinId, text, length);
    }

    /// Classifies a `$name` lexeme into one of generic-parameter
    /// (`$T`, `$MY_TYPE`), concrete-type-argument (`$i32`, `$string`), or
    /// custom-type (`$MyType`) forms; all three emit `GenericType`. Restores
    /// position and returns `false` if the text after `$` doesn't fit any
    /// of the three shapes, so the caller falls through to operator lexing.
    fn try_generic_type(&mut self) -> bool {
        let saved = (self.position, self.line, self.column);
        self.advance(); // '$'

        if !matches!(self.current(), Some(c) if c.is_alphabetic()) {
            (self.position, self.line, self.column) = saved;
            return false;
        }

        let mut type_name = String::from("$");
        while let Some(c) = self.current() {
            if c.is_alphanumeric() || c == '_' {
                type_name.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if type_name.len() > 1 && !type_name.ends_with('_') {
            let type_part = &type_name[1..];
            let first = type_part.chars().next().unwrap();

            let is_generic_param =
                type_part.chars().all(|c| c.is_uppercase() || c == '_') && first.is_uppercase();
            let is_concrete_type = first.is_lowercase()
                && type_part.chars().all(|c| c.is_alphanumeric() || c == '_');
            let is_custom_type = first.is_uppercase() && !is_generic_param;

            if is_generic_param || is_concrete_type || is_custom_type {
                let length = type_name.chars().count();
                self.add_token_back(TokenKind::GenericType, type_name, length);
                return true;
            }
        }

        (self.position, self.line, self.column) = saved;
        false
    }

    fn try_operator(&mut self) -> bool {
        let c0 = self.current();
        let c1 = self.peek(1);
        let c2 = self.peek(2);

        macro_rules! emit {
            ($n:expr, $kind:expr) => {{
                let text: String = self.chars[self.position..self.position + $n].iter().collect();
                for _ in 0..$n {
                    self.advance();
                }
                self.add_token_back($kind, text, $n);
                return true;
            }};
        }

        match (c0, c1, c2) {
            (Some('<'), Some('<'), Some('=')) => emit!(3, TokenKind::LeftShiftAssign),
            (Some('>'), Some('>'), Some('=')) => emit!(3, TokenKind::RightShiftAssign),
            _ => {}
        }

        match (c0, c1) {
            (Some(':'), Some(':')) => emit!(2, TokenKind::DeclareConst),
            (Some(':'), Some('=')) => emit!(2, TokenKind::DeclareVar),
            (Some('='), Some('=')) => emit!(2, TokenKind::Equal),
            (Some('!'), Some('=')) => emit!(2, TokenKind::NotEqual),
            (Some('<'), Some('=')) => emit!(2, TokenKind::LessEqual),
            (Some('>'), Some('=')) => emit!(2, TokenKind::GreaterEqual),
            (Some('<'), Some('<')) => emit!(2, TokenKind::LeftShift),
            (Some('>'), Some('>')) => emit!(2, TokenKind::RightShift),
            (Some('+'), Some('=')) => emit!(2, TokenKind::PlusAssign),
            (Some('-'), Some('=')) => emit!(2, TokenKind::MinusAssign),
            (Some('*'), Some('=')) => emit!(2, TokenKind::StarAssign),
            (Some('/'), Some('=')) => emit!(2, TokenKind::SlashAssign),
            (Some('%'), Some('=')) => emit!(2, TokenKind::PercentAssign),
            (Some('&'), Some('=')) => emit!(2, TokenKind::AmpersandAssign),
            (Some('|'), Some('=')) => emit!(2, TokenKind::PipeAssign),
            (Some('^'), Some('=')) => emit!(2, TokenKind::CaretAssign),
            (Some('.'), Some('.')) => emit!(2, TokenKind::DotDot),
            _ => {}
        }

        let Some(c) = c0 else { return false };
        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => TokenKind::Assign,
            '<' => TokenKind::Less,
            '>' => TokenKind::Greater,
            '&' => TokenKind::Ampersand,
            '|' => TokenKind::Pipe,
            '^' => TokenKind::Caret,
            '~' => TokenKind::Tilde,
            '!' => TokenKind::Bang,
            ';' => TokenKind::Terminator,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            _ => return false,
        };

        if kind == TokenKind::Terminator {
            self.add_terminator();
            self.advance();
            return true;
        }

        self.add_token(kind, c.to_string());
        self.advance();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_program_tokenizes() {
        let tokens = tokenize("main :: fn() {}", None).unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::DeclareConst,
                TokenKind::Fn,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tabs_are_rejected() {
        let err = tokenize("x\t:= 1", None).unwrap_err();
        assert_eq!(err.kind, LexErrorKind::TabsUnsupported);
    }

    #[test]
    fn unexpected_character_reports_span() {
        let err = tokenize("x := \u{a7}", None).unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidCharacter);
        assert_eq!(err.span.start_line, 1);
        assert_eq!(err.span.start_column, 6);
        assert!(err.message.contains('\u{a7}'));
    }

    #[test]
    fn terminators_deduplicate() {
        let tokens = tokenize("x := 1\n\n\ny := 2", None).unwrap();
        let terminator_runs = tokens
            .windows(2)
            .filter(|w| w[0].kind == TokenKind::Terminator && w[1].kind == TokenKind::Terminator)
            .count();
        assert_eq!(terminator_runs, 0);
    }

    #[test]
    fn scientific_notation_requires_digits() {
        assert!(tokenize("1e5", None).is_ok());
        assert!(tokenize("1E-5", None).is_ok());
        assert!(tokenize("1.0e+5", None).is_ok());
        let err = tokenize("1e", None).unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidScientificNotation);
    }

    #[test]
    fn identifier_length_boundary() {
        let ok = "a".repeat(100);
        assert!(tokenize(&ok, None).is_ok());
        let too_long = "a".repeat(101);
        let err = tokenize(&too_long, None).unwrap_err();
        assert_eq!(err.kind, LexErrorKind::TooLongIdentifier);
    }

    #[test]
    fn generic_type_classification() {
        let tokens = tokenize("$T $MY_TYPE $i32 $MyType", None).unwrap();
        let generics: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::GenericType)
            .map(|t| t.lexeme.as_str())
            .collect();
        assert_eq!(generics, vec!["$T", "$MY_TYPE", "$i32", "$MyType"]);
    }

    #[test]
    fn range_operator_not_confused_with_float() {
        let tokens = tokenize("0..10", None).unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::IntegerLiteral,
                TokenKind::DotDot,
                TokenKind::IntegerLiteral,
                TokenKind::Eof
            ]
        );
    }
}
