//! Whitespace, terminators, tabs, and identifier-length boundary behavior.

use a7c::lexer::tokenize;
use a7c::lexer::error::LexErrorKind;
use a7c::token::TokenKind;

#[test]
fn tabs_are_rejected() {
    let err = tokenize("x := 1\n\t", None).unwrap_err();
    assert_eq!(err.kind, LexErrorKind::TabsUnsupported);
}

#[test]
fn blank_lines_collapse_into_a_single_terminator() {
    let tokens = tokenize("x := 1\n\n\ny := 2\n", None).expect("tokenizes");
    let terminator_runs = tokens
        .windows(2)
        .filter(|pair| pair[0].kind == TokenKind::Terminator && pair[1].kind == TokenKind::Terminator)
        .count();
    assert_eq!(terminator_runs, 0, "consecutive terminators should have been deduplicated");
}

#[test]
fn identifier_at_the_length_limit_is_accepted() {
    let name = "a".repeat(100);
    let tokens = tokenize(&name, None).expect("tokenizes");
    assert_eq!(tokens[0].kind, TokenKind::Identifier);
}

#[test]
fn identifier_over_the_length_limit_is_rejected() {
    let name = "a".repeat(101);
    let err = tokenize(&name, None).unwrap_err();
    assert_eq!(err.kind, LexErrorKind::TooLongIdentifier);
}

#[test]
fn line_comments_are_skipped() {
    let tokens = tokenize("// a comment\nx := 1", None).expect("tokenizes");
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Identifier && t.lexeme == "x"));
}

#[test]
fn nested_block_comments_close_in_pairs() {
    let tokens = tokenize("/* outer /* inner */ still outer */ x := 1", None).expect("tokenizes");
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Identifier && t.lexeme == "x"));
}
