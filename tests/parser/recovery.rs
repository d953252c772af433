//! Error-recovery behavior: a bad declaration shouldn't stop parsing of
//! the declarations around it from being reported sensibly.

use a7c::lexer::tokenize;
use a7c::parser::parse;

#[test]
fn missing_function_body_is_a_parse_error_with_a_span() {
    let tokens = tokenize("broken :: fn()", None).expect("tokenizes");
    let err = parse(tokens, None, &[]).unwrap_err();
    assert!(err.span.start_line >= 1);
}

#[test]
fn unexpected_trailing_token_after_a_complete_program_is_reported() {
    let tokens = tokenize("main :: fn() {} )", None).expect("tokenizes");
    let err = parse(tokens, None, &[]).unwrap_err();
    assert!(err.message.contains("Unexpected token"));
}

#[test]
fn identifier_followed_by_a_literal_with_no_operator_is_rejected() {
    let tokens = tokenize("main :: fn() { x 5 }", None).expect("tokenizes");
    let err = parse(tokens, None, &[]).unwrap_err();
    assert!(err.message.contains("assignment operator") || err.message.contains("cannot be used as a statement"));
}
