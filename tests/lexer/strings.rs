//! String and char literal recognition, including escapes and the
//! unterminated-literal error path.

use a7c::lexer::tokenize;
use a7c::token::TokenKind;
use rstest::rstest;

#[rstest]
#[case(r#""hello""#)]
#[case(r#""with \"escaped\" quotes""#)]
#[case(r#""with a \n newline escape""#)]
fn recognizes_string_literal(#[case] input: &str) {
    let tokens = tokenize(input, None).expect("tokenizes");
    assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
}

#[test]
fn unterminated_string_is_an_error() {
    let result = tokenize(r#""never closed"#, None);
    assert!(result.is_err());
}

#[test]
fn unterminated_char_is_an_error() {
    let result = tokenize("'a", None);
    assert!(result.is_err());
}

#[test]
fn char_literal_with_escape_tokenizes() {
    let tokens = tokenize(r"'\n'", None).expect("tokenizes");
    assert_eq!(tokens[0].kind, TokenKind::CharLiteral);
}
