//! Numeric literal recognition: radix prefixes, floats, scientific
//! notation, and the length limits the tokenizer enforces.

use a7c::lexer::tokenize;
use a7c::token::TokenKind;
use rstest::rstest;

#[rstest]
#[case("42", TokenKind::IntegerLiteral)]
#[case("0x2A", TokenKind::IntegerLiteral)]
#[case("0b101010", TokenKind::IntegerLiteral)]
#[case("0o52", TokenKind::IntegerLiteral)]
#[case("3.14", TokenKind::FloatLiteral)]
#[case("1e10", TokenKind::FloatLiteral)]
#[case("1.5e-3", TokenKind::FloatLiteral)]
fn recognizes_numeric_literal_forms(#[case] input: &str, #[case] expected: TokenKind) {
    let tokens = tokenize(input, None).expect("tokenizes");
    assert_eq!(tokens[0].kind, expected, "input {input:?}");
}

#[test]
fn scientific_notation_without_digits_after_e_is_rejected() {
    let result = tokenize("1e", None);
    assert!(result.is_err());
}

#[test]
fn range_operator_does_not_swallow_into_a_float() {
    let tokens = tokenize("0..10", None).expect("tokenizes");
    assert_eq!(tokens[0].kind, TokenKind::IntegerLiteral);
    assert_eq!(tokens[1].kind, TokenKind::DotDot);
    assert_eq!(tokens[2].kind, TokenKind::IntegerLiteral);
}

proptest::proptest! {
    #[test]
    fn any_nonempty_digit_run_tokenizes_as_one_integer_literal(digits in "[1-9][0-9]{0,17}") {
        let tokens = tokenize(&digits, None).expect("tokenizes");
        proptest::prop_assert_eq!(tokens[0].kind, TokenKind::IntegerLiteral);
        proptest::prop_assert_eq!(&tokens[0].lexeme, &digits);
    }
}
