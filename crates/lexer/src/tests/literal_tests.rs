// Literal Tests
//
// Integers, strings (with escapes) and booleans.

use crate::lex;
use crate::token::{LexError, Token};
use logos::Logos;

// Helper function to tokenize and assert single token
fn assert_single_token(input: &str, expected: Token) {
    let mut lexer = Token::lexer(input);
    let token = lexer.next();
    assert_eq!(token, Some(Ok(expected)), "Failed to match token for input: {}", input);
    assert_eq!(lexer.next(), None, "Expected single token, found more");
}

// ==================== INTEGER TESTS ====================

#[test]
fn test_int_simple() {
    assert_single_token("42", Token::Int(42));
}

#[test]
fn test_int_zero() {
    assert_single_token("0", Token::Int(0));
}

#[test]
fn test_negative_int_is_minus_then_int() {
    let tokens: Vec<_> = Token::lexer("-5").collect();
    assert_eq!(tokens, vec![Ok(Token::Minus), Ok(Token::Int(5))]);
}

#[test]
fn test_int_overflow_is_error() {
    let tokens: Vec<_> = Token::lexer("99999999999999999999").collect();
    assert_eq!(tokens, vec![Err(LexError::IntegerOutOfRange)]);
}

#[test]
fn test_int_overflow_is_diagnosed_as_out_of_range() {
    let lexed = lex("n := 99999999999999999999");
    assert_eq!(lexed.diagnostics.len(), 1);
    assert_eq!(lexed.diagnostics[0].span, 5..25);
    let message = &lexed.diagnostics[0].message;
    assert!(message.contains("out of range"), "{}", message);
    assert!(!message.contains("unrecognized"), "{}", message);
}

#[test]
fn test_int_max_is_accepted() {
    assert_single_token("9223372036854775807", Token::Int(i64::MAX));
}

// ==================== STRING TESTS ====================

#[test]
fn test_string_simple() {
    assert_single_token(r#""hello""#, Token::Str("hello".to_string()));
}

#[test]
fn test_string_empty() {
    assert_single_token(r#""""#, Token::Str(String::new()));
}

#[test]
fn test_string_with_operator_text() {
    assert_single_token(r#""a |> b""#, Token::Str("a |> b".to_string()));
}

#[test]
fn test_string_escapes() {
    assert_single_token(r#""line\n\ttab""#, Token::Str("line\n\ttab".to_string()));
    assert_single_token(r#""say \"hi\"""#, Token::Str("say \"hi\"".to_string()));
    assert_single_token(r#""back\\slash""#, Token::Str("back\\slash".to_string()));
}

// ==================== BOOLEAN TESTS ====================

#[test]
fn test_booleans() {
    assert_single_token("true", Token::True);
    assert_single_token("false", Token::False);
}
