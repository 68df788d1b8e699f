// Token Recognition Tests
//
// Keywords, operators and delimiters, with a focus on the operators that
// share the leading '|' character.

use crate::token::{LexError, Token};
use logos::Logos;

// Helper function to tokenize input and return all tokens
fn tokenize(input: &str) -> Vec<Result<Token, LexError>> {
    Token::lexer(input).collect()
}

// Helper function to tokenize and assert single token
fn assert_single_token(input: &str, expected: Token) {
    let mut lexer = Token::lexer(input);
    let token = lexer.next();
    assert_eq!(token, Some(Ok(expected)), "Failed to match token for input: {}", input);
    assert_eq!(lexer.next(), None, "Expected single token, found more");
}

// ==================== KEYWORD TESTS ====================

#[test]
fn test_keyword_function() {
    assert_single_token("function", Token::Function);
}

#[test]
fn test_keyword_fn() {
    assert_single_token("fn", Token::Fn);
}

#[test]
fn test_keyword_var_const() {
    assert_single_token("var", Token::Var);
    assert_single_token("const", Token::Const);
}

#[test]
fn test_keyword_control_flow() {
    assert_single_token("if", Token::If);
    assert_single_token("else", Token::Else);
    assert_single_token("while", Token::While);
    assert_single_token("return", Token::Return);
}

#[test]
fn test_keyword_prefix_is_identifier() {
    assert_single_token("functional", Token::Identifier("functional".to_string()));
    assert_single_token("fns", Token::Identifier("fns".to_string()));
    assert_single_token("iffy", Token::Identifier("iffy".to_string()));
}

#[test]
fn test_builtin_type_names_are_identifiers() {
    assert_single_token("int", Token::Identifier("int".to_string()));
    assert_single_token("string", Token::Identifier("string".to_string()));
    assert_single_token("bool", Token::Identifier("bool".to_string()));
}

// ==================== PIPE FAMILY ====================

#[test]
fn test_pipe_map_single_token() {
    assert_single_token("|>", Token::PipeMap);
}

#[test]
fn test_logical_or_single_token() {
    assert_single_token("||", Token::Or);
}

#[test]
fn test_bitwise_or_single_token() {
    assert_single_token("|", Token::Pipe);
}

#[test]
fn test_pipe_then_space_then_gt_is_two_tokens() {
    assert_eq!(tokenize("| >"), vec![Ok(Token::Pipe), Ok(Token::Gt)]);
}

#[test]
fn test_longest_match_or_before_gt() {
    // "||>" is "||" followed by ">", never "|" followed by "|>"
    assert_eq!(tokenize("||>"), vec![Ok(Token::Or), Ok(Token::Gt)]);
}

#[test]
fn test_longest_match_pipe_map_before_gt() {
    assert_eq!(tokenize("|>>"), vec![Ok(Token::PipeMap), Ok(Token::Gt)]);
}

#[test]
fn test_pipe_map_followed_by_eq() {
    assert_eq!(tokenize("|>="), vec![Ok(Token::PipeMap), Ok(Token::Eq)]);
}

#[test]
fn test_triple_pipe() {
    assert_eq!(tokenize("|||"), vec![Ok(Token::Or), Ok(Token::Pipe)]);
}

#[test]
fn test_pipe_map_without_spaces() {
    assert_eq!(
        tokenize("xs|>f"),
        vec![
            Ok(Token::Identifier("xs".to_string())),
            Ok(Token::PipeMap),
            Ok(Token::Identifier("f".to_string())),
        ]
    );
}

#[test]
fn test_chained_pipe_map() {
    let tokens = tokenize("numbers |> double |> addOne");
    assert_eq!(tokens.len(), 5);
    assert_eq!(tokens[1], Ok(Token::PipeMap));
    assert_eq!(tokens[3], Ok(Token::PipeMap));
}

// ==================== OTHER OPERATORS ====================

#[test]
fn test_arithmetic_operators() {
    assert_single_token("+", Token::Plus);
    assert_single_token("-", Token::Minus);
    assert_single_token("*", Token::Star);
    assert_single_token("**", Token::Pow);
    assert_single_token("/", Token::Slash);
    assert_single_token("%", Token::Percent);
}

#[test]
fn test_comparison_operators() {
    assert_single_token("==", Token::DoubleEq);
    assert_single_token("!=", Token::NotEq);
    assert_single_token("<", Token::Lt);
    assert_single_token(">", Token::Gt);
    assert_single_token("<=", Token::LtEq);
    assert_single_token(">=", Token::GtEq);
}

#[test]
fn test_arrow_vs_minus_gt() {
    assert_single_token("->", Token::Arrow);
    assert_eq!(tokenize("- >"), vec![Ok(Token::Minus), Ok(Token::Gt)]);
}

#[test]
fn test_walrus_vs_colon_eq() {
    assert_single_token(":=", Token::ColonEq);
    assert_eq!(tokenize(": ="), vec![Ok(Token::Colon), Ok(Token::Eq)]);
}

#[test]
fn test_and_vs_ampersand() {
    assert_single_token("&&", Token::And);
    assert_single_token("&", Token::Ampersand);
}

#[test]
fn test_delimiters() {
    assert_eq!(
        tokenize("(){}[],:;"),
        vec![
            Ok(Token::LParen),
            Ok(Token::RParen),
            Ok(Token::LBrace),
            Ok(Token::RBrace),
            Ok(Token::LBracket),
            Ok(Token::RBracket),
            Ok(Token::Comma),
            Ok(Token::Colon),
            Ok(Token::Semicolon),
        ]
    );
}

#[test]
fn test_closure_tokens() {
    assert_eq!(
        tokenize("(x -> x * 2)"),
        vec![
            Ok(Token::LParen),
            Ok(Token::Identifier("x".to_string())),
            Ok(Token::Arrow),
            Ok(Token::Identifier("x".to_string())),
            Ok(Token::Star),
            Ok(Token::Int(2)),
            Ok(Token::RParen),
        ]
    );
}

#[test]
fn test_display_uses_source_spelling() {
    assert_eq!(Token::PipeMap.to_string(), "'|>'");
    assert_eq!(Token::Identifier("xs".to_string()).to_string(), "identifier 'xs'");
}
