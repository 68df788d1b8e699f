// Syntax error conversion
//
// Chumsky errors become E002 diagnostics so they are rendered by the same
// ariadne reporter as every other stage.

use chumsky::error::{Simple, SimpleReason};
use diagnostics::{DiagCode, Diagnostic};
use lexer::token::Token;

/// Type alias for Chumsky parser errors
pub type ParseError = Simple<Token>;

pub fn to_diagnostic(error: ParseError) -> Diagnostic {
    let found = error
        .found()
        .map(|t| t.describe())
        .unwrap_or_else(|| "end of input".to_string());

    let message = match error.reason() {
        SimpleReason::Custom(msg) => msg.clone(),
        SimpleReason::Unclosed { delimiter, .. } => {
            format!("unclosed delimiter {}, found {}", delimiter.describe(), found)
        }
        SimpleReason::Unexpected => format!("unexpected {}", found),
    };

    let diagnostic = Diagnostic::new(DiagCode::Syntax, message, error.span());

    let diagnostic = match error.reason() {
        SimpleReason::Unclosed { span, .. } => {
            diagnostic.with_label(span.clone(), "delimiter opened here")
        }
        _ => diagnostic,
    };

    // Add expected tokens if available (limit to 5 to avoid overwhelming output)
    if error.expected().len() == 0 {
        return diagnostic;
    }

    let mut expected: Vec<String> = error.expected().map(format_expected).collect();
    expected.sort();
    expected.dedup();

    let help = if expected.len() > 5 {
        format!("Expected one of: {}, ...", expected[..5].join(", "))
    } else {
        format!("Expected: {}", expected.join(", "))
    };

    diagnostic.with_help(help)
}

/// Format expected token for human-readable output
fn format_expected(token: &Option<Token>) -> String {
    match token {
        Some(Token::Identifier(_)) => "identifier".to_string(),
        Some(Token::Int(_)) => "integer".to_string(),
        Some(Token::Str(_)) => "string".to_string(),
        Some(t) => t.describe(),
        None => "end of input".to_string(),
    }
}
