pub mod token;

use diagnostics::{DiagCode, Diagnostic, Span};
use logos::{Logos, SpannedIter};
use token::{LexError, Token};

#[cfg(test)]
mod tests;

/// A token together with its byte range; the lexeme is `&source[span]`
pub type Spanned = (Token, Span);

/// Pull-based token stream that records lexical diagnostics as it goes
pub struct TokenStream<'src> {
    source: &'src str,
    inner: SpannedIter<'src, Token>,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> TokenStream<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            inner: Token::lexer(source).spanned(),
            diagnostics: Vec::new(),
        }
    }

    /// Next valid token
    ///
    /// An unrecognized character sequence is recorded as an E001 diagnostic
    /// and skipped; lexing resumes right after it.
    pub fn next_token(&mut self) -> Option<Spanned> {
        loop {
            let (result, span) = self.inner.next()?;
            match result {
                Ok(token) => return Some((token, span)),
                Err(err) => {
                    let text = &self.source[span.clone()];
                    let diagnostic = match err {
                        LexError::Unrecognized => Diagnostic::new(
                            DiagCode::Lexical,
                            format!("unrecognized character sequence '{}'", text.escape_debug()),
                            span,
                        )
                        .with_help("this character is not part of any Rill token"),
                        LexError::IntegerOutOfRange => Diagnostic::new(
                            DiagCode::Lexical,
                            format!("integer literal '{}' is out of range", text),
                            span,
                        )
                        .with_help("integers are 64-bit signed, at most 9223372036854775807"),
                    };
                    self.diagnostics.push(diagnostic);
                }
            }
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl Iterator for TokenStream<'_> {
    type Item = Spanned;

    fn next(&mut self) -> Option<Spanned> {
        self.next_token()
    }
}

/// Tokens and lexical diagnostics of a whole source string
#[derive(Debug, Clone, PartialEq)]
pub struct Lexed {
    pub tokens: Vec<Spanned>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Tokenize a source string, keeping spans and diagnostics
pub fn lex(source: &str) -> Lexed {
    let mut stream = TokenStream::new(source);
    let tokens = stream.by_ref().collect();
    Lexed {
        tokens,
        diagnostics: stream.into_diagnostics(),
    }
}

/// Tokenize a source string and return a Vec of tokens
pub fn lex_tokens(source: &str) -> Vec<Token> {
    Token::lexer(source).filter_map(|t| t.ok()).collect()
}
