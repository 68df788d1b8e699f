pub mod ast;
pub mod closure_analysis;
pub mod error;
pub mod operators;
pub mod parser;

pub use parser::{Parsed, parse};

/// Lex and parse a source string, merging lexical and syntax diagnostics
pub fn parse_source(source: &str) -> Parsed {
    let lexed = lexer::lex(source);
    let mut parsed = parse(lexed.tokens, source.len());
    let mut diagnostics = lexed.diagnostics;
    diagnostics.append(&mut parsed.diagnostics);
    parsed.diagnostics = diagnostics;
    parsed
}

#[cfg(test)]
mod tests;
