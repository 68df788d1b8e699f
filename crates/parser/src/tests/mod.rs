// Test module for parser
//
// This module contains unit tests for the Rill parser.
// Tests are organized by category to ensure complete AST construction coverage.

mod closure_tests;
mod error_recovery;
mod expr_tests;
mod stmt_tests;

use crate::ast::{Expr, FunctionDef, Program, Stmt, StmtKind};

/// Parse a whole program, failing the test on any diagnostic
pub(crate) fn parse_program(input: &str) -> Program {
    let parsed = crate::parse_source(input);
    assert!(
        parsed.diagnostics.is_empty(),
        "unexpected diagnostics for {:?}: {:#?}",
        input,
        parsed.diagnostics
    );
    parsed.program
}

/// Parse statements wrapped in a `main` function
pub(crate) fn parse_body(input: &str) -> Vec<Stmt> {
    let program = parse_program(&format!("function main() {{ {} }}", input));
    let FunctionDef { body, .. } = program.functions.into_iter().next().unwrap();
    body
}

/// Parse a single expression statement
pub(crate) fn parse_expr(input: &str) -> Expr {
    let mut body = parse_body(input);
    assert_eq!(body.len(), 1, "expected one statement in {:?}", input);
    match body.remove(0).kind {
        StmtKind::Expr(expr) => expr,
        other => panic!("expected expression statement, got {:?}", other),
    }
}
