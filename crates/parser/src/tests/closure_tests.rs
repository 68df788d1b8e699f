// Closure Capture Analysis Tests

use super::parse_program;
use crate::ast::{Closure, ClosureBody, Expr, ExprKind, Stmt, StmtKind};

/// Collect closures in source order, outermost first
fn closures(input: &str) -> Vec<Closure> {
    fn walk_expr(expr: &Expr, out: &mut Vec<Closure>) {
        match &expr.kind {
            ExprKind::Closure(c) => {
                out.push(c.clone());
                match &c.body {
                    ClosureBody::Expr(body) => walk_expr(body, out),
                    ClosureBody::Block(stmts) => walk_stmts(stmts, out),
                }
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                walk_expr(lhs, out);
                walk_expr(rhs, out);
            }
            ExprKind::Call { func, args } => {
                walk_expr(func, out);
                args.iter().for_each(|a| walk_expr(a, out));
            }
            _ => {}
        }
    }

    fn walk_stmts(stmts: &[Stmt], out: &mut Vec<Closure>) {
        for stmt in stmts {
            match &stmt.kind {
                StmtKind::VariableDecl { value, .. }
                | StmtKind::Assignment { value, .. }
                | StmtKind::Expr(value) => walk_expr(value, out),
                StmtKind::Return { values } => values.iter().for_each(|v| walk_expr(v, out)),
                _ => {}
            }
        }
    }

    let program = parse_program(input);
    let mut out = Vec::new();
    for f in &program.functions {
        walk_stmts(&f.body, &mut out);
    }
    out
}

#[test]
fn test_closure_no_capture() {
    let found = closures("function main() { f := x -> x * 2 }");
    assert!(found[0].captured_vars.is_empty());
}

#[test]
fn test_closure_captures_local_and_param() {
    let found = closures(
        "function scale(xs: [int], k: int) -> [int] { offset := 1\n return xs |> (x -> x * k + offset) }",
    );
    assert_eq!(found[0].captured_vars, vec!["k".to_string(), "offset".to_string()]);
}

#[test]
fn test_function_names_are_not_captured() {
    let found = closures("function main() { xs := [1] |> (x -> double(x)) }");
    assert!(found[0].captured_vars.is_empty());
}

#[test]
fn test_closure_local_shadows_outer() {
    let found = closures(
        "function main() { y := 1\n f := (x: int) -> int { y := 2\n return x + y } }",
    );
    assert!(found[0].captured_vars.is_empty());
}

#[test]
fn test_use_before_local_declaration_is_capture() {
    let found = closures(
        "function main() { y := 1\n f := (x: int) -> int { z := y\n y := 2\n return z } }",
    );
    assert_eq!(found[0].captured_vars, vec!["y".to_string()]);
}

#[test]
fn test_assignment_target_is_captured() {
    let found = closures(
        "function main() { count := 0\n tick := (x: int) -> int { count = count + 1\n return x } }",
    );
    assert_eq!(found[0].captured_vars, vec!["count".to_string()]);
}

#[test]
fn test_nested_closure_propagates_capture() {
    let found = closures("function main() { k := 3\n f := a -> b -> a + b + k }");
    // Outer closure must capture k so the inner one can reach it
    assert_eq!(found[0].captured_vars, vec!["k".to_string()]);
    assert_eq!(found[1].captured_vars, vec!["a".to_string(), "k".to_string()]);
}
