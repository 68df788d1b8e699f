// Expression Parsing Tests
//
// Literals, sequences, closures, calls and indexing.

use super::parse_expr;
use crate::ast::{BinaryOp, ClosureBody, ExprKind, Literal, StmtKind, TypeExpr, UnaryOp};

// ==================== LITERAL TESTS ====================

#[test]
fn test_literal_int() {
    assert_eq!(parse_expr("42").kind, ExprKind::Literal(Literal::Int(42)));
}

#[test]
fn test_literal_string() {
    assert_eq!(
        parse_expr(r#""hello""#).kind,
        ExprKind::Literal(Literal::String("hello".to_string()))
    );
}

#[test]
fn test_literal_bools() {
    assert_eq!(parse_expr("true").kind, ExprKind::Literal(Literal::Bool(true)));
    assert_eq!(parse_expr("false").kind, ExprKind::Literal(Literal::Bool(false)));
}

#[test]
fn test_negative_literal_is_unary() {
    match parse_expr("-5").kind {
        ExprKind::Unary { op: UnaryOp::Negate, expr } => {
            assert_eq!(expr.kind, ExprKind::Literal(Literal::Int(5)));
        }
        other => panic!("Expected Negate, got {:?}", other),
    }
}

// ==================== SEQUENCE TESTS ====================

#[test]
fn test_array_literal() {
    match parse_expr("[1, 2, 3]").kind {
        ExprKind::Array { elements, element_type } => {
            assert_eq!(elements.len(), 3);
            assert_eq!(element_type, None);
        }
        other => panic!("Expected Array, got {:?}", other),
    }
}

#[test]
fn test_array_trailing_comma() {
    match parse_expr("[1, 2,]").kind {
        ExprKind::Array { elements, .. } => assert_eq!(elements.len(), 2),
        other => panic!("Expected Array, got {:?}", other),
    }
}

#[test]
fn test_empty_array_untyped() {
    assert_eq!(
        parse_expr("[]").kind,
        ExprKind::Array {
            elements: vec![],
            element_type: None
        }
    );
}

#[test]
fn test_typed_empty_array() {
    assert_eq!(
        parse_expr("[]int").kind,
        ExprKind::Array {
            elements: vec![],
            element_type: Some(TypeExpr::Named("int".to_string()))
        }
    );
}

#[test]
fn test_typed_empty_nested_array() {
    match parse_expr("[][string]").kind {
        ExprKind::Array { element_type, .. } => assert_eq!(
            element_type,
            Some(TypeExpr::Seq(Box::new(TypeExpr::Named("string".to_string()))))
        ),
        other => panic!("Expected Array, got {:?}", other),
    }
}

#[test]
fn test_typed_empty_array_mapped() {
    match parse_expr("[]int |> double").kind {
        ExprKind::Binary { op: BinaryOp::Map, lhs, .. } => {
            assert!(matches!(lhs.kind, ExprKind::Array { .. }));
        }
        other => panic!("Expected Map, got {:?}", other),
    }
}

// ==================== CLOSURE TESTS ====================

#[test]
fn test_bare_param_closure() {
    match parse_expr("x -> x * 2").kind {
        ExprKind::Closure(closure) => {
            assert_eq!(closure.params.len(), 1);
            assert_eq!(closure.params[0].name, "x");
            assert_eq!(closure.params[0].ty, None);
            assert_eq!(closure.return_type, None);
            match closure.body {
                ClosureBody::Expr(body) => assert!(matches!(
                    body.kind,
                    ExprKind::Binary { op: BinaryOp::Mul, .. }
                )),
                other => panic!("Expected expression body, got {:?}", other),
            }
        }
        other => panic!("Expected Closure, got {:?}", other),
    }
}

#[test]
fn test_parenthesized_closure_operand() {
    match parse_expr("[1, 2] |> (x -> x * 2)").kind {
        ExprKind::Binary { op: BinaryOp::Map, rhs, .. } => {
            assert!(matches!(rhs.kind, ExprKind::Closure(_)));
        }
        other => panic!("Expected Map, got {:?}", other),
    }
}

#[test]
fn test_typed_params_closure() {
    match parse_expr("(a: int, b) -> a + b").kind {
        ExprKind::Closure(closure) => {
            assert_eq!(closure.params.len(), 2);
            assert_eq!(closure.params[0].ty, Some(TypeExpr::Named("int".to_string())));
            assert_eq!(closure.params[1].ty, None);
        }
        other => panic!("Expected Closure, got {:?}", other),
    }
}

#[test]
fn test_block_closure_with_return_type() {
    match parse_expr("(x: int) -> int { return x * 3 }").kind {
        ExprKind::Closure(closure) => {
            assert_eq!(
                closure.return_type,
                Some(vec![TypeExpr::Named("int".to_string())])
            );
            match closure.body {
                ClosureBody::Block(stmts) => {
                    assert!(matches!(stmts[0].kind, StmtKind::Return { .. }));
                }
                other => panic!("Expected block body, got {:?}", other),
            }
        }
        other => panic!("Expected Closure, got {:?}", other),
    }
}

#[test]
fn test_block_closure_multiple_results() {
    match parse_expr("(x: int) -> (int, int) { return x, x }").kind {
        ExprKind::Closure(closure) => {
            assert_eq!(closure.return_type.map(|r| r.len()), Some(2));
        }
        other => panic!("Expected Closure, got {:?}", other),
    }
}

#[test]
fn test_block_closure_without_results() {
    match parse_expr("(x: int) { println(x) }").kind {
        ExprKind::Closure(closure) => assert_eq!(closure.return_type, Some(vec![])),
        other => panic!("Expected Closure, got {:?}", other),
    }
}

#[test]
fn test_closure_body_extends_right() {
    // The closure swallows the rest of the expression, like a Rust closure
    match parse_expr("xs |> x -> x + 1 |> g").kind {
        ExprKind::Binary { op: BinaryOp::Map, rhs, .. } => match rhs.kind {
            ExprKind::Closure(closure) => match closure.body {
                ClosureBody::Expr(body) => assert!(matches!(
                    body.kind,
                    ExprKind::Binary { op: BinaryOp::Map, .. }
                )),
                other => panic!("Expected expression body, got {:?}", other),
            },
            other => panic!("Expected Closure, got {:?}", other),
        },
        other => panic!("Expected Map, got {:?}", other),
    }
}

#[test]
fn test_function_type_param() {
    match parse_expr("(f: fn(int) -> string) -> f(1)").kind {
        ExprKind::Closure(closure) => assert_eq!(
            closure.params[0].ty,
            Some(TypeExpr::Func {
                params: vec![TypeExpr::Named("int".to_string())],
                results: vec![TypeExpr::Named("string".to_string())],
            })
        ),
        other => panic!("Expected Closure, got {:?}", other),
    }
}

// ==================== POSTFIX TESTS ====================

#[test]
fn test_call_with_args() {
    match parse_expr("add(1, 2)").kind {
        ExprKind::Call { func, args } => {
            assert_eq!(func.kind, ExprKind::Identifier("add".to_string()));
            assert_eq!(args.len(), 2);
        }
        other => panic!("Expected Call, got {:?}", other),
    }
}

#[test]
fn test_index_then_call() {
    match parse_expr("fs[0](7)").kind {
        ExprKind::Call { func, .. } => {
            assert!(matches!(func.kind, ExprKind::Index { .. }));
        }
        other => panic!("Expected Call, got {:?}", other),
    }
}

#[test]
fn test_index_of_map_result() {
    match parse_expr("(xs |> f)[2]").kind {
        ExprKind::Index { array, .. } => {
            assert!(matches!(array.kind, ExprKind::Binary { op: BinaryOp::Map, .. }));
        }
        other => panic!("Expected Index, got {:?}", other),
    }
}
