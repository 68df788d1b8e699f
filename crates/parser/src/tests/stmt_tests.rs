// Statement and Function Parsing Tests

use super::{parse_body, parse_program};
use crate::ast::{BinaryOp, ExprKind, StmtKind, TypeExpr};

#[test]
fn test_walrus_declaration() {
    let body = parse_body("doubled := numbers |> double");
    match &body[0].kind {
        StmtKind::VariableDecl { name, type_hint, value, is_const } => {
            assert_eq!(name, "doubled");
            assert_eq!(*type_hint, None);
            assert!(!is_const);
            assert!(matches!(value.kind, ExprKind::Binary { op: BinaryOp::Map, .. }));
        }
        other => panic!("Expected VariableDecl, got {:?}", other),
    }
}

#[test]
fn test_var_with_type_hint() {
    let body = parse_body("var empty: [int] = []");
    match &body[0].kind {
        StmtKind::VariableDecl { type_hint, .. } => assert_eq!(
            *type_hint,
            Some(TypeExpr::Seq(Box::new(TypeExpr::Named("int".to_string()))))
        ),
        other => panic!("Expected VariableDecl, got {:?}", other),
    }
}

#[test]
fn test_const_declaration() {
    let body = parse_body("const limit := 10");
    assert!(matches!(body[0].kind, StmtKind::VariableDecl { is_const: true, .. }));
}

#[test]
fn test_assignment() {
    let body = parse_body("count = count + 1");
    assert!(matches!(body[0].kind, StmtKind::Assignment { .. }));
}

#[test]
fn test_statements_with_semicolons() {
    let body = parse_body("a := 1; b := 2; a = b;");
    assert_eq!(body.len(), 3);
}

#[test]
fn test_if_else() {
    let body = parse_body("if x > 0 { y = 1 } else { y = 2 }");
    match &body[0].kind {
        StmtKind::If { then_block, else_block, .. } => {
            assert_eq!(then_block.len(), 1);
            assert_eq!(else_block.as_ref().map(|b| b.len()), Some(1));
        }
        other => panic!("Expected If, got {:?}", other),
    }
}

#[test]
fn test_parenthesized_condition_is_not_a_closure() {
    let body = parse_body("if (flag) { println(1) }\nwhile (i < n) { i = i + 1 }");
    match &body[0].kind {
        StmtKind::If { condition, then_block, .. } => {
            assert!(matches!(condition.kind, ExprKind::Identifier(ref name) if name == "flag"));
            assert_eq!(then_block.len(), 1);
        }
        other => panic!("Expected If, got {:?}", other),
    }
    assert!(matches!(body[1].kind, StmtKind::While { .. }));
}

#[test]
fn test_while() {
    let body = parse_body("while i < 10 { i = i + 1 }");
    assert!(matches!(body[0].kind, StmtKind::While { .. }));
}

#[test]
fn test_return_forms() {
    let body = parse_body("return");
    assert!(matches!(&body[0].kind, StmtKind::Return { values } if values.is_empty()));

    let body = parse_body("return a, b");
    assert!(matches!(&body[0].kind, StmtKind::Return { values } if values.len() == 2));
}

#[test]
fn test_function_definitions() {
    let program = parse_program(
        r#"
        function double(x: int) -> int {
            return x * 2
        }

        function split(x: int) -> (int, int) {
            return x, x
        }

        function main() {
            numbers := [1, 2, 3, 4, 5]
            doubled := numbers |> double
            println(doubled)
        }
        "#,
    );
    assert_eq!(program.functions.len(), 3);

    let double = &program.functions[0];
    assert_eq!(double.name, "double");
    assert_eq!(double.params[0].ty, Some(TypeExpr::Named("int".to_string())));
    assert_eq!(double.return_type, vec![TypeExpr::Named("int".to_string())]);

    assert_eq!(program.functions[1].return_type.len(), 2);
    assert!(program.functions[2].return_type.is_empty());
    assert_eq!(program.functions[2].body.len(), 3);
}

#[test]
fn test_function_taking_callable() {
    let program = parse_program(
        "function apply(xs: [int], f: fn(int) -> int) -> [int] { return xs |> f }",
    );
    let apply = &program.functions[0];
    assert!(matches!(apply.params[1].ty, Some(TypeExpr::Func { .. })));
}

#[test]
fn test_comments_are_ignored() {
    let program = parse_program(
        "// leading comment\nfunction main() {\n  // inside\n  x := 1 // trailing\n}",
    );
    assert_eq!(program.functions[0].body.len(), 1);
}
