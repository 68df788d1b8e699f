// Map Operator Validation Tests

use super::{body_codes, check_body};
use crate::typed::{TExprKind, TStmtKind};
use crate::types::Type;
use diagnostics::DiagCode;

/// Type assigned to the value of `name := ...` in main
fn type_of(body: &str, name: &str) -> Type {
    let checked = check_body(body);
    assert!(checked.diagnostics.is_empty(), "{:?}", checked.diagnostics);
    let main = checked
        .program
        .functions
        .iter()
        .find(|f| f.name == "main")
        .expect("main");
    main.body
        .iter()
        .find_map(|s| match &s.kind {
            TStmtKind::Let { name: n, value, .. } if n == name => Some(value.ty.clone()),
            _ => None,
        })
        .expect("declaration")
}

// ==================== ACCEPTED ====================

#[test]
fn test_map_named_function() {
    assert_eq!(
        type_of("ys := [1, 2, 3] |> double", "ys"),
        Type::Seq(Box::new(Type::Int))
    );
}

#[test]
fn test_map_changes_element_type() {
    assert_eq!(
        type_of("ys := [1, 2, 3] |> str", "ys"),
        Type::Seq(Box::new(Type::Str))
    );
}

#[test]
fn test_map_chain() {
    assert_eq!(
        type_of("ys := [1, 2] |> (x -> x * 2) |> (x -> str(x))", "ys"),
        Type::Seq(Box::new(Type::Str))
    );
}

#[test]
fn test_map_typed_block_closure() {
    assert_eq!(
        type_of("ys := [1, 2] |> (x: int) -> int { return x * 3 }", "ys"),
        Type::Seq(Box::new(Type::Int))
    );
}

#[test]
fn test_map_nested_sequences() {
    assert_eq!(
        type_of("ys := [[1], [2, 3]] |> (s -> len(s))", "ys"),
        Type::Seq(Box::new(Type::Int))
    );
}

#[test]
fn test_map_over_typed_empty() {
    assert_eq!(
        type_of("ys := []int |> str", "ys"),
        Type::Seq(Box::new(Type::Str))
    );
}

#[test]
fn test_map_closure_param_gets_element_type() {
    let checked = check_body("ys := [\"a\"] |> (s -> s + \"!\")");
    assert!(checked.diagnostics.is_empty(), "{:?}", checked.diagnostics);
    let main = &checked.program.functions[2];
    let TStmtKind::Let { value, .. } = &main.body[0].kind else {
        panic!("expected declaration");
    };
    let TExprKind::Binary { rhs, .. } = &value.kind else {
        panic!("expected binary");
    };
    let TExprKind::Closure(closure) = &rhs.kind else {
        panic!("expected closure");
    };
    assert_eq!(closure.params[0].ty, Type::Str);
    assert_eq!(closure.results, vec![Type::Str]);
}

#[test]
fn test_map_binds_looser_than_logical_or() {
    // (a || b) is a bool, not a sequence
    assert_eq!(
        body_codes("a := true\n b := false\n ys := a || b |> double"),
        vec![DiagCode::MapWrongLeftRole]
    );
}

// ==================== REJECTED ====================

#[test]
fn test_map_wrong_left_role() {
    let checked = check_body("ys := 5 |> double");
    assert_eq!(super::codes(&checked), vec![DiagCode::MapWrongLeftRole]);
    let msg = &checked.diagnostics[0].message;
    assert!(msg.contains("'|>'") && msg.contains("'int'"), "{}", msg);
}

#[test]
fn test_map_wrong_left_role_with_untyped_closure() {
    // No element type to infer from; only the left role is reported
    assert_eq!(
        body_codes("ys := \"abc\" |> (c -> c)"),
        vec![DiagCode::MapWrongLeftRole]
    );
}

#[test]
fn test_map_wrong_right_role() {
    assert_eq!(
        body_codes("ys := [1, 2] |> 3"),
        vec![DiagCode::MapWrongRightRole]
    );
}

#[test]
fn test_map_arity_two_params() {
    let checked = check_body("ys := [1, 2] |> add");
    assert_eq!(super::codes(&checked), vec![DiagCode::MapArityMismatch]);
    assert!(checked.diagnostics[0].message.contains("2 parameter(s)"));
}

#[test]
fn test_map_arity_untyped_closure_pair() {
    assert_eq!(
        body_codes("ys := [1, 2] |> (a, b) -> a + b"),
        vec![DiagCode::MapArityMismatch]
    );
}

#[test]
fn test_map_arity_no_results() {
    assert_eq!(
        body_codes("ys := [1, 2] |> (x -> println(x))"),
        vec![DiagCode::MapArityMismatch]
    );
}

#[test]
fn test_map_arity_two_results() {
    assert_eq!(
        body_codes("ys := [1] |> (x: int) -> (int, int) { return x, x }"),
        vec![DiagCode::MapArityMismatch]
    );
}

#[test]
fn test_map_element_type_mismatch() {
    let checked = check_body("ys := [\"a\", \"b\"] |> double");
    assert_eq!(super::codes(&checked), vec![DiagCode::MapElementTypeMismatch]);
    let msg = &checked.diagnostics[0].message;
    assert!(msg.contains("'int'") && msg.contains("'string'"), "{}", msg);
    // Secondary label points at the sequence
    assert_eq!(checked.diagnostics[0].labels.len(), 1);
}

#[test]
fn test_map_element_mismatch_nested() {
    assert_eq!(
        body_codes("ys := [[1]] |> double"),
        vec![DiagCode::MapElementTypeMismatch]
    );
}

// ==================== CASCADE SUPPRESSION ====================

#[test]
fn test_undefined_left_operand_reports_once() {
    assert_eq!(
        body_codes("ys := undefined |> double"),
        vec![DiagCode::UndefinedSymbol]
    );
}

#[test]
fn test_undefined_left_with_untyped_closure_reports_once() {
    assert_eq!(
        body_codes("ys := undefined |> (x -> x + 1)"),
        vec![DiagCode::UndefinedSymbol]
    );
}

#[test]
fn test_rejected_map_does_not_cascade_into_chain() {
    assert_eq!(
        body_codes("ys := (1 |> double) |> double"),
        vec![DiagCode::MapWrongLeftRole]
    );
}

#[test]
fn test_rejected_map_does_not_cascade_into_consumers() {
    assert_eq!(
        body_codes("ys := 1 |> double\n n := len(ys)\n z := ys[0] + 1\n println(ys)"),
        vec![DiagCode::MapWrongLeftRole]
    );
}

#[test]
fn test_closure_with_failed_parameter_does_not_cascade_into_map() {
    assert_eq!(
        body_codes("f := x -> x * 2\n ys := [1, 2] |> f"),
        vec![DiagCode::CannotInfer]
    );
}

#[test]
fn test_partly_invalid_sequence_does_not_cascade_into_map() {
    assert_eq!(
        body_codes("f := x -> x * 2\n ys := [f] |> str"),
        vec![DiagCode::CannotInfer]
    );
}

#[test]
fn test_independent_errors_are_all_reported() {
    assert_eq!(
        body_codes("a := 1 |> double\n b := [1] |> 2\n c := [1] |> add"),
        vec![
            DiagCode::MapWrongLeftRole,
            DiagCode::MapWrongRightRole,
            DiagCode::MapArityMismatch
        ]
    );
}
