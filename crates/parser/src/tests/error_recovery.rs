// Error Recovery Tests
//
// Syntax and lexical errors become diagnostics; parsing continues so that
// several errors can be reported for one unit.

use crate::ast::StmtKind;
use crate::parse_source;
use diagnostics::DiagCode;

fn codes(input: &str) -> Vec<DiagCode> {
    parse_source(input)
        .diagnostics
        .into_iter()
        .map(|d| d.code)
        .collect()
}

// ==================== SYNTAX ERROR TESTS ====================

#[test]
fn test_valid_program_has_no_diagnostics() {
    assert!(codes("function main() { xs := [1] |> str }").is_empty());
}

#[test]
fn test_missing_rhs_of_map() {
    let found = codes("function main() { xs := [1] |> }");
    assert!(!found.is_empty());
    assert!(found.iter().all(|c| *c == DiagCode::Syntax));
}

#[test]
fn test_missing_lhs_of_map() {
    assert!(codes("function main() { |> f }").contains(&DiagCode::Syntax));
}

#[test]
fn test_block_closure_requires_parameter_types() {
    assert!(codes("function main() { f := (x) { println(x) } }").contains(&DiagCode::Syntax));
    assert!(codes("function main() { f := (x: int) { println(x) } }").is_empty());
}

#[test]
fn test_unclosed_paren() {
    assert!(codes("function main() { foo(1, 2 }").contains(&DiagCode::Syntax));
}

#[test]
fn test_unclosed_bracket() {
    assert!(codes("function main() { x := [1, 2, 3 }").contains(&DiagCode::Syntax));
}

#[test]
fn test_lexical_error_is_reported_with_syntax_stage() {
    let found = codes("function main() { x := 1 @ 2 }");
    assert_eq!(found.first(), Some(&DiagCode::Lexical));
}

#[test]
fn test_lexical_error_alone_keeps_program_intact() {
    // '$' is dropped by the lexer; the remaining tokens form a valid program
    let parsed = parse_source("function main() { x := 1 $ }");
    assert_eq!(parsed.diagnostics.len(), 1);
    assert_eq!(parsed.diagnostics[0].code, DiagCode::Lexical);
    assert_eq!(parsed.program.functions.len(), 1);
}

#[test]
fn test_recovery_keeps_later_functions() {
    let parsed = parse_source(
        r#"
        function broken() {
            x := 1 +
        }

        function fine() -> int {
            return 1
        }
        "#,
    );
    assert!(!parsed.diagnostics.is_empty());
    assert!(
        parsed.program.functions.iter().any(|f| f.name == "fine"),
        "later function should survive recovery: {:?}",
        parsed.program.functions
    );
}

#[test]
fn test_recovered_block_is_error_placeholder() {
    let parsed = parse_source("function main() { x := 1 + }");
    assert!(!parsed.diagnostics.is_empty());
    let main = &parsed.program.functions[0];
    assert!(
        main.body.iter().any(|s| matches!(s.kind, StmtKind::Error)),
        "recovered body should carry a placeholder: {:?}",
        main.body
    );
}

#[test]
fn test_syntax_diagnostic_points_into_source() {
    let source = "function main() { x := 1 |> ) }";
    let parsed = parse_source(source);
    let diag = parsed
        .diagnostics
        .iter()
        .find(|d| d.code == DiagCode::Syntax)
        .expect("syntax diagnostic");
    assert!(diag.span.start <= source.len(), "{:?}", diag.span);
    assert!(
        diag.message.starts_with("unexpected") || diag.message.starts_with("unclosed"),
        "{}",
        diag.message
    );
}
