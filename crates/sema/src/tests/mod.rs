mod map_tests;

use crate::{Checked, check_program};
use diagnostics::DiagCode;

/// Parse (expecting no syntax errors) and validate a whole program
pub(crate) fn check(source: &str) -> Checked {
    let parsed = parser::parse_source(source);
    assert!(
        parsed.diagnostics.is_empty(),
        "unexpected syntax errors: {:?}",
        parsed.diagnostics
    );
    check_program(&parsed.program)
}

/// Validate statements placed in the body of `main`
pub(crate) fn check_body(body: &str) -> Checked {
    check(&format!(
        "function double(x: int) -> int {{ return x * 2 }}\n\
         function add(a: int, b: int) -> int {{ return a + b }}\n\
         function main() {{\n{}\n}}",
        body
    ))
}

pub(crate) fn codes(checked: &Checked) -> Vec<DiagCode> {
    checked.diagnostics.iter().map(|d| d.code).collect()
}

pub(crate) fn body_codes(body: &str) -> Vec<DiagCode> {
    codes(&check_body(body))
}
