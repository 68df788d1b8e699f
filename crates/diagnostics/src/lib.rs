// Diagnostics shared by every stage of the Rill pipeline
//
// The lexer, parser, semantic validator and IR re-validator all report
// through the same `Diagnostic` type so a user sees one consistent format.
// `rules` holds the operand-validation routines that both type systems run.

pub mod diagnostic;
pub mod report;
pub mod rules;

pub use diagnostic::{DiagCode, Diagnostic};
pub use report::{render, report_diagnostics};
pub use rules::{OperandError, OperandRule, TypeShape, check_binary, common_operand_type};

/// Byte range into the source of a compilation unit
pub type Span = std::ops::Range<usize>;
