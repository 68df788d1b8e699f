// Semantic validation for Rill
//
// Resolves names, assigns front-end types and reports every semantic error
// of a unit as a `Diagnostic`. The typed tree it produces is the input of
// the IR translator.

pub mod builtins;
pub mod check;
mod expr;
pub mod typed;
pub mod types;

pub use builtins::Builtin;
pub use check::{Checked, check_program};
pub use typed::{TClosure, TExpr, TExprKind, TFunction, TParam, TProgram, TStmt, TStmtKind};
pub use types::Type;

#[cfg(test)]
mod tests;
