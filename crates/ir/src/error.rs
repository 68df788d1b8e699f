// Internal compiler errors
//
// These are not user diagnostics: they mean an earlier stage broke a
// contract the IR passes rely on, and they abort the unit.

use diagnostics::Span;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InternalError {
    #[error("internal invariant violated at {}..{}: {message}", .span.start, .span.end)]
    InvariantViolation { message: String, span: Span },

    #[error("unresolved local '{name}' at {}..{}", .span.start, .span.end)]
    UnresolvedLocal { name: String, span: Span },
}

impl InternalError {
    pub fn invariant(message: impl Into<String>, span: Span) -> Self {
        InternalError::InvariantViolation {
            message: message.into(),
            span,
        }
    }
}

pub type IrResult<T> = Result<T, InternalError>;
