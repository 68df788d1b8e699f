// Diagnostic values and their stable codes
//
// Codes are part of the user-facing contract: the front-end validator and
// the IR re-validator must produce the same code for the same misuse.

use crate::Span;
use std::fmt;

/// Stable diagnostic codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagCode {
    // Lexical and syntax errors (E001-E099)
    Lexical,
    Syntax,

    // General type errors (E100-E199)
    UndefinedSymbol,
    TypeMismatch,
    ArgumentCount,
    NotCallable,
    CannotInfer,
    ReturnMismatch,
    InvalidOperands,
    ConstAssignment,
    MissingReturn,
    InvalidMain,

    // Map operator (`|>`) errors (E200-E249)
    MapWrongLeftRole,
    MapWrongRightRole,
    MapArityMismatch,
    MapElementTypeMismatch,
}

impl DiagCode {
    /// The code string printed in reports (e.g. "E201")
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagCode::Lexical => "E001",
            DiagCode::Syntax => "E002",
            DiagCode::UndefinedSymbol => "E100",
            DiagCode::TypeMismatch => "E101",
            DiagCode::ArgumentCount => "E102",
            DiagCode::NotCallable => "E103",
            DiagCode::CannotInfer => "E104",
            DiagCode::ReturnMismatch => "E105",
            DiagCode::InvalidOperands => "E106",
            DiagCode::ConstAssignment => "E107",
            DiagCode::MissingReturn => "E108",
            DiagCode::InvalidMain => "E109",
            DiagCode::MapWrongLeftRole => "E201",
            DiagCode::MapWrongRightRole => "E202",
            DiagCode::MapArityMismatch => "E203",
            DiagCode::MapElementTypeMismatch => "E204",
        }
    }

    /// Short headline used as the report title
    pub fn title(&self) -> &'static str {
        match self {
            DiagCode::Lexical => "Lexical Error",
            DiagCode::Syntax => "Parse Error",
            DiagCode::UndefinedSymbol => "Undefined Symbol",
            DiagCode::TypeMismatch => "Type Error",
            DiagCode::ArgumentCount => "Wrong Number of Arguments",
            DiagCode::NotCallable => "Not Callable",
            DiagCode::CannotInfer => "Cannot Infer Type",
            DiagCode::ReturnMismatch => "Return Mismatch",
            DiagCode::InvalidOperands => "Invalid Operands",
            DiagCode::ConstAssignment => "Assignment to Constant",
            DiagCode::MissingReturn => "Missing Return",
            DiagCode::InvalidMain => "Invalid Entry Point",
            DiagCode::MapWrongLeftRole => "Map Operator: Left Operand Is Not a Sequence",
            DiagCode::MapWrongRightRole => "Map Operator: Right Operand Is Not Callable",
            DiagCode::MapArityMismatch => "Map Operator: Callable Arity Mismatch",
            DiagCode::MapElementTypeMismatch => "Map Operator: Element Type Mismatch",
        }
    }
}

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single user-facing error
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: DiagCode,
    pub message: String,
    pub span: Span,
    /// Secondary labels pointing at related source
    pub labels: Vec<(Span, String)>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn new(code: DiagCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            message: message.into(),
            span,
            labels: Vec::new(),
            help: None,
        }
    }

    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push((span, message.into()));
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} at {}..{}",
            self.code, self.message, self.span.start, self.span.end
        )
    }
}
