// Typed syntax tree
//
// Output of the semantic validator. Every expression carries the type the
// validator assigned (`Type::Poison` where it was rejected), names are
// classified as locals, functions or builtins, and closure bodies are
// always statement lists.

use crate::builtins::Builtin;
use crate::types::Type;
use parser::ast::{BinaryOp, Span, UnaryOp};

#[derive(Debug, Clone, PartialEq)]
pub struct TProgram {
    pub functions: Vec<TFunction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TFunction {
    pub name: String,
    pub params: Vec<TParam>,
    pub results: Vec<Type>,
    pub body: Vec<TStmt>,
    pub span: Span,
}

impl TFunction {
    pub fn ty(&self) -> Type {
        Type::Func {
            params: self.params.iter().map(|p| p.ty.clone()).collect(),
            results: self.results.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TParam {
    pub name: String,
    pub ty: Type,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TClosure {
    pub params: Vec<TParam>,
    pub results: Vec<Type>,
    pub body: Vec<TStmt>,
    /// Outer locals referenced by the body, sorted
    pub captures: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TExpr {
    pub kind: TExprKind,
    pub ty: Type,
    pub span: Span,
}

impl TExpr {
    pub fn new(kind: TExprKind, ty: Type, span: Span) -> Self {
        Self { kind, ty, span }
    }

    pub fn poison(span: Span) -> Self {
        Self::new(TExprKind::Error, Type::Poison, span)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TExprKind {
    Int(i64),
    Bool(bool),
    Str(String),
    Local(String),
    Function(String),
    Builtin(Builtin),
    Unary {
        op: UnaryOp,
        expr: Box<TExpr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<TExpr>,
        rhs: Box<TExpr>,
    },
    Seq(Vec<TExpr>),
    Index {
        seq: Box<TExpr>,
        index: Box<TExpr>,
    },
    Call {
        callee: Box<TExpr>,
        args: Vec<TExpr>,
    },
    Closure(TClosure),
    /// Rejected or unrecoverable expression
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TStmt {
    pub kind: TStmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TStmtKind {
    Let {
        name: String,
        ty: Type,
        value: TExpr,
        is_const: bool,
    },
    Assign {
        name: String,
        value: TExpr,
    },
    If {
        condition: TExpr,
        then_block: Vec<TStmt>,
        else_block: Vec<TStmt>,
    },
    While {
        condition: TExpr,
        body: Vec<TStmt>,
    },
    Return(Vec<TExpr>),
    Expr(TExpr),
}

/// Whether every path through `stmts` ends in a return
pub fn always_returns(stmts: &[TStmt]) -> bool {
    stmts.iter().any(|stmt| match &stmt.kind {
        TStmtKind::Return(_) => true,
        TStmtKind::If {
            then_block,
            else_block,
            ..
        } => always_returns(then_block) && always_returns(else_block),
        _ => false,
    })
}
