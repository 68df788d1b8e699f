// crates/parser/src/ast.rs

pub use diagnostics::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    String(String),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    LogicalAnd,
    LogicalOr,
    Map, // |>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,    // !
    Negate, // -
}

/// Written type annotations
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// int, string, bool
    Named(String),
    /// [T]
    Seq(Box<TypeExpr>),
    /// fn(T, U) -> R or fn(T) -> (R, S)
    Func {
        params: Vec<TypeExpr>,
        results: Vec<TypeExpr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClosureBody {
    /// x -> x * 2
    Expr(Box<Expr>),
    /// (x: int) -> int { return x * 2 }
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub params: Vec<Param>,
    /// None when results are inferred from an expression body
    pub return_type: Option<Vec<TypeExpr>>,
    pub body: ClosureBody,
    /// Outer locals referenced by the body (filled by closure_analysis)
    pub captured_vars: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),

    Identifier(String),

    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },

    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// [a, b, c] or the typed empty form []int
    Array {
        elements: Vec<Expr>,
        element_type: Option<TypeExpr>,
    },

    Index {
        array: Box<Expr>,
        index: Box<Expr>,
    },

    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },

    Closure(Closure),

    /// Placeholder left by syntax error recovery
    Error,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Expression with an empty span, for hand-built trees in tests
    pub fn dummy(kind: ExprKind) -> Self {
        Self { kind, span: 0..0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    VariableDecl {
        name: String,
        type_hint: Option<TypeExpr>,
        value: Expr,
        is_const: bool,
    },

    Assignment {
        target: String,
        value: Expr,
    },

    If {
        condition: Expr,
        then_block: Vec<Stmt>,
        else_block: Option<Vec<Stmt>>,
    },

    While {
        condition: Expr,
        body: Vec<Stmt>,
    },

    Return {
        values: Vec<Expr>,
    },

    Expr(Expr),

    /// Placeholder left by syntax error recovery
    Error,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn dummy(kind: StmtKind) -> Self {
        Self { kind, span: 0..0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Vec<TypeExpr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub functions: Vec<FunctionDef>,
}
