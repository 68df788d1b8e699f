// IR nodes
//
// A function body is a tree of statements over expressions. Every
// expression carries its `IrType`. Before lowering, `|>` is an ordinary
// binary node; after lowering only backend primitives remain: locals,
// calls, indexing, `Len`, `Alloc`, stores and counted loops.

use crate::context::FunctionCtx;
use crate::types::IrType;
use diagnostics::Span;
use parser::ast::{BinaryOp, UnaryOp};
use sema::Builtin;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(pub u32);

/// Names one allocation site within a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllocId(pub u32);

impl fmt::Display for AllocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// How a map operand is used by the element loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandUse {
    /// Only read; never stored, returned or captured by the loop
    ReadOnly,
    /// Escapes exactly as closure values always do
    ClosureRules,
}

/// Escape facts attached to a `|>` node before lowering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapEscape {
    pub seq: OperandUse,
    pub func: OperandUse,
    /// Site of the result container lowering introduces
    pub result: AllocId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsCheck {
    Checked,
    /// The index is known to be within bounds
    Elided,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Const {
    Int(i64),
    Bool(bool),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrModule {
    pub functions: Vec<IrFunction>,
}

impl IrModule {
    pub fn function(&self, name: &str) -> Option<&IrFunction> {
        self.functions.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrFunction {
    pub name: String,
    pub params: Vec<LocalId>,
    pub results: Vec<IrType>,
    pub body: Vec<IrStmt>,
    /// Locals (including those of nested closures), temporaries and sites
    pub ctx: FunctionCtx,
    pub span: Span,
}

impl IrFunction {
    pub fn sig(&self) -> IrType {
        IrType::func(
            self.params
                .iter()
                .map(|p| self.ctx.locals.ty(*p).clone())
                .collect(),
            self.results.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrClosure {
    pub params: Vec<LocalId>,
    pub results: Vec<IrType>,
    /// Enclosing locals shared by reference
    pub captures: Vec<LocalId>,
    pub body: Vec<IrStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrExpr {
    pub kind: IrExprKind,
    pub ty: IrType,
    pub span: Span,
}

impl IrExpr {
    pub fn new(kind: IrExprKind, ty: IrType, span: Span) -> Self {
        Self { kind, ty, span }
    }

    pub fn int(n: i64, span: Span) -> Self {
        Self::new(IrExprKind::Const(Const::Int(n)), IrType::I64, span)
    }

    pub fn boolean(b: bool, span: Span) -> Self {
        Self::new(IrExprKind::Const(Const::Bool(b)), IrType::Bool, span)
    }

    pub fn local(id: LocalId, ty: IrType, span: Span) -> Self {
        Self::new(IrExprKind::Local(id), ty, span)
    }

    pub fn is_map(&self) -> bool {
        matches!(
            self.kind,
            IrExprKind::Binary {
                op: BinaryOp::Map,
                ..
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IrExprKind {
    Const(Const),
    Local(LocalId),
    FuncRef(String),
    Builtin(Builtin),
    Unary {
        op: UnaryOp,
        expr: Box<IrExpr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<IrExpr>,
        rhs: Box<IrExpr>,
        /// Unified operand type; `None` for `|>`, whose operands differ
        operand_ty: Option<IrType>,
        escape: Option<MapEscape>,
    },
    Call {
        callee: Box<IrExpr>,
        args: Vec<IrExpr>,
    },
    Index {
        seq: Box<IrExpr>,
        index: Box<IrExpr>,
        bounds: BoundsCheck,
    },
    Len(Box<IrExpr>),
    /// A fresh slice of `len` zeroed elements
    Alloc {
        elem: IrType,
        len: Box<IrExpr>,
        site: AllocId,
    },
    SliceLit {
        elements: Vec<IrExpr>,
        site: AllocId,
    },
    Closure(IrClosure),
}

#[derive(Debug, Clone, PartialEq)]
pub enum IrStmt {
    Let {
        local: LocalId,
        value: IrExpr,
    },
    Assign {
        local: LocalId,
        value: IrExpr,
    },
    /// seq[index] = value
    Store {
        seq: IrExpr,
        index: IrExpr,
        value: IrExpr,
        bounds: BoundsCheck,
    },
    Expr(IrExpr),
    Return(Vec<IrExpr>),
    If {
        cond: IrExpr,
        then_block: Vec<IrStmt>,
        else_block: Vec<IrStmt>,
    },
    While {
        cond: IrExpr,
        body: Vec<IrStmt>,
    },
    Break,
    /// for var in start..end, ascending
    ForRange {
        var: LocalId,
        start: IrExpr,
        end: IrExpr,
        body: Vec<IrStmt>,
    },
}

/// Visit every expression under `stmts`, parents before children,
/// descending into closure bodies
pub fn for_each_expr<'a>(stmts: &'a [IrStmt], f: &mut impl FnMut(&'a IrExpr)) {
    for stmt in stmts {
        match stmt {
            IrStmt::Let { value, .. } | IrStmt::Assign { value, .. } | IrStmt::Expr(value) => {
                walk_expr(value, f)
            }
            IrStmt::Store {
                seq, index, value, ..
            } => {
                walk_expr(seq, f);
                walk_expr(index, f);
                walk_expr(value, f);
            }
            IrStmt::Return(values) => values.iter().for_each(|v| walk_expr(v, f)),
            IrStmt::If {
                cond,
                then_block,
                else_block,
            } => {
                walk_expr(cond, f);
                for_each_expr(then_block, f);
                for_each_expr(else_block, f);
            }
            IrStmt::While { cond, body } => {
                walk_expr(cond, f);
                for_each_expr(body, f);
            }
            IrStmt::ForRange {
                start, end, body, ..
            } => {
                walk_expr(start, f);
                walk_expr(end, f);
                for_each_expr(body, f);
            }
            IrStmt::Break => {}
        }
    }
}

fn walk_expr<'a>(expr: &'a IrExpr, f: &mut impl FnMut(&'a IrExpr)) {
    f(expr);
    match &expr.kind {
        IrExprKind::Const(_)
        | IrExprKind::Local(_)
        | IrExprKind::FuncRef(_)
        | IrExprKind::Builtin(_) => {}
        IrExprKind::Unary { expr, .. } | IrExprKind::Len(expr) => walk_expr(expr, f),
        IrExprKind::Binary { lhs, rhs, .. } => {
            walk_expr(lhs, f);
            walk_expr(rhs, f);
        }
        IrExprKind::Call { callee, args } => {
            walk_expr(callee, f);
            args.iter().for_each(|a| walk_expr(a, f));
        }
        IrExprKind::Index { seq, index, .. } => {
            walk_expr(seq, f);
            walk_expr(index, f);
        }
        IrExprKind::Alloc { len, .. } => walk_expr(len, f),
        IrExprKind::SliceLit { elements, .. } => elements.iter().for_each(|e| walk_expr(e, f)),
        IrExprKind::Closure(closure) => for_each_expr(&closure.body, f),
    }
}

/// Number of `|>` nodes left in a function
pub fn count_maps(function: &IrFunction) -> usize {
    let mut count = 0;
    for_each_expr(&function.body, &mut |e| {
        if e.is_map() {
            count += 1;
        }
    });
    count
}
