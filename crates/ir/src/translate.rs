// Syntax -> IR translation
//
// Converts a diagnostic-free typed program into an `IrModule`. Front-end
// types are converted once here; locals are interned in the function's
// `LocalTable`. `|>` becomes an ordinary binary node with no unified
// operand type.

use crate::context::FunctionCtx;
use crate::error::{InternalError, IrResult};
use crate::nodes::{
    BoundsCheck, Const, IrClosure, IrExpr, IrExprKind, IrFunction, IrModule, IrStmt, LocalId,
};
use crate::types::IrType;
use diagnostics::{Span, common_operand_type};
use sema::{Builtin, TClosure, TExpr, TExprKind, TFunction, TProgram, TStmt, TStmtKind};
use std::collections::HashMap;
use tracing::debug;

/// Translate a whole program
pub fn translate_program(program: &TProgram) -> IrResult<IrModule> {
    let functions = program
        .functions
        .iter()
        .map(translate_function)
        .collect::<IrResult<Vec<_>>>()?;
    Ok(IrModule { functions })
}

pub fn translate_function(function: &TFunction) -> IrResult<IrFunction> {
    let mut ctx = FunctionCtx::new();
    let mut translator = Translator {
        ctx: &mut ctx,
        scopes: vec![HashMap::new()],
    };

    let mut params = Vec::with_capacity(function.params.len());
    for param in &function.params {
        let ty = IrType::lower_from(&param.ty, &param.span)?;
        params.push(translator.declare(&param.name, ty));
    }

    let results = lower_types(&function.results, &function.span)?;
    let body = translator.block(&function.body)?;

    debug!(
        function = %function.name,
        locals = ctx.locals.len(),
        "translated function"
    );

    Ok(IrFunction {
        name: function.name.clone(),
        params,
        results,
        body,
        ctx,
        span: function.span.clone(),
    })
}

fn lower_types(types: &[sema::Type], span: &Span) -> IrResult<Vec<IrType>> {
    types.iter().map(|t| IrType::lower_from(t, span)).collect()
}

/// Translation state for one top-level function
struct Translator<'a> {
    ctx: &'a mut FunctionCtx,
    /// Source names visible at the current point
    scopes: Vec<HashMap<String, LocalId>>,
}

impl Translator<'_> {
    fn declare(&mut self, name: &str, ty: IrType) -> LocalId {
        let id = self.ctx.declare(name, ty);
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), id);
        }
        id
    }

    fn lookup(&self, name: &str, span: &Span) -> IrResult<LocalId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
            .ok_or_else(|| InternalError::UnresolvedLocal {
                name: name.to_string(),
                span: span.clone(),
            })
    }

    fn block(&mut self, stmts: &[TStmt]) -> IrResult<Vec<IrStmt>> {
        self.scopes.push(HashMap::new());
        let translated = stmts.iter().map(|s| self.stmt(s)).collect();
        self.scopes.pop();
        translated
    }

    fn stmt(&mut self, stmt: &TStmt) -> IrResult<IrStmt> {
        Ok(match &stmt.kind {
            TStmtKind::Let { name, ty, value, .. } => {
                // The value is translated before the name comes into scope
                let value = self.expr(value)?;
                let ty = IrType::lower_from(ty, &stmt.span)?;
                let local = self.declare(name, ty);
                IrStmt::Let { local, value }
            }
            TStmtKind::Assign { name, value } => IrStmt::Assign {
                local: self.lookup(name, &stmt.span)?,
                value: self.expr(value)?,
            },
            TStmtKind::If {
                condition,
                then_block,
                else_block,
            } => IrStmt::If {
                cond: self.expr(condition)?,
                then_block: self.block(then_block)?,
                else_block: self.block(else_block)?,
            },
            TStmtKind::While { condition, body } => IrStmt::While {
                cond: self.expr(condition)?,
                body: self.block(body)?,
            },
            TStmtKind::Return(values) => IrStmt::Return(self.exprs(values)?),
            TStmtKind::Expr(expr) => IrStmt::Expr(self.expr(expr)?),
        })
    }

    fn exprs(&mut self, exprs: &[TExpr]) -> IrResult<Vec<IrExpr>> {
        exprs.iter().map(|e| self.expr(e)).collect()
    }

    fn expr(&mut self, expr: &TExpr) -> IrResult<IrExpr> {
        let ty = IrType::lower_from(&expr.ty, &expr.span)?;
        let span = expr.span.clone();

        let kind = match &expr.kind {
            TExprKind::Int(n) => IrExprKind::Const(Const::Int(*n)),
            TExprKind::Bool(b) => IrExprKind::Const(Const::Bool(*b)),
            TExprKind::Str(s) => IrExprKind::Const(Const::Str(s.clone())),
            TExprKind::Local(name) => IrExprKind::Local(self.lookup(name, &span)?),
            TExprKind::Function(name) => IrExprKind::FuncRef(name.clone()),
            TExprKind::Builtin(builtin) => IrExprKind::Builtin(*builtin),

            TExprKind::Unary { op, expr: inner } => IrExprKind::Unary {
                op: *op,
                expr: Box::new(self.expr(inner)?),
            },

            TExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.expr(lhs)?;
                let rhs = self.expr(rhs)?;
                let operand_ty = if op.spec().rule.is_homogeneous() {
                    let common = common_operand_type(&lhs.ty, &rhs.ty).ok_or_else(|| {
                        InternalError::invariant(
                            format!("operands of '{}' have no common type", op.symbol()),
                            span.clone(),
                        )
                    })?;
                    Some(common)
                } else {
                    None
                };
                IrExprKind::Binary {
                    op: *op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                    operand_ty,
                    escape: None,
                }
            }

            TExprKind::Seq(elements) => IrExprKind::SliceLit {
                elements: self.exprs(elements)?,
                site: self.ctx.fresh_alloc(),
            },

            TExprKind::Index { seq, index } => IrExprKind::Index {
                seq: Box::new(self.expr(seq)?),
                index: Box::new(self.expr(index)?),
                bounds: BoundsCheck::Checked,
            },

            TExprKind::Call { callee, args } => match (&callee.kind, args.as_slice()) {
                (TExprKind::Builtin(Builtin::Len), [arg]) => {
                    IrExprKind::Len(Box::new(self.expr(arg)?))
                }
                _ => IrExprKind::Call {
                    callee: Box::new(self.expr(callee)?),
                    args: self.exprs(args)?,
                },
            },

            TExprKind::Closure(closure) => IrExprKind::Closure(self.closure(closure, &span)?),

            TExprKind::Error => {
                return Err(InternalError::invariant(
                    "error expression reached IR translation",
                    span,
                ));
            }
        };

        Ok(IrExpr::new(kind, ty, span))
    }

    fn closure(&mut self, closure: &TClosure, span: &Span) -> IrResult<IrClosure> {
        // Captures resolve in the enclosing scopes
        let captures = closure
            .captures
            .iter()
            .map(|name| self.lookup(name, span))
            .collect::<IrResult<Vec<_>>>()?;

        self.scopes.push(HashMap::new());
        let mut params = Vec::with_capacity(closure.params.len());
        for param in &closure.params {
            let ty = IrType::lower_from(&param.ty, &param.span)?;
            params.push(self.declare(&param.name, ty));
        }
        let body = self.block(&closure.body);
        self.scopes.pop();

        Ok(IrClosure {
            params,
            results: lower_types(&closure.results, span)?,
            captures,
            body: body?,
        })
    }
}
