// Map lowering
//
// Rewrites every `seq |> f` into backend primitives:
//
//     $seq := seq
//     $fn  := f
//     $len := len($seq)
//     $out := alloc([U], $len)        site from MapEscape.result
//     for $i in 0..$len { $out[$i] = $fn($seq[$i]) }
//
// and uses `$out` where the map was. Both element accesses are known to
// be in bounds. The statements are hoisted in front of the statement that
// contained the map, so the rest of the tree is rewritten to keep the
// original evaluation order:
//   - operands evaluated before a hoisting operand are spilled to temps
//   - `a && b` / `a || b` with a map in `b` become an `if` on a temp
//   - a map in a `while` condition is re-evaluated on each iteration
// Only fresh temporaries are introduced.

use crate::context::FunctionCtx;
use crate::error::{InternalError, IrResult};
use crate::nodes::{
    BoundsCheck, IrExpr, IrExprKind, IrFunction, IrModule, IrStmt, LocalId, MapEscape,
};
use crate::types::IrType;
use diagnostics::Span;
use parser::ast::{BinaryOp, UnaryOp};
use tracing::debug;

/// Lower every map in the module; returns how many were rewritten
pub fn lower_module(module: &mut IrModule) -> IrResult<usize> {
    let mut total = 0;
    for function in &mut module.functions {
        total += lower_function(function)?;
    }
    Ok(total)
}

pub fn lower_function(function: &mut IrFunction) -> IrResult<usize> {
    let body = std::mem::take(&mut function.body);
    let mut lowerer = Lowerer {
        ctx: &mut function.ctx,
        lowered: 0,
    };
    function.body = lowerer.block(body)?;
    let lowered = lowerer.lowered;

    debug!(function = %function.name, maps = lowered, "lowered map operators");
    Ok(lowered)
}

struct Lowerer<'a> {
    ctx: &'a mut FunctionCtx,
    lowered: usize,
}

impl Lowerer<'_> {
    fn block(&mut self, stmts: Vec<IrStmt>) -> IrResult<Vec<IrStmt>> {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            self.stmt(stmt, &mut out)?;
        }
        Ok(out)
    }

    /// Lower one statement, appending it and anything it hoists to `out`
    fn stmt(&mut self, stmt: IrStmt, out: &mut Vec<IrStmt>) -> IrResult<()> {
        let lowered = match stmt {
            IrStmt::Let { local, value } => IrStmt::Let {
                local,
                value: self.expr(value, out)?,
            },
            IrStmt::Assign { local, value } => IrStmt::Assign {
                local,
                value: self.expr(value, out)?,
            },
            IrStmt::Store {
                seq,
                index,
                value,
                bounds,
            } => {
                let mut seq = self.expr(seq, out)?;
                let mut index = self.then(&mut [&mut seq], index, out)?;
                let value = self.then(&mut [&mut seq, &mut index], value, out)?;
                IrStmt::Store {
                    seq,
                    index,
                    value,
                    bounds,
                }
            }
            IrStmt::Expr(expr) => IrStmt::Expr(self.expr(expr, out)?),
            IrStmt::Return(values) => IrStmt::Return(self.sequence(values, out)?),
            IrStmt::If {
                cond,
                then_block,
                else_block,
            } => IrStmt::If {
                cond: self.expr(cond, out)?,
                then_block: self.block(then_block)?,
                else_block: self.block(else_block)?,
            },
            IrStmt::While { cond, body } => self.while_loop(cond, body)?,
            IrStmt::ForRange {
                var,
                start,
                end,
                body,
            } => {
                let mut start = self.expr(start, out)?;
                let end = self.then(&mut [&mut start], end, out)?;
                IrStmt::ForRange {
                    var,
                    start,
                    end,
                    body: self.block(body)?,
                }
            }
            IrStmt::Break => IrStmt::Break,
        };
        out.push(lowered);
        Ok(())
    }

    fn while_loop(&mut self, cond: IrExpr, body: Vec<IrStmt>) -> IrResult<IrStmt> {
        let mut pending = Vec::new();
        let cond = self.expr(cond, &mut pending)?;
        let body = self.block(body)?;
        if pending.is_empty() {
            return Ok(IrStmt::While { cond, body });
        }

        // while true { <cond stmts>; if !cond { break }; body }
        let span = cond.span.clone();
        let exit = IrStmt::If {
            cond: negate(cond),
            then_block: vec![IrStmt::Break],
            else_block: Vec::new(),
        };
        pending.push(exit);
        pending.extend(body);
        Ok(IrStmt::While {
            cond: IrExpr::boolean(true, span),
            body: pending,
        })
    }

    /// Lower `next`, which is evaluated after the already lowered `earlier`
    fn then(
        &mut self,
        earlier: &mut [&mut IrExpr],
        next: IrExpr,
        out: &mut Vec<IrStmt>,
    ) -> IrResult<IrExpr> {
        let mut pending = Vec::new();
        let next = self.expr(next, &mut pending)?;
        if !pending.is_empty() {
            for expr in earlier.iter_mut() {
                self.spill(expr, out);
            }
            out.append(&mut pending);
        }
        Ok(next)
    }

    /// Lower operands evaluated left to right
    fn sequence(&mut self, exprs: Vec<IrExpr>, out: &mut Vec<IrStmt>) -> IrResult<Vec<IrExpr>> {
        let mut lowered: Vec<IrExpr> = Vec::with_capacity(exprs.len());
        for expr in exprs {
            let expr = {
                let mut earlier: Vec<&mut IrExpr> = lowered.iter_mut().collect();
                self.then(&mut earlier, expr, out)?
            };
            lowered.push(expr);
        }
        Ok(lowered)
    }

    /// Move an already lowered operand into a temp so later hoisted
    /// statements run after it
    fn spill(&mut self, expr: &mut IrExpr, out: &mut Vec<IrStmt>) {
        let stable = match &expr.kind {
            IrExprKind::Const(_) | IrExprKind::FuncRef(_) | IrExprKind::Builtin(_) => true,
            IrExprKind::Local(id) => self.ctx.locals.is_temp(*id),
            _ => false,
        };
        if stable {
            return;
        }
        let temp = self.ctx.fresh_temp("spill", expr.ty.clone());
        let placeholder = IrExpr::local(temp, expr.ty.clone(), expr.span.clone());
        let value = std::mem::replace(expr, placeholder);
        out.push(IrStmt::Let { local: temp, value });
    }

    fn bind(&mut self, hint: &str, value: IrExpr, out: &mut Vec<IrStmt>) -> IrExpr {
        let ty = value.ty.clone();
        let span = value.span.clone();
        let local = self.ctx.fresh_temp(hint, ty.clone());
        out.push(IrStmt::Let { local, value });
        IrExpr::local(local, ty, span)
    }

    fn expr(&mut self, expr: IrExpr, out: &mut Vec<IrStmt>) -> IrResult<IrExpr> {
        let IrExpr { kind, ty, span } = expr;
        let kind = match kind {
            IrExprKind::Const(_)
            | IrExprKind::Local(_)
            | IrExprKind::FuncRef(_)
            | IrExprKind::Builtin(_) => kind,

            IrExprKind::Unary { op, expr } => IrExprKind::Unary {
                op,
                expr: Box::new(self.expr(*expr, out)?),
            },

            IrExprKind::Binary {
                op: BinaryOp::Map,
                lhs,
                rhs,
                escape,
                ..
            } => return self.map(*lhs, *rhs, escape, ty, span, out),

            IrExprKind::Binary {
                op: op @ (BinaryOp::LogicalAnd | BinaryOp::LogicalOr),
                lhs,
                rhs,
                operand_ty,
                escape,
            } => {
                let lhs = self.expr(*lhs, out)?;
                let mut pending = Vec::new();
                let rhs = self.expr(*rhs, &mut pending)?;
                if pending.is_empty() {
                    IrExprKind::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                        operand_ty,
                        escape,
                    }
                } else {
                    return Ok(self.short_circuit(op, lhs, rhs, pending, out));
                }
            }

            IrExprKind::Binary {
                op,
                lhs,
                rhs,
                operand_ty,
                escape,
            } => {
                let mut lhs = self.expr(*lhs, out)?;
                let rhs = self.then(&mut [&mut lhs], *rhs, out)?;
                IrExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                    operand_ty,
                    escape,
                }
            }

            IrExprKind::Call { callee, args } => {
                let mut callee = self.expr(*callee, out)?;
                let mut lowered: Vec<IrExpr> = Vec::with_capacity(args.len());
                for arg in args {
                    let arg = {
                        let mut earlier: Vec<&mut IrExpr> = std::iter::once(&mut callee)
                            .chain(lowered.iter_mut())
                            .collect();
                        self.then(&mut earlier, arg, out)?
                    };
                    lowered.push(arg);
                }
                IrExprKind::Call {
                    callee: Box::new(callee),
                    args: lowered,
                }
            }

            IrExprKind::Index { seq, index, bounds } => {
                let mut seq = self.expr(*seq, out)?;
                let index = self.then(&mut [&mut seq], *index, out)?;
                IrExprKind::Index {
                    seq: Box::new(seq),
                    index: Box::new(index),
                    bounds,
                }
            }

            IrExprKind::Len(operand) => IrExprKind::Len(Box::new(self.expr(*operand, out)?)),

            IrExprKind::Alloc { elem, len, site } => IrExprKind::Alloc {
                elem,
                len: Box::new(self.expr(*len, out)?),
                site,
            },

            IrExprKind::SliceLit { elements, site } => IrExprKind::SliceLit {
                elements: self.sequence(elements, out)?,
                site,
            },

            // Closure bodies hoist into themselves
            IrExprKind::Closure(mut closure) => {
                closure.body = self.block(closure.body)?;
                IrExprKind::Closure(closure)
            }
        };
        Ok(IrExpr::new(kind, ty, span))
    }

    /// `lhs && rhs` where evaluating `rhs` needs hoisted statements
    fn short_circuit(
        &mut self,
        op: BinaryOp,
        lhs: IrExpr,
        rhs: IrExpr,
        mut pending: Vec<IrStmt>,
        out: &mut Vec<IrStmt>,
    ) -> IrExpr {
        let span = lhs.span.clone();
        let result = self.ctx.fresh_temp("cond", IrType::Bool);
        out.push(IrStmt::Let {
            local: result,
            value: lhs,
        });

        let current = IrExpr::local(result, IrType::Bool, span.clone());
        let test = if op == BinaryOp::LogicalAnd {
            current
        } else {
            negate(current)
        };

        pending.push(IrStmt::Assign {
            local: result,
            value: rhs,
        });
        out.push(IrStmt::If {
            cond: test,
            then_block: pending,
            else_block: Vec::new(),
        });
        IrExpr::local(result, IrType::Bool, span)
    }

    fn map(
        &mut self,
        lhs: IrExpr,
        rhs: IrExpr,
        escape: Option<MapEscape>,
        ty: IrType,
        span: Span,
        out: &mut Vec<IrStmt>,
    ) -> IrResult<IrExpr> {
        let escape = escape.ok_or_else(|| {
            InternalError::invariant("'|>' reached lowering without escape metadata", span.clone())
        })?;
        let Some(result_elem) = ty.element().cloned() else {
            return Err(InternalError::invariant(
                format!("'|>' has type '{}' instead of a sequence", ty),
                span,
            ));
        };
        let Some(elem) = lhs.ty.element().cloned() else {
            return Err(InternalError::invariant(
                format!("left operand of '|>' has type '{}'", lhs.ty),
                span,
            ));
        };

        // Each operand is evaluated exactly once, left before right
        let seq = self.expr(lhs, out)?;
        let seq = self.bind("seq", seq, out);
        let func = self.expr(rhs, out)?;
        let func = self.bind("fn", func, out);

        let len = IrExpr::new(IrExprKind::Len(Box::new(seq.clone())), IrType::I64, span.clone());
        let len = self.bind("len", len, out);

        let alloc = IrExpr::new(
            IrExprKind::Alloc {
                elem: result_elem.clone(),
                len: Box::new(len.clone()),
                site: escape.result,
            },
            ty.clone(),
            span.clone(),
        );
        let result = self.bind("out", alloc, out);

        let i: LocalId = self.ctx.fresh_temp("i", IrType::I64);
        let index = IrExpr::local(i, IrType::I64, span.clone());
        let element = IrExpr::new(
            IrExprKind::Index {
                seq: Box::new(seq),
                index: Box::new(index.clone()),
                bounds: BoundsCheck::Elided,
            },
            elem,
            span.clone(),
        );
        let call = IrExpr::new(
            IrExprKind::Call {
                callee: Box::new(func),
                args: vec![element],
            },
            result_elem,
            span.clone(),
        );

        out.push(IrStmt::ForRange {
            var: i,
            start: IrExpr::int(0, span.clone()),
            end: len,
            body: vec![IrStmt::Store {
                seq: result.clone(),
                index,
                value: call,
                bounds: BoundsCheck::Elided,
            }],
        });

        self.lowered += 1;
        Ok(result)
    }
}

fn negate(expr: IrExpr) -> IrExpr {
    let span = expr.span.clone();
    IrExpr::new(
        IrExprKind::Unary {
            op: UnaryOp::Not,
            expr: Box::new(expr),
        },
        IrType::Bool,
        span,
    )
}
