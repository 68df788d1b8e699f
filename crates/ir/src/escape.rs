// Escape analysis
//
// Two parts. `annotate_module` runs before lowering and records, on every
// `|>` node, how its operands are used and which allocation site will hold
// its result. `place_allocations` is the general placement pass run on
// lowered IR: it decides for every allocation site whether the container
// may live in the function's frame or must go to the heap.

use crate::context::FunctionCtx;
use crate::nodes::{
    AllocId, IrExpr, IrExprKind, IrFunction, IrModule, IrStmt, LocalId, MapEscape, OperandUse,
    for_each_expr,
};
use parser::ast::BinaryOp;
use sema::Builtin;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

// ==================== MAP ANNOTATION ====================

/// Attach `MapEscape` facts to every `|>` node
///
/// The sequence operand is only read by the element loop; the callable
/// escapes exactly as any closure value does. The result gets a fresh
/// allocation site which lowering uses for its container.
pub fn annotate_module(module: &mut IrModule) {
    for function in &mut module.functions {
        let count = annotate_block(&mut function.body, &mut function.ctx);
        debug!(function = %function.name, maps = count, "annotated map operators");
    }
}

fn annotate_block(stmts: &mut [IrStmt], ctx: &mut FunctionCtx) -> usize {
    let mut count = 0;
    for stmt in stmts {
        count += match stmt {
            IrStmt::Let { value, .. } | IrStmt::Assign { value, .. } | IrStmt::Expr(value) => {
                annotate_expr(value, ctx)
            }
            IrStmt::Store {
                seq, index, value, ..
            } => annotate_expr(seq, ctx) + annotate_expr(index, ctx) + annotate_expr(value, ctx),
            IrStmt::Return(values) => values.iter_mut().map(|v| annotate_expr(v, ctx)).sum(),
            IrStmt::If {
                cond,
                then_block,
                else_block,
            } => {
                annotate_expr(cond, ctx)
                    + annotate_block(then_block, ctx)
                    + annotate_block(else_block, ctx)
            }
            IrStmt::While { cond, body } => annotate_expr(cond, ctx) + annotate_block(body, ctx),
            IrStmt::ForRange {
                start, end, body, ..
            } => annotate_expr(start, ctx) + annotate_expr(end, ctx) + annotate_block(body, ctx),
            IrStmt::Break => 0,
        };
    }
    count
}

fn annotate_expr(expr: &mut IrExpr, ctx: &mut FunctionCtx) -> usize {
    match &mut expr.kind {
        IrExprKind::Const(_)
        | IrExprKind::Local(_)
        | IrExprKind::FuncRef(_)
        | IrExprKind::Builtin(_) => 0,
        IrExprKind::Unary { expr, .. } | IrExprKind::Len(expr) => annotate_expr(expr, ctx),
        IrExprKind::Binary {
            op,
            lhs,
            rhs,
            escape,
            ..
        } => {
            // Operands first so nested maps get the lower site numbers
            let nested = annotate_expr(lhs, ctx) + annotate_expr(rhs, ctx);
            if *op != BinaryOp::Map {
                return nested;
            }
            *escape = Some(MapEscape {
                seq: OperandUse::ReadOnly,
                func: OperandUse::ClosureRules,
                result: ctx.fresh_alloc(),
            });
            nested + 1
        }
        IrExprKind::Call { callee, args } => {
            annotate_expr(callee, ctx) + args.iter_mut().map(|a| annotate_expr(a, ctx)).sum::<usize>()
        }
        IrExprKind::Index { seq, index, .. } => annotate_expr(seq, ctx) + annotate_expr(index, ctx),
        IrExprKind::Alloc { len, .. } => annotate_expr(len, ctx),
        IrExprKind::SliceLit { elements, .. } => {
            elements.iter_mut().map(|e| annotate_expr(e, ctx)).sum()
        }
        IrExprKind::Closure(closure) => annotate_block(&mut closure.body, ctx),
    }
}

// ==================== PLACEMENT ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Stack,
    Heap,
}

/// Placement decision for every allocation site of one function
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Placements {
    sites: BTreeMap<AllocId, Placement>,
}

impl Placements {
    pub fn get(&self, site: AllocId) -> Option<Placement> {
        self.sites.get(&site).copied()
    }

    pub fn heap_sites(&self) -> impl Iterator<Item = AllocId> + '_ {
        self.sites
            .iter()
            .filter(|(_, p)| **p == Placement::Heap)
            .map(|(site, _)| *site)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// Decide stack or heap for every allocation in a function
///
/// A container stays on the stack unless some alias of it is returned,
/// passed to a call, captured by a closure, stored into another sequence
/// or assigned into a captured local.
pub fn place_allocations(function: &IrFunction) -> Placements {
    let mut sites = BTreeSet::new();
    for_each_expr(&function.body, &mut |e| match &e.kind {
        IrExprKind::Alloc { site, .. } | IrExprKind::SliceLit { site, .. } => {
            sites.insert(*site);
        }
        _ => {}
    });

    let aliases = Aliases::compute(&function.body);
    let mut escaping = BTreeSet::new();
    let mut captured = BTreeSet::new();
    collect_captured(&function.body, &mut captured);
    find_escapes(&function.body, &aliases, &captured, &mut escaping);
    for local in &captured {
        escaping.extend(aliases.of_local(*local));
    }

    let placements = Placements {
        sites: sites
            .into_iter()
            .map(|site| {
                let placement = if escaping.contains(&site) {
                    Placement::Heap
                } else {
                    Placement::Stack
                };
                (site, placement)
            })
            .collect(),
    };

    debug!(
        function = %function.name,
        sites = placements.len(),
        heap = placements.heap_sites().count(),
        "placed allocations"
    );
    placements
}

/// Which allocation sites each local may refer to
#[derive(Default)]
struct Aliases {
    locals: HashMap<LocalId, BTreeSet<AllocId>>,
}

impl Aliases {
    /// Flow-insensitive fixpoint over all bindings in the function
    fn compute(body: &[IrStmt]) -> Self {
        let mut aliases = Aliases::default();
        loop {
            let mut changed = false;
            aliases.bind_block(body, &mut changed);
            if !changed {
                return aliases;
            }
        }
    }

    fn of_local(&self, local: LocalId) -> BTreeSet<AllocId> {
        self.locals.get(&local).cloned().unwrap_or_default()
    }

    /// Sites a value of `expr` may be
    ///
    /// Elements read out of a sequence are excluded: anything stored into
    /// a sequence already escapes.
    fn of_expr(&self, expr: &IrExpr) -> BTreeSet<AllocId> {
        match &expr.kind {
            IrExprKind::Alloc { site, .. } | IrExprKind::SliceLit { site, .. } => {
                BTreeSet::from([*site])
            }
            IrExprKind::Local(id) => self.of_local(*id),
            _ => BTreeSet::new(),
        }
    }

    fn bind(&mut self, local: LocalId, value: &IrExpr, changed: &mut bool) {
        let sites = self.of_expr(value);
        if sites.is_empty() {
            return;
        }
        let entry = self.locals.entry(local).or_default();
        let before = entry.len();
        entry.extend(sites);
        *changed |= entry.len() != before;
    }

    fn bind_block(&mut self, stmts: &[IrStmt], changed: &mut bool) {
        for stmt in stmts {
            match stmt {
                IrStmt::Let { local, value } | IrStmt::Assign { local, value } => {
                    self.bind(*local, value, changed)
                }
                IrStmt::If {
                    then_block,
                    else_block,
                    ..
                } => {
                    self.bind_block(then_block, changed);
                    self.bind_block(else_block, changed);
                }
                IrStmt::While { body, .. } | IrStmt::ForRange { body, .. } => {
                    self.bind_block(body, changed)
                }
                _ => {}
            }
        }
        // Closure bodies bind locals of the same table
        let mut closures = Vec::new();
        for_each_expr(stmts, &mut |e| {
            if let IrExprKind::Closure(closure) = &e.kind {
                closures.push(closure);
            }
        });
        for closure in closures {
            self.bind_block(&closure.body, changed);
        }
    }
}

fn collect_captured(stmts: &[IrStmt], captured: &mut BTreeSet<LocalId>) {
    for_each_expr(stmts, &mut |e| {
        if let IrExprKind::Closure(closure) = &e.kind {
            captured.extend(closure.captures.iter().copied());
        }
    });
}

fn find_escapes(
    stmts: &[IrStmt],
    aliases: &Aliases,
    captured: &BTreeSet<LocalId>,
    escaping: &mut BTreeSet<AllocId>,
) {
    for stmt in stmts {
        match stmt {
            IrStmt::Return(values) => {
                for value in values {
                    escaping.extend(aliases.of_expr(value));
                }
            }
            IrStmt::Store { value, .. } => escaping.extend(aliases.of_expr(value)),
            IrStmt::Assign { local, value } | IrStmt::Let { local, value }
                if captured.contains(local) =>
            {
                escaping.extend(aliases.of_expr(value))
            }
            IrStmt::If {
                then_block,
                else_block,
                ..
            } => {
                find_escapes(then_block, aliases, captured, escaping);
                find_escapes(else_block, aliases, captured, escaping);
            }
            IrStmt::While { body, .. } | IrStmt::ForRange { body, .. } => {
                find_escapes(body, aliases, captured, escaping)
            }
            _ => {}
        }
    }

    // Expression-level escapes: call arguments and sequence elements
    let mut closures = Vec::new();
    for_each_expr(stmts, &mut |e| match &e.kind {
        IrExprKind::Call { callee, args } => {
            let retains = !matches!(callee.kind, IrExprKind::Builtin(Builtin::Println));
            if retains {
                for arg in args {
                    escaping.extend(aliases.of_expr(arg));
                }
            }
        }
        IrExprKind::SliceLit { elements, .. } => {
            for element in elements {
                escaping.extend(aliases.of_expr(element));
            }
        }
        IrExprKind::Closure(closure) => closures.push(closure),
        _ => {}
    });
    for closure in closures {
        find_escapes(&closure.body, aliases, captured, escaping);
    }
}
