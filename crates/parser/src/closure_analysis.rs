/// Closure Capture Analysis
///
/// Identifies which outer locals each closure references.
/// This must run AFTER parsing to fill the `captured_vars` field in Closure nodes.
/// Escape analysis later treats captured locals as escaping through the closure.

use crate::ast::{Closure, ClosureBody, Expr, ExprKind, FunctionDef, Program, Stmt, StmtKind};
use std::collections::{BTreeSet, HashSet};

/// Lexical scopes visible at a point in a function body
#[derive(Debug, Clone, Default)]
struct Scopes {
    frames: Vec<HashSet<String>>,
}

impl Scopes {
    fn contains(&self, name: &str) -> bool {
        self.frames.iter().any(|frame| frame.contains(name))
    }

    fn declare(&mut self, name: &str) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string());
        }
    }
}

/// Analyze all closures in the program and fill their `captured_vars` fields
pub fn analyze_closures(program: &mut Program) {
    for function in &mut program.functions {
        analyze_function(function);
    }
}

fn analyze_function(function: &mut FunctionDef) {
    // Function parameters are in scope
    let mut scopes = Scopes::default();
    scopes
        .frames
        .push(function.params.iter().map(|p| p.name.clone()).collect());

    // Top-level closures have no enclosing closure, nothing to propagate
    let mut unused = BTreeSet::new();
    let mut walker = Walker {
        outer: Scopes::default(),
        captured: &mut unused,
    };
    walker.block(&mut function.body, &mut scopes);
}

/// Walks one closure body (or a function body)
///
/// `outer` is what was visible where the closure was written; names found
/// there (and not in the body's own scopes) are recorded in `captured`.
struct Walker<'a> {
    outer: Scopes,
    captured: &'a mut BTreeSet<String>,
}

impl Walker<'_> {
    fn block(&mut self, stmts: &mut [Stmt], scopes: &mut Scopes) {
        scopes.frames.push(HashSet::new());
        for stmt in stmts {
            self.stmt(stmt, scopes);
        }
        scopes.frames.pop();
    }

    fn stmt(&mut self, stmt: &mut Stmt, scopes: &mut Scopes) {
        match &mut stmt.kind {
            StmtKind::VariableDecl { name, value, .. } => {
                // The value is analyzed before the name comes into scope
                self.expr(value, scopes);
                scopes.declare(name);
            }

            StmtKind::Assignment { target, value } => {
                self.use_name(target, scopes);
                self.expr(value, scopes);
            }

            StmtKind::If {
                condition,
                then_block,
                else_block,
            } => {
                self.expr(condition, scopes);
                self.block(then_block, scopes);
                if let Some(else_b) = else_block {
                    self.block(else_b, scopes);
                }
            }

            StmtKind::While { condition, body } => {
                self.expr(condition, scopes);
                self.block(body, scopes);
            }

            StmtKind::Return { values } => {
                for value in values {
                    self.expr(value, scopes);
                }
            }

            StmtKind::Expr(expr) => self.expr(expr, scopes),

            StmtKind::Error => {}
        }
    }

    fn expr(&mut self, expr: &mut Expr, scopes: &mut Scopes) {
        match &mut expr.kind {
            ExprKind::Identifier(name) => self.use_name(name, scopes),

            ExprKind::Closure(closure) => {
                // This is a closure! Analyze its captured variables
                let mut visible = self.outer.clone();
                visible.frames.extend(scopes.frames.iter().cloned());
                analyze_closure(closure, visible);

                // Whatever the nested closure captures from outside this body
                // is captured by this body as well
                for name in &closure.captured_vars {
                    self.use_name(name, scopes);
                }
            }

            ExprKind::Binary { lhs, rhs, .. } => {
                self.expr(lhs, scopes);
                self.expr(rhs, scopes);
            }

            ExprKind::Unary { expr: inner, .. } => self.expr(inner, scopes),

            ExprKind::Array { elements, .. } => {
                for e in elements {
                    self.expr(e, scopes);
                }
            }

            ExprKind::Index { array, index } => {
                self.expr(array, scopes);
                self.expr(index, scopes);
            }

            ExprKind::Call { func, args } => {
                self.expr(func, scopes);
                for arg in args {
                    self.expr(arg, scopes);
                }
            }

            ExprKind::Literal(_) | ExprKind::Error => {
                // No nested closures here
            }
        }
    }

    fn use_name(&mut self, name: &str, scopes: &Scopes) {
        if !scopes.contains(name) && self.outer.contains(name) {
            self.captured.insert(name.to_string());
        }
    }
}

/// Analyze a single closure and fill its captured_vars field
fn analyze_closure(closure: &mut Closure, visible: Scopes) {
    // Build the closure's local scope (parameters ONLY, not outer scope)
    let mut scopes = Scopes::default();
    scopes
        .frames
        .push(closure.params.iter().map(|p| p.name.clone()).collect());

    // BTreeSet keeps the output sorted and deterministic
    let mut captured = BTreeSet::new();
    let mut walker = Walker {
        outer: visible,
        captured: &mut captured,
    };

    match &mut closure.body {
        ClosureBody::Expr(body) => walker.expr(body, &mut scopes),
        ClosureBody::Block(stmts) => walker.block(stmts, &mut scopes),
    }

    closure.captured_vars = captured.into_iter().collect();
}
