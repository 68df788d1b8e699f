// Text form of IR, for `--emit ir` and `--emit lowered`
//
//   let $out3.6 = alloc [i64; $len2.5] @1
//   for $i4.7 in 0..$len2.5 {
//     $out3.6[$i4.7]! = $fn1.4($seq0.3[$i4.7]!)
//   }
//
// Locals print as `name.id`; a trailing `!` marks an elided bounds check.

use crate::context::LocalTable;
use crate::nodes::{BoundsCheck, Const, IrExpr, IrExprKind, IrFunction, IrModule, IrStmt, LocalId};
use std::fmt::Write;

pub fn print_module(module: &IrModule) -> String {
    let mut out = String::new();
    for (i, function) in module.functions.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&print_function(function));
    }
    out
}

pub fn print_function(function: &IrFunction) -> String {
    let mut printer = Printer {
        locals: &function.ctx.locals,
        out: String::new(),
        indent: 0,
    };

    let params: Vec<String> = function
        .params
        .iter()
        .map(|p| format!("{}: {}", printer.local(*p), printer.locals.ty(*p)))
        .collect();
    let results: Vec<String> = function.results.iter().map(|t| t.to_string()).collect();
    printer.line(&format!(
        "fn {}({}) -> ({}) {{",
        function.name,
        params.join(", "),
        results.join(", ")
    ));
    printer.block(&function.body);
    printer.line("}");
    printer.out
}

struct Printer<'a> {
    locals: &'a LocalTable,
    out: String,
    indent: usize,
}

impl Printer<'_> {
    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn local(&self, id: LocalId) -> String {
        format!("{}.{}", self.locals.name(id), id.0)
    }

    fn block(&mut self, stmts: &[IrStmt]) {
        self.indent += 1;
        for stmt in stmts {
            self.stmt(stmt);
        }
        self.indent -= 1;
    }

    fn stmt(&mut self, stmt: &IrStmt) {
        match stmt {
            IrStmt::Let { local, value } => {
                let text = format!("let {} = {}", self.local(*local), self.expr(value));
                self.line(&text);
            }
            IrStmt::Assign { local, value } => {
                let text = format!("{} = {}", self.local(*local), self.expr(value));
                self.line(&text);
            }
            IrStmt::Store {
                seq,
                index,
                value,
                bounds,
            } => {
                let text = format!(
                    "{}[{}]{} = {}",
                    self.expr(seq),
                    self.expr(index),
                    bang(*bounds),
                    self.expr(value)
                );
                self.line(&text);
            }
            IrStmt::Expr(expr) => {
                let text = self.expr(expr);
                self.line(&text);
            }
            IrStmt::Return(values) => {
                let values: Vec<String> = values.iter().map(|v| self.expr(v)).collect();
                if values.is_empty() {
                    self.line("return");
                } else {
                    self.line(&format!("return {}", values.join(", ")));
                }
            }
            IrStmt::If {
                cond,
                then_block,
                else_block,
            } => {
                let text = format!("if {} {{", self.expr(cond));
                self.line(&text);
                self.block(then_block);
                if !else_block.is_empty() {
                    self.line("} else {");
                    self.block(else_block);
                }
                self.line("}");
            }
            IrStmt::While { cond, body } => {
                let text = format!("while {} {{", self.expr(cond));
                self.line(&text);
                self.block(body);
                self.line("}");
            }
            IrStmt::Break => self.line("break"),
            IrStmt::ForRange {
                var,
                start,
                end,
                body,
            } => {
                let text = format!(
                    "for {} in {}..{} {{",
                    self.local(*var),
                    self.expr(start),
                    self.expr(end)
                );
                self.line(&text);
                self.block(body);
                self.line("}");
            }
        }
    }

    fn expr(&mut self, expr: &IrExpr) -> String {
        match &expr.kind {
            IrExprKind::Const(Const::Int(n)) => n.to_string(),
            IrExprKind::Const(Const::Bool(b)) => b.to_string(),
            IrExprKind::Const(Const::Str(s)) => format!("{:?}", s),
            IrExprKind::Local(id) => self.local(*id),
            IrExprKind::FuncRef(name) => name.clone(),
            IrExprKind::Builtin(builtin) => builtin.name().to_string(),
            IrExprKind::Unary { op, expr } => {
                let symbol = match op {
                    parser::ast::UnaryOp::Not => "!",
                    parser::ast::UnaryOp::Negate => "-",
                };
                format!("{}{}", symbol, self.expr(expr))
            }
            IrExprKind::Binary { op, lhs, rhs, .. } => {
                format!("({} {} {})", self.expr(lhs), op.symbol(), self.expr(rhs))
            }
            IrExprKind::Call { callee, args } => {
                let args: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
                format!("{}({})", self.expr(callee), args.join(", "))
            }
            IrExprKind::Index { seq, index, bounds } => {
                format!("{}[{}]{}", self.expr(seq), self.expr(index), bang(*bounds))
            }
            IrExprKind::Len(operand) => format!("len({})", self.expr(operand)),
            IrExprKind::Alloc { elem, len, site } => {
                format!("alloc [{}; {}] {}", elem, self.expr(len), site)
            }
            IrExprKind::SliceLit { elements, site } => {
                let elements: Vec<String> = elements.iter().map(|e| self.expr(e)).collect();
                format!("[{}] {}", elements.join(", "), site)
            }
            IrExprKind::Closure(closure) => {
                let params: Vec<String> = closure.params.iter().map(|p| self.local(*p)).collect();
                let captures: Vec<String> =
                    closure.captures.iter().map(|c| self.local(*c)).collect();
                let mut text = String::new();
                let _ = writeln!(
                    text,
                    "closure({}) [{}] {{",
                    params.join(", "),
                    captures.join(", ")
                );
                let mut inner = Printer {
                    locals: self.locals,
                    out: String::new(),
                    indent: self.indent + 1,
                };
                for stmt in &closure.body {
                    inner.stmt(stmt);
                }
                text.push_str(&inner.out);
                for _ in 0..self.indent {
                    text.push_str("  ");
                }
                text.push('}');
                text
            }
        }
    }
}

fn bang(bounds: BoundsCheck) -> &'static str {
    match bounds {
        BoundsCheck::Checked => "",
        BoundsCheck::Elided => "!",
    }
}
