// IR re-validation
//
// Re-derives the type of every IR expression from its operands, using the
// same operand rules as the front end but over `IrType`. Running it on IR
// built by any producer (the translator, a later pass, a test) reports
// the same diagnostic codes the front end would for the same misuse.
// Derived types are written back; rejected expressions become `Invalid`,
// and nothing that consumes an `Invalid` value is diagnosed again.

use crate::context::LocalTable;
use crate::nodes::{
    Const, IrClosure, IrExpr, IrExprKind, IrFunction, IrModule, IrStmt, LocalId,
};
use crate::types::{FuncSig, IrType};
use diagnostics::rules::Blame;
use diagnostics::{DiagCode, Diagnostic, Span, TypeShape, check_binary};
use parser::ast::UnaryOp;
use sema::Builtin;
use std::collections::HashMap;
use tracing::debug;

/// Re-validate every function of a module
pub fn verify_module(module: &mut IrModule) -> Vec<Diagnostic> {
    let signatures: HashMap<String, IrType> = module
        .functions
        .iter()
        .map(|f| (f.name.clone(), f.sig()))
        .collect();

    let mut diagnostics = Vec::new();
    for function in &mut module.functions {
        diagnostics.extend(verify_function(function, &signatures));
    }
    debug!(diagnostics = diagnostics.len(), "re-validated module");
    diagnostics
}

/// Re-validate one function against the signatures it may call
pub fn verify_function(
    function: &mut IrFunction,
    signatures: &HashMap<String, IrType>,
) -> Vec<Diagnostic> {
    let mut verifier = Verifier {
        locals: &function.ctx.locals,
        signatures,
        results: vec![function.results.clone()],
        diagnostics: Vec::new(),
    };
    verifier.block(&mut function.body);
    verifier.diagnostics
}

struct Verifier<'a> {
    locals: &'a LocalTable,
    signatures: &'a HashMap<String, IrType>,
    results: Vec<Vec<IrType>>,
    diagnostics: Vec<Diagnostic>,
}

impl Verifier<'_> {
    fn error(&mut self, code: DiagCode, message: String, span: Span) {
        self.diagnostics.push(Diagnostic::new(code, message, span));
    }

    fn expect(&mut self, expected: &IrType, found: &IrType, what: &str, span: &Span) -> bool {
        if expected.contains_invalid() || found.contains_invalid() || expected == found {
            return true;
        }
        self.error(
            DiagCode::TypeMismatch,
            format!("{}: expected '{}', found '{}'", what, expected, found),
            span.clone(),
        );
        false
    }

    fn local_ty(&self, id: LocalId) -> IrType {
        self.locals.ty(id).clone()
    }

    fn block(&mut self, stmts: &mut [IrStmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &mut IrStmt) {
        match stmt {
            IrStmt::Let { local, value } | IrStmt::Assign { local, value } => {
                let found = self.expr(value);
                let declared = self.local_ty(*local);
                let what = format!("value bound to '{}'", self.locals.name(*local));
                self.expect(&declared, &found, &what, &value.span);
            }

            IrStmt::Store {
                seq, index, value, ..
            } => {
                let seq_ty = self.expr(seq);
                let index_ty = self.expr(index);
                let value_ty = self.expr(value);
                self.expect(&IrType::I64, &index_ty, "store index", &index.span);
                match seq_ty.element() {
                    Some(element) => {
                        let element = element.clone();
                        self.expect(&element, &value_ty, "stored value", &value.span);
                    }
                    None if seq_ty.is_poison() => {}
                    None => self.error(
                        DiagCode::TypeMismatch,
                        format!("cannot store into a value of type '{}'", seq_ty),
                        seq.span.clone(),
                    ),
                }
            }

            IrStmt::Expr(expr) => {
                self.expr(expr);
            }

            IrStmt::Return(values) => self.ret(values),

            IrStmt::If {
                cond,
                then_block,
                else_block,
            } => {
                let ty = self.expr(cond);
                self.expect(&IrType::Bool, &ty, "condition", &cond.span);
                self.block(then_block);
                self.block(else_block);
            }

            IrStmt::While { cond, body } => {
                let ty = self.expr(cond);
                self.expect(&IrType::Bool, &ty, "condition", &cond.span);
                self.block(body);
            }

            IrStmt::ForRange {
                var,
                start,
                end,
                body,
            } => {
                let start_ty = self.expr(start);
                let end_ty = self.expr(end);
                self.expect(&IrType::I64, &start_ty, "range start", &start.span);
                self.expect(&IrType::I64, &end_ty, "range end", &end.span);
                let var_ty = self.local_ty(*var);
                self.expect(&IrType::I64, &var_ty, "range variable", &start.span);
                self.block(body);
            }

            IrStmt::Break => {}
        }
    }

    fn ret(&mut self, values: &mut [IrExpr]) {
        let expected = self.results.last().cloned().unwrap_or_default();
        let mut found: Vec<IrType> = values.iter_mut().map(|v| self.expr(v)).collect();
        if found.len() == 1 && expected.len() > 1 {
            found = found.remove(0).into_results();
        }

        let span = values
            .first()
            .map(|v| v.span.clone())
            .unwrap_or_default();
        if found.iter().any(IrType::contains_invalid) {
            return;
        }
        if found.len() != expected.len() {
            self.error(
                DiagCode::ReturnMismatch,
                format!(
                    "expected {} return value(s), found {}",
                    expected.len(),
                    found.len()
                ),
                span,
            );
        } else if let Some((want, got)) = expected.iter().zip(&found).find(|(w, g)| w != g) {
            self.error(
                DiagCode::ReturnMismatch,
                format!("return type mismatch: expected '{}', found '{}'", want, got),
                span,
            );
        }
    }

    /// Derive, write back and return the type of `expr`
    fn expr(&mut self, expr: &mut IrExpr) -> IrType {
        let ty = self.derive(expr);
        expr.ty = ty.clone();
        ty
    }

    fn derive(&mut self, expr: &mut IrExpr) -> IrType {
        let span = expr.span.clone();
        match &mut expr.kind {
            IrExprKind::Const(Const::Int(_)) => IrType::I64,
            IrExprKind::Const(Const::Bool(_)) => IrType::Bool,
            IrExprKind::Const(Const::Str(_)) => IrType::Str,

            IrExprKind::Local(id) => self.local_ty(*id),

            IrExprKind::FuncRef(name) => match self.signatures.get(name.as_str()) {
                Some(sig) => sig.clone(),
                None => {
                    let message = format!("undefined function '{}'", name);
                    self.error(DiagCode::UndefinedSymbol, message, span);
                    IrType::Invalid
                }
            },

            IrExprKind::Builtin(Builtin::Str) => IrType::func(vec![IrType::I64], vec![IrType::Str]),
            IrExprKind::Builtin(builtin) => {
                let message = format!("builtin '{}' can only be called directly", builtin.name());
                self.error(DiagCode::TypeMismatch, message, span);
                IrType::Invalid
            }

            IrExprKind::Unary { op, expr: inner } => {
                let inner_ty = self.expr(inner);
                let (symbol, want) = match op {
                    UnaryOp::Negate => ("-", IrType::I64),
                    UnaryOp::Not => ("!", IrType::Bool),
                };
                if inner_ty.is_poison() {
                    IrType::Invalid
                } else if inner_ty == want {
                    want
                } else {
                    let message =
                        format!("operator '{}' cannot be applied to '{}'", symbol, inner_ty);
                    self.error(DiagCode::InvalidOperands, message, inner.span.clone());
                    IrType::Invalid
                }
            }

            IrExprKind::Binary {
                op,
                lhs,
                rhs,
                operand_ty,
                ..
            } => {
                let spec = op.spec();
                let lhs_ty = self.expr(lhs);
                let rhs_ty = self.expr(rhs);
                match check_binary(spec.rule, spec.symbol, &lhs_ty, &rhs_ty) {
                    Ok(ty) => {
                        if spec.rule.is_homogeneous() && !ty.is_poison() {
                            *operand_ty = Some(lhs_ty);
                        }
                        ty
                    }
                    Err(err) => {
                        let primary = match err.blame() {
                            Blame::Left => lhs.span.clone(),
                            Blame::Right => rhs.span.clone(),
                            Blame::Both => span,
                        };
                        let mut diagnostic =
                            Diagnostic::new(err.code(), err.to_string(), primary);
                        if let Some(help) = err.help() {
                            diagnostic = diagnostic.with_help(help);
                        }
                        self.diagnostics.push(diagnostic);
                        IrType::Invalid
                    }
                }
            }

            IrExprKind::Call { callee, args } => self.call(callee, args, span),

            IrExprKind::Index { seq, index, .. } => {
                let seq_ty = self.expr(seq);
                let index_ty = self.expr(index);
                if seq_ty.is_poison() || index_ty.is_poison() {
                    return IrType::Invalid;
                }
                let Some(element) = seq_ty.element().cloned() else {
                    let message = format!("cannot index into a value of type '{}'", seq_ty);
                    self.error(DiagCode::TypeMismatch, message, seq.span.clone());
                    return IrType::Invalid;
                };
                if self.expect(&IrType::I64, &index_ty, "index", &index.span) {
                    element
                } else {
                    IrType::Invalid
                }
            }

            IrExprKind::Len(operand) => {
                let ty = self.expr(operand);
                if ty.is_poison() {
                    IrType::Invalid
                } else if ty.element().is_some() {
                    IrType::I64
                } else {
                    let message = format!("'len' expects a sequence, found '{}'", ty);
                    self.error(DiagCode::TypeMismatch, message, operand.span.clone());
                    IrType::Invalid
                }
            }

            IrExprKind::Alloc { elem, len, .. } => {
                let elem = elem.clone();
                let len_ty = self.expr(len);
                if self.expect(&IrType::I64, &len_ty, "allocation length", &len.span) {
                    IrType::slice(elem)
                } else {
                    IrType::Invalid
                }
            }

            IrExprKind::SliceLit { elements, .. } => {
                let declared = expr.ty.clone();
                self.slice_lit(elements, declared, span)
            }

            IrExprKind::Closure(closure) => self.closure(closure),
        }
    }

    fn call(&mut self, callee: &mut IrExpr, args: &mut [IrExpr], span: Span) -> IrType {
        let arg_tys: Vec<IrType> = args.iter_mut().map(|a| self.expr(a)).collect();

        // println takes any single value
        if let IrExprKind::Builtin(Builtin::Println) = callee.kind {
            callee.ty = IrType::func(arg_tys.clone(), Vec::new());
            if arg_tys.len() != 1 {
                let message = format!("'println' expects 1 argument, found {}", arg_tys.len());
                self.error(DiagCode::ArgumentCount, message, span);
                return IrType::Invalid;
            }
            return IrType::Unit;
        }

        let callee_ty = self.expr(callee);
        let sig = match callee_ty {
            IrType::Func(sig) => sig,
            IrType::Invalid => return IrType::Invalid,
            other => {
                let message = format!("a value of type '{}' is not callable", other);
                self.error(DiagCode::NotCallable, message, callee.span.clone());
                return IrType::Invalid;
            }
        };
        let FuncSig { params, results } = sig;

        if arg_tys.len() != params.len() {
            let message = format!(
                "expected {} argument(s), found {}",
                params.len(),
                arg_tys.len()
            );
            self.error(DiagCode::ArgumentCount, message, span);
            return IrType::Invalid;
        }

        let mut ok = true;
        for (i, (arg, param)) in args.iter().zip(&params).enumerate() {
            let what = format!("argument {}", i + 1);
            ok &= self.expect(param, &arg.ty, &what, &arg.span);
        }
        if ok && !arg_tys.iter().any(IrType::contains_invalid) {
            IrType::from_results(&results)
        } else {
            IrType::Invalid
        }
    }

    fn slice_lit(&mut self, elements: &mut [IrExpr], declared: IrType, span: Span) -> IrType {
        let tys: Vec<IrType> = elements.iter_mut().map(|e| self.expr(e)).collect();
        let Some(first) = tys.first().cloned() else {
            // Empty literals keep the type the producer gave them
            if declared.element().is_none() && !declared.is_poison() {
                let message = format!("empty sequence has non-sequence type '{}'", declared);
                self.error(DiagCode::TypeMismatch, message, span);
                return IrType::Invalid;
            }
            return declared;
        };

        if tys.iter().any(IrType::contains_invalid) {
            return IrType::Invalid;
        }
        let mut ty = IrType::slice(first.clone());
        for (element, element_ty) in elements.iter().zip(&tys).skip(1) {
            if *element_ty != first {
                let message = format!(
                    "sequence elements must share one type: expected '{}', found '{}'",
                    first, element_ty
                );
                self.error(DiagCode::TypeMismatch, message, element.span.clone());
                ty = IrType::Invalid;
            }
        }
        ty
    }

    fn closure(&mut self, closure: &mut IrClosure) -> IrType {
        self.results.push(closure.results.clone());
        self.block(&mut closure.body);
        self.results.pop();
        IrType::func(
            closure.params.iter().map(|p| self.local_ty(*p)).collect(),
            closure.results.clone(),
        )
    }
}
