// Semantic validation: expressions
//
// Binary operators are validated by the shared rule routine named in the
// operator table. `|>` additionally feeds the element type of its left
// operand into an untyped closure on its right.

use crate::builtins::Builtin;
use crate::check::{Checker, Resolved};
use crate::typed::{TClosure, TExpr, TExprKind, TParam, TStmt, TStmtKind, always_returns};
use crate::types::Type;
use diagnostics::rules::Blame;
use diagnostics::{DiagCode, Diagnostic, Span, TypeShape, check_binary};
use parser::ast::{
    BinaryOp, Closure, ClosureBody, Expr, ExprKind, Literal, TypeExpr, UnaryOp,
};

/// Where untyped closure parameters take their types from
#[derive(Debug, Clone, Copy)]
pub(crate) enum ParamSource<'a> {
    /// No context; an untyped parameter cannot be inferred
    Nothing,
    /// Right operand of `|>`: every untyped parameter gets the element type
    Element(&'a Type),
    /// Expected callable type, matched by position
    Signature(&'a [Type]),
    /// The context is already in error; infer poison without reporting
    Silent,
}

impl Checker {
    /// Check an expression, using `expected` to type closures and empty sequences
    pub fn check_expr(&mut self, expr: &Expr, expected: Option<&Type>) -> TExpr {
        let span = expr.span.clone();
        match &expr.kind {
            ExprKind::Literal(lit) => match lit {
                Literal::Int(n) => TExpr::new(TExprKind::Int(*n), Type::Int, span),
                Literal::Bool(b) => TExpr::new(TExprKind::Bool(*b), Type::Bool, span),
                Literal::String(s) => TExpr::new(TExprKind::Str(s.clone()), Type::Str, span),
            },

            ExprKind::Identifier(name) => self.check_identifier(name, span),

            ExprKind::Unary { op, expr: inner } => self.check_unary(*op, inner, span),

            ExprKind::Binary { op, lhs, rhs } => self.check_binary_expr(*op, lhs, rhs, span),

            ExprKind::Array {
                elements,
                element_type,
            } => self.check_array(elements, element_type.as_ref(), expected, span),

            ExprKind::Index { array, index } => self.check_index(array, index, span),

            ExprKind::Call { func, args } => self.check_call(func, args, span),

            ExprKind::Closure(closure) => {
                let source = match expected {
                    Some(Type::Func { params, .. }) => ParamSource::Signature(params),
                    Some(Type::Poison) => ParamSource::Silent,
                    _ => ParamSource::Nothing,
                };
                self.check_closure(closure, source, span)
            }

            // Already reported by the parser
            ExprKind::Error => TExpr::poison(span),
        }
    }

    fn check_identifier(&mut self, name: &str, span: Span) -> TExpr {
        match self.resolve(name) {
            Some(Resolved::Local(ty)) => TExpr::new(TExprKind::Local(name.to_string()), ty, span),
            Some(Resolved::Function(ty)) => {
                TExpr::new(TExprKind::Function(name.to_string()), ty, span)
            }
            Some(Resolved::Builtin(builtin)) => match builtin.value_type() {
                Some(ty) => TExpr::new(TExprKind::Builtin(builtin), ty, span),
                None => {
                    self.report(
                        Diagnostic::new(
                            DiagCode::TypeMismatch,
                            format!("builtin '{}' can only be called directly", name),
                            span.clone(),
                        )
                        .with_help(format!("wrap it in a closure, e.g. (s -> {}(s))", name)),
                    );
                    TExpr::poison(span)
                }
            },
            None => {
                self.error(
                    DiagCode::UndefinedSymbol,
                    format!("undefined symbol '{}'", name),
                    span.clone(),
                );
                TExpr::poison(span)
            }
        }
    }

    fn check_unary(&mut self, op: UnaryOp, inner: &Expr, span: Span) -> TExpr {
        let inner = self.check_expr(inner, None);
        let (symbol, ty) = match op {
            UnaryOp::Negate => ("-", Type::Int),
            UnaryOp::Not => ("!", Type::Bool),
        };

        let result = if inner.ty.is_poison() {
            Type::Poison
        } else if inner.ty == ty {
            ty
        } else {
            self.error(
                DiagCode::InvalidOperands,
                format!("operator '{}' cannot be applied to '{}'", symbol, inner.ty),
                inner.span.clone(),
            );
            Type::Poison
        };

        TExpr::new(
            TExprKind::Unary {
                op,
                expr: Box::new(inner),
            },
            result,
            span,
        )
    }

    fn check_binary_expr(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr, span: Span) -> TExpr {
        let spec = op.spec();
        let lhs = self.check_expr(lhs, None);
        let rhs = match (&rhs.kind, op) {
            (ExprKind::Closure(closure), BinaryOp::Map) => {
                let source = match lhs.ty.element() {
                    Some(element) => ParamSource::Element(element),
                    None => ParamSource::Silent,
                };
                self.check_closure(closure, source, rhs.span.clone())
            }
            _ => self.check_expr(rhs, None),
        };

        let ty = match check_binary(spec.rule, spec.symbol, &lhs.ty, &rhs.ty) {
            Ok(ty) => ty,
            Err(err) => {
                let (primary, other) = match err.blame() {
                    Blame::Left => (lhs.span.clone(), Some(&rhs)),
                    Blame::Right => (rhs.span.clone(), Some(&lhs)),
                    Blame::Both => (span.clone(), None),
                };

                // Map errors also point at the operand that was accepted
                let mut diagnostic = Diagnostic::new(err.code(), err.to_string(), primary);
                if let Some(other) = other {
                    diagnostic = diagnostic
                        .with_label(other.span.clone(), format!("this has type '{}'", other.ty));
                }
                if let Some(help) = err.help() {
                    diagnostic = diagnostic.with_help(help);
                }
                self.report(diagnostic);
                Type::Poison
            }
        };

        TExpr::new(
            TExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
            span,
        )
    }

    fn check_array(
        &mut self,
        elements: &[Expr],
        annotation: Option<&TypeExpr>,
        expected: Option<&Type>,
        span: Span,
    ) -> TExpr {
        if elements.is_empty() {
            let ty = match (annotation, expected) {
                (Some(element), _) => {
                    let element = self.resolve_type(element, &span);
                    Type::seq(element)
                }
                (None, Some(ty @ Type::Seq(_))) => ty.clone(),
                (None, Some(Type::Poison)) => Type::Poison,
                (None, _) => {
                    self.report(
                        Diagnostic::new(
                            DiagCode::CannotInfer,
                            "cannot infer the element type of an empty sequence",
                            span.clone(),
                        )
                        .with_help("write the element type, e.g. []int"),
                    );
                    Type::Poison
                }
            };
            return TExpr::new(TExprKind::Seq(Vec::new()), ty, span);
        }

        let hint = expected.and_then(Type::element);
        let elements: Vec<TExpr> = elements.iter().map(|e| self.check_expr(e, hint)).collect();

        let mut ty = if elements.iter().any(|e| e.ty.is_poison()) {
            Type::Poison
        } else {
            Type::seq(elements[0].ty.clone())
        };

        if let Some(first) = ty.element().cloned() {
            for element in &elements[1..] {
                if element.ty != first {
                    self.error(
                        DiagCode::TypeMismatch,
                        format!(
                            "sequence elements must share one type: expected '{}', found '{}'",
                            first, element.ty
                        ),
                        element.span.clone(),
                    );
                    ty = Type::Poison;
                }
            }
        }

        TExpr::new(TExprKind::Seq(elements), ty, span)
    }

    fn check_index(&mut self, array: &Expr, index: &Expr, span: Span) -> TExpr {
        let seq = self.check_expr(array, None);
        let index = self.check_expr(index, None);

        let ty = if seq.ty.is_poison() || index.ty.is_poison() {
            Type::Poison
        } else if let Some(element) = seq.ty.element().cloned() {
            if self.expect_type(&Type::Int, &index.ty, "sequence index", index.span.clone()) {
                element
            } else {
                Type::Poison
            }
        } else {
            self.error(
                DiagCode::TypeMismatch,
                format!("cannot index into a value of type '{}'", seq.ty),
                seq.span.clone(),
            );
            Type::Poison
        };

        TExpr::new(
            TExprKind::Index {
                seq: Box::new(seq),
                index: Box::new(index),
            },
            ty,
            span,
        )
    }

    fn check_call(&mut self, func: &Expr, args: &[Expr], span: Span) -> TExpr {
        if let ExprKind::Identifier(name) = &func.kind {
            if let Some(Resolved::Builtin(builtin @ (Builtin::Len | Builtin::Println))) =
                self.resolve(name)
            {
                return self.check_special_call(builtin, func.span.clone(), args, span);
            }
        }

        let callee = self.check_expr(func, None);
        let signature = match &callee.ty {
            Type::Func { params, results } => Some((params.clone(), results.clone())),
            Type::Poison => None,
            other => {
                self.error(
                    DiagCode::NotCallable,
                    format!("a value of type '{}' is not callable", other),
                    callee.span.clone(),
                );
                None
            }
        };

        let Some((params, results)) = signature else {
            let args = args.iter().map(|a| self.check_expr(a, None)).collect();
            return Self::call(callee, args, Type::Poison, span);
        };

        let args: Vec<TExpr> = args
            .iter()
            .enumerate()
            .map(|(i, a)| self.check_expr(a, params.get(i)))
            .collect();

        if args.len() != params.len() {
            self.error(
                DiagCode::ArgumentCount,
                format!(
                    "expected {} argument(s), found {}",
                    params.len(),
                    args.len()
                ),
                span.clone(),
            );
            return Self::call(callee, args, Type::Poison, span);
        }

        let mut ok = true;
        for (i, (arg, param)) in args.iter().zip(&params).enumerate() {
            ok &= self.expect_type(param, &arg.ty, &format!("argument {}", i + 1), arg.span.clone());
        }

        let ty = if ok && !args.iter().any(|a| a.ty.is_poison()) {
            Type::from_results(&results)
        } else {
            Type::Poison
        };
        Self::call(callee, args, ty, span)
    }

    /// `len(s)` and `println(x)` accept operands of several types
    fn check_special_call(
        &mut self,
        builtin: Builtin,
        callee_span: Span,
        args: &[Expr],
        span: Span,
    ) -> TExpr {
        let args: Vec<TExpr> = args.iter().map(|a| self.check_expr(a, None)).collect();
        let results = match builtin {
            Builtin::Len => vec![Type::Int],
            _ => Vec::new(),
        };
        let callee = TExpr::new(
            TExprKind::Builtin(builtin),
            Type::Func {
                params: args.iter().map(|a| a.ty.clone()).collect(),
                results: results.clone(),
            },
            callee_span,
        );

        if args.len() != 1 {
            self.error(
                DiagCode::ArgumentCount,
                format!("'{}' expects 1 argument, found {}", builtin.name(), args.len()),
                span.clone(),
            );
            return Self::call(callee, args, Type::Poison, span);
        }

        let arg_ty = args[0].ty.clone();
        let ty = if arg_ty.is_poison() {
            Type::Poison
        } else if builtin == Builtin::Len && arg_ty.element().is_none() {
            self.error(
                DiagCode::TypeMismatch,
                format!("'len' expects a sequence, found '{}'", arg_ty),
                args[0].span.clone(),
            );
            Type::Poison
        } else {
            Type::from_results(&results)
        };
        Self::call(callee, args, ty, span)
    }

    fn call(callee: TExpr, args: Vec<TExpr>, ty: Type, span: Span) -> TExpr {
        TExpr::new(
            TExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            ty,
            span,
        )
    }

    pub(crate) fn check_closure(
        &mut self,
        closure: &Closure,
        source: ParamSource<'_>,
        span: Span,
    ) -> TExpr {
        self.push_scope();

        let mut params = Vec::with_capacity(closure.params.len());
        for (i, param) in closure.params.iter().enumerate() {
            let ty = match (&param.ty, source) {
                (Some(annotation), _) => self.resolve_type(annotation, &param.span),
                (None, ParamSource::Element(element)) => element.clone(),
                (None, ParamSource::Silent) => Type::Poison,
                (None, ParamSource::Signature(types)) if i < types.len() => types[i].clone(),
                (None, _) => {
                    self.report(
                        Diagnostic::new(
                            DiagCode::CannotInfer,
                            format!("cannot infer the type of parameter '{}'", param.name),
                            param.span.clone(),
                        )
                        .with_help(format!("annotate it, e.g. ({}: int) -> ...", param.name)),
                    );
                    Type::Poison
                }
            };
            self.declare(&param.name, ty.clone(), false);
            params.push(TParam {
                name: param.name.clone(),
                ty,
                span: param.span.clone(),
            });
        }

        let (results, body) = match &closure.body {
            ClosureBody::Block(stmts) => {
                let results: Vec<Type> = closure
                    .return_type
                    .iter()
                    .flatten()
                    .map(|r| self.resolve_type(r, &span))
                    .collect();

                self.push_results(results.clone());
                let body = self.check_block(stmts);
                self.pop_results();

                if !results.is_empty() && !always_returns(&body) {
                    self.error(
                        DiagCode::MissingReturn,
                        "closure does not return on every path",
                        span.clone(),
                    );
                }
                (results, body)
            }
            ClosureBody::Expr(expr) => {
                let value = self.check_expr(expr, None);
                let stmt_span = value.span.clone();
                if value.ty == Type::Unit {
                    let stmt = TStmt {
                        kind: TStmtKind::Expr(value),
                        span: stmt_span,
                    };
                    (Vec::new(), vec![stmt])
                } else {
                    let results = value.ty.clone().into_results();
                    let stmt = TStmt {
                        kind: TStmtKind::Return(vec![value]),
                        span: stmt_span,
                    };
                    (results, vec![stmt])
                }
            }
        };

        self.pop_scope();

        let ty = Type::Func {
            params: params.iter().map(|p| p.ty.clone()).collect(),
            results: results.clone(),
        };
        TExpr::new(
            TExprKind::Closure(TClosure {
                params,
                results,
                body,
                captures: closure.captured_vars.clone(),
            }),
            ty,
            span,
        )
    }
}
