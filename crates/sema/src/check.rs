// Semantic validation: program, function and statement level
//
// The checker walks the syntax tree once, resolving names through a stack
// of lexical scopes and assigning a `Type` to every expression. Errors are
// collected rather than returned so a whole unit is reported at once;
// rejected expressions are typed `Type::Poison` and never diagnosed again.

use crate::builtins::Builtin;
use crate::typed::{TExpr, TFunction, TParam, TProgram, TStmt, TStmtKind, always_returns};
use crate::types::Type;
use diagnostics::{DiagCode, Diagnostic, Span, TypeShape};
use parser::ast::{Expr, FunctionDef, Program, Stmt, StmtKind, TypeExpr};
use std::collections::HashMap;
use tracing::debug;

/// Result of validating one unit
#[derive(Debug, Clone, PartialEq)]
pub struct Checked {
    pub program: TProgram,
    pub diagnostics: Vec<Diagnostic>,
}

impl Checked {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Validate a parsed program and build its typed tree
pub fn check_program(program: &Program) -> Checked {
    let mut checker = Checker::default();
    checker.collect_signatures(program);

    let functions = program
        .functions
        .iter()
        .map(|function| checker.check_function(function))
        .collect();

    debug!(
        functions = program.functions.len(),
        diagnostics = checker.diagnostics.len(),
        "semantic check finished"
    );

    Checked {
        program: TProgram { functions },
        diagnostics: checker.diagnostics,
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LocalInfo {
    pub ty: Type,
    pub is_const: bool,
}

/// What a name resolves to
pub(crate) enum Resolved {
    Local(Type),
    Function(Type),
    Builtin(Builtin),
}

#[derive(Default)]
pub(crate) struct Checker {
    functions: HashMap<String, Type>,
    scopes: Vec<HashMap<String, LocalInfo>>,
    /// Expected results of the enclosing function or block closure
    results: Vec<Vec<Type>>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Checker {
    pub fn error(&mut self, code: DiagCode, message: impl Into<String>, span: Span) {
        self.diagnostics.push(Diagnostic::new(code, message, span));
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    // ==================== SCOPES ====================

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn declare(&mut self, name: &str, ty: Type, is_const: bool) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), LocalInfo { ty, is_const });
        }
    }

    fn local(&self, name: &str) -> Option<&LocalInfo> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Locals shadow functions, functions shadow builtins
    pub fn resolve(&self, name: &str) -> Option<Resolved> {
        if let Some(info) = self.local(name) {
            return Some(Resolved::Local(info.ty.clone()));
        }
        if let Some(ty) = self.functions.get(name) {
            return Some(Resolved::Function(ty.clone()));
        }
        Builtin::lookup(name).map(Resolved::Builtin)
    }

    pub fn push_results(&mut self, results: Vec<Type>) {
        self.results.push(results);
    }

    pub fn pop_results(&mut self) {
        self.results.pop();
    }

    // ==================== TYPES ====================

    pub fn resolve_type(&mut self, ty: &TypeExpr, span: &Span) -> Type {
        match ty {
            TypeExpr::Named(name) => match name.as_str() {
                "int" => Type::Int,
                "bool" => Type::Bool,
                "string" => Type::Str,
                other => {
                    self.error(
                        DiagCode::UndefinedSymbol,
                        format!("unknown type '{}'", other),
                        span.clone(),
                    );
                    Type::Poison
                }
            },
            TypeExpr::Seq(element) => {
                let element = self.resolve_type(element, span);
                Type::seq(element)
            }
            TypeExpr::Func { params, results } => Type::Func {
                params: params.iter().map(|p| self.resolve_type(p, span)).collect(),
                results: results.iter().map(|r| self.resolve_type(r, span)).collect(),
            },
        }
    }

    /// Report a mismatch unless either side is already poisoned
    pub fn expect_type(&mut self, expected: &Type, found: &Type, what: &str, span: Span) -> bool {
        if expected.contains_poison() || found.contains_poison() || expected == found {
            return true;
        }
        self.error(
            DiagCode::TypeMismatch,
            format!("{}: expected '{}', found '{}'", what, expected, found),
            span,
        );
        false
    }

    // ==================== FUNCTIONS ====================

    fn collect_signatures(&mut self, program: &Program) {
        for function in &program.functions {
            let params = function
                .params
                .iter()
                .map(|p| match &p.ty {
                    Some(ty) => self.resolve_type(ty, &p.span),
                    None => Type::Poison,
                })
                .collect();
            let results = function
                .return_type
                .iter()
                .map(|r| self.resolve_type(r, &function.span))
                .collect();
            self.functions
                .insert(function.name.clone(), Type::Func { params, results });
        }
    }

    fn signature(&self, name: &str) -> (Vec<Type>, Vec<Type>) {
        match self.functions.get(name) {
            Some(Type::Func { params, results }) => (params.clone(), results.clone()),
            _ => (Vec::new(), Vec::new()),
        }
    }

    fn check_function(&mut self, function: &FunctionDef) -> TFunction {
        let (param_types, results) = self.signature(&function.name);

        if function.name == "main" && !function.params.is_empty() {
            self.error(
                DiagCode::InvalidMain,
                "'main' must not take parameters",
                function.span.clone(),
            );
        }

        self.push_scope();
        let params: Vec<TParam> = function
            .params
            .iter()
            .zip(param_types)
            .map(|(p, ty)| {
                self.declare(&p.name, ty.clone(), false);
                TParam {
                    name: p.name.clone(),
                    ty,
                    span: p.span.clone(),
                }
            })
            .collect();

        self.push_results(results.clone());
        let body = self.check_block(&function.body);
        self.pop_results();
        self.pop_scope();

        if !results.is_empty() && !always_returns(&body) {
            self.report(
                Diagnostic::new(
                    DiagCode::MissingReturn,
                    format!("function '{}' does not return on every path", function.name),
                    function.span.clone(),
                )
                .with_help("add a return statement at the end of the function"),
            );
        }

        debug!(function = %function.name, "checked function");

        TFunction {
            name: function.name.clone(),
            params,
            results,
            body,
            span: function.span.clone(),
        }
    }

    // ==================== STATEMENTS ====================

    /// Check statements in a fresh scope
    pub fn check_block(&mut self, stmts: &[Stmt]) -> Vec<TStmt> {
        self.push_scope();
        let checked = stmts.iter().filter_map(|s| self.check_stmt(s)).collect();
        self.pop_scope();
        checked
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> Option<TStmt> {
        let span = stmt.span.clone();
        let kind = match &stmt.kind {
            StmtKind::VariableDecl {
                name,
                type_hint,
                value,
                is_const,
            } => {
                let hint = type_hint.as_ref().map(|t| self.resolve_type(t, &span));
                let value = self.check_expr(value, hint.as_ref());
                let ty = match hint {
                    Some(hint) => {
                        self.expect_type(
                            &hint,
                            &value.ty,
                            &format!("initializer of '{}'", name),
                            value.span.clone(),
                        );
                        hint
                    }
                    None => value.ty.clone(),
                };
                self.declare(name, ty.clone(), *is_const);
                TStmtKind::Let {
                    name: name.clone(),
                    ty,
                    value,
                    is_const: *is_const,
                }
            }

            StmtKind::Assignment { target, value } => {
                let info = self.local(target).cloned();
                let expected = info.as_ref().map(|i| i.ty.clone());
                let value = self.check_expr(value, expected.as_ref());
                match info {
                    Some(info) if info.is_const => {
                        self.report(
                            Diagnostic::new(
                                DiagCode::ConstAssignment,
                                format!("cannot assign twice to constant '{}'", target),
                                span.clone(),
                            )
                            .with_help("declare it with 'var' to make it mutable"),
                        );
                    }
                    Some(info) => {
                        self.expect_type(
                            &info.ty,
                            &value.ty,
                            &format!("assignment to '{}'", target),
                            value.span.clone(),
                        );
                    }
                    None => {
                        self.error(
                            DiagCode::UndefinedSymbol,
                            format!("cannot assign to undeclared variable '{}'", target),
                            span.clone(),
                        );
                    }
                }
                TStmtKind::Assign {
                    name: target.clone(),
                    value,
                }
            }

            StmtKind::If {
                condition,
                then_block,
                else_block,
            } => {
                let condition = self.check_condition(condition, "if");
                let then_block = self.check_block(then_block);
                let else_block = else_block
                    .as_ref()
                    .map(|b| self.check_block(b))
                    .unwrap_or_default();
                TStmtKind::If {
                    condition,
                    then_block,
                    else_block,
                }
            }

            StmtKind::While { condition, body } => {
                let condition = self.check_condition(condition, "while");
                let body = self.check_block(body);
                TStmtKind::While { condition, body }
            }

            StmtKind::Return { values } => self.check_return(values, &span),

            StmtKind::Expr(expr) => TStmtKind::Expr(self.check_expr(expr, None)),

            // Already reported by the parser
            StmtKind::Error => return None,
        };
        Some(TStmt { kind, span })
    }

    fn check_condition(&mut self, condition: &Expr, what: &str) -> TExpr {
        let condition = self.check_expr(condition, None);
        self.expect_type(
            &Type::Bool,
            &condition.ty,
            &format!("'{}' condition", what),
            condition.span.clone(),
        );
        condition
    }

    fn check_return(&mut self, values: &[Expr], span: &Span) -> TStmtKind {
        let expected = self.results.last().cloned().unwrap_or_default();

        // A single call may supply all results at once
        let hints: Vec<Option<&Type>> = if values.len() == expected.len() {
            expected.iter().map(Some).collect()
        } else {
            vec![None; values.len()]
        };
        let values: Vec<_> = values
            .iter()
            .zip(hints)
            .map(|(v, hint)| self.check_expr(v, hint))
            .collect();

        let found: Vec<Type> = match values.as_slice() {
            [single] if expected.len() > 1 => single.ty.clone().into_results(),
            _ => values.iter().map(|v| v.ty.clone()).collect(),
        };

        if found.iter().any(Type::is_poison) {
            return TStmtKind::Return(values);
        }

        if found.len() != expected.len() {
            self.error(
                DiagCode::ReturnMismatch,
                format!(
                    "expected {} return value(s), found {}",
                    expected.len(),
                    found.len()
                ),
                span.clone(),
            );
        } else if let Some((want, got)) = expected.iter().zip(&found).find(|(w, g)| w != g) {
            self.error(
                DiagCode::ReturnMismatch,
                format!("return type mismatch: expected '{}', found '{}'", want, got),
                span.clone(),
            );
        }

        TStmtKind::Return(values)
    }
}
