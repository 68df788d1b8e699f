use crate::ast::{
    BinaryOp, Closure, ClosureBody, Expr, ExprKind, FunctionDef, Literal, Param, Program, Span,
    Stmt, StmtKind, TypeExpr, UnaryOp,
};
use crate::closure_analysis;
use crate::error;
use crate::operators::climb;
use chumsky::prelude::*;
use chumsky::{BoxedParser, Stream};
use diagnostics::Diagnostic;
use lexer::Spanned;
use lexer::token::Token;

type P<'a, O> = BoxedParser<'a, Token, O, Simple<Token>>;

/// Builtin type names accepted in annotations
const TYPE_NAMES: [&str; 3] = ["int", "string", "bool"];

/// Result of parsing one unit: the tree (with `Error` placeholders where
/// recovery happened) and the syntax diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub program: Program,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse a spanned token stream produced by `lexer::lex`
pub fn parse(tokens: Vec<Spanned>, source_len: usize) -> Parsed {
    let eoi = source_len..source_len + 1;
    let (program, errors) = parser().parse_recovery(Stream::from_iter(eoi, tokens.into_iter()));

    let mut program = program.unwrap_or(Program {
        functions: Vec::new(),
    });
    closure_analysis::analyze_closures(&mut program);

    Parsed {
        program,
        diagnostics: errors.into_iter().map(error::to_diagnostic).collect(),
    }
}

pub fn parser<'a>() -> P<'a, Program> {
    function_parser()
        .recover_with(skip_then_retry_until([]))
        .repeated()
        .then_ignore(end())
        .map(|functions| Program { functions })
        .boxed()
}

fn ident<'a>() -> P<'a, String> {
    select! { Token::Identifier(name) => name }.boxed()
}

fn type_parser<'a>() -> P<'a, TypeExpr> {
    recursive(|ty| {
        let named = select! {
            Token::Identifier(name) if TYPE_NAMES.contains(&name.as_str()) => TypeExpr::Named(name)
        };

        let seq = ty
            .clone()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(|element| TypeExpr::Seq(Box::new(element)));

        let func = just(Token::Fn)
            .ignore_then(
                ty.clone()
                    .separated_by(just(Token::Comma))
                    .allow_trailing()
                    .delimited_by(just(Token::LParen), just(Token::RParen)),
            )
            .then(
                just(Token::Arrow)
                    .ignore_then(result_types(ty.boxed()))
                    .or_not(),
            )
            .map(|(params, results)| TypeExpr::Func {
                params,
                results: results.unwrap_or_default(),
            });

        named.or(seq).or(func)
    })
    .boxed()
}

/// Result list after `->`: a single type or a parenthesised list
fn result_types<'a>(ty: P<'a, TypeExpr>) -> P<'a, Vec<TypeExpr>> {
    ty.clone()
        .map(|t| vec![t])
        .or(ty
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .delimited_by(just(Token::LParen), just(Token::RParen)))
        .boxed()
}

fn block_parser<'a>(stmt: P<'a, Stmt>) -> P<'a, Vec<Stmt>> {
    stmt.repeated()
        .delimited_by(just(Token::LBrace), just(Token::RBrace))
        .recover_with(nested_delimiters(
            Token::LBrace,
            Token::RBrace,
            [
                (Token::LParen, Token::RParen),
                (Token::LBracket, Token::RBracket),
            ],
            |span: Span| vec![Stmt::new(StmtKind::Error, span)],
        ))
        .boxed()
}

fn stmt_parser<'a>() -> P<'a, Stmt> {
    recursive(|stmt| {
        let stmt = stmt.boxed();
        let expr = expr_parser(stmt.clone());
        let block = block_parser(stmt);
        let ty = type_parser();

        // var x := 1, const y: int = 2, var empty: [int] := []
        let decl = just(Token::Var)
            .to(false)
            .or(just(Token::Const).to(true))
            .then(ident())
            .then(
                // Path 1: Explicit (: int =)
                just(Token::Colon)
                    .ignore_then(ty)
                    .then_ignore(just(Token::Eq).or(just(Token::ColonEq)))
                    .map(Some)
                    // Path 2: Inference (:=)
                    .or(just(Token::ColonEq).to(None)),
            )
            .then(expr.clone())
            .map(
                |(((is_const, name), type_hint), value)| StmtKind::VariableDecl {
                    name,
                    type_hint,
                    value,
                    is_const,
                },
            );

        // doubled := numbers |> double
        let short_decl = ident()
            .then_ignore(just(Token::ColonEq))
            .then(expr.clone())
            .map(|(name, value)| StmtKind::VariableDecl {
                name,
                type_hint: None,
                value,
                is_const: false,
            });

        let assignment = ident()
            .then_ignore(just(Token::Eq))
            .then(expr.clone())
            .map(|(target, value)| StmtKind::Assignment { target, value });

        let if_stmt = just(Token::If)
            .ignore_then(expr.clone())
            .then(block.clone())
            .then(just(Token::Else).ignore_then(block.clone()).or_not())
            .map(|((condition, then_block), else_block)| StmtKind::If {
                condition,
                then_block,
                else_block,
            });

        let while_stmt = just(Token::While)
            .ignore_then(expr.clone())
            .then(block)
            .map(|(condition, body)| StmtKind::While { condition, body });

        // Supports: return, return x, return x, y
        let return_stmt = just(Token::Return)
            .ignore_then(expr.clone().separated_by(just(Token::Comma)))
            .map(|values| StmtKind::Return { values });

        let expr_stmt = expr.map(StmtKind::Expr);

        decl.or(short_decl)
            .or(assignment)
            .or(if_stmt)
            .or(while_stmt)
            .or(return_stmt)
            .or(expr_stmt)
            .map_with_span(Stmt::new)
            .then_ignore(just(Token::Semicolon).or_not())
    })
    .boxed()
}

fn expr_parser<'a>(stmt: P<'a, Stmt>) -> P<'a, Expr> {
    recursive(move |expr| {
        let ty = type_parser();

        let literal = select! {
            Token::Int(n) => ExprKind::Literal(Literal::Int(n)),
            Token::Str(s) => ExprKind::Literal(Literal::String(s)),
            Token::True => ExprKind::Literal(Literal::Bool(true)),
            Token::False => ExprKind::Literal(Literal::Bool(false)),
        }
        .map_with_span(Expr::new);

        let identifier = ident().map(ExprKind::Identifier).map_with_span(Expr::new);

        // Closure parameters: x, x: int
        let param = ident()
            .then(just(Token::Colon).ignore_then(ty.clone()).or_not())
            .map_with_span(|(name, ty), span| Param { name, ty, span });

        let param_list = param
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        // Block closures annotate every parameter, so `if (ok) { ... }` stays a condition
        let typed_param = ident()
            .then_ignore(just(Token::Colon))
            .then(ty.clone())
            .map_with_span(|(name, ty), span| Param {
                name,
                ty: Some(ty),
                span,
            });

        // (x: int) -> int { return x * 3 }, (x: int) { println(x) }
        let block_closure = typed_param
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .then(
                just(Token::Arrow)
                    .ignore_then(result_types(ty.clone()))
                    .or_not(),
            )
            .then(block_parser(stmt.clone()))
            .map_with_span(|((params, results), body), span| {
                Expr::new(
                    ExprKind::Closure(Closure {
                        params,
                        return_type: Some(results.unwrap_or_default()),
                        body: ClosureBody::Block(body),
                        captured_vars: Vec::new(),
                    }),
                    span,
                )
            });

        // x -> x * 2, (acc, x) -> acc + x
        // The body extends as far to the right as possible
        let expr_closure = param_list
            .or(param.map(|p| vec![p]))
            .then_ignore(just(Token::Arrow))
            .then(expr.clone())
            .map_with_span(|(params, body), span| {
                Expr::new(
                    ExprKind::Closure(Closure {
                        params,
                        return_type: None,
                        body: ClosureBody::Expr(Box::new(body)),
                        captured_vars: Vec::new(),
                    }),
                    span,
                )
            });

        // Typed empty sequence: []int, [][string]
        let typed_empty = just(Token::LBracket)
            .then(just(Token::RBracket))
            .ignore_then(ty)
            .map_with_span(|element_type, span| {
                Expr::new(
                    ExprKind::Array {
                        elements: Vec::new(),
                        element_type: Some(element_type),
                    },
                    span,
                )
            });

        let array_literal = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map_with_span(|elements, span| {
                Expr::new(
                    ExprKind::Array {
                        elements,
                        element_type: None,
                    },
                    span,
                )
            })
            .recover_with(nested_delimiters(
                Token::LBracket,
                Token::RBracket,
                [
                    (Token::LParen, Token::RParen),
                    (Token::LBrace, Token::RBrace),
                ],
                |span: Span| Expr::new(ExprKind::Error, span),
            ));

        let parenthesized = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map_with_span(|inner: Expr, span| Expr::new(inner.kind, span))
            .recover_with(nested_delimiters(
                Token::LParen,
                Token::RParen,
                [
                    (Token::LBracket, Token::RBracket),
                    (Token::LBrace, Token::RBrace),
                ],
                |span: Span| Expr::new(ExprKind::Error, span),
            ));

        // Closures must be tried BEFORE identifiers and parentheses
        let atom = block_closure
            .or(expr_closure)
            .or(literal)
            .or(identifier)
            .or(typed_empty)
            .or(array_literal)
            .or(parenthesized)
            .boxed();

        #[derive(Clone)]
        enum Postfix {
            Call(Vec<Expr>),
            Index(Expr),
        }

        let call_args = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map_with_span(|args, span: Span| (Postfix::Call(args), span));

        let index = expr
            .clone()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map_with_span(|index, span: Span| (Postfix::Index(index), span));

        let postfix = atom
            .then(call_args.or(index).repeated())
            .foldl(|lhs, (op, op_span)| {
                let span = lhs.span.start..op_span.end;
                match op {
                    Postfix::Call(args) => Expr::new(
                        ExprKind::Call {
                            func: Box::new(lhs),
                            args,
                        },
                        span,
                    ),
                    Postfix::Index(index) => Expr::new(
                        ExprKind::Index {
                            array: Box::new(lhs),
                            index: Box::new(index),
                        },
                        span,
                    ),
                }
            })
            .boxed();

        let unary = just(Token::Minus)
            .to(UnaryOp::Negate)
            .or(just(Token::Not).to(UnaryOp::Not))
            .map_with_span(|op, span: Span| (op, span))
            .repeated()
            .then(postfix)
            .foldr(|(op, op_span), expr| {
                let span = op_span.start..expr.span.end;
                Expr::new(
                    ExprKind::Unary {
                        op,
                        expr: Box::new(expr),
                    },
                    span,
                )
            })
            .boxed();

        let binary_op = select! {
            Token::PipeMap => BinaryOp::Map,
            Token::Or => BinaryOp::LogicalOr,
            Token::And => BinaryOp::LogicalAnd,
            Token::DoubleEq => BinaryOp::Eq,
            Token::NotEq => BinaryOp::NotEq,
            Token::Lt => BinaryOp::Lt,
            Token::Gt => BinaryOp::Gt,
            Token::LtEq => BinaryOp::LtEq,
            Token::GtEq => BinaryOp::GtEq,
            Token::Pipe => BinaryOp::BitOr,
            Token::Caret => BinaryOp::BitXor,
            Token::Ampersand => BinaryOp::BitAnd,
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
            Token::Star => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
            Token::Percent => BinaryOp::Mod,
            Token::Pow => BinaryOp::Pow,
        };

        // Operands are collected flat and grouped by the operator table
        unary
            .clone()
            .then(binary_op.then(unary).repeated())
            .map(|(first, rest)| climb(first, rest))
    })
    .boxed()
}

fn function_parser<'a>() -> P<'a, FunctionDef> {
    let ty = type_parser();

    // Parameters: (name: type, name: type)
    let param = ident()
        .then_ignore(just(Token::Colon))
        .then(ty.clone())
        .map_with_span(|(name, ty), span| Param {
            name,
            ty: Some(ty),
            span,
        });

    just(Token::Function)
        .ignore_then(ident())
        .then(
            param
                .separated_by(just(Token::Comma))
                .allow_trailing()
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        )
        .then(
            // Return type: -> type or -> (type1, type2); omitted for void functions
            just(Token::Arrow).ignore_then(result_types(ty)).or_not(),
        )
        .then(block_parser(stmt_parser()))
        .map_with_span(|(((name, params), return_type), body), span| FunctionDef {
            name,
            params,
            return_type: return_type.unwrap_or_default(),
            body,
            span,
        })
        .boxed()
}
