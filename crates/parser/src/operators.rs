// Binary operator table
//
// One entry per operator: display symbol, precedence rank, associativity and
// the operand rule both type checkers apply. The parser folds binary
// expressions by precedence climbing over this table; pretty printers and
// error formatters read the symbol and rank from here as well.
//
// Ranks form a total order in which `|>` (rank 1) is strictly lower than
// every other operator.

use crate::ast::{BinaryOp, Expr, ExprKind, Span};
use diagnostics::OperandRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorSpec {
    pub op: BinaryOp,
    pub symbol: &'static str,
    /// Higher binds tighter
    pub precedence: u8,
    pub assoc: Assoc,
    pub rule: OperandRule,
}

const fn spec(
    op: BinaryOp,
    symbol: &'static str,
    precedence: u8,
    assoc: Assoc,
    rule: OperandRule,
) -> OperatorSpec {
    OperatorSpec {
        op,
        symbol,
        precedence,
        assoc,
        rule,
    }
}

pub static OPERATORS: [OperatorSpec; 18] = [
    spec(BinaryOp::Map, "|>", 1, Assoc::Left, OperandRule::Map),
    spec(BinaryOp::LogicalOr, "||", 2, Assoc::Left, OperandRule::Logical),
    spec(BinaryOp::LogicalAnd, "&&", 3, Assoc::Left, OperandRule::Logical),
    spec(BinaryOp::Eq, "==", 4, Assoc::Left, OperandRule::Equality),
    spec(BinaryOp::NotEq, "!=", 4, Assoc::Left, OperandRule::Equality),
    spec(BinaryOp::Lt, "<", 4, Assoc::Left, OperandRule::Ordering),
    spec(BinaryOp::Gt, ">", 4, Assoc::Left, OperandRule::Ordering),
    spec(BinaryOp::LtEq, "<=", 4, Assoc::Left, OperandRule::Ordering),
    spec(BinaryOp::GtEq, ">=", 4, Assoc::Left, OperandRule::Ordering),
    spec(BinaryOp::BitOr, "|", 5, Assoc::Left, OperandRule::Integer),
    spec(BinaryOp::BitXor, "^", 6, Assoc::Left, OperandRule::Integer),
    spec(BinaryOp::BitAnd, "&", 7, Assoc::Left, OperandRule::Integer),
    spec(BinaryOp::Add, "+", 8, Assoc::Left, OperandRule::Additive),
    spec(BinaryOp::Sub, "-", 8, Assoc::Left, OperandRule::Integer),
    spec(BinaryOp::Mul, "*", 9, Assoc::Left, OperandRule::Integer),
    spec(BinaryOp::Div, "/", 9, Assoc::Left, OperandRule::Integer),
    spec(BinaryOp::Mod, "%", 9, Assoc::Left, OperandRule::Integer),
    spec(BinaryOp::Pow, "**", 10, Assoc::Right, OperandRule::Integer),
];

impl BinaryOp {
    pub fn spec(&self) -> &'static OperatorSpec {
        match self {
            BinaryOp::Map => &OPERATORS[0],
            BinaryOp::LogicalOr => &OPERATORS[1],
            BinaryOp::LogicalAnd => &OPERATORS[2],
            BinaryOp::Eq => &OPERATORS[3],
            BinaryOp::NotEq => &OPERATORS[4],
            BinaryOp::Lt => &OPERATORS[5],
            BinaryOp::Gt => &OPERATORS[6],
            BinaryOp::LtEq => &OPERATORS[7],
            BinaryOp::GtEq => &OPERATORS[8],
            BinaryOp::BitOr => &OPERATORS[9],
            BinaryOp::BitXor => &OPERATORS[10],
            BinaryOp::BitAnd => &OPERATORS[11],
            BinaryOp::Add => &OPERATORS[12],
            BinaryOp::Sub => &OPERATORS[13],
            BinaryOp::Mul => &OPERATORS[14],
            BinaryOp::Div => &OPERATORS[15],
            BinaryOp::Mod => &OPERATORS[16],
            BinaryOp::Pow => &OPERATORS[17],
        }
    }

    pub fn symbol(&self) -> &'static str {
        self.spec().symbol
    }

    pub fn precedence(&self) -> u8 {
        self.spec().precedence
    }

    pub fn rule(&self) -> OperandRule {
        self.spec().rule
    }

    /// Operator spelled by `symbol`, if any
    pub fn from_symbol(symbol: &str) -> Option<BinaryOp> {
        OPERATORS.iter().find(|s| s.symbol == symbol).map(|s| s.op)
    }
}

/// Fold `first (op operand)*` into a tree by precedence climbing
pub fn climb(first: Expr, rest: Vec<(BinaryOp, Expr)>) -> Expr {
    let mut rest = rest.into_iter().peekable();
    climb_from(first, &mut rest, 0)
}

fn climb_from<I>(mut lhs: Expr, rest: &mut std::iter::Peekable<I>, min_prec: u8) -> Expr
where
    I: Iterator<Item = (BinaryOp, Expr)>,
{
    while let Some((op, mut rhs)) = rest.next_if(|(op, _)| op.precedence() >= min_prec) {
        let spec = op.spec();

        // Let tighter operators (or a right-associative chain of the same
        // rank) claim the right operand first
        while let Some(next) = rest.peek().map(|(next, _)| next.spec()) {
            let next_min = if next.precedence > spec.precedence {
                spec.precedence + 1
            } else if next.precedence == spec.precedence && next.assoc == Assoc::Right {
                spec.precedence
            } else {
                break;
            };
            rhs = climb_from(rhs, rest, next_min);
        }

        let span: Span = lhs.span.start..rhs.span.end;
        lhs = Expr::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        );
    }
    lhs
}
