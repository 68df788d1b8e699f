// Operand validation rules shared by both type systems
//
// Every binary operator names one `OperandRule` in the operator table. The
// front-end validator and the IR re-validator each call `check_binary` with
// their own type representation, so identical misuse yields identical codes
// no matter which path built the expression.

use crate::DiagCode;
use std::fmt;
use thiserror::Error;

/// The view of a type descriptor that operand rules need
///
/// Equality is structural identity.
pub trait TypeShape: Clone + PartialEq + fmt::Display {
    fn poison() -> Self;
    fn is_poison(&self) -> bool;
    /// Whether this type or any component of it is poisoned
    fn contains_poison(&self) -> bool;

    fn int() -> Self;
    fn boolean() -> Self;
    fn string() -> Self;
    fn sequence(element: Self) -> Self;

    fn as_sequence(&self) -> Option<&Self>;
    /// Parameter and result types of a callable
    fn as_callable(&self) -> Option<(&[Self], &[Self])>;

    fn is_int(&self) -> bool {
        *self == Self::int()
    }

    fn is_bool(&self) -> bool {
        *self == Self::boolean()
    }

    fn is_string(&self) -> bool {
        *self == Self::string()
    }
}

/// How an operator's operands are validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandRule {
    /// int + int, or string + string
    Additive,
    /// int with int
    Integer,
    /// equal types of int, bool or string; yields bool
    Equality,
    /// int or string on both sides; yields bool
    Ordering,
    /// bool with bool
    Logical,
    /// sequence of E with a callable E -> U; yields a sequence of U
    Map,
}

impl OperandRule {
    /// Whether the rule unifies both operands to one common type
    pub fn is_homogeneous(&self) -> bool {
        !matches!(self, OperandRule::Map)
    }
}

/// Which operand a rejection is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blame {
    Left,
    Right,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperandError {
    #[error("left operand of '{symbol}' must be a sequence, found '{got}'")]
    WrongLeftRole { symbol: &'static str, got: String },

    #[error("right operand of '{symbol}' must be a callable, found '{got}'")]
    WrongRightRole { symbol: &'static str, got: String },

    #[error(
        "callable on the right of '{symbol}' must take exactly 1 parameter and return exactly 1 result, found {params} parameter(s) and {results} result(s)"
    )]
    ArityMismatch {
        symbol: &'static str,
        params: usize,
        results: usize,
    },

    #[error(
        "callable on the right of '{symbol}' takes '{param}' but the sequence elements are '{element}'"
    )]
    ElementTypeMismatch {
        symbol: &'static str,
        param: String,
        element: String,
    },

    #[error("operator '{symbol}' cannot be applied to '{lhs}' and '{rhs}'")]
    InvalidOperands {
        symbol: &'static str,
        lhs: String,
        rhs: String,
    },
}

impl OperandError {
    pub fn code(&self) -> DiagCode {
        match self {
            OperandError::WrongLeftRole { .. } => DiagCode::MapWrongLeftRole,
            OperandError::WrongRightRole { .. } => DiagCode::MapWrongRightRole,
            OperandError::ArityMismatch { .. } => DiagCode::MapArityMismatch,
            OperandError::ElementTypeMismatch { .. } => DiagCode::MapElementTypeMismatch,
            OperandError::InvalidOperands { .. } => DiagCode::InvalidOperands,
        }
    }

    pub fn blame(&self) -> Blame {
        match self {
            OperandError::WrongLeftRole { .. } => Blame::Left,
            OperandError::WrongRightRole { .. }
            | OperandError::ArityMismatch { .. }
            | OperandError::ElementTypeMismatch { .. } => Blame::Right,
            OperandError::InvalidOperands { .. } => Blame::Both,
        }
    }

    pub fn help(&self) -> Option<&'static str> {
        match self {
            OperandError::WrongLeftRole { .. } => {
                Some("'|>' applies a function to every element of a sequence such as [1, 2, 3]")
            }
            OperandError::WrongRightRole { .. } => {
                Some("the right side must be a function or closure, e.g. (x -> x * 2)")
            }
            OperandError::ArityMismatch { .. } => {
                Some("wrap the function in a closure taking one element and returning one value")
            }
            OperandError::ElementTypeMismatch { .. } | OperandError::InvalidOperands { .. } => {
                None
            }
        }
    }
}

/// The type both operands of a homogeneous operator share, if any
pub fn common_operand_type<T: TypeShape>(lhs: &T, rhs: &T) -> Option<T> {
    if lhs == rhs { Some(lhs.clone()) } else { None }
}

/// Validate the operands of a binary operator and derive its result type
///
/// A poisoned operand yields a poisoned result without an error so that
/// consumers of an invalid value are not diagnosed again. A check that
/// compares types is skipped when poison appears anywhere in them.
pub fn check_binary<T: TypeShape>(
    rule: OperandRule,
    symbol: &'static str,
    lhs: &T,
    rhs: &T,
) -> Result<T, OperandError> {
    if lhs.is_poison() || rhs.is_poison() {
        return Ok(T::poison());
    }

    if rule == OperandRule::Map {
        return check_map(symbol, lhs, rhs);
    }

    if lhs.contains_poison() || rhs.contains_poison() {
        return Ok(T::poison());
    }

    let invalid = || OperandError::InvalidOperands {
        symbol,
        lhs: lhs.to_string(),
        rhs: rhs.to_string(),
    };

    let common = common_operand_type(lhs, rhs).ok_or_else(invalid)?;

    match rule {
        OperandRule::Additive if common.is_int() || common.is_string() => Ok(common),
        OperandRule::Integer if common.is_int() => Ok(common),
        OperandRule::Equality if common.is_int() || common.is_bool() || common.is_string() => {
            Ok(T::boolean())
        }
        OperandRule::Ordering if common.is_int() || common.is_string() => Ok(T::boolean()),
        OperandRule::Logical if common.is_bool() => Ok(common),
        _ => Err(invalid()),
    }
}

fn check_map<T: TypeShape>(symbol: &'static str, lhs: &T, rhs: &T) -> Result<T, OperandError> {
    let element = lhs.as_sequence().ok_or_else(|| OperandError::WrongLeftRole {
        symbol,
        got: lhs.to_string(),
    })?;

    let (params, results) = rhs.as_callable().ok_or_else(|| OperandError::WrongRightRole {
        symbol,
        got: rhs.to_string(),
    })?;

    let (param, result) = match (params, results) {
        ([param], [result]) => (param, result),
        _ => {
            return Err(OperandError::ArityMismatch {
                symbol,
                params: params.len(),
                results: results.len(),
            });
        }
    };

    // Roles and arity do not depend on component types; agreement does
    if param.contains_poison() || element.contains_poison() {
        return Ok(T::poison());
    }

    if param != element {
        return Err(OperandError::ElementTypeMismatch {
            symbol,
            param: param.to_string(),
            element: element.to_string(),
        });
    }

    Ok(T::sequence(result.clone()))
}
