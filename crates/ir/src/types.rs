// IR type descriptor
//
// Deliberately separate from the front-end `sema::Type`: IR passes (and
// IR built by hand) never see front-end types. Conversion happens once,
// in the translator.

use crate::error::{InternalError, IrResult};
use diagnostics::{Span, TypeShape};
use sema::Type;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FuncSig {
    pub params: Vec<IrType>,
    pub results: Vec<IrType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrType {
    I64,
    Bool,
    Str,
    Unit,
    Slice(Box<IrType>),
    Func(FuncSig),
    Tuple(Vec<IrType>),
    /// Written back by the re-validator where it rejects an expression
    Invalid,
}

impl IrType {
    pub fn slice(element: IrType) -> IrType {
        if element == IrType::Invalid {
            IrType::Invalid
        } else {
            IrType::Slice(Box::new(element))
        }
    }

    pub fn func(params: Vec<IrType>, results: Vec<IrType>) -> IrType {
        IrType::Func(FuncSig { params, results })
    }

    pub fn from_results(results: &[IrType]) -> IrType {
        match results {
            [] => IrType::Unit,
            [single] => single.clone(),
            many => IrType::Tuple(many.to_vec()),
        }
    }

    pub fn into_results(self) -> Vec<IrType> {
        match self {
            IrType::Unit => Vec::new(),
            IrType::Tuple(types) => types,
            other => vec![other],
        }
    }

    pub fn element(&self) -> Option<&IrType> {
        match self {
            IrType::Slice(element) => Some(element),
            _ => None,
        }
    }

    pub fn contains_invalid(&self) -> bool {
        match self {
            IrType::Invalid => true,
            IrType::Slice(element) => element.contains_invalid(),
            IrType::Func(sig) => sig
                .params
                .iter()
                .chain(&sig.results)
                .any(IrType::contains_invalid),
            IrType::Tuple(types) => types.iter().any(IrType::contains_invalid),
            IrType::I64 | IrType::Bool | IrType::Str | IrType::Unit => false,
        }
    }

    /// Convert a front-end type; poison must never reach the IR
    pub fn lower_from(ty: &Type, span: &Span) -> IrResult<IrType> {
        let convert_all = |types: &[Type]| -> IrResult<Vec<IrType>> {
            types.iter().map(|t| IrType::lower_from(t, span)).collect()
        };

        Ok(match ty {
            Type::Int => IrType::I64,
            Type::Bool => IrType::Bool,
            Type::Str => IrType::Str,
            Type::Unit => IrType::Unit,
            Type::Seq(element) => IrType::Slice(Box::new(IrType::lower_from(element, span)?)),
            Type::Func { params, results } => IrType::func(convert_all(params)?, convert_all(results)?),
            Type::Tuple(types) => IrType::Tuple(convert_all(types)?),
            Type::Poison => {
                return Err(InternalError::invariant(
                    "poisoned type reached IR translation",
                    span.clone(),
                ));
            }
        })
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[IrType]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", ty)?;
    }
    Ok(())
}

impl fmt::Display for FuncSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn(")?;
        write_list(f, &self.params)?;
        write!(f, ")")?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " -> {}", single),
            many => {
                write!(f, " -> (")?;
                write_list(f, many)?;
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::I64 => write!(f, "i64"),
            IrType::Bool => write!(f, "bool"),
            IrType::Str => write!(f, "str"),
            IrType::Unit => write!(f, "()"),
            IrType::Slice(element) => write!(f, "[]{}", element),
            IrType::Func(sig) => write!(f, "{}", sig),
            IrType::Tuple(types) => {
                write!(f, "(")?;
                write_list(f, types)?;
                write!(f, ")")
            }
            IrType::Invalid => write!(f, "<invalid>"),
        }
    }
}

impl TypeShape for IrType {
    fn poison() -> Self {
        IrType::Invalid
    }

    fn is_poison(&self) -> bool {
        matches!(self, IrType::Invalid)
    }

    fn contains_poison(&self) -> bool {
        self.contains_invalid()
    }

    fn int() -> Self {
        IrType::I64
    }

    fn boolean() -> Self {
        IrType::Bool
    }

    fn string() -> Self {
        IrType::Str
    }

    fn sequence(element: Self) -> Self {
        IrType::slice(element)
    }

    fn as_sequence(&self) -> Option<&Self> {
        self.element()
    }

    fn as_callable(&self) -> Option<(&[Self], &[Self])> {
        match self {
            IrType::Func(sig) => Some((&sig.params, &sig.results)),
            _ => None,
        }
    }
}
