// Front-end type system for Rill
//
// `Type` is what the semantic validator assigns to every expression. The IR
// has its own descriptor (`ir::IrType`); the two only meet in the shared
// operand rules through `TypeShape`.

use diagnostics::TypeShape;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Bool,
    Str,
    /// Result of calls with no results (println, void functions)
    Unit,
    Seq(Box<Type>),
    Func {
        params: Vec<Type>,
        results: Vec<Type>,
    },
    /// Multiple results of one call
    Tuple(Vec<Type>),
    /// Assigned to anything already diagnosed
    Poison,
}

impl Type {
    /// Sequence of `element`; a poisoned element poisons the sequence
    pub fn seq(element: Type) -> Type {
        if element.is_poison() {
            Type::Poison
        } else {
            Type::Seq(Box::new(element))
        }
    }

    /// The value type produced by a callable with these results
    pub fn from_results(results: &[Type]) -> Type {
        match results {
            [] => Type::Unit,
            [single] => single.clone(),
            many => Type::Tuple(many.to_vec()),
        }
    }

    /// Inverse of `from_results`
    pub fn into_results(self) -> Vec<Type> {
        match self {
            Type::Unit => Vec::new(),
            Type::Tuple(types) => types,
            other => vec![other],
        }
    }

    /// Whether this type or any component of it is poisoned
    pub fn contains_poison(&self) -> bool {
        match self {
            Type::Poison => true,
            Type::Seq(element) => element.contains_poison(),
            Type::Func { params, results } => {
                params.iter().chain(results).any(Type::contains_poison)
            }
            Type::Tuple(types) => types.iter().any(Type::contains_poison),
            Type::Int | Type::Bool | Type::Str | Type::Unit => false,
        }
    }

    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Seq(element) => Some(element),
            _ => None,
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[Type]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", ty)?;
    }
    Ok(())
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Bool => write!(f, "bool"),
            Type::Str => write!(f, "string"),
            Type::Unit => write!(f, "()"),
            Type::Seq(element) => write!(f, "[{}]", element),
            Type::Func { params, results } => {
                write!(f, "fn(")?;
                write_list(f, params)?;
                write!(f, ")")?;
                match results.as_slice() {
                    [] => Ok(()),
                    [single] => write!(f, " -> {}", single),
                    many => {
                        write!(f, " -> (")?;
                        write_list(f, many)?;
                        write!(f, ")")
                    }
                }
            }
            Type::Tuple(types) => {
                write!(f, "(")?;
                write_list(f, types)?;
                write!(f, ")")
            }
            Type::Poison => write!(f, "<error>"),
        }
    }
}

impl TypeShape for Type {
    fn poison() -> Self {
        Type::Poison
    }

    fn is_poison(&self) -> bool {
        matches!(self, Type::Poison)
    }

    fn contains_poison(&self) -> bool {
        Type::contains_poison(self)
    }

    fn int() -> Self {
        Type::Int
    }

    fn boolean() -> Self {
        Type::Bool
    }

    fn string() -> Self {
        Type::Str
    }

    fn sequence(element: Self) -> Self {
        Type::seq(element)
    }

    fn as_sequence(&self) -> Option<&Self> {
        self.element()
    }

    fn as_callable(&self) -> Option<(&[Self], &[Self])> {
        match self {
            Type::Func { params, results } => Some((params, results)),
            _ => None,
        }
    }
}
