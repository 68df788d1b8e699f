// Builtin functions known to the validator
//
// `str` is an ordinary first-class function value. `len` and `println` are
// special forms: they accept operands of several types and can only be
// called directly.

use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// len(s) -> int for any sequence
    Len,
    /// str(n: int) -> string
    Str,
    /// println(x) for any printable value
    Println,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Builtin> {
        match name {
            "len" => Some(Builtin::Len),
            "str" => Some(Builtin::Str),
            "println" => Some(Builtin::Println),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Len => "len",
            Builtin::Str => "str",
            Builtin::Println => "println",
        }
    }

    /// Type of the builtin used as a value, if it may be used as one
    pub fn value_type(&self) -> Option<Type> {
        match self {
            Builtin::Str => Some(Type::Func {
                params: vec![Type::Int],
                results: vec![Type::Str],
            }),
            Builtin::Len | Builtin::Println => None,
        }
    }
}
