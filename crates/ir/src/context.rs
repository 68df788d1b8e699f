// Per-function pipeline context
//
// Owns the local table, the temporary-name generator and the allocation
// site counter of one top-level function (its nested closures included).
// Passes receive it explicitly; nothing here is global.

use crate::nodes::{AllocId, LocalId};
use crate::types::IrType;

static INVALID: IrType = IrType::Invalid;

#[derive(Debug, Clone, PartialEq)]
pub struct LocalInfo {
    pub name: String,
    pub ty: IrType,
    /// Introduced by a pass rather than declared in source
    pub temp: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocalTable {
    locals: Vec<LocalInfo>,
}

impl LocalTable {
    pub fn get(&self, id: LocalId) -> Option<&LocalInfo> {
        self.locals.get(id.0 as usize)
    }

    /// Type of a local; unknown ids are `Invalid`
    pub fn ty(&self, id: LocalId) -> &IrType {
        self.get(id).map(|info| &info.ty).unwrap_or(&INVALID)
    }

    pub fn name(&self, id: LocalId) -> &str {
        self.get(id).map(|info| info.name.as_str()).unwrap_or("?")
    }

    pub fn is_temp(&self, id: LocalId) -> bool {
        self.get(id).is_some_and(|info| info.temp)
    }

    pub fn len(&self) -> usize {
        self.locals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LocalId, &LocalInfo)> {
        self.locals
            .iter()
            .enumerate()
            .map(|(i, info)| (LocalId(i as u32), info))
    }

    fn push(&mut self, info: LocalInfo) -> LocalId {
        let id = LocalId(self.locals.len() as u32);
        self.locals.push(info);
        id
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionCtx {
    pub locals: LocalTable,
    next_temp: u32,
    next_alloc: u32,
}

impl FunctionCtx {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source-level local
    pub fn declare(&mut self, name: &str, ty: IrType) -> LocalId {
        self.locals.push(LocalInfo {
            name: name.to_string(),
            ty,
            temp: false,
        })
    }

    /// A fresh temporary; `$` cannot appear in source identifiers
    pub fn fresh_temp(&mut self, hint: &str, ty: IrType) -> LocalId {
        let name = format!("${}{}", hint, self.next_temp);
        self.next_temp += 1;
        self.locals.push(LocalInfo {
            name,
            ty,
            temp: true,
        })
    }

    pub fn fresh_alloc(&mut self) -> AllocId {
        let site = AllocId(self.next_alloc);
        self.next_alloc += 1;
        site
    }

    /// Number of allocation sites handed out so far
    pub fn alloc_sites(&self) -> u32 {
        self.next_alloc
    }
}
