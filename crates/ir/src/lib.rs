pub mod context;
pub mod error;
pub mod escape;
pub mod eval;
pub mod lower;
pub mod nodes;
pub mod pretty;
pub mod translate;
pub mod types;
pub mod verify;

pub use context::{FunctionCtx, LocalInfo, LocalTable};
pub use error::{InternalError, IrResult};
pub use escape::{Placement, Placements, annotate_module, place_allocations};
pub use eval::{EvalError, Interpreter, Value};
pub use lower::{lower_function, lower_module};
pub use nodes::{
    AllocId, BoundsCheck, Const, IrClosure, IrExpr, IrExprKind, IrFunction, IrModule, IrStmt,
    LocalId, MapEscape, OperandUse, count_maps, for_each_expr,
};
pub use pretty::{print_function, print_module};
pub use translate::translate_program;
pub use types::{FuncSig, IrType};
pub use verify::verify_module;

#[cfg(test)]
mod tests;
