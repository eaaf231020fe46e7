//! Branch-oriented intermediate representation.
//!
//! The IR is the hand-off point from the lifter: functions are flat arenas
//! of blocks, instructions, and values, with control flow expressed only
//! through block terminators (`Br`, `BrIf`, `Switch`, `Return`).

pub mod block;
pub mod builder;
pub mod cfg;
pub mod func;
pub mod inst;
pub mod module;
pub mod ty;
pub mod value;

pub use block::{Block, BlockId};
pub use builder::{FunctionBuilder, ModuleBuilder};
pub use cfg::{branch_targets, Cfg};
pub use func::{FuncId, Function, Linkage};
pub use inst::{CmpKind, Inst, InstId, Op};
pub use module::Module;
pub use ty::{FunctionSig, Type};
pub use value::{Constant, ValueId};
