use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::define_entity;
use crate::entity::PrimaryMap;

use super::block::{Block, BlockId};
use super::inst::{Inst, InstId, Op};
use super::ty::{FunctionSig, Type};
use super::value::ValueId;

define_entity!(FuncId);

/// Linkage of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Linkage {
    Export,
    Local,
}

/// A function in the IR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub sig: FunctionSig,
    pub linkage: Linkage,
    pub blocks: PrimaryMap<BlockId, Block>,
    pub insts: PrimaryMap<InstId, Inst>,
    pub value_types: PrimaryMap<ValueId, Type>,
    /// Entry block — always the first block.
    pub entry: BlockId,
    /// Optional debug names for values (from recovered symbols).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub value_names: HashMap<ValueId, String>,
}

impl Function {
    /// The terminator op of `block`.
    ///
    /// Scans for the *first* control-flow op rather than assuming it is the
    /// last instruction, tolerating lifters that leave dead instructions
    /// after a terminator.
    pub fn terminator(&self, block: BlockId) -> Option<&Op> {
        for &inst in &self.blocks[block].insts {
            let op = &self.insts[inst].op;
            if op.is_terminator() {
                return Some(op);
            }
        }
        None
    }
}
