use serde::{Deserialize, Serialize};

use crate::define_entity;

use super::block::BlockId;
use super::value::{Constant, ValueId};

define_entity!(InstId);

/// Comparison operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpKind {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// An IR operation.
///
/// Control flow is branch-oriented: every block ends with `Br`, `BrIf`,
/// `Switch`, or `Return`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    Const(Constant),
    Cmp {
        kind: CmpKind,
        lhs: ValueId,
        rhs: ValueId,
    },
    Add {
        lhs: ValueId,
        rhs: ValueId,
    },
    Not {
        value: ValueId,
    },
    Br {
        target: BlockId,
    },
    BrIf {
        cond: ValueId,
        then_target: BlockId,
        else_target: BlockId,
    },
    Switch {
        value: ValueId,
        targets: Vec<(i64, BlockId)>,
        default: BlockId,
    },
    Return(Option<ValueId>),
}

impl Op {
    /// Whether this op terminates a block.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Op::Br { .. } | Op::BrIf { .. } | Op::Switch { .. } | Op::Return(_)
        )
    }
}

/// An instruction: an op plus its result value, if it produces one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inst {
    pub op: Op,
    pub result: Option<ValueId>,
}
