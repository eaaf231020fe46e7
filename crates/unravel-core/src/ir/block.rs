use serde::{Deserialize, Serialize};

use crate::define_entity;

use super::inst::InstId;

define_entity!(BlockId);

/// A basic block: a straight-line run of instructions ending in a
/// terminator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub insts: Vec<InstId>,
}
