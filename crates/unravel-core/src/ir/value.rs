use serde::{Deserialize, Serialize};

use crate::define_entity;

define_entity!(ValueId);

/// A compile-time constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constant {
    Int(i64),
    Bool(bool),
}
