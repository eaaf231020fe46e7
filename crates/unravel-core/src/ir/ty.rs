use serde::{Deserialize, Serialize};

/// A value type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    #[default]
    Void,
    Bool,
    /// An integer of the given bit width.
    Int(u16),
}

/// A function signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSig {
    pub params: Vec<Type>,
    pub return_ty: Type,
}
