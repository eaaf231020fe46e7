//! Core error type.

use thiserror::Error;

/// Errors raised by the structuring core.
///
/// Every variant indicates a broken invariant in the input IR or in an
/// upstream pass — none of these are user-facing conditions. Recoverable
/// absences (empty function, plain index lookups) are expressed as `Option`
/// return values instead.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A block ends with a terminator other than a conditional branch, an
    /// unconditional branch, or a return.
    #[error("unsupported terminator in function `{function}` (block {block})")]
    UnsupportedTerminator { function: String, block: u32 },

    /// A grapher index lookup that an upstream invariant guarantees must
    /// succeed came back empty.
    #[error("no graph node registered for block {block} in function `{function}`")]
    MissingGraphNode { function: String, block: u32 },

    /// The reaching-conditions map lacks a node the region traversal
    /// produced.
    #[error("missing reaching condition for a region node in function `{function}`")]
    MissingReachingCondition { function: String },
}
