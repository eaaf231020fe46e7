//! Per-function CFG analyses consumed by the structurizer: dominator and
//! post-dominator trees, dominance frontiers, and back-edge discovery.

pub mod domtree;
pub mod frontier;
pub mod loops;

pub use domtree::{DomTree, PostDomTree};
pub use frontier::DominanceFrontier;
pub use loops::back_edges;
