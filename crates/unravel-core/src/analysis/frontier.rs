//! Dominance frontiers.
//!
//! The frontier of a block `b` is the set of blocks where `b`'s dominance
//! stops: blocks with a predecessor dominated by `b` that are not
//! themselves strictly dominated by `b`. Computed with the
//! Cooper-Harvey-Kennedy walk from join points toward the immediate
//! dominator.

use std::collections::{HashMap, HashSet};

use crate::ir::{BlockId, Cfg};

use super::domtree::DomTree;

pub struct DominanceFrontier {
    frontier: HashMap<BlockId, HashSet<BlockId>>,
}

impl DominanceFrontier {
    pub fn compute(cfg: &Cfg, dom: &DomTree) -> Self {
        let mut frontier: HashMap<BlockId, HashSet<BlockId>> = HashMap::new();

        for (&block, preds) in &cfg.preds {
            if preds.len() < 2 {
                continue;
            }
            let Some(idom) = dom.idom(block) else {
                continue;
            };
            for &pred in preds {
                let mut runner = pred;
                while runner != idom {
                    frontier.entry(runner).or_default().insert(block);
                    match dom.idom(runner) {
                        Some(parent) => runner = parent,
                        None => break,
                    }
                }
            }
        }

        Self { frontier }
    }

    /// The dominance frontier of `block`, if non-empty.
    pub fn of(&self, block: BlockId) -> Option<&HashSet<BlockId>> {
        self.frontier.get(&block)
    }
}
