//! Dominator and post-dominator trees.
//!
//! Both directions share one engine: Cooper, Harvey and Kennedy's iterative
//! dominance computation over a reverse-postorder numbering. Worst case
//! O(n²), but it settles in two or three sweeps on the shapes lifters emit,
//! and it stays correct on arbitrary graphs. Post-dominators run the engine
//! on the reversed CFG, rooted at a virtual sink that gathers every block
//! the function can end in.

use std::collections::{HashMap, HashSet};

use crate::ir::{BlockId, Cfg, Function};

/// Marker for nodes whose dominator has not been found yet.
const UNSET: usize = usize::MAX;

/// Walk both dominator chains toward the root until they meet.
///
/// Nodes are reverse-postorder indices, so a chain step always strictly
/// decreases and the meeting point is the nearest common dominator.
fn meet(mut a: usize, mut b: usize, idom: &[usize]) -> usize {
    while a != b {
        while a > b {
            a = idom[a];
        }
        while b > a {
            b = idom[b];
        }
    }
    a
}

/// Immediate dominators for a graph given as per-node predecessor lists in
/// reverse-postorder index space. Index 0 is the root and maps to itself;
/// predecessors not in the index space must already be filtered out.
fn solve_idoms(preds: &[Vec<usize>]) -> Vec<usize> {
    let count = preds.len();
    let mut idom = vec![UNSET; count];
    idom[0] = 0;

    let mut changed = true;
    while changed {
        changed = false;
        for node in 1..count {
            let mut candidate = UNSET;
            for &pred in &preds[node] {
                if idom[pred] == UNSET {
                    continue;
                }
                candidate = if candidate == UNSET {
                    pred
                } else {
                    meet(candidate, pred, &idom)
                };
            }
            if candidate != UNSET && idom[node] != candidate {
                idom[node] = candidate;
                changed = true;
            }
        }
    }
    idom
}

/// Dominator tree over the forward CFG.
pub struct DomTree {
    idom: HashMap<BlockId, BlockId>,
}

impl DomTree {
    pub fn compute(func: &Function, cfg: &Cfg) -> Self {
        let mut order = cfg.postorder(func.entry);
        order.reverse();

        let mut number = HashMap::with_capacity(order.len());
        for (index, &block) in order.iter().enumerate() {
            number.insert(block, index);
        }

        let preds: Vec<Vec<usize>> = order
            .iter()
            .map(|&block| {
                cfg.preds(block)
                    .iter()
                    .filter_map(|pred| number.get(pred).copied())
                    .collect()
            })
            .collect();

        let solved = solve_idoms(&preds);
        let mut idom = HashMap::with_capacity(order.len());
        for (index, &block) in order.iter().enumerate() {
            idom.insert(block, order[solved[index]]);
        }
        Self { idom }
    }

    /// The immediate dominator of `block`; absent for the entry block and
    /// for unreachable blocks.
    pub fn idom(&self, block: BlockId) -> Option<BlockId> {
        match self.idom.get(&block) {
            Some(&parent) if parent != block => Some(parent),
            _ => None,
        }
    }

    /// Check if `a` dominates `b`.
    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        let mut walk = b;
        while walk != a {
            match self.idom.get(&walk) {
                Some(&up) if up != walk => walk = up,
                _ => return false,
            }
        }
        true
    }
}

/// Post-dominator tree, rooted at a virtual sink past all function ends.
pub struct PostDomTree {
    /// `None` as a value means the virtual sink is the immediate
    /// post-dominator.
    ipdom: HashMap<BlockId, Option<BlockId>>,
}

impl PostDomTree {
    pub fn compute(func: &Function, cfg: &Cfg) -> Self {
        // Blocks with no successors end the function (returns, dead ends).
        let ends: Vec<BlockId> = func
            .blocks
            .iter()
            .map(|(id, _)| id)
            .filter(|&id| cfg.succs(id).is_empty())
            .collect();

        if ends.is_empty() {
            // Nothing post-dominates anything in a function that cannot
            // terminate.
            return Self {
                ipdom: HashMap::new(),
            };
        }

        // Reverse-postorder of the reversed CFG. The virtual sink takes
        // index 0; real blocks follow, each end block a child of the sink.
        let order = end_rooted_order(cfg, &ends);
        let mut number = HashMap::with_capacity(order.len());
        for (index, &block) in order.iter().enumerate() {
            number.insert(block, index + 1);
        }

        // In the reversed graph a block's predecessors are its forward
        // successors; end blocks additionally hang off the sink.
        let mut preds: Vec<Vec<usize>> = Vec::with_capacity(order.len() + 1);
        preds.push(Vec::new());
        for &block in &order {
            let succs = cfg.succs(block);
            let mut list: Vec<usize> = succs
                .iter()
                .filter_map(|succ| number.get(succ).copied())
                .collect();
            if succs.is_empty() {
                list.push(0);
            }
            preds.push(list);
        }

        let solved = solve_idoms(&preds);
        let mut ipdom = HashMap::with_capacity(order.len());
        for (index, &block) in order.iter().enumerate() {
            let parent = solved[index + 1];
            ipdom.insert(
                block,
                if parent == 0 {
                    None
                } else {
                    Some(order[parent - 1])
                },
            );
        }
        Self { ipdom }
    }

    /// The immediate post-dominator of `block`; `None` is the virtual
    /// end-of-function.
    pub fn ipdom(&self, block: BlockId) -> Option<BlockId> {
        self.ipdom.get(&block).copied().flatten()
    }

    /// Check if `a` post-dominates `b`.
    pub fn post_dominates(&self, a: BlockId, b: BlockId) -> bool {
        let mut walk = b;
        while walk != a {
            match self.ipdom.get(&walk) {
                Some(&Some(up)) => walk = up,
                _ => return false,
            }
        }
        true
    }
}

/// Reverse-postorder of the reversed CFG, seeded from every end block:
/// depth-first along predecessor edges, finishing order reversed. Blocks
/// that cannot reach an end block do not appear.
fn end_rooted_order(cfg: &Cfg, ends: &[BlockId]) -> Vec<BlockId> {
    let mut finished = Vec::new();
    let mut visited = HashSet::new();

    for &end in ends {
        if !visited.insert(end) {
            continue;
        }
        let mut stack: Vec<(BlockId, usize)> = vec![(end, 0)];
        loop {
            let Some(frame) = stack.last_mut() else {
                break;
            };
            let (block, idx) = *frame;
            let preds = cfg.preds(block);
            if idx < preds.len() {
                frame.1 += 1;
                let pred = preds[idx];
                if visited.insert(pred) {
                    stack.push((pred, 0));
                }
            } else {
                stack.pop();
                finished.push(block);
            }
        }
    }
    finished.reverse();
    finished
}
