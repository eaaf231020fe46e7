//! Back-edge discovery.
//!
//! A back edge is a CFG edge whose target is on the current DFS path from
//! the entry; its target is a loop-header candidate and its source a latch.

use std::collections::{HashMap, HashSet};

use crate::ir::{BlockId, Cfg};

/// Map from back-edge target (loop header) to the latch blocks whose edges
/// close a cycle on it.
pub fn back_edges(cfg: &Cfg, entry: BlockId) -> HashMap<BlockId, Vec<BlockId>> {
    let mut out: HashMap<BlockId, Vec<BlockId>> = HashMap::new();
    let mut visited = HashSet::new();
    let mut on_path = HashSet::new();
    let mut stack: Vec<(BlockId, usize)> = vec![(entry, 0)];
    visited.insert(entry);
    on_path.insert(entry);

    loop {
        let Some(frame) = stack.last_mut() else {
            break;
        };
        let (block, idx) = *frame;
        let succs = cfg.succs(block);
        if idx < succs.len() {
            frame.1 += 1;
            let succ = succs[idx];
            if on_path.contains(&succ) {
                out.entry(succ).or_default().push(block);
            } else if visited.insert(succ) {
                on_path.insert(succ);
                stack.push((succ, 0));
            }
        } else {
            on_path.remove(&block);
            stack.pop();
        }
    }
    out
}
