//! CFG successor/predecessor maps and block orderings.

use std::collections::{HashMap, HashSet};

use super::block::BlockId;
use super::func::Function;
use super::inst::Op;

/// Successor blocks named by a terminator op.
pub fn branch_targets(op: &Op) -> Vec<BlockId> {
    match op {
        Op::Br { target } => vec![*target],
        Op::BrIf {
            then_target,
            else_target,
            ..
        } => vec![*then_target, *else_target],
        Op::Switch {
            targets, default, ..
        } => {
            let mut out: Vec<BlockId> = targets.iter().map(|&(_, block)| block).collect();
            out.push(*default);
            out
        }
        _ => Vec::new(),
    }
}

/// Predecessor and successor maps for a function's CFG.
pub struct Cfg {
    pub(crate) succs: HashMap<BlockId, Vec<BlockId>>,
    pub(crate) preds: HashMap<BlockId, Vec<BlockId>>,
}

impl Cfg {
    pub fn new(func: &Function) -> Self {
        let mut succs: HashMap<BlockId, Vec<BlockId>> = HashMap::new();
        let mut preds: HashMap<BlockId, Vec<BlockId>> = HashMap::new();

        for (block, _) in func.blocks.iter() {
            succs.entry(block).or_default();
            preds.entry(block).or_default();
        }

        for (block, _) in func.blocks.iter() {
            if let Some(term) = func.terminator(block) {
                for target in branch_targets(term) {
                    succs.entry(block).or_default().push(target);
                    preds.entry(target).or_default().push(block);
                }
            }
        }

        Cfg { succs, preds }
    }

    pub fn succs(&self, block: BlockId) -> &[BlockId] {
        match self.succs.get(&block) {
            Some(succs) => succs,
            None => &[],
        }
    }

    pub fn preds(&self, block: BlockId) -> &[BlockId] {
        match self.preds.get(&block) {
            Some(preds) => preds,
            None => &[],
        }
    }

    /// Reachable blocks in post-order: every block appears after all of its
    /// non-back-edge successors.
    pub fn postorder(&self, entry: BlockId) -> Vec<BlockId> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(entry);
        let mut stack: Vec<(BlockId, usize)> = vec![(entry, 0)];

        loop {
            let Some(frame) = stack.last_mut() else {
                break;
            };
            let (block, idx) = *frame;
            let succs = self.succs(block);
            if idx < succs.len() {
                frame.1 += 1;
                let succ = succs[idx];
                if visited.insert(succ) {
                    stack.push((succ, 0));
                }
            } else {
                stack.pop();
                out.push(block);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::FunctionBuilder;
    use crate::ir::func::Linkage;
    use crate::ir::ty::{FunctionSig, Type};

    fn bool_sig() -> FunctionSig {
        FunctionSig {
            params: vec![Type::Bool],
            return_ty: Type::Void,
        }
    }

    #[test]
    fn diamond_edges() {
        let mut fb = FunctionBuilder::new("diamond", bool_sig(), Linkage::Local);
        let cond = fb.param(0);
        let then_block = fb.create_block();
        let else_block = fb.create_block();
        let merge = fb.create_block();

        fb.br_if(cond, then_block, else_block);
        fb.switch_to_block(then_block);
        fb.br(merge);
        fb.switch_to_block(else_block);
        fb.br(merge);
        fb.switch_to_block(merge);
        fb.ret(None);

        let func = fb.build();
        let cfg = Cfg::new(&func);

        assert_eq!(cfg.succs(func.entry).to_vec(), vec![then_block, else_block]);
        assert_eq!(cfg.succs(then_block).to_vec(), vec![merge]);
        assert!(cfg.succs(merge).is_empty());
        let mut merge_preds = cfg.preds(merge).to_vec();
        merge_preds.sort();
        assert_eq!(merge_preds, vec![then_block, else_block]);
    }

    #[test]
    fn postorder_places_successors_first() {
        let mut fb = FunctionBuilder::new("chain", bool_sig(), Linkage::Local);
        let mid = fb.create_block();
        let last = fb.create_block();
        fb.br(mid);
        fb.switch_to_block(mid);
        fb.br(last);
        fb.switch_to_block(last);
        fb.ret(None);

        let func = fb.build();
        let cfg = Cfg::new(&func);
        assert_eq!(cfg.postorder(func.entry), vec![last, mid, func.entry]);
    }

    #[test]
    fn postorder_ignores_unreachable_blocks() {
        let mut fb = FunctionBuilder::new("dead", bool_sig(), Linkage::Local);
        let orphan = fb.create_block();
        fb.ret(None);
        fb.switch_to_block(orphan);
        fb.ret(None);

        let func = fb.build();
        let cfg = Cfg::new(&func);
        let order = cfg.postorder(func.entry);
        assert_eq!(order, vec![func.entry]);
        assert!(!order.contains(&orphan));
    }

    #[test]
    fn postorder_handles_cycles() {
        // entry → header; header → body | exit; body → header
        let mut fb = FunctionBuilder::new("looped", bool_sig(), Linkage::Local);
        let cond = fb.param(0);
        let header = fb.create_block();
        let body = fb.create_block();
        let exit = fb.create_block();

        fb.br(header);
        fb.switch_to_block(header);
        fb.br_if(cond, body, exit);
        fb.switch_to_block(body);
        fb.br(header);
        fb.switch_to_block(exit);
        fb.ret(None);

        let func = fb.build();
        let cfg = Cfg::new(&func);
        let order = cfg.postorder(func.entry);
        assert_eq!(order.len(), 4);
        // The header finishes after its whole subtree.
        let pos = |b| order.iter().position(|&x| x == b).unwrap();
        assert!(pos(body) < pos(header));
        assert!(pos(exit) < pos(header));
        assert!(pos(header) < pos(func.entry));
    }
}
