//! Mutable AST overlay on the CFG.
//!
//! Each graph node ties one statement to the CFG range it covers: the entry
//! block that first produced it and, once a region has been folded into the
//! node, the exit block where control continues. Folding never deletes —
//! it appends a new node and repoints the entry index, so the entry-block
//! lookup always lands on the coarsest fold while older nodes stay valid
//! for anything still holding their id.

use std::collections::HashMap;

use crate::define_entity;
use crate::entity::PrimaryMap;
use crate::ir::{BlockId, Cfg, Function};

use super::{AstPool, StmtId};

define_entity!(NodeId);

/// One AST statement tied to the CFG range it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphNode {
    pub stmt: StmtId,
    /// Uniquely identifies the node; never changes.
    pub entry: BlockId,
    /// Equals `entry` for raw blocks; names the first block *after* the
    /// covered range once a region has been folded in (`None` = the
    /// function's end).
    pub exit: Option<BlockId>,
}

impl GraphNode {
    /// Whether this node covers an already-folded region, so successor
    /// iteration must continue at `exit` rather than at `entry`'s CFG
    /// successors.
    pub fn has_distinct_exit(&self) -> bool {
        self.exit != Some(self.entry)
    }
}

#[derive(Debug, Default)]
pub struct AstGrapher {
    nodes: PrimaryMap<NodeId, GraphNode>,
    stmt_by_entry: HashMap<BlockId, StmtId>,
    node_by_stmt: HashMap<StmtId, NodeId>,
}

impl AstGrapher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a leaf node for `block`: a sequence with one expression
    /// statement per non-terminator instruction. Branch terminators are
    /// discarded here — their semantics are recovered from the CFG when the
    /// enclosing region is folded. Re-adding a block returns the statement
    /// it already has.
    pub fn add_basic_block(
        &mut self,
        func: &Function,
        pool: &mut AstPool,
        block: BlockId,
    ) -> StmtId {
        if let Some(&stmt) = self.stmt_by_entry.get(&block) {
            return stmt;
        }

        let mut children = Vec::new();
        for &inst_id in &func.blocks[block].insts {
            let inst = &func.insts[inst_id];
            if inst.op.is_terminator() {
                continue;
            }
            if let Some(result) = inst.result {
                let value = pool.value_expr(result);
                children.push(pool.expr_stmt(value));
            }
        }
        let stmt = pool.seq(children);

        let node = self.nodes.push(GraphNode {
            stmt,
            entry: block,
            exit: Some(block),
        });
        self.stmt_by_entry.insert(block, stmt);
        self.node_by_stmt.insert(stmt, node);
        stmt
    }

    /// Fold the region `(entry, exit)` into `stmt`. The previous node for
    /// `entry` stays in storage but is no longer reachable through the
    /// indices.
    pub fn update_region(&mut self, entry: BlockId, exit: Option<BlockId>, stmt: StmtId) {
        let node = self.nodes.push(GraphNode { stmt, entry, exit });
        self.stmt_by_entry.insert(entry, stmt);
        self.node_by_stmt.insert(stmt, node);
    }

    /// The node currently covering `block` (the coarsest fold whose entry
    /// it is).
    pub fn node_from_entry(&self, block: BlockId) -> Option<NodeId> {
        let stmt = self.stmt_by_entry.get(&block)?;
        self.node_by_stmt.get(stmt).copied()
    }

    /// The node registered for `stmt`.
    pub fn graph_node(&self, stmt: StmtId) -> Option<NodeId> {
        self.node_by_stmt.get(&stmt).copied()
    }

    pub fn node(&self, id: NodeId) -> &GraphNode {
        &self.nodes[id]
    }

    /// Every node ever registered, leaves and folds alike, in registration
    /// order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &GraphNode)> {
        self.nodes.iter()
    }

    pub fn block_at_entry(&self, stmt: StmtId) -> Option<BlockId> {
        self.graph_node(stmt).map(|id| self.nodes[id].entry)
    }

    /// The exit block of the node registered for `stmt`; `None` both when
    /// the statement is unknown and when the node runs to the function's
    /// end.
    pub fn block_at_exit(&self, stmt: StmtId) -> Option<BlockId> {
        self.graph_node(stmt).and_then(|id| self.nodes[id].exit)
    }

    /// AST-graph successors of `node`: the node at the exit block for
    /// folded regions, the nodes at the CFG successors otherwise.
    pub fn successors(&self, node: NodeId, cfg: &Cfg) -> Vec<NodeId> {
        let n = &self.nodes[node];
        if n.has_distinct_exit() {
            n.exit
                .and_then(|exit| self.node_from_entry(exit))
                .into_iter()
                .collect()
        } else {
            cfg.succs(n.entry)
                .iter()
                .filter_map(|&succ| self.node_from_entry(succ))
                .collect()
        }
    }
}
