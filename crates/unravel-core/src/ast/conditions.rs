//! Reaching conditions for a region.
//!
//! Starting at the region entry, every path through the AST graph pushes
//! the branch predicates it takes; each node visited records the current
//! predicate stack as one product. A node's full reaching condition is the
//! disjunction of its recorded products (sum-of-products form).

use std::collections::{HashMap, HashSet};

use crate::entity::EntityRef;
use crate::error::CoreError;
use crate::ir::{BlockId, Function, Op};

use super::grapher::{AstGrapher, NodeId};
use super::{AstPool, ExprId, StmtId};

#[derive(Debug)]
pub struct ReachingConditions {
    /// Statement → recorded products. Each product is a list of predicate
    /// expressions to be conjoined.
    pub conditions: HashMap<StmtId, Vec<Vec<ExprId>>>,
}

impl ReachingConditions {
    /// Walk the AST graph from `entry` and accumulate path conditions.
    ///
    /// The sink — the node at the region's exit, when the region has one —
    /// is recorded but never expanded, so its products describe exactly the
    /// paths that leave the region. Nodes already on the visit path (back
    /// edges) are skipped, matching the driver's contract that cyclic
    /// regions fold before any enclosing region does. Folded nodes pass
    /// through to the node at their exit without contributing a predicate.
    pub fn build(
        pool: &mut AstPool,
        grapher: &AstGrapher,
        func: &Function,
        entry: NodeId,
        sink: Option<NodeId>,
    ) -> Result<Self, CoreError> {
        let mut result = ReachingConditions {
            conditions: HashMap::new(),
        };
        let mut predicates = Vec::new();
        let mut on_path = HashSet::new();
        result.visit(
            pool,
            grapher,
            func,
            entry,
            sink,
            &mut predicates,
            &mut on_path,
        )?;
        Ok(result)
    }

    fn visit(
        &mut self,
        pool: &mut AstPool,
        grapher: &AstGrapher,
        func: &Function,
        node: NodeId,
        sink: Option<NodeId>,
        predicates: &mut Vec<ExprId>,
        on_path: &mut HashSet<NodeId>,
    ) -> Result<(), CoreError> {
        if on_path.contains(&node) {
            return Ok(());
        }

        let graph_node = *grapher.node(node);
        self.conditions
            .entry(graph_node.stmt)
            .or_default()
            .push(predicates.clone());

        if Some(node) == sink {
            return Ok(());
        }
        on_path.insert(node);

        if graph_node.has_distinct_exit() {
            if let Some(exit) = graph_node.exit {
                let next = self.resolve(grapher, func, exit)?;
                self.visit(pool, grapher, func, next, sink, predicates, on_path)?;
            }
        } else {
            match func.terminator(graph_node.entry) {
                Some(&Op::BrIf {
                    cond,
                    then_target,
                    else_target,
                }) => {
                    let cond_expr = pool.value_expr(cond);
                    let then_node = self.resolve(grapher, func, then_target)?;
                    let else_node = self.resolve(grapher, func, else_target)?;

                    predicates.push(cond_expr);
                    self.visit(pool, grapher, func, then_node, sink, predicates, on_path)?;
                    predicates.pop();

                    let negated = pool.not_expr(cond_expr);
                    predicates.push(negated);
                    self.visit(pool, grapher, func, else_node, sink, predicates, on_path)?;
                    predicates.pop();
                }
                Some(&Op::Br { target }) => {
                    let next = self.resolve(grapher, func, target)?;
                    self.visit(pool, grapher, func, next, sink, predicates, on_path)?;
                }
                Some(Op::Return(_)) | None => {}
                Some(_) => {
                    return Err(CoreError::UnsupportedTerminator {
                        function: func.name.clone(),
                        block: graph_node.entry.index(),
                    })
                }
            }
        }

        on_path.remove(&node);
        Ok(())
    }

    fn resolve(
        &self,
        grapher: &AstGrapher,
        func: &Function,
        block: BlockId,
    ) -> Result<NodeId, CoreError> {
        grapher
            .node_from_entry(block)
            .ok_or_else(|| CoreError::MissingGraphNode {
                function: func.name.clone(),
                block: block.index(),
            })
    }
}
