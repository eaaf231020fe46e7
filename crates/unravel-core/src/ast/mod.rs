//! High-level AST for the structured output.
//!
//! Statements and expressions are tagged unions stored in an [`AstPool`]
//! arena and referenced by typed ids. The pool is cleared once per module
//! run; per-function interning caches keep branch-condition expressions
//! reference-stable (same `ValueId` → same `ExprId`) within a function, so
//! "the same condition" is an id compare rather than a structural one.

pub mod backend;
pub mod boolean;
pub mod conditions;
pub mod dump;
pub mod grapher;
pub mod simplify;

pub use backend::{AstBackend, DebugConfig, StructureConfig};
pub use grapher::{AstGrapher, GraphNode, NodeId};

use std::collections::HashMap;

use crate::define_entity;
use crate::entity::PrimaryMap;
use crate::ir::ValueId;

define_entity!(ExprId);
define_entity!(StmtId);

/// Short-circuit binary operators usable in guard expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    And,
    Or,
}

/// A Boolean guard expression over IR values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// An opaque IR value (a branch condition).
    Value(ValueId),
    /// Logical negation.
    Not(ExprId),
    /// Short-circuit conjunction or disjunction.
    Binary { op: BinOp, lhs: ExprId, rhs: ExprId },
}

/// Where a loop tests its condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPosition {
    Endless,
    PreTested,
    PostTested,
}

/// A structured statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// A straight-line statement wrapping one IR value.
    Expr(ExprId),
    /// Ordered sequence; insertion order is execution order.
    Seq(Vec<StmtId>),
    /// Conditional with an optional else branch.
    IfElse {
        cond: ExprId,
        then_stmt: StmtId,
        else_stmt: Option<StmtId>,
    },
    /// A loop; `cond` is present for pre- and post-tested loops.
    Loop {
        position: LoopPosition,
        cond: Option<ExprId>,
        body: StmtId,
    },
    /// Break out of the innermost loop.
    Break,
}

/// Arena for AST statements and expressions.
///
/// Every node produced during a module run lives here and is released in
/// one shot by [`AstPool::clear`]. Nodes are immutable once structuring of
/// their function completes.
#[derive(Debug, Default)]
pub struct AstPool {
    exprs: PrimaryMap<ExprId, Expr>,
    stmts: PrimaryMap<StmtId, Stmt>,
    value_exprs: HashMap<ValueId, ExprId>,
    negations: HashMap<ExprId, ExprId>,
}

impl AstPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release every node allocated since the last clear.
    pub fn clear(&mut self) {
        self.exprs.clear();
        self.stmts.clear();
        self.value_exprs.clear();
        self.negations.clear();
    }

    /// Reset the interning caches at a function boundary so value ids from
    /// different functions cannot alias.
    pub fn begin_function(&mut self) {
        self.value_exprs.clear();
        self.negations.clear();
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id]
    }

    pub(crate) fn stmt_mut(&mut self, id: StmtId) -> &mut Stmt {
        &mut self.stmts[id]
    }

    /// The interned expression for an IR value.
    pub fn value_expr(&mut self, value: ValueId) -> ExprId {
        if let Some(&id) = self.value_exprs.get(&value) {
            return id;
        }
        let id = self.exprs.push(Expr::Value(value));
        self.value_exprs.insert(value, id);
        id
    }

    /// The interned negation of `expr`; double negation cancels.
    pub fn not_expr(&mut self, expr: ExprId) -> ExprId {
        if let Expr::Not(inner) = self.exprs[expr] {
            return inner;
        }
        if let Some(&id) = self.negations.get(&expr) {
            return id;
        }
        let id = self.exprs.push(Expr::Not(expr));
        self.negations.insert(expr, id);
        id
    }

    /// A fresh (non-interned) binary expression.
    pub fn binary(&mut self, op: BinOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.exprs.push(Expr::Binary { op, lhs, rhs })
    }

    /// Left-associated chain `t₁ op t₂ op …`; `None` for an empty list.
    pub fn chain(&mut self, op: BinOp, terms: &[ExprId]) -> Option<ExprId> {
        let (&first, rest) = terms.split_first()?;
        Some(
            rest.iter()
                .fold(first, |acc, &term| self.binary(op, acc, term)),
        )
    }

    /// True when one of the two expressions is exactly the negation node of
    /// the other.
    pub fn negates(&self, a: ExprId, b: ExprId) -> bool {
        matches!(self.exprs[a], Expr::Not(inner) if inner == b)
            || matches!(self.exprs[b], Expr::Not(inner) if inner == a)
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.stmts.push(Stmt::Expr(expr))
    }

    pub fn seq(&mut self, children: Vec<StmtId>) -> StmtId {
        self.stmts.push(Stmt::Seq(children))
    }

    pub fn if_else(&mut self, cond: ExprId, then_stmt: StmtId, else_stmt: Option<StmtId>) -> StmtId {
        self.stmts.push(Stmt::IfElse {
            cond,
            then_stmt,
            else_stmt,
        })
    }

    pub fn loop_stmt(
        &mut self,
        position: LoopPosition,
        cond: Option<ExprId>,
        body: StmtId,
    ) -> StmtId {
        self.stmts.push(Stmt::Loop {
            position,
            cond,
            body,
        })
    }

    pub fn break_stmt(&mut self) -> StmtId {
        self.stmts.push(Stmt::Break)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityRef;

    #[test]
    fn value_expressions_are_interned() {
        let mut pool = AstPool::new();
        let v = ValueId::new(3);
        assert_eq!(pool.value_expr(v), pool.value_expr(v));
        assert_ne!(pool.value_expr(v), pool.value_expr(ValueId::new(4)));
    }

    #[test]
    fn double_negation_cancels() {
        let mut pool = AstPool::new();
        let v = pool.value_expr(ValueId::new(0));
        let not_v = pool.not_expr(v);
        assert_ne!(v, not_v);
        assert_eq!(pool.not_expr(not_v), v);
        // The negation node itself is interned too.
        assert_eq!(pool.not_expr(v), not_v);
    }

    #[test]
    fn negates_matches_one_level_only() {
        let mut pool = AstPool::new();
        let a = pool.value_expr(ValueId::new(0));
        let b = pool.value_expr(ValueId::new(1));
        let not_a = pool.not_expr(a);
        assert!(pool.negates(a, not_a));
        assert!(pool.negates(not_a, a));
        assert!(!pool.negates(a, b));
        assert!(!pool.negates(a, a));
    }

    #[test]
    fn begin_function_severs_value_aliasing() {
        let mut pool = AstPool::new();
        let before = pool.value_expr(ValueId::new(0));
        pool.begin_function();
        let after = pool.value_expr(ValueId::new(0));
        assert_ne!(before, after);
    }

    #[test]
    fn chain_folds_left() {
        let mut pool = AstPool::new();
        let a = pool.value_expr(ValueId::new(0));
        let b = pool.value_expr(ValueId::new(1));
        let c = pool.value_expr(ValueId::new(2));
        let chained = pool.chain(BinOp::Or, &[a, b, c]).unwrap();
        match *pool.expr(chained) {
            Expr::Binary {
                op: BinOp::Or,
                lhs,
                rhs,
            } => {
                assert_eq!(rhs, c);
                assert!(
                    matches!(*pool.expr(lhs), Expr::Binary { op: BinOp::Or, lhs: l, rhs: r } if l == a && r == b)
                );
            }
            ref other => panic!("Expected Or chain, got {other:?}"),
        }
        assert_eq!(pool.chain(BinOp::Or, &[a]), Some(a));
        assert_eq!(pool.chain(BinOp::Or, &[]), None);
    }
}
