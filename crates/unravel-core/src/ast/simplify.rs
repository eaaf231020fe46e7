//! Bottom-up AST simplification.
//!
//! Rewrites applied after a region is folded and again as enclosing
//! regions absorb it: sequence flattening and singleton collapse, negated
//! `if` normalization, nested single-`if` guard merging, and recognition
//! of post-tested loops from endless-loop bodies. Applying the pass to its
//! own output changes nothing.

use super::backend::StructureConfig;
use super::{AstPool, BinOp, Expr, LoopPosition, Stmt, StmtId};

/// Simplify `stmt` and return the statement to use in its place.
pub fn simplify_stmt(pool: &mut AstPool, config: &StructureConfig, stmt: StmtId) -> StmtId {
    match pool.stmt(stmt).clone() {
        Stmt::Seq(children) => {
            let mut flat = Vec::with_capacity(children.len());
            for child in children {
                let simplified = simplify_stmt(pool, config, child);
                match pool.stmt(simplified) {
                    Stmt::Seq(inner) => flat.extend(inner.iter().copied()),
                    _ => flat.push(simplified),
                }
            }
            if flat.len() == 1 {
                flat[0]
            } else {
                *pool.stmt_mut(stmt) = Stmt::Seq(flat);
                stmt
            }
        }

        Stmt::IfElse {
            mut cond,
            mut then_stmt,
            mut else_stmt,
        } => {
            // if (!c) A else B  →  if (c) B else A
            loop {
                let inner = match *pool.expr(cond) {
                    Expr::Not(inner) => inner,
                    _ => break,
                };
                let Some(els) = else_stmt else { break };
                cond = inner;
                else_stmt = Some(then_stmt);
                then_stmt = els;
            }

            then_stmt = simplify_stmt(pool, config, then_stmt);
            else_stmt = else_stmt.map(|els| simplify_stmt(pool, config, els));

            // An else branch that simplified to an empty sequence is no
            // else at all.
            if let Some(els) = else_stmt {
                if matches!(pool.stmt(els), Stmt::Seq(children) if children.is_empty()) {
                    else_stmt = None;
                }
            }

            // if (c1) { if (c2) A }  →  if (c1 && c2) A
            if config.merge_nested_guards && else_stmt.is_none() {
                loop {
                    let (inner_cond, inner_then) = match pool.stmt(then_stmt) {
                        Stmt::IfElse {
                            cond: inner_cond,
                            then_stmt: inner_then,
                            else_stmt: None,
                        } => (*inner_cond, *inner_then),
                        _ => break,
                    };
                    cond = pool.binary(BinOp::And, cond, inner_cond);
                    then_stmt = inner_then;
                }
            }

            *pool.stmt_mut(stmt) = Stmt::IfElse {
                cond,
                then_stmt,
                else_stmt,
            };
            stmt
        }

        Stmt::Loop {
            mut position,
            mut cond,
            body,
        } => {
            let mut body = simplify_stmt(pool, config, body);
            if config.loop_rewrite && position == LoopPosition::Endless {
                if let Some((break_cond, rest)) = strip_trailing_break(pool, body) {
                    position = LoopPosition::PostTested;
                    cond = Some(pool.not_expr(break_cond));
                    body = rest;
                }
            }
            *pool.stmt_mut(stmt) = Stmt::Loop {
                position,
                cond,
                body,
            };
            stmt
        }

        Stmt::Expr(_) | Stmt::Break => stmt,
    }
}

/// Match a body of the shape `Seq[…, IfElse(c, Break)]` and split off the
/// trailing conditional break.
fn strip_trailing_break(pool: &mut AstPool, body: StmtId) -> Option<(super::ExprId, StmtId)> {
    let children = match pool.stmt(body) {
        Stmt::Seq(children) => children.clone(),
        _ => return None,
    };
    let &last = children.last()?;
    let (cond, then_stmt) = match *pool.stmt(last) {
        Stmt::IfElse {
            cond,
            then_stmt,
            else_stmt: None,
        } => (cond, then_stmt),
        _ => return None,
    };
    if !matches!(pool.stmt(then_stmt), Stmt::Break) {
        return None;
    }

    let rest = &children[..children.len() - 1];
    let rest_id = if rest.len() == 1 {
        rest[0]
    } else {
        *pool.stmt_mut(body) = Stmt::Seq(rest.to_vec());
        body
    };
    Some((cond, rest_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityRef;
    use crate::ir::ValueId;

    fn config() -> StructureConfig {
        StructureConfig::default()
    }

    fn leaf(pool: &mut AstPool, value: u32) -> StmtId {
        let expr = pool.value_expr(ValueId::new(value));
        pool.expr_stmt(expr)
    }

    /// Structural equality over two statement trees.
    fn same_shape(pool: &AstPool, a: StmtId, b: StmtId) -> bool {
        match (pool.stmt(a), pool.stmt(b)) {
            (Stmt::Expr(x), Stmt::Expr(y)) => x == y,
            (Stmt::Break, Stmt::Break) => true,
            (Stmt::Seq(xs), Stmt::Seq(ys)) => {
                xs.len() == ys.len()
                    && xs
                        .iter()
                        .zip(ys.iter())
                        .all(|(&x, &y)| same_shape(pool, x, y))
            }
            (
                Stmt::IfElse {
                    cond: c1,
                    then_stmt: t1,
                    else_stmt: e1,
                },
                Stmt::IfElse {
                    cond: c2,
                    then_stmt: t2,
                    else_stmt: e2,
                },
            ) => {
                c1 == c2
                    && same_shape(pool, *t1, *t2)
                    && match (e1, e2) {
                        (Some(x), Some(y)) => same_shape(pool, *x, *y),
                        (None, None) => true,
                        _ => false,
                    }
            }
            (
                Stmt::Loop {
                    position: p1,
                    cond: c1,
                    body: b1,
                },
                Stmt::Loop {
                    position: p2,
                    cond: c2,
                    body: b2,
                },
            ) => p1 == p2 && c1 == c2 && same_shape(pool, *b1, *b2),
            _ => false,
        }
    }

    #[test]
    fn nested_sequences_flatten() {
        let mut pool = AstPool::new();
        let a = leaf(&mut pool, 0);
        let b = leaf(&mut pool, 1);
        let c = leaf(&mut pool, 2);
        let inner = pool.seq(vec![b, c]);
        let empty = pool.seq(vec![]);
        let outer = pool.seq(vec![a, inner, empty]);

        let result = simplify_stmt(&mut pool, &config(), outer);
        match pool.stmt(result) {
            Stmt::Seq(children) => assert_eq!(children, &vec![a, b, c]),
            other => panic!("Expected Seq, got {other:?}"),
        }
    }

    #[test]
    fn singleton_sequence_collapses() {
        let mut pool = AstPool::new();
        let a = leaf(&mut pool, 0);
        let seq = pool.seq(vec![a]);
        assert_eq!(simplify_stmt(&mut pool, &config(), seq), a);
    }

    #[test]
    fn negated_condition_swaps_branches() {
        let mut pool = AstPool::new();
        let c = pool.value_expr(ValueId::new(0));
        let not_c = pool.not_expr(c);
        let a = leaf(&mut pool, 1);
        let b = leaf(&mut pool, 2);
        let stmt = pool.if_else(not_c, a, Some(b));

        let result = simplify_stmt(&mut pool, &config(), stmt);
        match *pool.stmt(result) {
            Stmt::IfElse {
                cond,
                then_stmt,
                else_stmt,
            } => {
                assert_eq!(cond, c);
                assert_eq!(then_stmt, b);
                assert_eq!(else_stmt, Some(a));
            }
            ref other => panic!("Expected IfElse, got {other:?}"),
        }
    }

    #[test]
    fn negated_condition_without_else_is_kept() {
        let mut pool = AstPool::new();
        let c = pool.value_expr(ValueId::new(0));
        let not_c = pool.not_expr(c);
        let a = leaf(&mut pool, 1);
        let stmt = pool.if_else(not_c, a, None);

        let result = simplify_stmt(&mut pool, &config(), stmt);
        match *pool.stmt(result) {
            Stmt::IfElse { cond, .. } => assert_eq!(cond, not_c),
            ref other => panic!("Expected IfElse, got {other:?}"),
        }
    }

    #[test]
    fn nested_guards_merge_with_and() {
        let mut pool = AstPool::new();
        let c1 = pool.value_expr(ValueId::new(0));
        let c2 = pool.value_expr(ValueId::new(1));
        let a = leaf(&mut pool, 2);
        let inner = pool.if_else(c2, a, None);
        let inner_seq = pool.seq(vec![inner]);
        let outer = pool.if_else(c1, inner_seq, None);

        let result = simplify_stmt(&mut pool, &config(), outer);
        match *pool.stmt(result) {
            Stmt::IfElse {
                cond,
                then_stmt,
                else_stmt: None,
            } => {
                assert!(matches!(
                    *pool.expr(cond),
                    Expr::Binary { op: BinOp::And, lhs, rhs } if lhs == c1 && rhs == c2
                ));
                assert_eq!(then_stmt, a);
            }
            ref other => panic!("Expected merged IfElse, got {other:?}"),
        }
    }

    #[test]
    fn nested_guard_with_else_does_not_merge() {
        let mut pool = AstPool::new();
        let c1 = pool.value_expr(ValueId::new(0));
        let c2 = pool.value_expr(ValueId::new(1));
        let a = leaf(&mut pool, 2);
        let b = leaf(&mut pool, 3);
        let inner = pool.if_else(c2, a, Some(b));
        let outer = pool.if_else(c1, inner, None);

        let result = simplify_stmt(&mut pool, &config(), outer);
        match *pool.stmt(result) {
            Stmt::IfElse { cond, .. } => assert_eq!(cond, c1),
            ref other => panic!("Expected IfElse, got {other:?}"),
        }
    }

    #[test]
    fn endless_loop_with_trailing_break_becomes_post_tested() {
        let mut pool = AstPool::new();
        let c = pool.value_expr(ValueId::new(0));
        let not_c = pool.not_expr(c);
        let a = leaf(&mut pool, 1);
        let b = leaf(&mut pool, 2);
        let brk = pool.break_stmt();
        let guard = pool.if_else(not_c, brk, None);
        let body = pool.seq(vec![a, b, guard]);
        let lp = pool.loop_stmt(LoopPosition::Endless, None, body);

        let result = simplify_stmt(&mut pool, &config(), lp);
        match *pool.stmt(result) {
            Stmt::Loop {
                position: LoopPosition::PostTested,
                cond: Some(cond),
                body,
            } => {
                // The break fired on !c, so the loop repeats while c.
                assert_eq!(cond, c);
                match pool.stmt(body) {
                    Stmt::Seq(children) => assert_eq!(children, &vec![a, b]),
                    other => panic!("Expected Seq body, got {other:?}"),
                }
            }
            ref other => panic!("Expected post-tested loop, got {other:?}"),
        }
    }

    #[test]
    fn break_with_else_is_not_a_loop_condition() {
        let mut pool = AstPool::new();
        let c = pool.value_expr(ValueId::new(0));
        let a = leaf(&mut pool, 1);
        let brk = pool.break_stmt();
        let guard = pool.if_else(c, brk, Some(a));
        let body_first = leaf(&mut pool, 2);
        let body = pool.seq(vec![body_first, guard]);
        let lp = pool.loop_stmt(LoopPosition::Endless, None, body);

        let result = simplify_stmt(&mut pool, &config(), lp);
        assert!(matches!(
            *pool.stmt(result),
            Stmt::Loop {
                position: LoopPosition::Endless,
                ..
            }
        ));
    }

    #[test]
    fn simplification_is_idempotent() {
        let mut pool = AstPool::new();
        let c = pool.value_expr(ValueId::new(0));
        let not_c = pool.not_expr(c);
        let a = leaf(&mut pool, 1);
        let b = leaf(&mut pool, 2);
        let brk = pool.break_stmt();
        let guard = pool.if_else(not_c, brk, None);
        let inner = pool.seq(vec![b, guard]);
        let lp = pool.loop_stmt(LoopPosition::Endless, None, inner);
        let swapped = pool.if_else(not_c, a, Some(lp));
        let root = pool.seq(vec![swapped]);

        let once = simplify_stmt(&mut pool, &config(), root);
        let twice = simplify_stmt(&mut pool, &config(), once);
        assert!(same_shape(&pool, once, twice));
    }
}
