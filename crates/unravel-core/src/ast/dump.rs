//! Debug rendering of structured ASTs.
//!
//! Not a code printer — the printer lives outside this crate. This is a
//! compact tree dump used by [`super::DebugConfig`] stderr output and by
//! tests asserting on structure. Values render by their debug name when the
//! function carries one, `v<index>` otherwise.

use crate::entity::EntityRef;
use crate::ir::{Function, ValueId};

use super::{AstPool, BinOp, Expr, LoopPosition, Stmt, StmtId};

pub fn dump(pool: &AstPool, func: &Function, root: StmtId) -> String {
    let mut out = String::new();
    write_stmt(pool, func, root, 0, &mut out);
    out
}

fn value_name(func: &Function, value: ValueId) -> String {
    func.value_names
        .get(&value)
        .cloned()
        .unwrap_or_else(|| format!("v{}", value.index()))
}

fn write_expr(pool: &AstPool, func: &Function, expr: super::ExprId, out: &mut String) {
    match *pool.expr(expr) {
        Expr::Value(value) => out.push_str(&value_name(func, value)),
        Expr::Not(inner) => {
            out.push('!');
            write_expr(pool, func, inner, out);
        }
        Expr::Binary { op, lhs, rhs } => {
            out.push('(');
            write_expr(pool, func, lhs, out);
            out.push_str(match op {
                BinOp::And => " && ",
                BinOp::Or => " || ",
            });
            write_expr(pool, func, rhs, out);
            out.push(')');
        }
    }
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

/// Write the children of a sequence directly, anything else as a single
/// statement — bodies read as blocks without a nested `seq` header.
fn write_body(pool: &AstPool, func: &Function, stmt: StmtId, depth: usize, out: &mut String) {
    match pool.stmt(stmt) {
        Stmt::Seq(children) => {
            for &child in children {
                write_stmt(pool, func, child, depth, out);
            }
        }
        _ => write_stmt(pool, func, stmt, depth, out),
    }
}

fn write_stmt(pool: &AstPool, func: &Function, stmt: StmtId, depth: usize, out: &mut String) {
    match pool.stmt(stmt) {
        Stmt::Expr(expr) => {
            indent(depth, out);
            write_expr(pool, func, *expr, out);
            out.push('\n');
        }
        Stmt::Seq(children) => {
            indent(depth, out);
            out.push_str("seq {\n");
            for &child in children {
                write_stmt(pool, func, child, depth + 1, out);
            }
            indent(depth, out);
            out.push_str("}\n");
        }
        Stmt::IfElse {
            cond,
            then_stmt,
            else_stmt,
        } => {
            indent(depth, out);
            out.push_str("if ");
            write_expr(pool, func, *cond, out);
            out.push_str(" {\n");
            write_body(pool, func, *then_stmt, depth + 1, out);
            indent(depth, out);
            match else_stmt {
                Some(els) => {
                    out.push_str("} else {\n");
                    write_body(pool, func, *els, depth + 1, out);
                    indent(depth, out);
                    out.push_str("}\n");
                }
                None => out.push_str("}\n"),
            }
        }
        Stmt::Loop {
            position,
            cond,
            body,
        } => {
            indent(depth, out);
            match (position, cond) {
                (LoopPosition::PreTested, Some(c)) => {
                    out.push_str("loop pre ");
                    write_expr(pool, func, *c, out);
                    out.push_str(" {\n");
                }
                (LoopPosition::PostTested, Some(c)) => {
                    out.push_str("loop post ");
                    write_expr(pool, func, *c, out);
                    out.push_str(" {\n");
                }
                _ => out.push_str("loop {\n"),
            }
            write_body(pool, func, *body, depth + 1, out);
            indent(depth, out);
            out.push_str("}\n");
        }
        Stmt::Break => {
            indent(depth, out);
            out.push_str("break\n");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::FunctionBuilder;
    use crate::ir::{FunctionSig, Linkage, Type};

    #[test]
    fn renders_nested_structure() {
        let sig = FunctionSig {
            params: vec![Type::Bool],
            return_ty: Type::Void,
        };
        let mut fb = FunctionBuilder::new("f", sig, Linkage::Local);
        let cond = fb.param(0);
        fb.name_value(cond, "flag");
        fb.ret(None);
        let func = fb.build();

        let mut pool = AstPool::new();
        let c = pool.value_expr(cond);
        let v = pool.value_expr(crate::ir::ValueId::new(1));
        let body_stmt = pool.expr_stmt(v);
        let brk = pool.break_stmt();
        let if_stmt = pool.if_else(c, brk, None);
        let body = pool.seq(vec![body_stmt, if_stmt]);
        let lp = pool.loop_stmt(LoopPosition::Endless, None, body);
        let root = pool.seq(vec![lp]);

        let rendered = dump(&pool, &func, root);
        let expected = "\
seq {
  loop {
    v1
    if flag {
      break
    }
  }
}
";
        assert_eq!(rendered, expected);
    }
}
