//! AST back-end: folds each function's CFG into structured statements.
//!
//! Blocks are visited in post-order. For each block, candidate regions are
//! proposed by climbing the post-dominator tree from the block, skipping
//! the interiors of regions already folded; a candidate `(entry, exit)`
//! pair that passes the region predicate is folded into a single grapher
//! node — as an endless loop with internal breaks when the entry heads a
//! cycle, as a guarded sequence otherwise. Enclosing regions then see one
//! opaque node where the fold happened, so structure accretes leaves-first
//! until the whole function is a single statement.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, error, trace};

use crate::analysis::{back_edges, DomTree, PostDomTree};
use crate::entity::EntityRef;
use crate::error::CoreError;
use crate::ir::{BlockId, Cfg, FuncId, Function, Module};

use super::boolean::dnf_to_cnf;
use super::conditions::ReachingConditions;
use super::dump;
use super::grapher::{AstGrapher, NodeId};
use super::simplify::simplify_stmt;
use super::{AstPool, BinOp, ExprId, LoopPosition, Stmt, StmtId};

/// Toggles for the structural rewrites applied while folding.
#[derive(Debug, Clone)]
pub struct StructureConfig {
    /// Merge `if (c1) { if (c2) … }` into `if (c1 && c2) …`.
    pub merge_nested_guards: bool,
    /// Rewrite endless loops ending in a conditional break into post-tested
    /// loops.
    pub loop_rewrite: bool,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            merge_nested_guards: true,
            loop_rewrite: true,
        }
    }
}

/// Debug dump configuration.
#[derive(Debug, Clone, Default)]
pub struct DebugConfig {
    /// Dump each structured AST to stderr.
    pub dump_ast: bool,
    /// Restrict dumps to functions whose name contains this string.
    pub function_filter: Option<String>,
}

impl DebugConfig {
    /// `true` when no filter is set or `name` matches it.
    pub fn should_dump(&self, name: &str) -> bool {
        self.function_filter
            .as_deref()
            .map_or(true, |filter| name.contains(filter))
    }
}

/// The structuring driver.
///
/// Owns the statement pool for one module run and the per-function AST
/// roots. All statements are immutable once [`AstBackend::run_on_module`]
/// returns.
pub struct AstBackend {
    config: StructureConfig,
    debug: DebugConfig,
    pool: AstPool,
    ast_per_function: HashMap<FuncId, StmtId>,
}

impl Default for AstBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AstBackend {
    pub fn new() -> Self {
        Self::with_config(StructureConfig::default(), DebugConfig::default())
    }

    pub fn with_config(config: StructureConfig, debug: DebugConfig) -> Self {
        Self {
            config,
            debug,
            pool: AstPool::new(),
            ast_per_function: HashMap::new(),
        }
    }

    /// The pool holding every structured statement and expression.
    pub fn pool(&self) -> &AstPool {
        &self.pool
    }

    /// Root of the structured AST for `func`, absent for empty functions
    /// and for functions whose structuring was aborted.
    pub fn ast_for_function(&self, func: FuncId) -> Option<StmtId> {
        self.ast_per_function.get(&func).copied()
    }

    /// Structure every function in `module`.
    ///
    /// Previous results and the pool are discarded first. A function whose
    /// structuring fails is reported and skipped; the remaining functions
    /// still run.
    pub fn run_on_module(&mut self, module: &Module) {
        self.pool.clear();
        self.ast_per_function.clear();

        for (id, func) in module.functions.iter() {
            match self.run_on_function(func) {
                Ok(Some(root)) => {
                    self.ast_per_function.insert(id, root);
                    if self.debug.dump_ast && self.debug.should_dump(&func.name) {
                        eprintln!(
                            "=== AST: {} ===\n{}=== end AST ===\n",
                            func.name,
                            dump::dump(&self.pool, func, root)
                        );
                    }
                }
                Ok(None) => {}
                Err(err) => error!(function = %func.name, error = %err, "structuring aborted"),
            }
        }
    }

    /// Structure a single function to completion, returning the AST root.
    /// Empty functions structure to nothing.
    pub fn run_on_function(&mut self, func: &Function) -> Result<Option<StmtId>, CoreError> {
        if func.blocks.is_empty() {
            return Ok(None);
        }
        self.pool.begin_function();

        let mut structurizer = Structurizer::new(func, &self.config, &mut self.pool);
        let root = structurizer.run()?;
        debug!(function = %func.name, blocks = func.blocks.len(), "structured");
        Ok(Some(root))
    }
}

/// Per-function structuring state.
struct Structurizer<'a> {
    func: &'a Function,
    config: &'a StructureConfig,
    pool: &'a mut AstPool,
    grapher: AstGrapher,
    cfg: Cfg,
    domtree: DomTree,
    postdom: PostDomTree,
    /// Back-edge targets with the latches that close a cycle on them.
    latches: HashMap<BlockId, Vec<BlockId>>,
    /// Back-edge targets that still await their loop fold.
    pending_loops: HashSet<BlockId>,
}

impl<'a> Structurizer<'a> {
    fn new(func: &'a Function, config: &'a StructureConfig, pool: &'a mut AstPool) -> Self {
        let cfg = Cfg::new(func);
        let domtree = DomTree::compute(func, &cfg);
        let postdom = PostDomTree::compute(func, &cfg);
        let latches = back_edges(&cfg, func.entry);
        let pending_loops = latches.keys().copied().collect();

        Structurizer {
            func,
            config,
            pool,
            grapher: AstGrapher::new(),
            cfg,
            domtree,
            postdom,
            latches,
            pending_loops,
        }
    }

    fn run(&mut self) -> Result<StmtId, CoreError> {
        for entry in self.cfg.postorder(self.func.entry) {
            self.process_block(entry)?;
        }

        self.grapher
            .node_from_entry(self.func.entry)
            .map(|node| self.grapher.node(node).stmt)
            .ok_or_else(|| CoreError::MissingGraphNode {
                function: self.func.name.clone(),
                block: self.func.entry.index(),
            })
    }

    /// Register the block's leaf node, then climb the post-dominator tree
    /// proposing `(entry, exit)` candidates until `entry` stops dominating
    /// the candidate exit. `None` — the virtual end of the function — is
    /// always the last candidate.
    fn process_block(&mut self, entry: BlockId) -> Result<(), CoreError> {
        self.grapher.add_basic_block(self.func, self.pool, entry);

        let mut cursor = entry;
        loop {
            let candidate = match self.resolve_through_folds(cursor) {
                Some(block) => self.postdom.ipdom(block),
                None => None,
            };

            match candidate {
                Some(exit) => {
                    if self.is_region(entry, Some(exit)) {
                        self.fold_region(entry, Some(exit))?;
                    }
                    if !self.domtree.dominates(entry, exit) {
                        break;
                    }
                    cursor = exit;
                }
                None => {
                    if self.is_region(entry, None) {
                        self.fold_region(entry, None)?;
                    }
                    break;
                }
            }
        }
        Ok(())
    }

    /// Follow already-folded regions so the climb continues from the
    /// post-dominator of their exit instead of revisiting their interior.
    fn resolve_through_folds(&self, mut block: BlockId) -> Option<BlockId> {
        loop {
            match self.grapher.node_from_entry(block) {
                Some(id) => {
                    let node = *self.grapher.node(id);
                    if !node.has_distinct_exit() {
                        return Some(block);
                    }
                    match node.exit {
                        Some(next) => block = next,
                        None => return None,
                    }
                }
                None => return Some(block),
            }
        }
    }

    /// Region predicate: `(entry, exit)` bounds a single-entry/single-exit
    /// region iff every block reachable from `entry` without crossing
    /// `exit` is dominated by `entry` and post-dominated by `exit` (`None`
    /// stands for the function's end and post-dominates everything). The
    /// interval is half-open: `exit` itself lies outside the region.
    fn is_region(&self, entry: BlockId, exit: Option<BlockId>) -> bool {
        let mut queue = VecDeque::from([entry]);
        let mut visited = HashSet::from([entry]);

        while let Some(block) = queue.pop_front() {
            if !self.domtree.dominates(entry, block) {
                return false;
            }
            if let Some(exit) = exit {
                if !self.postdom.post_dominates(exit, block) {
                    return false;
                }
            }
            for &succ in self.cfg.succs(block) {
                if Some(succ) != exit && visited.insert(succ) {
                    queue.push_back(succ);
                }
            }
        }
        true
    }

    /// Whether every latch closing a cycle on `entry` lies inside the
    /// candidate region. A candidate that excludes a latch is only a slice
    /// of the cycle and must fold as a plain region instead.
    fn latches_inside(&self, entry: BlockId, exit: Option<BlockId>) -> bool {
        let Some(latches) = self.latches.get(&entry) else {
            return false;
        };

        let mut interior = HashSet::from([entry]);
        let mut queue = VecDeque::from([entry]);
        while let Some(block) = queue.pop_front() {
            for &succ in self.cfg.succs(block) {
                if Some(succ) != exit && interior.insert(succ) {
                    queue.push_back(succ);
                }
            }
        }
        latches
            .iter()
            .all(|latch| Some(*latch) != exit && interior.contains(latch))
    }

    /// Fold the region `(entry, exit)` into a single statement and
    /// register it with the grapher.
    fn fold_region(&mut self, entry: BlockId, exit: Option<BlockId>) -> Result<(), CoreError> {
        let as_loop = self.pending_loops.contains(&entry) && self.latches_inside(entry, exit);

        // The exit's node is the traversal sink; blocks later in post-order
        // may not have registered yet, so make sure it exists.
        if let Some(exit_block) = exit {
            self.grapher
                .add_basic_block(self.func, self.pool, exit_block);
        }

        let entry_node = self.require_node(entry)?;
        let sink = match exit {
            Some(exit_block) => Some(self.require_node(exit_block)?),
            None => None,
        };

        let reach =
            ReachingConditions::build(self.pool, &self.grapher, self.func, entry_node, sink)?;
        let order = self.region_order(entry_node, sink);

        let mut body: Vec<StmtId> = Vec::new();
        for &node in &order {
            let stmt = self.grapher.node(node).stmt;
            let dnf = reach.conditions.get(&stmt).ok_or_else(|| {
                CoreError::MissingReachingCondition {
                    function: self.func.name.clone(),
                }
            })?;
            let guards = dnf_to_cnf(self.pool, dnf);
            append_guarded(self.pool, &mut body, &guards, stmt);
        }

        if as_loop {
            // Control that reaches the sink leaves the loop; the sink's
            // reaching condition guards the break.
            if let Some(sink_node) = sink {
                let sink_stmt = self.grapher.node(sink_node).stmt;
                if let Some(dnf) = reach.conditions.get(&sink_stmt) {
                    let guards = dnf_to_cnf(self.pool, dnf);
                    let brk = self.pool.break_stmt();
                    append_guarded(self.pool, &mut body, &guards, brk);
                }
            }
        }

        let seq = self.pool.seq(body);
        let folded = if as_loop {
            let loop_body = simplify_stmt(self.pool, self.config, seq);
            let endless = self
                .pool
                .loop_stmt(LoopPosition::Endless, None, loop_body);
            simplify_stmt(self.pool, self.config, endless)
        } else {
            simplify_stmt(self.pool, self.config, seq)
        };

        self.grapher.update_region(entry, exit, folded);
        if as_loop {
            self.pending_loops.remove(&entry);
            trace!(
                function = %self.func.name,
                entry = entry.index(),
                "folded loop region"
            );
        } else {
            trace!(
                function = %self.func.name,
                entry = entry.index(),
                "folded region"
            );
        }
        Ok(())
    }

    fn require_node(&self, block: BlockId) -> Result<NodeId, CoreError> {
        self.grapher
            .node_from_entry(block)
            .ok_or_else(|| CoreError::MissingGraphNode {
                function: self.func.name.clone(),
                block: block.index(),
            })
    }

    /// Interior nodes of the region in reverse-postorder, entry first. The
    /// sink is excluded — the exit block belongs to the enclosing region.
    fn region_order(&self, entry: NodeId, sink: Option<NodeId>) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut visited = HashSet::from([entry]);
        if let Some(sink) = sink {
            visited.insert(sink);
        }

        let mut stack: Vec<(NodeId, usize)> = vec![(entry, 0)];
        loop {
            let Some(frame) = stack.last_mut() else {
                break;
            };
            let (node, idx) = *frame;
            let succs = self.grapher.successors(node, &self.cfg);
            if idx < succs.len() {
                frame.1 += 1;
                let succ = succs[idx];
                if visited.insert(succ) {
                    stack.push((succ, 0));
                }
            } else {
                stack.pop();
                order.push(node);
            }
        }
        order.reverse();
        // The sink was pre-marked visited, never pushed.
        debug_assert_eq!(order.first(), Some(&entry));
        order
    }
}

/// Append `stmt` to `body` wrapped in its guard sums, outermost first,
/// greedily reusing a trailing `IfElse` whose guard matches the sum — or
/// matches its negation, in which case the statement goes to the else
/// branch.
fn append_guarded(pool: &mut AstPool, body: &mut Vec<StmtId>, guards: &[Vec<ExprId>], stmt: StmtId) {
    // `None` targets `body` itself; `Some` targets a sequence statement
    // nested inside the if chain built so far.
    let mut target: Option<StmtId> = None;

    for sum in guards {
        let Some(guard) = pool.chain(BinOp::Or, sum) else {
            continue;
        };

        let last = match target {
            None => body.last().copied(),
            Some(seq) => match pool.stmt(seq) {
                Stmt::Seq(children) => children.last().copied(),
                _ => None,
            },
        };

        let mut descend: Option<StmtId> = None;
        if let Some(last_id) = last {
            if let Stmt::IfElse { cond, .. } = *pool.stmt(last_id) {
                if cond == guard {
                    descend = Some(then_sequence(pool, last_id));
                } else if pool.negates(cond, guard) {
                    descend = Some(else_sequence(pool, last_id));
                }
            }
        }

        target = Some(match descend {
            Some(seq) => seq,
            None => {
                let then_seq = pool.seq(Vec::new());
                let guarded = pool.if_else(guard, then_seq, None);
                push_to(pool, body, target, guarded);
                then_seq
            }
        });
    }

    push_to(pool, body, target, stmt);
}

fn push_to(pool: &mut AstPool, body: &mut Vec<StmtId>, target: Option<StmtId>, stmt: StmtId) {
    match target {
        None => body.push(stmt),
        Some(seq) => {
            if let Stmt::Seq(children) = pool.stmt_mut(seq) {
                children.push(stmt);
            }
        }
    }
}

/// The then branch of `if_stmt` as a sequence, wrapping it when the branch
/// currently holds a non-sequence statement.
fn then_sequence(pool: &mut AstPool, if_stmt: StmtId) -> StmtId {
    let then_stmt = match *pool.stmt(if_stmt) {
        Stmt::IfElse { then_stmt, .. } => then_stmt,
        _ => unreachable!("caller matched an IfElse"),
    };
    if matches!(pool.stmt(then_stmt), Stmt::Seq(_)) {
        return then_stmt;
    }
    let wrapped = pool.seq(vec![then_stmt]);
    if let Stmt::IfElse { then_stmt, .. } = pool.stmt_mut(if_stmt) {
        *then_stmt = wrapped;
    }
    wrapped
}

/// The else branch of `if_stmt` as a sequence, creating or wrapping it as
/// needed.
fn else_sequence(pool: &mut AstPool, if_stmt: StmtId) -> StmtId {
    let else_stmt = match *pool.stmt(if_stmt) {
        Stmt::IfElse { else_stmt, .. } => else_stmt,
        _ => unreachable!("caller matched an IfElse"),
    };
    match else_stmt {
        Some(els) if matches!(pool.stmt(els), Stmt::Seq(_)) => els,
        Some(els) => {
            let wrapped = pool.seq(vec![els]);
            if let Stmt::IfElse { else_stmt, .. } = pool.stmt_mut(if_stmt) {
                *else_stmt = Some(wrapped);
            }
            wrapped
        }
        None => {
            let fresh = pool.seq(Vec::new());
            if let Stmt::IfElse { else_stmt, .. } = pool.stmt_mut(if_stmt) {
                *else_stmt = Some(fresh);
            }
            fresh
        }
    }
}
