//! The top-level search facade (spec 4.H): owns the node table for the
//! current position and exposes `think` (search and report, don't
//! commit) and `act` (search, commit, and carry the relevant subtree
//! forward into the next position's table).
//!
//! Grounded in `mcts.rs::MCTS` (the teacher's own top-level struct
//! pairing a `SearchTree` with its own `rng`), generalized from a single
//! fixed-capacity tree to the hash-keyed `NodeTable` plus an explicit
//! carry-over step between moves (spec 3, "Carry-over cache").

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::game::GameState;
use crate::node::Node;
use crate::nodetable::NodeTable;
use crate::params::McParams;
use crate::priority;
use crate::rootpolicy::{root_looks_lost, LcbSelector, RootSelector};
use crate::value::Value;
use crate::worker::{self, StopFlag};

pub struct Engine<G: GameState> {
    position: G,
    table: NodeTable<G>,
    params: McParams<G>,
}

impl<G: GameState + 'static> Engine<G> {
    #[must_use]
    pub fn new(position: G, params: McParams<G>) -> Self {
        Self {
            position,
            table: NodeTable::new(),
            params,
        }
    }

    #[must_use]
    pub fn position(&self) -> &G {
        &self.position
    }

    /// Starts a background search from the current position and returns a
    /// pending [`Pondering`] rather than blocking (spec 4.H, `think ->
    /// pendingThunk`). The search runs on its own thread via
    /// [`worker::spawn`] against the `stop` flag handed in, so the caller
    /// can keep doing other work and signal `stop` whenever it wants the
    /// search to wrap up, then call [`Pondering::join`] to collect the
    /// move it would choose. Does not commit to the move or mutate `self`.
    pub fn think(&self, stop: &StopFlag) -> Pondering<G> {
        debug!(position = ?self.position, "think: spawning a background search");
        if self.position.terminal().is_some() {
            return Pondering::idle(self.position.clone(), self.params.clone(), self.table.clone());
        }
        let rng = fastrand::Rng::new();
        let handle = worker::spawn(self.table.clone(), self.position.clone(), self.params.clone(), stop.clone(), rng);
        Pondering::spawned(self.position.clone(), self.params.clone(), handle)
    }

    /// `think`, then commits: advances to the chosen position and seeds
    /// the next search's table from this search's carry-over cache,
    /// filtered by the chosen action's own label predicate (spec 3).
    ///
    /// Unlike `think`, this realizes spec 2/5's control flow directly:
    /// starts the worker, sleeps until the deadline, signals stop, joins,
    /// then invokes the root policy.
    pub fn act(&mut self, stop: &StopFlag) -> Result<(String, G), EngineError> {
        debug!(position = ?self.position, "act: starting a foreground search");
        let table = std::mem::replace(&mut self.table, NodeTable::new());
        self.table = run_foreground_search(table, &self.position, &self.params, stop);
        let (label, next) = choose(&self.position, &self.table, &self.params)?;

        let keep = self
            .position
            .actionfilters()
            .into_iter()
            .find(|(l, _)| *l == label)
            .map_or_else(|| Arc::new(|_: &G| false) as crate::game::ActionFilter<G>, |(_, filter)| filter);

        let old_table = std::mem::replace(&mut self.table, NodeTable::new());
        let cache = old_table.into_cache_filtered(|gs| keep(gs));
        self.table = NodeTable::from_cache(cache, self.params.extracache);
        self.position = next.clone();

        info!(chosen = %label, table_len = self.table.len(), "committed to a move");
        Ok((label, next))
    }

    /// The optional "independent roots then combine" parallel variant
    /// (spec 5): runs `num_roots` disjoint searches from the current
    /// position — each with its own `NodeTable` and its own
    /// `fastrand::Rng`, all sharing the single `stop` flag so one deadline
    /// governs every worker — then aggregates per spec 5's recipe: "for
    /// each move label, sum child `wins` and `sims` across roots, then
    /// apply the LCB selector on the aggregate". If the aggregated result
    /// still looks lost, reruns with `least_evil_params()`, mirroring the
    /// single-root fallback (spec 5, "Least-evil runs similarly with
    /// inert=true").
    ///
    /// Grounded in the teacher's `root_parallelism_count` field on
    /// `Behaviour` (a config knob `MCTS::search` never actually wired up
    /// to real parallel execution, per a sanity-check-only `assert_eq!`);
    /// this gives it a real implementation using `std::thread::scope`,
    /// the teacher's only other threading precedent (`ugi.rs`'s
    /// `std::thread::Builder`), rather than the `rayon`/`crossbeam`
    /// dependencies the teacher carries but never applies to its MCTS
    /// search loop (dropped, see `DESIGN.md`).
    ///
    /// Does not mutate `self`: like [`Self::think`], it reports a move
    /// without committing the position or the carry-over cache.
    pub fn think_parallel(&self, stop: &StopFlag, num_roots: usize) -> Result<(String, G), EngineError> {
        if self.position.terminal().is_some() || self.position.actions().is_empty() {
            return Err(EngineError::NoLegalActions(format!("{:?}", self.position)));
        }
        let tables = run_parallel_roots(&self.position, &self.params, stop, num_roots);
        let (label, next, looks_lost) = choose_from_parallel_roots(&self.position, &tables, &self.params)?;
        if !looks_lost {
            return Ok((label, next));
        }

        warn!("every parallel root looks lost, falling back to a least-evil parallel search");
        let evil_params = self.params.least_evil_params();
        let evil_tables = run_parallel_roots(&self.position, &evil_params, stop, num_roots);
        let (label, next, _) = choose_from_parallel_roots(&self.position, &evil_tables, &evil_params)?;
        Ok((label, next))
    }
}

/// A pending search started by [`Engine::think`]: either a genuinely
/// backgrounded [`worker::spawn`] handle, or an already-settled table for
/// a position that was terminal from the start (spawning a thread for a
/// position with no search left to do would just be wasted overhead).
pub struct Pondering<G: GameState> {
    position: G,
    params: McParams<G>,
    inner: PonderingInner<G>,
}

enum PonderingInner<G: GameState> {
    Spawned(std::thread::JoinHandle<NodeTable<G>>),
    Idle(NodeTable<G>),
}

impl<G: GameState + 'static> Pondering<G> {
    fn spawned(position: G, params: McParams<G>, handle: std::thread::JoinHandle<NodeTable<G>>) -> Self {
        Self {
            position,
            params,
            inner: PonderingInner::Spawned(handle),
        }
    }

    fn idle(position: G, params: McParams<G>, table: NodeTable<G>) -> Self {
        Self {
            position,
            params,
            inner: PonderingInner::Idle(table),
        }
    }

    /// Blocks until the background search finishes — on its own deadline
    /// or `maxsim`, or because the caller signalled the `StopFlag` it was
    /// handed in [`Engine::think`] — then reports the move it would
    /// choose.
    pub fn join(self) -> Result<(String, G), EngineError> {
        let table = match self.inner {
            PonderingInner::Spawned(handle) => handle.join().expect("search worker thread must not panic"),
            PonderingInner::Idle(table) => table,
        };
        choose(&self.position, &table, &self.params)
    }
}

/// Realizes spec 2/5's literal control flow for a single blocking search:
/// spawn the worker, sleep until the deadline, signal stop, join. A
/// terminal position has nothing to search, so it short-circuits without
/// spawning a thread at all.
fn run_foreground_search<G: GameState + 'static>(
    table: NodeTable<G>,
    position: &G,
    params: &McParams<G>,
    stop: &StopFlag,
) -> NodeTable<G> {
    if position.terminal().is_some() {
        return table;
    }
    let rng = fastrand::Rng::new();
    let handle = worker::spawn(table, position.clone(), params.clone(), stop.clone(), rng);
    std::thread::sleep(params.duration);
    stop.signal();
    handle.join().expect("search worker thread must not panic")
}

/// Turns a searched root into a chosen action (spec 4.G), falling back to
/// a least-evil re-search when the root looks lost for the player to
/// move. Shared by [`Engine::act`] and [`Pondering::join`].
fn choose<G: GameState + 'static>(
    position: &G,
    table: &NodeTable<G>,
    params: &McParams<G>,
) -> Result<(String, G), EngineError> {
    // A decided game has nothing left to choose, regardless of whether
    // the underlying `GameState` happens to still report some
    // squares/cells as nominally playable (most board games keep
    // accepting moves past a win unless the implementation itself stops
    // generating them).
    if position.terminal().is_some() || position.actions().is_empty() {
        return Err(EngineError::NoLegalActions(format!("{position:?}")));
    }

    let selector: Arc<dyn RootSelector<G>> = params.bestactions.clone().unwrap_or_else(|| Arc::new(LcbSelector));

    let root = table
        .get(position)
        .cloned()
        .unwrap_or_else(|| Node::for_new_position(position, false));

    if !root_looks_lost(position, &root, table, params) {
        return Ok(selector.choose(position, &root, table, params));
    }

    warn!("root looks lost, falling back to a least-evil search");
    let evil_params = params.least_evil_params();
    let stop = StopFlag::new();
    let evil_table = run_foreground_search(NodeTable::new(), position, &evil_params, &stop);
    let evil_root = evil_table
        .get(position)
        .cloned()
        .unwrap_or_else(|| Node::for_new_position(position, true));
    Ok(selector.choose(position, &evil_root, &evil_table, &evil_params))
}

/// Runs `num_roots.max(1)` independent [`worker::run_to_completion`]
/// searches from `root`, each on its own OS thread with a fresh
/// `NodeTable` and `fastrand::Rng`, and returns every resulting table.
fn run_parallel_roots<G: GameState>(
    root: &G,
    params: &McParams<G>,
    stop: &StopFlag,
    num_roots: usize,
) -> Vec<NodeTable<G>> {
    let n = num_roots.max(1);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..n)
            .map(|_| {
                scope.spawn(|| {
                    let mut rng = fastrand::Rng::new();
                    worker::run_to_completion(NodeTable::new(), root, params, stop, &mut rng)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("parallel search worker must not panic"))
            .collect()
    })
}

/// Aggregates `tables` per spec 5 and applies the LCB selector to the
/// combined totals. Returns, alongside the chosen `(label, position)`,
/// whether that choice still looks lost for the player to move — the
/// same bound [`root_looks_lost`] uses for the single-root path — so
/// callers can decide whether to rerun with `least_evil_params()`.
///
/// A table whose root already collapsed to a proven `Terminal` is treated
/// as decisive on its own (a proof from one root is still a proof), ahead
/// of averaging in less-certain roots; otherwise each action's `moveq`
/// contribution (`childwins`, `subsims`) is summed across every table
/// that still has it live, and a child proven terminal in *any* table is
/// scored by that proof directly rather than folded into the sum.
fn choose_from_parallel_roots<G: GameState>(
    gs: &G,
    tables: &[NodeTable<G>],
    params: &McParams<G>,
) -> Result<(String, G, bool), EngineError> {
    if gs.actions().is_empty() {
        return Err(EngineError::NoLegalActions(format!("{gs:?}")));
    }

    let player = gs.player();
    let losing_bound = player.opponent().bound(params.alpha, params.beta);

    for table in tables {
        if let Some(root @ Node::Terminal { .. }) = table.get(gs) {
            let (label, next) = LcbSelector.choose(gs, root, table, params);
            let looks_lost = root_looks_lost(gs, root, table, params);
            return Ok((label, next, looks_lost));
        }
    }

    let numactions = gs.numactions();
    let actions = gs.actions();

    let mut best: Option<(Value, &String, &G)> = None;
    for (label, child) in &actions {
        let score = aggregate_score(child, gs, tables, player, numactions, params);
        let is_better = match best {
            Some((b, ..)) => score > b,
            None => true,
        };
        if is_better {
            best = Some((score, label, child));
        }
    }
    let (score, label, child) = best.expect("root position has at least one action");
    let looks_lost = score <= player.favour(losing_bound);
    Ok((label.clone(), child.clone(), looks_lost))
}

/// The aggregate LCB for one of `root`'s actions (`child`) across every
/// table: a proof (a `Terminal`/`InertTerminal` node for `child`, found by
/// direct lookup since positions are globally keyed) wins outright;
/// otherwise the `(childwins, subsims)` pairs each table's own root
/// `Trunk.moveq` holds for `child` are summed across tables before the
/// LCB formula is applied once to the combined total, per spec 5's
/// "sum ... then apply".
fn aggregate_score<G: GameState>(
    child: &G,
    root: &G,
    tables: &[NodeTable<G>],
    player: crate::value::Player,
    numactions: usize,
    params: &McParams<G>,
) -> Value {
    for table in tables {
        if let Some(Node::Terminal { value, .. } | Node::InertTerminal(value)) = table.get(child) {
            return player.favour(*value);
        }
    }

    let mut total_wins = 0.0;
    let mut total_subsims = 0.0;
    for table in tables {
        if let Some(Node::Trunk { moveq, .. }) = table.get(root) {
            for pm in moveq {
                if &pm.pmove == child {
                    total_wins += pm.childwins;
                    total_subsims += pm.subsims;
                }
            }
        }
    }

    if total_subsims <= 0.0 {
        return Value::NEG_INFINITY;
    }
    priority::lcb(total_wins, total_subsims, numactions, player, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testgame::TicTacToe;
    use std::time::Duration;

    fn quick_params() -> McParams<TicTacToe> {
        let mut params = McParams::default();
        params.duration = Duration::from_millis(25);
        params.advancechunks = 4;
        params
    }

    #[test]
    fn think_reports_a_legal_move_without_advancing() {
        let root = TicTacToe::new();
        let engine = Engine::new(root, quick_params());
        let stop = StopFlag::new();
        let (label, next) = engine.think(&stop).join().expect("search must find a move");
        assert_eq!(engine.position(), &root);
        assert!(root.actions().into_iter().any(|(l, n)| l == label && n == next));
    }

    #[test]
    fn think_can_be_cancelled_early_by_the_caller() {
        let root = TicTacToe::new();
        let mut params = quick_params();
        params.duration = Duration::from_secs(60);
        let engine = Engine::new(root, params);
        let stop = StopFlag::new();
        let pondering = engine.think(&stop);
        stop.signal();
        let (label, next) = pondering.join().expect("a cancelled search still reports a move");
        assert!(root.actions().into_iter().any(|(l, n)| l == label && n == next));
    }

    #[test]
    fn act_advances_the_position_and_keeps_a_nonempty_cache() {
        let root = TicTacToe::new();
        let mut engine = Engine::new(root, quick_params());
        let stop = StopFlag::new();
        let (_, next) = engine.act(&stop).expect("search must find a move");
        assert_eq!(engine.position(), &next);
        assert_ne!(engine.position(), &root);
    }

    #[test]
    fn acting_on_a_terminal_position_reports_no_legal_actions() {
        let mut terminal = TicTacToe::new();
        while terminal.outcome().is_none() {
            let (_, next) = terminal.actions().into_iter().next().unwrap();
            terminal = next;
        }
        let mut engine = Engine::new(terminal, quick_params());
        let stop = StopFlag::new();
        assert!(matches!(engine.act(&stop), Err(EngineError::NoLegalActions(_))));
    }

    #[test]
    fn think_parallel_reports_a_legal_move() {
        let root = TicTacToe::new();
        let engine = Engine::new(root, quick_params());
        let stop = StopFlag::new();
        let (label, next) = engine
            .think_parallel(&stop, 4)
            .expect("parallel search must find a move");
        assert!(root.actions().into_iter().any(|(l, n)| l == label && n == next));
    }

    #[test]
    fn think_parallel_on_a_terminal_position_reports_no_legal_actions() {
        let mut terminal = TicTacToe::new();
        while terminal.outcome().is_none() {
            let (_, next) = terminal.actions().into_iter().next().unwrap();
            terminal = next;
        }
        let engine = Engine::new(terminal, quick_params());
        let stop = StopFlag::new();
        assert!(matches!(
            engine.think_parallel(&stop, 3),
            Err(EngineError::NoLegalActions(_))
        ));
    }
}
