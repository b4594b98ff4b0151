//! The background search worker (spec 4.F): a cooperatively cancellable
//! loop that repeatedly calls [`advance_state`] in chunks, checking a
//! wall-clock deadline, a caller-owned stop flag, and `maxsim` between
//! chunks.
//!
//! Grounded in `ugi.rs`'s `KEEP_RUNNING: AtomicBool` + `std::thread::Builder`
//! pattern (a background thread cooperatively checked rather than
//! forcibly killed) and `mcts.rs::SearchInfo::limit_reached`/`check_up`;
//! generalized from a single process-global flag to one `Arc<AtomicBool>`
//! per search, since the multi-root variant runs several searches
//! concurrently and each needs to be cancellable on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, trace};

use crate::game::GameState;
use crate::node::Node;
use crate::nodetable::NodeTable;
use crate::params::McParams;
use crate::select::advance_state;
use crate::value::Value;

/// A cooperative stop signal shared between a worker and whoever may want
/// to cancel it early.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn signal(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs the search loop to completion on the calling thread: chunks of
/// `advancechunks` descents, with a deadline/stop/`maxsim` check between
/// chunks (spec 4.F). `params.background == false` is a no-op, per spec
/// 6 ("disables the background worker entirely").
pub fn run_to_completion<G: GameState>(
    mut table: NodeTable<G>,
    root: &G,
    params: &McParams<G>,
    stop: &StopFlag,
    rng: &mut fastrand::Rng,
) -> NodeTable<G> {
    if !params.background {
        return table;
    }
    let start = Instant::now();
    loop {
        let numrolls = numrolls_for(&table, root, params);
        for _ in 0..params.advancechunks {
            advance_state(&mut table, root, params, rng, numrolls, true);
        }
        let sims = root_sims(&table, root);
        let elapsed = start.elapsed();
        trace!(chunk = params.advancechunks, root_sims = sims, ?elapsed, "advanced a chunk");
        if stop.is_set() {
            info!(root_sims = sims, ?elapsed, "stop flag observed, worker returning");
            break;
        }
        if elapsed >= params.duration || sims >= params.maxsim {
            debug!(root_sims = sims, ?elapsed, "search deadline or maxsim reached");
            break;
        }
    }
    table
}

/// Spawns [`run_to_completion`] on a dedicated OS thread, named like the
/// teacher's own worker threads (`ugi.rs`'s `"stdin-reader"`). The
/// `NodeTable` moves into the thread and comes back out through the
/// returned handle's `join`.
pub fn spawn<G: GameState + 'static>(
    table: NodeTable<G>,
    root: G,
    params: McParams<G>,
    stop: StopFlag,
    mut rng: fastrand::Rng,
) -> std::thread::JoinHandle<NodeTable<G>> {
    std::thread::Builder::new()
        .name("mcts-worker".into())
        .spawn(move || run_to_completion(table, &root, &params, &stop, &mut rng))
        .expect("failed to spawn mcts search worker thread")
}

/// `numrollsI` (spec 4.F): grows with the root's own visit count so a
/// search that has already run for a while samples each fresh leaf more
/// thoroughly than one that just started.
fn numrolls_for<G: GameState>(table: &NodeTable<G>, root: &G, params: &McParams<G>) -> u32 {
    let sims = root_sims(table, root);
    params.numrolls_base + (sims / params.simsperroll) as u32
}

fn root_sims<G: GameState>(table: &NodeTable<G>, root: &G) -> Value {
    match table.get(root) {
        Some(Node::Trunk { sims, .. }) => *sims,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testgame::TicTacToe;
    use std::time::Duration;

    #[test]
    fn run_to_completion_respects_a_short_deadline() {
        let table = NodeTable::new();
        let root = TicTacToe::new();
        let mut params = McParams::default();
        params.duration = Duration::from_millis(20);
        params.advancechunks = 4;
        let stop = StopFlag::new();
        let mut rng = fastrand::Rng::with_seed(9);
        let table = run_to_completion(table, &root, &params, &stop, &mut rng);
        assert!(table.len() > 1);
    }

    #[test]
    fn background_false_is_a_no_op() {
        let table = NodeTable::<TicTacToe>::new();
        let root = TicTacToe::new();
        let mut params = McParams::default();
        params.background = false;
        let stop = StopFlag::new();
        let mut rng = fastrand::Rng::with_seed(1);
        let table = run_to_completion(table, &root, &params, &stop, &mut rng);
        assert!(table.is_empty());
    }

    #[test]
    fn signalling_stop_ends_the_loop_promptly() {
        let table = NodeTable::new();
        let root = TicTacToe::new();
        let mut params = McParams::default();
        params.duration = Duration::from_secs(60);
        params.advancechunks = 1;
        let stop = StopFlag::new();
        stop.signal();
        let mut rng = fastrand::Rng::with_seed(2);
        let start = Instant::now();
        let _ = run_to_completion(table, &root, &params, &stop, &mut rng);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn spawn_joins_back_a_populated_table() {
        let table = NodeTable::new();
        let root = TicTacToe::new();
        let mut params = McParams::default();
        params.duration = Duration::from_millis(20);
        params.advancechunks = 4;
        let handle = spawn(table, root, params, StopFlag::new(), fastrand::Rng::with_seed(4));
        let table = handle.join().expect("worker thread must not panic");
        assert!(table.len() > 1);
    }
}
