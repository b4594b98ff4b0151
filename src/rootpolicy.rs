//! Root move-choice policy (spec 4.G): after a search, turn the root's
//! node into a single chosen action, favouring a proven line when one
//! exists, falling back to LCB ranking otherwise, and to a second
//! least-evil search when every live line looks lost.
//!
//! Grounded in `agent.rs`'s `pick_best_move` (the teacher picks the
//! child with the highest visit count once its own move-budget elapses)
//! and `mcts.rs::best_move`; generalized from "most visits" to the
//! spec's LCB-based comparison, since a per-edge visit count alone can't
//! express the spec's pessimistic-bound ranking.

use crate::game::GameState;
use crate::node::Node;
use crate::nodetable::NodeTable;
use crate::params::McParams;
use crate::priority;
use crate::value::Value;

/// A pluggable replacement for the default LCB root policy (spec 4.G,
/// `bestactions` override).
pub trait RootSelector<G: GameState>: Send + Sync {
    /// Chooses one of `gs`'s legal actions given the node the search left
    /// at `gs`. Panics if `gs` has no legal actions — a non-terminal
    /// position with no actions is an invalid game implementation (spec
    /// 7), not a condition this trait is asked to recover from.
    fn choose(&self, gs: &G, root: &Node<G>, table: &NodeTable<G>, params: &McParams<G>) -> (String, G);
}

/// The default policy: a proven line if the root already collapsed to
/// one, otherwise the live or absorbed child with the best LCB.
#[derive(Debug, Default, Clone, Copy)]
pub struct LcbSelector;

impl<G: GameState> RootSelector<G> for LcbSelector {
    fn choose(&self, gs: &G, root: &Node<G>, table: &NodeTable<G>, params: &McParams<G>) -> (String, G) {
        let chosen = match root {
            Node::Terminal { carried, .. } => carried
                .first()
                .cloned()
                .unwrap_or_else(|| gs.actions().into_iter().next().expect(NO_ACTIONS).1),
            Node::InertTerminal(_) => gs.actions().into_iter().next().expect(NO_ACTIONS).1,
            Node::Bud { done, pending } => best_of_bud(done, pending),
            Node::Trunk { moveq, terminals, .. } => best_of_trunk(gs, moveq, terminals, table, params),
        };
        label_for(gs, chosen)
    }
}

const NO_ACTIONS: &str = "root position has no legal actions to choose from";

/// A `Bud` root (a search that never finished even one full expansion
/// round): rank by per-child mean, any untried child losing ties since
/// it carries no evidence at all.
fn best_of_bud<G: GameState>(done: &[(G, (Value, Value))], pending: &[G]) -> G {
    let best_done = done
        .iter()
        .map(|(child, (w, s))| (w / s, child))
        .max_by(|(a, _), (b, _)| a.total_cmp(b));
    match best_done {
        Some((mean, child)) if pending.is_empty() || mean > 0.0 => child.clone(),
        _ => pending
            .first()
            .or_else(|| done.first().map(|(child, _)| child))
            .expect(NO_ACTIONS)
            .clone(),
    }
}

/// A `Trunk` root: compare every live `moveq` entry's LCB against every
/// absorbed `terminals` entry's own (already decided) value, both folded
/// through the same `Player::favour` sign convention so they compare on
/// one scale.
fn best_of_trunk<G: GameState>(
    gs: &G,
    moveq: &std::collections::BinaryHeap<crate::node::PrioMove<G>>,
    terminals: &[G],
    table: &NodeTable<G>,
    params: &McParams<G>,
) -> G {
    let player = gs.player();
    let numactions = gs.numactions();

    let live = moveq
        .iter()
        .map(|pm| (priority::lcb(pm.childwins, pm.subsims, numactions, player, params), pm.pmove.clone()));
    let absorbed = terminals.iter().map(|child| {
        let value = match table.get(child) {
            Some(Node::Terminal { value, .. } | Node::InertTerminal(value)) => *value,
            other => unreachable!("a Trunk's `terminals` entry must itself be a Terminal node, found {other:?}"),
        };
        (player.favour(value), child.clone())
    });

    live.chain(absorbed)
        .max_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, child)| child)
        .expect(NO_ACTIONS)
}

fn label_for<G: GameState>(gs: &G, chosen: G) -> (String, G) {
    for (label, next) in gs.actions() {
        if next == chosen {
            return (label, next);
        }
    }
    unreachable!("chosen child must be one of gs's own actions")
}

/// Whether a searched root looks lost for the player to move: `Terminal`
/// at a losing bound, or a `Trunk`/`Bud` whose best LCB/mean is no better
/// than the losing bound. Callers use this to decide whether to fall
/// back to a least-evil search (spec 4.G, step 5).
pub fn root_looks_lost<G: GameState>(gs: &G, root: &Node<G>, table: &NodeTable<G>, params: &McParams<G>) -> bool {
    let player = gs.player();
    let losing_bound = player.opponent().bound(params.alpha, params.beta);
    match root {
        Node::Terminal { value, .. } => (*value - losing_bound).abs() < Value::EPSILON,
        Node::InertTerminal(value) => (*value - losing_bound).abs() < Value::EPSILON,
        Node::Bud { .. } => false,
        Node::Trunk { moveq, terminals, .. } => {
            let numactions = gs.numactions();
            let best_live = moveq
                .iter()
                .map(|pm| priority::lcb(pm.childwins, pm.subsims, numactions, player, params))
                .fold(Value::NEG_INFINITY, Value::max);
            let best_absorbed = terminals
                .iter()
                .filter_map(|child| match table.get(child) {
                    Some(Node::Terminal { value, .. } | Node::InertTerminal(value)) => Some(player.favour(*value)),
                    _ => None,
                })
                .fold(Value::NEG_INFINITY, Value::max);
            best_live.max(best_absorbed) <= player.favour(losing_bound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::advance_state;
    use crate::testgame::TicTacToe;

    #[test]
    fn lcb_selector_picks_a_legal_action() {
        let mut table = NodeTable::new();
        let root = TicTacToe::new();
        let params = McParams::default();
        let mut rng = fastrand::Rng::with_seed(1);
        for _ in 0..200 {
            advance_state(&mut table, &root, &params, &mut rng, 2, true);
        }
        let node = table.get(&root).expect("root must be present after searching").clone();
        let (label, next) = LcbSelector.choose(&root, &node, &table, &params);
        assert!(root.actions().into_iter().any(|(l, n)| l == label && n == next));
    }

    #[test]
    fn root_looks_lost_is_false_on_a_fresh_bud() {
        let table = NodeTable::<TicTacToe>::new();
        let root = TicTacToe::new();
        let params = McParams::default();
        let bud = Node::new_bud(&root);
        assert!(!root_looks_lost(&root, &bud, &table, &params));
    }
}
