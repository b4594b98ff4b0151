//! The tagged node model (spec 3, 4.C).
//!
//! Generalizes the teacher's `treenode::Node` — a flat, array-indexed,
//! untagged struct — into the sum type the spec's lifecycle calls for
//! (`DESIGN NOTES`: "Tagged variants for nodes ... avoid class-hierarchy
//! emulation"). A position's node is one of:
//!
//! - [`Node::InertTerminal`] — terminal, but not usable as proof (least-evil search only).
//! - [`Node::Terminal`] — terminal, and its value *is* proof; can collapse a parent.
//! - [`Node::Bud`] — partially expanded.
//! - [`Node::Trunk`] — fully expanded, with a live priority queue of children.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::game::GameState;
use crate::params::McParams;
use crate::rollout;
use crate::value::Value;

/// One entry of a [`Node::Trunk`]'s priority queue.
///
/// Ordered by `priority` alone (a max-heap pops the most promising
/// child); equal by `pmove` alone, per spec 3 ("equality by pmove").
/// `childwins` is bookkeeping the spec's three-field description omits:
/// the priority formula needs the child's current mean (`childwins /
/// subsims`) at every reinsertion, and that mean has to be accumulated
/// somewhere since the node table's entry for the child tracks that
/// child's *own* subtree, not this edge's running total (see
/// `DESIGN.md`, "PrioMove bookkeeping").
#[derive(Debug, Clone)]
pub struct PrioMove<G> {
    pub priority: Value,
    pub subsims: Value,
    pub childwins: Value,
    pub pmove: G,
}

impl<G: PartialEq> PartialEq for PrioMove<G> {
    fn eq(&self, other: &Self) -> bool {
        self.pmove == other.pmove
    }
}

impl<G: Eq> Eq for PrioMove<G> {}

impl<G: PartialEq> PartialOrd for PrioMove<G> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<G: PartialEq> Ord for PrioMove<G> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.total_cmp(&other.priority)
    }
}

/// A position's node in the search tree (spec 3).
#[derive(Debug, Clone)]
pub enum Node<G: GameState> {
    /// A terminal whose value must not prune its parent (least-evil mode).
    InertTerminal(Value),
    /// A terminal whose value is proof and can collapse a parent. `carried`
    /// holds the sibling positions folded in when a `Trunk` collapsed here
    /// (spec 4.E, "carrying terminals' ... for move-replay"); empty for a
    /// position that was terminal from the start.
    Terminal { value: Value, carried: Vec<G> },
    /// Partially expanded: `done` holds one `(accumulated-w, sqrt-rollouts)`
    /// pair per child already sampled once, `pending` the rest.
    Bud {
        done: Vec<(G, (Value, Value))>,
        pending: Vec<G>,
    },
    /// Fully expanded.
    Trunk {
        sims: Value,
        wins: Value,
        moveq: BinaryHeap<PrioMove<G>>,
        terminals: Vec<G>,
        worstcase: Value,
    },
}

impl<G: GameState> Node<G> {
    /// `mkBud(gs)` (spec 4.C): a freshly created node for a non-terminal
    /// position, no children sampled yet.
    pub fn new_bud(gs: &G) -> Self {
        let pending = gs.actions().into_iter().map(|(_, next)| next).collect();
        Self::Bud {
            done: Vec::new(),
            pending,
        }
    }

    /// Creates the node a first lookup of `gs` should produce: a terminal
    /// node if `gs` is terminal, a fresh `Bud` otherwise. `inert` controls
    /// which terminal variant is used (spec 3, "InertTerminal never
    /// appears in a non-least-evil search").
    pub fn for_new_position(gs: &G, inert: bool) -> Self {
        match gs.terminal() {
            Some(v) if inert => Self::InertTerminal(v),
            Some(v) => Self::Terminal {
                value: v,
                carried: Vec::new(),
            },
            None => Self::new_bud(gs),
        }
    }
}

/// `leafExpand(gs, params, rng)` (spec 4.C): `numrolls` independent
/// rollouts from `gs`, returning `(w_normalized, sqrt(numrolls))` so that
/// UCB arithmetic cancels uniformly regardless of how many rollouts a
/// given leaf visit performed.
pub fn leaf_expand<G: GameState>(gs: &G, numrolls: u32, rng: &mut fastrand::Rng) -> (Value, Value) {
    debug_assert!(numrolls > 0, "leaf_expand: numrolls must be positive");
    let sum = rollout::rollouts(numrolls, gs, rng);
    let sqrt_n = Value::from(numrolls).sqrt();
    (sum / sqrt_n, sqrt_n)
}

/// `budToTrunk(gs, done, params)` (spec 4.C): once every child of a `Bud`
/// has been sampled once, build the `Trunk`'s priority queue from the
/// accumulated `(w, s)` pairs.
pub fn bud_to_trunk<G: GameState>(
    gs: &G,
    done: Vec<(G, (Value, Value))>,
    params: &McParams<G>,
) -> Node<G> {
    let player = gs.player();
    let numactions = gs.numactions();
    let worstcase = player.opponent().bound(params.alpha, params.beta);

    let mut sims = 0.0;
    let mut wins = 0.0;
    let mut moveq = BinaryHeap::with_capacity(done.len());
    for (child, (w, s)) in done {
        sims += s;
        wins += w;
        let priority = crate::priority::priority(w, s, numactions, player, params);
        moveq.push(PrioMove {
            priority,
            subsims: s,
            childwins: w,
            pmove: child,
        });
    }

    Node::Trunk {
        sims,
        wins,
        moveq,
        terminals: Vec::new(),
        worstcase,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::McParams;
    use crate::testgame::TicTacToe;

    #[test]
    fn bud_to_trunk_sum_consistency() {
        // Round-trip law (spec 8): sims == sum of subsims of the
        // constructed moveq.
        let root = TicTacToe::new();
        let params = McParams::<TicTacToe>::default();
        let mut rng = fastrand::Rng::with_seed(7);
        let children: Vec<_> = root.actions().into_iter().map(|(_, n)| n).collect();
        let done: Vec<_> = children
            .into_iter()
            .map(|c| {
                let (w, s) = leaf_expand(&c, 4, &mut rng);
                (c, (w, s))
            })
            .collect();
        let expected_sims: Value = done.iter().map(|(_, (_, s))| *s).sum();
        let trunk = bud_to_trunk(&root, done, &params);
        if let Node::Trunk { sims, moveq, .. } = trunk {
            let queue_sum: Value = moveq.iter().map(|pm| pm.subsims).sum();
            assert!((sims - expected_sims).abs() < 1e-9);
            assert!((sims - queue_sum).abs() < 1e-9);
        } else {
            panic!("expected a Trunk");
        }
    }
}
