//! The game-state capability contract (spec 6).
//!
//! This is deliberately the only seam the engine has with a concrete
//! game. Everything downstream is generic over `G: GameState`; the
//! engine never knows anything about chess, tic-tac-toe, or any other
//! concrete rules, exactly as `iridium-oxide`'s `Game` trait keeps
//! `MCTS<G>` generic over the game it plays.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use crate::value::{Player, Value};

/// A predicate on a position, used to prune the carry-over cache after a
/// move is played (spec 3, "Carry-over cache"). `Arc` rather than `Box`
/// because a filter is cloned into the next move's cache-filtering pass
/// and may outlive the engine that produced it.
pub type ActionFilter<G> = Arc<dyn Fn(&G) -> bool + Send + Sync>;

/// The capability set an opaque position (`gs` in the spec) must expose.
///
/// `Clone + Eq + Hash` because positions are the node table's key; `Send
/// + Sync` because a position is cloned across the worker thread
/// boundary and, in the multi-root variant, across several of them at
/// once.
pub trait GameState: Clone + Eq + Hash + Debug + Send + Sync {
    /// The player to move in this position.
    fn player(&self) -> Player;

    /// All legal actions, as `(label, resulting position)` pairs, in a
    /// stable order for a given position. Labels need only be unique
    /// among a single position's own actions.
    fn actions(&self) -> Vec<(String, Self)>;

    /// `|actions(self)|`. Overridable for games that can answer this
    /// more cheaply than by materializing the full action list.
    fn numactions(&self) -> usize {
        self.actions().len()
    }

    /// `Some(v)` iff this position is terminal, with `v` the
    /// Maximizer-perspective outcome. Must return `None` for every
    /// non-terminal position.
    fn terminal(&self) -> Option<Value>;

    /// Per-label predicates used to prune the carry-over cache once a
    /// move is chosen: a cached `(position, node)` pair survives into
    /// the next search only if the predicate for the label actually
    /// played accepts that position. Labels absent from this list
    /// default to accepting every position.
    fn actionfilters(&self) -> Vec<(String, ActionFilter<Self>)> {
        Vec::new()
    }
}
