//! Position-keyed node storage (spec 4.D).
//!
//! The teacher's `SearchTree` is a flat `Vec<Node<G>>` arena addressed by
//! parent/child index ranges — efficient, but it cannot express the
//! spec's carry-over cache (a previous move's nodes, keyed by the
//! positions themselves, seeded into the *next* move's search before any
//! descent has happened). `NodeTable` replaces it with a hash map keyed
//! on the position, per spec 4.D ("Hash-keyed on position ... O(1)
//! expected lookup/insert") and `DESIGN NOTES` ("Hash-indexed node
//! table ... Single-writer during search simplifies choice").

use std::collections::HashMap;

use crate::game::GameState;
use crate::node::Node;

/// A compact snapshot of a node table, handed from one move to the next
/// (spec 3, "Carry-over cache (MCCache)").
pub type McCache<G> = Vec<(G, Node<G>)>;

#[derive(Clone)]
pub struct NodeTable<G: GameState> {
    map: HashMap<G, Node<G>>,
}

impl<G: GameState> NodeTable<G> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Seeds a table from the previous move's carry-over cache, with a
    /// capacity hint of `cache.len() + extracache` (spec 4.D).
    #[must_use]
    pub fn from_cache(cache: McCache<G>, extracache: usize) -> Self {
        let mut map = HashMap::with_capacity(cache.len() + extracache);
        map.extend(cache);
        Self { map }
    }

    /// `get(gs)`: the existing node, or a freshly inserted `mkBud(gs)`
    /// (spec 4.D). Unlike [`Node::for_new_position`], this never checks
    /// terminality — callers that might be looking up a terminal
    /// position (the root, or a freshly generated child) go through
    /// [`Self::put_fresh`] instead, per spec 4.E's explicit terminal
    /// check before insertion.
    pub fn get_or_insert_bud(&mut self, gs: &G) -> &mut Node<G> {
        self.map
            .entry(gs.clone())
            .or_insert_with(|| Node::new_bud(gs))
    }

    #[must_use]
    pub fn get(&self, gs: &G) -> Option<&Node<G>> {
        self.map.get(gs)
    }

    /// `put(gs, node)`: unconditional replace.
    pub fn put(&mut self, gs: G, node: Node<G>) {
        self.map.insert(gs, node);
    }

    /// Inserts a terminal/Bud node for `gs` only if it is not already
    /// present, choosing the terminal variant per `inert` when `gs` is
    /// terminal (spec 4.E step 2: "Put `ngs` to a fresh Bud if it is not
    /// already present AND it is non-terminal; if terminal, put
    /// `Terminal`/`InertTerminal`").
    pub fn put_fresh(&mut self, gs: &G, inert: bool) {
        self.map
            .entry(gs.clone())
            .or_insert_with(|| Node::for_new_position(gs, inert));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Snapshots this table into a carry-over cache, keeping only entries
    /// whose position passes `keep` (spec 3, "On move-selection, it is
    /// filtered by the chosen action's label predicate").
    pub fn into_cache_filtered(self, mut keep: impl FnMut(&G) -> bool) -> McCache<G> {
        self.map.into_iter().filter(|(gs, _)| keep(gs)).collect()
    }
}

impl<G: GameState> Default for NodeTable<G> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testgame::TicTacToe;

    #[test]
    fn fresh_lookup_creates_bud() {
        let mut table = NodeTable::<TicTacToe>::new();
        let root = TicTacToe::new();
        assert!(table.get(&root).is_none());
        let node = table.get_or_insert_bud(&root);
        assert!(matches!(node, Node::Bud { .. }));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn carry_over_cache_filters_by_predicate() {
        let root = TicTacToe::new();
        let mut table = NodeTable::<TicTacToe>::new();
        for (_, child) in root.actions() {
            table.put_fresh(&child, false);
        }
        let cache = table.into_cache_filtered(|gs| gs.move_count() == 1);
        assert!(cache.iter().all(|(gs, _)| gs.move_count() == 1));
        assert!(!cache.is_empty());
    }
}
