//! The UCB-style priority formula used during descent (spec 4.E) and its
//! LCB counterpart used at the root after a search (spec 4.G).
//!
//! Grounded in `ucb.rs::ucb1_value`, generalized from a single
//! `exp_factor` to the spec's separate exploitation/exploration
//! coefficients, and from an always-Maximizer mean to the
//! player-relative `favour` the spec's formula requires (a Minimizer's
//! priority is the negation of the Maximizer-shaped expression, per
//! spec 4.E's literal `priority = absval if P=Maximizer else -absval`).

use crate::game::GameState;
use crate::params::McParams;
use crate::value::{Player, Value};

/// `priority` for a child with accumulated `childwins` over `subsims`
/// visits, where the parent has `numactions` legal moves and `player` is
/// to move at the parent.
pub fn priority<G: GameState>(
    childwins: Value,
    subsims: Value,
    numactions: usize,
    player: Player,
    params: &McParams<G>,
) -> Value {
    let absval = params.exploitation * (childwins / subsims)
        + params.exploration * ((numactions as Value).ln() / subsims).sqrt();
    player.favour(absval)
}

/// A lower confidence bound on the same child, for root move selection
/// (spec 4.G): identical to `priority` but with the exploration term's
/// sign reversed, so it estimates a pessimistic rather than optimistic
/// value.
pub fn lcb<G: GameState>(
    childwins: Value,
    subsims: Value,
    numactions: usize,
    player: Player,
    params: &McParams<G>,
) -> Value {
    let absval = params.exploitation * (childwins / subsims)
        - params.exploration * ((numactions as Value).ln() / subsims).sqrt();
    player.favour(absval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testgame::TicTacToe;

    #[test]
    fn unvisited_child_has_no_special_case_needed() {
        // subsims is always >= sqrt(numrollsI) > 0 after the first
        // expansion (spec 9, "Numeric semantics"), so priority/lcb never
        // divide by zero in practice; this just checks the formula is
        // well-defined for a small positive subsims.
        let params = McParams::<TicTacToe>::default();
        let p = priority(0.5, 1.0, 4, Player::Maximizer, &params);
        assert!(p.is_finite());
    }

    #[test]
    fn minimizer_priority_is_negated_maximizer_shape() {
        let params = McParams::<TicTacToe>::default();
        let max_p = priority(0.5, 2.0, 4, Player::Maximizer, &params);
        let min_p = priority(0.5, 2.0, 4, Player::Minimizer, &params);
        assert!((max_p + min_p).abs() < 1e-12);
    }

    #[test]
    fn lcb_le_priority_for_maximizer() {
        let params = McParams::<TicTacToe>::default();
        let p = priority(0.5, 2.0, 4, Player::Maximizer, &params);
        let l = lcb(0.5, 2.0, 4, Player::Maximizer, &params);
        assert!(l <= p);
    }
}
