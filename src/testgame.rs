//! A minimal `GameState` implementation used only by this crate's own
//! tests, grounded in `games/tictactoe.rs`'s bitboard representation
//! (two 9-bit masks, one per side, plus a move counter) — kept because
//! it is cheap to clone and easy to reason an expected outcome out of by
//! hand, unlike the teacher's other games.

use crate::game::GameState;
use crate::value::{Player, Value};

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    XWins,
    OWins,
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TicTacToe {
    board: [u16; 2],
    moves: usize,
}

impl TicTacToe {
    #[must_use]
    pub const fn new() -> Self {
        Self { board: [0, 0], moves: 0 }
    }

    #[must_use]
    pub const fn move_count(&self) -> usize {
        self.moves
    }

    fn side_to_move(&self) -> usize {
        self.moves & 1
    }

    fn line_won_by(&self, side: usize) -> bool {
        LINES
            .iter()
            .any(|line| line.iter().all(|&sq| self.board[side] & (1 << sq) != 0))
    }

    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        if self.line_won_by(0) {
            return Some(Outcome::XWins);
        }
        if self.line_won_by(1) {
            return Some(Outcome::OWins);
        }
        if self.moves == 9 {
            return Some(Outcome::Draw);
        }
        None
    }
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState for TicTacToe {
    fn player(&self) -> Player {
        if self.moves & 1 == 0 {
            Player::Maximizer
        } else {
            Player::Minimizer
        }
    }

    fn actions(&self) -> Vec<(String, Self)> {
        let occupied = self.board[0] | self.board[1];
        let side = self.side_to_move();
        let mut moves = Vec::with_capacity(9 - self.moves);
        for sq in 0..9 {
            if occupied & (1 << sq) != 0 {
                continue;
            }
            let mut next = *self;
            next.board[side] |= 1 << sq;
            next.moves += 1;
            moves.push((sq.to_string(), next));
        }
        moves
    }

    fn terminal(&self) -> Option<Value> {
        match self.outcome()? {
            Outcome::XWins => Some(1.0),
            Outcome::OWins => Some(-1.0),
            Outcome::Draw => Some(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_position_has_nine_actions_and_no_outcome() {
        let root = TicTacToe::new();
        assert_eq!(root.actions().len(), 9);
        assert!(root.outcome().is_none());
        assert_eq!(root.player(), Player::Maximizer);
    }

    #[test]
    fn top_row_win_is_detected_for_x() {
        let mut gs = TicTacToe::new();
        // X: 0, 1, 2 (top row); O: 3, 4 (irrelevant replies).
        for sq in [0usize, 3, 1, 4, 2] {
            let (_, next) = gs
                .actions()
                .into_iter()
                .find(|(label, _)| label == &sq.to_string())
                .expect("square must be legal");
            gs = next;
        }
        assert_eq!(gs.outcome(), Some(Outcome::XWins));
        assert_eq!(gs.terminal(), Some(1.0));
    }

    #[test]
    fn full_board_with_no_line_is_a_draw() {
        // Plies in play order; the resulting board is the standard
        // drawn line X O X / X O O / O X X.
        let order = [0usize, 1, 2, 4, 3, 5, 7, 6, 8];
        let mut gs = TicTacToe::new();
        for sq in order {
            let (_, next) = gs
                .actions()
                .into_iter()
                .find(|(label, _)| label == &sq.to_string())
                .expect("square must be legal");
            gs = next;
        }
        assert_eq!(gs.move_count(), 9);
        assert_eq!(gs.outcome(), Some(Outcome::Draw));
        assert_eq!(gs.terminal(), Some(0.0));
    }
}
