//! Boundary error type (spec 7). Internal invariant violations (a `Bud`
//! with an empty `pending` where a caller expected more, an empty
//! `moveq`) stay `panic!`/`debug_assert!`s matching the teacher's own
//! style elsewhere in this crate; `EngineError` exists only for
//! conditions an `Engine` caller can legitimately hit and recover from.
//!
//! Grounded in `hexwar-gpu`'s `GpuError` (one `thiserror::Error` variant
//! per caller-recoverable failure, `{0}`-style messages).

/// Errors an [`crate::engine::Engine`] call can return.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// `act`/`think` was called against a position with no legal moves
    /// and no terminal value — an invalid `GameState` implementation,
    /// not a search failure.
    #[error("position {0:?} reports no legal actions and is not terminal")]
    NoLegalActions(String),
}
