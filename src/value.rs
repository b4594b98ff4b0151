//! Scalar value semantics shared by every other module.
//!
//! A [`Value`] is always expressed from the Maximizer's point of view:
//! higher is better for [`Player::Maximizer`], lower is better for
//! [`Player::Minimizer`]. Nothing in this crate ever flips that
//! convention locally; callers that need a player-relative sense of
//! "good" go through [`Player::objective`] or [`Player::favour`].

/// A scalar in `[alpha, beta]`, expressed from the Maximizer's perspective.
pub type Value = f64;

/// The two sides of a zero-sum, perfect-information game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    Maximizer,
    Minimizer,
}

impl Player {
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Maximizer => Self::Minimizer,
            Self::Minimizer => Self::Maximizer,
        }
    }

    /// The value this player would force if they could pick the outcome
    /// outright: `beta` for the Maximizer, `alpha` for the Minimizer.
    #[must_use]
    pub fn bound(self, alpha: Value, beta: Value) -> Value {
        match self {
            Self::Maximizer => beta,
            Self::Minimizer => alpha,
        }
    }

    /// `f64::max` for the Maximizer, `f64::min` for the Minimizer — used to
    /// fold proven terminal children into a `worstcase` bound (spec 4.E).
    #[must_use]
    pub fn objective(self, a: Value, b: Value) -> Value {
        match self {
            Self::Maximizer => a.max(b),
            Self::Minimizer => a.min(b),
        }
    }

    /// Turns a raw, Maximizer-perspective value into "how good is this for
    /// `self`", i.e. the identity for the Maximizer and negation for the
    /// Minimizer. Used by the priority and LCB formulas (spec 4.E, 4.G),
    /// which are stated in this player-relative sense.
    #[must_use]
    pub fn favour(self, raw: Value) -> Value {
        match self {
            Self::Maximizer => raw,
            Self::Minimizer => -raw,
        }
    }
}
