//! `McParams`, the engine's configuration surface (spec 6).
//!
//! Grounded in `mcts.rs::Behaviour`, generalized from a single
//! `exp_factor` knob to the full option table the spec requires, and
//! from a `Limit` enum (time *or* rollout count) to two independent
//! always-present fields (`duration`, `maxsim`), since spec 6 lists both
//! as simultaneous knobs rather than a single choice.

use std::sync::Arc;
use std::time::Duration;

use crate::game::GameState;
use crate::value::Value;
use crate::{constants, rootpolicy::RootSelector};

/// All configuration recognized by the engine (spec 6's option table).
#[derive(Clone)]
pub struct McParams<G: GameState> {
    /// `c1`: UCB/LCB mean weight.
    pub exploitation: Value,
    /// `c2`: UCB/LCB spread weight.
    pub exploration: Value,
    pub alpha: Value,
    pub beta: Value,
    /// Soft search deadline.
    pub duration: Duration,
    /// Hard cap on root `sims`.
    pub maxsim: Value,
    /// Base rollouts per leaf visit (`numrollsI`'s additive floor).
    pub numrolls_base: u32,
    /// Root sims per increment of `numrollsI`.
    pub simsperroll: Value,
    /// Size hint above the carry-over cache's length.
    pub extracache: usize,
    /// Descents per cancel check.
    pub advancechunks: u32,
    /// `false` disables the background worker entirely (a no-op search).
    pub background: bool,
    /// Forces pure-exploration selection on the very first descent of
    /// each chunk-check cycle, so `think`-style readouts spread samples
    /// instead of doubling down on the current best (spec 4.E, "Uniform
    /// mode").
    pub uniform: bool,
    /// New terminals are stored as `InertTerminal` rather than `Terminal`
    /// — the least-evil search's mode.
    pub inert: bool,
    /// Overrides the least-evil policy's own search parameters; `None`
    /// reuses `self` with `inert` forced to `true`.
    pub lessevil: Option<Arc<McParams<G>>>,
    /// Overrides the default LCB-based root selector (spec 4.G).
    pub bestactions: Option<Arc<dyn RootSelector<G>>>,
}

impl<G: GameState> std::fmt::Debug for McParams<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McParams")
            .field("exploitation", &self.exploitation)
            .field("exploration", &self.exploration)
            .field("alpha", &self.alpha)
            .field("beta", &self.beta)
            .field("duration", &self.duration)
            .field("maxsim", &self.maxsim)
            .field("numrolls_base", &self.numrolls_base)
            .field("simsperroll", &self.simsperroll)
            .field("extracache", &self.extracache)
            .field("advancechunks", &self.advancechunks)
            .field("background", &self.background)
            .field("uniform", &self.uniform)
            .field("inert", &self.inert)
            .finish_non_exhaustive()
    }
}

impl<G: GameState> Default for McParams<G> {
    fn default() -> Self {
        Self {
            exploitation: constants::DEFAULT_EXPLOITATION,
            exploration: constants::DEFAULT_EXPLORATION,
            alpha: constants::DEFAULT_ALPHA,
            beta: constants::DEFAULT_BETA,
            duration: Duration::from_millis(constants::DEFAULT_DURATION_MS),
            maxsim: constants::DEFAULT_MAXSIM,
            numrolls_base: constants::DEFAULT_NUMROLLS_BASE,
            simsperroll: constants::DEFAULT_SIMSPERROLL,
            extracache: constants::DEFAULT_EXTRACACHE,
            advancechunks: constants::DEFAULT_ADVANCECHUNKS,
            background: true,
            uniform: false,
            inert: false,
            lessevil: None,
            bestactions: None,
        }
    }
}

impl<G: GameState> McParams<G> {
    /// The parameters the least-evil fallback runs under: `self.lessevil`
    /// if set, otherwise `self` with `inert` forced on (spec 4.G, step 5).
    #[must_use]
    pub fn least_evil_params(&self) -> Self {
        if let Some(over) = &self.lessevil {
            (**over).clone()
        } else {
            Self {
                inert: true,
                ..self.clone()
            }
        }
    }
}
