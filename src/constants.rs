//! Defaults for [`crate::params::McParams`] (spec 6, the option table).

use crate::value::Value;

pub const DEFAULT_EXPLOITATION: Value = 1.0;
/// `sqrt(8)`, the teacher's `DEFAULT_EXP_FACTOR` generalized from `f32`
/// `sqrt(2)` to the `f64` constant the spec's priority formula calls for.
pub const DEFAULT_EXPLORATION: Value = 2.828_427_124_746_190_1; // sqrt(8)

pub const DEFAULT_ALPHA: Value = -1.0;
pub const DEFAULT_BETA: Value = 1.0;

pub const DEFAULT_DURATION_MS: u64 = 1000;
pub const DEFAULT_MAXSIM: Value = 1e8;
pub const DEFAULT_NUMROLLS_BASE: u32 = 1;
pub const DEFAULT_SIMSPERROLL: Value = 1e6;
pub const DEFAULT_EXTRACACHE: usize = 100_000;
pub const DEFAULT_ADVANCECHUNKS: u32 = 100;
