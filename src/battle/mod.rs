//! Battle system - one encounter between a party and an enemy roster
//!
//! Turn-based and fully deterministic for a given RNG seed. The party acts
//! through submitted actions, enemies act on their own with optional pacing.

pub mod constants;
pub mod execution;
pub mod resolution;

pub use constants::*;
pub use execution::{ActionOutcome, BattleLoop, BattlePhase, PlayerAction};
pub use resolution::{apply_hit, basic_attack_input, enemy_target, HitKind, HitResult};

pub use crate::core::error::ActionError;
