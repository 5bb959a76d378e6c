//! Battle constants that are not exposed through `EngineConfig`

use crate::core::types::Seconds;

/// Party turns after which a headless battle is abandoned
pub const MAX_BATTLE_TURNS: u32 = 500;

/// Time step used while waiting on attack timers in headless play
pub const HEADLESS_STEP: Seconds = 0.1;
