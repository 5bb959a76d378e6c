//! Encounter definitions and difficulty scaling

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::stats::StatKind;
use crate::unit::UnitInstance;

pub const MAX_LEVEL: u32 = 100;

const MINIBOSS_LEVELS: [u32; 9] = [10, 20, 30, 40, 50, 60, 80, 90, 100];
const MAJOR_MINIBOSS_LEVELS: [u32; 3] = [30, 50, 80];
const FINAL_BOSS_LEVEL: u32 = 100;

/// One catalog encounter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterSpec {
    pub id: String,
    pub level_min: u32,
    pub level_max: u32,
    /// Enemy template ids in roster order
    pub enemies: Vec<String>,
    #[serde(default)]
    pub miniboss: bool,
    #[serde(default)]
    pub major_miniboss: bool,
    #[serde(default)]
    pub final_boss: bool,
    /// Gold reward before relic bonuses
    #[serde(default)]
    pub gold: u32,
}

impl EncounterSpec {
    pub fn covers(&self, level: u32) -> bool {
        (self.level_min..=self.level_max).contains(&level)
    }

    pub fn tier(&self) -> EncounterTier {
        if self.final_boss {
            EncounterTier::FinalBoss
        } else if self.major_miniboss {
            EncounterTier::MajorMiniboss
        } else if self.miniboss {
            EncounterTier::Miniboss
        } else {
            EncounterTier::Regular
        }
    }
}

/// Encounter cadence class of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncounterTier {
    Regular,
    Miniboss,
    MajorMiniboss,
    FinalBoss,
}

pub fn is_miniboss_level(level: u32) -> bool {
    MINIBOSS_LEVELS.contains(&level)
}

pub fn is_major_miniboss_level(level: u32) -> bool {
    MAJOR_MINIBOSS_LEVELS.contains(&level)
}

pub fn is_final_boss_level(level: u32) -> bool {
    level == FINAL_BOSS_LEVEL
}

/// Most specific tier that applies to `level`
pub fn tier_for_level(level: u32) -> EncounterTier {
    if is_final_boss_level(level) {
        EncounterTier::FinalBoss
    } else if is_major_miniboss_level(level) {
        EncounterTier::MajorMiniboss
    } else if is_miniboss_level(level) {
        EncounterTier::Miniboss
    } else {
        EncounterTier::Regular
    }
}

/// `factor^(level - 1)`; level 1 is unscaled
pub fn difficulty_multiplier(level: u32, factor: f32) -> f32 {
    factor.powi(level.saturating_sub(1) as i32)
}

/// Scale an enemy's max health and attack damage once, then refill health
///
/// Party units are never scaled; the call is a no-op for them.
pub fn scale_enemy(unit: &mut UnitInstance, multiplier: f32) {
    if unit.side != crate::core::types::Side::Enemy {
        return;
    }
    unit.stats.scale_base(StatKind::MaxHealth, multiplier);
    unit.stats.scale_base(StatKind::AttackDamage, multiplier);
    unit.restore_full();
}

/// Pick an encounter for `level` from `pool`
///
/// Boss and miniboss levels take the matching flagged encounter. Other
/// levels choose uniformly among regular encounters whose range covers the
/// level. Candidates are sorted by id so that the pick depends only on the
/// RNG stream, not on map iteration order.
pub fn select_encounter<'a, R: Rng>(
    pool: impl IntoIterator<Item = &'a EncounterSpec>,
    level: u32,
    rng: &mut R,
) -> Option<&'a EncounterSpec> {
    let tier = tier_for_level(level);
    let mut candidates: Vec<&EncounterSpec> = pool
        .into_iter()
        .filter(|e| e.covers(level) && e.tier() == tier)
        .collect();
    candidates.sort_by(|a, b| a.id.cmp(&b.id));

    match tier {
        EncounterTier::Regular => candidates.choose(rng).copied(),
        _ => candidates.first().copied(),
    }
}
