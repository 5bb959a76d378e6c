//! Relics: run-long effects collected between encounters

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::stats::{ModifierOp, ModifierSource, StatKind, StatModifier};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelicKind {
    /// Permanent modifier on every party unit
    StatBonus { stat: StatKind, op: ModifierOp },
    /// Chance to multiply outgoing party damage before the pipeline
    CriticalStrike { chance: f32, multiplier: f32 },
    /// Extra fraction of encounter gold
    GoldBonus { fraction: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelicEffect {
    pub id: String,
    pub name: String,
    pub effect: RelicKind,
}

impl RelicEffect {
    pub fn stat_modifier(&self) -> Option<StatModifier> {
        match self.effect {
            RelicKind::StatBonus { stat, op } => Some(StatModifier {
                stat,
                op,
                source: ModifierSource::Relic,
                remaining: None,
            }),
            _ => None,
        }
    }

    pub fn crit_hook(&self) -> Option<CritHook> {
        match self.effect {
            RelicKind::CriticalStrike { chance, multiplier } => Some(CritHook { chance, multiplier }),
            _ => None,
        }
    }
}

/// Pre-pipeline critical strike roll
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CritHook {
    pub chance: f32,
    pub multiplier: f32,
}

impl CritHook {
    /// Roll once; returns the multiplier to fold into the modifier step
    pub fn roll<R: Rng>(&self, rng: &mut R) -> f32 {
        if rng.gen::<f32>() < self.chance {
            self.multiplier
        } else {
            1.0
        }
    }
}

/// Roll every hook in order and combine the results
pub fn roll_crits<R: Rng>(hooks: &[CritHook], rng: &mut R) -> f32 {
    hooks.iter().map(|hook| hook.roll(rng)).product()
}

/// Gold after all gold relics
pub fn apply_gold_bonus<'a>(gold: u32, relics: impl IntoIterator<Item = &'a RelicEffect>) -> u32 {
    let bonus: f32 = relics
        .into_iter()
        .filter_map(|r| match r.effect {
            RelicKind::GoldBonus { fraction } => Some(fraction),
            _ => None,
        })
        .sum();
    (gold as f32 * (1.0 + bonus).max(0.0)).round() as u32
}
