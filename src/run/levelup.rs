//! Level-up choice generation
//!
//! Every victory offers one Offense, one Defense and one Utility choice, each
//! a random sub-upgrade scaled by level. Occasionally a Chaos choice is added
//! that trades a large gain on one stat for a loss on another.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::RunConfig;
use crate::stats::{ModifierSource, StatKind, StatModifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelUpCategory {
    Offense,
    Defense,
    Utility,
    Chaos,
}

/// Additive change to one stat
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatDelta {
    pub stat: StatKind,
    pub amount: f32,
}

impl StatDelta {
    pub fn to_modifier(&self) -> StatModifier {
        StatModifier::add(self.stat, self.amount, ModifierSource::LevelUp)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelUpChoice {
    pub category: LevelUpCategory,
    pub deltas: Vec<StatDelta>,
}

// (stat, base amount at level 1)
const OFFENSE_POOL: &[(StatKind, f32)] = &[(StatKind::AttackDamage, 4.0), (StatKind::AttackRange, 0.5)];
const DEFENSE_POOL: &[(StatKind, f32)] = &[
    (StatKind::MaxHealth, 20.0),
    (StatKind::Armor, 3.0),
    (StatKind::MagicResist, 3.0),
];
const UTILITY_POOL: &[(StatKind, f32)] = &[(StatKind::MaxMana, 10.0), (StatKind::MovementSpeed, 0.2)];

/// Chaos gain relative to a normal sub-upgrade
const CHAOS_GAIN: f32 = 2.0;
/// Chaos loss relative to a normal sub-upgrade
const CHAOS_LOSS: f32 = 1.0;

/// Level scaling of choice magnitudes
pub fn magnitude_scale(level: u32, config: &RunConfig) -> f32 {
    1.0 + level.saturating_sub(1) as f32 * config.level_magnitude_growth
}

fn pick<R: Rng>(pool: &[(StatKind, f32)], rng: &mut R) -> (StatKind, f32) {
    // Pools are non-empty constants
    *pool.choose(rng).unwrap_or(&pool[0])
}

fn single<R: Rng>(
    category: LevelUpCategory,
    pool: &[(StatKind, f32)],
    scale: f32,
    rng: &mut R,
) -> LevelUpChoice {
    let (stat, base) = pick(pool, rng);
    LevelUpChoice {
        category,
        deltas: vec![StatDelta {
            stat,
            amount: base * scale,
        }],
    }
}

fn chaos<R: Rng>(scale: f32, rng: &mut R) -> LevelUpChoice {
    let pool: Vec<(StatKind, f32)> = OFFENSE_POOL
        .iter()
        .chain(DEFENSE_POOL)
        .chain(UTILITY_POOL)
        .copied()
        .collect();

    let mut picks = pool.choose_multiple(rng, 2);
    let (gain_stat, gain_base) = picks.next().copied().unwrap_or(pool[0]);
    let (loss_stat, loss_base) = picks.next().copied().unwrap_or(pool[1]);

    LevelUpChoice {
        category: LevelUpCategory::Chaos,
        deltas: vec![
            StatDelta {
                stat: gain_stat,
                amount: gain_base * scale * CHAOS_GAIN,
            },
            StatDelta {
                stat: loss_stat,
                amount: -loss_base * scale * CHAOS_LOSS,
            },
        ],
    }
}

/// Choices offered after clearing `level`
pub fn generate_choices<R: Rng>(level: u32, config: &RunConfig, rng: &mut R) -> Vec<LevelUpChoice> {
    let scale = magnitude_scale(level, config);
    let mut choices = vec![
        single(LevelUpCategory::Offense, OFFENSE_POOL, scale, rng),
        single(LevelUpCategory::Defense, DEFENSE_POOL, scale, rng),
        single(LevelUpCategory::Utility, UTILITY_POOL, scale, rng),
    ];

    if rng.gen::<f32>() < config.chaos_chance {
        choices.push(chaos(scale, rng));
    }
    choices
}
