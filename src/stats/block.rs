//! Base stats plus layered modifiers
//!
//! Effective value = (base + sum of additive) * product of multiplicative,
//! floored at zero. Modifiers come from several independent sources and are
//! tagged so one source can be stripped without touching the others.

use serde::{Deserialize, Serialize};

use crate::core::types::Seconds;

/// The eight template stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    MaxHealth,
    MaxMana,
    AttackDamage,
    /// Seconds between basic attacks (lower is faster)
    AttackInterval,
    Armor,
    MagicResist,
    MovementSpeed,
    AttackRange,
}

/// Immutable base stats from a unit template
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseStats {
    pub max_health: f32,
    pub max_mana: f32,
    pub attack_damage: f32,
    pub attack_interval: Seconds,
    pub armor: f32,
    pub magic_resist: f32,
    pub movement_speed: f32,
    pub attack_range: f32,
}

impl BaseStats {
    pub fn get(&self, stat: StatKind) -> f32 {
        match stat {
            StatKind::MaxHealth => self.max_health,
            StatKind::MaxMana => self.max_mana,
            StatKind::AttackDamage => self.attack_damage,
            StatKind::AttackInterval => self.attack_interval,
            StatKind::Armor => self.armor,
            StatKind::MagicResist => self.magic_resist,
            StatKind::MovementSpeed => self.movement_speed,
            StatKind::AttackRange => self.attack_range,
        }
    }

    fn get_mut(&mut self, stat: StatKind) -> &mut f32 {
        match stat {
            StatKind::MaxHealth => &mut self.max_health,
            StatKind::MaxMana => &mut self.max_mana,
            StatKind::AttackDamage => &mut self.attack_damage,
            StatKind::AttackInterval => &mut self.attack_interval,
            StatKind::Armor => &mut self.armor,
            StatKind::MagicResist => &mut self.magic_resist,
            StatKind::MovementSpeed => &mut self.movement_speed,
            StatKind::AttackRange => &mut self.attack_range,
        }
    }
}

impl Default for BaseStats {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            max_mana: 50.0,
            attack_damage: 10.0,
            attack_interval: 1.0,
            armor: 0.0,
            magic_resist: 0.0,
            movement_speed: 1.0,
            attack_range: 1.0,
        }
    }
}

/// Where a modifier came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierSource {
    LevelUp,
    Relic,
    Synergy,
    Ability,
}

/// How a modifier combines with the base value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ModifierOp {
    Add(f32),
    Mul(f32),
}

/// One active modifier on a unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatModifier {
    pub stat: StatKind,
    pub op: ModifierOp,
    pub source: ModifierSource,
    /// Remaining lifetime; `None` is permanent
    pub remaining: Option<Seconds>,
}

impl StatModifier {
    pub fn add(stat: StatKind, amount: f32, source: ModifierSource) -> Self {
        Self {
            stat,
            op: ModifierOp::Add(amount),
            source,
            remaining: None,
        }
    }

    pub fn mul(stat: StatKind, factor: f32, source: ModifierSource) -> Self {
        Self {
            stat,
            op: ModifierOp::Mul(factor),
            source,
            remaining: None,
        }
    }

    /// Attack speed increase expressed on the interval stat
    ///
    /// `+10%` attack speed divides the interval by 1.1. The divisor is kept
    /// above a small floor so a large negative roll cannot invert it.
    pub fn attack_speed(fraction: f32, source: ModifierSource) -> Self {
        Self::mul(StatKind::AttackInterval, 1.0 / (1.0 + fraction).max(0.05), source)
    }

    pub fn timed(mut self, duration: Seconds) -> Self {
        self.remaining = Some(duration);
        self
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.remaining, Some(t) if t <= 0.0)
    }
}

/// Base stats plus active modifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    base: BaseStats,
    modifiers: Vec<StatModifier>,
}

impl StatBlock {
    pub fn new(base: BaseStats) -> Self {
        Self {
            base,
            modifiers: Vec::new(),
        }
    }

    pub fn base(&self) -> &BaseStats {
        &self.base
    }

    pub fn modifiers(&self) -> &[StatModifier] {
        &self.modifiers
    }

    /// Sum of additive modifiers on a stat
    pub fn additive(&self, stat: StatKind) -> f32 {
        self.modifiers
            .iter()
            .filter(|m| m.stat == stat)
            .filter_map(|m| match m.op {
                ModifierOp::Add(v) => Some(v),
                ModifierOp::Mul(_) => None,
            })
            .sum()
    }

    /// Product of multiplicative modifiers on a stat
    pub fn multiplier(&self, stat: StatKind) -> f32 {
        self.modifiers
            .iter()
            .filter(|m| m.stat == stat)
            .filter_map(|m| match m.op {
                ModifierOp::Mul(v) => Some(v),
                ModifierOp::Add(_) => None,
            })
            .product()
    }

    /// Base plus additive modifiers, before multipliers
    pub fn flat(&self, stat: StatKind) -> f32 {
        (self.base.get(stat) + self.additive(stat)).max(0.0)
    }

    /// Fully modified value
    pub fn effective(&self, stat: StatKind) -> f32 {
        ((self.base.get(stat) + self.additive(stat)) * self.multiplier(stat)).max(0.0)
    }

    pub fn push(&mut self, modifier: StatModifier) {
        self.modifiers.push(modifier);
    }

    /// Drop every modifier from one source
    pub fn strip_source(&mut self, source: ModifierSource) {
        self.modifiers.retain(|m| m.source != source);
    }

    /// Scale a base stat in place (used for encounter scaling)
    pub fn scale_base(&mut self, stat: StatKind, factor: f32) {
        *self.base.get_mut(stat) *= factor;
    }

    /// Advance timed modifiers; returns true if any expired
    pub fn tick(&mut self, dt: Seconds) -> bool {
        for modifier in &mut self.modifiers {
            if let Some(remaining) = modifier.remaining.as_mut() {
                *remaining -= dt;
            }
        }
        let before = self.modifiers.len();
        self.modifiers.retain(|m| !m.is_expired());
        self.modifiers.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> StatBlock {
        StatBlock::new(BaseStats {
            attack_damage: 20.0,
            armor: 8.0,
            ..BaseStats::default()
        })
    }

    #[test]
    fn test_effective_without_modifiers_is_base() {
        let stats = block();
        assert_eq!(stats.effective(StatKind::AttackDamage), 20.0);
        assert_eq!(stats.multiplier(StatKind::AttackDamage), 1.0);
    }

    #[test]
    fn test_additive_before_multiplicative() {
        let mut stats = block();
        stats.push(StatModifier::mul(StatKind::AttackDamage, 1.5, ModifierSource::Relic));
        stats.push(StatModifier::add(StatKind::AttackDamage, 10.0, ModifierSource::LevelUp));

        // (20 + 10) * 1.5
        assert!((stats.effective(StatKind::AttackDamage) - 45.0).abs() < 1e-5);
        assert_eq!(stats.flat(StatKind::AttackDamage), 30.0);
    }

    #[test]
    fn test_effective_floored_at_zero() {
        let mut stats = block();
        stats.push(StatModifier::add(StatKind::Armor, -50.0, ModifierSource::Ability));
        assert_eq!(stats.effective(StatKind::Armor), 0.0);
    }

    #[test]
    fn test_strip_source_keeps_others() {
        let mut stats = block();
        stats.push(StatModifier::add(StatKind::Armor, 5.0, ModifierSource::Synergy));
        stats.push(StatModifier::add(StatKind::Armor, 2.0, ModifierSource::Relic));

        stats.strip_source(ModifierSource::Synergy);

        assert_eq!(stats.effective(StatKind::Armor), 10.0);
        assert_eq!(stats.modifiers().len(), 1);
    }

    #[test]
    fn test_timed_modifier_expires() {
        let mut stats = block();
        stats.push(StatModifier::mul(StatKind::AttackDamage, 2.0, ModifierSource::Ability).timed(1.0));

        assert!(!stats.tick(0.5));
        assert_eq!(stats.effective(StatKind::AttackDamage), 40.0);

        assert!(stats.tick(0.5));
        assert_eq!(stats.effective(StatKind::AttackDamage), 20.0);
    }

    #[test]
    fn test_attack_speed_divides_interval() {
        let mut stats = block();
        stats.push(StatModifier::attack_speed(0.25, ModifierSource::LevelUp));
        assert!((stats.effective(StatKind::AttackInterval) - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_scale_base() {
        let mut stats = block();
        stats.scale_base(StatKind::AttackDamage, 2.0);
        assert_eq!(stats.base().attack_damage, 40.0);
    }
}
