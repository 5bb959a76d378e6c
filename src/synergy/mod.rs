//! Party-wide synergy aggregation
//!
//! Units carry up to two court tags. When enough living party members share
//! a tag, the whole party gets that tag's bonus. The set is always rebuilt
//! from scratch on a roster change, never patched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stats::{ModifierSource, StatBlock, StatKind, StatModifier};

/// Court tag shared between units
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum SynergyTag {
    #[default]
    None,
    Fire,
    Nature,
    Shadow,
    Holy,
    Arcane,
    Steel,
    Storm,
}

/// Named effect a synergy grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SynergyEffect {
    /// Multiplicative attack damage bonus
    AttackDamageBonus,
    /// Fraction of max health healed at each party turn start
    PartyHealPerTurn,
    /// Fraction of dealt damage returned as healing
    Lifesteal,
    /// Multiplicative bonus on heals
    HealingBonus,
    /// Flat mana restored at each party turn start
    ManaPerTurn,
    /// Flat armor
    ArmorBonus,
    /// Attack speed fraction
    AttackSpeedBonus,
}

impl SynergyTag {
    pub fn all() -> &'static [SynergyTag] {
        &[
            SynergyTag::Fire,
            SynergyTag::Nature,
            SynergyTag::Shadow,
            SynergyTag::Holy,
            SynergyTag::Arcane,
            SynergyTag::Steel,
            SynergyTag::Storm,
        ]
    }

    /// Members needed to activate; `None` never activates
    pub fn threshold(&self) -> Option<u32> {
        match self {
            SynergyTag::None => None,
            SynergyTag::Nature => Some(3),
            SynergyTag::Fire
            | SynergyTag::Shadow
            | SynergyTag::Holy
            | SynergyTag::Arcane
            | SynergyTag::Steel
            | SynergyTag::Storm => Some(2),
        }
    }

    /// Fixed bonus granted once the threshold is met
    pub fn bonus(&self) -> Option<SynergyBonus> {
        let (effect, magnitude) = match self {
            SynergyTag::None => return None,
            SynergyTag::Fire => (SynergyEffect::AttackDamageBonus, 0.10),
            SynergyTag::Nature => (SynergyEffect::PartyHealPerTurn, 0.01),
            SynergyTag::Shadow => (SynergyEffect::Lifesteal, 0.10),
            SynergyTag::Holy => (SynergyEffect::HealingBonus, 0.20),
            SynergyTag::Arcane => (SynergyEffect::ManaPerTurn, 5.0),
            SynergyTag::Steel => (SynergyEffect::ArmorBonus, 5.0),
            SynergyTag::Storm => (SynergyEffect::AttackSpeedBonus, 0.10),
        };
        Some(SynergyBonus {
            tag: *self,
            effect,
            magnitude,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynergyBonus {
    pub tag: SynergyTag,
    pub effect: SynergyEffect,
    pub magnitude: f32,
}

/// Tag counts and the bonuses they unlock
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynergySet {
    counts: BTreeMap<SynergyTag, u32>,
    bonuses: BTreeMap<SynergyTag, SynergyBonus>,
}

impl SynergySet {
    pub fn count(&self, tag: SynergyTag) -> u32 {
        self.counts.get(&tag).copied().unwrap_or(0)
    }

    pub fn is_active(&self, tag: SynergyTag) -> bool {
        self.bonuses.contains_key(&tag)
    }

    pub fn bonuses(&self) -> impl Iterator<Item = &SynergyBonus> {
        self.bonuses.values()
    }

    pub fn active_tags(&self) -> Vec<SynergyTag> {
        self.bonuses.keys().copied().collect()
    }

    /// Magnitude of an effect, zero when inactive
    pub fn magnitude(&self, effect: SynergyEffect) -> f32 {
        self.bonuses
            .values()
            .filter(|b| b.effect == effect)
            .map(|b| b.magnitude)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bonuses.is_empty()
    }
}

/// Count tags across a roster and resolve thresholds
///
/// Each item is one unit's pair of tags. Callers pass living units only.
pub fn aggregate<I>(units: I) -> SynergySet
where
    I: IntoIterator<Item = [SynergyTag; 2]>,
{
    let mut counts: BTreeMap<SynergyTag, u32> = BTreeMap::new();
    for tags in units {
        for tag in tags {
            if tag != SynergyTag::None {
                *counts.entry(tag).or_insert(0) += 1;
            }
        }
    }

    let bonuses = counts
        .iter()
        .filter_map(|(tag, count)| match (tag.threshold(), tag.bonus()) {
            (Some(threshold), Some(bonus)) if *count >= threshold => Some((*tag, bonus)),
            _ => None,
        })
        .collect();

    SynergySet { counts, bonuses }
}

/// Replace a unit's synergy modifiers with the stat-type bonuses of `set`
pub fn apply_stat_bonuses(stats: &mut StatBlock, set: &SynergySet) {
    stats.strip_source(ModifierSource::Synergy);
    for bonus in set.bonuses() {
        let modifier = match bonus.effect {
            SynergyEffect::AttackDamageBonus => StatModifier::mul(
                StatKind::AttackDamage,
                1.0 + bonus.magnitude,
                ModifierSource::Synergy,
            ),
            SynergyEffect::ArmorBonus => {
                StatModifier::add(StatKind::Armor, bonus.magnitude, ModifierSource::Synergy)
            }
            SynergyEffect::AttackSpeedBonus => {
                StatModifier::attack_speed(bonus.magnitude, ModifierSource::Synergy)
            }
            SynergyEffect::PartyHealPerTurn
            | SynergyEffect::Lifesteal
            | SynergyEffect::HealingBonus
            | SynergyEffect::ManaPerTurn => continue,
        };
        stats.push(modifier);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::BaseStats;

    #[test]
    fn test_nature_needs_three() {
        let three = vec![[SynergyTag::Nature, SynergyTag::None]; 3];
        let set = aggregate(three);
        assert_eq!(set.count(SynergyTag::Nature), 3);
        assert!(set.is_active(SynergyTag::Nature));
        assert!((set.magnitude(SynergyEffect::PartyHealPerTurn) - 0.01).abs() < 1e-6);

        let two = vec![[SynergyTag::Nature, SynergyTag::None]; 2];
        let set = aggregate(two);
        assert_eq!(set.count(SynergyTag::Nature), 2);
        assert!(!set.is_active(SynergyTag::Nature));
        assert_eq!(set.magnitude(SynergyEffect::PartyHealPerTurn), 0.0);
    }

    #[test]
    fn test_none_is_never_counted() {
        let set = aggregate(vec![[SynergyTag::None, SynergyTag::None]; 4]);
        assert_eq!(set.count(SynergyTag::None), 0);
        assert!(set.is_empty());
    }

    #[test]
    fn test_both_tag_slots_count() {
        let set = aggregate(vec![
            [SynergyTag::Fire, SynergyTag::Steel],
            [SynergyTag::Steel, SynergyTag::Fire],
        ]);
        assert_eq!(set.active_tags(), vec![SynergyTag::Fire, SynergyTag::Steel]);
    }

    #[test]
    fn test_stat_bonuses_replace_previous() {
        let mut stats = StatBlock::new(BaseStats {
            armor: 10.0,
            attack_damage: 10.0,
            ..BaseStats::default()
        });
        let steel = aggregate(vec![[SynergyTag::Steel, SynergyTag::Fire]; 2]);

        apply_stat_bonuses(&mut stats, &steel);
        apply_stat_bonuses(&mut stats, &steel);
        assert_eq!(stats.effective(StatKind::Armor), 15.0);
        assert!((stats.effective(StatKind::AttackDamage) - 11.0).abs() < 1e-5);

        apply_stat_bonuses(&mut stats, &SynergySet::default());
        assert_eq!(stats.effective(StatKind::Armor), 10.0);
        assert!(stats.modifiers().is_empty());
    }
}
