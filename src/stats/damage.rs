//! Damage resolution pipeline
//!
//! Order is fixed and not commutative:
//! 1. raw = magnitude * archetype multiplier * modifier multiplier
//! 2. reduced = raw * (1 - reduction), reduction clamped to [0, 0.95]
//! 3. actual = max(0, reduced - mitigation)

use super::block::StatKind;

/// Hard cap on the defender's percentage reduction
pub const MAX_DAMAGE_REDUCTION: f32 = 0.95;

/// Whether armor or magic resist mitigates the hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageKind {
    /// Basic attacks, mitigated by armor
    Physical,
    /// Ability damage, mitigated by magic resist
    Magical,
}

impl DamageKind {
    /// Defender stat subtracted in step 3
    pub fn mitigation_stat(&self) -> StatKind {
        match self {
            DamageKind::Physical => StatKind::Armor,
            DamageKind::Magical => StatKind::MagicResist,
        }
    }
}

/// Everything the pipeline needs for one hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageInput {
    /// Base attack damage or ability magnitude
    pub magnitude: f32,
    /// Momentum / opportunity / spell power, already combined
    pub archetype_multiplier: f32,
    /// Buffs, debuffs and pre-step hooks such as critical strikes
    pub modifier_multiplier: f32,
    /// Defender's percentage reduction (Guard)
    pub damage_reduction: f32,
    /// Defender's armor or magic resist
    pub mitigation: f32,
}

impl DamageInput {
    pub fn new(magnitude: f32) -> Self {
        Self {
            magnitude,
            archetype_multiplier: 1.0,
            modifier_multiplier: 1.0,
            damage_reduction: 0.0,
            mitigation: 0.0,
        }
    }
}

/// Intermediate values, kept for logging and tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageBreakdown {
    pub raw: f32,
    pub after_reduction: f32,
    pub actual: f32,
}

/// Run the three-step pipeline
pub fn resolve_damage(input: &DamageInput) -> DamageBreakdown {
    let raw = (input.magnitude * input.archetype_multiplier * input.modifier_multiplier).max(0.0);
    let reduction = input.damage_reduction.clamp(0.0, MAX_DAMAGE_REDUCTION);
    let after_reduction = raw * (1.0 - reduction);
    let actual = (after_reduction - input.mitigation.max(0.0)).max(0.0);

    DamageBreakdown {
        raw,
        after_reduction,
        actual,
    }
}

/// Convenience wrapper returning only the dealt amount
pub fn damage_dealt(input: &DamageInput) -> f32 {
    resolve_damage(input).actual
}

/// Additive heal clamped to `[0, max_health]`
///
/// Returns the new health and the amount actually restored.
pub fn apply_heal(current: f32, max_health: f32, amount: f32) -> (f32, f32) {
    let healed = (current + amount.max(0.0)).clamp(0.0, max_health.max(0.0));
    (healed, (healed - current).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_armor_subtracts_after_reduction() {
        // raw 20, armor 8, no reduction -> 12
        let input = DamageInput {
            mitigation: 8.0,
            ..DamageInput::new(20.0)
        };
        assert_eq!(damage_dealt(&input), 12.0);
    }

    #[test]
    fn test_reduction_applies_before_armor() {
        // 100 * (1 - 0.5) - 10 = 40, not (100 - 10) * 0.5 = 45
        let input = DamageInput {
            damage_reduction: 0.5,
            mitigation: 10.0,
            ..DamageInput::new(100.0)
        };
        let breakdown = resolve_damage(&input);
        assert_eq!(breakdown.after_reduction, 50.0);
        assert_eq!(breakdown.actual, 40.0);
    }

    #[test]
    fn test_reduction_capped() {
        let input = DamageInput {
            damage_reduction: 3.0,
            ..DamageInput::new(100.0)
        };
        assert!((damage_dealt(&input) - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_negative_reduction_treated_as_zero() {
        let input = DamageInput {
            damage_reduction: -1.0,
            ..DamageInput::new(10.0)
        };
        assert_eq!(damage_dealt(&input), 10.0);
    }

    #[test]
    fn test_heavy_armor_floors_at_zero() {
        let input = DamageInput {
            mitigation: 500.0,
            ..DamageInput::new(20.0)
        };
        assert_eq!(damage_dealt(&input), 0.0);
    }

    #[test]
    fn test_multipliers_stack_in_step_one() {
        let input = DamageInput {
            archetype_multiplier: 1.5,
            modifier_multiplier: 2.0,
            ..DamageInput::new(10.0)
        };
        assert_eq!(resolve_damage(&input).raw, 30.0);
    }

    #[test]
    fn test_heal_clamped_to_max() {
        assert_eq!(apply_heal(90.0, 100.0, 25.0), (100.0, 10.0));
        assert_eq!(apply_heal(50.0, 100.0, -5.0), (50.0, 0.0));
    }
}
