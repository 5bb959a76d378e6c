//! Hit resolution between two units
//!
//! Builds pipeline input from live unit state and applies the result with
//! every archetype notification in a fixed order.

use crate::stats::{resolve_damage, DamageBreakdown, DamageInput, DamageKind, StatKind};
use crate::unit::UnitInstance;

/// Whether a hit came from a basic attack or an ability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    Basic,
    Ability,
}

/// What one hit did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResult {
    pub breakdown: DamageBreakdown,
    /// Health actually removed (capped by remaining health)
    pub dealt: f32,
    pub killed: bool,
}

/// Pipeline input for a basic attack, mitigated by armor
///
/// Call after `on_attack_target` so a target switch has already cleared
/// momentum.
pub fn basic_attack_input(
    attacker: &UnitInstance,
    defender: &UnitInstance,
    modifier_multiplier: f32,
) -> DamageInput {
    DamageInput {
        magnitude: attacker.stats.effective(StatKind::AttackDamage),
        archetype_multiplier: attacker
            .engine
            .outgoing_damage_multiplier(defender.health_fraction()),
        modifier_multiplier,
        damage_reduction: defender.engine.damage_reduction(),
        mitigation: defender.mitigation(DamageKind::Physical),
    }
}

/// Apply a resolved hit and notify both engines
///
/// Basic attacks feed Momentum: zero damage is a miss. Any damage taken feeds
/// Guard and any kill feeds the kill chain.
pub fn apply_hit(
    attacker: &mut UnitInstance,
    defender: &mut UnitInstance,
    input: &DamageInput,
    kind: HitKind,
) -> HitResult {
    let breakdown = resolve_damage(input);
    let dealt = defender.take_damage(breakdown.actual);

    if kind == HitKind::Basic {
        if breakdown.actual > 0.0 {
            attacker.engine.on_successful_hit();
        } else {
            attacker.engine.on_miss();
        }
    }

    if dealt > 0.0 {
        defender.engine.on_damage_taken(dealt);
    }

    let killed = dealt > 0.0 && !defender.is_alive();
    if killed {
        attacker.engine.on_kill();
        defender.engine.reset();
    }

    HitResult {
        breakdown,
        dealt,
        killed,
    }
}

/// Index of the party member an enemy should attack
///
/// An active taunter draws every attack; otherwise the first living member.
pub fn enemy_target(party: &[UnitInstance]) -> Option<usize> {
    party
        .iter()
        .position(|u| u.is_alive() && u.engine.is_taunting())
        .or_else(|| party.iter().position(|u| u.is_alive()))
}
