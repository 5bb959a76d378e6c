//! Ability gating and casting
//!
//! `check_ready` validates without touching state. `begin_cast` pays every
//! cost on the caster and hands back a ticket; the battle loop then resolves
//! the effect against targets with the helpers below.

use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use super::{AbilityKind, AbilityTemplate};
use crate::archetype::SurgeOutcome;
use crate::core::error::ActionError;
use crate::core::types::Seconds;
use crate::stats::{DamageInput, DamageKind, ModifierSource, StatKind, StatModifier};
use crate::unit::UnitInstance;

/// Result of a paid cast, before effects land
#[derive(Debug, Clone)]
pub struct CastTicket {
    pub template: Arc<AbilityTemplate>,
    /// Caster spell power at the moment of casting, before the surge rises
    pub spell_power: f32,
    pub mana_spent: f32,
    /// Mana Surge reaction, `None` for non-mages
    pub surge: Option<SurgeOutcome>,
    /// Set when a Guard action was performed
    pub guard_duration: Option<Seconds>,
    /// Self-damage taken from an overload
    pub backlash: f32,
}

/// Validate a cast; returns the ability slot on success
pub fn check_ready(caster: &UnitInstance, ability_id: &str) -> Result<usize, ActionError> {
    if !caster.is_alive() {
        return Err(ActionError::InvalidActor(caster.id));
    }
    if caster.is_stunned() {
        return Err(ActionError::Stunned(caster.id));
    }

    let slot = caster
        .ability_slot(ability_id)
        .ok_or_else(|| ActionError::UnknownAbility(ability_id.to_string()))?;
    let ability = &caster.abilities[slot];

    if !ability.is_ready() {
        return Err(ActionError::OnCooldown {
            ability: ability_id.to_string(),
            remaining: ability.cooldown_remaining(),
        });
    }

    let template = ability.template();
    if caster.mana() < template.mana_cost {
        return Err(ActionError::InsufficientMana {
            have: caster.mana(),
            need: template.mana_cost,
        });
    }

    if let Some(action) = template.guard_action {
        let guard = caster
            .engine
            .as_guard()
            .ok_or(ActionError::InvalidActor(caster.id))?;
        guard.can_afford(action)?;
    }

    Ok(slot)
}

/// Pay for a cast: mana, guard stacks, cooldown and the surge notification
pub fn begin_cast(
    caster: &mut UnitInstance,
    ability_id: &str,
    rng: &mut impl Rng,
) -> Result<CastTicket, ActionError> {
    let slot = check_ready(caster, ability_id)?;
    let template = Arc::clone(caster.abilities[slot].template());

    let spell_power = caster.engine.spell_power_multiplier();
    caster.spend_mana(template.mana_cost);

    let guard_duration = match (template.guard_action, caster.engine.as_guard_mut()) {
        (Some(action), Some(guard)) => Some(guard.perform(action)?),
        _ => None,
    };

    let reduction = caster.engine.cooldown_reduction();
    caster.abilities[slot].start_cooldown(reduction);

    let max_health = caster.max_health();
    let surge = caster.engine.on_spell_cast(rng, max_health);
    let backlash = match surge {
        Some(SurgeOutcome::Overloaded { backlash, .. }) => caster.take_damage(backlash),
        _ => 0.0,
    };

    debug!(
        caster = %caster.id,
        ability = %template.id,
        spell_power,
        cooldown_reduction = reduction,
        "Ability cast"
    );

    Ok(CastTicket {
        mana_spent: template.mana_cost,
        template,
        spell_power,
        surge,
        guard_duration,
        backlash,
    })
}

/// Pipeline input for an ability hit against `target`
///
/// Ability damage is mitigated by magic resist.
pub fn ability_damage_input(
    ticket: &CastTicket,
    caster: &UnitInstance,
    target: &UnitInstance,
    modifier_multiplier: f32,
) -> DamageInput {
    DamageInput {
        magnitude: ticket.template.magnitude,
        archetype_multiplier: ticket.spell_power
            * caster
                .engine
                .outgoing_damage_multiplier(target.health_fraction()),
        modifier_multiplier,
        damage_reduction: target.engine.damage_reduction(),
        mitigation: target.mitigation(DamageKind::Magical),
    }
}

/// Heal amount before clamping
pub fn heal_amount(ticket: &CastTicket, healing_bonus: f32) -> f32 {
    ticket.template.magnitude * ticket.spell_power * (1.0 + healing_bonus)
}

/// Timed modifier for a Buff or Debuff; `None` for other kinds
pub fn stat_modifier(template: &AbilityTemplate) -> Option<StatModifier> {
    let stat = template.stat?;
    let fraction = template.magnitude;
    let modifier = match (template.kind, stat) {
        (AbilityKind::Buff, StatKind::AttackInterval) => {
            StatModifier::attack_speed(fraction, ModifierSource::Ability)
        }
        (AbilityKind::Debuff, StatKind::AttackInterval) => {
            StatModifier::attack_speed(-fraction, ModifierSource::Ability)
        }
        (AbilityKind::Buff, stat) => StatModifier::mul(stat, 1.0 + fraction, ModifierSource::Ability),
        (AbilityKind::Debuff, stat) => {
            StatModifier::mul(stat, (1.0 - fraction).max(0.0), ModifierSource::Ability)
        }
        _ => return None,
    };
    Some(modifier.timed(template.duration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{Ability, TargetType};
    use crate::archetype::{Archetype, GuardAction};
    use crate::core::config::{EngineConfig, ManaSurgeConfig};
    use crate::core::rng::seeded;
    use crate::core::types::{Side, UnitId};
    use crate::stats::BaseStats;
    use crate::synergy::SynergyTag;
    use crate::unit::UnitTemplate;

    fn ability(id: &str, kind: AbilityKind, mana_cost: f32, magnitude: f32) -> AbilityTemplate {
        AbilityTemplate {
            id: id.into(),
            name: id.into(),
            kind,
            mana_cost,
            cooldown: 5.0,
            magnitude,
            target: TargetType::SingleEnemy,
            stat: None,
            duration: 0.0,
            guard_action: None,
        }
    }

    fn caster(archetype: Archetype, abilities: Vec<AbilityTemplate>, config: &EngineConfig) -> UnitInstance {
        let template = Arc::new(UnitTemplate {
            id: "caster".into(),
            name: "Caster".into(),
            stats: BaseStats {
                max_health: 200.0,
                max_mana: 50.0,
                ..BaseStats::default()
            },
            archetype,
            tags: [SynergyTag::None; 2],
            abilities: abilities.iter().map(|a| a.id.clone()).collect(),
            playable: true,
        });
        let abilities = abilities
            .into_iter()
            .map(|a| Ability::new(Arc::new(a)))
            .collect();
        UnitInstance::new(UnitId(1), Side::Party, template, abilities, config)
    }

    #[test]
    fn test_insufficient_mana_leaves_state_untouched() {
        let config = EngineConfig::default();
        let mut unit = caster(
            Archetype::Mage,
            vec![ability("meteor", AbilityKind::Damage, 80.0, 50.0)],
            &config,
        );

        let err = begin_cast(&mut unit, "meteor", &mut seeded(1)).unwrap_err();
        assert_eq!(err, ActionError::InsufficientMana { have: 50.0, need: 80.0 });
        assert_eq!(unit.mana(), 50.0);
        assert!(unit.abilities[0].is_ready());
        assert_eq!(unit.engine.stacks(), 0);
    }

    #[test]
    fn test_cast_pays_and_starts_cooldown() {
        let config = EngineConfig::default();
        let mut unit = caster(
            Archetype::Mage,
            vec![ability("bolt", AbilityKind::Damage, 20.0, 30.0)],
            &config,
        );

        let ticket = begin_cast(&mut unit, "bolt", &mut seeded(1)).unwrap();
        assert_eq!(ticket.spell_power, 1.0);
        assert_eq!(unit.mana(), 30.0);
        assert_eq!(unit.abilities[0].cooldown_remaining(), 5.0);
        assert_eq!(ticket.surge, Some(SurgeOutcome::Charged { stacks: 1 }));

        let err = begin_cast(&mut unit, "bolt", &mut seeded(1)).unwrap_err();
        assert!(matches!(err, ActionError::OnCooldown { .. }));
    }

    #[test]
    fn test_spell_power_read_before_surge_rises() {
        let config = EngineConfig::default();
        let mut free = ability("spark", AbilityKind::Damage, 0.0, 10.0);
        free.cooldown = 0.0;
        let mut unit = caster(Archetype::Mage, vec![free], &config);
        let mut rng = seeded(3);

        begin_cast(&mut unit, "spark", &mut rng).unwrap();
        let second = begin_cast(&mut unit, "spark", &mut rng).unwrap();
        assert!((second.spell_power - 1.1).abs() < 1e-5);
    }

    #[test]
    fn test_overload_backlash_hits_caster() {
        let config = EngineConfig {
            mana_surge: ManaSurgeConfig {
                max_stacks: 1,
                overload_chance: 1.0,
                ..ManaSurgeConfig::default()
            },
            ..EngineConfig::default()
        };
        let mut spell = ability("spark", AbilityKind::Damage, 0.0, 10.0);
        spell.cooldown = 0.0;
        let mut unit = caster(Archetype::Mage, vec![spell], &config);

        let ticket = begin_cast(&mut unit, "spark", &mut seeded(9)).unwrap();
        assert!(matches!(ticket.surge, Some(SurgeOutcome::Overloaded { .. })));
        assert!((ticket.backlash - 20.0).abs() < 1e-4);
        assert!((unit.health() - 180.0).abs() < 1e-4);

        let err = begin_cast(&mut unit, "spark", &mut seeded(9)).unwrap_err();
        assert_eq!(err, ActionError::Stunned(UnitId(1)));
    }

    #[test]
    fn test_taunt_requires_guard() {
        let config = EngineConfig::default();
        let mut taunt = ability("taunt", AbilityKind::Utility, 0.0, 0.0);
        taunt.guard_action = Some(GuardAction::Taunt);
        taunt.target = TargetType::SelfOnly;
        let mut unit = caster(Archetype::Tank, vec![taunt], &config);

        let err = begin_cast(&mut unit, "taunt", &mut seeded(1)).unwrap_err();
        assert_eq!(err, ActionError::InsufficientGuard { have: 0, need: 30 });
        assert!(unit.abilities[0].is_ready());

        for _ in 0..6 {
            unit.engine.on_damage_taken(1.0);
        }
        let ticket = begin_cast(&mut unit, "taunt", &mut seeded(1)).unwrap();
        assert_eq!(ticket.guard_duration, Some(3.0));
        assert_eq!(unit.engine.stacks(), 0);
        assert!(unit.engine.is_taunting());
    }

    #[test]
    fn test_kill_chain_shortens_cooldown() {
        let config = EngineConfig::default();
        let mut unit = caster(
            Archetype::Assassin,
            vec![ability("backstab", AbilityKind::Damage, 0.0, 40.0)],
            &config,
        );
        unit.engine.on_kill();
        unit.engine.on_kill();

        begin_cast(&mut unit, "backstab", &mut seeded(1)).unwrap();
        assert!((unit.abilities[0].cooldown_remaining() - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_debuff_never_inverts_stat() {
        let mut shred = ability("shred", AbilityKind::Debuff, 0.0, 1.5);
        shred.stat = Some(StatKind::Armor);
        shred.duration = 2.0;
        let modifier = stat_modifier(&shred).unwrap();
        assert_eq!(modifier.remaining, Some(2.0));
        assert_eq!(modifier.op, crate::stats::ModifierOp::Mul(0.0));

        let bolt = ability("bolt", AbilityKind::Damage, 0.0, 1.0);
        assert!(stat_modifier(&bolt).is_none());
    }
}
