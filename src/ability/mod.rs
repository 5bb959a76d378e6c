//! Abilities: catalog templates and per-caster runtime state

pub mod executor;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::archetype::GuardAction;
use crate::core::types::Seconds;
use crate::stats::StatKind;

pub use executor::{
    ability_damage_input, begin_cast, check_ready, heal_amount, stat_modifier, CastTicket,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityKind {
    Damage,
    Heal,
    Buff,
    Debuff,
    Utility,
}

/// Who an ability may be aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
    SingleEnemy,
    SingleAlly,
    SelfOnly,
    AllEnemies,
    AllAllies,
}

/// Immutable ability definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityTemplate {
    pub id: String,
    pub name: String,
    pub kind: AbilityKind,
    pub mana_cost: f32,
    pub cooldown: Seconds,
    /// Damage or heal amount, or buff/debuff fraction
    pub magnitude: f32,
    pub target: TargetType,
    /// Stat touched by a Buff/Debuff
    #[serde(default)]
    pub stat: Option<StatKind>,
    /// Lifetime of a Buff/Debuff modifier
    #[serde(default)]
    pub duration: Seconds,
    /// Guard spend performed by a Utility ability
    #[serde(default)]
    pub guard_action: Option<GuardAction>,
}

/// An ability slot on one caster
#[derive(Debug, Clone, PartialEq)]
pub struct Ability {
    template: Arc<AbilityTemplate>,
    cooldown_remaining: Seconds,
}

impl Ability {
    pub fn new(template: Arc<AbilityTemplate>) -> Self {
        Self {
            template,
            cooldown_remaining: 0.0,
        }
    }

    pub fn id(&self) -> &str {
        &self.template.id
    }

    pub fn template(&self) -> &Arc<AbilityTemplate> {
        &self.template
    }

    pub fn cooldown_remaining(&self) -> Seconds {
        self.cooldown_remaining
    }

    pub fn is_ready(&self) -> bool {
        self.cooldown_remaining <= 0.0
    }

    /// Start the cooldown, shortened by `reduction` and floored at zero
    pub fn start_cooldown(&mut self, reduction: f32) {
        self.cooldown_remaining = (self.template.cooldown * (1.0 - reduction)).max(0.0);
    }

    pub fn tick(&mut self, dt: Seconds) {
        self.cooldown_remaining = (self.cooldown_remaining - dt).max(0.0);
    }

    pub fn reset(&mut self) {
        self.cooldown_remaining = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strike() -> Arc<AbilityTemplate> {
        Arc::new(AbilityTemplate {
            id: "strike".into(),
            name: "Strike".into(),
            kind: AbilityKind::Damage,
            mana_cost: 10.0,
            cooldown: 4.0,
            magnitude: 30.0,
            target: TargetType::SingleEnemy,
            stat: None,
            duration: 0.0,
            guard_action: None,
        })
    }

    #[test]
    fn test_cooldown_ticks_to_zero() {
        let mut ability = Ability::new(strike());
        ability.start_cooldown(0.0);
        assert_eq!(ability.cooldown_remaining(), 4.0);

        ability.tick(3.0);
        assert!(!ability.is_ready());
        ability.tick(5.0);
        assert_eq!(ability.cooldown_remaining(), 0.0);
        assert!(ability.is_ready());
    }

    #[test]
    fn test_reduction_shortens_and_floors() {
        let mut ability = Ability::new(strike());
        ability.start_cooldown(0.25);
        assert_eq!(ability.cooldown_remaining(), 3.0);

        // Kill-chain reduction above 100% cannot make cooldown negative
        ability.start_cooldown(1.6);
        assert_eq!(ability.cooldown_remaining(), 0.0);
    }

    #[test]
    fn test_template_deserializes_with_defaults() {
        let template: AbilityTemplate = toml::from_str(
            r#"
            id = "mend"
            name = "Mend"
            kind = "Heal"
            mana_cost = 15.0
            cooldown = 3.0
            magnitude = 40.0
            target = "SingleAlly"
            "#,
        )
        .unwrap();
        assert_eq!(template.kind, AbilityKind::Heal);
        assert_eq!(template.stat, None);
        assert_eq!(template.guard_action, None);
    }
}
