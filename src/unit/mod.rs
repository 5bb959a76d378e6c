//! Unit templates and runtime instances

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ability::Ability;
use crate::archetype::{Archetype, ResourceEngine};
use crate::core::config::EngineConfig;
use crate::core::types::{Seconds, Side, UnitId};
use crate::stats::{BaseStats, DamageKind, StatBlock, StatKind, StatModifier};
use crate::synergy::SynergyTag;

/// Immutable unit definition, shared by every instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitTemplate {
    pub id: String,
    pub name: String,
    pub stats: BaseStats,
    pub archetype: Archetype,
    #[serde(default)]
    pub tags: [SynergyTag; 2],
    #[serde(default)]
    pub abilities: Vec<String>,
    /// Can join a player party
    #[serde(default)]
    pub playable: bool,
}

/// A unit fighting in a battle or sitting in a run roster
#[derive(Debug, Clone)]
pub struct UnitInstance {
    pub id: UnitId,
    pub side: Side,
    template: Arc<UnitTemplate>,
    pub stats: StatBlock,
    health: f32,
    mana: f32,
    alive: bool,
    /// Time until the next basic attack is allowed
    attack_timer: Seconds,
    pub engine: ResourceEngine,
    pub abilities: Vec<Ability>,
    /// Current target, if any (not owned)
    pub target: Option<UnitId>,
}

impl UnitInstance {
    pub fn new(
        id: UnitId,
        side: Side,
        template: Arc<UnitTemplate>,
        abilities: Vec<Ability>,
        config: &EngineConfig,
    ) -> Self {
        let stats = StatBlock::new(template.stats);
        let engine = ResourceEngine::for_archetype(template.archetype, config);
        Self {
            id,
            side,
            health: stats.effective(StatKind::MaxHealth),
            mana: stats.effective(StatKind::MaxMana),
            stats,
            alive: true,
            attack_timer: 0.0,
            engine,
            abilities,
            target: None,
            template,
        }
    }

    pub fn template(&self) -> &Arc<UnitTemplate> {
        &self.template
    }

    pub fn name(&self) -> &str {
        &self.template.name
    }

    pub fn archetype(&self) -> Archetype {
        self.template.archetype
    }

    pub fn tags(&self) -> [SynergyTag; 2] {
        self.template.tags
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.stats.effective(StatKind::MaxHealth)
    }

    pub fn mana(&self) -> f32 {
        self.mana
    }

    pub fn max_mana(&self) -> f32 {
        self.stats.effective(StatKind::MaxMana)
    }

    pub fn is_alive(&self) -> bool {
        self.alive && self.health > 0.0
    }

    pub fn health_fraction(&self) -> f32 {
        let max = self.max_health();
        if max <= 0.0 {
            0.0
        } else {
            self.health / max
        }
    }

    /// Flat reduction against hits of `kind`
    pub fn mitigation(&self, kind: DamageKind) -> f32 {
        self.stats.effective(kind.mitigation_stat())
    }

    pub fn attack_timer(&self) -> Seconds {
        self.attack_timer
    }

    pub fn attack_ready(&self) -> bool {
        self.attack_timer <= 0.0
    }

    /// Interval until the next swing: effective interval over attack speed
    pub fn attack_interval(&self) -> Seconds {
        let speed = self.engine.attack_speed_multiplier().max(0.01);
        self.stats.effective(StatKind::AttackInterval) / speed
    }

    pub fn start_attack_timer(&mut self) {
        self.attack_timer = self.attack_interval();
    }

    pub fn is_stunned(&self) -> bool {
        self.engine.is_stunned()
    }

    pub fn can_act(&self) -> bool {
        self.is_alive() && !self.is_stunned()
    }

    pub fn ability_slot(&self, ability_id: &str) -> Option<usize> {
        self.abilities.iter().position(|a| a.id() == ability_id)
    }

    /// Remove health; returns the amount actually lost
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        if !self.is_alive() {
            return 0.0;
        }
        let before = self.health;
        self.health = (self.health - amount.max(0.0)).max(0.0);
        if self.health <= 0.0 {
            self.alive = false;
        }
        before - self.health
    }

    /// Additive heal clamped to max health; returns the amount restored
    pub fn heal(&mut self, amount: f32) -> f32 {
        if !self.is_alive() {
            return 0.0;
        }
        let (health, restored) = crate::stats::apply_heal(self.health, self.max_health(), amount);
        self.health = health;
        restored
    }

    pub fn restore_mana(&mut self, amount: f32) {
        self.mana = (self.mana + amount.max(0.0)).min(self.max_mana());
    }

    /// Deduct mana if affordable
    pub fn spend_mana(&mut self, cost: f32) -> bool {
        if self.mana < cost {
            return false;
        }
        self.mana -= cost;
        true
    }

    pub fn push_modifier(&mut self, modifier: StatModifier) {
        self.stats.push(modifier);
        self.clamp_resources();
    }

    /// Back to full health and mana with fresh timers
    pub fn restore_full(&mut self) {
        self.alive = true;
        self.health = self.max_health();
        self.mana = self.max_mana();
        self.attack_timer = 0.0;
        self.target = None;
        for ability in &mut self.abilities {
            ability.reset();
        }
    }

    /// Keep health and mana within their current maxima
    pub fn clamp_resources(&mut self) {
        self.health = self.health.clamp(0.0, self.max_health());
        self.mana = self.mana.clamp(0.0, self.max_mana());
        if self.health <= 0.0 {
            self.alive = false;
        }
    }

    /// Advance cooldowns, modifier lifetimes and the resource engine
    pub fn tick(&mut self, dt: Seconds) {
        if !self.is_alive() {
            return;
        }
        self.attack_timer = (self.attack_timer - dt).max(0.0);
        for ability in &mut self.abilities {
            ability.tick(dt);
        }
        if self.stats.tick(dt) {
            self.clamp_resources();
        }
        self.engine.tick(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::ModifierSource;

    fn template() -> Arc<UnitTemplate> {
        Arc::new(UnitTemplate {
            id: "ghoul".into(),
            name: "Ghoul".into(),
            stats: BaseStats {
                max_health: 100.0,
                max_mana: 40.0,
                attack_interval: 1.5,
                ..BaseStats::default()
            },
            archetype: Archetype::Fighter,
            tags: [SynergyTag::Shadow, SynergyTag::None],
            abilities: Vec::new(),
            playable: false,
        })
    }

    fn unit() -> UnitInstance {
        UnitInstance::new(UnitId(1), Side::Enemy, template(), Vec::new(), &EngineConfig::default())
    }

    #[test]
    fn test_new_unit_is_full() {
        let unit = unit();
        assert_eq!(unit.health(), 100.0);
        assert_eq!(unit.mana(), 40.0);
        assert!(unit.is_alive());
        assert!(unit.attack_ready());
    }

    #[test]
    fn test_lethal_damage_never_goes_negative() {
        let mut unit = unit();
        let lost = unit.take_damage(250.0);
        assert_eq!(lost, 100.0);
        assert_eq!(unit.health(), 0.0);
        assert!(!unit.is_alive());

        assert_eq!(unit.take_damage(10.0), 0.0);
        assert_eq!(unit.heal(50.0), 0.0);
    }

    #[test]
    fn test_mitigation_follows_damage_kind() {
        let mut unit = unit();
        unit.push_modifier(StatModifier::add(StatKind::Armor, 7.0, ModifierSource::Ability));
        unit.push_modifier(StatModifier::add(StatKind::MagicResist, 3.0, ModifierSource::Ability));
        assert_eq!(unit.mitigation(DamageKind::Physical), 7.0);
        assert_eq!(unit.mitigation(DamageKind::Magical), 3.0);
    }

    #[test]
    fn test_heal_clamped() {
        let mut unit = unit();
        unit.take_damage(30.0);
        assert_eq!(unit.heal(50.0), 30.0);
        assert_eq!(unit.health(), 100.0);
    }

    #[test]
    fn test_mana_spend_requires_balance() {
        let mut unit = unit();
        assert!(!unit.spend_mana(50.0));
        assert_eq!(unit.mana(), 40.0);
        assert!(unit.spend_mana(15.0));
        assert_eq!(unit.mana(), 25.0);
    }

    #[test]
    fn test_attack_timer_uses_momentum_speed() {
        let mut unit = unit();
        for _ in 0..10 {
            unit.engine.on_successful_hit();
        }
        unit.start_attack_timer();
        // 1.5 / 1.5
        assert!((unit.attack_timer() - 1.0).abs() < 1e-5);

        unit.tick(0.4);
        assert!(!unit.attack_ready());
        unit.tick(0.6);
        assert!(unit.attack_ready());
    }

    #[test]
    fn test_expiring_health_buff_clamps_current() {
        let mut unit = unit();
        unit.push_modifier(
            StatModifier::mul(StatKind::MaxHealth, 2.0, ModifierSource::Ability).timed(1.0),
        );
        unit.heal(100.0);
        assert_eq!(unit.health(), 200.0);

        unit.tick(1.0);
        assert_eq!(unit.health(), 100.0);
    }
}
