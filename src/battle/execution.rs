//! Battle execution loop
//!
//! Idle -> PartyTurn -> EnemyTurn -> PartyTurn -> ... -> Victory | Defeat
//!
//! Every turn boundary runs the same iteration: drop the dead, check for an
//! outcome, then hand the turn to the next side. Time only moves through
//! `tick`, which drives the party timeout and enemy pacing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ability::{
    ability_damage_input, begin_cast, check_ready, heal_amount, stat_modifier, AbilityKind,
    CastTicket, TargetType,
};
use crate::archetype::{GuardAction, SurgeOutcome};
use crate::battle::resolution::{apply_hit, basic_attack_input, enemy_target, HitKind, HitResult};
use crate::core::config::EngineConfig;
use crate::core::error::ActionError;
use crate::core::rng::SimRng;
use crate::core::types::{Seconds, Side, UnitId};
use crate::events::{CoreEvent, EventQueue};
use crate::run::relic::{roll_crits, CritHook};
use crate::synergy::{aggregate, apply_stat_bonuses, SynergyEffect, SynergySet};
use crate::unit::UnitInstance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BattlePhase {
    #[default]
    Idle,
    PartyTurn,
    EnemyTurn,
    Victory,
    Defeat,
    /// Torn down before an outcome
    Aborted,
}

impl BattlePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BattlePhase::Victory | BattlePhase::Defeat | BattlePhase::Aborted
        )
    }
}

/// One player input during the party turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerAction {
    Attack {
        attacker: UnitId,
        target: UnitId,
    },
    UseAbility {
        caster: UnitId,
        ability_id: String,
        target: Option<UnitId>,
    },
    EndTurn,
}

/// Summary of an accepted action
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionOutcome {
    pub damage: f32,
    pub healing: f32,
    pub kills: Vec<UnitId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetRef {
    Ally(usize),
    Enemy(usize),
}

/// One encounter between a party and an enemy roster
#[derive(Debug)]
pub struct BattleLoop {
    config: Arc<EngineConfig>,
    party: Vec<UnitInstance>,
    enemies: Vec<UnitInstance>,
    phase: BattlePhase,
    turn: u32,
    synergy: SynergySet,
    crit_hooks: Vec<CritHook>,
    rng: SimRng,
    /// Simulated time spent in the current party turn
    turn_elapsed: Seconds,
    /// Next enemy to act this enemy turn
    enemy_cursor: usize,
    pacing_remaining: Seconds,
    elapsed: Seconds,
    events: EventQueue,
}

impl BattleLoop {
    pub fn new(
        party: Vec<UnitInstance>,
        enemies: Vec<UnitInstance>,
        config: Arc<EngineConfig>,
        rng: SimRng,
    ) -> Self {
        Self {
            config,
            party,
            enemies,
            phase: BattlePhase::Idle,
            turn: 0,
            synergy: SynergySet::default(),
            crit_hooks: Vec::new(),
            rng,
            turn_elapsed: 0.0,
            enemy_cursor: 0,
            pacing_remaining: 0.0,
            elapsed: 0.0,
            events: EventQueue::new(),
        }
    }

    /// Relic critical-strike hooks for party damage
    pub fn with_crit_hooks(mut self, hooks: Vec<CritHook>) -> Self {
        self.crit_hooks = hooks;
        self
    }

    // === Queries ===

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn elapsed(&self) -> Seconds {
        self.elapsed
    }

    pub fn turn_elapsed(&self) -> Seconds {
        self.turn_elapsed
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    /// `Some(true)` on victory, `Some(false)` on defeat
    pub fn outcome(&self) -> Option<bool> {
        match self.phase {
            BattlePhase::Victory => Some(true),
            BattlePhase::Defeat => Some(false),
            _ => None,
        }
    }

    pub fn party(&self) -> &[UnitInstance] {
        &self.party
    }

    pub fn enemies(&self) -> &[UnitInstance] {
        &self.enemies
    }

    pub fn unit(&self, id: UnitId) -> Option<&UnitInstance> {
        self.party
            .iter()
            .chain(self.enemies.iter())
            .find(|u| u.id == id)
    }

    pub fn synergy(&self) -> &SynergySet {
        &self.synergy
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<CoreEvent> {
        self.events.drain()
    }

    fn party_index(&self, id: UnitId) -> Option<usize> {
        self.party.iter().position(|u| u.id == id)
    }

    fn living_enemy(&self, id: UnitId) -> Option<usize> {
        self.enemies.iter().position(|u| u.id == id && u.is_alive())
    }

    fn living_ally(&self, id: UnitId) -> Option<usize> {
        self.party.iter().position(|u| u.id == id && u.is_alive())
    }

    // === Lifecycle ===

    /// Leave `Idle` and run the first iteration
    pub fn start(&mut self) {
        if self.phase != BattlePhase::Idle {
            return;
        }
        for unit in self.party.iter_mut().chain(self.enemies.iter_mut()) {
            unit.engine.on_combat_start();
            unit.target = None;
        }
        self.refresh_synergy();

        info!(
            party = self.party.len(),
            enemies = self.enemies.len(),
            synergies = ?self.synergy.active_tags(),
            "Battle started"
        );
        self.advance(Side::Party);
    }

    /// Forced teardown; idempotent and silent
    pub fn abort(&mut self) {
        if self.phase.is_terminal() {
            return;
        }
        for unit in self.party.iter_mut().chain(self.enemies.iter_mut()) {
            unit.engine.reset();
        }
        self.phase = BattlePhase::Aborted;
        info!(turn = self.turn, "Battle aborted");
    }

    /// Advance simulated time
    pub fn tick(&mut self, dt: Seconds) {
        if !matches!(self.phase, BattlePhase::PartyTurn | BattlePhase::EnemyTurn) {
            return;
        }
        self.elapsed += dt;
        for unit in self.party.iter_mut().chain(self.enemies.iter_mut()) {
            unit.tick(dt);
        }

        match self.phase {
            BattlePhase::PartyTurn => {
                self.turn_elapsed += dt;
                if self.turn_elapsed >= self.config.battle.party_turn_timeout {
                    debug!(turn = self.turn, "Party turn timed out");
                    self.events.push(CoreEvent::TurnTimedOut { turn: self.turn });
                    self.end_party_turn();
                }
            }
            BattlePhase::EnemyTurn => {
                self.pacing_remaining -= dt;
                self.run_enemy_actions();
            }
            _ => {}
        }
    }

    /// Resolve one party action. Rejections leave the battle untouched.
    pub fn submit(&mut self, action: PlayerAction) -> Result<ActionOutcome, ActionError> {
        if self.phase != BattlePhase::PartyTurn {
            return Err(ActionError::NotPartyTurn);
        }

        let outcome = match action {
            PlayerAction::Attack { attacker, target } => self.party_attack(attacker, target)?,
            PlayerAction::UseAbility {
                caster,
                ability_id,
                target,
            } => self.party_ability(caster, &ability_id, target)?,
            PlayerAction::EndTurn => {
                self.end_party_turn();
                return Ok(ActionOutcome::default());
            }
        };

        self.check_outcome();
        Ok(outcome)
    }

    // === Loop iteration ===

    fn advance(&mut self, next: Side) {
        self.remove_dead();
        if self.check_outcome() {
            return;
        }
        match next {
            Side::Party => self.begin_party_turn(),
            Side::Enemy => self.begin_enemy_turn(),
        }
    }

    fn remove_dead(&mut self) {
        self.party.retain(|u| u.is_alive());
        self.enemies.retain(|u| u.is_alive());
    }

    /// Finish the battle if a side is wiped; returns true when finished
    fn check_outcome(&mut self) -> bool {
        if self.phase.is_terminal() {
            return true;
        }
        if !self.party.iter().any(|u| u.is_alive()) {
            self.finish(false);
            return true;
        }
        if !self.enemies.iter().any(|u| u.is_alive()) {
            self.finish(true);
            return true;
        }
        false
    }

    fn finish(&mut self, victory: bool) {
        self.phase = if victory {
            BattlePhase::Victory
        } else {
            BattlePhase::Defeat
        };
        for unit in self.party.iter_mut().chain(self.enemies.iter_mut()) {
            unit.engine.on_combat_end();
        }
        self.events.push(CoreEvent::CombatEnded {
            victory,
            turns: self.turn,
        });
        info!(victory, turns = self.turn, elapsed = self.elapsed, "Battle ended");
    }

    fn begin_party_turn(&mut self) {
        self.turn += 1;
        self.phase = BattlePhase::PartyTurn;
        self.turn_elapsed = 0.0;
        self.events.push(CoreEvent::TurnStarted {
            side: Side::Party,
            turn: self.turn,
        });
        self.apply_turn_start_synergy();
        debug!(turn = self.turn, "Party turn");
    }

    fn end_party_turn(&mut self) {
        self.advance(Side::Enemy);
    }

    fn begin_enemy_turn(&mut self) {
        self.phase = BattlePhase::EnemyTurn;
        self.enemy_cursor = 0;
        self.pacing_remaining = 0.0;
        self.events.push(CoreEvent::TurnStarted {
            side: Side::Enemy,
            turn: self.turn,
        });
        self.run_enemy_actions();
    }

    /// Act with every enemy whose pacing slot has come up
    fn run_enemy_actions(&mut self) {
        let delay = self.config.battle.enemy_pacing_delay;
        while self.phase == BattlePhase::EnemyTurn {
            if self.enemy_cursor >= self.enemies.len() {
                self.advance(Side::Party);
                return;
            }
            if self.pacing_remaining > 0.0 {
                return;
            }

            let index = self.enemy_cursor;
            self.enemy_cursor += 1;
            if !self.enemies[index].can_act() {
                continue;
            }
            if let Some(target) = enemy_target(&self.party) {
                self.basic_attack(Side::Enemy, index, target);
            }
            if self.check_outcome() {
                return;
            }
            self.pacing_remaining += delay;
        }
    }

    // === Synergy ===

    fn refresh_synergy(&mut self) {
        self.synergy = aggregate(
            self.party
                .iter()
                .filter(|u| u.is_alive())
                .map(|u| u.tags()),
        );
        for unit in self.party.iter_mut().filter(|u| u.is_alive()) {
            apply_stat_bonuses(&mut unit.stats, &self.synergy);
            unit.clamp_resources();
        }
        debug!(active = ?self.synergy.active_tags(), "Synergy recomputed");
    }

    fn apply_turn_start_synergy(&mut self) {
        let heal_fraction = self.synergy.magnitude(SynergyEffect::PartyHealPerTurn);
        let mana = self.synergy.magnitude(SynergyEffect::ManaPerTurn);
        let healing_bonus = self.synergy.magnitude(SynergyEffect::HealingBonus);

        for unit in self.party.iter_mut().filter(|u| u.is_alive()) {
            if heal_fraction > 0.0 {
                let amount = unit.max_health() * heal_fraction * (1.0 + healing_bonus);
                let restored = unit.heal(amount);
                if restored > 0.0 {
                    self.events.push(CoreEvent::UnitHealed {
                        source: unit.id,
                        target: unit.id,
                        amount: restored,
                    });
                }
            }
            if mana > 0.0 {
                unit.restore_mana(mana);
            }
        }
    }

    fn on_unit_died(&mut self, id: UnitId, side: Side) {
        debug!(unit = %id, ?side, "Unit died");
        self.events.push(CoreEvent::UnitDied { unit: id, side });
        if side == Side::Party {
            self.refresh_synergy();
        }
    }

    // === Actions ===

    fn party_attack(
        &mut self,
        attacker: UnitId,
        target: UnitId,
    ) -> Result<ActionOutcome, ActionError> {
        let index = self
            .party_index(attacker)
            .ok_or(ActionError::InvalidActor(attacker))?;
        let unit = &self.party[index];
        if !unit.is_alive() {
            return Err(ActionError::InvalidActor(attacker));
        }
        if unit.is_stunned() {
            return Err(ActionError::Stunned(attacker));
        }
        if !unit.attack_ready() {
            return Err(ActionError::AttackNotReady {
                remaining: unit.attack_timer(),
            });
        }
        let target_index = self
            .living_enemy(target)
            .ok_or(ActionError::InvalidTarget(Some(target)))?;

        let hit = self.basic_attack(Side::Party, index, target_index);
        Ok(ActionOutcome {
            damage: hit.dealt,
            healing: 0.0,
            kills: if hit.killed { vec![target] } else { Vec::new() },
        })
    }

    /// Basic-attack path shared by both sides
    fn basic_attack(&mut self, side: Side, attacker: usize, defender: usize) -> HitResult {
        let crit = match side {
            Side::Party => roll_crits(&self.crit_hooks, &mut self.rng),
            Side::Enemy => 1.0,
        };
        let lifesteal = match side {
            Side::Party => self.synergy.magnitude(SynergyEffect::Lifesteal),
            Side::Enemy => 0.0,
        };

        let (attackers, defenders) = match side {
            Side::Party => (&mut self.party, &mut self.enemies),
            Side::Enemy => (&mut self.enemies, &mut self.party),
        };
        let attacker = &mut attackers[attacker];
        let defender = &mut defenders[defender];
        let attacker_stacks = attacker.engine.stacks();
        let defender_stacks = defender.engine.stacks();

        attacker.engine.on_attack_target(defender.id);
        attacker.target = Some(defender.id);
        let input = basic_attack_input(attacker, defender, crit);
        let hit = apply_hit(attacker, defender, &input, HitKind::Basic);
        attacker.start_attack_timer();

        debug!(
            attacker = %attacker.id,
            defender = %defender.id,
            raw = hit.breakdown.raw,
            dealt = hit.dealt,
            crit,
            "Basic attack"
        );

        self.events.push(CoreEvent::DamageDealt {
            source: attacker.id,
            target: defender.id,
            amount: hit.dealt,
            ability: None,
        });
        if lifesteal > 0.0 && hit.dealt > 0.0 {
            let restored = attacker.heal(hit.dealt * lifesteal);
            if restored > 0.0 {
                self.events.push(CoreEvent::UnitHealed {
                    source: attacker.id,
                    target: attacker.id,
                    amount: restored,
                });
            }
        }
        if attacker.engine.stacks() != attacker_stacks {
            self.events.push(resource_event(attacker));
        }
        if defender.engine.stacks() != defender_stacks {
            self.events.push(resource_event(defender));
        }

        let died = hit.killed.then_some((defender.id, defender.side));
        if let Some((id, side)) = died {
            self.on_unit_died(id, side);
        }
        hit
    }

    fn party_ability(
        &mut self,
        caster: UnitId,
        ability_id: &str,
        target: Option<UnitId>,
    ) -> Result<ActionOutcome, ActionError> {
        let index = self
            .party_index(caster)
            .ok_or(ActionError::InvalidActor(caster))?;
        let slot = check_ready(&self.party[index], ability_id)?;
        let target_type = self.party[index].abilities[slot].template().target;
        let targets = self.resolve_targets(index, target_type, target)?;

        let ticket = begin_cast(&mut self.party[index], ability_id, &mut self.rng)?;
        self.events.push(CoreEvent::AbilityUsed {
            caster,
            ability: ticket.template.id.clone(),
            target,
        });
        self.record_cast_side_effects(index, &ticket);

        let outcome = self.apply_effect(index, &ticket, &targets);

        if ticket.backlash > 0.0 && !self.party[index].is_alive() {
            self.on_unit_died(caster, Side::Party);
        }
        Ok(outcome)
    }

    fn resolve_targets(
        &self,
        caster: usize,
        target_type: TargetType,
        target: Option<UnitId>,
    ) -> Result<Vec<TargetRef>, ActionError> {
        let targets = match target_type {
            TargetType::SingleEnemy => {
                let id = target.ok_or(ActionError::InvalidTarget(None))?;
                let index = self
                    .living_enemy(id)
                    .ok_or(ActionError::InvalidTarget(Some(id)))?;
                vec![TargetRef::Enemy(index)]
            }
            TargetType::SingleAlly => {
                let id = target.ok_or(ActionError::InvalidTarget(None))?;
                let index = self
                    .living_ally(id)
                    .ok_or(ActionError::InvalidTarget(Some(id)))?;
                vec![TargetRef::Ally(index)]
            }
            TargetType::SelfOnly => vec![TargetRef::Ally(caster)],
            TargetType::AllEnemies => (0..self.enemies.len())
                .filter(|&i| self.enemies[i].is_alive())
                .map(TargetRef::Enemy)
                .collect(),
            TargetType::AllAllies => (0..self.party.len())
                .filter(|&i| self.party[i].is_alive())
                .map(TargetRef::Ally)
                .collect(),
        };
        Ok(targets)
    }

    fn record_cast_side_effects(&mut self, caster: usize, ticket: &CastTicket) {
        let unit = &self.party[caster];

        if let Some(duration) = ticket.guard_duration {
            if ticket.template.guard_action == Some(GuardAction::Taunt) {
                self.events.push(CoreEvent::TauntStarted {
                    unit: unit.id,
                    duration,
                });
            }
            self.events.push(resource_event(unit));
        }

        match ticket.surge {
            Some(SurgeOutcome::Overloaded { stun, .. }) => {
                debug!(unit = %unit.id, stun, backlash = ticket.backlash, "Mana overload");
                self.events.push(CoreEvent::Overloaded {
                    unit: unit.id,
                    stun,
                    backlash: ticket.backlash,
                });
                self.events.push(resource_event(unit));
            }
            Some(SurgeOutcome::Charged { .. }) => self.events.push(resource_event(unit)),
            Some(SurgeOutcome::Suppressed) | None => {}
        }
    }

    fn apply_effect(
        &mut self,
        caster: usize,
        ticket: &CastTicket,
        targets: &[TargetRef],
    ) -> ActionOutcome {
        let mut outcome = ActionOutcome::default();

        match ticket.template.kind {
            AbilityKind::Damage => {
                let lifesteal = self.synergy.magnitude(SynergyEffect::Lifesteal);
                let mut deaths = Vec::new();

                for target in targets {
                    // Friendly fire is not modelled
                    let TargetRef::Enemy(index) = *target else {
                        continue;
                    };
                    let crit = roll_crits(&self.crit_hooks, &mut self.rng);
                    let attacker = &mut self.party[caster];
                    let defender = &mut self.enemies[index];
                    let defender_stacks = defender.engine.stacks();

                    let input = ability_damage_input(ticket, attacker, defender, crit);
                    let hit = apply_hit(attacker, defender, &input, HitKind::Ability);
                    outcome.damage += hit.dealt;

                    self.events.push(CoreEvent::DamageDealt {
                        source: attacker.id,
                        target: defender.id,
                        amount: hit.dealt,
                        ability: Some(ticket.template.id.clone()),
                    });
                    if defender.engine.stacks() != defender_stacks {
                        self.events.push(resource_event(defender));
                    }
                    if lifesteal > 0.0 && hit.dealt > 0.0 {
                        outcome.healing += attacker.heal(hit.dealt * lifesteal);
                    }
                    if hit.killed {
                        outcome.kills.push(defender.id);
                        deaths.push(defender.id);
                    }
                }

                for id in deaths {
                    self.on_unit_died(id, Side::Enemy);
                }
            }
            AbilityKind::Heal => {
                let bonus = self.synergy.magnitude(SynergyEffect::HealingBonus);
                let amount = heal_amount(ticket, bonus);
                let source = self.party[caster].id;

                for target in targets {
                    let unit = match *target {
                        TargetRef::Ally(i) => &mut self.party[i],
                        TargetRef::Enemy(i) => &mut self.enemies[i],
                    };
                    let restored = unit.heal(amount);
                    outcome.healing += restored;
                    self.events.push(CoreEvent::UnitHealed {
                        source,
                        target: unit.id,
                        amount: restored,
                    });
                }
            }
            AbilityKind::Buff | AbilityKind::Debuff => {
                if let Some(modifier) = stat_modifier(&ticket.template) {
                    for target in targets {
                        let unit = match *target {
                            TargetRef::Ally(i) => &mut self.party[i],
                            TargetRef::Enemy(i) => &mut self.enemies[i],
                        };
                        unit.push_modifier(modifier);
                    }
                }
            }
            AbilityKind::Utility => {}
        }

        debug!(
            caster = %self.party[caster].id,
            ability = %ticket.template.id,
            mana = ticket.mana_spent,
            damage = outcome.damage,
            healing = outcome.healing,
            "Ability resolved"
        );
        outcome
    }
}

fn resource_event(unit: &UnitInstance) -> CoreEvent {
    CoreEvent::ResourceChanged {
        unit: unit.id,
        kind: unit.engine.kind(),
        current: unit.engine.stacks(),
        max: unit.engine.max_stacks(),
    }
}
