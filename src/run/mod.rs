//! Run progression across levels 1 to 100
//!
//! A run owns the party roster, the relics and a single RNG stream. Each
//! level it builds a scaled encounter as a `BattleLoop`; the caller plays the
//! battle and reports the outcome back.

pub mod levelup;
pub mod relic;

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::battle::BattleLoop;
use crate::catalog::DataCatalog;
use crate::core::config::EngineConfig;
use crate::core::error::{CoreError, Result};
use crate::core::rng::{seeded, RngState, SimRng};
use crate::core::types::{IdAllocator, Side};
use crate::encounter::{
    difficulty_multiplier, is_final_boss_level, is_major_miniboss_level, is_miniboss_level,
    scale_enemy, select_encounter, MAX_LEVEL,
};
use crate::events::{CoreEvent, EventBus, EventObserver, EventQueue, SubscriptionId};
use crate::unit::UnitInstance;

pub use levelup::{generate_choices, LevelUpCategory, LevelUpChoice, StatDelta};
pub use relic::{CritHook, RelicEffect, RelicKind};

/// Levels at which party slots unlock
pub const PARTY_SLOT_LEVELS: [u32; 4] = [1, 5, 10, 15];

pub fn unlocked_slots(level: u32) -> usize {
    PARTY_SLOT_LEVELS.iter().filter(|&&l| l <= level).count()
}

/// One party member between encounters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub template_id: String,
    /// Level-up deltas applied to this unit
    #[serde(default)]
    pub upgrades: Vec<StatDelta>,
}

impl RosterEntry {
    pub fn new(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            upgrades: Vec::new(),
        }
    }
}

/// Serializable run state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub level: u32,
    pub unlocked_slots: usize,
    pub roster: Vec<RosterEntry>,
    pub relics: Vec<String>,
    pub active: bool,
    pub gold: u32,
    /// Encounter built by the last `next_encounter`
    pub current_encounter: Option<String>,
    pub pending_gold: Option<u32>,
    /// Unclaimed level-up offers, oldest first
    #[serde(default)]
    pub pending_level_ups: Vec<Vec<LevelUpChoice>>,
    /// Result of the last finished run
    pub victory: Option<bool>,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            level: 1,
            unlocked_slots: unlocked_slots(1),
            roster: Vec::new(),
            relics: Vec::new(),
            active: false,
            gold: 0,
            current_encounter: None,
            pending_gold: None,
            pending_level_ups: Vec::new(),
            victory: None,
        }
    }
}

/// Everything needed to resume a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub state: RunState,
    pub rng: RngState,
}

pub struct RunProgression {
    config: Arc<EngineConfig>,
    catalog: Arc<DataCatalog>,
    state: RunState,
    rng: SimRng,
    events: EventQueue,
    bus: EventBus,
}

impl RunProgression {
    pub fn new(config: Arc<EngineConfig>, catalog: Arc<DataCatalog>, seed: u64) -> Self {
        Self {
            config,
            catalog,
            state: RunState::default(),
            rng: seeded(seed),
            events: EventQueue::new(),
            bus: EventBus::new(),
        }
    }

    // === Queries ===

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn level(&self) -> u32 {
        self.state.level
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn unlocked_slots(&self) -> usize {
        self.state.unlocked_slots
    }

    pub fn roster(&self) -> &[RosterEntry] {
        &self.state.roster
    }

    pub fn relics(&self) -> &[String] {
        &self.state.relics
    }

    pub fn gold(&self) -> u32 {
        self.state.gold
    }

    /// Oldest unclaimed level-up offer
    pub fn level_up_choices(&self) -> Option<&[LevelUpChoice]> {
        self.state.pending_level_ups.first().map(Vec::as_slice)
    }

    pub fn pending_level_ups(&self) -> usize {
        self.state.pending_level_ups.len()
    }

    pub fn is_miniboss(&self) -> bool {
        is_miniboss_level(self.state.level)
    }

    pub fn is_major_miniboss(&self) -> bool {
        is_major_miniboss_level(self.state.level)
    }

    pub fn is_final_boss(&self) -> bool {
        is_final_boss_level(self.state.level)
    }

    pub fn config(&self) -> &Arc<EngineConfig> {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<DataCatalog> {
        &self.catalog
    }

    // === Observers ===

    pub fn subscribe(&mut self, observer: impl EventObserver + 'static) -> SubscriptionId {
        self.bus.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    fn emit(&mut self, event: CoreEvent) {
        self.events.push(event);
    }

    fn flush(&mut self) {
        let events = self.events.drain();
        self.bus.publish_all(events);
    }

    fn require_active(&self) -> Result<()> {
        if !self.state.active {
            return Err(CoreError::RunNotActive);
        }
        Ok(())
    }

    // === Lifecycle ===

    /// Begin a fresh run at level 1 with one unit
    pub fn start_new_run(&mut self, starting_unit: &str) -> Result<()> {
        self.catalog.require_unit(starting_unit)?;

        self.state = RunState {
            roster: vec![RosterEntry::new(starting_unit)],
            active: true,
            ..RunState::default()
        };
        info!(starting_unit, "Run started");
        self.emit(CoreEvent::RunStarted {
            starting_unit: starting_unit.to_string(),
        });
        self.flush();
        Ok(())
    }

    /// Add a unit if a slot is free
    pub fn recruit(&mut self, template_id: &str) -> Result<()> {
        self.require_active()?;
        self.catalog.require_unit(template_id)?;
        if self.state.roster.len() >= self.state.unlocked_slots {
            return Err(CoreError::PartyFull(self.state.unlocked_slots));
        }
        self.state.roster.push(RosterEntry::new(template_id));
        debug!(template_id, size = self.state.roster.len(), "Recruited");
        Ok(())
    }

    /// Remove a roster unit; the last one cannot leave
    pub fn dismiss(&mut self, index: usize) -> Result<RosterEntry> {
        self.require_active()?;
        if index >= self.state.roster.len() {
            return Err(CoreError::InvalidRosterIndex(index));
        }
        if self.state.roster.len() == 1 {
            return Err(CoreError::LastPartyMember);
        }
        Ok(self.state.roster.remove(index))
    }

    /// Build the battle for the current level
    pub fn next_encounter(&mut self) -> Result<BattleLoop> {
        self.require_active()?;
        let level = self.state.level;
        let spec = select_encounter(self.catalog.encounters(), level, &mut self.rng)
            .cloned()
            .ok_or(CoreError::NoEncounterForLevel(level))?;

        let mut ids = IdAllocator::new();
        let party = self.build_party(&mut ids)?;

        let multiplier = difficulty_multiplier(level, self.config.run.scaling_factor);
        let mut enemies = Vec::with_capacity(spec.enemies.len());
        for template_id in &spec.enemies {
            let mut enemy =
                self.catalog
                    .spawn_unit(template_id, ids.allocate(), Side::Enemy, &self.config)?;
            scale_enemy(&mut enemy, multiplier);
            enemies.push(enemy);
        }

        let crit_hooks = self
            .state
            .relics
            .iter()
            .filter_map(|id| self.catalog.relic(id))
            .filter_map(|relic| relic.crit_hook())
            .collect();

        info!(
            level,
            encounter = %spec.id,
            multiplier,
            party = party.len(),
            enemies = enemies.len(),
            "Encounter ready"
        );
        self.state.current_encounter = Some(spec.id.clone());

        let battle_rng = seeded(self.rng.gen());
        Ok(BattleLoop::new(party, enemies, Arc::clone(&self.config), battle_rng)
            .with_crit_hooks(crit_hooks))
    }

    fn build_party(&self, ids: &mut IdAllocator) -> Result<Vec<UnitInstance>> {
        let relic_modifiers: Vec<_> = self
            .state
            .relics
            .iter()
            .filter_map(|id| self.catalog.relic(id))
            .filter_map(|relic| relic.stat_modifier())
            .collect();

        self.state
            .roster
            .iter()
            .map(|entry| {
                let mut unit = self.catalog.spawn_unit(
                    &entry.template_id,
                    ids.allocate(),
                    Side::Party,
                    &self.config,
                )?;
                for delta in &entry.upgrades {
                    unit.stats.push(delta.to_modifier());
                }
                for modifier in &relic_modifiers {
                    unit.stats.push(*modifier);
                }
                unit.restore_full();
                Ok(unit)
            })
            .collect()
    }

    /// Record a battle result
    ///
    /// Victory advances the level and opens the reward and level-up tracks;
    /// clearing level 100 or losing ends the run.
    pub fn complete_encounter(&mut self, victory: bool) -> Result<()> {
        self.require_active()?;
        let cleared = self.state.level;
        let encounter = self.state.current_encounter.take();

        if !victory {
            self.end_run(false);
            return Ok(());
        }
        if cleared >= MAX_LEVEL {
            self.end_run(true);
            return Ok(());
        }

        self.state.level = cleared + 1;
        self.state.unlocked_slots = unlocked_slots(self.state.level);

        let base_gold = encounter
            .as_deref()
            .and_then(|id| self.catalog.encounter(id))
            .map(|spec| spec.gold)
            .unwrap_or(0);
        let relics: Vec<&RelicEffect> = self
            .state
            .relics
            .iter()
            .filter_map(|id| self.catalog.relic(id).map(|r| r.as_ref()))
            .collect();
        let gold = relic::apply_gold_bonus(base_gold, relics);
        let choices = generate_choices(cleared, &self.config.run, &mut self.rng);

        self.state.pending_gold = Some(self.state.pending_gold.unwrap_or(0) + gold);
        self.state.pending_level_ups.push(choices.clone());

        debug!(cleared, level = self.state.level, gold, "Encounter cleared");
        self.emit(CoreEvent::RewardsAvailable {
            level: cleared,
            gold,
        });
        self.emit(CoreEvent::LevelUpAvailable {
            level: cleared,
            choices,
        });
        self.flush();
        Ok(())
    }

    /// Forward a finished battle's events and record its outcome
    pub fn finish_battle(&mut self, battle: &mut BattleLoop) -> Result<()> {
        let events = battle.drain_events();
        self.bus.publish_all(events);
        match battle.outcome() {
            Some(victory) => self.complete_encounter(victory),
            None => Err(CoreError::BattleUnfinished),
        }
    }

    fn end_run(&mut self, victory: bool) {
        self.state.active = false;
        self.state.victory = Some(victory);
        self.state.pending_gold = None;
        self.state.pending_level_ups.clear();
        info!(victory, level = self.state.level, gold = self.state.gold, "Run ended");
        self.emit(CoreEvent::RunEnded {
            victory,
            level: self.state.level,
        });
        self.flush();
    }

    // === Rewards ===

    pub fn claim_rewards(&mut self) -> Result<u32> {
        self.require_active()?;
        let gold = self
            .state
            .pending_gold
            .take()
            .ok_or(CoreError::NoPendingRewards)?;
        self.state.gold += gold;
        Ok(gold)
    }

    pub fn claim_relic(&mut self, relic_id: &str) -> Result<()> {
        self.require_active()?;
        self.catalog.require_relic(relic_id)?;
        self.state.relics.push(relic_id.to_string());
        debug!(relic_id, "Relic claimed");
        Ok(())
    }

    /// Apply one choice of the oldest offer to every roster unit
    ///
    /// Offers queue up across victories; each call consumes one.
    pub fn apply_level_up(&mut self, choice: usize) -> Result<()> {
        self.require_active()?;
        let choices = self
            .state
            .pending_level_ups
            .first()
            .ok_or(CoreError::NoPendingLevelUp)?;
        let picked = choices
            .get(choice)
            .cloned()
            .ok_or(CoreError::InvalidChoice(choice))?;

        for entry in &mut self.state.roster {
            entry.upgrades.extend(picked.deltas.iter().copied());
        }
        self.state.pending_level_ups.remove(0);
        debug!(
            category = ?picked.category,
            remaining = self.state.pending_level_ups.len(),
            "Level-up applied"
        );
        Ok(())
    }

    // === Persistence ===

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            state: self.state.clone(),
            rng: RngState::capture(&self.rng),
        }
    }

    /// Replace the run with a snapshot after checking every id it names
    pub fn restore(&mut self, snapshot: RunSnapshot) -> Result<()> {
        let state = &snapshot.state;
        if !(1..=MAX_LEVEL).contains(&state.level) {
            return Err(CoreError::InvalidSnapshot(format!(
                "level {} out of range",
                state.level
            )));
        }
        let slots = unlocked_slots(state.level);
        if state.unlocked_slots != slots {
            return Err(CoreError::InvalidSnapshot(format!(
                "{} slots recorded, level {} unlocks {}",
                state.unlocked_slots, state.level, slots
            )));
        }
        if state.roster.len() > slots {
            return Err(CoreError::InvalidSnapshot(format!(
                "{} units for {} slots",
                state.roster.len(),
                slots
            )));
        }
        if state.active && state.roster.is_empty() {
            return Err(CoreError::InvalidSnapshot(
                "active run without a party".to_string(),
            ));
        }
        for entry in &state.roster {
            self.catalog.require_unit(&entry.template_id)?;
        }
        for relic_id in &state.relics {
            self.catalog.require_relic(relic_id)?;
        }
        if let Some(encounter) = &state.current_encounter {
            self.catalog.require_encounter(encounter)?;
        }

        self.state = snapshot.state;
        self.rng = snapshot.rng.restore();
        Ok(())
    }

    /// Drop all run state and observers; safe to call repeatedly
    pub fn reset(&mut self) {
        self.state = RunState::default();
        self.events.drain();
        self.bus.clear();
    }
}

impl std::fmt::Debug for RunProgression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunProgression")
            .field("state", &self.state)
            .field("bus", &self.bus)
            .finish()
    }
}
