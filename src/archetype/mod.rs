//! Archetype resource engines
//!
//! Every unit carries exactly one engine, picked once from its template's
//! archetype. The enum dispatches combat notifications to the variant that
//! cares about them; the others ignore them.

pub mod guard;
pub mod mana_surge;
pub mod momentum;
pub mod opportunity;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::EngineConfig;
use crate::core::types::{Seconds, UnitId};

pub use guard::{GuardAction, GuardEngine, InsufficientGuard};
pub use mana_surge::{ManaSurgeEngine, SurgeOutcome};
pub use momentum::MomentumEngine;
pub use opportunity::OpportunityEngine;

/// Combat role of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    Tank,
    Fighter,
    Mage,
    Assassin,
}

/// Which resource an engine tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineKind {
    Guard,
    Momentum,
    ManaSurge,
    Opportunity,
}

impl Archetype {
    pub fn engine_kind(&self) -> EngineKind {
        match self {
            Archetype::Tank => EngineKind::Guard,
            Archetype::Fighter => EngineKind::Momentum,
            Archetype::Mage => EngineKind::ManaSurge,
            Archetype::Assassin => EngineKind::Opportunity,
        }
    }
}

/// Per-unit resource state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResourceEngine {
    Guard(GuardEngine),
    Momentum(MomentumEngine),
    ManaSurge(ManaSurgeEngine),
    Opportunity(OpportunityEngine),
}

impl ResourceEngine {
    pub fn for_archetype(archetype: Archetype, config: &EngineConfig) -> Self {
        match archetype {
            Archetype::Tank => ResourceEngine::Guard(GuardEngine::new(config.guard)),
            Archetype::Fighter => ResourceEngine::Momentum(MomentumEngine::new(config.momentum)),
            Archetype::Mage => ResourceEngine::ManaSurge(ManaSurgeEngine::new(config.mana_surge)),
            Archetype::Assassin => {
                ResourceEngine::Opportunity(OpportunityEngine::new(config.opportunity))
            }
        }
    }

    pub fn kind(&self) -> EngineKind {
        match self {
            ResourceEngine::Guard(_) => EngineKind::Guard,
            ResourceEngine::Momentum(_) => EngineKind::Momentum,
            ResourceEngine::ManaSurge(_) => EngineKind::ManaSurge,
            ResourceEngine::Opportunity(_) => EngineKind::Opportunity,
        }
    }

    /// Current stack count (kill-chain length for Opportunity)
    pub fn stacks(&self) -> u32 {
        match self {
            ResourceEngine::Guard(e) => e.stacks(),
            ResourceEngine::Momentum(e) => e.stacks(),
            ResourceEngine::ManaSurge(e) => e.stacks(),
            ResourceEngine::Opportunity(e) => e.chain_count(),
        }
    }

    /// Declared ceiling; the kill chain has none
    pub fn max_stacks(&self) -> Option<u32> {
        match self {
            ResourceEngine::Guard(e) => Some(e.max_stacks()),
            ResourceEngine::Momentum(e) => Some(e.max_stacks()),
            ResourceEngine::ManaSurge(e) => Some(e.max_stacks()),
            ResourceEngine::Opportunity(_) => None,
        }
    }

    pub fn as_guard(&self) -> Option<&GuardEngine> {
        match self {
            ResourceEngine::Guard(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_guard_mut(&mut self) -> Option<&mut GuardEngine> {
        match self {
            ResourceEngine::Guard(e) => Some(e),
            _ => None,
        }
    }

    // === Notifications ===

    pub fn on_combat_start(&mut self) {
        match self {
            ResourceEngine::Guard(e) => e.on_combat_start(),
            _ => self.reset(),
        }
    }

    pub fn on_combat_end(&mut self) {
        self.reset();
    }

    pub fn on_damage_taken(&mut self, amount: f32) {
        if let ResourceEngine::Guard(e) = self {
            e.on_damage_taken(amount);
        }
    }

    /// Called before a basic attack resolves against `target`
    pub fn on_attack_target(&mut self, target: UnitId) {
        if let ResourceEngine::Momentum(e) = self {
            e.on_target(target);
        }
    }

    pub fn on_successful_hit(&mut self) {
        if let ResourceEngine::Momentum(e) = self {
            e.on_successful_hit();
        }
    }

    pub fn on_miss(&mut self) {
        if let ResourceEngine::Momentum(e) = self {
            e.on_miss();
        }
    }

    pub fn on_kill(&mut self) {
        if let ResourceEngine::Opportunity(e) = self {
            e.on_kill();
        }
    }

    /// Returns `None` for non-mages
    pub fn on_spell_cast(&mut self, rng: &mut impl Rng, max_health: f32) -> Option<SurgeOutcome> {
        match self {
            ResourceEngine::ManaSurge(e) => Some(e.on_spell_cast(rng, max_health)),
            _ => None,
        }
    }

    pub fn tick(&mut self, dt: Seconds) {
        match self {
            ResourceEngine::Guard(e) => e.tick(dt),
            ResourceEngine::Momentum(_) => {}
            ResourceEngine::ManaSurge(e) => e.tick(dt),
            ResourceEngine::Opportunity(e) => e.tick(dt),
        }
    }

    /// Immediate teardown of all transient state
    pub fn reset(&mut self) {
        match self {
            ResourceEngine::Guard(e) => e.reset(),
            ResourceEngine::Momentum(e) => e.reset(),
            ResourceEngine::ManaSurge(e) => e.reset(),
            ResourceEngine::Opportunity(e) => e.reset(),
        }
    }

    // === Multipliers ===

    /// Archetype step-1 multiplier against a target at `target_health_fraction`
    pub fn outgoing_damage_multiplier(&self, target_health_fraction: f32) -> f32 {
        match self {
            ResourceEngine::Momentum(e) => e.damage_multiplier(),
            ResourceEngine::Opportunity(e) => e.damage_multiplier(target_health_fraction),
            ResourceEngine::Guard(_) | ResourceEngine::ManaSurge(_) => 1.0,
        }
    }

    pub fn attack_speed_multiplier(&self) -> f32 {
        match self {
            ResourceEngine::Momentum(e) => e.attack_speed_multiplier(),
            _ => 1.0,
        }
    }

    pub fn spell_power_multiplier(&self) -> f32 {
        match self {
            ResourceEngine::ManaSurge(e) => e.spell_power_multiplier(),
            _ => 1.0,
        }
    }

    /// Incoming damage reduction (Guard only)
    pub fn damage_reduction(&self) -> f32 {
        match self {
            ResourceEngine::Guard(e) => e.damage_reduction(),
            _ => 0.0,
        }
    }

    pub fn cooldown_reduction(&self) -> f32 {
        match self {
            ResourceEngine::Opportunity(e) => e.cooldown_reduction(),
            _ => 0.0,
        }
    }

    pub fn is_stunned(&self) -> bool {
        matches!(self, ResourceEngine::ManaSurge(e) if e.is_overloaded())
    }

    pub fn is_taunting(&self) -> bool {
        matches!(self, ResourceEngine::Guard(e) if e.is_taunting())
    }
}
