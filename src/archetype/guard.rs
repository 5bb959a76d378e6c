//! Guard: the Tank resource
//!
//! Stacks build from hits taken and are spent on a taunt or on a timed
//! damage-reduction barrier. Passive reduction scales with stacks held.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::GuardConfig;
use crate::core::types::Seconds;
use crate::stats::MAX_DAMAGE_REDUCTION;

/// Ways to spend Guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuardAction {
    Taunt,
    DamageReduction,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("guard stacks {have} below cost {need}")]
pub struct InsufficientGuard {
    pub have: u32,
    pub need: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardEngine {
    config: GuardConfig,
    stacks: u32,
    /// Time left on the barrier; zero when inactive
    barrier_remaining: Seconds,
    /// Time left on the taunt; zero when inactive
    taunt_remaining: Seconds,
}

impl GuardEngine {
    pub fn new(config: GuardConfig) -> Self {
        Self {
            config,
            stacks: 0,
            barrier_remaining: 0.0,
            taunt_remaining: 0.0,
        }
    }

    pub fn stacks(&self) -> u32 {
        self.stacks
    }

    pub fn max_stacks(&self) -> u32 {
        self.config.max_stacks
    }

    pub fn is_reduction_active(&self) -> bool {
        self.barrier_remaining > 0.0
    }

    pub fn is_taunting(&self) -> bool {
        self.taunt_remaining > 0.0
    }

    pub fn cost(&self, action: GuardAction) -> u32 {
        match action {
            GuardAction::Taunt => self.config.taunt_cost,
            GuardAction::DamageReduction => self.config.damage_reduction_cost,
        }
    }

    /// Check affordability without spending
    pub fn can_afford(&self, action: GuardAction) -> Result<(), InsufficientGuard> {
        let need = self.cost(action);
        if self.stacks < need {
            return Err(InsufficientGuard {
                have: self.stacks,
                need,
            });
        }
        Ok(())
    }

    pub fn on_damage_taken(&mut self, _amount: f32) {
        self.stacks = (self.stacks + self.config.guard_per_hit).min(self.config.max_stacks);
    }

    /// Spend stacks on a taunt; returns the taunt duration
    pub fn use_taunt(&mut self) -> Result<Seconds, InsufficientGuard> {
        self.can_afford(GuardAction::Taunt)?;
        self.stacks -= self.config.taunt_cost;
        self.taunt_remaining = self.config.taunt_duration;
        Ok(self.config.taunt_duration)
    }

    /// Spend stacks on the barrier; returns its duration
    pub fn activate_damage_reduction(&mut self) -> Result<Seconds, InsufficientGuard> {
        self.can_afford(GuardAction::DamageReduction)?;
        self.stacks -= self.config.damage_reduction_cost;
        self.barrier_remaining = self.config.damage_reduction_duration;
        Ok(self.config.damage_reduction_duration)
    }

    pub fn perform(&mut self, action: GuardAction) -> Result<Seconds, InsufficientGuard> {
        match action {
            GuardAction::Taunt => self.use_taunt(),
            GuardAction::DamageReduction => self.activate_damage_reduction(),
        }
    }

    /// Fraction of incoming damage removed, capped at 0.95
    pub fn damage_reduction(&self) -> f32 {
        let passive =
            self.stacks as f32 / self.config.max_stacks as f32 * self.config.per_stack_reduction;
        let barrier = if self.is_reduction_active() {
            self.config.max_reduction_bonus
        } else {
            0.0
        };
        (passive + barrier).min(MAX_DAMAGE_REDUCTION)
    }

    pub fn tick(&mut self, dt: Seconds) {
        self.barrier_remaining = (self.barrier_remaining - dt).max(0.0);
        self.taunt_remaining = (self.taunt_remaining - dt).max(0.0);
    }

    /// Stacks do not carry into a new encounter
    pub fn on_combat_start(&mut self) {
        self.reset();
    }

    pub fn reset(&mut self) {
        self.stacks = 0;
        self.barrier_remaining = 0.0;
        self.taunt_remaining = 0.0;
    }
}
