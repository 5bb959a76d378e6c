//! Opportunity / Kill-Chain: the Assassin resource
//!
//! Bonus damage against wounded targets, and a cooldown reduction that
//! grows with kills landed inside a rolling window.

use serde::{Deserialize, Serialize};

use crate::core::config::OpportunityConfig;
use crate::core::types::Seconds;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityEngine {
    config: OpportunityConfig,
    chain_count: u32,
    /// Time since the last kill; `None` before the first kill of a chain
    since_last_kill: Option<Seconds>,
}

impl OpportunityEngine {
    pub fn new(config: OpportunityConfig) -> Self {
        Self {
            config,
            chain_count: 0,
            since_last_kill: None,
        }
    }

    pub fn chain_count(&self) -> u32 {
        self.chain_count
    }

    /// Multiplier against a target at `health_fraction` of its max
    pub fn damage_multiplier(&self, health_fraction: f32) -> f32 {
        if health_fraction <= self.config.low_health_threshold {
            1.0 + self.config.opportunity_damage_bonus
        } else {
            1.0
        }
    }

    pub fn on_kill(&mut self) {
        match self.since_last_kill {
            Some(elapsed) if elapsed <= self.config.kill_chain_window => self.chain_count += 1,
            _ => self.chain_count = 1,
        }
        self.since_last_kill = Some(0.0);
    }

    /// Unclamped; can exceed 1.0 on long chains
    pub fn cooldown_reduction(&self) -> f32 {
        self.config.cooldown_reduction_per_kill * self.chain_count as f32
    }

    pub fn tick(&mut self, dt: Seconds) {
        if let Some(elapsed) = self.since_last_kill.as_mut() {
            *elapsed += dt;
            if *elapsed > self.config.kill_chain_window {
                self.chain_count = 0;
                self.since_last_kill = None;
            }
        }
    }

    pub fn reset(&mut self) {
        self.chain_count = 0;
        self.since_last_kill = None;
    }
}
