//! Momentum: the Fighter resource
//!
//! Consecutive hits on the same target build stacks. A miss or switching
//! targets drops everything.

use serde::{Deserialize, Serialize};

use crate::core::config::MomentumConfig;
use crate::core::types::UnitId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumEngine {
    config: MomentumConfig,
    stacks: u32,
    last_target: Option<UnitId>,
}

impl MomentumEngine {
    pub fn new(config: MomentumConfig) -> Self {
        Self {
            config,
            stacks: 0,
            last_target: None,
        }
    }

    pub fn stacks(&self) -> u32 {
        self.stacks
    }

    pub fn max_stacks(&self) -> u32 {
        self.config.max_stacks
    }

    pub fn on_successful_hit(&mut self) {
        self.stacks = (self.stacks + self.config.momentum_per_hit).min(self.config.max_stacks);
    }

    pub fn on_miss(&mut self) {
        self.stacks = 0;
    }

    /// Record the target of the next swing; a new target resets stacks
    pub fn on_target(&mut self, target: UnitId) {
        if self.last_target.is_some_and(|last| last != target) {
            self.stacks = 0;
        }
        self.last_target = Some(target);
    }

    pub fn attack_speed_multiplier(&self) -> f32 {
        1.0 + self.stacks as f32 * self.config.attack_speed_per_stack
    }

    pub fn damage_multiplier(&self) -> f32 {
        1.0 + self.stacks as f32 * self.config.damage_per_stack
    }

    pub fn reset(&mut self) {
        self.stacks = 0;
        self.last_target = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> MomentumEngine {
        MomentumEngine::new(MomentumConfig::default())
    }

    #[test]
    fn test_three_hits() {
        let mut momentum = engine();
        for _ in 0..3 {
            momentum.on_successful_hit();
        }
        assert_eq!(momentum.stacks(), 3);
        assert!((momentum.attack_speed_multiplier() - 1.15).abs() < 1e-6);
        assert!((momentum.damage_multiplier() - 1.09).abs() < 1e-6);
    }

    #[test]
    fn test_clamped_at_max() {
        let mut momentum = engine();
        for _ in 0..25 {
            momentum.on_successful_hit();
        }
        assert_eq!(momentum.stacks(), 10);
    }

    #[test]
    fn test_miss_resets() {
        let mut momentum = engine();
        momentum.on_successful_hit();
        momentum.on_successful_hit();
        momentum.on_miss();
        assert_eq!(momentum.stacks(), 0);
        assert_eq!(momentum.damage_multiplier(), 1.0);
    }

    #[test]
    fn test_target_change_resets_but_same_target_keeps() {
        let mut momentum = engine();
        momentum.on_target(UnitId(1));
        momentum.on_successful_hit();
        momentum.on_target(UnitId(1));
        momentum.on_successful_hit();
        assert_eq!(momentum.stacks(), 2);

        momentum.on_target(UnitId(2));
        assert_eq!(momentum.stacks(), 0);
    }
}
