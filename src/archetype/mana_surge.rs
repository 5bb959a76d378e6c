//! Mana Surge: the Mage resource
//!
//! Each spell raises spell power. Reaching max stacks rolls once for an
//! overload: a stun plus backlash damage, after which the surge restarts.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::ManaSurgeConfig;
use crate::core::types::Seconds;

/// What a spell cast did to the surge
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurgeOutcome {
    /// Cast while overloaded; nothing changed
    Suppressed,
    /// Stacks rose (or stayed at max) without overloading
    Charged { stacks: u32 },
    /// The overload trial succeeded
    Overloaded {
        stun: Seconds,
        /// Self-damage to apply to the caster
        backlash: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManaSurgeEngine {
    config: ManaSurgeConfig,
    stacks: u32,
    overloaded: bool,
    overload_remaining: Seconds,
}

impl ManaSurgeEngine {
    pub fn new(config: ManaSurgeConfig) -> Self {
        Self {
            config,
            stacks: 0,
            overloaded: false,
            overload_remaining: 0.0,
        }
    }

    pub fn stacks(&self) -> u32 {
        self.stacks
    }

    pub fn max_stacks(&self) -> u32 {
        self.config.max_stacks
    }

    pub fn is_overloaded(&self) -> bool {
        self.overloaded
    }

    pub fn spell_power_multiplier(&self) -> f32 {
        if self.overloaded {
            0.0
        } else {
            1.0 + self.stacks as f32 * self.config.spell_power_per_stack
        }
    }

    /// Register a cast. The overload trial runs only on the cast that
    /// brings stacks to max, so each surge cycle rolls exactly once.
    pub fn on_spell_cast(&mut self, rng: &mut impl Rng, max_health: f32) -> SurgeOutcome {
        if self.overloaded {
            return SurgeOutcome::Suppressed;
        }

        let before = self.stacks;
        self.stacks = (self.stacks + 1).min(self.config.max_stacks);

        if before < self.config.max_stacks && self.stacks == self.config.max_stacks {
            let roll: f32 = rng.gen();
            if roll < self.config.overload_chance {
                self.overloaded = true;
                self.overload_remaining = self.config.overload_stun_duration;
                self.stacks = 0;
                return SurgeOutcome::Overloaded {
                    stun: self.config.overload_stun_duration,
                    backlash: max_health * self.config.overload_backlash_damage,
                };
            }
        }

        SurgeOutcome::Charged {
            stacks: self.stacks,
        }
    }

    pub fn tick(&mut self, dt: Seconds) {
        if self.overloaded {
            self.overload_remaining -= dt;
            if self.overload_remaining <= 0.0 {
                self.overloaded = false;
                self.overload_remaining = 0.0;
            }
        }
    }

    pub fn reset(&mut self) {
        self.stacks = 0;
        self.overloaded = false;
        self.overload_remaining = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::seeded;
    use rand::RngCore;

    /// Counts raw draws so tests can see how many trials ran
    struct CountingRng {
        inner: crate::core::rng::SimRng,
        draws: usize,
    }

    impl RngCore for CountingRng {
        fn next_u32(&mut self) -> u32 {
            self.draws += 1;
            self.inner.next_u32()
        }

        fn next_u64(&mut self) -> u64 {
            self.draws += 1;
            self.inner.next_u64()
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            self.draws += 1;
            self.inner.fill_bytes(dest)
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.draws += 1;
            self.inner.try_fill_bytes(dest)
        }
    }

    fn counting() -> CountingRng {
        CountingRng {
            inner: seeded(1),
            draws: 0,
        }
    }

    fn engine_with_chance(chance: f32) -> ManaSurgeEngine {
        ManaSurgeEngine::new(ManaSurgeConfig {
            overload_chance: chance,
            ..ManaSurgeConfig::default()
        })
    }

    #[test]
    fn test_no_trial_below_max() {
        let mut surge = engine_with_chance(1.0);
        let mut rng = counting();
        for _ in 0..9 {
            surge.on_spell_cast(&mut rng, 100.0);
        }
        assert_eq!(surge.stacks(), 9);
        assert_eq!(rng.draws, 0);
    }

    #[test]
    fn test_reaching_max_rolls_exactly_once() {
        let mut surge = engine_with_chance(0.0);
        let mut rng = counting();
        for _ in 0..9 {
            surge.on_spell_cast(&mut rng, 100.0);
        }

        let outcome = surge.on_spell_cast(&mut rng, 100.0);
        assert_eq!(outcome, SurgeOutcome::Charged { stacks: 10 });
        assert_eq!(rng.draws, 1);

        // Staying at max does not roll again in the same cycle
        surge.on_spell_cast(&mut rng, 100.0);
        assert_eq!(rng.draws, 1);
        assert_eq!(surge.stacks(), 10);
    }

    #[test]
    fn test_overload_stuns_and_backlashes() {
        let mut surge = engine_with_chance(1.0);
        let mut rng = seeded(3);
        for _ in 0..9 {
            surge.on_spell_cast(&mut rng, 200.0);
        }

        let outcome = surge.on_spell_cast(&mut rng, 200.0);
        assert_eq!(
            outcome,
            SurgeOutcome::Overloaded {
                stun: 2.0,
                backlash: 20.0
            }
        );
        assert!(surge.is_overloaded());
        assert_eq!(surge.stacks(), 0);
        assert_eq!(surge.spell_power_multiplier(), 0.0);

        assert_eq!(surge.on_spell_cast(&mut rng, 200.0), SurgeOutcome::Suppressed);

        surge.tick(2.0);
        assert!(!surge.is_overloaded());
        assert_eq!(surge.spell_power_multiplier(), 1.0);
    }

    #[test]
    fn test_spell_power_scales_with_stacks() {
        let mut surge = engine_with_chance(0.0);
        let mut rng = seeded(4);
        for _ in 0..4 {
            surge.on_spell_cast(&mut rng, 100.0);
        }
        assert!((surge.spell_power_multiplier() - 1.4).abs() < 1e-6);
    }

    #[test]
    fn test_reset_clears_overload() {
        let mut surge = engine_with_chance(1.0);
        let mut rng = seeded(5);
        for _ in 0..10 {
            surge.on_spell_cast(&mut rng, 100.0);
        }
        assert!(surge.is_overloaded());

        surge.reset();
        assert!(!surge.is_overloaded());
        assert_eq!(surge.stacks(), 0);
    }
}
