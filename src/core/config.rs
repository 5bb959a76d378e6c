//! Engine configuration with documented tunables
//!
//! Every balance number the combat core reads lives here. Values can be
//! overridden from a TOML document; missing keys keep their defaults.

use serde::{Deserialize, Serialize};

use crate::core::error::{CoreError, Result};
use crate::core::types::Seconds;

/// Guard (Tank) resource tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Stack ceiling
    pub max_stacks: u32,

    /// Stacks gained each time the tank is hit
    pub guard_per_hit: u32,

    /// Stacks spent by a taunt
    pub taunt_cost: u32,

    /// How long enemies are forced onto the taunter
    pub taunt_duration: Seconds,

    /// Stacks spent to raise the damage-reduction barrier
    pub damage_reduction_cost: u32,

    /// How long the barrier bonus is active
    pub damage_reduction_duration: Seconds,

    /// Reduction contributed at full stacks
    ///
    /// The passive reduction is `(stacks / max_stacks) * per_stack_reduction`,
    /// so at 100 max stacks and 0.1 here, 5 stacks give 0.005.
    pub per_stack_reduction: f32,

    /// Flat reduction added while the barrier is active
    pub max_reduction_bonus: f32,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_stacks: 100,
            guard_per_hit: 5,
            taunt_cost: 30,
            taunt_duration: 3.0,
            damage_reduction_cost: 50,
            damage_reduction_duration: 4.0,
            per_stack_reduction: 0.3,
            max_reduction_bonus: 0.3,
        }
    }
}

/// Momentum (Fighter) resource tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    pub max_stacks: u32,
    pub momentum_per_hit: u32,
    /// Attack speed gained per stack (0.05 = +5%)
    pub attack_speed_per_stack: f32,
    /// Damage gained per stack (0.03 = +3%)
    pub damage_per_stack: f32,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            max_stacks: 10,
            momentum_per_hit: 1,
            attack_speed_per_stack: 0.05,
            damage_per_stack: 0.03,
        }
    }
}

/// Mana Surge (Mage) resource tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManaSurgeConfig {
    pub max_stacks: u32,

    /// Probability of overloading when the surge reaches max stacks
    pub overload_chance: f32,

    /// Stun length after an overload
    pub overload_stun_duration: Seconds,

    /// Self-damage on overload as a fraction of max health
    pub overload_backlash_damage: f32,

    /// Spell power gained per stack (0.1 = +10%)
    pub spell_power_per_stack: f32,
}

impl Default for ManaSurgeConfig {
    fn default() -> Self {
        Self {
            max_stacks: 10,
            overload_chance: 0.25,
            overload_stun_duration: 2.0,
            overload_backlash_damage: 0.1,
            spell_power_per_stack: 0.1,
        }
    }
}

/// Opportunity / Kill-Chain (Assassin) tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpportunityConfig {
    /// Target health fraction at or below which the bonus applies
    pub low_health_threshold: f32,

    /// Extra damage fraction against low-health targets
    pub opportunity_damage_bonus: f32,

    /// Max time between kills for the chain to continue
    pub kill_chain_window: Seconds,

    /// Cooldown reduction per chained kill. Never clamped.
    pub cooldown_reduction_per_kill: f32,
}

impl Default for OpportunityConfig {
    fn default() -> Self {
        Self {
            low_health_threshold: 0.3,
            opportunity_damage_bonus: 0.5,
            kill_chain_window: 3.0,
            cooldown_reduction_per_kill: 0.1,
        }
    }
}

/// Battle loop pacing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// How long a party turn waits for input before ending itself
    pub party_turn_timeout: Seconds,

    /// Cosmetic delay between enemy actions. Zero resolves the whole
    /// enemy turn in one step (headless simulation).
    pub enemy_pacing_delay: Seconds,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            party_turn_timeout: 30.0,
            enemy_pacing_delay: 0.5,
        }
    }
}

impl BattleConfig {
    /// Pacing with no cosmetic delays
    pub fn headless() -> Self {
        Self {
            enemy_pacing_delay: 0.0,
            ..Self::default()
        }
    }
}

/// Run progression tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Enemy stat growth per level (`factor^(level - 1)`)
    pub scaling_factor: f32,

    /// Probability of an extra Chaos level-up choice
    pub chaos_chance: f32,

    /// Level-up magnitude growth per level past the first
    pub level_magnitude_growth: f32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            scaling_factor: 1.15,
            chaos_chance: 0.1,
            level_magnitude_growth: 0.05,
        }
    }
}

/// All tunables for the combat core
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub guard: GuardConfig,
    pub momentum: MomentumConfig,
    pub mana_surge: ManaSurgeConfig,
    pub opportunity: OpportunityConfig,
    pub battle: BattleConfig,
    pub run: RunConfig,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse overrides from TOML and validate the result
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(CoreError::InvalidConfig(msg));

        if self.guard.max_stacks == 0
            || self.momentum.max_stacks == 0
            || self.mana_surge.max_stacks == 0
        {
            return invalid("resource max_stacks must be positive".into());
        }

        if self.guard.taunt_cost > self.guard.max_stacks
            || self.guard.damage_reduction_cost > self.guard.max_stacks
        {
            return invalid(format!(
                "guard costs (taunt {}, reduction {}) must not exceed max_stacks ({})",
                self.guard.taunt_cost, self.guard.damage_reduction_cost, self.guard.max_stacks
            ));
        }

        if !(0.0..=1.0).contains(&self.mana_surge.overload_chance) {
            return invalid(format!(
                "overload_chance ({}) must be within [0, 1]",
                self.mana_surge.overload_chance
            ));
        }

        if !(0.0..=1.0).contains(&self.run.chaos_chance) {
            return invalid(format!(
                "chaos_chance ({}) must be within [0, 1]",
                self.run.chaos_chance
            ));
        }

        if self.run.scaling_factor <= 0.0 {
            return invalid("scaling_factor must be positive".into());
        }

        if self.battle.party_turn_timeout <= 0.0 || self.battle.enemy_pacing_delay < 0.0 {
            return invalid("battle timings must be non-negative with a positive timeout".into());
        }

        Ok(())
    }
}
