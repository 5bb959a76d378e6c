//! Ashen Court - deterministic combat core for a roguelike auto-battler

pub mod ability;
pub mod archetype;
pub mod battle;
pub mod catalog;
pub mod core;
pub mod encounter;
pub mod events;
pub mod run;
pub mod sim;
pub mod stats;
pub mod synergy;
pub mod unit;
