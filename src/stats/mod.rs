//! Unit stat model and the damage pipeline

pub mod block;
pub mod damage;

pub use block::{BaseStats, ModifierOp, ModifierSource, StatBlock, StatKind, StatModifier};
pub use damage::{
    apply_heal, damage_dealt, resolve_damage, DamageBreakdown, DamageInput, DamageKind,
    MAX_DAMAGE_REDUCTION,
};
