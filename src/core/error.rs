use thiserror::Error;

use crate::archetype::InsufficientGuard;
use crate::core::types::{Seconds, UnitId};

/// Kind of catalog entry a lookup was aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Unit,
    Ability,
    Encounter,
    Relic,
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CatalogKind::Unit => "unit",
            CatalogKind::Ability => "ability",
            CatalogKind::Encounter => "encounter",
            CatalogKind::Relic => "relic",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Missing {kind} in catalog: {id}")]
    ConfigurationMissing { kind: CatalogKind, id: String },

    #[error("No encounter configured for level {0}")]
    NoEncounterForLevel(u32),

    #[error("No active run")]
    RunNotActive,

    #[error("Party is full ({0} slots unlocked)")]
    PartyFull(usize),

    #[error("Invalid roster index: {0}")]
    InvalidRosterIndex(usize),

    #[error("Cannot dismiss the last party member")]
    LastPartyMember,

    #[error("Invalid level-up choice: {0}")]
    InvalidChoice(usize),

    #[error("Battle has no outcome yet")]
    BattleUnfinished,

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("No rewards pending")]
    NoPendingRewards,

    #[error("No level-up pending")]
    NoPendingLevelUp,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl CoreError {
    pub fn missing(kind: CatalogKind, id: impl Into<String>) -> Self {
        CoreError::ConfigurationMissing {
            kind,
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Why a single battle action was rejected
///
/// Rejections never mutate state, so the battle continues after any of them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("Invalid target: {0:?}")]
    InvalidTarget(Option<UnitId>),

    #[error("Unit {0} cannot act")]
    InvalidActor(UnitId),

    #[error("Unit {0} is stunned")]
    Stunned(UnitId),

    #[error("Not the party's turn")]
    NotPartyTurn,

    #[error("Attack not ready ({remaining:.2}s left)")]
    AttackNotReady { remaining: Seconds },

    #[error("Unknown ability: {0}")]
    UnknownAbility(String),

    #[error("Ability {ability} on cooldown ({remaining:.2}s left)")]
    OnCooldown { ability: String, remaining: Seconds },

    #[error("Insufficient mana: have {have}, need {need}")]
    InsufficientMana { have: f32, need: f32 },

    #[error("Insufficient guard: have {have}, need {need}")]
    InsufficientGuard { have: u32, need: u32 },
}

impl ActionError {
    /// Mana, cooldown or guard shortfall
    pub fn is_insufficient_resource(&self) -> bool {
        matches!(
            self,
            ActionError::OnCooldown { .. }
                | ActionError::InsufficientMana { .. }
                | ActionError::InsufficientGuard { .. }
        )
    }
}

impl From<InsufficientGuard> for ActionError {
    fn from(err: InsufficientGuard) -> Self {
        ActionError::InsufficientGuard {
            have: err.have,
            need: err.need,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_message_names_kind_and_id() {
        let err = CoreError::missing(CatalogKind::Unit, "vanguard");
        assert_eq!(err.to_string(), "Missing unit in catalog: vanguard");
    }

    #[test]
    fn test_resource_shortfalls_are_classified() {
        assert!(ActionError::InsufficientMana { have: 1.0, need: 5.0 }.is_insufficient_resource());
        assert!(ActionError::from(InsufficientGuard { have: 0, need: 30 }).is_insufficient_resource());
        assert!(!ActionError::InvalidTarget(None).is_insufficient_resource());
    }
}
