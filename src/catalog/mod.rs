//! Read-only content registry
//!
//! Templates are stored behind `Arc` so battles, runs and rayon workers can
//! share them without copying. A catalog is built once, either from TOML or
//! from the built-in content, and never mutated afterwards.

mod builtin;

use std::path::Path;
use std::sync::{Arc, OnceLock};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ability::{Ability, AbilityTemplate};
use crate::core::config::EngineConfig;
use crate::core::error::{CatalogKind, CoreError, Result};
use crate::core::types::{Side, UnitId};
use crate::encounter::{EncounterSpec, MAX_LEVEL};
use crate::run::RelicEffect;
use crate::unit::{UnitInstance, UnitTemplate};

/// Any catalog entry, as returned by `DataCatalog::lookup`
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEntry {
    Unit(Arc<UnitTemplate>),
    Ability(Arc<AbilityTemplate>),
    Encounter(Arc<EncounterSpec>),
    Relic(Arc<RelicEffect>),
}

/// On-disk layout of a catalog file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFile {
    pub units: Vec<UnitTemplate>,
    pub abilities: Vec<AbilityTemplate>,
    pub encounters: Vec<EncounterSpec>,
    pub relics: Vec<RelicEffect>,
}

#[derive(Debug, Clone, Default)]
pub struct DataCatalog {
    units: AHashMap<String, Arc<UnitTemplate>>,
    abilities: AHashMap<String, Arc<AbilityTemplate>>,
    encounters: AHashMap<String, Arc<EncounterSpec>>,
    relics: AHashMap<String, Arc<RelicEffect>>,
}

static BUILTIN: OnceLock<Arc<DataCatalog>> = OnceLock::new();

impl DataCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared built-in content, created on first use
    pub fn builtin() -> Arc<DataCatalog> {
        Arc::clone(BUILTIN.get_or_init(|| Arc::new(builtin::content().into())))
    }

    /// Parse a TOML catalog and validate its references
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        let catalog = DataCatalog::from(file);
        catalog.validate()?;

        let gaps = catalog.uncovered_levels();
        if !gaps.is_empty() {
            warn!(levels = ?gaps, "Catalog leaves levels without an encounter");
        }
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    // === Registration ===

    pub fn insert_unit(&mut self, template: UnitTemplate) {
        self.units.insert(template.id.clone(), Arc::new(template));
    }

    pub fn insert_ability(&mut self, template: AbilityTemplate) {
        self.abilities.insert(template.id.clone(), Arc::new(template));
    }

    pub fn insert_encounter(&mut self, spec: EncounterSpec) {
        self.encounters.insert(spec.id.clone(), Arc::new(spec));
    }

    pub fn insert_relic(&mut self, relic: RelicEffect) {
        self.relics.insert(relic.id.clone(), Arc::new(relic));
    }

    // === Lookups ===

    /// Find an id in any table (units, then abilities, encounters, relics)
    pub fn lookup(&self, id: &str) -> Option<CatalogEntry> {
        if let Some(unit) = self.units.get(id) {
            return Some(CatalogEntry::Unit(Arc::clone(unit)));
        }
        if let Some(ability) = self.abilities.get(id) {
            return Some(CatalogEntry::Ability(Arc::clone(ability)));
        }
        if let Some(encounter) = self.encounters.get(id) {
            return Some(CatalogEntry::Encounter(Arc::clone(encounter)));
        }
        self.relics
            .get(id)
            .map(|relic| CatalogEntry::Relic(Arc::clone(relic)))
    }

    pub fn unit(&self, id: &str) -> Option<&Arc<UnitTemplate>> {
        self.units.get(id)
    }

    pub fn ability(&self, id: &str) -> Option<&Arc<AbilityTemplate>> {
        self.abilities.get(id)
    }

    pub fn encounter(&self, id: &str) -> Option<&Arc<EncounterSpec>> {
        self.encounters.get(id)
    }

    pub fn relic(&self, id: &str) -> Option<&Arc<RelicEffect>> {
        self.relics.get(id)
    }

    pub fn require_unit(&self, id: &str) -> Result<Arc<UnitTemplate>> {
        self.unit(id)
            .cloned()
            .ok_or_else(|| CoreError::missing(CatalogKind::Unit, id))
    }

    pub fn require_ability(&self, id: &str) -> Result<Arc<AbilityTemplate>> {
        self.ability(id)
            .cloned()
            .ok_or_else(|| CoreError::missing(CatalogKind::Ability, id))
    }

    pub fn require_encounter(&self, id: &str) -> Result<Arc<EncounterSpec>> {
        self.encounter(id)
            .cloned()
            .ok_or_else(|| CoreError::missing(CatalogKind::Encounter, id))
    }

    pub fn require_relic(&self, id: &str) -> Result<Arc<RelicEffect>> {
        self.relic(id)
            .cloned()
            .ok_or_else(|| CoreError::missing(CatalogKind::Relic, id))
    }

    pub fn encounters(&self) -> impl Iterator<Item = &EncounterSpec> {
        self.encounters.values().map(|e| e.as_ref())
    }

    /// Ids of units a player may recruit, sorted
    pub fn playable_units(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .units
            .values()
            .filter(|u| u.playable)
            .map(|u| u.id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Instantiate a unit with its abilities resolved
    pub fn spawn_unit(
        &self,
        template_id: &str,
        id: UnitId,
        side: Side,
        config: &EngineConfig,
    ) -> Result<UnitInstance> {
        let template = self.require_unit(template_id)?;
        let abilities = template
            .abilities
            .iter()
            .map(|ability_id| self.require_ability(ability_id).map(Ability::new))
            .collect::<Result<Vec<_>>>()?;
        Ok(UnitInstance::new(id, side, template, abilities, config))
    }

    // === Validation ===

    /// Check that every reference resolves and every range is sane
    pub fn validate(&self) -> Result<()> {
        for unit in self.units.values() {
            for ability_id in &unit.abilities {
                if !self.abilities.contains_key(ability_id) {
                    return Err(CoreError::missing(CatalogKind::Ability, ability_id.clone()));
                }
            }
        }

        for encounter in self.encounters.values() {
            if encounter.level_min == 0
                || encounter.level_min > encounter.level_max
                || encounter.level_max > MAX_LEVEL
            {
                return Err(CoreError::InvalidConfig(format!(
                    "encounter {} has invalid level range {}..={}",
                    encounter.id, encounter.level_min, encounter.level_max
                )));
            }
            if encounter.enemies.is_empty() {
                return Err(CoreError::InvalidConfig(format!(
                    "encounter {} has no enemies",
                    encounter.id
                )));
            }
            for enemy in &encounter.enemies {
                if !self.units.contains_key(enemy) {
                    return Err(CoreError::missing(CatalogKind::Unit, enemy.clone()));
                }
            }
        }

        Ok(())
    }

    /// Levels for which no encounter of the right tier exists
    pub fn uncovered_levels(&self) -> Vec<u32> {
        (1..=MAX_LEVEL)
            .filter(|&level| {
                let tier = crate::encounter::tier_for_level(level);
                !self
                    .encounters
                    .values()
                    .any(|e| e.covers(level) && e.tier() == tier)
            })
            .collect()
    }
}

impl From<CatalogFile> for DataCatalog {
    fn from(file: CatalogFile) -> Self {
        let mut catalog = DataCatalog::new();
        for unit in file.units {
            catalog.insert_unit(unit);
        }
        for ability in file.abilities {
            catalog.insert_ability(ability);
        }
        for encounter in file.encounters {
            catalog.insert_encounter(encounter);
        }
        for relic in file.relics {
            catalog.insert_relic(relic);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatKind;

    #[test]
    fn test_builtin_is_valid_and_complete() {
        let catalog = DataCatalog::builtin();
        catalog.validate().unwrap();
        assert!(catalog.uncovered_levels().is_empty());
        assert!(catalog.playable_units().contains(&"vanguard"));
    }

    #[test]
    fn test_builtin_is_shared() {
        let a = DataCatalog::builtin();
        let b = DataCatalog::builtin();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_lookup_misses_return_none() {
        let catalog = DataCatalog::builtin();
        assert!(catalog.lookup("no_such_thing").is_none());
        assert!(matches!(catalog.lookup("ghoul"), Some(CatalogEntry::Unit(_))));
        assert!(matches!(catalog.lookup("fireball"), Some(CatalogEntry::Ability(_))));
        assert!(matches!(catalog.lookup("gilded_idol"), Some(CatalogEntry::Relic(_))));

        let err = catalog.require_unit("no_such_thing").unwrap_err();
        assert!(matches!(
            err,
            CoreError::ConfigurationMissing {
                kind: CatalogKind::Unit,
                ..
            }
        ));
    }

    #[test]
    fn test_spawn_resolves_abilities() {
        let catalog = DataCatalog::builtin();
        let unit = catalog
            .spawn_unit("pyromancer", UnitId(3), Side::Party, &EngineConfig::default())
            .unwrap();
        assert_eq!(unit.abilities.len(), unit.template().abilities.len());
        assert_eq!(unit.health(), unit.stats.effective(StatKind::MaxHealth));
    }

    #[test]
    fn test_toml_catalog_with_dangling_ability_rejected() {
        let result = DataCatalog::from_toml_str(
            r#"
            [[units]]
            id = "lonely"
            name = "Lonely"
            archetype = "Fighter"
            abilities = ["missing"]
            stats = { max_health = 50.0 }
            "#,
        );
        assert!(matches!(
            result,
            Err(CoreError::ConfigurationMissing {
                kind: CatalogKind::Ability,
                ..
            })
        ));
    }

    #[test]
    fn test_toml_catalog_loads() {
        let catalog = DataCatalog::from_toml_str(
            r#"
            [[units]]
            id = "rat"
            name = "Rat"
            archetype = "Assassin"
            tags = ["Shadow", "None"]
            stats = { max_health = 30.0, attack_damage = 4.0 }

            [[encounters]]
            id = "rats"
            level_min = 1
            level_max = 9
            enemies = ["rat", "rat"]
            gold = 5
            "#,
        )
        .unwrap();

        let rat = catalog.require_unit("rat").unwrap();
        assert_eq!(rat.stats.max_health, 30.0);
        assert_eq!(rat.stats.attack_interval, 1.0);
        assert!(!rat.playable);
        assert_eq!(catalog.require_encounter("rats").unwrap().gold, 5);
        assert!(catalog.uncovered_levels().contains(&10));
    }
}
