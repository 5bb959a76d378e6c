//! Built-in units, abilities, encounters and relics

use crate::ability::{AbilityKind, AbilityTemplate, TargetType};
use crate::archetype::{Archetype, GuardAction};
use crate::core::types::Seconds;
use crate::encounter::EncounterSpec;
use crate::run::{RelicEffect, RelicKind};
use crate::stats::{BaseStats, ModifierOp, StatKind};
use crate::synergy::SynergyTag;
use crate::unit::UnitTemplate;

use super::CatalogFile;

#[allow(clippy::too_many_arguments)]
fn stats(
    max_health: f32,
    max_mana: f32,
    attack_damage: f32,
    attack_interval: Seconds,
    armor: f32,
    magic_resist: f32,
    attack_range: f32,
) -> BaseStats {
    BaseStats {
        max_health,
        max_mana,
        attack_damage,
        attack_interval,
        armor,
        magic_resist,
        movement_speed: 1.0,
        attack_range,
    }
}

fn unit(
    id: &str,
    name: &str,
    archetype: Archetype,
    tags: [SynergyTag; 2],
    stats: BaseStats,
    abilities: &[&str],
    playable: bool,
) -> UnitTemplate {
    UnitTemplate {
        id: id.into(),
        name: name.into(),
        stats,
        archetype,
        tags,
        abilities: abilities.iter().map(|a| a.to_string()).collect(),
        playable,
    }
}

fn ability(
    id: &str,
    name: &str,
    kind: AbilityKind,
    target: TargetType,
    mana_cost: f32,
    cooldown: Seconds,
    magnitude: f32,
) -> AbilityTemplate {
    AbilityTemplate {
        id: id.into(),
        name: name.into(),
        kind,
        mana_cost,
        cooldown,
        magnitude,
        target,
        stat: None,
        duration: 0.0,
        guard_action: None,
    }
}

fn timed(mut template: AbilityTemplate, stat: StatKind, duration: Seconds) -> AbilityTemplate {
    template.stat = Some(stat);
    template.duration = duration;
    template
}

fn guard(mut template: AbilityTemplate, action: GuardAction) -> AbilityTemplate {
    template.guard_action = Some(action);
    template
}

fn encounter(id: &str, levels: (u32, u32), enemies: &[&str], gold: u32) -> EncounterSpec {
    EncounterSpec {
        id: id.into(),
        level_min: levels.0,
        level_max: levels.1,
        enemies: enemies.iter().map(|e| e.to_string()).collect(),
        miniboss: false,
        major_miniboss: false,
        final_boss: false,
        gold,
    }
}

fn relic(id: &str, name: &str, effect: RelicKind) -> RelicEffect {
    RelicEffect {
        id: id.into(),
        name: name.into(),
        effect,
    }
}

pub(super) fn content() -> CatalogFile {
    use AbilityKind::*;
    use Archetype::*;
    use SynergyTag as T;
    use TargetType::*;

    let units = vec![
        // Party
        unit("vanguard", "Vanguard", Tank, [T::Steel, T::Holy], stats(260.0, 40.0, 12.0, 1.4, 10.0, 5.0, 1.0), &["taunt", "bulwark"], true),
        unit("warden", "Grove Warden", Tank, [T::Nature, T::Steel], stats(240.0, 60.0, 10.0, 1.4, 8.0, 8.0, 1.0), &["taunt", "mend"], true),
        unit("blademaster", "Blademaster", Fighter, [T::Fire, T::Storm], stats(180.0, 40.0, 18.0, 1.0, 5.0, 2.0, 1.0), &["cleave"], true),
        unit("ranger", "Ranger", Fighter, [T::Nature, T::Storm], stats(150.0, 40.0, 15.0, 0.9, 3.0, 3.0, 4.0), &["volley"], true),
        unit("pyromancer", "Pyromancer", Mage, [T::Fire, T::Arcane], stats(120.0, 100.0, 8.0, 1.3, 2.0, 6.0, 3.0), &["fireball", "sap"], true),
        unit("stormcaller", "Stormcaller", Mage, [T::Storm, T::Arcane], stats(125.0, 100.0, 8.0, 1.3, 2.0, 6.0, 3.0), &["chain_lightning", "haste"], true),
        unit("druid", "Druid", Mage, [T::Nature, T::Holy], stats(130.0, 110.0, 7.0, 1.3, 3.0, 8.0, 3.0), &["mend", "rejuvenate"], true),
        unit("nightblade", "Nightblade", Assassin, [T::Shadow, T::Storm], stats(140.0, 50.0, 22.0, 1.1, 3.0, 3.0, 1.0), &["backstab", "expose"], true),
        // Enemies
        unit("ghoul", "Ghoul", Fighter, [T::Shadow, T::None], stats(180.0, 0.0, 10.0, 1.2, 2.0, 0.0, 1.0), &[], false),
        unit("shade", "Shade", Assassin, [T::Shadow, T::None], stats(90.0, 0.0, 14.0, 1.0, 0.0, 6.0, 1.0), &[], false),
        unit("cultist", "Ash Cultist", Mage, [T::Fire, T::None], stats(100.0, 60.0, 9.0, 1.3, 1.0, 8.0, 3.0), &[], false),
        unit("brute", "Brute", Fighter, [T::Steel, T::None], stats(260.0, 0.0, 16.0, 1.5, 4.0, 2.0, 1.0), &[], false),
        unit("bone_colossus", "Bone Colossus", Tank, [T::Steel, T::Shadow], stats(900.0, 0.0, 24.0, 1.6, 10.0, 5.0, 1.0), &[], false),
        unit("lich_knight", "Lich Knight", Mage, [T::Shadow, T::Arcane], stats(1400.0, 200.0, 30.0, 1.4, 8.0, 12.0, 2.0), &[], false),
        unit("ash_sovereign", "Ash Sovereign", Tank, [T::Fire, T::Holy], stats(3000.0, 300.0, 40.0, 1.5, 15.0, 15.0, 2.0), &[], false),
    ];

    let abilities = vec![
        guard(ability("taunt", "Taunt", Utility, SelfOnly, 0.0, 6.0, 0.0), GuardAction::Taunt),
        guard(ability("bulwark", "Bulwark", Utility, SelfOnly, 0.0, 10.0, 0.0), GuardAction::DamageReduction),
        ability("cleave", "Cleave", Damage, AllEnemies, 20.0, 6.0, 20.0),
        ability("volley", "Volley", Damage, AllEnemies, 20.0, 7.0, 14.0),
        ability("fireball", "Fireball", Damage, SingleEnemy, 25.0, 3.0, 45.0),
        ability("chain_lightning", "Chain Lightning", Damage, AllEnemies, 35.0, 5.0, 25.0),
        ability("backstab", "Backstab", Damage, SingleEnemy, 15.0, 5.0, 35.0),
        ability("mend", "Mend", Heal, SingleAlly, 20.0, 3.0, 40.0),
        ability("rejuvenate", "Rejuvenate", Heal, AllAllies, 40.0, 8.0, 20.0),
        timed(ability("haste", "Haste", Buff, AllAllies, 30.0, 10.0, 0.2), StatKind::AttackInterval, 6.0),
        timed(ability("sap", "Sap Strength", Debuff, SingleEnemy, 20.0, 8.0, 0.3), StatKind::AttackDamage, 5.0),
        timed(ability("expose", "Expose", Debuff, SingleEnemy, 10.0, 6.0, 0.5), StatKind::Armor, 5.0),
    ];

    let mut colossus = encounter("colossus_vault", (10, 90), &["bone_colossus", "ghoul"], 50);
    colossus.miniboss = true;
    let mut lich = encounter("lich_court", (30, 80), &["lich_knight", "cultist", "cultist"], 120);
    lich.miniboss = true;
    lich.major_miniboss = true;
    let mut throne = encounter("ash_throne", (100, 100), &["ash_sovereign", "brute", "brute"], 500);
    throne.miniboss = true;
    throne.final_boss = true;

    let encounters = vec![
        encounter("crypt_ghouls", (1, 9), &["ghoul", "ghoul"], 10),
        encounter("shade_ambush", (1, 29), &["shade", "ghoul"], 12),
        encounter("cult_circle", (5, 59), &["cultist", "cultist", "ghoul"], 18),
        encounter("brute_pack", (11, 99), &["brute", "shade"], 24),
        encounter("ashen_host", (30, 99), &["brute", "cultist", "shade"], 30),
        colossus,
        lich,
        throne,
    ];

    let relics = vec![
        relic("whetstone", "Whetstone", RelicKind::StatBonus { stat: StatKind::AttackDamage, op: ModifierOp::Mul(1.1) }),
        relic("iron_heart", "Iron Heart", RelicKind::StatBonus { stat: StatKind::MaxHealth, op: ModifierOp::Add(50.0) }),
        relic("assassin_sigil", "Assassin's Sigil", RelicKind::CriticalStrike { chance: 0.15, multiplier: 1.5 }),
        relic("gilded_idol", "Gilded Idol", RelicKind::GoldBonus { fraction: 0.25 }),
    ];

    CatalogFile {
        units,
        abilities,
        encounters,
        relics,
    }
}
