//! Battle loop integration tests against the built-in catalog

use std::sync::Arc;

use ashen_court::battle::*;
use ashen_court::catalog::DataCatalog;
use ashen_court::core::config::{BattleConfig, EngineConfig};
use ashen_court::core::rng::seeded;
use ashen_court::core::types::{IdAllocator, Side, UnitId};
use ashen_court::events::CoreEvent;
use ashen_court::sim::pilot;
use ashen_court::unit::UnitInstance;

fn headless() -> Arc<EngineConfig> {
    Arc::new(EngineConfig {
        battle: BattleConfig::headless(),
        ..EngineConfig::default()
    })
}

fn spawn(party: &[&str], enemies: &[&str], config: &EngineConfig) -> (Vec<UnitInstance>, Vec<UnitInstance>) {
    let catalog = DataCatalog::builtin();
    let mut ids = IdAllocator::new();
    let mut build = |list: &[&str], side: Side| -> Vec<UnitInstance> {
        list.iter()
            .map(|id| catalog.spawn_unit(id, ids.allocate(), side, config).unwrap())
            .collect()
    };
    let party = build(party, Side::Party);
    let enemies = build(enemies, Side::Enemy);
    (party, enemies)
}

fn battle(party: &[&str], enemies: &[&str]) -> BattleLoop {
    let config = headless();
    let (party, enemies) = spawn(party, enemies, &config);
    BattleLoop::new(party, enemies, config, seeded(7))
}

#[test]
fn test_taunt_needs_guard_built_from_hits() {
    let mut battle = battle(&["vanguard"], &["brute", "brute"]);
    battle.start();
    let taunt = PlayerAction::UseAbility {
        caster: UnitId(0),
        ability_id: "taunt".to_string(),
        target: None,
    };

    assert_eq!(
        battle.submit(taunt.clone()),
        Err(ActionError::InsufficientGuard { have: 0, need: 30 })
    );

    // Two brutes land 5 guard each per enemy turn
    for _ in 0..3 {
        battle.submit(PlayerAction::EndTurn).unwrap();
    }
    assert_eq!(battle.phase(), BattlePhase::PartyTurn);
    assert_eq!(battle.party()[0].engine.stacks(), 30);

    battle.drain_events();
    battle.submit(taunt).unwrap();
    assert!(battle.party()[0].engine.is_taunting());
    assert_eq!(battle.party()[0].engine.stacks(), 0);

    let events = battle.drain_events();
    assert!(events.contains(&CoreEvent::TauntStarted {
        unit: UnitId(0),
        duration: 3.0
    }));
}

#[test]
fn test_fireball_spends_mana_and_goes_on_cooldown() {
    let mut battle = battle(&["pyromancer"], &["ghoul"]);
    battle.start();
    let fireball = PlayerAction::UseAbility {
        caster: UnitId(0),
        ability_id: "fireball".to_string(),
        target: Some(UnitId(1)),
    };

    let outcome = battle.submit(fireball.clone()).unwrap();
    assert!((outcome.damage - 45.0).abs() < 1e-3);
    assert_eq!(battle.party()[0].mana(), 75.0);
    assert_eq!(battle.party()[0].engine.stacks(), 1);
    assert!(matches!(
        battle.submit(fireball),
        Err(ActionError::OnCooldown { .. })
    ));

    let events = battle.drain_events();
    assert!(events.contains(&CoreEvent::AbilityUsed {
        caster: UnitId(0),
        ability: "fireball".to_string(),
        target: Some(UnitId(1)),
    }));
}

#[test]
fn test_single_target_ability_requires_target() {
    let mut battle = battle(&["pyromancer"], &["ghoul"]);
    battle.start();
    let result = battle.submit(PlayerAction::UseAbility {
        caster: UnitId(0),
        ability_id: "fireball".to_string(),
        target: None,
    });
    assert_eq!(result, Err(ActionError::InvalidTarget(None)));
    assert_eq!(battle.party()[0].mana(), 100.0);

    let result = battle.submit(PlayerAction::UseAbility {
        caster: UnitId(0),
        ability_id: "meteor".to_string(),
        target: Some(UnitId(1)),
    });
    assert_eq!(result, Err(ActionError::UnknownAbility("meteor".to_string())));
}

#[test]
fn test_shadow_pair_lifesteals_on_hit() {
    let config = headless();
    let (mut party, enemies) = spawn(&["nightblade", "nightblade"], &["ghoul"], &config);
    party[0].take_damage(50.0);
    let mut battle = BattleLoop::new(party, enemies, config, seeded(3));
    battle.start();
    assert!(battle
        .synergy()
        .is_active(ashen_court::synergy::SynergyTag::Shadow));

    let before = battle.party()[0].health();
    let outcome = battle
        .submit(PlayerAction::Attack {
            attacker: UnitId(0),
            target: UnitId(2),
        })
        .unwrap();
    assert!(outcome.damage > 0.0);
    let gained = battle.party()[0].health() - before;
    assert!((gained - outcome.damage * 0.1).abs() < 1e-3);
}

#[test]
fn test_dead_units_leave_at_turn_boundary() {
    let config = headless();
    let (party, mut enemies) = spawn(&["blademaster"], &["shade", "shade"], &config);
    enemies[0].take_damage(85.0);
    let mut battle = BattleLoop::new(party, enemies, config, seeded(5));
    battle.start();

    let outcome = battle
        .submit(PlayerAction::Attack {
            attacker: UnitId(0),
            target: UnitId(1),
        })
        .unwrap();
    assert_eq!(outcome.kills, vec![UnitId(1)]);
    assert_eq!(battle.enemies().len(), 2);

    // Attacking the corpse is rejected
    battle.tick(1.0);
    assert_eq!(
        battle.submit(PlayerAction::Attack {
            attacker: UnitId(0),
            target: UnitId(1),
        }),
        Err(ActionError::InvalidTarget(Some(UnitId(1))))
    );

    battle.submit(PlayerAction::EndTurn).unwrap();
    assert_eq!(battle.enemies().len(), 1);
    assert_eq!(battle.turn(), 2);
}

#[test]
fn test_piloted_battle_reaches_an_outcome() {
    let mut battle = battle(&["vanguard", "blademaster"], &["ghoul", "ghoul"]);
    let report = pilot(&mut battle);
    assert!(!report.aborted);
    assert!(battle.is_finished());
    assert!(battle.outcome().is_some());
}

#[test]
fn test_same_seed_same_event_stream() {
    let run = || {
        let mut battle = battle(&["pyromancer", "ranger"], &["cultist", "shade"]);
        pilot(&mut battle);
        battle.drain_events()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_paced_enemy_turn_waits_for_ticks() {
    let config = Arc::new(EngineConfig::default());
    let (party, enemies) = spawn(&["vanguard"], &["brute", "brute"], &config);
    let mut battle = BattleLoop::new(party, enemies, config, seeded(9));
    battle.start();
    battle.submit(PlayerAction::EndTurn).unwrap();
    assert_eq!(battle.phase(), BattlePhase::EnemyTurn);

    battle.tick(0.25);
    assert_eq!(battle.phase(), BattlePhase::EnemyTurn);
    battle.tick(0.25);
    battle.tick(0.5);
    assert_eq!(battle.phase(), BattlePhase::PartyTurn);
    assert_eq!(battle.party()[0].engine.stacks(), 10);
}
