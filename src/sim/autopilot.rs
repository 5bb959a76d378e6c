//! Scripted party policy for headless battles
//!
//! Each living party unit acts at most once per party turn: first ready
//! ability with a sensible target, otherwise a basic attack on the focus
//! target. Units whose attack timer is still running make the pilot wait.

use tracing::debug;

use crate::ability::{check_ready, AbilityKind, TargetType};
use crate::archetype::GuardAction;
use crate::battle::{BattleLoop, BattlePhase, PlayerAction, HEADLESS_STEP, MAX_BATTLE_TURNS};
use crate::core::types::UnitId;
use crate::unit::UnitInstance;

/// Heal single allies below this health fraction
const HEAL_THRESHOLD: f32 = 0.7;

/// What the pilot wants to do next
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Act { actor: UnitId, action: PlayerAction },
    Wait,
    EndTurn,
}

/// Outcome of one piloted battle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PilotReport {
    pub turns: u32,
    /// Hit the turn cap and was aborted
    pub aborted: bool,
}

/// First living enemy; everyone focuses it so momentum is kept
fn focus_target(battle: &BattleLoop) -> Option<UnitId> {
    battle.enemies().iter().find(|u| u.is_alive()).map(|u| u.id)
}

fn most_wounded(party: &[UnitInstance]) -> Option<&UnitInstance> {
    party
        .iter()
        .filter(|u| u.is_alive())
        .min_by(|a, b| a.health_fraction().total_cmp(&b.health_fraction()))
}

fn ability_action(battle: &BattleLoop, unit: &UnitInstance) -> Option<PlayerAction> {
    let focus = focus_target(battle);
    let wounded = most_wounded(battle.party());
    let party_hurt = wounded.is_some_and(|u| u.health_fraction() < HEAL_THRESHOLD);

    for ability in &unit.abilities {
        if check_ready(unit, ability.id()).is_err() {
            continue;
        }
        let template = ability.template();
        let target = match (template.kind, template.target) {
            (AbilityKind::Heal, TargetType::SingleAlly) if party_hurt => wounded.map(|u| u.id),
            (AbilityKind::Heal, TargetType::SelfOnly) if unit.health_fraction() < HEAL_THRESHOLD => {
                None
            }
            (AbilityKind::Heal, TargetType::AllAllies) if party_hurt => None,
            (AbilityKind::Heal, _) => continue,
            (AbilityKind::Utility, _) if template.guard_action == Some(GuardAction::Taunt) => {
                // Only worth it when someone else needs cover
                if battle.party().iter().filter(|u| u.is_alive()).count() < 2 {
                    continue;
                }
                None
            }
            (_, TargetType::SingleEnemy) => Some(focus?),
            (_, TargetType::SingleAlly) => Some(unit.id),
            _ => None,
        };
        return Some(PlayerAction::UseAbility {
            caster: unit.id,
            ability_id: template.id.clone(),
            target,
        });
    }
    None
}

/// Pick the next step for the current party turn
pub fn decide(battle: &BattleLoop, acted: &[UnitId]) -> Decision {
    let mut waiting = false;

    for unit in battle.party() {
        if !unit.is_alive() || unit.is_stunned() || acted.contains(&unit.id) {
            continue;
        }
        if let Some(action) = ability_action(battle, unit) {
            return Decision::Act {
                actor: unit.id,
                action,
            };
        }
        let Some(target) = focus_target(battle) else {
            return Decision::EndTurn;
        };
        if unit.attack_ready() {
            return Decision::Act {
                actor: unit.id,
                action: PlayerAction::Attack {
                    attacker: unit.id,
                    target,
                },
            };
        }
        waiting = true;
    }

    if waiting {
        Decision::Wait
    } else {
        Decision::EndTurn
    }
}

/// Play a battle to completion
pub fn pilot(battle: &mut BattleLoop) -> PilotReport {
    battle.start();
    let mut acted: Vec<UnitId> = Vec::new();
    let mut turn = battle.turn();

    while !battle.is_finished() {
        if battle.turn() > MAX_BATTLE_TURNS {
            battle.abort();
            return PilotReport {
                turns: battle.turn(),
                aborted: true,
            };
        }

        match battle.phase() {
            BattlePhase::PartyTurn => {
                if battle.turn() != turn {
                    acted.clear();
                    turn = battle.turn();
                }
                match decide(battle, &acted) {
                    Decision::Act { actor, action } => {
                        // A rejected action still uses up the unit's turn
                        if let Err(e) = battle.submit(action) {
                            debug!(
                                unit = %actor,
                                turn = battle.turn(),
                                error = %e,
                                "Autopilot action rejected"
                            );
                        }
                        acted.push(actor);
                    }
                    Decision::Wait => battle.tick(HEADLESS_STEP),
                    Decision::EndTurn => {
                        if let Err(e) = battle.submit(PlayerAction::EndTurn) {
                            debug!(
                                turn = battle.turn(),
                                error = %e,
                                "Autopilot end turn rejected"
                            );
                        }
                    }
                }
            }
            BattlePhase::EnemyTurn => battle.tick(HEADLESS_STEP),
            BattlePhase::Idle => battle.start(),
            _ => break,
        }
    }

    PilotReport {
        turns: battle.turn(),
        aborted: battle.phase() == BattlePhase::Aborted,
    }
}
