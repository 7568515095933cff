//! Filling action queues for battlers the player does not command.
//!
//! Planning runs in two passes: the queue is reset through a mutable borrow,
//! then the new actions are worked out against a shared view of both sides
//! and written back slot by slot.

use tracing::debug;

use super::Action;
use crate::battler::{
    ActionState, Actor, Battler, BattlerId, BattlerOps, BattlerStats, PatternContext, UseContext,
    select_all_actions,
};
use crate::env::BattleEnv;
use crate::unit::Combatants;

/// Plans the next turn for `id`.
pub fn make_actions(env: &BattleEnv<'_>, units: &mut Combatants, id: BattlerId, can_escape: bool) {
    match id {
        BattlerId::Actor(actor_id) => make_actor_actions(env, units, actor_id, can_escape),
        BattlerId::Enemy(index) => make_enemy_actions(env, units, index, can_escape),
    }
}

/// Blank slots for player input, or filled slots for auto-battle and
/// confused actors.
pub fn make_actor_actions(env: &BattleEnv<'_>, units: &mut Combatants, actor_id: u32, can_escape: bool) {
    let Some(actor) = units.party.actor_mut(actor_id) else {
        return;
    };
    actor.make_blank_actions(env);
    let state = if actor.num_actions() > 0 {
        ActionState::Undecided
    } else {
        ActionState::Waiting
    };
    actor.set_action_state(state);

    let planned = if actor.is_auto_battle(env) {
        auto_battle_actions(env, units, actor_id, can_escape)
    } else if actor.is_confused(env) {
        let mut actions = actor.actions().to_vec();
        actions.iter_mut().for_each(Action::set_confusion);
        Some(actions)
    } else {
        None
    };
    if let Some(actions) = planned {
        write_actions(units, BattlerId::Actor(actor_id), actions);
    }
}

/// Best-scoring of attack and each usable skill, per slot.
fn auto_battle_actions(
    env: &BattleEnv<'_>,
    units: &Combatants,
    actor_id: u32,
    can_escape: bool,
) -> Option<Vec<Action>> {
    let actor = units.party.actor(actor_id)?;
    let ctx = UseContext::battle(units.party.inventory(), can_escape);
    let mut actions = actor.actions().to_vec();
    for slot in &mut actions {
        if let Some(best) = best_auto_action(env, units, actor, &ctx) {
            *slot = best;
        }
    }
    debug!(actor_id, actions = actions.len(), "auto battle planned");
    Some(actions)
}

/// The attack or usable skill of `actor` with the highest positive
/// evaluation, target included. `None` when nothing scores above zero.
pub fn best_auto_action(
    env: &BattleEnv<'_>,
    units: &Combatants,
    actor: &Actor,
    ctx: &UseContext<'_>,
) -> Option<Action> {
    let subject = actor.battler_id();
    let mut candidates = vec![{
        let mut attack = Action::new(subject);
        attack.set_attack();
        attack
    }];
    candidates.extend(actor.usable_skills(env, ctx).into_iter().map(|skill| {
        let mut action = Action::new(subject);
        action.set_skill(skill.id);
        action
    }));
    let mut best = f64::MIN_POSITIVE;
    let mut chosen = None;
    for mut candidate in candidates {
        let value = candidate.evaluate(env, units, ctx);
        if value > best {
            best = value;
            chosen = Some(candidate);
        }
    }
    chosen
}

/// Rating-weighted picks from the enemy's valid action patterns.
pub fn make_enemy_actions(env: &BattleEnv<'_>, units: &mut Combatants, index: usize, can_escape: bool) {
    let Some(enemy) = units.troop.enemy_mut(index) else {
        return;
    };
    enemy.make_blank_actions(env);
    let planned = {
        let enemy = units.troop.enemy(index);
        enemy.filter(|e| e.num_actions() > 0).map(|enemy| {
            let pattern_ctx = PatternContext {
                turn_count: units.troop.turn_count(),
                party_highest_level: units.party.highest_level(),
            };
            let ctx = UseContext::battle(units.party.inventory(), can_escape);
            let list = enemy.valid_actions(env, &pattern_ctx, &ctx);
            let mut actions = enemy.actions().to_vec();
            if !list.is_empty() {
                let picks = select_all_actions(env, &list, actions.len());
                for (action, pick) in actions.iter_mut().zip(picks) {
                    action.set_enemy_action(pick);
                }
            }
            actions
        })
    };
    let id = BattlerId::Enemy(index);
    if let Some(actions) = planned {
        write_actions(units, id, actions);
    }
    if let Some(enemy) = units.battler_mut(id) {
        enemy.set_action_state(ActionState::Waiting);
    }
}

fn write_actions(units: &mut Combatants, id: BattlerId, actions: Vec<Action>) {
    if let Some(battler) = units.battler_mut(id) {
        battler.clear_actions();
        for action in actions {
            battler.push_action(action);
        }
        battler.set_action_state(ActionState::Waiting);
    }
}
