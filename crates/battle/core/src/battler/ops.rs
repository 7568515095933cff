//! Battler mutations: vitals, states, buffs and turn maintenance.

use tracing::trace;

use super::{ActionState, BattlerStats, ParamId, SParamId, XParamId};
use crate::action::Action;
use crate::config::BattleConfig;
use crate::data::{AutoRemovalTiming, SkillData};
use crate::env::BattleEnv;

/// Mutations available on every battler, including `dyn Battler`.
///
/// Every method that changes HP, MP, TP, states or buffs finishes with
/// [`refresh`](BattlerOps::refresh), which re-clamps the vitals and keeps
/// `hp == 0` and the death state in lockstep.
pub trait BattlerOps: BattlerStats {
    // ===== vitals =====

    fn set_hp(&mut self, env: &BattleEnv<'_>, hp: i32) {
        self.core_mut().hp = hp;
        self.refresh(env);
    }

    fn set_mp(&mut self, env: &BattleEnv<'_>, mp: i32) {
        self.core_mut().mp = mp;
        self.refresh(env);
    }

    fn set_tp(&mut self, env: &BattleEnv<'_>, tp: i32) {
        self.core_mut().tp = tp;
        self.refresh(env);
    }

    /// Drops resisted states, clamps vitals and syncs the death state.
    fn refresh(&mut self, env: &BattleEnv<'_>) {
        for state_id in self.state_resist_set(env) {
            self.erase_state(state_id);
        }
        let mhp = self.mhp(env);
        let mmp = self.mmp(env);
        let max_tp = self.max_tp();
        let core = self.core_mut();
        core.hp = core.hp.clamp(0, mhp);
        core.mp = core.mp.clamp(0, mmp);
        core.tp = core.tp.clamp(0, max_tp);

        if self.hp() == 0 {
            self.add_state(env, BattleConfig::DEATH_STATE_ID);
        } else {
            self.remove_state(env, BattleConfig::DEATH_STATE_ID);
        }
    }

    fn gain_hp(&mut self, env: &BattleEnv<'_>, value: i32) {
        let result = &mut self.core_mut().result;
        result.hp_damage = -value;
        result.hp_affected = true;
        let hp = self.hp();
        self.set_hp(env, hp + value);
    }

    fn gain_mp(&mut self, env: &BattleEnv<'_>, value: i32) {
        self.core_mut().result.mp_damage = -value;
        let mp = self.mp();
        self.set_mp(env, mp + value);
    }

    fn gain_tp(&mut self, env: &BattleEnv<'_>, value: i32) {
        self.core_mut().result.tp_damage = -value;
        let tp = self.tp();
        self.set_tp(env, tp + value);
    }

    /// TP change that is not reported in the action result.
    fn gain_silent_tp(&mut self, env: &BattleEnv<'_>, value: i32) {
        let tp = self.tp();
        self.set_tp(env, tp + value);
    }

    fn init_tp(&mut self, env: &BattleEnv<'_>) {
        let tp = env.random_int(25);
        self.set_tp(env, tp);
    }

    fn clear_tp(&mut self, env: &BattleEnv<'_>) {
        self.set_tp(env, 0);
    }

    fn charge_tp_by_damage(&mut self, env: &BattleEnv<'_>, damage_rate: f64) {
        let value = (50.0 * damage_rate * self.sparam(env, SParamId::Tcr)).floor() as i32;
        self.gain_silent_tp(env, value);
    }

    fn add_param(&mut self, env: &BattleEnv<'_>, param: ParamId, value: i32) {
        self.core_mut().param_plus[param.index()] += value;
        self.refresh(env);
    }

    fn recover_all(&mut self, env: &BattleEnv<'_>) {
        self.clear_states();
        let mhp = self.mhp(env);
        let mmp = self.mmp(env);
        let core = self.core_mut();
        core.hp = mhp;
        core.mp = mmp;
    }

    fn die(&mut self) {
        self.core_mut().hp = 0;
        self.clear_states();
        self.clear_buffs();
    }

    fn revive(&mut self) {
        let core = self.core_mut();
        if core.hp == 0 {
            core.hp = 1;
        }
    }

    fn hide(&mut self) {
        self.core_mut().hidden = true;
    }

    fn appear(&mut self) {
        self.core_mut().hidden = false;
    }

    // ===== states =====

    fn is_state_addable(&self, env: &BattleEnv<'_>, state_id: u32) -> bool {
        let Some(state) = env.state(state_id) else {
            return false;
        };
        self.is_alive()
            && !self.is_state_resist(env, state_id)
            && !self.result().is_state_removed(state_id)
            && !(state.remove_by_restriction && self.is_restricted(env))
    }

    /// Adds a state or refreshes its turn counter. Returns `false` when the
    /// state could not be added (dead, unknown, resisted, removed earlier in
    /// this action, or blocked by the current restriction).
    fn add_state(&mut self, env: &BattleEnv<'_>, state_id: u32) -> bool {
        if !self.is_state_addable(env, state_id) {
            trace!(battler = ?self.battler_id(), state_id, "state not addable");
            return false;
        }
        if !self.is_state_affected(state_id) {
            self.add_new_state(env, state_id);
            self.refresh(env);
        }
        self.reset_state_counts(env, state_id);
        self.core_mut().result.push_added_state(state_id);
        trace!(battler = ?self.battler_id(), state_id, "state added");
        true
    }

    fn add_new_state(&mut self, env: &BattleEnv<'_>, state_id: u32) {
        if state_id == BattleConfig::DEATH_STATE_ID {
            self.die();
        }
        let restricted = self.is_restricted(env);
        self.core_mut().states.push(state_id);
        self.sort_states(env);
        if !restricted && self.is_restricted(env) {
            self.on_restrict(env);
        }
    }

    fn on_restrict(&mut self, env: &BattleEnv<'_>) {
        self.clear_actions();
        for state in self.state_objects(env) {
            if state.remove_by_restriction {
                self.remove_state(env, state.id);
            }
        }
    }

    fn remove_state(&mut self, env: &BattleEnv<'_>, state_id: u32) {
        if !self.is_state_affected(state_id) {
            return;
        }
        if state_id == BattleConfig::DEATH_STATE_ID {
            self.revive();
        }
        self.erase_state(state_id);
        self.refresh(env);
        self.core_mut().result.push_removed_state(state_id);
        trace!(battler = ?self.battler_id(), state_id, "state removed");
    }

    fn erase_state(&mut self, state_id: u32) {
        let core = self.core_mut();
        core.states.retain(|&id| id != state_id);
        core.state_turns.remove(&state_id);
        core.state_steps.remove(&state_id);
    }

    fn clear_states(&mut self) {
        let core = self.core_mut();
        core.states.clear();
        core.state_turns.clear();
        core.state_steps.clear();
    }

    /// Priority descending, then id ascending.
    fn sort_states(&mut self, env: &BattleEnv<'_>) {
        let priority = |id: u32| env.state(id).map_or(0, |state| state.priority);
        self.core_mut()
            .states
            .sort_by(|&a, &b| priority(b).cmp(&priority(a)).then(a.cmp(&b)));
    }

    fn reset_state_counts(&mut self, env: &BattleEnv<'_>, state_id: u32) {
        let Some(state) = env.state(state_id) else {
            return;
        };
        let variance = 1 + (state.max_turns - state.min_turns).max(0);
        let turns = state.min_turns + env.random_int(variance);
        let is_actor = self.is_actor();
        let core = self.core_mut();
        core.state_turns.insert(state_id, turns);
        if is_actor {
            core.state_steps.insert(state_id, state.steps_to_remove);
        }
    }

    fn update_state_turns(&mut self) {
        let core = self.core_mut();
        for id in &core.states {
            if let Some(turns) = core.state_turns.get_mut(id) {
                if *turns > 0 {
                    *turns -= 1;
                }
            }
        }
    }

    fn remove_battle_states(&mut self, env: &BattleEnv<'_>) {
        for state in self.state_objects(env) {
            if state.remove_at_battle_end {
                self.remove_state(env, state.id);
            }
        }
    }

    fn remove_states_auto(&mut self, env: &BattleEnv<'_>, timing: AutoRemovalTiming) {
        for state in self.state_objects(env) {
            if self.is_state_expired(state.id) && state.auto_removal_timing == timing {
                self.remove_state(env, state.id);
            }
        }
    }

    fn remove_states_by_damage(&mut self, env: &BattleEnv<'_>) {
        for state in self.state_objects(env) {
            if state.remove_by_damage && env.random_int(100) < state.chance_by_damage {
                self.remove_state(env, state.id);
            }
        }
    }

    // ===== buffs =====

    fn clear_buffs(&mut self) {
        let core = self.core_mut();
        core.buffs = [0; BattleConfig::BUFF_COUNT];
        core.buff_turns = [0; BattleConfig::BUFF_COUNT];
    }

    fn erase_buff(&mut self, param: ParamId) {
        let core = self.core_mut();
        core.buffs[param.index()] = 0;
        core.buff_turns[param.index()] = 0;
    }

    fn increase_buff(&mut self, param: ParamId) {
        if !self.is_max_buff_affected(param) {
            self.core_mut().buffs[param.index()] += 1;
        }
    }

    fn decrease_buff(&mut self, param: ParamId) {
        if !self.is_max_debuff_affected(param) {
            self.core_mut().buffs[param.index()] -= 1;
        }
    }

    /// Turn counters only ever grow here.
    fn overwrite_buff_turns(&mut self, param: ParamId, turns: i32) {
        let slot = &mut self.core_mut().buff_turns[param.index()];
        if *slot < turns {
            *slot = turns;
        }
    }

    fn update_buff_turns(&mut self) {
        for turns in &mut self.core_mut().buff_turns {
            if *turns > 0 {
                *turns -= 1;
            }
        }
    }

    fn add_buff(&mut self, env: &BattleEnv<'_>, param: ParamId, turns: i32) {
        if !self.is_alive() {
            return;
        }
        self.increase_buff(param);
        if self.is_buff_affected(param) {
            self.overwrite_buff_turns(param, turns);
        }
        self.core_mut().result.push_added_buff(param.index());
        self.refresh(env);
    }

    fn add_debuff(&mut self, env: &BattleEnv<'_>, param: ParamId, turns: i32) {
        if !self.is_alive() {
            return;
        }
        self.decrease_buff(param);
        if self.is_debuff_affected(param) {
            self.overwrite_buff_turns(param, turns);
        }
        self.core_mut().result.push_added_debuff(param.index());
        self.refresh(env);
    }

    fn remove_buff(&mut self, env: &BattleEnv<'_>, param: ParamId) {
        if self.is_alive() && self.is_buff_or_debuff_affected(param) {
            self.erase_buff(param);
            self.core_mut().result.push_removed_buff(param.index());
            self.refresh(env);
        }
    }

    fn remove_all_buffs(&mut self, env: &BattleEnv<'_>) {
        for index in 0..BattleConfig::BUFF_COUNT {
            if let Some(param) = ParamId::from_index(index) {
                self.remove_buff(env, param);
            }
        }
    }

    fn remove_buffs_auto(&mut self, env: &BattleEnv<'_>) {
        for index in 0..BattleConfig::BUFF_COUNT {
            if let Some(param) = ParamId::from_index(index) {
                if self.is_buff_expired(param) {
                    self.remove_buff(env, param);
                }
            }
        }
    }

    // ===== regeneration and turn hooks =====

    fn regenerate_hp(&mut self, env: &BattleEnv<'_>) {
        let rate = self.xparam(env, XParamId::Hrg);
        let value = ((f64::from(self.mhp(env)) * rate).floor() as i32).max(-self.max_slip_damage(env));
        if value != 0 {
            self.gain_hp(env, value);
        }
    }

    fn regenerate_mp(&mut self, env: &BattleEnv<'_>) {
        let rate = self.xparam(env, XParamId::Mrg);
        let value = (f64::from(self.mmp(env)) * rate).floor() as i32;
        if value != 0 {
            self.gain_mp(env, value);
        }
    }

    fn regenerate_tp(&mut self, env: &BattleEnv<'_>) {
        let value = (100.0 * self.xparam(env, XParamId::Trg)).floor() as i32;
        self.gain_silent_tp(env, value);
    }

    fn regenerate_all(&mut self, env: &BattleEnv<'_>) {
        if self.is_alive() {
            self.regenerate_hp(env);
            self.regenerate_mp(env);
            self.regenerate_tp(env);
        }
    }

    fn on_battle_start(&mut self, env: &BattleEnv<'_>) {
        self.set_action_state(ActionState::Undecided);
        if !self.is_preserve_tp(env) {
            self.init_tp(env);
        }
    }

    fn on_all_actions_end(&mut self, env: &BattleEnv<'_>) {
        self.clear_result();
        self.remove_states_auto(env, AutoRemovalTiming::ActionEnd);
        self.remove_buffs_auto(env);
    }

    /// Turn counters are left alone during a forced turn.
    fn on_turn_end(&mut self, env: &BattleEnv<'_>, forced_turn: bool) {
        self.clear_result();
        self.regenerate_all(env);
        if !forced_turn {
            self.update_state_turns();
            self.update_buff_turns();
        }
        self.remove_states_auto(env, AutoRemovalTiming::TurnEnd);
    }

    fn on_battle_end(&mut self, env: &BattleEnv<'_>) {
        self.clear_result();
        self.remove_battle_states(env);
        self.remove_all_buffs(env);
        self.clear_actions();
        if !self.is_preserve_tp(env) {
            self.clear_tp(env);
        }
        self.appear();
    }

    fn on_damage(&mut self, env: &BattleEnv<'_>, value: i32) {
        self.remove_states_by_damage(env);
        let rate = f64::from(value) / f64::from(self.mhp(env).max(1));
        self.charge_tp_by_damage(env, rate);
    }

    /// Drops every action and state. The battler is hidden only when
    /// `in_battle`.
    fn escape(&mut self, in_battle: bool) {
        if in_battle {
            self.hide();
        }
        self.clear_actions();
        self.clear_states();
    }

    // ===== actions =====

    fn clear_actions(&mut self) {
        let core = self.core_mut();
        core.actions.clear();
        core.action_input_index = 0;
    }

    fn remove_current_action(&mut self) {
        let actions = &mut self.core_mut().actions;
        if !actions.is_empty() {
            actions.remove(0);
        }
    }

    fn push_action(&mut self, action: Action) {
        self.core_mut().actions.push(action);
    }

    fn set_action_state(&mut self, state: ActionState) {
        self.core_mut().action_state = state;
    }

    fn clear_result(&mut self) {
        self.core_mut().result.clear();
    }

    fn set_last_target_index(&mut self, index: i32) {
        self.core_mut().last_target_index = index;
    }

    /// 1 plus one extra action per successful `ActionPlus` roll.
    fn make_action_times(&self, env: &BattleEnv<'_>) -> usize {
        self.action_plus_set(env)
            .into_iter()
            .fold(1, |times, chance| if env.random() < chance { times + 1 } else { times })
    }

    /// Refills the queue with blank actions; choosing what they do is up to
    /// the caller.
    fn make_blank_actions(&mut self, env: &BattleEnv<'_>) {
        self.clear_actions();
        if self.can_move(env) {
            let times = self.make_action_times(env);
            let subject = self.battler_id();
            self.core_mut()
                .actions
                .extend((0..times).map(|_| Action::new(subject)));
        }
    }

    /// The slowest queued action sets the battler's speed: a battler with one
    /// slow and one fast action acts as if slow.
    fn make_speed(&mut self, env: &BattleEnv<'_>) {
        let speeds: Vec<i32> = self
            .actions()
            .iter()
            .map(|action| action.speed(env, &*self))
            .collect();
        // Nothing queued sorts first.
        self.core_mut().speed = speeds.into_iter().min().unwrap_or(i32::MAX);
    }

    fn pay_skill_cost(&mut self, env: &BattleEnv<'_>, skill: &SkillData) {
        let mp_cost = self.skill_mp_cost(env, skill);
        let tp_cost = self.skill_tp_cost(skill);
        let core = self.core_mut();
        core.mp -= mp_cost;
        core.tp -= tp_cost;
    }
}

impl<T: BattlerStats + ?Sized> BattlerOps for T {}
