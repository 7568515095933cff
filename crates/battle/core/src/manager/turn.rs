//! Turn execution: action order, the subject loop and per-target invocation.

use tracing::{debug, info, trace, warn};

use super::{BattleManager, Phase, order_by_speed};
use crate::action::Action;
use crate::battler::{ActionState, Battler, BattlerId, BattlerOps, BattlerStats, UseContext};
use crate::data::UsableItem;
use crate::env::BattleEnv;
use crate::log::{BattleHost, LogCommand, Narrator};
use crate::unit::Unit;

impl BattleManager {
    pub(super) fn start_turn(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) {
        self.set_phase(Phase::Turn);
        self.clear_actor();
        self.units.troop.increase_turn(env);
        self.make_action_orders(env);
        host.push(LogCommand::Wait);
        info!(turn = self.units.troop.turn_count(), "turn started");
    }

    /// Party then troop, minus the side that lost the initiative, sorted by
    /// freshly rolled speed.
    fn make_action_orders(&mut self, env: &BattleEnv<'_>) {
        let mut ids = Vec::new();
        if !self.surprise {
            ids.extend(self.units.party.member_ids());
        }
        if !self.preemptive {
            ids.extend(self.units.troop.member_ids());
        }
        let entries = ids
            .into_iter()
            .filter_map(|id| {
                let battler = self.units.battler_mut(id)?;
                battler.make_speed(env);
                Some((id, battler.speed()))
            })
            .collect();
        self.action_battlers = order_by_speed(entries).into();
        trace!(order = ?self.action_battlers, "action order made");
    }

    pub(super) fn update_turn(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) {
        if self.subject.is_none() {
            self.subject = self.next_subject();
        }
        if self.subject.is_some() {
            self.process_turn(env, host);
        } else {
            self.end_turn(env, host);
        }
    }

    /// Runs the subject's next queued action, or closes out the subject once
    /// its queue is empty.
    fn process_turn(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) {
        let Some(subject_id) = self.subject else {
            return;
        };
        let Some(subject) = self.units.battler(subject_id) else {
            self.subject = self.next_subject();
            return;
        };
        match subject.current_action().cloned() {
            Some(mut action) => {
                action.prepare(env, subject);
                let ctx = UseContext::battle(self.units.party.inventory(), self.can_escape);
                if action.is_valid(env, subject, &ctx) {
                    self.start_action(env, host, action);
                } else {
                    warn!(subject = ?subject_id, item = ?action.item_ref(), "invalid action dropped");
                }
                if let Some(subject) = self.units.battler_mut(subject_id) {
                    subject.remove_current_action();
                }
            }
            None => {
                if let Some(subject) = self.units.battler_mut(subject_id) {
                    subject.on_all_actions_end(env);
                }
                let narrator = Narrator::new(env, &self.units);
                narrator.display_auto_affected_status(host, subject_id);
                narrator.display_current_state(host, subject_id);
                narrator.display_regeneration(host, subject_id);
                self.subject = self.next_subject();
            }
        }
    }

    /// Pops the queue until a battler that is still a living member of its
    /// unit turns up.
    fn next_subject(&mut self) -> Option<BattlerId> {
        while let Some(id) = self.action_battlers.pop_front() {
            let is_member = self.units.friends_of(id).index_of(id).is_some();
            let alive = self.units.battler(id).is_some_and(|b| b.is_alive());
            if is_member && alive {
                return Some(id);
            }
        }
        None
    }

    pub(super) fn process_forced_action(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) {
        let Some(id) = self.forced_battler.take() else {
            return;
        };
        self.turn_forced = true;
        self.subject = Some(id);
        let action = self.units.battler(id).and_then(|b| b.current_action().cloned());
        if let Some(action) = action {
            self.start_action(env, host, action);
        }
        if let Some(battler) = self.units.battler_mut(id) {
            battler.remove_current_action();
        }
    }

    fn start_action(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost, action: Action) {
        let subject_id = action.subject();
        let targets = action.make_targets(env, &self.units);
        self.set_phase(Phase::Action);
        self.use_item(env, &action);
        self.apply_global(env, &action);
        if let Some(subject) = self.units.battler_mut(subject_id) {
            subject.set_action_state(ActionState::Acting);
        }
        Narrator::new(env, &self.units).start_action(host, &action, &targets);
        debug!(subject = ?subject_id, item = ?action.item_ref(), targets = ?targets, "action started");
        self.targets = targets.into();
        self.action = Some(action);
    }

    /// Pays for the action: skill costs from the subject, consumables from
    /// the party inventory when an actor uses them.
    fn use_item(&mut self, env: &BattleEnv<'_>, action: &Action) {
        let subject_id = action.subject();
        match action.item(env) {
            Some(UsableItem::Skill(skill)) => {
                if let Some(subject) = self.units.battler_mut(subject_id) {
                    subject.pay_skill_cost(env, skill);
                }
            }
            Some(UsableItem::Item(item)) if subject_id.is_actor() => {
                self.units.party.inventory_mut().consume_item(item);
            }
            _ => {}
        }
    }

    fn apply_global(&mut self, env: &BattleEnv<'_>, action: &Action) {
        if let Some(event_id) = action.common_events(env).into_iter().last() {
            self.reserved_common_event = Some(event_id);
        }
    }

    pub(super) fn update_action(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) {
        match self.targets.pop_front() {
            Some(target) => self.invoke_action(env, host, target),
            None => self.end_action(env, host),
        }
    }

    fn end_action(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) {
        if let Some(subject_id) = self.subject {
            Narrator::new(env, &self.units).end_action(host, subject_id);
            if let Some(subject) = self.units.battler_mut(subject_id) {
                subject.set_action_state(ActionState::Done);
            }
        }
        self.action = None;
        self.set_phase(Phase::Turn);
    }

    /// Resolves the current action against one target: counter attack,
    /// magic reflection or a normal hit (with substitution).
    fn invoke_action(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost, target: BattlerId) {
        let Some(subject_id) = self.subject else {
            return;
        };
        host.push(LogCommand::PushBaseLine);
        let counter_roll = env.random();
        if counter_roll < self.target_rate(env, target, Action::item_cnt) {
            self.invoke_counter_attack(env, host, subject_id, target);
        } else {
            let reflect_roll = env.random();
            if reflect_roll < self.target_rate(env, target, Action::item_mrf) {
                self.invoke_magic_reflection(env, host, subject_id, target);
            } else {
                self.invoke_normal_action(env, host, subject_id, target);
            }
        }
        if let Some(index) = self.units.friends_of(target).index_of(target) {
            if let Some(subject) = self.units.battler_mut(subject_id) {
                subject.set_last_target_index(index as i32);
            }
        }
        host.push(LogCommand::PopBaseLine);
    }

    fn target_rate(
        &self,
        env: &BattleEnv<'_>,
        target: BattlerId,
        rate: fn(&Action, &BattleEnv<'_>, &dyn Battler) -> f64,
    ) -> f64 {
        match (self.action.as_ref(), self.units.battler(target)) {
            (Some(action), Some(target)) => rate(action, env, target),
            _ => 0.0,
        }
    }

    fn invoke_counter_attack(
        &mut self,
        env: &BattleEnv<'_>,
        host: &mut dyn BattleHost,
        subject: BattlerId,
        target: BattlerId,
    ) {
        let mut counter = Action::new(target);
        counter.set_attack();
        counter.apply(env, &mut self.units, subject);
        let narrator = Narrator::new(env, &self.units);
        narrator.display_counter(host, target);
        narrator.display_action_results(host, target, subject);
        debug!(counter = ?target, against = ?subject, "counter attack");
    }

    fn invoke_magic_reflection(
        &mut self,
        env: &BattleEnv<'_>,
        host: &mut dyn BattleHost,
        subject: BattlerId,
        target: BattlerId,
    ) {
        let Some(action) = self.action.as_mut() else {
            return;
        };
        action.set_reflection_target(Some(target));
        Narrator::new(env, &self.units).display_reflection(host, target);
        action.apply(env, &mut self.units, subject);
        Narrator::new(env, &self.units).display_action_results(host, target, subject);
        debug!(reflector = ?target, caster = ?subject, "magic reflected");
    }

    fn invoke_normal_action(
        &mut self,
        env: &BattleEnv<'_>,
        host: &mut dyn BattleHost,
        subject: BattlerId,
        target: BattlerId,
    ) {
        let real_target = self.apply_substitute(env, host, target);
        if let Some(action) = self.action.as_mut() {
            action.apply(env, &mut self.units, real_target);
        }
        Narrator::new(env, &self.units).display_action_results(host, subject, real_target);
    }

    /// A dying target that the action could miss is covered by the first
    /// movable substitute in its unit.
    fn apply_substitute(&self, env: &BattleEnv<'_>, host: &mut dyn BattleHost, target: BattlerId) -> BattlerId {
        let Some(action) = self.action.as_ref() else {
            return target;
        };
        let dying = self.units.battler(target).is_some_and(|t| t.is_dying(env));
        if !dying || action.is_certain_hit(env) {
            return target;
        }
        match self.units.friends_of(target).substitute_battler(env) {
            Some(substitute) if substitute != target => {
                Narrator::new(env, &self.units).display_substitute(host, substitute, target);
                debug!(substitute = ?substitute, target = ?target, "substitute stepped in");
                substitute
            }
            _ => target,
        }
    }

    pub(super) fn end_turn(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) {
        self.set_phase(Phase::TurnEnd);
        self.preemptive = false;
        self.surprise = false;
        for id in self.units.all_member_ids() {
            if let Some(battler) = self.units.battler_mut(id) {
                battler.on_turn_end(env, self.turn_forced);
            }
            let narrator = Narrator::new(env, &self.units);
            narrator.display_auto_affected_status(host, id);
            narrator.display_regeneration(host, id);
        }
        self.turn_forced = false;
        debug!(turn = self.units.troop.turn_count(), "turn ended");
    }
}
