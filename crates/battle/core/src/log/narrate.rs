//! Battle log narration.
//!
//! Reads results straight after they are produced and pushes the matching
//! command sequence. Texts come from the database message templates.

use super::{BattleLog, CollapseKind, LogCommand};
use crate::action::Action;
use crate::battler::{ActionResult, Battler, BattlerId, BattlerStats};
use crate::config::BattleConfig;
use crate::data::{Messages, Terms, UsableItem, format_message};
use crate::env::BattleEnv;
use crate::unit::Combatants;

/// Builds log commands for one controller step.
pub struct Narrator<'a, 'e> {
    env: &'a BattleEnv<'e>,
    units: &'a Combatants,
}

impl<'a, 'e> Narrator<'a, 'e> {
    pub fn new(env: &'a BattleEnv<'e>, units: &'a Combatants) -> Self {
        Self { env, units }
    }

    fn terms(&self) -> &'e Terms {
        &self.env.system().terms
    }

    fn messages(&self) -> &'e Messages {
        &self.terms().messages
    }

    fn battler(&self, id: BattlerId) -> Option<&'a dyn Battler> {
        self.units.battler(id)
    }

    fn name(&self, id: BattlerId) -> String {
        self.battler(id).map(|b| b.name()).unwrap_or_default()
    }

    // ===== action start and end =====

    pub fn start_action<L: BattleLog + ?Sized>(&self, log: &mut L, action: &Action, targets: &[BattlerId]) {
        let subject = action.subject();
        let item = action.item_ref();
        log.push(LogCommand::PerformActionStart { subject, item });
        log.push(LogCommand::WaitForMovement);
        log.push(LogCommand::PerformAction { subject, item });
        log.push(LogCommand::ShowAnimation {
            subject,
            targets: targets.to_vec(),
            animation_id: self.animation_id(action),
        });
        self.display_action(log, action);
    }

    /// Normal attacks (`-1`) use the actor's weapon animation.
    fn animation_id(&self, action: &Action) -> i32 {
        let id = action.item(self.env).map_or(0, |item| item.animation_id());
        match action.subject() {
            BattlerId::Actor(actor_id) if id < 0 => self
                .units
                .party
                .actor(actor_id)
                .map_or(id, |actor| actor.attack_animation_id(self.env.data())),
            _ => id,
        }
    }

    fn display_action<L: BattleLog + ?Sized>(&self, log: &mut L, action: &Action) {
        let name = self.name(action.subject());
        let mut pushed = false;
        match action.item(self.env) {
            Some(UsableItem::Skill(skill)) => {
                if !skill.message1.is_empty() {
                    let text = format_message(&skill.message1, &[&skill.name]);
                    log.push(LogCommand::AddText(format!("{name}{text}")));
                    pushed = true;
                }
                if !skill.message2.is_empty() {
                    log.push(LogCommand::AddText(format_message(&skill.message2, &[&skill.name])));
                    pushed = true;
                }
            }
            Some(UsableItem::Item(item)) => {
                let text = format_message(&self.messages().use_item, &[&name, &item.name]);
                log.push(LogCommand::AddText(text));
                pushed = true;
            }
            None => {}
        }
        if !pushed {
            log.push(LogCommand::Wait);
        }
    }

    pub fn end_action<L: BattleLog + ?Sized>(&self, log: &mut L, subject: BattlerId) {
        log.push(LogCommand::WaitForNewLine);
        log.push(LogCommand::Clear);
        log.push(LogCommand::PerformActionEnd(subject));
    }

    // ===== subject upkeep =====

    pub fn display_current_state<L: BattleLog + ?Sized>(&self, log: &mut L, subject: BattlerId) {
        let Some(battler) = self.battler(subject) else {
            return;
        };
        if let Some(text) = battler.most_important_state_text(self.env) {
            log.push(LogCommand::AddText(format!("{}{text}", battler.name())));
            log.push(LogCommand::Wait);
            log.push(LogCommand::Clear);
        }
    }

    pub fn display_regeneration<L: BattleLog + ?Sized>(&self, log: &mut L, subject: BattlerId) {
        log.push(LogCommand::PopupDamage(subject));
    }

    pub fn display_auto_affected_status<L: BattleLog + ?Sized>(&self, log: &mut L, target: BattlerId) {
        let affected = self
            .battler(target)
            .is_some_and(|b| b.result().is_status_affected());
        if affected {
            self.display_affected_status(log, target);
            log.push(LogCommand::Clear);
        }
    }

    // ===== indirection =====

    pub fn display_counter<L: BattleLog + ?Sized>(&self, log: &mut L, target: BattlerId) {
        log.push(LogCommand::PerformCounter(target));
        let text = format_message(&self.messages().counter_attack, &[&self.name(target)]);
        log.push(LogCommand::AddText(text));
    }

    pub fn display_reflection<L: BattleLog + ?Sized>(&self, log: &mut L, target: BattlerId) {
        log.push(LogCommand::PerformReflection(target));
        let text = format_message(&self.messages().magic_reflection, &[&self.name(target)]);
        log.push(LogCommand::AddText(text));
    }

    pub fn display_substitute<L: BattleLog + ?Sized>(&self, log: &mut L, substitute: BattlerId, target: BattlerId) {
        log.push(LogCommand::PerformSubstitute { substitute, target });
        let text = format_message(
            &self.messages().substitute,
            &[&self.name(substitute), &self.name(target)],
        );
        log.push(LogCommand::AddText(text));
    }

    // ===== results =====

    /// Full report of `target`'s last result. Unused results print nothing.
    pub fn display_action_results<L: BattleLog + ?Sized>(&self, log: &mut L, subject: BattlerId, target: BattlerId) {
        let Some(battler) = self.battler(target) else {
            return;
        };
        let result = battler.result();
        if !result.used {
            return;
        }
        log.push(LogCommand::PushBaseLine);
        self.display_critical(log, battler, result);
        log.push(LogCommand::PopupDamage(target));
        log.push(LogCommand::PopupDamage(subject));
        self.display_damage(log, battler, result);
        self.display_affected_status(log, target);
        self.display_failure(log, battler, result);
        log.push(LogCommand::WaitForNewLine);
        log.push(LogCommand::PopBaseLine);
    }

    fn display_failure<L: BattleLog + ?Sized>(&self, log: &mut L, target: &dyn Battler, result: &ActionResult) {
        if result.is_hit() && !result.success {
            let text = format_message(&self.messages().action_failure, &[&target.name()]);
            log.push(LogCommand::AddText(text));
        }
    }

    fn display_critical<L: BattleLog + ?Sized>(&self, log: &mut L, target: &dyn Battler, result: &ActionResult) {
        if result.critical {
            let text = if target.is_actor() {
                &self.messages().critical_to_actor
            } else {
                &self.messages().critical_to_enemy
            };
            log.push(LogCommand::AddText(text.clone()));
        }
    }

    fn display_damage<L: BattleLog + ?Sized>(&self, log: &mut L, target: &dyn Battler, result: &ActionResult) {
        if result.missed {
            self.display_miss(log, target, result);
        } else if result.evaded {
            self.display_evasion(log, target, result);
        } else {
            self.display_hp_damage(log, target, result);
            self.display_mp_damage(log, target, result);
            self.display_tp_damage(log, target, result);
        }
    }

    fn display_miss<L: BattleLog + ?Sized>(&self, log: &mut L, target: &dyn Battler, result: &ActionResult) {
        let m = self.messages();
        let template = if result.physical {
            log.push(LogCommand::PerformMiss(target.battler_id()));
            if target.is_actor() { &m.actor_no_hit } else { &m.enemy_no_hit }
        } else {
            &m.action_failure
        };
        log.push(LogCommand::AddText(format_message(template, &[&target.name()])));
    }

    fn display_evasion<L: BattleLog + ?Sized>(&self, log: &mut L, target: &dyn Battler, result: &ActionResult) {
        let m = self.messages();
        let id = target.battler_id();
        let template = if result.physical {
            log.push(LogCommand::PerformEvasion(id));
            &m.evasion
        } else {
            log.push(LogCommand::PerformMagicEvasion(id));
            &m.magic_evasion
        };
        log.push(LogCommand::AddText(format_message(template, &[&target.name()])));
    }

    fn display_hp_damage<L: BattleLog + ?Sized>(&self, log: &mut L, target: &dyn Battler, result: &ActionResult) {
        if !result.hp_affected {
            return;
        }
        let id = target.battler_id();
        if result.hp_damage > 0 && !result.drain {
            log.push(LogCommand::PerformDamage(id));
        }
        if result.hp_damage < 0 {
            log.push(LogCommand::PerformRecovery(id));
        }
        log.push(LogCommand::AddText(self.hp_damage_text(target, result)));
    }

    fn display_mp_damage<L: BattleLog + ?Sized>(&self, log: &mut L, target: &dyn Battler, result: &ActionResult) {
        if target.is_alive() && result.mp_damage != 0 {
            if result.mp_damage < 0 {
                log.push(LogCommand::PerformRecovery(target.battler_id()));
            }
            log.push(LogCommand::AddText(self.mp_damage_text(target, result)));
        }
    }

    fn display_tp_damage<L: BattleLog + ?Sized>(&self, log: &mut L, target: &dyn Battler, result: &ActionResult) {
        if target.is_alive() && result.tp_damage != 0 {
            if result.tp_damage < 0 {
                log.push(LogCommand::PerformRecovery(target.battler_id()));
            }
            log.push(LogCommand::AddText(self.tp_damage_text(target, result)));
        }
    }

    pub fn hp_damage_text(&self, target: &dyn Battler, result: &ActionResult) -> String {
        let m = self.messages();
        let actor = target.is_actor();
        let name = target.name();
        let hp = self.terms().hp();
        let damage = result.hp_damage;
        if damage > 0 && result.drain {
            let template = if actor { &m.actor_drain } else { &m.enemy_drain };
            format_message(template, &[&name, &hp, &damage])
        } else if damage > 0 {
            let template = if actor { &m.actor_damage } else { &m.enemy_damage };
            format_message(template, &[&name, &damage])
        } else if damage < 0 {
            let template = if actor { &m.actor_recovery } else { &m.enemy_recovery };
            format_message(template, &[&name, &hp, &-damage])
        } else {
            let template = if actor { &m.actor_no_damage } else { &m.enemy_no_damage };
            format_message(template, &[&name])
        }
    }

    pub fn mp_damage_text(&self, target: &dyn Battler, result: &ActionResult) -> String {
        let m = self.messages();
        let actor = target.is_actor();
        let name = target.name();
        let mp = self.terms().mp();
        let damage = result.mp_damage;
        if damage > 0 && result.drain {
            let template = if actor { &m.actor_drain } else { &m.enemy_drain };
            format_message(template, &[&name, &mp, &damage])
        } else if damage > 0 {
            let template = if actor { &m.actor_loss } else { &m.enemy_loss };
            format_message(template, &[&name, &mp, &damage])
        } else if damage < 0 {
            let template = if actor { &m.actor_recovery } else { &m.enemy_recovery };
            format_message(template, &[&name, &mp, &-damage])
        } else {
            String::new()
        }
    }

    pub fn tp_damage_text(&self, target: &dyn Battler, result: &ActionResult) -> String {
        let m = self.messages();
        let actor = target.is_actor();
        let name = target.name();
        let tp = self.terms().tp();
        let damage = result.tp_damage;
        if damage > 0 {
            let template = if actor { &m.actor_loss } else { &m.enemy_loss };
            format_message(template, &[&name, &tp, &damage])
        } else if damage < 0 {
            let template = if actor { &m.actor_gain } else { &m.enemy_gain };
            format_message(template, &[&name, &tp, &-damage])
        } else {
            String::new()
        }
    }

    // ===== states and buffs =====

    fn display_affected_status<L: BattleLog + ?Sized>(&self, log: &mut L, target: BattlerId) {
        let Some(battler) = self.battler(target) else {
            return;
        };
        let result = battler.result();
        if !result.is_status_affected() {
            return;
        }
        log.push(LogCommand::PushBaseLine);
        self.display_added_states(log, battler, result);
        self.display_removed_states(log, battler, result);
        let m = self.messages();
        self.display_buffs(log, battler, &result.added_buffs, &m.buff_add);
        self.display_buffs(log, battler, &result.added_debuffs, &m.debuff_add);
        self.display_buffs(log, battler, &result.removed_buffs, &m.buff_remove);
        log.push(LogCommand::WaitForNewLine);
        log.push(LogCommand::PopBaseLine);
    }

    fn display_added_states<L: BattleLog + ?Sized>(&self, log: &mut L, target: &dyn Battler, result: &ActionResult) {
        let id = target.battler_id();
        for state in result.added_states.iter().filter_map(|&s| self.env.state(s)) {
            if state.id == BattleConfig::DEATH_STATE_ID {
                log.push(LogCommand::PerformCollapse {
                    battler: id,
                    kind: CollapseKind::from_flag(target.collapse_type(self.env)),
                });
            }
            let message = if target.is_actor() { &state.message1 } else { &state.message2 };
            if !message.is_empty() {
                log.push(LogCommand::PopBaseLine);
                log.push(LogCommand::PushBaseLine);
                log.push(LogCommand::AddText(format!("{}{message}", target.name())));
                log.push(LogCommand::WaitForEffect);
            }
        }
    }

    fn display_removed_states<L: BattleLog + ?Sized>(&self, log: &mut L, target: &dyn Battler, result: &ActionResult) {
        for state in result.removed_states.iter().filter_map(|&s| self.env.state(s)) {
            if !state.message4.is_empty() {
                log.push(LogCommand::PopBaseLine);
                log.push(LogCommand::PushBaseLine);
                log.push(LogCommand::AddText(format!("{}{}", target.name(), state.message4)));
            }
        }
    }

    fn display_buffs<L: BattleLog + ?Sized>(&self, log: &mut L, target: &dyn Battler, params: &[usize], template: &str) {
        for &param in params {
            log.push(LogCommand::PopBaseLine);
            log.push(LogCommand::PushBaseLine);
            let text = format_message(template, &[&target.name(), &self.terms().param(param)]);
            log.push(LogCommand::AddText(text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battler::BattlerOps;
    use crate::log::RecordingHost;
    use crate::testing::Fixture;

    #[test]
    fn attack_start_shows_weapon_animation_and_waits() {
        let fx = Fixture::new();
        let env = fx.env();
        let units = fx.combatants(&env, Fixture::LONE_SLIME);
        let mut action = Action::new(BattlerId::Actor(Fixture::HERO));
        action.set_attack();
        let mut host = RecordingHost::new();
        Narrator::new(&env, &units).start_action(&mut host, &action, &[BattlerId::Enemy(0)]);
        assert!(host.commands.contains(&LogCommand::ShowAnimation {
            subject: BattlerId::Actor(Fixture::HERO),
            targets: vec![BattlerId::Enemy(0)],
            animation_id: 6,
        }));
        assert_eq!(host.commands.last(), Some(&LogCommand::Wait));
    }

    #[test]
    fn item_use_is_announced() {
        let fx = Fixture::new();
        let env = fx.env();
        let units = fx.combatants(&env, Fixture::LONE_SLIME);
        let mut action = Action::new(BattlerId::Actor(Fixture::HERO));
        action.set_item(Fixture::POTION);
        let mut host = RecordingHost::new();
        Narrator::new(&env, &units).start_action(&mut host, &action, &[]);
        assert_eq!(host.texts(), vec!["Hero uses Potion!"]);
    }

    #[test]
    fn damage_report_names_target_and_amount() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut units = fx.combatants(&env, Fixture::LONE_SLIME);
        if let Some(slime) = units.battler_mut(BattlerId::Enemy(0)) {
            let result = &mut slime.core_mut().result;
            result.used = true;
            result.success = true;
            result.hp_affected = true;
            result.hp_damage = 42;
        }
        let mut host = RecordingHost::new();
        Narrator::new(&env, &units).display_action_results(
            &mut host,
            BattlerId::Actor(Fixture::HERO),
            BattlerId::Enemy(0),
        );
        assert!(host.commands.contains(&LogCommand::PerformDamage(BattlerId::Enemy(0))));
        assert_eq!(host.texts(), vec!["Slime took 42 damage!"]);
    }

    #[test]
    fn unused_result_prints_nothing() {
        let fx = Fixture::new();
        let env = fx.env();
        let units = fx.combatants(&env, Fixture::LONE_SLIME);
        let mut host = RecordingHost::new();
        Narrator::new(&env, &units).display_action_results(
            &mut host,
            BattlerId::Actor(Fixture::HERO),
            BattlerId::Enemy(0),
        );
        assert!(host.commands.is_empty());
    }

    #[test]
    fn physical_miss_uses_no_hit_text() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut units = fx.combatants(&env, Fixture::LONE_SLIME);
        if let Some(hero) = units.battler_mut(BattlerId::Actor(Fixture::HERO)) {
            let result = &mut hero.core_mut().result;
            result.used = true;
            result.missed = true;
            result.physical = true;
        }
        let mut host = RecordingHost::new();
        Narrator::new(&env, &units).display_action_results(
            &mut host,
            BattlerId::Enemy(0),
            BattlerId::Actor(Fixture::HERO),
        );
        assert!(host.commands.contains(&LogCommand::PerformMiss(BattlerId::Actor(Fixture::HERO))));
        assert_eq!(host.texts(), vec!["Miss! Hero took no damage!"]);
    }

    #[test]
    fn knockout_collapses_the_battler() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut units = fx.combatants(&env, Fixture::LONE_SLIME);
        if let Some(slime) = units.battler_mut(BattlerId::Enemy(0)) {
            slime.clear_result();
            slime.add_state(&env, BattleConfig::DEATH_STATE_ID);
        }
        let mut host = RecordingHost::new();
        Narrator::new(&env, &units).display_auto_affected_status(&mut host, BattlerId::Enemy(0));
        assert!(host.commands.contains(&LogCommand::PerformCollapse {
            battler: BattlerId::Enemy(0),
            kind: CollapseKind::Normal,
        }));
        assert_eq!(host.commands.last(), Some(&LogCommand::Clear));
    }

    #[test]
    fn drain_and_recovery_texts() {
        let fx = Fixture::new();
        let env = fx.env();
        let units = fx.combatants(&env, Fixture::LONE_SLIME);
        let narrator = Narrator::new(&env, &units);
        let hero = units.battler(BattlerId::Actor(Fixture::HERO)).unwrap();
        let drained = ActionResult {
            hp_damage: 30,
            drain: true,
            ..ActionResult::default()
        };
        assert_eq!(narrator.hp_damage_text(hero, &drained), "Hero was drained of HP 30!");
        let healed = ActionResult {
            hp_damage: -15,
            ..ActionResult::default()
        };
        assert_eq!(narrator.hp_damage_text(hero, &healed), "Hero recovered HP 15!");
        let tp = ActionResult {
            tp_damage: -5,
            ..ActionResult::default()
        };
        assert_eq!(narrator.tp_damage_text(hero, &tp), "Hero gained TP 5!");
    }
}
