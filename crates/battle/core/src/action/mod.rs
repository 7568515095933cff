//! Action domain: one queued skill or item use and its resolution.
//!
//! # Module Structure
//!
//! - `targets`: scope-based target lists, confusion targets, repeats
//! - `damage`: hit/evasion/critical chances and the damage value pipeline
//! - `apply`: per-target resolution writing into the target's result
//! - `evaluate`: auto-battle scoring of candidate actions
//! - `planner`: filling battler queues (auto battle, confusion, enemy
//!   patterns)
//!
//! An [`Action`] stores ids only. Every operation takes the [`BattleEnv`] to
//! resolve the item and the [`Combatants`] to reach subject and targets, so
//! the queue can live inside the battler it belongs to.
mod apply;
mod damage;
mod evaluate;
mod planner;
mod targets;

pub use damage::BattlerScope;
pub use planner::{best_auto_action, make_actions, make_actor_actions, make_enemy_actions};

use tracing::trace;

use crate::battler::{Battler, BattlerId, BattlerStats, UseContext};
use crate::config::BattleConfig;
use crate::data::{EnemyAction, UsableItem};
use crate::env::BattleEnv;
use crate::unit::Combatants;

/// Skill or item an action uses, by database id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionItem {
    Skill(u32),
    Item(u32),
}

/// One queued action of a battler.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Action {
    subject: BattlerId,
    forcing: bool,
    item: Option<ActionItem>,
    /// Member index inside the targeted unit; -1 while undecided.
    target_index: i32,
    /// Drain credit goes here instead of the subject while set.
    #[cfg_attr(feature = "serde", serde(skip))]
    reflection_target: Option<BattlerId>,
}

impl Action {
    pub const fn new(subject: BattlerId) -> Self {
        Self {
            subject,
            forcing: false,
            item: None,
            target_index: -1,
            reflection_target: None,
        }
    }

    /// Action injected by a battle event; skips the usability check and
    /// confusion.
    pub const fn forced(subject: BattlerId) -> Self {
        let mut action = Self::new(subject);
        action.forcing = true;
        action
    }

    pub const fn subject(&self) -> BattlerId {
        self.subject
    }

    pub const fn is_forcing(&self) -> bool {
        self.forcing
    }

    pub fn clear(&mut self) {
        self.item = None;
        self.target_index = -1;
    }

    pub fn set_skill(&mut self, skill_id: u32) {
        self.item = Some(ActionItem::Skill(skill_id));
    }

    pub fn set_item(&mut self, item_id: u32) {
        self.item = Some(ActionItem::Item(item_id));
    }

    pub fn set_attack(&mut self) {
        self.set_skill(BattleConfig::ATTACK_SKILL_ID);
    }

    pub fn set_guard(&mut self) {
        self.set_skill(BattleConfig::GUARD_SKILL_ID);
    }

    /// Confused battlers always attack; the target is picked at
    /// [`make_targets`](Self::make_targets) time.
    pub fn set_confusion(&mut self) {
        self.set_attack();
    }

    /// `None` clears the action.
    pub fn set_enemy_action(&mut self, action: Option<&EnemyAction>) {
        match action {
            Some(action) => self.set_skill(action.skill_id),
            None => self.clear(),
        }
    }

    pub fn set_target(&mut self, target_index: i32) {
        self.target_index = target_index;
    }

    pub const fn target_index(&self) -> i32 {
        self.target_index
    }

    pub const fn item_ref(&self) -> Option<ActionItem> {
        self.item
    }

    pub const fn reflection_target(&self) -> Option<BattlerId> {
        self.reflection_target
    }

    pub fn set_reflection_target(&mut self, target: Option<BattlerId>) {
        self.reflection_target = target;
    }

    /// The referenced record, or `None` when unset or missing from the
    /// database.
    pub fn item<'a>(&self, env: &BattleEnv<'a>) -> Option<UsableItem<'a>> {
        match self.item? {
            ActionItem::Skill(id) => env.skill_item(id),
            ActionItem::Item(id) => env.item_item(id),
        }
    }

    pub fn is_skill(&self) -> bool {
        matches!(self.item, Some(ActionItem::Skill(_)))
    }

    pub fn is_item(&self) -> bool {
        matches!(self.item, Some(ActionItem::Item(_)))
    }

    pub fn is_attack(&self) -> bool {
        self.item == Some(ActionItem::Skill(BattleConfig::ATTACK_SKILL_ID))
    }

    pub fn is_guard(&self) -> bool {
        self.item == Some(ActionItem::Skill(BattleConfig::GUARD_SKILL_ID))
    }

    pub fn is_magic_skill(&self, env: &BattleEnv<'_>) -> bool {
        match self.item(env) {
            Some(UsableItem::Skill(skill)) => env.system().magic_skills.contains(&skill.stype_id),
            _ => false,
        }
    }

    pub fn is_certain_hit(&self, env: &BattleEnv<'_>) -> bool {
        self.item(env).is_some_and(|item| item.is_certain_hit())
    }

    pub fn is_physical(&self, env: &BattleEnv<'_>) -> bool {
        self.item(env).is_some_and(|item| item.is_physical())
    }

    pub fn is_magical(&self, env: &BattleEnv<'_>) -> bool {
        self.item(env).is_some_and(|item| item.is_magical())
    }

    pub fn is_for_opponent(&self, env: &BattleEnv<'_>) -> bool {
        self.item(env).is_some_and(|item| item.scope().is_for_opponent())
    }

    pub fn is_for_friend(&self, env: &BattleEnv<'_>) -> bool {
        self.item(env).is_some_and(|item| item.scope().is_for_friend())
    }

    pub fn is_for_dead_friend(&self, env: &BattleEnv<'_>) -> bool {
        self.item(env).is_some_and(|item| item.scope().is_for_dead_friend())
    }

    pub fn is_for_user(&self, env: &BattleEnv<'_>) -> bool {
        self.item(env).is_some_and(|item| item.scope().is_for_user())
    }

    pub fn is_for_one(&self, env: &BattleEnv<'_>) -> bool {
        self.item(env).is_some_and(|item| item.scope().is_for_one())
    }

    pub fn is_for_random(&self, env: &BattleEnv<'_>) -> bool {
        self.item(env).is_some_and(|item| item.scope().is_for_random())
    }

    pub fn is_for_all(&self, env: &BattleEnv<'_>) -> bool {
        self.item(env).is_some_and(|item| item.scope().is_for_all())
    }

    pub fn needs_selection(&self, env: &BattleEnv<'_>) -> bool {
        self.item(env).is_some_and(|item| item.scope().needs_selection())
    }

    pub fn num_targets(&self, env: &BattleEnv<'_>) -> usize {
        self.item(env).map_or(0, |item| item.scope().random_count())
    }

    /// Item repeats, plus the subject's extra attack times for attacks.
    pub fn num_repeats<B: Battler + ?Sized>(&self, env: &BattleEnv<'_>, subject: &B) -> usize {
        let Some(item) = self.item(env) else {
            return 0;
        };
        let mut repeats = f64::from(item.repeats());
        if self.is_attack() {
            repeats += subject.attack_times_add(env);
        }
        repeats.floor().max(0.0) as usize
    }

    /// Forced actions only need an item; others must be usable by the
    /// subject right now.
    pub fn is_valid<B: Battler + ?Sized>(
        &self,
        env: &BattleEnv<'_>,
        subject: &B,
        ctx: &UseContext<'_>,
    ) -> bool {
        match self.item(env) {
            Some(item) => self.forcing || subject.can_use(env, item, ctx),
            None => false,
        }
    }

    /// Draws `randomInt(floor(5 + agi / 4))` for jitter.
    pub fn speed<B: Battler + ?Sized>(&self, env: &BattleEnv<'_>, subject: &B) -> i32 {
        let agi = subject.agi(env);
        let jitter = (5.0 + f64::from(agi) / 4.0).floor() as i32;
        let mut speed = agi + env.random_int(jitter);
        if let Some(item) = self.item(env) {
            speed += item.speed();
        }
        if self.is_attack() {
            speed += subject.attack_speed(env) as i32;
        }
        speed
    }

    /// Confused subjects turn unforced actions into attacks.
    pub fn prepare<B: Battler + ?Sized>(&mut self, env: &BattleEnv<'_>, subject: &B) {
        if subject.is_confused(env) && !self.forcing {
            self.set_confusion();
        }
    }

    /// Fixes the target index ahead of time for actions that were not given
    /// one (forced actions with index -2, enemy single-target actions).
    pub fn decide_random_target(&mut self, env: &BattleEnv<'_>, units: &Combatants) {
        let target = if self.is_for_dead_friend(env) {
            units.friends_of(self.subject).random_dead_target(env)
        } else if self.is_for_friend(env) {
            units.friends_of(self.subject).random_target(env)
        } else {
            units.opponents_of(self.subject).random_target(env)
        };
        match target.and_then(|id| units.friends_of(id).index_of(id)) {
            Some(index) => self.target_index = index as i32,
            None => self.clear(),
        }
        trace!(subject = ?self.subject, target_index = self.target_index, "random target decided");
    }

    /// Common events reserved by the item, run once per action.
    pub fn common_events(&self, env: &BattleEnv<'_>) -> Vec<u32> {
        self.item(env)
            .map(|item| {
                item.effects()
                    .iter()
                    .filter(|effect| effect.code == crate::data::EffectCode::CommonEvent)
                    .map(|effect| effect.data_id)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battler::Actor;
    use crate::testing::Fixture;

    #[test]
    fn enemy_action_none_clears() {
        let mut action = Action::new(BattlerId::Enemy(0));
        action.set_skill(3);
        action.set_target(2);
        action.set_enemy_action(None);
        assert_eq!(action.item_ref(), None);
        assert_eq!(action.target_index(), -1);
    }

    #[test]
    fn unknown_item_is_never_valid() {
        let fx = Fixture::new();
        let env = fx.env();
        let hero = Actor::new(&env, Fixture::HERO).unwrap();
        let ctx = UseContext::battle(&fx.inventory, true);
        let mut action = Action::forced(hero.battler_id());
        action.set_skill(404);
        assert!(!action.is_valid(&env, &hero, &ctx));
        action.set_attack();
        assert!(action.is_valid(&env, &hero, &ctx));
    }

    #[test]
    fn speed_adds_jitter_and_item_speed() {
        let fx = Fixture::with_rolls(&[0.0, 0.99]);
        let env = fx.env();
        let hero = Actor::new(&env, Fixture::HERO).unwrap();
        let agi = hero.agi(&env);
        let mut action = Action::new(hero.battler_id());
        action.set_attack();
        assert_eq!(action.speed(&env, &hero), agi);
        let jitter = (5.0 + f64::from(agi) / 4.0).floor() as i32;
        assert_eq!(action.speed(&env, &hero), agi + jitter - 1);
    }

    #[test]
    fn attack_repeats_include_extra_attack_times() {
        let fx = Fixture::new();
        let env = fx.env();
        let hero = Actor::new(&env, Fixture::HERO).unwrap();
        let mut action = Action::new(hero.battler_id());
        assert_eq!(action.num_repeats(&env, &hero), 0);
        action.set_attack();
        assert_eq!(action.num_repeats(&env, &hero), 1);
    }

    #[test]
    fn fire_is_a_magic_skill() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut action = Action::new(BattlerId::Actor(Fixture::HERO));
        action.set_skill(Fixture::FIRE);
        assert!(action.is_magic_skill(&env));
        action.set_attack();
        assert!(!action.is_magic_skill(&env));
        assert!(action.is_physical(&env));
    }
}
