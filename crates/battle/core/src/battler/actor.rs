//! Party member: class-based parameters, equipment, experience and skills.

use std::collections::BTreeMap;

use tracing::debug;

use super::{Battler, BattlerCore, BattlerId, BattlerOps, BattlerStats, ParamId, SParamId};
use super::{UseContext, round_half_up};
use crate::action::Action;
use crate::data::{ArmorData, ClassData, EquipItem, SkillData, Trait, WeaponData};
use crate::env::{BattleEnv, DataOracle};
use crate::error::SetupError;
use crate::unit::Inventory;

/// Levels gained by one experience change, for the level-up message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelUp {
    pub actor_id: u32,
    pub level: i32,
    /// Skills known now that were not known before the change.
    pub new_skills: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Actor {
    core: BattlerCore,
    actor_id: u32,
    name: String,
    nickname: String,
    class_id: u32,
    level: i32,
    /// Experience per class id; switching classes keeps each total.
    exp: BTreeMap<u32, i64>,
    /// Learned skill ids, ascending.
    skills: Vec<u32>,
    /// One entry per equipment slot.
    equips: Vec<Option<EquipItem>>,
}

impl Actor {
    /// Builds the actor from its database row: initial level, experience,
    /// learnings up to that level, initial equipment, full HP/MP.
    pub fn new(env: &BattleEnv<'_>, actor_id: u32) -> Result<Self, SetupError> {
        let data = env
            .data()
            .actor(actor_id)
            .ok_or(SetupError::ActorNotFound(actor_id))?;
        let class = env
            .data()
            .class(data.class_id)
            .ok_or(SetupError::ClassNotFound {
                actor_id,
                class_id: data.class_id,
            })?;

        let mut actor = Self {
            core: BattlerCore::new(),
            actor_id,
            name: data.name.clone(),
            nickname: data.nickname.clone(),
            class_id: data.class_id,
            level: data.initial_level,
            exp: BTreeMap::new(),
            skills: Vec::new(),
            equips: Vec::new(),
        };
        actor.exp.insert(actor.class_id, class.exp_for_level(actor.level));
        for learning in &class.learnings {
            if learning.level <= actor.level {
                actor.learn_skill(learning.skill_id);
            }
        }
        actor.init_equips(env, &data.equips);
        actor.core.param_plus = [0; 8];
        actor.recover_all(env);
        Ok(actor)
    }

    pub fn actor_id(&self) -> u32 {
        self.actor_id
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn class_id(&self) -> u32 {
        self.class_id
    }

    fn current_class<'a>(&self, data: &'a dyn DataOracle) -> Option<&'a ClassData> {
        data.class(self.class_id)
    }

    // ===== equipment =====

    /// Equipment type of every slot. Dual wielders carry a weapon in the
    /// second slot.
    pub fn equip_slots(&self, env: &BattleEnv<'_>) -> Vec<u32> {
        let mut slots = env.system().equip_slots();
        if slots.len() >= 2 && self.is_dual_wield(env) {
            slots[1] = 1;
        }
        slots
    }

    pub fn equips(&self) -> &[Option<EquipItem>] {
        &self.equips
    }

    pub fn weapons<'a>(&self, data: &'a dyn DataOracle) -> Vec<&'a WeaponData> {
        self.equips
            .iter()
            .flatten()
            .filter_map(|item| match item {
                EquipItem::Weapon(id) => data.weapon(*id),
                EquipItem::Armor(_) => None,
            })
            .collect()
    }

    pub fn armors<'a>(&self, data: &'a dyn DataOracle) -> Vec<&'a ArmorData> {
        self.equips
            .iter()
            .flatten()
            .filter_map(|item| match item {
                EquipItem::Armor(id) => data.armor(*id),
                EquipItem::Weapon(_) => None,
            })
            .collect()
    }

    pub fn is_wtype_equipped(&self, data: &dyn DataOracle, wtype_id: u32) -> bool {
        self.weapons(data).iter().any(|w| w.wtype_id == wtype_id)
    }

    /// Summed parameter bonuses of everything equipped.
    fn equip_params(&self, data: &dyn DataOracle) -> [i32; 8] {
        let mut total = [0; 8];
        for item in self.equips.iter().flatten() {
            let params = match item {
                EquipItem::Weapon(id) => data.weapon(*id).map(|w| w.params),
                EquipItem::Armor(id) => data.armor(*id).map(|a| a.params),
            };
            for (sum, value) in total.iter_mut().zip(params.unwrap_or_default()) {
                *sum += value;
            }
        }
        total
    }

    fn equip_type_of(data: &dyn DataOracle, item: EquipItem) -> Option<u32> {
        match item {
            EquipItem::Weapon(id) => data.weapon(id).map(|w| w.etype_id),
            EquipItem::Armor(id) => data.armor(id).map(|a| a.etype_id),
        }
    }

    pub fn can_equip(&self, env: &BattleEnv<'_>, item: EquipItem) -> bool {
        match item {
            EquipItem::Weapon(id) => env.data().weapon(id).is_some_and(|w| {
                self.is_equip_wtype_ok(env, w.wtype_id) && !self.is_equip_type_sealed(env, w.etype_id)
            }),
            EquipItem::Armor(id) => env.data().armor(id).is_some_and(|a| {
                self.is_equip_atype_ok(env, a.atype_id) && !self.is_equip_type_sealed(env, a.etype_id)
            }),
        }
    }

    pub fn is_equip_change_ok(&self, env: &BattleEnv<'_>, slot_id: usize) -> bool {
        self.equip_slots(env).get(slot_id).is_some_and(|&etype| {
            !self.is_equip_type_locked(env, etype) && !self.is_equip_type_sealed(env, etype)
        })
    }

    fn init_equips(&mut self, env: &BattleEnv<'_>, initial: &[u32]) {
        let slots = self.equip_slots(env);
        self.equips = vec![None; slots.len()];
        for (slot, (&etype, &id)) in slots.iter().zip(initial).enumerate() {
            if id > 0 {
                self.equips[slot] = Some(if etype == 1 {
                    EquipItem::Weapon(id)
                } else {
                    EquipItem::Armor(id)
                });
            }
        }
        self.release_unequippable_items(env);
        self.refresh(env);
    }

    /// Swaps the item in `slot_id`, trading with the party inventory. Fails
    /// when the new item is not owned or does not fit the slot.
    pub fn change_equip(
        &mut self,
        env: &BattleEnv<'_>,
        slot_id: usize,
        item: Option<EquipItem>,
        inventory: &mut Inventory,
    ) -> bool {
        let Some(&etype) = self.equip_slots(env).get(slot_id) else {
            return false;
        };
        if let Some(new) = item {
            if !inventory.has_equip(new) || Self::equip_type_of(env.data(), new) != Some(etype) {
                return false;
            }
            inventory.lose_equip(new, 1);
        }
        if let Some(old) = self.equips.get(slot_id).copied().flatten() {
            inventory.gain_equip(old, 1);
        }
        self.equips[slot_id] = item;
        for released in self.release_unequippable_items(env) {
            inventory.gain_equip(released, 1);
        }
        self.refresh(env);
        true
    }

    /// Puts `item` in `slot_id` without touching the inventory.
    pub fn force_change_equip(&mut self, env: &BattleEnv<'_>, slot_id: usize, item: Option<EquipItem>) {
        if let Some(slot) = self.equips.get_mut(slot_id) {
            *slot = item;
            self.release_unequippable_items(env);
            self.refresh(env);
        }
    }

    /// Empties slots whose item no longer fits (wrong slot type or a lost
    /// equip trait) until the set is stable. Returns the removed items.
    pub fn release_unequippable_items(&mut self, env: &BattleEnv<'_>) -> Vec<EquipItem> {
        let mut released = Vec::new();
        loop {
            let slots = self.equip_slots(env);
            let mut changed = false;
            for slot in 0..self.equips.len() {
                let Some(item) = self.equips[slot] else {
                    continue;
                };
                let fits = slots.get(slot).copied() == Self::equip_type_of(env.data(), item);
                if !fits || !self.can_equip(env, item) {
                    debug!(actor = self.actor_id, ?item, slot, "released unequippable item");
                    self.equips[slot] = None;
                    released.push(item);
                    changed = true;
                }
            }
            if !changed {
                return released;
            }
        }
    }

    /// Animation of the main-hand attack; bare hands use animation 1.
    pub fn attack_animation_id(&self, data: &dyn DataOracle) -> i32 {
        if self.has_no_weapons(data) {
            1
        } else {
            self.weapons(data).first().map_or(0, |w| w.animation_id)
        }
    }

    pub fn offhand_animation_id(&self, data: &dyn DataOracle) -> i32 {
        self.weapons(data).get(1).map_or(0, |w| w.animation_id)
    }

    // ===== experience and levels =====

    pub fn exp_for_level(&self, data: &dyn DataOracle, level: i32) -> i64 {
        self.current_class(data).map_or(0, |class| class.exp_for_level(level))
    }

    pub fn current_exp(&self) -> i64 {
        self.exp.get(&self.class_id).copied().unwrap_or(0)
    }

    pub fn current_level_exp(&self, data: &dyn DataOracle) -> i64 {
        self.exp_for_level(data, self.level)
    }

    pub fn next_level_exp(&self, data: &dyn DataOracle) -> i64 {
        self.exp_for_level(data, self.level + 1)
    }

    pub fn next_required_exp(&self, data: &dyn DataOracle) -> i64 {
        self.next_level_exp(data) - self.current_exp()
    }

    pub fn max_level(&self, data: &dyn DataOracle) -> i32 {
        data.actor(self.actor_id).map_or(99, |actor| actor.max_level)
    }

    pub fn is_max_level(&self, data: &dyn DataOracle) -> bool {
        self.level >= self.max_level(data)
    }

    /// Sets the class experience total and moves the level to match.
    ///
    /// Experience keeps accumulating past the level cap; only the level
    /// stops. Returns the level-up report when `show` is set and the level
    /// rose.
    pub fn change_exp(&mut self, env: &BattleEnv<'_>, exp: i64, show: bool) -> Option<LevelUp> {
        let data = env.data();
        self.exp.insert(self.class_id, exp.max(0));
        let last_level = self.level;
        let last_skills = self.skills(env);
        while !self.is_max_level(data) && self.current_exp() >= self.next_level_exp(data) {
            self.level_up(data);
        }
        while self.level > 1 && self.current_exp() < self.current_level_exp(data) {
            self.level_down();
        }
        self.refresh(env);
        if self.level != last_level {
            debug!(actor = self.actor_id, from = last_level, to = self.level, "level changed");
        }
        (show && self.level > last_level).then(|| LevelUp {
            actor_id: self.actor_id,
            level: self.level,
            new_skills: self
                .skills(env)
                .into_iter()
                .filter(|id| !last_skills.contains(id))
                .collect(),
        })
    }

    pub fn level_up(&mut self, data: &dyn DataOracle) {
        self.level += 1;
        let learned: Vec<u32> = self
            .current_class(data)
            .map(|class| {
                class
                    .learnings
                    .iter()
                    .filter(|l| l.level == self.level)
                    .map(|l| l.skill_id)
                    .collect()
            })
            .unwrap_or_default();
        for skill_id in learned {
            self.learn_skill(skill_id);
        }
    }

    pub fn level_down(&mut self) {
        self.level -= 1;
    }

    /// Experience multiplier: `exr`, and nothing for bench members unless
    /// bench experience is enabled.
    pub fn final_exp_rate(&self, env: &BattleEnv<'_>, battle_member: bool) -> f64 {
        let bench = if battle_member || env.config().bench_exp { 1.0 } else { 0.0 };
        self.sparam(env, SParamId::Exr) * bench
    }

    pub fn gain_exp(&mut self, env: &BattleEnv<'_>, exp: i64, battle_member: bool) -> Option<LevelUp> {
        let gained = round_half_up(exp as f64 * self.final_exp_rate(env, battle_member)) as i64;
        let total = self.current_exp() + gained;
        self.change_exp(env, total, true)
    }

    pub fn change_level(&mut self, env: &BattleEnv<'_>, level: i32, show: bool) -> Option<LevelUp> {
        let level = level.clamp(1, self.max_level(env.data()));
        let exp = self.exp_for_level(env.data(), level);
        self.change_exp(env, exp, show)
    }

    // ===== skills =====

    pub fn forget_skill(&mut self, skill_id: u32) {
        self.skills.retain(|&id| id != skill_id);
    }

    /// Learned skills followed by skills added through traits, deduplicated.
    pub fn skills(&self, env: &BattleEnv<'_>) -> Vec<u32> {
        let mut list = self.skills.clone();
        for id in self.added_skills(env) {
            if !list.contains(&id) {
                list.push(id);
            }
        }
        list
    }

    pub fn has_skill(&self, env: &BattleEnv<'_>, skill_id: u32) -> bool {
        self.skills(env).contains(&skill_id)
    }

    pub fn usable_skills<'a>(&self, env: &BattleEnv<'a>, ctx: &UseContext<'_>) -> Vec<&'a SkillData> {
        self.skills(env)
            .into_iter()
            .filter_map(|id| env.data().skill(id))
            .filter(|skill| self.meets_skill_conditions(env, skill, ctx))
            .collect()
    }

    // ===== command input =====

    pub fn action_input_index(&self) -> usize {
        self.core.action_input_index
    }

    pub fn inputting_action(&self) -> Option<&Action> {
        self.core.actions.get(self.core.action_input_index)
    }

    pub fn inputting_action_mut(&mut self) -> Option<&mut Action> {
        self.core.actions.get_mut(self.core.action_input_index)
    }

    /// Moves the input cursor to the next action slot, if any.
    pub fn select_next_command(&mut self) -> bool {
        if self.core.action_input_index + 1 < self.num_actions() {
            self.core.action_input_index += 1;
            true
        } else {
            false
        }
    }

    pub fn select_previous_command(&mut self) -> bool {
        if self.core.action_input_index > 0 {
            self.core.action_input_index -= 1;
            true
        } else {
            false
        }
    }
}

impl Battler for Actor {
    fn core(&self) -> &BattlerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BattlerCore {
        &mut self.core
    }

    fn battler_id(&self) -> BattlerId {
        BattlerId::Actor(self.actor_id)
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn level(&self) -> Option<i32> {
        Some(self.level)
    }

    fn param_base(&self, data: &dyn DataOracle, param: ParamId) -> i32 {
        self.current_class(data)
            .map_or(0, |class| class.param_at(param.index(), self.level))
    }

    fn param_plus(&self, data: &dyn DataOracle, param: ParamId) -> i32 {
        self.core.param_plus[param.index()] + self.equip_params(data)[param.index()]
    }

    fn param_max(&self, param: ParamId) -> i32 {
        match param {
            ParamId::Mhp | ParamId::Mmp => 9999,
            _ => 999,
        }
    }

    fn trait_objects<'a>(&'a self, data: &'a dyn DataOracle) -> Vec<&'a [Trait]> {
        let mut objects = self.core.state_traits(data);
        if let Some(actor) = data.actor(self.actor_id) {
            objects.push(&actor.traits);
        }
        if let Some(class) = self.current_class(data) {
            objects.push(&class.traits);
        }
        for item in self.equips.iter().flatten() {
            match item {
                EquipItem::Weapon(id) => {
                    if let Some(weapon) = data.weapon(*id) {
                        objects.push(&weapon.traits);
                    }
                }
                EquipItem::Armor(id) => {
                    if let Some(armor) = data.armor(*id) {
                        objects.push(&armor.traits);
                    }
                }
            }
        }
        objects
    }

    fn has_no_weapons(&self, data: &dyn DataOracle) -> bool {
        self.weapons(data).is_empty()
    }

    fn is_skill_wtype_ok(&self, data: &dyn DataOracle, skill: &SkillData) -> bool {
        let (w1, w2) = (skill.required_wtype_id1, skill.required_wtype_id2);
        (w1 == 0 && w2 == 0)
            || (w1 > 0 && self.is_wtype_equipped(data, w1))
            || (w2 > 0 && self.is_wtype_equipped(data, w2))
    }

    fn is_learned_skill(&self, skill_id: u32) -> bool {
        self.skills.contains(&skill_id)
    }

    fn learn_skill(&mut self, skill_id: u32) {
        if let Err(pos) = self.skills.binary_search(&skill_id) {
            self.skills.insert(pos, skill_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    #[test]
    fn setup_fills_vitals_and_learns_initial_skills() {
        let fx = Fixture::new();
        let env = fx.env();
        let actor = Actor::new(&env, Fixture::HERO).unwrap();
        assert_eq!(actor.level(), Some(1));
        assert_eq!(actor.hp(), actor.mhp(&env));
        assert_eq!(actor.mp(), actor.mmp(&env));
        assert!(actor.is_learned_skill(Fixture::FIRE));
        assert!(!actor.is_learned_skill(Fixture::HEAL));
    }

    #[test]
    fn escape_skill_needs_an_escapable_battle() {
        use crate::data::{Effect, EffectCode, Occasion, UsableItem};

        let mut fx = Fixture::new();
        fx.database.skills.insert(
            9,
            SkillData {
                id: 9,
                name: "Flee".into(),
                occasion: Occasion::Always,
                effects: vec![Effect::new(EffectCode::Special, 0, 0.0, 0.0)],
                ..SkillData::default()
            },
        );
        let env = fx.env();
        let hero = Actor::new(&env, Fixture::HERO).unwrap();
        let flee = UsableItem::Skill(env.data().skill(9).unwrap());
        let inventory = Inventory::default();

        assert!(hero.can_use(&env, flee, &UseContext::battle(&inventory, true)));
        assert!(!hero.can_use(&env, flee, &UseContext::battle(&inventory, false)));
        assert!(hero.can_use(&env, flee, &UseContext::menu(&inventory)));
    }

    #[test]
    fn empty_action_queue_makes_the_fastest_speed() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut hero = Actor::new(&env, Fixture::HERO).unwrap();
        hero.clear_actions();
        hero.make_speed(&env);
        assert_eq!(hero.speed(), i32::MAX);
    }

    #[test]
    fn escape_hides_only_in_battle() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut hero = Actor::new(&env, Fixture::HERO).unwrap();
        assert!(hero.add_state(&env, Fixture::POISON_STATE));

        hero.escape(false);
        assert!(!hero.is_hidden());
        assert!(hero.states().is_empty());

        hero.escape(true);
        assert!(hero.is_hidden());
    }

    #[test]
    fn missing_rows_are_setup_errors() {
        let fx = Fixture::new();
        let env = fx.env();
        assert_eq!(Actor::new(&env, 99).unwrap_err(), SetupError::ActorNotFound(99));
    }

    #[test]
    fn weapon_params_add_to_attack() {
        let fx = Fixture::new();
        let env = fx.env();
        let actor = Actor::new(&env, Fixture::HERO).unwrap();
        assert!(!actor.has_no_weapons(env.data()));
        let base = actor.param_base(env.data(), ParamId::Atk);
        assert_eq!(actor.atk(&env), base + 10);
    }

    #[test]
    fn unequippable_weapon_is_released() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut actor = Actor::new(&env, Fixture::MAGE).unwrap();
        actor.force_change_equip(&env, 0, Some(EquipItem::Weapon(Fixture::SWORD)));
        assert_eq!(actor.equips()[0], None);
        assert_eq!(actor.attack_elements(&env), vec![1]);
    }

    #[test]
    fn experience_crosses_levels_and_reports_new_skills() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut actor = Actor::new(&env, Fixture::HERO).unwrap();
        let target = actor.exp_for_level(env.data(), 3);
        let report = actor.gain_exp(&env, target, true).unwrap();
        assert_eq!(report.level, 3);
        assert_eq!(report.new_skills, vec![Fixture::HEAL]);
        assert!(actor.change_level(&env, 1, true).is_none());
        assert_eq!(actor.level(), Some(1));
    }

    #[test]
    fn bench_members_gain_nothing_by_default() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut actor = Actor::new(&env, Fixture::HERO).unwrap();
        let before = actor.current_exp();
        assert!(actor.gain_exp(&env, 500, false).is_none());
        assert_eq!(actor.current_exp(), before);
    }

    #[test]
    fn level_is_capped_but_exp_accumulates() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut actor = Actor::new(&env, Fixture::HERO).unwrap();
        actor.change_level(&env, 50, false);
        assert_eq!(actor.level(), Some(actor.max_level(env.data())));
        let exp = actor.current_exp();
        actor.gain_exp(&env, 1000, true);
        assert_eq!(actor.current_exp(), exp + 1000);
        assert!(actor.is_max_level(env.data()));
    }

    #[test]
    fn input_cursor_stays_in_range() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut actor = Actor::new(&env, Fixture::HERO).unwrap();
        actor.push_action(Action::new(actor.battler_id()));
        actor.push_action(Action::new(actor.battler_id()));
        assert!(!actor.select_previous_command());
        assert!(actor.select_next_command());
        assert!(!actor.select_next_command());
        assert_eq!(actor.action_input_index(), 1);
        actor.clear_actions();
        assert_eq!(actor.action_input_index(), 0);
    }
}
