//! Troop member: parameters from the enemy table, rewards and action
//! patterns.

use super::{Battler, BattlerCore, BattlerId, BattlerOps, BattlerStats, ParamId, UseContext};
use crate::data::{ConditionType, DropKind, EnemyAction, EnemyData, EquipItem, Trait};
use crate::env::{BattleEnv, DataOracle};
use crate::error::SetupError;

/// A dropped reward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DropReward {
    Item(u32),
    Equip(EquipItem),
}

/// Battle-wide facts an enemy's action conditions read.
#[derive(Clone, Copy, Debug, Default)]
pub struct PatternContext {
    pub turn_count: u32,
    pub party_highest_level: i32,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Enemy {
    core: BattlerCore,
    index: usize,
    enemy_id: u32,
    original_name: String,
    letter: String,
    plural: bool,
    screen_x: i32,
    screen_y: i32,
}

impl Enemy {
    pub fn new(
        env: &BattleEnv<'_>,
        index: usize,
        enemy_id: u32,
        screen_x: i32,
        screen_y: i32,
    ) -> Result<Self, SetupError> {
        let data = env
            .data()
            .enemy(enemy_id)
            .ok_or(SetupError::EnemyNotFound(enemy_id))?;
        let mut enemy = Self {
            core: BattlerCore::new(),
            index,
            enemy_id,
            original_name: data.name.clone(),
            letter: String::new(),
            plural: false,
            screen_x,
            screen_y,
        };
        enemy.recover_all(env);
        Ok(enemy)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn enemy_id(&self) -> u32 {
        self.enemy_id
    }

    pub fn screen_position(&self) -> (i32, i32) {
        (self.screen_x, self.screen_y)
    }

    fn data<'a>(&self, data: &'a dyn DataOracle) -> Option<&'a EnemyData> {
        data.enemy(self.enemy_id)
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn letter(&self) -> &str {
        &self.letter
    }

    pub fn is_letter_empty(&self) -> bool {
        self.letter.is_empty()
    }

    pub fn set_letter(&mut self, letter: impl Into<String>) {
        self.letter = letter.into();
    }

    /// Whether another enemy in the troop shares this one's original name.
    pub fn is_plural(&self) -> bool {
        self.plural
    }

    pub fn set_plural(&mut self, plural: bool) {
        self.plural = plural;
    }

    pub fn exp(&self, data: &dyn DataOracle) -> i32 {
        self.data(data).map_or(0, |e| e.exp)
    }

    pub fn gold(&self, data: &dyn DataOracle) -> i32 {
        self.data(data).map_or(0, |e| e.gold)
    }

    /// Rolls every drop slot: each drops when `random * denominator` falls
    /// under the drop rate (2 with the drop-double party ability).
    pub fn make_drop_items(&self, env: &BattleEnv<'_>, drop_double: bool) -> Vec<DropReward> {
        let Some(data) = self.data(env.data()) else {
            return Vec::new();
        };
        let rate = if drop_double { 2.0 } else { 1.0 };
        data.drop_items
            .iter()
            .filter(|drop| drop.kind != DropKind::None)
            .filter(|drop| env.random() * f64::from(drop.denominator) < rate)
            .filter_map(|drop| match drop.kind {
                DropKind::Item => env.data().item(drop.data_id).map(|_| DropReward::Item(drop.data_id)),
                DropKind::Weapon => env
                    .data()
                    .weapon(drop.data_id)
                    .map(|_| DropReward::Equip(EquipItem::Weapon(drop.data_id))),
                DropKind::Armor => env
                    .data()
                    .armor(drop.data_id)
                    .map(|_| DropReward::Equip(EquipItem::Armor(drop.data_id))),
                DropKind::None => None,
            })
            .collect()
    }

    /// Turns into another enemy. The disambiguation letter is dropped when
    /// the name changes. Returns whether queued actions need re-planning.
    pub fn transform(&mut self, env: &BattleEnv<'_>, enemy_id: u32) -> bool {
        let Some(data) = env.data().enemy(enemy_id) else {
            return false;
        };
        self.enemy_id = enemy_id;
        if data.name != self.original_name {
            self.original_name = data.name.clone();
            self.letter.clear();
            self.plural = false;
        }
        self.refresh(env);
        self.num_actions() > 0
    }

    // ===== action patterns =====

    pub fn meets_condition(
        &self,
        env: &BattleEnv<'_>,
        action: &EnemyAction,
        ctx: &PatternContext,
    ) -> bool {
        let (p1, p2) = (action.condition_param1, action.condition_param2);
        match action.condition_type {
            ConditionType::Always => true,
            ConditionType::Turn => {
                let n = f64::from(ctx.turn_count);
                if p2 == 0.0 {
                    n == p1
                } else {
                    n > 0.0 && n >= p1 && n % p2 == p1 % p2
                }
            }
            ConditionType::Hp => (p1..=p2).contains(&self.hp_rate(env)),
            ConditionType::Mp => (p1..=p2).contains(&self.mp_rate(env)),
            ConditionType::State => self.is_state_affected(p1 as u32),
            ConditionType::PartyLevel => f64::from(ctx.party_highest_level) >= p1,
            ConditionType::Switch => env.variables().switch(p1 as u32),
        }
    }

    pub fn is_action_valid(
        &self,
        env: &BattleEnv<'_>,
        action: &EnemyAction,
        ctx: &PatternContext,
        use_ctx: &UseContext<'_>,
    ) -> bool {
        self.meets_condition(env, action, ctx)
            && env
                .skill_item(action.skill_id)
                .is_some_and(|skill| self.can_use(env, skill, use_ctx))
    }

    /// Patterns that currently pass their condition and are usable.
    pub fn valid_actions<'a>(
        &self,
        env: &BattleEnv<'a>,
        ctx: &PatternContext,
        use_ctx: &UseContext<'_>,
    ) -> Vec<&'a EnemyAction> {
        self.data(env.data())
            .map(|data| {
                data.actions
                    .iter()
                    .filter(|action| self.is_action_valid(env, action, ctx, use_ctx))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Weighted pick over `rating - rating_zero`. `None` when no pattern has a
/// positive weight.
pub fn select_action<'a>(
    env: &BattleEnv<'_>,
    list: &[&'a EnemyAction],
    rating_zero: i32,
) -> Option<&'a EnemyAction> {
    let sum: i32 = list.iter().map(|a| a.rating - rating_zero).sum();
    if sum <= 0 {
        return None;
    }
    let mut value = env.random_int(sum);
    for action in list {
        value -= action.rating - rating_zero;
        if value < 0 {
            return Some(*action);
        }
    }
    None
}

/// Keeps the patterns rated within 2 of the best one and picks one per
/// action slot.
pub fn select_all_actions<'a>(
    env: &BattleEnv<'_>,
    list: &[&'a EnemyAction],
    slots: usize,
) -> Vec<Option<&'a EnemyAction>> {
    let Some(rating_max) = list.iter().map(|a| a.rating).max() else {
        return vec![None; slots];
    };
    let rating_zero = rating_max - 3;
    let kept: Vec<&EnemyAction> = list
        .iter()
        .copied()
        .filter(|a| a.rating > rating_zero)
        .collect();
    (0..slots)
        .map(|_| select_action(env, &kept, rating_zero))
        .collect()
}

impl Battler for Enemy {
    fn core(&self) -> &BattlerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BattlerCore {
        &mut self.core
    }

    fn battler_id(&self) -> BattlerId {
        BattlerId::Enemy(self.index)
    }

    fn name(&self) -> String {
        if self.plural {
            format!("{}{}", self.original_name, self.letter)
        } else {
            self.original_name.clone()
        }
    }

    fn param_base(&self, data: &dyn DataOracle, param: ParamId) -> i32 {
        self.data(data).map_or(0, |e| e.params[param.index()])
    }

    fn trait_objects<'a>(&'a self, data: &'a dyn DataOracle) -> Vec<&'a [Trait]> {
        let mut objects = self.core.state_traits(data);
        if let Some(enemy) = self.data(data) {
            objects.push(&enemy.traits);
        }
        objects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    fn rated(skill_id: u32, rating: i32) -> EnemyAction {
        EnemyAction {
            skill_id,
            rating,
            ..EnemyAction::default()
        }
    }

    #[test]
    fn zero_params_clamp_to_one_except_max_mp() {
        let mut fx = Fixture::new();
        fx.database.enemies.insert(
            9,
            EnemyData {
                id: 9,
                name: "Husk".into(),
                params: [40, 0, 0, 0, 0, 0, 0, 0],
                ..EnemyData::default()
            },
        );
        let env = fx.env();
        let husk = Enemy::new(&env, 0, 9, 0, 0).unwrap();
        assert_eq!(husk.mmp(&env), 0);
        assert_eq!(husk.atk(&env), 1);
        assert_eq!(husk.def(&env), 1);
        assert_eq!(husk.param(&env, ParamId::Luk), 1);
        assert_eq!(husk.mhp(&env), 40);
    }

    #[test]
    fn name_carries_letter_only_when_plural() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut slime = Enemy::new(&env, 0, Fixture::SLIME, 0, 0).unwrap();
        slime.set_letter("A");
        assert_eq!(slime.name(), "Slime");
        slime.set_plural(true);
        assert_eq!(slime.name(), "SlimeA");
    }

    #[test]
    fn transform_to_other_name_clears_letter() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut slime = Enemy::new(&env, 0, Fixture::SLIME, 0, 0).unwrap();
        slime.set_letter("B");
        slime.set_plural(true);
        slime.transform(&env, Fixture::BAT);
        assert_eq!(slime.name(), "Bat");
        assert!(slime.is_letter_empty());
        assert_eq!(slime.enemy_id(), Fixture::BAT);
    }

    #[test]
    fn turn_condition_matches_periodic_turns() {
        let fx = Fixture::new();
        let env = fx.env();
        let slime = Enemy::new(&env, 0, Fixture::SLIME, 0, 0).unwrap();
        let action = EnemyAction {
            condition_type: ConditionType::Turn,
            condition_param1: 1.0,
            condition_param2: 2.0,
            ..EnemyAction::default()
        };
        let at = |turn_count| PatternContext {
            turn_count,
            party_highest_level: 1,
        };
        assert!(!slime.meets_condition(&env, &action, &at(0)));
        assert!(slime.meets_condition(&env, &action, &at(1)));
        assert!(!slime.meets_condition(&env, &action, &at(2)));
        assert!(slime.meets_condition(&env, &action, &at(3)));
    }

    #[test]
    fn low_rated_patterns_are_dropped() {
        let fx = Fixture::with_rolls(&[0.99; 4]);
        let env = fx.env();
        let strong = rated(1, 9);
        let weak = rated(2, 5);
        let picks = select_all_actions(&env, &[&strong, &weak], 2);
        assert_eq!(picks, vec![Some(&strong), Some(&strong)]);
    }

    #[test]
    fn no_positive_weight_selects_nothing() {
        let fx = Fixture::new();
        let env = fx.env();
        let a = rated(1, 3);
        assert_eq!(select_action(&env, &[&a], 3), None);
    }

    #[test]
    fn unknown_enemy_is_setup_error() {
        let fx = Fixture::new();
        let env = fx.env();
        assert_eq!(
            Enemy::new(&env, 0, 404, 0, 0).unwrap_err(),
            SetupError::EnemyNotFound(404)
        );
    }
}
