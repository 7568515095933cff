use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::{Party, Unit};
use crate::battler::{Battler, BattlerId, BattlerOps, BattlerStats, DropReward, Enemy};
use crate::data::{PageSpan, TroopData, TroopPage};
use crate::env::BattleEnv;
use crate::error::SetupError;

pub const LETTER_TABLE_HALF: [&str; 26] = [
    " A", " B", " C", " D", " E", " F", " G", " H", " I", " J", " K", " L", " M", " N", " O",
    " P", " Q", " R", " S", " T", " U", " V", " W", " X", " Y", " Z",
];

pub const LETTER_TABLE_FULL: [&str; 26] = [
    "Ａ", "Ｂ", "Ｃ", "Ｄ", "Ｅ", "Ｆ", "Ｇ", "Ｈ", "Ｉ", "Ｊ", "Ｋ", "Ｌ", "Ｍ", "Ｎ", "Ｏ", "Ｐ",
    "Ｑ", "Ｒ", "Ｓ", "Ｔ", "Ｕ", "Ｖ", "Ｗ", "Ｘ", "Ｙ", "Ｚ",
];

/// The enemy side of one battle, plus turn and battle-event bookkeeping.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Troop {
    troop_id: u32,
    enemies: Vec<Enemy>,
    turn_count: u32,
    /// Pages already run within their span.
    event_flags: BTreeSet<usize>,
    names_count: BTreeMap<String, usize>,
    in_battle: bool,
}

impl Troop {
    /// Builds the enemies of `troop_id`. Every member must reference an
    /// existing enemy; a partial troop is never returned.
    pub fn setup(env: &BattleEnv<'_>, troop_id: u32) -> Result<Self, SetupError> {
        let data = env
            .data()
            .troop(troop_id)
            .ok_or(SetupError::TroopNotFound(troop_id))?;
        let mut troop = Self {
            troop_id,
            ..Self::default()
        };
        for (index, member) in data.members.iter().enumerate() {
            let mut enemy = Enemy::new(env, index, member.enemy_id, member.x, member.y)?;
            if member.hidden {
                enemy.hide();
            }
            troop.enemies.push(enemy);
        }
        troop.make_unique_names(env.config().cjk_letters);
        debug!(troop_id, enemies = troop.enemies.len(), "troop ready");
        Ok(troop)
    }

    pub fn troop_id(&self) -> u32 {
        self.troop_id
    }

    pub fn data<'a>(&self, env: &BattleEnv<'a>) -> Option<&'a TroopData> {
        env.data().troop(self.troop_id)
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn enemy(&self, index: usize) -> Option<&Enemy> {
        self.enemies.get(index)
    }

    pub fn enemy_mut(&mut self, index: usize) -> Option<&mut Enemy> {
        self.enemies.get_mut(index)
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    /// Gives every alive, unlettered enemy the next letter for its name and
    /// marks names shared by two or more enemies as plural.
    pub fn make_unique_names(&mut self, cjk: bool) {
        let table = if cjk { &LETTER_TABLE_FULL } else { &LETTER_TABLE_HALF };
        for enemy in &mut self.enemies {
            if enemy.is_alive() && enemy.is_letter_empty() {
                let n = self
                    .names_count
                    .entry(enemy.original_name().to_owned())
                    .or_insert(0);
                enemy.set_letter(table[*n % table.len()]);
                *n += 1;
            }
        }
        for enemy in &mut self.enemies {
            let count = self.names_count.get(enemy.original_name()).copied();
            if count.unwrap_or(0) >= 2 {
                enemy.set_plural(true);
            }
        }
    }

    /// Distinct base names of the alive enemies, in troop order.
    pub fn enemy_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for enemy in self.enemies.iter().filter(|e| e.is_alive()) {
            if !names.iter().any(|n| n == enemy.original_name()) {
                names.push(enemy.original_name().to_owned());
            }
        }
        names
    }

    /// Starts a new turn; turn-span pages may run again.
    pub fn increase_turn(&mut self, env: &BattleEnv<'_>) {
        if let Some(data) = self.data(env) {
            for (i, page) in data.pages.iter().enumerate() {
                if page.span == PageSpan::Turn {
                    self.event_flags.remove(&i);
                }
            }
        }
        self.turn_count += 1;
    }

    /// Page conditions; a page without any condition never runs.
    pub fn meets_conditions(
        &self,
        env: &BattleEnv<'_>,
        page: &TroopPage,
        party: &Party,
        turn_end: bool,
    ) -> bool {
        let c = &page.conditions;
        if c.is_empty() {
            return false;
        }
        if c.turn_ending && !turn_end {
            return false;
        }
        if c.turn_valid {
            let (n, a, b) = (self.turn_count, c.turn_a, c.turn_b);
            if b == 0 && n != a {
                return false;
            }
            if b > 0 && (n < 1 || n < a || n % b != a % b) {
                return false;
            }
        }
        if c.enemy_valid {
            let hurt = self
                .enemies
                .get(c.enemy_index)
                .is_some_and(|e| e.hp_rate(env) * 100.0 <= f64::from(c.enemy_hp));
            if !hurt {
                return false;
            }
        }
        if c.actor_valid {
            let hurt = party
                .actor(c.actor_id)
                .is_some_and(|a| a.hp_rate(env) * 100.0 <= f64::from(c.actor_hp));
            if !hurt {
                return false;
            }
        }
        if c.switch_valid && !env.variables().switch(c.switch_id) {
            return false;
        }
        true
    }

    /// Picks the first page that meets its conditions and has not run in its
    /// span, and marks it as run unless its span is `Moment`.
    pub fn next_battle_event(
        &mut self,
        env: &BattleEnv<'_>,
        party: &Party,
        turn_end: bool,
    ) -> Option<usize> {
        let data = self.data(env)?;
        let index = data.pages.iter().enumerate().position(|(i, page)| {
            !self.event_flags.contains(&i) && self.meets_conditions(env, page, party, turn_end)
        })?;
        if data.pages[index].span != PageSpan::Moment {
            self.event_flags.insert(index);
        }
        Some(index)
    }

    // ===== rewards =====

    pub fn exp_total(&self, env: &BattleEnv<'_>) -> i64 {
        self.enemies
            .iter()
            .filter(|e| e.is_dead())
            .map(|e| i64::from(e.exp(env.data())))
            .sum()
    }

    pub fn gold_total(&self, env: &BattleEnv<'_>, gold_double: bool) -> i64 {
        let sum: i64 = self
            .enemies
            .iter()
            .filter(|e| e.is_dead())
            .map(|e| i64::from(e.gold(env.data())))
            .sum();
        if gold_double { sum * 2 } else { sum }
    }

    pub fn make_drop_items(&self, env: &BattleEnv<'_>, drop_double: bool) -> Vec<DropReward> {
        self.enemies
            .iter()
            .filter(|e| e.is_dead())
            .flat_map(|e| e.make_drop_items(env, drop_double))
            .collect()
    }

    pub fn on_battle_start(&mut self, env: &BattleEnv<'_>) {
        for enemy in &mut self.enemies {
            enemy.on_battle_start(env);
        }
        self.in_battle = true;
    }

    pub fn on_battle_end(&mut self, env: &BattleEnv<'_>) {
        self.in_battle = false;
        for enemy in &mut self.enemies {
            enemy.on_battle_end(env);
        }
    }
}

impl Unit for Troop {
    fn member_ids(&self) -> Vec<BattlerId> {
        self.enemies.iter().map(|e| e.battler_id()).collect()
    }

    fn member(&self, id: BattlerId) -> Option<&dyn Battler> {
        match id {
            BattlerId::Enemy(index) => self.enemies.get(index).map(|e| e as &dyn Battler),
            BattlerId::Actor(_) => None,
        }
    }

    fn member_mut(&mut self, id: BattlerId) -> Option<&mut dyn Battler> {
        match id {
            BattlerId::Enemy(index) => self.enemies.get_mut(index).map(|e| e as &mut dyn Battler),
            BattlerId::Actor(_) => None,
        }
    }

    fn in_battle(&self) -> bool {
        self.in_battle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PageConditions;
    use crate::testing::Fixture;

    #[test]
    fn duplicate_names_get_letters() {
        let fx = Fixture::new();
        let env = fx.env();
        let troop = Troop::setup(&env, Fixture::SLIME_TRIO).unwrap();
        let names: Vec<String> = troop.members().iter().map(|b| b.name()).collect();
        assert_eq!(names, vec!["Slime A", "Slime B", "Slime C"]);
        assert_eq!(troop.enemy_names(), vec!["Slime".to_owned()]);
    }

    #[test]
    fn single_enemy_keeps_bare_name() {
        let fx = Fixture::new();
        let env = fx.env();
        let troop = Troop::setup(&env, Fixture::LONE_BAT).unwrap();
        assert_eq!(troop.members()[0].name(), "Bat");
    }

    #[test]
    fn unknown_troop_fails_setup() {
        let fx = Fixture::new();
        let env = fx.env();
        assert_eq!(Troop::setup(&env, 77).unwrap_err(), SetupError::TroopNotFound(77));
    }

    #[test]
    fn empty_conditions_never_run() {
        let fx = Fixture::new();
        let env = fx.env();
        let troop = Troop::setup(&env, Fixture::LONE_BAT).unwrap();
        let party = Party::new(Vec::new());
        let page = TroopPage::default();
        assert!(!troop.meets_conditions(&env, &page, &party, false));
        let turn_end = TroopPage {
            conditions: PageConditions {
                turn_ending: true,
                ..PageConditions::default()
            },
            span: PageSpan::Battle,
        };
        assert!(!troop.meets_conditions(&env, &turn_end, &party, false));
        assert!(troop.meets_conditions(&env, &turn_end, &party, true));
    }

    #[test]
    fn rewards_count_only_dead_enemies() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut troop = Troop::setup(&env, Fixture::SLIME_TRIO).unwrap();
        if let Some(slime) = troop.enemy_mut(0) {
            slime.add_state(&env, 1);
        }
        assert_eq!(troop.exp_total(&env), 10);
        assert_eq!(troop.gold_total(&env, false), 5);
        assert_eq!(troop.gold_total(&env, true), 10);
    }
}
