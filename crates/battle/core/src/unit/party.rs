use tracing::debug;

use super::{Inventory, Unit};
use crate::battler::{Actor, Battler, BattlerId, BattlerOps, BattlerStats};
use crate::config::BattleConfig;
use crate::data::{PartyAbilities, format_message};
use crate::env::BattleEnv;
use crate::error::SetupError;

/// The player's side: persistent actors, gold, steps and the item bag.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Party {
    actors: Vec<Actor>,
    gold: i64,
    steps: u32,
    inventory: Inventory,
    in_battle: bool,
}

impl Party {
    pub fn new(actors: Vec<Actor>) -> Self {
        Self {
            actors,
            ..Self::default()
        }
    }

    /// Builds every listed actor from the database; duplicates are skipped.
    pub fn setup(env: &BattleEnv<'_>, actor_ids: &[u32]) -> Result<Self, SetupError> {
        let mut party = Self::default();
        for &id in actor_ids {
            if party.actor(id).is_none() {
                party.actors.push(Actor::new(env, id)?);
            }
        }
        if party.actors.is_empty() {
            return Err(SetupError::EmptyParty);
        }
        Ok(party)
    }

    pub fn size(&self) -> usize {
        self.member_ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn actor(&self, actor_id: u32) -> Option<&Actor> {
        self.actors.iter().find(|a| a.actor_id() == actor_id)
    }

    pub fn actor_mut(&mut self, actor_id: u32) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|a| a.actor_id() == actor_id)
    }

    /// Every actor in roster order, battle line first.
    pub fn all_members(&self) -> &[Actor] {
        &self.actors
    }

    pub fn all_members_mut(&mut self) -> &mut [Actor] {
        &mut self.actors
    }

    /// The first [`BattleConfig::MAX_BATTLE_MEMBERS`] actors that are not
    /// hidden.
    pub fn battle_members(&self) -> Vec<&Actor> {
        self.actors
            .iter()
            .take(BattleConfig::MAX_BATTLE_MEMBERS)
            .filter(|a| a.is_appeared())
            .collect()
    }

    pub fn is_battle_member(&self, actor_id: u32) -> bool {
        self.battle_members().iter().any(|a| a.actor_id() == actor_id)
    }

    pub fn leader(&self) -> Option<&Actor> {
        self.battle_members().into_iter().next()
    }

    pub fn add_actor(&mut self, actor: Actor) {
        if self.actor(actor.actor_id()).is_none() {
            self.actors.push(actor);
        }
    }

    pub fn remove_actor(&mut self, actor_id: u32) -> Option<Actor> {
        let index = self.actors.iter().position(|a| a.actor_id() == actor_id)?;
        Some(self.actors.remove(index))
    }

    pub fn swap_order(&mut self, a: usize, b: usize) {
        if a < self.actors.len() && b < self.actors.len() {
            self.actors.swap(a, b);
        }
    }

    /// Leader name alone, or the party-name template for two or more.
    pub fn name(&self, env: &BattleEnv<'_>) -> String {
        let members = self.battle_members();
        match members.as_slice() {
            [] => String::new(),
            [only] => only.name(),
            [leader, ..] => format_message(
                &env.system().terms.messages.party_name,
                &[&leader.name()],
            ),
        }
    }

    pub fn highest_level(&self) -> i32 {
        self.members()
            .iter()
            .filter_map(|b| b.level())
            .max()
            .unwrap_or(0)
    }

    // ===== gold, steps, items =====

    pub fn gold(&self) -> i64 {
        self.gold
    }

    pub fn gain_gold(&mut self, amount: i64) {
        self.gold = (self.gold + amount).clamp(0, BattleConfig::MAX_GOLD);
    }

    pub fn lose_gold(&mut self, amount: i64) {
        self.gain_gold(-amount);
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn increase_steps(&mut self) {
        self.steps += 1;
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    // ===== abilities and encounter rates =====

    /// Abilities granted by any battle member.
    pub fn party_abilities(&self, env: &BattleEnv<'_>) -> PartyAbilities {
        self.battle_members()
            .into_iter()
            .fold(PartyAbilities::empty(), |acc, a| acc | a.party_abilities(env))
    }

    pub fn has_ability(&self, env: &BattleEnv<'_>, ability: PartyAbilities) -> bool {
        self.party_abilities(env).contains(ability)
    }

    pub fn rate_preemptive(&self, env: &BattleEnv<'_>, troop_agi: f64) -> f64 {
        let rate = if self.agility(env) >= troop_agi { 0.05 } else { 0.03 };
        if self.has_ability(env, PartyAbilities::RAISE_PREEMPTIVE) {
            rate * 4.0
        } else {
            rate
        }
    }

    pub fn rate_surprise(&self, env: &BattleEnv<'_>, troop_agi: f64) -> f64 {
        if self.has_ability(env, PartyAbilities::CANCEL_SURPRISE) {
            return 0.0;
        }
        if self.agility(env) >= troop_agi { 0.03 } else { 0.05 }
    }

    // ===== battle hooks =====

    pub fn can_input(&self, env: &BattleEnv<'_>) -> bool {
        self.members().iter().any(|b| b.can_input(env))
    }

    /// Dead battle members come back at 1 HP.
    pub fn revive_battle_members(&mut self, env: &BattleEnv<'_>) {
        for id in self.member_ids() {
            if let Some(member) = self.member_mut(id) {
                if member.is_dead() {
                    member.set_hp(env, 1);
                }
            }
        }
    }

    pub fn remove_battle_states(&mut self, env: &BattleEnv<'_>) {
        self.for_each_member(&mut |b| b.remove_battle_states(env));
    }

    pub fn on_battle_start(&mut self, env: &BattleEnv<'_>) {
        self.for_each_member(&mut |b| b.on_battle_start(env));
        self.in_battle = true;
    }

    pub fn on_battle_end(&mut self, env: &BattleEnv<'_>) {
        self.in_battle = false;
        self.for_each_member(&mut |b| b.on_battle_end(env));
        debug!(gold = self.gold, "party left battle");
    }
}

impl Unit for Party {
    fn member_ids(&self) -> Vec<BattlerId> {
        if self.in_battle {
            self.battle_members()
                .into_iter()
                .map(|a| a.battler_id())
                .collect()
        } else {
            self.actors.iter().map(|a| a.battler_id()).collect()
        }
    }

    fn member(&self, id: BattlerId) -> Option<&dyn Battler> {
        match id {
            BattlerId::Actor(actor_id) => self.actor(actor_id).map(|a| a as &dyn Battler),
            BattlerId::Enemy(_) => None,
        }
    }

    fn member_mut(&mut self, id: BattlerId) -> Option<&mut dyn Battler> {
        match id {
            BattlerId::Actor(actor_id) => self.actor_mut(actor_id).map(|a| a as &mut dyn Battler),
            BattlerId::Enemy(_) => None,
        }
    }

    fn in_battle(&self) -> bool {
        self.in_battle
    }

    /// Outside battle an empty party is not "all dead".
    fn is_all_dead(&self) -> bool {
        self.alive_members().is_empty() && (self.in_battle || !self.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    #[test]
    fn party_name_uses_template_for_groups() {
        let fx = Fixture::new();
        let env = fx.env();
        let solo = Party::setup(&env, &[Fixture::HERO]).unwrap();
        assert_eq!(solo.name(&env), "Hero");
        let duo = Party::setup(&env, &[Fixture::HERO, Fixture::MAGE]).unwrap();
        assert_eq!(duo.name(&env), "Hero's Party");
    }

    #[test]
    fn gold_is_clamped() {
        let mut party = Party::new(Vec::new());
        party.gain_gold(BattleConfig::MAX_GOLD + 10);
        assert_eq!(party.gold(), BattleConfig::MAX_GOLD);
        party.lose_gold(i64::from(u32::MAX));
        assert_eq!(party.gold(), 0);
    }

    #[test]
    fn hidden_actors_leave_the_battle_line() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut party = Party::setup(&env, &[Fixture::HERO, Fixture::MAGE]).unwrap();
        if let Some(hero) = party.actor_mut(Fixture::HERO) {
            hero.hide();
        }
        let line: Vec<u32> = party.battle_members().iter().map(|a| a.actor_id()).collect();
        assert_eq!(line, vec![Fixture::MAGE]);
        assert_eq!(party.leader().map(Actor::actor_id), Some(Fixture::MAGE));
    }

    #[test]
    fn empty_party_is_a_setup_error() {
        let fx = Fixture::new();
        let env = fx.env();
        assert_eq!(Party::setup(&env, &[]).unwrap_err(), SetupError::EmptyParty);
    }

    #[test]
    fn revive_restores_one_hp() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut party = Party::setup(&env, &[Fixture::HERO]).unwrap();
        party.on_battle_start(&env);
        if let Some(hero) = party.actor_mut(Fixture::HERO) {
            hero.set_hp(&env, 0);
            assert!(hero.is_dead());
        }
        assert!(party.is_all_dead());
        party.revive_battle_members(&env);
        assert_eq!(party.actor(Fixture::HERO).map(|a| a.hp()), Some(1));
        assert!(!party.is_all_dead());
    }
}
