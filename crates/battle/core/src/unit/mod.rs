//! Party and troop rosters.
//!
//! Both sides implement [`Unit`], which answers membership queries and picks
//! targets by [`BattlerId`]. Targets are returned as ids rather than
//! references so the action pipeline can later re-borrow the chosen battler
//! mutably through [`Combatants`].
mod inventory;
mod party;
mod troop;

pub use inventory::Inventory;
pub use party::Party;
pub use troop::{LETTER_TABLE_FULL, LETTER_TABLE_HALF, Troop};

use crate::battler::{Battler, BattlerId, BattlerOps, BattlerStats, SParamId};
use crate::env::BattleEnv;

/// Membership and targeting shared by [`Party`] and [`Troop`].
pub trait Unit {
    /// Members taking part in the current context, in roster order. For the
    /// party this is the battle line while in battle.
    fn member_ids(&self) -> Vec<BattlerId>;

    fn member(&self, id: BattlerId) -> Option<&dyn Battler>;

    fn member_mut(&mut self, id: BattlerId) -> Option<&mut dyn Battler>;

    fn in_battle(&self) -> bool;

    fn members(&self) -> Vec<&dyn Battler> {
        self.member_ids()
            .into_iter()
            .filter_map(|id| self.member(id))
            .collect()
    }

    fn index_of(&self, id: BattlerId) -> Option<usize> {
        self.member_ids().iter().position(|&m| m == id)
    }

    fn alive_members(&self) -> Vec<BattlerId> {
        self.filter_members(&|b| b.is_alive())
    }

    fn dead_members(&self) -> Vec<BattlerId> {
        self.filter_members(&|b| b.is_dead())
    }

    fn movable_members(&self, env: &BattleEnv<'_>) -> Vec<BattlerId> {
        self.filter_members(&|b| b.can_move(env))
    }

    fn filter_members(&self, pred: &dyn Fn(&dyn Battler) -> bool) -> Vec<BattlerId> {
        self.members()
            .into_iter()
            .filter(|b| pred(*b))
            .map(|b| b.battler_id())
            .collect()
    }

    fn is_all_dead(&self) -> bool {
        self.alive_members().is_empty()
    }

    /// Mean agility of the members; 1 for an empty unit.
    fn agility(&self, env: &BattleEnv<'_>) -> f64 {
        let members = self.members();
        if members.is_empty() {
            return 1.0;
        }
        let sum: i32 = members.iter().map(|b| b.agi(env)).sum();
        f64::from(sum) / members.len() as f64
    }

    fn tgr_sum(&self, env: &BattleEnv<'_>) -> f64 {
        self.members()
            .into_iter()
            .filter(|b| b.is_alive())
            .map(|b| b.sparam(env, SParamId::Tgr))
            .sum()
    }

    /// Alive member picked with probability proportional to `tgr`.
    fn random_target(&self, env: &BattleEnv<'_>) -> Option<BattlerId> {
        let mut roll = env.random() * self.tgr_sum(env);
        let mut target = None;
        for member in self.members().into_iter().filter(|b| b.is_alive()) {
            roll -= member.sparam(env, SParamId::Tgr);
            if roll <= 0.0 && target.is_none() {
                target = Some(member.battler_id());
            }
        }
        target
    }

    fn random_dead_target(&self, env: &BattleEnv<'_>) -> Option<BattlerId> {
        let dead = self.dead_members();
        if dead.is_empty() {
            return None;
        }
        let index = (env.random() * dead.len() as f64).floor() as usize;
        dead.get(index).copied()
    }

    /// Member at `index` if alive, else the first alive member.
    fn smooth_target(&self, index: i32) -> Option<BattlerId> {
        self.smooth_pick(index, &|b| b.is_alive())
    }

    /// Member at `index` if dead, else the first dead member.
    fn smooth_dead_target(&self, index: i32) -> Option<BattlerId> {
        self.smooth_pick(index, &|b| b.is_dead())
    }

    fn smooth_pick(&self, index: i32, pred: &dyn Fn(&dyn Battler) -> bool) -> Option<BattlerId> {
        let members = self.members();
        let index = usize::try_from(index).unwrap_or(0);
        match members.get(index) {
            Some(member) if pred(*member) => Some(member.battler_id()),
            _ => members.into_iter().find(|b| pred(*b)).map(|b| b.battler_id()),
        }
    }

    /// First member able to cover for a dying ally.
    fn substitute_battler(&self, env: &BattleEnv<'_>) -> Option<BattlerId> {
        self.members()
            .into_iter()
            .find(|b| b.is_substitute(env))
            .map(|b| b.battler_id())
    }

    fn for_each_member(&mut self, f: &mut dyn FnMut(&mut dyn Battler)) {
        for id in self.member_ids() {
            if let Some(member) = self.member_mut(id) {
                f(member);
            }
        }
    }

    fn clear_actions(&mut self) {
        self.for_each_member(&mut |b| b.clear_actions());
    }

    fn clear_results(&mut self) {
        self.for_each_member(&mut |b| b.clear_result());
    }
}

/// Both sides of a battle, addressable by [`BattlerId`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatants {
    pub party: Party,
    pub troop: Troop,
}

impl Combatants {
    pub fn new(party: Party, troop: Troop) -> Self {
        Self { party, troop }
    }

    pub fn battler(&self, id: BattlerId) -> Option<&dyn Battler> {
        match id {
            BattlerId::Actor(_) => self.party.member(id),
            BattlerId::Enemy(_) => self.troop.member(id),
        }
    }

    pub fn battler_mut(&mut self, id: BattlerId) -> Option<&mut dyn Battler> {
        match id {
            BattlerId::Actor(_) => self.party.member_mut(id),
            BattlerId::Enemy(_) => self.troop.member_mut(id),
        }
    }

    pub fn friends_of(&self, id: BattlerId) -> &dyn Unit {
        match id {
            BattlerId::Actor(_) => &self.party,
            BattlerId::Enemy(_) => &self.troop,
        }
    }

    pub fn opponents_of(&self, id: BattlerId) -> &dyn Unit {
        match id {
            BattlerId::Actor(_) => &self.troop,
            BattlerId::Enemy(_) => &self.party,
        }
    }

    /// Party battle line followed by the troop.
    pub fn all_member_ids(&self) -> Vec<BattlerId> {
        let mut ids = self.party.member_ids();
        ids.extend(self.troop.member_ids());
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    #[test]
    fn random_target_follows_target_rate() {
        let fx = Fixture::with_rolls(&[0.0, 0.99]);
        let env = fx.env();
        let troop = fx.troop(&env, Fixture::SLIME_TRIO);
        assert_eq!(troop.random_target(&env), Some(BattlerId::Enemy(0)));
        assert_eq!(troop.random_target(&env), Some(BattlerId::Enemy(2)));
    }

    #[test]
    fn smooth_target_falls_back_to_first_alive() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut troop = fx.troop(&env, Fixture::SLIME_TRIO);
        if let Some(slime) = troop.member_mut(BattlerId::Enemy(1)) {
            slime.add_state(&env, 1);
        }
        assert_eq!(troop.smooth_target(1), Some(BattlerId::Enemy(0)));
        assert_eq!(troop.smooth_target(-3), Some(BattlerId::Enemy(0)));
        assert_eq!(troop.smooth_target(2), Some(BattlerId::Enemy(2)));
        assert_eq!(troop.smooth_dead_target(0), Some(BattlerId::Enemy(1)));
    }

    #[test]
    fn dead_targets_pick_uniformly_without_draw_when_empty() {
        let fx = Fixture::with_rolls(&[0.7]);
        let env = fx.env();
        let troop = fx.troop(&env, Fixture::SLIME_TRIO);
        assert_eq!(troop.random_dead_target(&env), None);
        assert_eq!(fx.rng.remaining(), 1);
    }

    #[test]
    fn empty_unit_has_unit_agility() {
        let fx = Fixture::new();
        let env = fx.env();
        let party = Party::new(Vec::new());
        assert_eq!(party.agility(&env), 1.0);
    }
}
