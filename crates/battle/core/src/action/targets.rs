//! Target selection by scope.

use tracing::debug;

use super::Action;
use crate::battler::{BattlerId, BattlerStats};
use crate::env::BattleEnv;
use crate::unit::{Combatants, Unit};

impl Action {
    /// Targets in application order, each repeated `num_repeats` times.
    ///
    /// A confused subject acting on its own picks a single confusion target
    /// regardless of scope.
    pub fn make_targets(&self, env: &BattleEnv<'_>, units: &Combatants) -> Vec<BattlerId> {
        let Some(subject) = units.battler(self.subject) else {
            return Vec::new();
        };
        let targets = if !self.forcing && subject.is_confused(env) {
            let level = subject.confusion_level(env);
            self.confusion_target(env, units, level).into_iter().collect()
        } else if self.is_for_opponent(env) {
            self.targets_for_opponents(env, units.opponents_of(self.subject))
        } else if self.is_for_friend(env) {
            self.targets_for_friends(env, units.friends_of(self.subject))
        } else {
            Vec::new()
        };
        let repeats = self.num_repeats(env, subject);
        let targets = repeat_targets(&targets, repeats);
        debug!(subject = ?self.subject, ?targets, "targets made");
        targets
    }

    /// Level 1 hits opponents, level 2 flips a coin, level 3 hits friends.
    fn confusion_target(&self, env: &BattleEnv<'_>, units: &Combatants, level: u8) -> Option<BattlerId> {
        let opponents = units.opponents_of(self.subject);
        let friends = units.friends_of(self.subject);
        match level {
            1 => opponents.random_target(env),
            2 => {
                if env.random_int(2) == 0 {
                    opponents.random_target(env)
                } else {
                    friends.random_target(env)
                }
            }
            _ => friends.random_target(env),
        }
    }

    fn targets_for_opponents(&self, env: &BattleEnv<'_>, unit: &dyn Unit) -> Vec<BattlerId> {
        if self.is_for_random(env) {
            (0..self.num_targets(env))
                .filter_map(|_| unit.random_target(env))
                .collect()
        } else if self.is_for_one(env) {
            let target = if self.target_index < 0 {
                unit.random_target(env)
            } else {
                unit.smooth_target(self.target_index)
            };
            target.into_iter().collect()
        } else {
            unit.alive_members()
        }
    }

    fn targets_for_friends(&self, env: &BattleEnv<'_>, unit: &dyn Unit) -> Vec<BattlerId> {
        if self.is_for_user(env) {
            vec![self.subject]
        } else if self.is_for_dead_friend(env) {
            if self.is_for_one(env) {
                unit.smooth_dead_target(self.target_index).into_iter().collect()
            } else {
                unit.dead_members()
            }
        } else if self.is_for_one(env) {
            let target = if self.target_index < 0 {
                unit.random_target(env)
            } else {
                unit.smooth_target(self.target_index)
            };
            target.into_iter().collect()
        } else {
            unit.alive_members()
        }
    }
}

/// Each target `repeats` times in a row.
pub(crate) fn repeat_targets(targets: &[BattlerId], repeats: usize) -> Vec<BattlerId> {
    targets
        .iter()
        .flat_map(|&target| std::iter::repeat_n(target, repeats))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battler::BattlerOps;
    use crate::testing::Fixture;

    #[test]
    fn repeats_each_target_in_place() {
        let a = BattlerId::Enemy(0);
        let b = BattlerId::Enemy(1);
        assert_eq!(repeat_targets(&[a, b], 2), vec![a, a, b, b]);
        assert!(repeat_targets(&[a], 0).is_empty());
    }

    #[test]
    fn single_enemy_target_uses_index_then_falls_back() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut units = fx.combatants(&env, Fixture::SLIME_TRIO);
        let mut action = Action::new(BattlerId::Actor(Fixture::HERO));
        action.set_attack();
        action.set_target(2);
        assert_eq!(action.make_targets(&env, &units), vec![BattlerId::Enemy(2)]);

        if let Some(slime) = units.battler_mut(BattlerId::Enemy(2)) {
            slime.add_state(&env, 1);
        }
        assert_eq!(action.make_targets(&env, &units), vec![BattlerId::Enemy(0)]);
    }

    #[test]
    fn all_enemies_skips_the_dead() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut units = fx.combatants(&env, Fixture::SLIME_TRIO);
        if let Some(slime) = units.battler_mut(BattlerId::Enemy(1)) {
            slime.add_state(&env, 1);
        }
        let mut action = Action::new(BattlerId::Actor(Fixture::HERO));
        action.set_skill(Fixture::FIRE);
        assert_eq!(
            action.make_targets(&env, &units),
            vec![BattlerId::Enemy(0), BattlerId::Enemy(2)]
        );
    }

    #[test]
    fn user_scope_targets_the_subject() {
        let fx = Fixture::new();
        let env = fx.env();
        let units = fx.combatants(&env, Fixture::LONE_BAT);
        let mut action = Action::new(BattlerId::Actor(Fixture::HERO));
        action.set_guard();
        assert_eq!(
            action.make_targets(&env, &units),
            vec![BattlerId::Actor(Fixture::HERO)]
        );
    }

    #[test]
    fn confused_subject_hits_a_friend_at_level_three() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut units = fx.combatants(&env, Fixture::LONE_BAT);
        if let Some(hero) = units.battler_mut(BattlerId::Actor(Fixture::HERO)) {
            hero.add_state(&env, Fixture::CONFUSED_STATE);
        }
        let mut action = Action::new(BattlerId::Actor(Fixture::HERO));
        action.set_skill(Fixture::FIRE);
        assert_eq!(
            action.make_targets(&env, &units),
            vec![BattlerId::Actor(Fixture::HERO)]
        );
    }
}
