//! Auto-battle scoring.

use tracing::trace;

use super::Action;
use crate::battler::{Battler, BattlerId, BattlerStats, UseContext};
use crate::env::BattleEnv;
use crate::unit::Combatants;

impl Action {
    /// Scores the action for auto battle and, for single-target scopes,
    /// fixes the target index on the best candidate.
    ///
    /// Invalid actions score 0. Positive scores get a `[0, 1)` jitter so ties
    /// break randomly.
    pub fn evaluate(&mut self, env: &BattleEnv<'_>, units: &Combatants, ctx: &UseContext<'_>) -> f64 {
        let Some(subject) = units.battler(self.subject) else {
            return 0.0;
        };
        if !self.is_valid(env, subject, ctx) {
            return 0.0;
        }
        let mut value = 0.0_f64;
        let mut best_index = None;
        for target_id in self.item_target_candidates(env, units) {
            let Some(target) = units.battler(target_id) else {
                continue;
            };
            let target_value = self.evaluate_with_target(env, subject, target);
            if self.is_for_all(env) {
                value += target_value;
            } else if target_value > value {
                value = target_value;
                best_index = units.friends_of(target_id).index_of(target_id);
            }
        }
        if let Some(index) = best_index {
            self.target_index = index as i32;
        }
        value *= self.num_repeats(env, subject) as f64;
        if value > 0.0 {
            value += env.random();
        }
        trace!(subject = ?self.subject, item = ?self.item, value, "action evaluated");
        value
    }

    /// Share of the target's HP the action would take away (opponents) or
    /// restore (friends). Non-HP actions score 0.
    pub fn evaluate_with_target(
        &self,
        env: &BattleEnv<'_>,
        subject: &dyn Battler,
        target: &dyn Battler,
    ) -> f64 {
        if !self.is_hp_effect(env) {
            return 0.0;
        }
        let value = f64::from(self.make_damage_value(env, subject, target, false));
        if self.is_for_opponent(env) {
            value / f64::from(target.hp().max(1))
        } else {
            let mhp = f64::from(target.mhp(env).max(1));
            let recovery = (-value).min(mhp - f64::from(target.hp()));
            recovery / mhp
        }
    }

    /// Battlers the action could land on, before any random pick.
    pub fn item_target_candidates(&self, env: &BattleEnv<'_>, units: &Combatants) -> Vec<BattlerId> {
        if self.item(env).is_none() {
            return Vec::new();
        }
        if self.is_for_opponent(env) {
            units.opponents_of(self.subject).alive_members()
        } else if self.is_for_user(env) {
            vec![self.subject]
        } else if self.is_for_dead_friend(env) {
            units.friends_of(self.subject).dead_members()
        } else {
            units.friends_of(self.subject).alive_members()
        }
    }
}
