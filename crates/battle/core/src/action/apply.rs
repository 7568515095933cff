//! Per-target resolution.
//!
//! Every step reads subject and target through shared borrows first and
//! only then takes the one mutable borrow it needs, so a battler may be
//! subject and target of the same action.

use tracing::{debug, trace};

use super::Action;
use crate::battler::{Battler, BattlerId, BattlerOps, BattlerStats, ParamId, SParamId};
use crate::data::{DamageType, Effect, EffectCode, SPECIAL_EFFECT_ESCAPE};
use crate::env::BattleEnv;
use crate::unit::{Combatants, Unit};

impl Action {
    /// Whether applying the item to `target` can have any effect.
    ///
    /// Dead-friend scopes only reach dead targets and vice versa. Outside
    /// battle, items that would change nothing are refused.
    pub fn test_apply(&self, env: &BattleEnv<'_>, units: &Combatants, target: &dyn Battler) -> bool {
        let Some(item) = self.item(env) else {
            return false;
        };
        if self.is_for_dead_friend(env) != target.is_dead() {
            return false;
        }
        units.party.in_battle()
            || self.is_for_opponent(env)
            || (self.is_hp_recover(env) && target.hp() < target.mhp(env))
            || (self.is_mp_recover(env) && target.mp() < target.mmp(env))
            || item
                .effects()
                .iter()
                .any(|effect| self.test_item_effect(env, target, effect))
    }

    pub fn test_item_effect(&self, env: &BattleEnv<'_>, target: &dyn Battler, effect: &Effect) -> bool {
        let param = ParamId::from_data_id(effect.data_id);
        match effect.code {
            EffectCode::RecoverHp => {
                target.hp() < target.mhp(env) || effect.value1 < 0.0 || effect.value2 < 0.0
            }
            EffectCode::RecoverMp => {
                target.mp() < target.mmp(env) || effect.value1 < 0.0 || effect.value2 < 0.0
            }
            EffectCode::AddState => !target.is_state_affected(effect.data_id),
            EffectCode::RemoveState => target.is_state_affected(effect.data_id),
            EffectCode::AddBuff => param.is_some_and(|p| !target.is_max_buff_affected(p)),
            EffectCode::AddDebuff => param.is_some_and(|p| !target.is_max_debuff_affected(p)),
            EffectCode::RemoveBuff => param.is_some_and(|p| target.is_buff_affected(p)),
            EffectCode::RemoveDebuff => param.is_some_and(|p| target.is_debuff_affected(p)),
            EffectCode::LearnSkill => target.is_actor() && !target.is_learned_skill(effect.data_id),
            _ => true,
        }
    }

    /// Resolves the action against one target and leaves the outcome in the
    /// target's result.
    ///
    /// Draw order: hit, evasion, critical, variance, then one draw per
    /// chance-based effect. The reflection override is cleared on return so
    /// it never leaks into the next target.
    pub fn apply(&mut self, env: &BattleEnv<'_>, units: &mut Combatants, target_id: BattlerId) {
        self.apply_to(env, units, target_id);
        self.reflection_target = None;
    }

    fn apply_to(&self, env: &BattleEnv<'_>, units: &mut Combatants, target_id: BattlerId) {
        let Some(item) = self.item(env) else {
            return;
        };
        let (Some(subject), Some(target)) = (units.battler(self.subject), units.battler(target_id))
        else {
            return;
        };
        let used = self.test_apply(env, units, target);
        let missed = used && env.random() >= self.item_hit(env, subject);
        let evaded = !missed && env.random() < self.item_eva(env, target);

        if let Some(subject) = units.battler_mut(self.subject) {
            subject.clear_result();
        }
        let Some(target) = units.battler_mut(target_id) else {
            return;
        };
        let result = &mut target.core_mut().result;
        result.clear();
        result.used = used;
        result.missed = missed;
        result.evaded = evaded;
        result.physical = item.is_physical();
        result.drain = item.damage().kind.is_drain();
        let hit = result.is_hit();
        trace!(subject = ?self.subject, target = ?target_id, used, missed, evaded, "hit rolled");

        if !hit {
            return;
        }
        if self.damage_type(env) != DamageType::None {
            let (Some(subject), Some(target)) = (units.battler(self.subject), units.battler(target_id))
            else {
                return;
            };
            let critical = env.random() < self.item_cri(env, subject, target);
            let value = self.make_damage_value(env, subject, target, critical);
            if let Some(target) = units.battler_mut(target_id) {
                target.core_mut().result.critical = critical;
            }
            self.execute_damage(env, units, target_id, value);
        }
        for effect in item.effects() {
            self.apply_item_effect(env, units, target_id, effect);
        }
        self.apply_item_user_effect(env, units);
    }

    // ===== damage =====

    fn execute_damage(&self, env: &BattleEnv<'_>, units: &mut Combatants, target_id: BattlerId, value: i32) {
        if value == 0 {
            if let Some(target) = units.battler_mut(target_id) {
                target.core_mut().result.critical = false;
            }
        }
        if self.is_hp_effect(env) {
            self.execute_hp_damage(env, units, target_id, value);
        }
        if self.is_mp_effect(env) {
            self.execute_mp_damage(env, units, target_id, value);
        }
    }

    fn execute_hp_damage(&self, env: &BattleEnv<'_>, units: &mut Combatants, target_id: BattlerId, value: i32) {
        let Some(target) = units.battler_mut(target_id) else {
            return;
        };
        let value = if self.is_drain(env) { value.min(target.hp()) } else { value };
        make_success(target);
        target.gain_hp(env, -value);
        if value > 0 {
            target.on_damage(env, value);
        }
        debug!(target = ?target_id, value, hp = target.hp(), "hp damage");
        if self.is_drain(env) {
            let gainer = self.reflection_target.unwrap_or(self.subject);
            if let Some(gainer) = units.battler_mut(gainer) {
                gainer.gain_hp(env, value);
            }
        }
    }

    fn execute_mp_damage(&self, env: &BattleEnv<'_>, units: &mut Combatants, target_id: BattlerId, value: i32) {
        let Some(target) = units.battler_mut(target_id) else {
            return;
        };
        let value = if self.is_mp_recover(env) { value } else { value.min(target.mp()) };
        if value != 0 {
            make_success(target);
        }
        target.gain_mp(env, -value);
        if self.is_drain(env) {
            let gainer = self.reflection_target.unwrap_or(self.subject);
            if let Some(gainer) = units.battler_mut(gainer) {
                gainer.gain_mp(env, value);
            }
        }
    }

    // ===== effects =====

    fn apply_item_effect(&self, env: &BattleEnv<'_>, units: &mut Combatants, target_id: BattlerId, effect: &Effect) {
        match effect.code {
            EffectCode::RecoverHp | EffectCode::RecoverMp => {
                self.effect_recover(env, units, target_id, effect);
            }
            EffectCode::AddState if effect.data_id == 0 => {
                self.effect_add_attack_states(env, units, target_id, effect);
            }
            EffectCode::AddState => self.effect_add_normal_state(env, units, target_id, effect),
            EffectCode::AddDebuff => self.effect_add_debuff(env, units, target_id, effect),
            _ => {
                let in_battle = units.party.in_battle();
                if let Some(target) = units.battler_mut(target_id) {
                    apply_target_only_effect(env, target, effect, in_battle);
                }
            }
        }
    }

    /// `(max * value1 + value2) * rec`, scaled by the user's pharmacology for
    /// items.
    fn effect_recover(&self, env: &BattleEnv<'_>, units: &mut Combatants, target_id: BattlerId, effect: &Effect) {
        let pha = match units.battler(self.subject) {
            Some(subject) if self.is_item() => subject.sparam(env, SParamId::Pha),
            _ => 1.0,
        };
        let Some(target) = units.battler_mut(target_id) else {
            return;
        };
        let hp = effect.code == EffectCode::RecoverHp;
        let max = if hp { target.mhp(env) } else { target.mmp(env) };
        let rec = target.sparam(env, SParamId::Rec);
        let value = ((f64::from(max) * effect.value1 + effect.value2) * rec * pha).floor() as i32;
        if value != 0 {
            if hp {
                target.gain_hp(env, value);
            } else {
                target.gain_mp(env, value);
            }
            make_success(target);
        }
    }

    fn effect_add_attack_states(
        &self,
        env: &BattleEnv<'_>,
        units: &mut Combatants,
        target_id: BattlerId,
        effect: &Effect,
    ) {
        let Some(subject) = units.battler(self.subject) else {
            return;
        };
        for state_id in subject.attack_states(env) {
            let chance = {
                let (Some(subject), Some(target)) =
                    (units.battler(self.subject), units.battler(target_id))
                else {
                    return;
                };
                effect.value1
                    * target.state_rate(env, state_id)
                    * subject.attack_states_rate(env, state_id)
                    * self.luk_effect_rate(env, subject, target)
            };
            if env.random() < chance {
                if let Some(target) = units.battler_mut(target_id) {
                    target.add_state(env, state_id);
                    make_success(target);
                }
            }
        }
    }

    /// Certain-hit items ignore state rate and luck.
    fn effect_add_normal_state(
        &self,
        env: &BattleEnv<'_>,
        units: &mut Combatants,
        target_id: BattlerId,
        effect: &Effect,
    ) {
        let (Some(subject), Some(target)) = (units.battler(self.subject), units.battler(target_id))
        else {
            return;
        };
        let mut chance = effect.value1;
        if !self.is_certain_hit(env) {
            chance *= target.state_rate(env, effect.data_id);
            chance *= self.luk_effect_rate(env, subject, target);
        }
        if env.random() < chance {
            if let Some(target) = units.battler_mut(target_id) {
                target.add_state(env, effect.data_id);
                make_success(target);
            }
        }
    }

    fn effect_add_debuff(&self, env: &BattleEnv<'_>, units: &mut Combatants, target_id: BattlerId, effect: &Effect) {
        let Some(param) = ParamId::from_data_id(effect.data_id) else {
            return;
        };
        let (Some(subject), Some(target)) = (units.battler(self.subject), units.battler(target_id))
        else {
            return;
        };
        let chance = target.debuff_rate(env, param) * self.luk_effect_rate(env, subject, target);
        if env.random() < chance {
            if let Some(target) = units.battler_mut(target_id) {
                target.add_debuff(env, param, effect.value1 as i32);
                make_success(target);
            }
        }
    }

    /// TP the user gains for using the item, `floor(tp_gain * tcr)`.
    fn apply_item_user_effect(&self, env: &BattleEnv<'_>, units: &mut Combatants) {
        let Some(item) = self.item(env) else {
            return;
        };
        if let Some(subject) = units.battler_mut(self.subject) {
            let value = (f64::from(item.tp_gain()) * subject.sparam(env, SParamId::Tcr)).floor() as i32;
            subject.gain_silent_tp(env, value);
        }
    }
}

fn make_success(target: &mut dyn Battler) {
    target.core_mut().result.success = true;
}

/// Effects that only read and write the target and draw at most once.
fn apply_target_only_effect(env: &BattleEnv<'_>, target: &mut dyn Battler, effect: &Effect, in_battle: bool) {
    let param = ParamId::from_data_id(effect.data_id);
    match effect.code {
        EffectCode::GainTp => {
            let value = effect.value1.floor() as i32;
            if value != 0 {
                target.gain_tp(env, value);
                make_success(target);
            }
        }
        EffectCode::RemoveState => {
            if env.random() < effect.value1 {
                target.remove_state(env, effect.data_id);
                make_success(target);
            }
        }
        EffectCode::AddBuff => {
            if let Some(param) = param {
                target.add_buff(env, param, effect.value1 as i32);
                make_success(target);
            }
        }
        EffectCode::RemoveBuff => {
            if let Some(param) = param.filter(|&p| target.is_buff_affected(p)) {
                target.remove_buff(env, param);
                make_success(target);
            }
        }
        EffectCode::RemoveDebuff => {
            if let Some(param) = param.filter(|&p| target.is_debuff_affected(p)) {
                target.remove_buff(env, param);
                make_success(target);
            }
        }
        EffectCode::Special => {
            if effect.data_id == SPECIAL_EFFECT_ESCAPE {
                target.escape(in_battle);
                make_success(target);
            }
        }
        EffectCode::Grow => {
            if let Some(param) = param {
                target.add_param(env, param, effect.value1.floor() as i32);
                make_success(target);
            }
        }
        EffectCode::LearnSkill => {
            if target.is_actor() {
                target.learn_skill(effect.data_id);
                make_success(target);
            }
        }
        // Reserved once per action through `Action::common_events`.
        EffectCode::CommonEvent => {}
        EffectCode::RecoverHp | EffectCode::RecoverMp | EffectCode::AddState | EffectCode::AddDebuff => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    fn hero_attacks_slime(rolls: &[f64]) -> (Fixture, Combatants) {
        let fx = Fixture::with_rolls(rolls);
        let units = {
            let env = fx.env();
            fx.combatants(&env, Fixture::LONE_SLIME)
        };
        (fx, units)
    }

    #[test]
    fn draws_hit_evade_critical_variance_in_order() {
        // hit, evade, critical, variance x2
        let (fx, mut units) = hero_attacks_slime(&[0.0, 0.99, 0.99, 0.5, 0.5]);
        let env = fx.env();
        let mut action = Action::new(BattlerId::Actor(Fixture::HERO));
        action.set_attack();
        action.apply(&env, &mut units, BattlerId::Enemy(0));
        assert_eq!(fx.rng.remaining(), 0);
        let result = units.battler(BattlerId::Enemy(0)).unwrap().result();
        assert!(result.is_hit());
        assert!(!result.critical);
        assert!(result.hp_damage > 0);
        assert!(result.success);
    }

    #[test]
    fn miss_stops_before_damage() {
        let (fx, mut units) = hero_attacks_slime(&[0.999, 0.0]);
        let env = fx.env();
        let mut action = Action::new(BattlerId::Actor(Fixture::HERO));
        action.set_attack();
        let before = units.battler(BattlerId::Enemy(0)).unwrap().hp();
        action.apply(&env, &mut units, BattlerId::Enemy(0));
        let slime = units.battler(BattlerId::Enemy(0)).unwrap();
        assert!(slime.result().missed);
        assert!(!slime.result().evaded);
        assert_eq!(slime.hp(), before);
    }

    #[test]
    fn heal_on_full_hp_outside_battle_is_unused() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut units = fx.combatants(&env, Fixture::LONE_SLIME);
        let mut action = Action::new(BattlerId::Actor(Fixture::HERO));
        action.set_skill(Fixture::HEAL);
        action.apply(&env, &mut units, BattlerId::Actor(Fixture::HERO));
        let hero = units.battler(BattlerId::Actor(Fixture::HERO)).unwrap();
        assert!(!hero.result().used);
    }

    #[test]
    fn drain_credits_reflection_target_once() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut units = fx.combatants(&env, Fixture::LONE_SLIME);
        if let Some(hero) = units.battler_mut(BattlerId::Actor(Fixture::HERO)) {
            let hp = hero.hp();
            hero.set_hp(&env, hp - 50);
        }
        if let Some(mage) = units.battler_mut(BattlerId::Actor(Fixture::MAGE)) {
            let hp = mage.hp();
            mage.set_hp(&env, hp - 50);
        }
        let mut action = Action::new(BattlerId::Actor(Fixture::HERO));
        action.set_skill(Fixture::DRAIN);
        action.set_reflection_target(Some(BattlerId::Actor(Fixture::MAGE)));
        action.apply(&env, &mut units, BattlerId::Enemy(0));
        assert_eq!(action.reflection_target(), None);
        let mage = units.battler(BattlerId::Actor(Fixture::MAGE)).unwrap();
        assert_eq!(mage.result().hp_damage, -30);
        let hero = units.battler(BattlerId::Actor(Fixture::HERO)).unwrap();
        assert_eq!(hero.result().hp_damage, 0);
    }

    #[test]
    fn certain_hit_state_ignores_rates() {
        let fx = Fixture::with_rolls(&[0.0, 0.0, 0.5]);
        let env = fx.env();
        let mut units = fx.combatants(&env, Fixture::LONE_SLIME);
        let mut action = Action::new(BattlerId::Actor(Fixture::HERO));
        action.set_skill(Fixture::POISON_TOUCH);
        action.apply(&env, &mut units, BattlerId::Enemy(0));
        let slime = units.battler(BattlerId::Enemy(0)).unwrap();
        assert!(slime.is_state_affected(Fixture::POISON_STATE));
        assert!(slime.result().is_state_added(Fixture::POISON_STATE));
    }

    #[test]
    fn user_gains_tp_from_item() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut units = fx.combatants(&env, Fixture::LONE_SLIME);
        let mut action = Action::new(BattlerId::Actor(Fixture::HERO));
        action.set_attack();
        action.apply(&env, &mut units, BattlerId::Enemy(0));
        let hero = units.battler(BattlerId::Actor(Fixture::HERO)).unwrap();
        assert_eq!(hero.tp(), 5);
    }
}
