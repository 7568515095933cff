//! Hit chances and the damage value pipeline.
//!
//! `formula → element → pdr/mdr → rec → critical → variance → guard → round`

use tracing::warn;

use super::Action;
use crate::battler::{Battler, BattlerStats, ParamId, SParamId, XParamId, round_half_up};
use crate::data::{DamageType, UsableItem};
use crate::env::BattleEnv;
use crate::formula::{FormulaScope, Operand};

/// Formula bindings: `a` is the subject, `b` the target, `v` the game
/// variables.
pub struct BattlerScope<'s, 'e> {
    env: &'s BattleEnv<'e>,
    subject: &'s dyn Battler,
    target: &'s dyn Battler,
}

impl<'s, 'e> BattlerScope<'s, 'e> {
    pub fn new(env: &'s BattleEnv<'e>, subject: &'s dyn Battler, target: &'s dyn Battler) -> Self {
        Self {
            env,
            subject,
            target,
        }
    }

    fn battler(&self, operand: Operand) -> &'s dyn Battler {
        match operand {
            Operand::Subject => self.subject,
            Operand::Target => self.target,
        }
    }
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

impl FormulaScope for BattlerScope<'_, '_> {
    fn property(&self, operand: Operand, name: &str) -> Option<f64> {
        let b = self.battler(operand);
        let env = self.env;
        let value = match name {
            "hp" => f64::from(b.hp()),
            "mp" => f64::from(b.mp()),
            "tp" => f64::from(b.tp()),
            "level" => f64::from(b.level().unwrap_or(0)),
            _ => {
                if let Some(param) = ParamId::from_name(name) {
                    f64::from(b.param(env, param))
                } else if let Some(x) = XParamId::from_name(name) {
                    b.xparam(env, x)
                } else {
                    b.sparam(env, SParamId::from_name(name)?)
                }
            }
        };
        Some(value)
    }

    fn method(&self, operand: Operand, name: &str, args: &[f64]) -> Option<f64> {
        let b = self.battler(operand);
        let env = self.env;
        let id = || args.first().copied().filter(|v| v.is_finite() && *v >= 0.0).map(|v| v as u32);
        let param = || id().and_then(ParamId::from_data_id);
        let value = match name {
            "hpRate" => b.hp_rate(env),
            "mpRate" => b.mp_rate(env),
            "tpRate" => b.tp_rate(),
            "isStateAffected" => flag(id().is_some_and(|s| b.is_state_affected(s))),
            "isBuffAffected" => flag(param().is_some_and(|p| b.is_buff_affected(p))),
            "isDebuffAffected" => flag(param().is_some_and(|p| b.is_debuff_affected(p))),
            "buff" => f64::from(param().map_or(0, |p| b.buff(p))),
            "param" => f64::from(param().map_or(0, |p| b.param(env, p))),
            "elementRate" => id().map_or(1.0, |e| b.element_rate(env, e)),
            "isActor" => flag(b.is_actor()),
            "isEnemy" => flag(b.is_enemy()),
            "isAlive" => flag(b.is_alive()),
            "isDead" => flag(b.is_dead()),
            "isGuard" => flag(b.is_guard(env)),
            "isDying" => flag(b.is_dying(env)),
            _ => return None,
        };
        Some(value)
    }

    fn variable(&self, id: u32) -> f64 {
        self.env.variables().variable(id)
    }

    fn random(&self) -> f64 {
        self.env.random()
    }
}

impl Action {
    // ===== chances =====

    /// Counter chance; only physical actions against a battler that can move.
    pub fn item_cnt(&self, env: &BattleEnv<'_>, target: &dyn Battler) -> f64 {
        if self.is_physical(env) && target.can_move(env) {
            target.xparam(env, XParamId::Cnt)
        } else {
            0.0
        }
    }

    pub fn item_mrf(&self, env: &BattleEnv<'_>, target: &dyn Battler) -> f64 {
        if self.is_magical(env) {
            target.xparam(env, XParamId::Mrf)
        } else {
            0.0
        }
    }

    pub fn item_hit(&self, env: &BattleEnv<'_>, subject: &dyn Battler) -> f64 {
        let Some(item) = self.item(env) else {
            return 0.0;
        };
        let rate = f64::from(item.success_rate()) * 0.01;
        if item.is_physical() {
            rate * subject.xparam(env, XParamId::Hit)
        } else {
            rate
        }
    }

    pub fn item_eva(&self, env: &BattleEnv<'_>, target: &dyn Battler) -> f64 {
        if self.is_physical(env) {
            target.xparam(env, XParamId::Eva)
        } else if self.is_magical(env) {
            target.xparam(env, XParamId::Mev)
        } else {
            0.0
        }
    }

    pub fn item_cri(&self, env: &BattleEnv<'_>, subject: &dyn Battler, target: &dyn Battler) -> f64 {
        match self.item(env) {
            Some(item) if item.damage().critical => {
                subject.xparam(env, XParamId::Cri) * (1.0 - target.xparam(env, XParamId::Cev))
            }
            _ => 0.0,
        }
    }

    /// Luck difference scales state and debuff chances by 0.1% per point.
    pub fn luk_effect_rate(&self, env: &BattleEnv<'_>, subject: &dyn Battler, target: &dyn Battler) -> f64 {
        (1.0 + f64::from(subject.luk(env) - target.luk(env)) * 0.001).max(0.0)
    }

    // ===== damage value =====

    pub(crate) fn damage_type(&self, env: &BattleEnv<'_>) -> DamageType {
        self.item(env).map_or(DamageType::None, |item| item.damage().kind)
    }

    pub fn is_hp_effect(&self, env: &BattleEnv<'_>) -> bool {
        self.damage_type(env).is_hp()
    }

    pub fn is_mp_effect(&self, env: &BattleEnv<'_>) -> bool {
        self.damage_type(env).is_mp()
    }

    pub fn is_drain(&self, env: &BattleEnv<'_>) -> bool {
        self.damage_type(env).is_drain()
    }

    pub fn is_hp_recover(&self, env: &BattleEnv<'_>) -> bool {
        self.damage_type(env) == DamageType::HpRecover
    }

    pub fn is_mp_recover(&self, env: &BattleEnv<'_>) -> bool {
        self.damage_type(env) == DamageType::MpRecover
    }

    /// Final damage against `target`; negative values heal. Consumes the
    /// variance draws.
    pub fn make_damage_value(
        &self,
        env: &BattleEnv<'_>,
        subject: &dyn Battler,
        target: &dyn Battler,
        critical: bool,
    ) -> i32 {
        let Some(item) = self.item(env) else {
            return 0;
        };
        let base = self.eval_damage_formula(env, item, subject, target);
        let mut value = base * self.calc_element_rate(env, item, subject, target);
        if item.is_physical() {
            value *= target.sparam(env, SParamId::Pdr);
        }
        if item.is_magical() {
            value *= target.sparam(env, SParamId::Mdr);
        }
        if base < 0.0 {
            value *= target.sparam(env, SParamId::Rec);
        }
        if critical {
            value = apply_critical(value);
        }
        value = apply_variance(env, value, item.damage().variance);
        value = apply_guard(env, value, target);
        round_half_up(value) as i32
    }

    /// Formula value floored at 0, negated for recovery types. Any failure
    /// or non-finite result is 0.
    pub fn eval_damage_formula(
        &self,
        env: &BattleEnv<'_>,
        item: UsableItem<'_>,
        subject: &dyn Battler,
        target: &dyn Battler,
    ) -> f64 {
        let damage = item.damage();
        let scope = BattlerScope::new(env, subject, target);
        let raw = match damage.formula.evaluate(&scope) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(item = item.id(), formula = damage.formula.source(), %err, "damage formula failed");
                return 0.0;
            }
        };
        let sign = if damage.kind.is_recover() { -1.0 } else { 1.0 };
        let value = raw.max(0.0) * sign;
        if value.is_finite() { value } else { 0.0 }
    }

    /// Element rate of the item's element; element -1 uses the strongest of
    /// the subject's attack elements.
    pub fn calc_element_rate(
        &self,
        env: &BattleEnv<'_>,
        item: UsableItem<'_>,
        subject: &dyn Battler,
        target: &dyn Battler,
    ) -> f64 {
        match u32::try_from(item.damage().element_id) {
            Ok(element_id) => target.element_rate(env, element_id),
            Err(_) => elements_max_rate(env, target, &subject.attack_elements(env)),
        }
    }
}

pub fn elements_max_rate(env: &BattleEnv<'_>, target: &dyn Battler, elements: &[u32]) -> f64 {
    if elements.is_empty() {
        return 1.0;
    }
    elements
        .iter()
        .map(|&id| target.element_rate(env, id))
        .fold(f64::NEG_INFINITY, f64::max)
}

pub fn apply_critical(damage: f64) -> f64 {
    damage * 3.0
}

/// Spreads `damage` by up to `variance` percent in either direction, away
/// from zero for positive and negative values alike. Draws twice.
pub fn apply_variance(env: &BattleEnv<'_>, damage: f64, variance: i32) -> f64 {
    let amp = (damage.abs() * f64::from(variance) / 100.0).max(0.0).floor() as i32;
    let v = env.random_int(amp + 1) + env.random_int(amp + 1) - amp;
    if damage >= 0.0 {
        damage + f64::from(v)
    } else {
        damage - f64::from(v)
    }
}

/// Positive damage to a guarding target is divided by `2 * grd`.
pub fn apply_guard(env: &BattleEnv<'_>, damage: f64, target: &dyn Battler) -> f64 {
    if damage > 0.0 && target.is_guard(env) {
        damage / (2.0 * target.sparam(env, SParamId::Grd))
    } else {
        damage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battler::{Actor, BattlerOps, Enemy};
    use crate::testing::Fixture;

    #[test]
    fn zero_variance_keeps_damage() {
        let fx = Fixture::new();
        let env = fx.env();
        assert_eq!(apply_variance(&env, 200.0, 0), 200.0);
        assert_eq!(apply_variance(&env, -35.0, 0), -35.0);
    }

    #[test]
    fn variance_spreads_symmetrically() {
        let fx = Fixture::with_rolls(&[0.99, 0.99, 0.0, 0.0]);
        let env = fx.env();
        assert_eq!(apply_variance(&env, 100.0, 20), 120.0);
        assert_eq!(apply_variance(&env, -100.0, 20), -80.0);
    }

    #[test]
    fn guard_halves_only_positive_damage() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut slime = Enemy::new(&env, 0, Fixture::SLIME, 0, 0).unwrap();
        assert_eq!(apply_guard(&env, 100.0, &slime), 100.0);
        slime.add_state(&env, Fixture::GUARD_STATE);
        assert!(slime.is_guard(&env));
        assert_eq!(apply_guard(&env, 100.0, &slime), 50.0);
        assert_eq!(apply_guard(&env, -100.0, &slime), -100.0);
    }

    #[test]
    fn negative_formula_is_floored_before_sign() {
        let fx = Fixture::new();
        let env = fx.env();
        let hero = Actor::new(&env, Fixture::MAGE).unwrap();
        let mut slime = Enemy::new(&env, 0, Fixture::SLIME, 0, 0).unwrap();
        slime.add_param(&env, ParamId::Def, 500);
        let mut action = Action::new(hero.battler_id());
        action.set_attack();
        let item = action.item(&env).unwrap();
        assert_eq!(action.eval_damage_formula(&env, item, &hero, &slime), 0.0);
    }

    #[test]
    fn recovery_formula_is_negated() {
        let fx = Fixture::new();
        let env = fx.env();
        let hero = Actor::new(&env, Fixture::HERO).unwrap();
        let mut action = Action::new(hero.battler_id());
        action.set_skill(Fixture::HEAL);
        let item = action.item(&env).unwrap();
        assert_eq!(action.eval_damage_formula(&env, item, &hero, &hero), -100.0);
    }

    #[test]
    fn attack_element_uses_strongest_weakness() {
        let fx = Fixture::new();
        let env = fx.env();
        let hero = Actor::new(&env, Fixture::HERO).unwrap();
        let bat = Enemy::new(&env, 0, Fixture::BAT, 0, 0).unwrap();
        let mut action = Action::new(hero.battler_id());
        action.set_attack();
        let item = action.item(&env).unwrap();
        assert_eq!(action.calc_element_rate(&env, item, &hero, &bat), 2.0);
        assert_eq!(elements_max_rate(&env, &bat, &[]), 1.0);
    }

    #[test]
    fn broken_formula_deals_nothing() {
        let fx = Fixture::new();
        let env = fx.env();
        let hero = Actor::new(&env, Fixture::HERO).unwrap();
        let slime = Enemy::new(&env, 0, Fixture::SLIME, 0, 0).unwrap();
        let mut action = Action::new(hero.battler_id());
        action.set_skill(Fixture::BROKEN);
        let item = action.item(&env).unwrap();
        assert_eq!(action.eval_damage_formula(&env, item, &hero, &slime), 0.0);
    }

    #[test]
    fn scope_exposes_battler_accessors() {
        let fx = Fixture::new();
        let env = fx.env();
        let hero = Actor::new(&env, Fixture::HERO).unwrap();
        let slime = Enemy::new(&env, 0, Fixture::SLIME, 0, 0).unwrap();
        let scope = BattlerScope::new(&env, &hero, &slime);
        assert_eq!(scope.property(Operand::Subject, "atk"), Some(f64::from(hero.atk(&env))));
        assert_eq!(scope.property(Operand::Target, "hp"), Some(f64::from(slime.hp())));
        assert_eq!(scope.property(Operand::Subject, "level"), Some(1.0));
        assert_eq!(scope.property(Operand::Target, "tgr"), Some(1.0));
        assert_eq!(scope.method(Operand::Target, "isEnemy", &[]), Some(1.0));
        assert_eq!(scope.method(Operand::Target, "isStateAffected", &[1.0]), Some(0.0));
        assert_eq!(scope.property(Operand::Subject, "secret"), None);
    }
}
