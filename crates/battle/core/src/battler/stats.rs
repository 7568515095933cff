//! Read-only battler queries shared by actors and enemies.

use super::{ActionResult, ActionState, Battler, ParamId, SParamId, XParamId, round_half_up};
use crate::action::Action;
use crate::config::BattleConfig;
use crate::data::{
    EffectCode, ItemData, Occasion, PartyAbilities, SkillData, SpecialFlags, StateData, Trait,
    TraitCode, UsableItem,
};
use crate::env::{BattleEnv, DataOracle};
use crate::unit::Inventory;

/// Circumstances an item or skill is used in.
#[derive(Clone, Copy, Debug)]
pub struct UseContext<'a> {
    pub in_battle: bool,
    /// The current battle allows escaping; escape effects are otherwise
    /// unusable by actors.
    pub can_escape: bool,
    pub inventory: Option<&'a Inventory>,
}

impl<'a> UseContext<'a> {
    pub const fn battle(inventory: &'a Inventory, can_escape: bool) -> Self {
        Self {
            in_battle: true,
            can_escape,
            inventory: Some(inventory),
        }
    }

    pub const fn menu(inventory: &'a Inventory) -> Self {
        Self {
            in_battle: false,
            can_escape: true,
            inventory: Some(inventory),
        }
    }
}

fn traits_of<'a, B>(
    battler: &'a B,
    data: &'a dyn DataOracle,
    code: TraitCode,
) -> impl Iterator<Item = &'a Trait> + 'a
where
    B: Battler + ?Sized,
{
    battler
        .trait_objects(data)
        .into_iter()
        .flatten()
        .filter(move |t| t.code == code)
}

/// Queries available on every battler, including `dyn Battler`.
pub trait BattlerStats: Battler {
    // ===== vitals =====

    fn hp(&self) -> i32 {
        self.core().hp
    }

    fn mp(&self) -> i32 {
        self.core().mp
    }

    fn tp(&self) -> i32 {
        self.core().tp
    }

    fn max_tp(&self) -> i32 {
        BattleConfig::MAX_TP
    }

    fn mhp(&self, env: &BattleEnv<'_>) -> i32 {
        self.param(env, ParamId::Mhp)
    }

    fn mmp(&self, env: &BattleEnv<'_>) -> i32 {
        self.param(env, ParamId::Mmp)
    }

    fn hp_rate(&self, env: &BattleEnv<'_>) -> f64 {
        f64::from(self.hp()) / f64::from(self.mhp(env).max(1))
    }

    fn mp_rate(&self, env: &BattleEnv<'_>) -> f64 {
        let mmp = self.mmp(env);
        if mmp > 0 {
            f64::from(self.mp()) / f64::from(mmp)
        } else {
            0.0
        }
    }

    fn tp_rate(&self) -> f64 {
        f64::from(self.tp()) / f64::from(self.max_tp())
    }

    // ===== trait aggregation =====

    fn traits_pi(&self, env: &BattleEnv<'_>, code: TraitCode, data_id: u32) -> f64 {
        traits_of(self, env.data(), code)
            .filter(|t| t.data_id == data_id)
            .fold(1.0, |acc, t| acc * t.value)
    }

    fn traits_sum(&self, env: &BattleEnv<'_>, code: TraitCode, data_id: u32) -> f64 {
        traits_of(self, env.data(), code)
            .filter(|t| t.data_id == data_id)
            .map(|t| t.value)
            .sum()
    }

    fn traits_sum_all(&self, env: &BattleEnv<'_>, code: TraitCode) -> f64 {
        traits_of(self, env.data(), code).map(|t| t.value).sum()
    }

    /// Distinct `data_id`s of the traits with `code`, in first-seen order.
    fn traits_set(&self, env: &BattleEnv<'_>, code: TraitCode) -> Vec<u32> {
        let mut set = Vec::new();
        for t in traits_of(self, env.data(), code) {
            if !set.contains(&t.data_id) {
                set.push(t.data_id);
            }
        }
        set
    }

    fn has_trait(&self, env: &BattleEnv<'_>, code: TraitCode, data_id: u32) -> bool {
        traits_of(self, env.data(), code).any(|t| t.data_id == data_id)
    }

    // ===== params =====

    fn param_min(&self, param: ParamId) -> i32 {
        if param == ParamId::Mmp { 0 } else { 1 }
    }

    fn param_rate(&self, env: &BattleEnv<'_>, param: ParamId) -> f64 {
        self.traits_pi(env, TraitCode::Param, param.index() as u32)
    }

    fn param_buff_rate(&self, param: ParamId) -> f64 {
        f64::from(self.buff(param)) * 0.25 + 1.0
    }

    fn param(&self, env: &BattleEnv<'_>, param: ParamId) -> i32 {
        let base = self.param_base(env.data(), param) + self.param_plus(env.data(), param);
        let value = f64::from(base) * self.param_rate(env, param) * self.param_buff_rate(param);
        let max = f64::from(self.param_max(param));
        let min = f64::from(self.param_min(param));
        round_half_up(value.min(max).max(min)) as i32
    }

    fn atk(&self, env: &BattleEnv<'_>) -> i32 {
        self.param(env, ParamId::Atk)
    }

    fn def(&self, env: &BattleEnv<'_>) -> i32 {
        self.param(env, ParamId::Def)
    }

    fn mat(&self, env: &BattleEnv<'_>) -> i32 {
        self.param(env, ParamId::Mat)
    }

    fn mdf(&self, env: &BattleEnv<'_>) -> i32 {
        self.param(env, ParamId::Mdf)
    }

    fn agi(&self, env: &BattleEnv<'_>) -> i32 {
        self.param(env, ParamId::Agi)
    }

    fn luk(&self, env: &BattleEnv<'_>) -> i32 {
        self.param(env, ParamId::Luk)
    }

    fn xparam(&self, env: &BattleEnv<'_>, id: XParamId) -> f64 {
        self.traits_sum(env, TraitCode::XParam, id.index() as u32)
    }

    fn sparam(&self, env: &BattleEnv<'_>, id: SParamId) -> f64 {
        self.traits_pi(env, TraitCode::SParam, id.index() as u32)
    }

    // ===== rates and sets =====

    fn element_rate(&self, env: &BattleEnv<'_>, element_id: u32) -> f64 {
        self.traits_pi(env, TraitCode::ElementRate, element_id)
    }

    fn debuff_rate(&self, env: &BattleEnv<'_>, param: ParamId) -> f64 {
        self.traits_pi(env, TraitCode::DebuffRate, param.index() as u32)
    }

    fn state_rate(&self, env: &BattleEnv<'_>, state_id: u32) -> f64 {
        self.traits_pi(env, TraitCode::StateRate, state_id)
    }

    fn state_resist_set(&self, env: &BattleEnv<'_>) -> Vec<u32> {
        self.traits_set(env, TraitCode::StateResist)
    }

    fn is_state_resist(&self, env: &BattleEnv<'_>, state_id: u32) -> bool {
        self.has_trait(env, TraitCode::StateResist, state_id)
    }

    fn attack_elements(&self, env: &BattleEnv<'_>) -> Vec<u32> {
        let mut set = self.traits_set(env, TraitCode::AttackElement);
        let bare_hands = BattleConfig::BARE_HANDS_ELEMENT_ID as u32;
        if self.has_no_weapons(env.data()) && !set.contains(&bare_hands) {
            set.push(bare_hands);
        }
        set
    }

    fn attack_states(&self, env: &BattleEnv<'_>) -> Vec<u32> {
        self.traits_set(env, TraitCode::AttackState)
    }

    fn attack_states_rate(&self, env: &BattleEnv<'_>, state_id: u32) -> f64 {
        self.traits_sum(env, TraitCode::AttackState, state_id)
    }

    fn attack_speed(&self, env: &BattleEnv<'_>) -> f64 {
        self.traits_sum_all(env, TraitCode::AttackSpeed)
    }

    fn attack_times_add(&self, env: &BattleEnv<'_>) -> f64 {
        self.traits_sum_all(env, TraitCode::AttackTimes).max(0.0)
    }

    fn added_skill_types(&self, env: &BattleEnv<'_>) -> Vec<u32> {
        self.traits_set(env, TraitCode::StypeAdd)
    }

    fn is_skill_type_sealed(&self, env: &BattleEnv<'_>, stype_id: u32) -> bool {
        self.has_trait(env, TraitCode::StypeSeal, stype_id)
    }

    fn added_skills(&self, env: &BattleEnv<'_>) -> Vec<u32> {
        self.traits_set(env, TraitCode::SkillAdd)
    }

    fn is_skill_sealed(&self, env: &BattleEnv<'_>, skill_id: u32) -> bool {
        self.has_trait(env, TraitCode::SkillSeal, skill_id)
    }

    fn is_equip_wtype_ok(&self, env: &BattleEnv<'_>, wtype_id: u32) -> bool {
        self.has_trait(env, TraitCode::EquipWtype, wtype_id)
    }

    fn is_equip_atype_ok(&self, env: &BattleEnv<'_>, atype_id: u32) -> bool {
        self.has_trait(env, TraitCode::EquipAtype, atype_id)
    }

    fn is_equip_type_locked(&self, env: &BattleEnv<'_>, etype_id: u32) -> bool {
        self.has_trait(env, TraitCode::EquipLock, etype_id)
    }

    fn is_equip_type_sealed(&self, env: &BattleEnv<'_>, etype_id: u32) -> bool {
        self.has_trait(env, TraitCode::EquipSeal, etype_id)
    }

    fn slot_type(&self, env: &BattleEnv<'_>) -> u32 {
        self.traits_set(env, TraitCode::SlotType)
            .into_iter()
            .max()
            .unwrap_or(0)
    }

    fn is_dual_wield(&self, env: &BattleEnv<'_>) -> bool {
        self.slot_type(env) == 1
    }

    /// Chances of each extra action per turn.
    fn action_plus_set(&self, env: &BattleEnv<'_>) -> Vec<f64> {
        traits_of(self, env.data(), TraitCode::ActionPlus)
            .map(|t| t.value)
            .collect()
    }

    fn special_flags(&self, env: &BattleEnv<'_>) -> SpecialFlags {
        traits_of(self, env.data(), TraitCode::SpecialFlag)
            .fold(SpecialFlags::empty(), |acc, t| {
                acc | SpecialFlags::from_id(t.data_id)
            })
    }

    fn collapse_type(&self, env: &BattleEnv<'_>) -> u32 {
        self.traits_set(env, TraitCode::CollapseType)
            .into_iter()
            .max()
            .unwrap_or(0)
    }

    fn party_abilities(&self, env: &BattleEnv<'_>) -> PartyAbilities {
        traits_of(self, env.data(), TraitCode::PartyAbility)
            .fold(PartyAbilities::empty(), |acc, t| {
                acc | PartyAbilities::from_id(t.data_id)
            })
    }

    fn is_auto_battle(&self, env: &BattleEnv<'_>) -> bool {
        self.special_flags(env).contains(SpecialFlags::AUTO_BATTLE)
    }

    fn is_guard(&self, env: &BattleEnv<'_>) -> bool {
        self.special_flags(env).contains(SpecialFlags::GUARD) && self.can_move(env)
    }

    fn is_substitute(&self, env: &BattleEnv<'_>) -> bool {
        self.special_flags(env).contains(SpecialFlags::SUBSTITUTE) && self.can_move(env)
    }

    fn is_preserve_tp(&self, env: &BattleEnv<'_>) -> bool {
        self.special_flags(env).contains(SpecialFlags::PRESERVE_TP)
    }

    // ===== states =====

    fn states(&self) -> &[u32] {
        &self.core().states
    }

    fn state_objects<'a>(&self, env: &BattleEnv<'a>) -> Vec<&'a StateData> {
        self.states()
            .iter()
            .filter_map(|&id| env.state(id))
            .collect()
    }

    fn is_state_affected(&self, state_id: u32) -> bool {
        self.core().states.contains(&state_id)
    }

    fn is_death_state_affected(&self) -> bool {
        self.is_state_affected(BattleConfig::DEATH_STATE_ID)
    }

    fn state_turns(&self, state_id: u32) -> Option<i32> {
        self.core().state_turns.get(&state_id).copied()
    }

    fn is_state_expired(&self, state_id: u32) -> bool {
        self.state_turns(state_id) == Some(0)
    }

    fn restriction(&self, env: &BattleEnv<'_>) -> u8 {
        self.state_objects(env)
            .iter()
            .map(|state| state.restriction)
            .max()
            .unwrap_or(0)
    }

    /// Persisting-state message of the highest-priority state that has one.
    fn most_important_state_text<'a>(&self, env: &BattleEnv<'a>) -> Option<&'a str> {
        self.state_objects(env)
            .into_iter()
            .map(|state| state.message3.as_str())
            .find(|text| !text.is_empty())
    }

    // ===== buffs =====

    fn buff(&self, param: ParamId) -> i32 {
        self.core().buffs[param.index()]
    }

    fn buff_turns(&self, param: ParamId) -> i32 {
        self.core().buff_turns[param.index()]
    }

    fn is_buff_affected(&self, param: ParamId) -> bool {
        self.buff(param) > 0
    }

    fn is_debuff_affected(&self, param: ParamId) -> bool {
        self.buff(param) < 0
    }

    fn is_buff_or_debuff_affected(&self, param: ParamId) -> bool {
        self.buff(param) != 0
    }

    fn is_max_buff_affected(&self, param: ParamId) -> bool {
        self.buff(param) == BattleConfig::MAX_BUFF_LEVEL
    }

    fn is_max_debuff_affected(&self, param: ParamId) -> bool {
        self.buff(param) == -BattleConfig::MAX_BUFF_LEVEL
    }

    fn is_buff_expired(&self, param: ParamId) -> bool {
        self.buff_turns(param) == 0
    }

    // ===== existence and restriction =====

    fn is_hidden(&self) -> bool {
        self.core().hidden
    }

    fn is_appeared(&self) -> bool {
        !self.is_hidden()
    }

    fn is_dead(&self) -> bool {
        self.is_appeared() && self.is_death_state_affected()
    }

    fn is_alive(&self) -> bool {
        self.is_appeared() && !self.is_death_state_affected()
    }

    fn is_dying(&self, env: &BattleEnv<'_>) -> bool {
        self.is_alive() && f64::from(self.hp()) < f64::from(self.mhp(env)) / 4.0
    }

    fn is_restricted(&self, env: &BattleEnv<'_>) -> bool {
        self.is_appeared() && self.restriction(env) > 0
    }

    fn can_input(&self, env: &BattleEnv<'_>) -> bool {
        self.is_appeared() && !self.is_restricted(env) && !self.is_auto_battle(env)
    }

    fn can_move(&self, env: &BattleEnv<'_>) -> bool {
        self.is_appeared() && self.restriction(env) < 4
    }

    fn is_confused(&self, env: &BattleEnv<'_>) -> bool {
        self.is_appeared() && (1..=3).contains(&self.restriction(env))
    }

    fn confusion_level(&self, env: &BattleEnv<'_>) -> u8 {
        if self.is_confused(env) {
            self.restriction(env)
        } else {
            0
        }
    }

    /// Largest slip damage regeneration may deal this turn.
    fn max_slip_damage(&self, env: &BattleEnv<'_>) -> i32 {
        if env.config().slip_death {
            self.hp()
        } else {
            (self.hp() - 1).max(0)
        }
    }

    // ===== skill costs and usability =====

    fn skill_mp_cost(&self, env: &BattleEnv<'_>, skill: &SkillData) -> i32 {
        (f64::from(skill.mp_cost) * self.sparam(env, SParamId::Mcr)).floor() as i32
    }

    fn skill_tp_cost(&self, skill: &SkillData) -> i32 {
        skill.tp_cost
    }

    fn can_pay_skill_cost(&self, env: &BattleEnv<'_>, skill: &SkillData) -> bool {
        self.tp() >= self.skill_tp_cost(skill) && self.mp() >= self.skill_mp_cost(env, skill)
    }

    fn is_occasion_ok(&self, item: UsableItem<'_>, ctx: &UseContext<'_>) -> bool {
        match item.occasion() {
            Occasion::Always => true,
            Occasion::Battle => ctx.in_battle,
            Occasion::Menu => !ctx.in_battle,
            Occasion::Never => false,
        }
    }

    fn meets_usable_item_conditions(
        &self,
        env: &BattleEnv<'_>,
        item: UsableItem<'_>,
        ctx: &UseContext<'_>,
    ) -> bool {
        if !self.can_move(env) || !self.is_occasion_ok(item, ctx) {
            return false;
        }
        // Actors may not pick an escape effect in a battle that forbids escape.
        let escape_blocked = self.is_actor()
            && ctx.in_battle
            && !ctx.can_escape
            && item
                .effects()
                .iter()
                .any(|effect| effect.code == EffectCode::Special);
        !escape_blocked
    }

    fn meets_skill_conditions(
        &self,
        env: &BattleEnv<'_>,
        skill: &SkillData,
        ctx: &UseContext<'_>,
    ) -> bool {
        self.meets_usable_item_conditions(env, UsableItem::Skill(skill), ctx)
            && self.is_skill_wtype_ok(env.data(), skill)
            && self.can_pay_skill_cost(env, skill)
            && !self.is_skill_sealed(env, skill.id)
            && !self.is_skill_type_sealed(env, skill.stype_id)
    }

    fn meets_item_conditions(
        &self,
        env: &BattleEnv<'_>,
        item: &ItemData,
        ctx: &UseContext<'_>,
    ) -> bool {
        self.meets_usable_item_conditions(env, UsableItem::Item(item), ctx)
            && ctx.inventory.is_some_and(|inv| inv.has_item(item.id))
    }

    fn can_use(&self, env: &BattleEnv<'_>, item: UsableItem<'_>, ctx: &UseContext<'_>) -> bool {
        match item {
            UsableItem::Skill(skill) => self.meets_skill_conditions(env, skill, ctx),
            UsableItem::Item(data) => self.meets_item_conditions(env, data, ctx),
        }
    }

    fn can_attack(&self, env: &BattleEnv<'_>, ctx: &UseContext<'_>) -> bool {
        env.skill_item(BattleConfig::ATTACK_SKILL_ID)
            .is_some_and(|item| self.can_use(env, item, ctx))
    }

    fn can_guard(&self, env: &BattleEnv<'_>, ctx: &UseContext<'_>) -> bool {
        env.skill_item(BattleConfig::GUARD_SKILL_ID)
            .is_some_and(|item| self.can_use(env, item, ctx))
    }

    // ===== actions =====

    fn actions(&self) -> &[Action] {
        &self.core().actions
    }

    fn num_actions(&self) -> usize {
        self.core().actions.len()
    }

    fn current_action(&self) -> Option<&Action> {
        self.core().actions.first()
    }

    fn speed(&self) -> i32 {
        self.core().speed
    }

    fn action_state(&self) -> ActionState {
        self.core().action_state
    }

    fn is_undecided(&self) -> bool {
        self.action_state() == ActionState::Undecided
    }

    fn is_inputting(&self) -> bool {
        self.action_state() == ActionState::Inputting
    }

    fn is_waiting(&self) -> bool {
        self.action_state() == ActionState::Waiting
    }

    fn is_acting(&self) -> bool {
        self.action_state() == ActionState::Acting
    }

    fn last_target_index(&self) -> i32 {
        self.core().last_target_index
    }

    fn result(&self) -> &ActionResult {
        &self.core().result
    }
}

impl<T: Battler + ?Sized> BattlerStats for T {}
