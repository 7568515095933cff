//! Skills and items, and the shared view over both.

use super::Effect;
use crate::formula::DamageFormula;

data_code! {
    pub enum DamageType {
        None = 0,
        HpDamage = 1,
        MpDamage = 2,
        HpRecover = 3,
        MpRecover = 4,
        HpDrain = 5,
        MpDrain = 6,
    }
}

impl DamageType {
    pub const fn is_hp(self) -> bool {
        matches!(self, Self::HpDamage | Self::HpRecover | Self::HpDrain)
    }

    pub const fn is_mp(self) -> bool {
        matches!(self, Self::MpDamage | Self::MpRecover | Self::MpDrain)
    }

    pub const fn is_damage(self) -> bool {
        matches!(self, Self::HpDamage | Self::MpDamage)
    }

    pub const fn is_recover(self) -> bool {
        matches!(self, Self::HpRecover | Self::MpRecover)
    }

    pub const fn is_drain(self) -> bool {
        matches!(self, Self::HpDrain | Self::MpDrain)
    }
}

impl Default for DamageType {
    fn default() -> Self {
        Self::None
    }
}

data_code! {
    pub enum HitType {
        Certain = 0,
        Physical = 1,
        Magical = 2,
    }
}

impl Default for HitType {
    fn default() -> Self {
        Self::Certain
    }
}

data_code! {
    /// Targeting category of a skill or item.
    pub enum Scope {
        None = 0,
        OneEnemy = 1,
        AllEnemies = 2,
        OneRandomEnemy = 3,
        TwoRandomEnemies = 4,
        ThreeRandomEnemies = 5,
        FourRandomEnemies = 6,
        OneAlly = 7,
        AllAllies = 8,
        OneDeadAlly = 9,
        AllDeadAllies = 10,
        User = 11,
    }
}

impl Scope {
    pub const fn is_for_opponent(self) -> bool {
        let code = self as u8;
        code >= 1 && code <= 6
    }

    pub const fn is_for_friend(self) -> bool {
        let code = self as u8;
        code >= 7 && code <= 11
    }

    pub const fn is_for_dead_friend(self) -> bool {
        matches!(self, Self::OneDeadAlly | Self::AllDeadAllies)
    }

    pub const fn is_for_user(self) -> bool {
        matches!(self, Self::User)
    }

    pub const fn is_for_one(self) -> bool {
        matches!(
            self,
            Self::OneEnemy | Self::OneRandomEnemy | Self::OneAlly | Self::OneDeadAlly | Self::User
        )
    }

    pub const fn is_for_random(self) -> bool {
        let code = self as u8;
        code >= 3 && code <= 6
    }

    pub const fn is_for_all(self) -> bool {
        matches!(self, Self::AllEnemies | Self::AllAllies | Self::AllDeadAllies)
    }

    pub const fn needs_selection(self) -> bool {
        matches!(self, Self::OneEnemy | Self::OneAlly | Self::OneDeadAlly)
    }

    /// Number of random picks for the random-enemy scopes.
    pub const fn random_count(self) -> usize {
        if self.is_for_random() {
            self as usize - 2
        } else {
            0
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::None
    }
}

data_code! {
    pub enum Occasion {
        Always = 0,
        Battle = 1,
        Menu = 2,
        Never = 3,
    }
}

impl Default for Occasion {
    fn default() -> Self {
        Self::Always
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct Damage {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: DamageType,
    pub element_id: i32,
    pub formula: DamageFormula,
    pub variance: i32,
    pub critical: bool,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct SkillData {
    pub id: u32,
    pub name: String,
    pub stype_id: u32,
    pub mp_cost: i32,
    pub tp_cost: i32,
    pub tp_gain: i32,
    pub scope: Scope,
    pub occasion: Occasion,
    pub speed: i32,
    pub success_rate: i32,
    pub repeats: i32,
    pub hit_type: HitType,
    pub animation_id: i32,
    pub damage: Damage,
    pub effects: Vec<Effect>,
    pub message1: String,
    pub message2: String,
    pub required_wtype_id1: u32,
    pub required_wtype_id2: u32,
}

impl Default for SkillData {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            stype_id: 0,
            mp_cost: 0,
            tp_cost: 0,
            tp_gain: 0,
            scope: Scope::OneEnemy,
            occasion: Occasion::Battle,
            speed: 0,
            success_rate: 100,
            repeats: 1,
            hit_type: HitType::Certain,
            animation_id: 0,
            damage: Damage::default(),
            effects: Vec::new(),
            message1: String::new(),
            message2: String::new(),
            required_wtype_id1: 0,
            required_wtype_id2: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct ItemData {
    pub id: u32,
    pub name: String,
    pub itype_id: u32,
    pub consumable: bool,
    pub price: i32,
    pub tp_gain: i32,
    pub scope: Scope,
    pub occasion: Occasion,
    pub speed: i32,
    pub success_rate: i32,
    pub repeats: i32,
    pub hit_type: HitType,
    pub animation_id: i32,
    pub damage: Damage,
    pub effects: Vec<Effect>,
}

impl Default for ItemData {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            itype_id: 1,
            consumable: true,
            price: 0,
            tp_gain: 0,
            scope: Scope::OneAlly,
            occasion: Occasion::Always,
            speed: 0,
            success_rate: 100,
            repeats: 1,
            hit_type: HitType::Certain,
            animation_id: 0,
            damage: Damage::default(),
            effects: Vec::new(),
        }
    }
}

/// Borrowed view over a skill or an item.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UsableItem<'a> {
    Skill(&'a SkillData),
    Item(&'a ItemData),
}

impl<'a> UsableItem<'a> {
    pub const fn is_skill(&self) -> bool {
        matches!(self, Self::Skill(_))
    }

    pub const fn is_item(&self) -> bool {
        matches!(self, Self::Item(_))
    }

    pub const fn id(&self) -> u32 {
        match self {
            Self::Skill(skill) => skill.id,
            Self::Item(item) => item.id,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            Self::Skill(skill) => &skill.name,
            Self::Item(item) => &item.name,
        }
    }

    pub const fn scope(&self) -> Scope {
        match self {
            Self::Skill(skill) => skill.scope,
            Self::Item(item) => item.scope,
        }
    }

    pub const fn occasion(&self) -> Occasion {
        match self {
            Self::Skill(skill) => skill.occasion,
            Self::Item(item) => item.occasion,
        }
    }

    pub const fn speed(&self) -> i32 {
        match self {
            Self::Skill(skill) => skill.speed,
            Self::Item(item) => item.speed,
        }
    }

    pub const fn success_rate(&self) -> i32 {
        match self {
            Self::Skill(skill) => skill.success_rate,
            Self::Item(item) => item.success_rate,
        }
    }

    pub const fn repeats(&self) -> i32 {
        match self {
            Self::Skill(skill) => skill.repeats,
            Self::Item(item) => item.repeats,
        }
    }

    pub const fn tp_gain(&self) -> i32 {
        match self {
            Self::Skill(skill) => skill.tp_gain,
            Self::Item(item) => item.tp_gain,
        }
    }

    pub const fn hit_type(&self) -> HitType {
        match self {
            Self::Skill(skill) => skill.hit_type,
            Self::Item(item) => item.hit_type,
        }
    }

    pub const fn animation_id(&self) -> i32 {
        match self {
            Self::Skill(skill) => skill.animation_id,
            Self::Item(item) => item.animation_id,
        }
    }

    pub fn damage(&self) -> &'a Damage {
        match self {
            Self::Skill(skill) => &skill.damage,
            Self::Item(item) => &item.damage,
        }
    }

    pub fn effects(&self) -> &'a [Effect] {
        match self {
            Self::Skill(skill) => &skill.effects,
            Self::Item(item) => &item.effects,
        }
    }

    pub const fn is_certain_hit(&self) -> bool {
        matches!(self.hit_type(), HitType::Certain)
    }

    pub const fn is_physical(&self) -> bool {
        matches!(self.hit_type(), HitType::Physical)
    }

    pub const fn is_magical(&self) -> bool {
        matches!(self.hit_type(), HitType::Magical)
    }
}
