//! Traits: typed modifiers carried by actors, classes, equipment, enemies
//! and states.

use bitflags::bitflags;

data_code! {
    /// What a [`Trait`] modifies. `data_id` and `value` are read according to
    /// the code (element id, param id, state id, flag id, ...).
    pub enum TraitCode {
        ElementRate = 11,
        DebuffRate = 12,
        StateRate = 13,
        StateResist = 14,
        Param = 21,
        XParam = 22,
        SParam = 23,
        AttackElement = 31,
        AttackState = 32,
        AttackSpeed = 33,
        AttackTimes = 34,
        StypeAdd = 41,
        StypeSeal = 42,
        SkillAdd = 43,
        SkillSeal = 44,
        EquipWtype = 51,
        EquipAtype = 52,
        EquipLock = 53,
        EquipSeal = 54,
        SlotType = 55,
        ActionPlus = 61,
        SpecialFlag = 62,
        CollapseType = 63,
        PartyAbility = 64,
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Trait {
    pub code: TraitCode,
    #[cfg_attr(feature = "serde", serde(default))]
    pub data_id: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: f64,
}

impl Trait {
    pub const fn new(code: TraitCode, data_id: u32, value: f64) -> Self {
        Self {
            code,
            data_id,
            value,
        }
    }
}

bitflags! {
    /// Special flags (`TraitCode::SpecialFlag`, flag id = bit index).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct SpecialFlags: u8 {
        const AUTO_BATTLE = 1 << 0;
        const GUARD       = 1 << 1;
        const SUBSTITUTE  = 1 << 2;
        const PRESERVE_TP = 1 << 3;
    }
}

bitflags! {
    /// Party abilities (`TraitCode::PartyAbility`, ability id = bit index).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct PartyAbilities: u8 {
        const ENCOUNTER_HALF   = 1 << 0;
        const ENCOUNTER_NONE   = 1 << 1;
        const CANCEL_SURPRISE  = 1 << 2;
        const RAISE_PREEMPTIVE = 1 << 3;
        const GOLD_DOUBLE      = 1 << 4;
        const DROP_ITEM_DOUBLE = 1 << 5;
    }
}

impl SpecialFlags {
    /// Flag for a trait's `data_id`; ids outside the table map to nothing.
    pub fn from_id(flag_id: u32) -> Self {
        u8::try_from(flag_id)
            .ok()
            .and_then(|bit| 1u8.checked_shl(u32::from(bit)))
            .map(Self::from_bits_truncate)
            .unwrap_or_default()
    }
}

impl PartyAbilities {
    pub fn from_id(ability_id: u32) -> Self {
        u8::try_from(ability_id)
            .ok()
            .and_then(|bit| 1u8.checked_shl(u32::from(bit)))
            .map(Self::from_bits_truncate)
            .unwrap_or_default()
    }
}
