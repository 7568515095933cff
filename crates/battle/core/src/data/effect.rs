data_code! {
    /// Item/skill effect kinds, applied in list order after damage.
    pub enum EffectCode {
        RecoverHp = 11,
        RecoverMp = 12,
        GainTp = 13,
        AddState = 21,
        RemoveState = 22,
        AddBuff = 31,
        AddDebuff = 32,
        RemoveBuff = 33,
        RemoveDebuff = 34,
        Special = 41,
        Grow = 42,
        LearnSkill = 43,
        CommonEvent = 44,
    }
}

/// `Special` effect data id that makes the target escape.
pub const SPECIAL_EFFECT_ESCAPE: u32 = 0;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Effect {
    pub code: EffectCode,
    #[cfg_attr(feature = "serde", serde(default))]
    pub data_id: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub value1: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub value2: f64,
}

impl Effect {
    pub const fn new(code: EffectCode, data_id: u32, value1: f64, value2: f64) -> Self {
        Self {
            code,
            data_id,
            value1,
            value2,
        }
    }
}
