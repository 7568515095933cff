use super::Trait;

data_code! {
    /// Condition gating an enemy action pattern.
    pub enum ConditionType {
        Always = 0,
        Turn = 1,
        Hp = 2,
        Mp = 3,
        State = 4,
        PartyLevel = 5,
        Switch = 6,
    }
}

impl Default for ConditionType {
    fn default() -> Self {
        Self::Always
    }
}

data_code! {
    pub enum DropKind {
        None = 0,
        Item = 1,
        Weapon = 2,
        Armor = 3,
    }
}

impl Default for DropKind {
    fn default() -> Self {
        Self::None
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct EnemyAction {
    pub skill_id: u32,
    pub rating: i32,
    pub condition_type: ConditionType,
    pub condition_param1: f64,
    pub condition_param2: f64,
}

impl Default for EnemyAction {
    fn default() -> Self {
        Self {
            skill_id: 1,
            rating: 5,
            condition_type: ConditionType::Always,
            condition_param1: 0.0,
            condition_param2: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct DropItem {
    pub kind: DropKind,
    pub data_id: u32,
    pub denominator: i32,
}

#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct EnemyData {
    pub id: u32,
    pub name: String,
    pub battler_name: String,
    pub params: [i32; 8],
    pub exp: i32,
    pub gold: i32,
    pub actions: Vec<EnemyAction>,
    pub drop_items: Vec<DropItem>,
    pub traits: Vec<Trait>,
}
