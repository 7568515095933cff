use super::Trait;

data_code! {
    /// When a state's turn counter is checked for automatic removal.
    pub enum AutoRemovalTiming {
        None = 0,
        ActionEnd = 1,
        TurnEnd = 2,
    }
}

impl Default for AutoRemovalTiming {
    fn default() -> Self {
        Self::None
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct StateData {
    pub id: u32,
    pub name: String,
    /// 0 none, 1..=3 confusion tiers, 4 cannot move.
    pub restriction: u8,
    pub priority: i32,
    pub min_turns: i32,
    pub max_turns: i32,
    pub auto_removal_timing: AutoRemovalTiming,
    pub remove_at_battle_end: bool,
    pub remove_by_restriction: bool,
    pub remove_by_damage: bool,
    pub chance_by_damage: i32,
    pub remove_by_walking: bool,
    pub steps_to_remove: i32,
    /// Shown when an actor gains the state.
    pub message1: String,
    /// Shown when an enemy gains the state.
    pub message2: String,
    /// Shown while the state persists.
    pub message3: String,
    /// Shown when the state is removed.
    pub message4: String,
    pub traits: Vec<Trait>,
}

impl Default for StateData {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            restriction: 0,
            priority: 50,
            min_turns: 1,
            max_turns: 1,
            auto_removal_timing: AutoRemovalTiming::None,
            remove_at_battle_end: false,
            remove_by_restriction: false,
            remove_by_damage: false,
            chance_by_damage: 100,
            remove_by_walking: false,
            steps_to_remove: 100,
            message1: String::new(),
            message2: String::new(),
            message3: String::new(),
            message4: String::new(),
            traits: Vec::new(),
        }
    }
}
