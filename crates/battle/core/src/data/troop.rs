//! Troops: enemy formations and their battle-event pages.
//!
//! Page command lists belong to the event interpreter and are not modelled
//! here; the controller only evaluates page conditions and hands the page
//! index to [`crate::log::EventRunner`].

#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct TroopMember {
    pub enemy_id: u32,
    pub x: i32,
    pub y: i32,
    pub hidden: bool,
}

data_code! {
    /// How often a page may run.
    pub enum PageSpan {
        Battle = 0,
        Turn = 1,
        Moment = 2,
    }
}

impl Default for PageSpan {
    fn default() -> Self {
        Self::Battle
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct PageConditions {
    pub turn_ending: bool,
    pub turn_valid: bool,
    pub turn_a: u32,
    pub turn_b: u32,
    pub enemy_valid: bool,
    pub enemy_index: usize,
    pub enemy_hp: i32,
    pub actor_valid: bool,
    pub actor_id: u32,
    pub actor_hp: i32,
    pub switch_valid: bool,
    pub switch_id: u32,
}

impl Default for PageConditions {
    fn default() -> Self {
        Self {
            turn_ending: false,
            turn_valid: false,
            turn_a: 0,
            turn_b: 0,
            enemy_valid: false,
            enemy_index: 0,
            enemy_hp: 50,
            actor_valid: false,
            actor_id: 1,
            actor_hp: 50,
            switch_valid: false,
            switch_id: 1,
        }
    }
}

impl PageConditions {
    pub const fn is_empty(&self) -> bool {
        !self.turn_ending
            && !self.turn_valid
            && !self.enemy_valid
            && !self.actor_valid
            && !self.switch_valid
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct TroopPage {
    pub conditions: PageConditions,
    pub span: PageSpan,
}

#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct TroopData {
    pub id: u32,
    pub name: String,
    pub members: Vec<TroopMember>,
    pub pages: Vec<TroopPage>,
}
