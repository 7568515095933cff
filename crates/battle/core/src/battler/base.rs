use std::collections::BTreeMap;

use super::{ActionResult, ActionState};
use crate::action::Action;
use crate::config::BattleConfig;
use crate::data::Trait;
use crate::env::DataOracle;

/// State shared by every battler kind: vitals, states, buffs, the action
/// queue and the last action result.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattlerCore {
    pub(crate) hp: i32,
    pub(crate) mp: i32,
    pub(crate) tp: i32,
    pub(crate) hidden: bool,
    pub(crate) param_plus: [i32; BattleConfig::BUFF_COUNT],
    /// Active state ids, sorted by priority descending then id ascending.
    pub(crate) states: Vec<u32>,
    pub(crate) state_turns: BTreeMap<u32, i32>,
    pub(crate) state_steps: BTreeMap<u32, i32>,
    pub(crate) buffs: [i32; BattleConfig::BUFF_COUNT],
    pub(crate) buff_turns: [i32; BattleConfig::BUFF_COUNT],
    pub(crate) actions: Vec<Action>,
    pub(crate) speed: i32,
    pub(crate) result: ActionResult,
    pub(crate) action_state: ActionState,
    /// Action slot currently being entered by the player.
    pub(crate) action_input_index: usize,
    pub(crate) last_target_index: i32,
}

impl BattlerCore {
    pub fn new() -> Self {
        Self {
            hp: 1,
            mp: 0,
            tp: 0,
            hidden: false,
            param_plus: [0; BattleConfig::BUFF_COUNT],
            states: Vec::new(),
            state_turns: BTreeMap::new(),
            state_steps: BTreeMap::new(),
            buffs: [0; BattleConfig::BUFF_COUNT],
            buff_turns: [0; BattleConfig::BUFF_COUNT],
            actions: Vec::new(),
            speed: 0,
            result: ActionResult::default(),
            action_state: ActionState::None,
            action_input_index: 0,
            last_target_index: 0,
        }
    }

    /// Trait lists of the active states, in state order.
    pub fn state_traits<'a>(&'a self, data: &'a dyn DataOracle) -> Vec<&'a [Trait]> {
        self.states
            .iter()
            .filter_map(|&id| data.state(id))
            .map(|state| state.traits.as_slice())
            .collect()
    }
}

impl Default for BattlerCore {
    fn default() -> Self {
        Self::new()
    }
}
