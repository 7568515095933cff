//! Battlers: the combat participants.
//!
//! [`Battler`] is the small set of hooks that differ between [`Actor`] and
//! [`Enemy`] (parameter sources, trait-bearing objects, naming). Everything
//! else is shared and lives in two blanket extension traits:
//!
//! - [`BattlerStats`]: read-only queries (params, trait aggregation, states,
//!   buffs, usability)
//! - [`BattlerOps`]: mutations (states, buffs, vitals, turn maintenance)
//!
//! Both work on `dyn Battler`, so the rosters and the action pipeline handle
//! actors and enemies uniformly.
mod actor;
mod base;
mod enemy;
mod ops;
mod params;
mod result;
mod stats;

pub use actor::{Actor, LevelUp};
pub use base::BattlerCore;
pub use enemy::{DropReward, Enemy, PatternContext, select_action, select_all_actions};
pub use ops::BattlerOps;
pub use params::{ParamId, SParamId, XParamId};
pub use result::ActionResult;
pub use stats::{BattlerStats, UseContext};

use crate::data::{SkillData, Trait};
use crate::env::DataOracle;

/// Stable handle to a battler inside a battle.
///
/// Actors are addressed by actor id (unique within a party), enemies by
/// their position in the troop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattlerId {
    Actor(u32),
    Enemy(usize),
}

impl BattlerId {
    pub const fn is_actor(&self) -> bool {
        matches!(self, Self::Actor(_))
    }

    pub const fn is_enemy(&self) -> bool {
        matches!(self, Self::Enemy(_))
    }
}

/// Input/execution status of a battler's queued actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionState {
    #[default]
    None,
    Undecided,
    Inputting,
    Waiting,
    Acting,
    Done,
}

/// Per-kind hooks. Shared behaviour is provided by [`BattlerStats`] and
/// [`BattlerOps`].
pub trait Battler {
    fn core(&self) -> &BattlerCore;
    fn core_mut(&mut self) -> &mut BattlerCore;
    fn battler_id(&self) -> BattlerId;

    /// Display name (enemies include their disambiguation letter).
    fn name(&self) -> String;

    fn is_actor(&self) -> bool {
        self.battler_id().is_actor()
    }

    fn is_enemy(&self) -> bool {
        self.battler_id().is_enemy()
    }

    /// Actor level; enemies have none.
    fn level(&self) -> Option<i32> {
        None
    }

    fn param_base(&self, data: &dyn DataOracle, param: ParamId) -> i32;

    fn param_plus(&self, _data: &dyn DataOracle, param: ParamId) -> i32 {
        self.core().param_plus[param.index()]
    }

    fn param_max(&self, param: ParamId) -> i32 {
        match param {
            ParamId::Mhp => 999_999,
            ParamId::Mmp => 9999,
            _ => 999,
        }
    }

    /// Trait lists of every attached trait-bearing object (states first).
    fn trait_objects<'a>(&'a self, data: &'a dyn DataOracle) -> Vec<&'a [Trait]>;

    /// Unarmed battlers attack with the bare-hands element.
    fn has_no_weapons(&self, _data: &dyn DataOracle) -> bool {
        false
    }

    fn is_skill_wtype_ok(&self, _data: &dyn DataOracle, _skill: &SkillData) -> bool {
        true
    }

    fn is_learned_skill(&self, _skill_id: u32) -> bool {
        false
    }

    fn learn_skill(&mut self, _skill_id: u32) {}
}

/// Rounds to nearest, halves toward positive infinity.
pub(crate) fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}
