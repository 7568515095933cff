//! Traits describing read-only battle inputs.
//!
//! Oracles expose the static database, the shared random stream and game
//! variables. The [`BattleEnv`] aggregate bundles them with the rule options
//! so battler, action and controller code reach everything through one
//! borrowed handle instead of ambient globals.
mod data;
mod rng;
mod variables;

pub use data::{DataOracle, Database, Table};
pub use rng::{PcgRng, RngOracle, ScriptedRng};
pub use variables::{GameVariables, VariableOracle};

use crate::config::BattleConfig;
use crate::data::{StateData, SystemData, UsableItem};

/// Aggregates the oracles required by battlers, actions and the controller.
#[derive(Clone, Copy)]
pub struct BattleEnv<'a> {
    data: &'a dyn DataOracle,
    rng: &'a dyn RngOracle,
    variables: &'a dyn VariableOracle,
    config: &'a BattleConfig,
}

impl<'a> BattleEnv<'a> {
    pub fn new(
        data: &'a dyn DataOracle,
        rng: &'a dyn RngOracle,
        variables: &'a dyn VariableOracle,
        config: &'a BattleConfig,
    ) -> Self {
        Self {
            data,
            rng,
            variables,
            config,
        }
    }

    pub fn data(&self) -> &'a dyn DataOracle {
        self.data
    }

    pub fn rng(&self) -> &'a dyn RngOracle {
        self.rng
    }

    pub fn variables(&self) -> &'a dyn VariableOracle {
        self.variables
    }

    pub fn config(&self) -> &'a BattleConfig {
        self.config
    }

    pub fn system(&self) -> &'a SystemData {
        self.data.system()
    }

    pub fn state(&self, id: u32) -> Option<&'a StateData> {
        self.data.state(id)
    }

    pub fn skill_item(&self, id: u32) -> Option<UsableItem<'a>> {
        self.data.skill(id).map(UsableItem::Skill)
    }

    pub fn item_item(&self, id: u32) -> Option<UsableItem<'a>> {
        self.data.item(id).map(UsableItem::Item)
    }

    /// Uniform float in `[0, 1)`.
    pub fn random(&self) -> f64 {
        self.rng.random()
    }

    /// Uniform integer in `[0, max)`.
    pub fn random_int(&self, max: i32) -> i32 {
        self.rng.random_int(max)
    }
}

impl core::fmt::Debug for BattleEnv<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BattleEnv")
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}
