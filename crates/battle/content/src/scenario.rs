//! Encounter scenarios: which actors fight which troop, with what supplies.

use std::collections::BTreeMap;

use battle_core::{BattleEnv, BattleManager, BattlerOps, Party, SetupError};
use tracing::debug;

/// An item stack the party carries into battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StartingItem {
    pub item_id: u32,
    pub amount: i32,
}

/// One battle setup.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleScenario {
    pub name: String,
    /// Actor ids in formation order.
    pub party: Vec<u32>,
    pub troop_id: u32,
    pub can_escape: bool,
    pub can_lose: bool,
    /// Level per actor id, applied after the party is built.
    pub levels: BTreeMap<u32, i32>,
    pub gold: i64,
    pub items: Vec<StartingItem>,
    /// Roll the preemptive and surprise chances before the battle starts.
    pub roll_encounter: bool,
}

impl Default for BattleScenario {
    fn default() -> Self {
        Self {
            name: String::new(),
            party: Vec::new(),
            troop_id: 0,
            can_escape: true,
            can_lose: false,
            levels: BTreeMap::new(),
            gold: 0,
            items: Vec::new(),
            roll_encounter: false,
        }
    }
}

impl BattleScenario {
    /// Builds the party with its levels, gold and items applied. Leveled
    /// actors start at full HP and MP.
    pub fn build_party(&self, env: &BattleEnv<'_>) -> Result<Party, SetupError> {
        let mut party = Party::setup(env, &self.party)?;
        for (&actor_id, &level) in &self.levels {
            let actor = party
                .actor_mut(actor_id)
                .ok_or(SetupError::ActorNotFound(actor_id))?;
            actor.change_level(env, level, false);
            actor.recover_all(env);
        }
        party.gain_gold(self.gold);
        for item in &self.items {
            party.inventory_mut().gain_item(item.item_id, item.amount);
        }
        Ok(party)
    }

    /// A controller ready for `start_battle`, with encounter rolls done
    /// when requested.
    pub fn setup_battle(&self, env: &BattleEnv<'_>) -> Result<BattleManager, SetupError> {
        let party = self.build_party(env)?;
        let mut manager =
            BattleManager::setup(env, party, self.troop_id, self.can_escape, self.can_lose)?;
        if self.roll_encounter {
            manager.on_encounter(env);
        }
        debug!(
            scenario = %self.name,
            troop_id = self.troop_id,
            preemptive = manager.is_preemptive(),
            surprise = manager.is_surprise(),
            "battle set up"
        );
        Ok(manager)
    }
}
