//! Command input: planning every battler's slots and moving the input
//! cursor over the party.

use tracing::debug;

use super::{BattleManager, Phase};
use crate::action::{Action, make_actions};
use crate::battler::{ActionState, Actor, BattlerId, BattlerOps, BattlerStats};
use crate::env::BattleEnv;
use crate::error::InputError;
use crate::log::BattleHost;
use crate::unit::Unit;

impl BattleManager {
    /// Plans actions for everyone and opens command input. Skipped straight
    /// into the turn on a surprise attack or when no actor can input.
    pub(super) fn start_input(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) {
        self.set_phase(Phase::Input);
        let ids: Vec<BattlerId> = self
            .units
            .party
            .member_ids()
            .into_iter()
            .chain(self.units.troop.member_ids())
            .collect();
        for id in ids {
            make_actions(env, &mut self.units, id, self.can_escape);
        }
        self.clear_actor();
        if self.surprise || !self.units.party.can_input(env) {
            self.start_turn(env, host);
        }
    }

    fn actor_id_at(&self, index: Option<usize>) -> Option<u32> {
        let index = index?;
        self.units
            .party
            .battle_members()
            .get(index)
            .map(|actor| actor.actor_id())
    }

    /// The actor currently choosing commands.
    pub fn actor(&self) -> Option<&Actor> {
        let actor_id = self.actor_id_at(self.actor_index)?;
        self.units.party.actor(actor_id)
    }

    pub fn actor_index(&self) -> Option<usize> {
        self.actor_index
    }

    /// The slot the player is filling in.
    pub fn inputting_action_mut(&mut self) -> Option<&mut Action> {
        let actor_id = self.actor_id_at(self.actor_index)?;
        self.units.party.actor_mut(actor_id)?.inputting_action_mut()
    }

    /// Moves the cursor; the actor left behind gets `last_state`.
    fn change_actor(&mut self, new_index: Option<usize>, last_state: ActionState) {
        let last = self.actor_id_at(self.actor_index);
        self.actor_index = new_index;
        let next = self.actor_id_at(new_index);
        if let Some(actor) = last.and_then(|id| self.units.party.actor_mut(id)) {
            actor.set_action_state(last_state);
        }
        if let Some(actor) = next.and_then(|id| self.units.party.actor_mut(id)) {
            actor.set_action_state(ActionState::Inputting);
        }
    }

    pub(super) fn clear_actor(&mut self) {
        self.change_actor(None, ActionState::None);
    }

    fn ensure_input(&self) -> Result<(), InputError> {
        if self.phase == Phase::Input {
            Ok(())
        } else {
            Err(InputError::not_input_phase(self.phase, self.turn_count()))
        }
    }

    /// Confirms the current slot and advances: next slot of the same actor,
    /// else the next actor that can input, else the turn starts.
    pub fn select_next_command(
        &mut self,
        env: &BattleEnv<'_>,
        host: &mut dyn BattleHost,
    ) -> Result<(), InputError> {
        self.ensure_input()?;
        loop {
            let advanced = self
                .actor_id_at(self.actor_index)
                .and_then(|id| self.units.party.actor_mut(id))
                .is_some_and(|actor| actor.select_next_command());
            if !advanced {
                let next = self.actor_index.map_or(0, |index| index + 1);
                self.change_actor(Some(next), ActionState::Waiting);
                if next >= self.units.party.size() {
                    self.start_turn(env, host);
                    break;
                }
            }
            if self.actor().is_some_and(|actor| actor.can_input(env)) {
                break;
            }
        }
        debug!(actor_index = ?self.actor_index, "next command");
        Ok(())
    }

    /// Steps back one slot, or to the previous actor that can input. Backing
    /// out of the first actor clears the cursor.
    pub fn select_previous_command(&mut self, env: &BattleEnv<'_>) -> Result<(), InputError> {
        self.ensure_input()?;
        loop {
            let moved = self
                .actor_id_at(self.actor_index)
                .and_then(|id| self.units.party.actor_mut(id))
                .is_some_and(|actor| actor.select_previous_command());
            if !moved {
                match self.actor_index {
                    Some(index) if index > 0 => {
                        self.change_actor(Some(index - 1), ActionState::Undecided);
                    }
                    _ => {
                        self.change_actor(None, ActionState::Undecided);
                        return Ok(());
                    }
                }
            }
            if self.actor().is_some_and(|actor| actor.can_input(env)) {
                break;
            }
        }
        debug!(actor_index = ?self.actor_index, "previous command");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattleConfig;
    use crate::log::RecordingHost;
    use crate::testing::Fixture;
    use crate::unit::Party;

    fn input_ready(env: &BattleEnv<'_>, host: &mut RecordingHost) -> BattleManager {
        let party = Party::setup(env, &[Fixture::HERO, Fixture::MAGE]).unwrap();
        let mut manager = BattleManager::setup(env, party, Fixture::LONE_SLIME, true, false).unwrap();
        manager.start_battle(env, host);
        manager.update(env, host);
        manager
    }

    fn state_of(manager: &BattleManager, actor_id: u32) -> ActionState {
        manager.party().actor(actor_id).unwrap().action_state()
    }

    #[test]
    fn cursor_walks_actors_and_marks_states() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut host = RecordingHost::new();
        let mut manager = input_ready(&env, &mut host);
        assert_eq!(manager.phase(), Phase::Input);
        assert!(manager.actor().is_none());

        manager.select_next_command(&env, &mut host).unwrap();
        assert_eq!(manager.actor().map(Actor::actor_id), Some(Fixture::HERO));
        assert_eq!(state_of(&manager, Fixture::HERO), ActionState::Inputting);

        manager.select_next_command(&env, &mut host).unwrap();
        assert_eq!(manager.actor().map(Actor::actor_id), Some(Fixture::MAGE));
        assert_eq!(state_of(&manager, Fixture::HERO), ActionState::Waiting);

        manager.select_previous_command(&env).unwrap();
        assert_eq!(manager.actor().map(Actor::actor_id), Some(Fixture::HERO));
        assert_eq!(state_of(&manager, Fixture::MAGE), ActionState::Undecided);

        manager.select_previous_command(&env).unwrap();
        assert!(manager.actor().is_none());
        assert_eq!(state_of(&manager, Fixture::HERO), ActionState::Undecided);
    }

    #[test]
    fn actors_that_cannot_input_are_skipped() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut host = RecordingHost::new();
        let mut manager = input_ready(&env, &mut host);
        if let Some(hero) = manager.combatants_mut().battler_mut(BattlerId::Actor(Fixture::HERO)) {
            hero.add_state(&env, BattleConfig::DEATH_STATE_ID);
        }
        manager.select_next_command(&env, &mut host).unwrap();
        assert_eq!(manager.actor().map(Actor::actor_id), Some(Fixture::MAGE));
        manager.select_next_command(&env, &mut host).unwrap();
        assert_eq!(manager.phase(), Phase::Turn);
        assert!(manager.actor().is_none());
    }

    #[test]
    fn input_outside_the_input_phase_is_rejected() {
        let fx = Fixture::new();
        let env = fx.env();
        let party = Party::setup(&env, &[Fixture::HERO]).unwrap();
        let mut manager = BattleManager::setup(&env, party, Fixture::LONE_SLIME, true, false).unwrap();
        let mut host = RecordingHost::new();
        let err = manager.select_next_command(&env, &mut host).unwrap_err();
        assert!(matches!(err, InputError::NotInputPhase { phase: Phase::Init, .. }));
        assert!(manager.select_previous_command(&env).is_err());
    }

    #[test]
    fn filled_slot_survives_into_the_turn() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut host = RecordingHost::new();
        let mut manager = input_ready(&env, &mut host);
        manager.select_next_command(&env, &mut host).unwrap();
        manager.inputting_action_mut().unwrap().set_skill(Fixture::FIRE);
        manager.select_next_command(&env, &mut host).unwrap();
        manager.select_next_command(&env, &mut host).unwrap();
        assert_eq!(manager.phase(), Phase::Turn);
        let hero = manager.party().actor(Fixture::HERO).unwrap();
        assert_eq!(
            hero.current_action().and_then(Action::item_ref),
            Some(crate::action::ActionItem::Skill(Fixture::FIRE))
        );
    }
}
