//! How a battle ends: escape, abort, victory, defeat, rewards and the
//! scene to return to.

use tracing::{debug, info};

use super::{BattleManager, BattleOutcome, Phase};
use crate::battler::{Battler, DropReward, LevelUp};
use crate::config::BattleConfig;
use crate::data::{EquipItem, PartyAbilities, format_message};
use crate::env::BattleEnv;
use crate::error::InputError;
use crate::log::{BattleHost, SoundCue};
use crate::unit::Unit;

/// Where the game goes once the battle is over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleEndRoute {
    /// Back to the scene that started the battle.
    Pop,
    GameOver,
    /// Leave the application (battle test).
    Exit,
}

/// Spoils of a victory.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Rewards {
    pub gold: i64,
    pub exp: i64,
    pub items: Vec<DropReward>,
    pub level_ups: Vec<LevelUp>,
}

impl BattleManager {
    /// Tries to run away. A preemptive battle always succeeds; otherwise the
    /// escape ratio is rolled. Failure grows the ratio and hands the turn to
    /// the troop with the party's commands wiped.
    ///
    /// Returns whether the escape succeeded.
    pub fn process_escape(
        &mut self,
        env: &BattleEnv<'_>,
        host: &mut dyn BattleHost,
    ) -> Result<bool, InputError> {
        if self.phase != Phase::Input {
            return Err(InputError::not_input_phase(self.phase, self.turn_count()));
        }
        if !self.can_escape {
            return Err(InputError::escape_forbidden(self.turn_count()));
        }
        host.play(SoundCue::Escape);
        let success = self.preemptive || env.random() < self.escape_ratio;
        let messages = &env.system().terms.messages;
        let party_name = self.units.party.name(env);
        host.show_message(format_message(&messages.escape_start, &[&party_name]));
        if success {
            self.escaped = true;
            self.process_abort(env, host);
        } else {
            host.show_message(messages.escape_failure.clone());
            self.escape_ratio += BattleConfig::ESCAPE_RATIO_STEP;
            self.units.party.clear_actions();
            self.start_turn(env, host);
        }
        info!(success, escape_ratio = self.escape_ratio, "escape attempted");
        Ok(success)
    }

    /// Ends the battle as an escape when the party has emptied or an abort
    /// was requested.
    pub(super) fn check_abort(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) -> bool {
        if self.units.party.is_empty() || self.phase == Phase::Aborting {
            host.play(SoundCue::Escape);
            self.escaped = true;
            self.process_abort(env, host);
            true
        } else {
            false
        }
    }

    pub(super) fn check_battle_end(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) -> bool {
        if self.check_abort(env, host) {
            return true;
        }
        if self.units.party.is_all_dead() {
            self.process_defeat(env, host);
            true
        } else if self.units.troop.is_all_dead() {
            self.process_victory(env, host);
            true
        } else {
            false
        }
    }

    fn process_abort(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) {
        self.units.party.remove_battle_states(env);
        host.play(SoundCue::ReplayBgm);
        self.end_battle(host, BattleOutcome::Escape);
    }

    fn process_victory(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) {
        self.units.party.remove_battle_states(env);
        host.play(SoundCue::VictoryMe);
        host.play(SoundCue::ReplayBgm);
        self.make_rewards(env);
        self.display_victory_message(env, host);
        self.display_rewards(env, host);
        self.gain_rewards(env, host);
        self.end_battle(host, BattleOutcome::Victory);
    }

    fn process_defeat(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) {
        let party_name = self.units.party.name(env);
        host.show_message(format_message(
            &env.system().terms.messages.defeat,
            &[&party_name],
        ));
        host.play(SoundCue::DefeatMe);
        host.play(if self.can_lose {
            SoundCue::ReplayBgm
        } else {
            SoundCue::StopBgm
        });
        self.end_battle(host, BattleOutcome::Defeat);
    }

    fn end_battle(&mut self, host: &mut dyn BattleHost, outcome: BattleOutcome) {
        self.set_phase(Phase::BattleEnd);
        self.outcome = Some(outcome);
        host.on_battle_end(outcome);
        info!(
            outcome = %outcome,
            code = outcome.code(),
            turn = self.units.troop.turn_count(),
            "battle ended"
        );
    }

    /// Picks the scene to return to and takes both sides out of battle.
    pub(super) fn update_battle_end(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) {
        let route = if env.config().battle_test {
            host.play(SoundCue::StopBgm);
            BattleEndRoute::Exit
        } else if !self.escaped && self.units.party.is_all_dead() {
            if self.can_lose {
                self.units.party.revive_battle_members(env);
                BattleEndRoute::Pop
            } else {
                BattleEndRoute::GameOver
            }
        } else {
            BattleEndRoute::Pop
        };
        self.units.party.on_battle_end(env);
        self.units.troop.on_battle_end(env);
        self.route = Some(route);
        self.set_phase(Phase::Finished);
        debug!(?route, "battle end routed");
    }

    // ===== rewards =====

    fn make_rewards(&mut self, env: &BattleEnv<'_>) {
        let party = &self.units.party;
        let troop = &self.units.troop;
        self.rewards = Rewards {
            gold: troop.gold_total(env, party.has_ability(env, PartyAbilities::GOLD_DOUBLE)),
            exp: troop.exp_total(env),
            items: troop.make_drop_items(env, party.has_ability(env, PartyAbilities::DROP_ITEM_DOUBLE)),
            level_ups: Vec::new(),
        };
        debug!(
            gold = self.rewards.gold,
            exp = self.rewards.exp,
            items = self.rewards.items.len(),
            "rewards made"
        );
    }

    fn display_victory_message(&self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) {
        let party_name = self.units.party.name(env);
        host.show_message(format_message(
            &env.system().terms.messages.victory,
            &[&party_name],
        ));
    }

    fn display_rewards(&self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) {
        let system = env.system();
        let messages = &system.terms.messages;
        if self.rewards.exp > 0 {
            host.show_message(format_message(
                &messages.obtain_exp,
                &[&self.rewards.exp, &system.terms.exp()],
            ));
        }
        if self.rewards.gold > 0 {
            let text = format_message(&messages.obtain_gold, &[&self.rewards.gold]);
            host.show_message(text.replace("\\G", &system.currency_unit));
        }
        if !self.rewards.items.is_empty() {
            host.new_message_page();
            for name in self.rewards.items.iter().filter_map(|drop| drop_name(env, *drop)) {
                host.show_message(format_message(&messages.obtain_item, &[&name]));
            }
        }
    }

    /// Hands out experience (announcing level-ups), gold and drops.
    fn gain_rewards(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) {
        let exp = self.rewards.exp;
        let battle_members: Vec<u32> = self
            .units
            .party
            .battle_members()
            .iter()
            .map(|actor| actor.actor_id())
            .collect();
        let mut level_ups = Vec::new();
        for actor in self.units.party.all_members_mut() {
            let in_battle_line = battle_members.contains(&actor.actor_id());
            if let Some(level_up) = actor.gain_exp(env, exp, in_battle_line) {
                display_level_up(env, host, &actor.name(), &level_up);
                level_ups.push(level_up);
            }
        }
        self.units.party.gain_gold(self.rewards.gold);
        for drop in &self.rewards.items {
            self.units.party.inventory_mut().gain_drop(*drop);
        }
        self.rewards.level_ups = level_ups;
    }
}

fn display_level_up(env: &BattleEnv<'_>, host: &mut dyn BattleHost, name: &str, level_up: &LevelUp) {
    let terms = &env.system().terms;
    host.new_message_page();
    host.show_message(format_message(
        &terms.messages.level_up,
        &[&name, &terms.level(), &level_up.level],
    ));
    for skill in level_up
        .new_skills
        .iter()
        .filter_map(|&id| env.data().skill(id))
    {
        host.show_message(format_message(&terms.messages.obtain_skill, &[&skill.name]));
    }
}

fn drop_name(env: &BattleEnv<'_>, drop: DropReward) -> Option<String> {
    let data = env.data();
    match drop {
        DropReward::Item(id) => data.item(id).map(|item| item.name.clone()),
        DropReward::Equip(EquipItem::Weapon(id)) => data.weapon(id).map(|w| w.name.clone()),
        DropReward::Equip(EquipItem::Armor(id)) => data.armor(id).map(|a| a.name.clone()),
    }
}
