//! Battle phase controller.
//!
//! [`BattleManager`] owns both sides for the length of one battle and is
//! ticked once per frame through [`BattleManager::update`]. Every tick first
//! yields to the host (busy log, running event), then runs at most one phase
//! step. Player commands arrive between ticks through the input methods.
//!
//! # Module Structure
//!
//! - `input`: command input cursor and escape attempts
//! - `turn`: action order, subject loop and per-target invocation
//! - `outcome`: abort, victory, defeat, rewards and battle-end routing

mod input;
mod outcome;
mod turn;

pub use outcome::{BattleEndRoute, Rewards};

use std::collections::VecDeque;

use strum::{AsRefStr, Display};
use tracing::{debug, info};

use crate::action::Action;
use crate::battler::{BattlerId, BattlerOps, BattlerStats};
use crate::data::format_message;
use crate::env::BattleEnv;
use crate::error::SetupError;
use crate::log::{BattleHost, SoundCue};
use crate::unit::{Combatants, Party, Troop, Unit};

/// Controller state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Display, AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// Set up, not started.
    #[default]
    Init,
    Start,
    Input,
    Turn,
    Action,
    TurnEnd,
    Aborting,
    BattleEnd,
    /// Routing done; the battle is over.
    Finished,
}

/// Result code handed to the host when the battle ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum BattleOutcome {
    Victory = 0,
    /// Successful escape or abort.
    Escape = 1,
    Defeat = 2,
}

impl BattleOutcome {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Sequences one battle.
#[derive(Clone, Debug)]
pub struct BattleManager {
    units: Combatants,
    phase: Phase,
    can_escape: bool,
    can_lose: bool,
    preemptive: bool,
    surprise: bool,
    /// Index into the party's battle members of the actor choosing commands.
    actor_index: Option<usize>,
    forced_battler: Option<BattlerId>,
    /// Battlers still to act this turn, fastest first.
    action_battlers: VecDeque<BattlerId>,
    subject: Option<BattlerId>,
    action: Option<Action>,
    targets: VecDeque<BattlerId>,
    escaped: bool,
    escape_ratio: f64,
    turn_forced: bool,
    rewards: Rewards,
    /// Common event queued by the last action; a later one replaces it.
    reserved_common_event: Option<u32>,
    outcome: Option<BattleOutcome>,
    route: Option<BattleEndRoute>,
}

impl BattleManager {
    /// Sets up `troop_id` against `party`.
    ///
    /// The escape ratio is computed here, before battle start, so every
    /// party member counts towards party agility.
    pub fn setup(
        env: &BattleEnv<'_>,
        party: Party,
        troop_id: u32,
        can_escape: bool,
        can_lose: bool,
    ) -> Result<Self, SetupError> {
        let troop = Troop::setup(env, troop_id)?;
        let mut manager = Self {
            units: Combatants::new(party, troop),
            phase: Phase::Init,
            can_escape,
            can_lose,
            preemptive: false,
            surprise: false,
            actor_index: None,
            forced_battler: None,
            action_battlers: VecDeque::new(),
            subject: None,
            action: None,
            targets: VecDeque::new(),
            escaped: false,
            escape_ratio: 0.0,
            turn_forced: false,
            rewards: Rewards::default(),
            reserved_common_event: None,
            outcome: None,
            route: None,
        };
        manager.make_escape_ratio(env);
        info!(
            troop_id,
            can_escape,
            can_lose,
            escape_ratio = manager.escape_ratio,
            "battle set up"
        );
        Ok(manager)
    }

    fn make_escape_ratio(&mut self, env: &BattleEnv<'_>) {
        self.escape_ratio =
            0.5 * self.units.party.agility(env) / self.units.troop.agility(env);
    }

    /// Rolls the initiative: preemptive first, then surprise unless
    /// preemptive already hit. Both rolls always draw.
    pub fn on_encounter(&mut self, env: &BattleEnv<'_>) {
        let troop_agi = self.units.troop.agility(env);
        self.preemptive = env.random() < self.units.party.rate_preemptive(env, troop_agi);
        let surprise_roll = env.random();
        self.surprise =
            surprise_roll < self.units.party.rate_surprise(env, troop_agi) && !self.preemptive;
        debug!(preemptive = self.preemptive, surprise = self.surprise, "encounter rolled");
    }

    /// Enters the start phase and announces the troop.
    pub fn start_battle(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) {
        self.set_phase(Phase::Start);
        host.play(SoundCue::BattleStart);
        self.units.party.on_battle_start(env);
        self.units.troop.on_battle_start(env);
        self.display_start_messages(env, host);
        info!(troop_id = self.units.troop.troop_id(), "battle started");
    }

    fn display_start_messages(&self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) {
        let messages = &env.system().terms.messages;
        for name in self.units.troop.enemy_names() {
            host.show_message(format_message(&messages.emerge, &[&name]));
        }
        let party_name = self.units.party.name(env);
        if self.preemptive {
            host.show_message(format_message(&messages.preemptive, &[&party_name]));
        } else if self.surprise {
            host.show_message(format_message(&messages.surprise, &[&party_name]));
        }
    }

    // ===== frame update =====

    /// Runs one controller tick.
    pub fn update(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) {
        if host.is_busy() || self.update_event(env, host) {
            return;
        }
        match self.phase {
            Phase::Start | Phase::TurnEnd => self.start_input(env, host),
            Phase::Turn => self.update_turn(env, host),
            Phase::Action => self.update_action(env, host),
            Phase::BattleEnd => self.update_battle_end(env, host),
            Phase::Init | Phase::Input | Phase::Aborting | Phase::Finished => {}
        }
    }

    /// True when the tick was spent on a forced action, an event or a
    /// battle-end check.
    fn update_event(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) -> bool {
        match self.phase {
            Phase::Start | Phase::Turn | Phase::TurnEnd => {
                if self.forced_battler.is_some() {
                    self.process_forced_action(env, host);
                    true
                } else {
                    self.update_event_main(env, host)
                }
            }
            _ => self.check_abort(env, host),
        }
    }

    fn update_event_main(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) -> bool {
        if host.is_running() {
            host.update();
        }
        if host.is_running() || self.check_battle_end(env, host) {
            return true;
        }
        self.setup_battle_event(env, host);
        host.is_running()
    }

    /// Starts the reserved common event, or else the first troop page whose
    /// conditions hold.
    fn setup_battle_event(&mut self, env: &BattleEnv<'_>, host: &mut dyn BattleHost) {
        if host.is_running() {
            return;
        }
        if let Some(event_id) = self.reserved_common_event.take() {
            debug!(event_id, "common event started");
            host.setup_common_event(event_id);
            return;
        }
        let turn_end = self.phase == Phase::TurnEnd;
        let troop_id = self.units.troop.troop_id();
        if let Some(page) = self
            .units
            .troop
            .next_battle_event(env, &self.units.party, turn_end)
        {
            debug!(troop_id, page, "battle event page started");
            host.setup_page(troop_id, page);
        }
    }

    /// Queues a skill to run ahead of the normal order.
    ///
    /// `target_index` -2 reuses the battler's last target and -1 picks one at
    /// random; anything else is a position in the target's unit. Unknown
    /// battlers are ignored.
    pub fn force_action(
        &mut self,
        env: &BattleEnv<'_>,
        id: BattlerId,
        skill_id: u32,
        target_index: i32,
    ) {
        let Some(battler) = self.units.battler_mut(id) else {
            return;
        };
        let last_target = battler.last_target_index();
        battler.clear_actions();
        let mut action = Action::forced(id);
        action.set_skill(skill_id);
        match target_index {
            -2 => action.set_target(last_target),
            -1 => action.decide_random_target(env, &self.units),
            index => action.set_target(index),
        }
        if let Some(battler) = self.units.battler_mut(id) {
            battler.push_action(action);
        }
        self.forced_battler = Some(id);
        self.action_battlers.retain(|&b| b != id);
        debug!(battler = ?id, skill_id, target_index, "action forced");
    }

    /// Requests an abort; it resolves on the next tick.
    pub fn abort(&mut self) {
        self.set_phase(Phase::Aborting);
    }

    /// Queues a common event to run at the next event check.
    pub fn reserve_common_event(&mut self, event_id: u32) {
        self.reserved_common_event = Some(event_id);
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            debug!(from = %self.phase, to = %phase, "phase changed");
            self.phase = phase;
        }
    }

    // ===== queries =====

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy_phase(&self) -> bool {
        matches!(self.phase, Phase::Action | Phase::BattleEnd)
    }

    pub fn is_input_phase(&self) -> bool {
        self.phase == Phase::Input
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn can_escape(&self) -> bool {
        self.can_escape
    }

    pub fn can_lose(&self) -> bool {
        self.can_lose
    }

    pub fn is_preemptive(&self) -> bool {
        self.preemptive
    }

    pub fn is_surprise(&self) -> bool {
        self.surprise
    }

    pub fn is_forced_turn(&self) -> bool {
        self.turn_forced
    }

    pub fn is_escaped(&self) -> bool {
        self.escaped
    }

    pub fn escape_ratio(&self) -> f64 {
        self.escape_ratio
    }

    pub fn subject(&self) -> Option<BattlerId> {
        self.subject
    }

    /// Battlers still waiting to act this turn.
    pub fn action_battlers(&self) -> impl Iterator<Item = BattlerId> + '_ {
        self.action_battlers.iter().copied()
    }

    pub fn rewards(&self) -> &Rewards {
        &self.rewards
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    pub fn route(&self) -> Option<BattleEndRoute> {
        self.route
    }

    pub fn turn_count(&self) -> u32 {
        self.units.troop.turn_count()
    }

    pub fn combatants(&self) -> &Combatants {
        &self.units
    }

    /// Mutable access for event commands (HP changes, states, transforms).
    pub fn combatants_mut(&mut self) -> &mut Combatants {
        &mut self.units
    }

    pub fn party(&self) -> &Party {
        &self.units.party
    }

    pub fn troop(&self) -> &Troop {
        &self.units.troop
    }

    /// Hands the party back once the battle is over.
    pub fn into_party(self) -> Party {
        self.units.party
    }
}

/// Descending by speed; equal speeds keep their input order.
pub(crate) fn order_by_speed(mut entries: Vec<(BattlerId, i32)>) -> Vec<BattlerId> {
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.into_iter().map(|(id, _)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattleConfig;
    use crate::log::RecordingHost;
    use crate::testing::Fixture;

    fn manager(env: &BattleEnv<'_>, troop_id: u32) -> BattleManager {
        let party = Party::setup(env, &[Fixture::HERO, Fixture::MAGE]).unwrap();
        BattleManager::setup(env, party, troop_id, true, false).unwrap()
    }

    fn kill(manager: &mut BattleManager, env: &BattleEnv<'_>, id: BattlerId) {
        if let Some(battler) = manager.combatants_mut().battler_mut(id) {
            battler.add_state(env, BattleConfig::DEATH_STATE_ID);
        }
    }

    #[test]
    fn speed_order_is_descending_and_stable() {
        let order = order_by_speed(vec![
            (BattlerId::Actor(1), 10),
            (BattlerId::Enemy(0), 20),
            (BattlerId::Actor(2), 10),
            (BattlerId::Enemy(1), 5),
        ]);
        assert_eq!(
            order,
            vec![
                BattlerId::Enemy(0),
                BattlerId::Actor(1),
                BattlerId::Actor(2),
                BattlerId::Enemy(1),
            ]
        );
    }

    #[test]
    fn escape_ratio_compares_party_and_troop_agility() {
        let fx = Fixture::new();
        let env = fx.env();
        let manager = manager(&env, Fixture::LONE_SLIME);
        assert_eq!(manager.phase(), Phase::Init);
        assert_eq!(manager.escape_ratio(), 0.5 * 11.0 / 6.0);
    }

    #[test]
    fn unknown_troop_fails_setup() {
        let fx = Fixture::new();
        let env = fx.env();
        let party = Party::setup(&env, &[Fixture::HERO]).unwrap();
        let err = BattleManager::setup(&env, party, 99, true, false).unwrap_err();
        assert_eq!(err, SetupError::TroopNotFound(99));
    }

    #[test]
    fn start_announces_each_enemy() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut manager = manager(&env, Fixture::SLIME_TRIO);
        let mut host = RecordingHost::new();
        manager.start_battle(&env, &mut host);
        assert_eq!(host.messages, vec!["Slime emerged!"]);
        assert_eq!(host.sounds, vec![SoundCue::BattleStart]);
        assert_eq!(manager.phase(), Phase::Start);
    }

    #[test]
    fn surprise_attack_skips_input() {
        let fx = Fixture::with_rolls(&[0.99, 0.0]);
        let env = fx.env();
        let mut manager = manager(&env, Fixture::LONE_SLIME);
        let mut host = RecordingHost::new();
        manager.on_encounter(&env);
        assert!(!manager.is_preemptive());
        assert!(manager.is_surprise());

        manager.start_battle(&env, &mut host);
        assert_eq!(host.messages.last().unwrap(), "Hero's Party was surprised!");
        manager.update(&env, &mut host);
        assert_eq!(manager.phase(), Phase::Turn);
        assert_eq!(manager.turn_count(), 1);
        assert_eq!(manager.action_battlers().collect::<Vec<_>>(), vec![BattlerId::Enemy(0)]);
    }

    #[test]
    fn abort_ends_as_escape() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut manager = manager(&env, Fixture::LONE_SLIME);
        let mut host = RecordingHost::new();
        manager.start_battle(&env, &mut host);
        manager.update(&env, &mut host);
        assert_eq!(manager.phase(), Phase::Input);

        manager.abort();
        manager.update(&env, &mut host);
        assert_eq!(manager.outcome(), Some(BattleOutcome::Escape));
        assert_eq!(host.outcomes, vec![BattleOutcome::Escape]);
        assert_eq!(BattleOutcome::Escape.code(), 1);
        assert!(manager.is_escaped());

        manager.update(&env, &mut host);
        assert!(manager.is_finished());
        assert_eq!(manager.route(), Some(BattleEndRoute::Pop));
        assert!(!manager.party().in_battle());
    }

    #[test]
    fn forced_action_runs_before_the_queue() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut manager = manager(&env, Fixture::LONE_SLIME);
        let mut host = RecordingHost::new();
        manager.start_battle(&env, &mut host);
        manager.update(&env, &mut host);
        for _ in 0..3 {
            manager.select_next_command(&env, &mut host).unwrap();
        }
        assert_eq!(manager.phase(), Phase::Turn);

        let hero = BattlerId::Actor(Fixture::HERO);
        manager.force_action(&env, hero, BattleConfig::ATTACK_SKILL_ID, 0);
        assert!(manager.action_battlers().all(|id| id != hero));

        manager.update(&env, &mut host);
        assert_eq!(manager.phase(), Phase::Action);
        assert_eq!(manager.subject(), Some(hero));
        assert!(manager.is_forced_turn());

        manager.update(&env, &mut host);
        let slime = manager.combatants().battler(BattlerId::Enemy(0)).unwrap();
        assert!(slime.hp() < slime.mhp(&env));
        assert_eq!(
            manager.combatants().battler(hero).unwrap().last_target_index(),
            0
        );
    }

    #[test]
    fn reserved_common_event_runs_before_troop_pages() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut manager = manager(&env, Fixture::LONE_SLIME);
        let mut host = RecordingHost::new().with_event_ticks(1);
        manager.start_battle(&env, &mut host);
        manager.reserve_common_event(7);

        manager.update(&env, &mut host);
        assert_eq!(host.common_events, vec![7]);
        assert_eq!(manager.phase(), Phase::Start);

        manager.update(&env, &mut host);
        assert_eq!(manager.phase(), Phase::Input);
    }

    #[test]
    fn wiped_party_with_can_lose_is_revived() {
        let fx = Fixture::new();
        let env = fx.env();
        let party = Party::setup(&env, &[Fixture::HERO, Fixture::MAGE]).unwrap();
        let mut manager = BattleManager::setup(&env, party, Fixture::LONE_SLIME, true, true).unwrap();
        let mut host = RecordingHost::new();
        manager.start_battle(&env, &mut host);
        kill(&mut manager, &env, BattlerId::Actor(Fixture::HERO));
        kill(&mut manager, &env, BattlerId::Actor(Fixture::MAGE));

        manager.update(&env, &mut host);
        assert_eq!(manager.outcome(), Some(BattleOutcome::Defeat));
        assert_eq!(host.messages.last().unwrap(), "Hero's Party was defeated.");
        assert_eq!(&host.sounds[1..], &[SoundCue::DefeatMe, SoundCue::ReplayBgm]);

        manager.update(&env, &mut host);
        assert_eq!(manager.route(), Some(BattleEndRoute::Pop));
        let hero = manager.party().actor(Fixture::HERO).unwrap();
        assert_eq!(hero.hp(), 1);
    }

    #[test]
    fn wiped_party_without_can_lose_is_game_over() {
        let fx = Fixture::new();
        let env = fx.env();
        let mut manager = manager(&env, Fixture::LONE_SLIME);
        let mut host = RecordingHost::new();
        manager.start_battle(&env, &mut host);
        kill(&mut manager, &env, BattlerId::Actor(Fixture::HERO));
        kill(&mut manager, &env, BattlerId::Actor(Fixture::MAGE));
        manager.update(&env, &mut host);
        assert_eq!(host.sounds.last(), Some(&SoundCue::StopBgm));
        manager.update(&env, &mut host);
        assert_eq!(manager.route(), Some(BattleEndRoute::GameOver));
        assert!(manager.party().actor(Fixture::HERO).unwrap().is_dead());
    }

    #[test]
    fn battle_test_exits_after_the_end() {
        let mut fx = Fixture::new();
        fx.config = BattleConfig::new().with_battle_test(true);
        let env = fx.env();
        let mut manager = manager(&env, Fixture::LONE_SLIME);
        let mut host = RecordingHost::new();
        manager.start_battle(&env, &mut host);
        kill(&mut manager, &env, BattlerId::Enemy(0));
        manager.update(&env, &mut host);
        manager.update(&env, &mut host);
        assert_eq!(manager.outcome(), Some(BattleOutcome::Victory));
        assert_eq!(manager.route(), Some(BattleEndRoute::Exit));
        assert_eq!(host.sounds.last(), Some(&SoundCue::StopBgm));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Sorting is descending, and ties keep the order they came in.
            #[test]
            fn prop_speed_order_is_a_stable_descending_sort(speeds in prop::collection::vec(0..4i32, 0..12)) {
                let entries: Vec<(BattlerId, i32)> = speeds
                    .iter()
                    .enumerate()
                    .map(|(index, &speed)| (BattlerId::Enemy(index), speed))
                    .collect();
                let order = order_by_speed(entries.clone());
                prop_assert_eq!(order.len(), entries.len());
                let speed_of = |id: &BattlerId| entries.iter().find(|(e, _)| e == id).map_or(0, |(_, s)| *s);
                for pair in order.windows(2) {
                    let (a, b) = (&pair[0], &pair[1]);
                    prop_assert!(speed_of(a) >= speed_of(b));
                    if speed_of(a) == speed_of(b) {
                        prop_assert!(matches!((a, b), (BattlerId::Enemy(x), BattlerId::Enemy(y)) if x < y));
                    }
                }
            }
        }
    }
}
