//! Presentation seams.
//!
//! The core never renders or plays audio. It pushes [`LogCommand`]s into a
//! [`BattleLog`], fires [`SoundCue`]s at a [`SoundSink`] and hands troop
//! battle-event pages to an [`EventRunner`]. A game shell implements all
//! three (plus the message window) as one [`BattleHost`].
//!
//! # Module Structure
//!
//! - `narrate`: turns action results into log commands and message text
mod narrate;

pub use narrate::Narrator;

use strum::{AsRefStr, Display, EnumCount, EnumIter};

use crate::action::ActionItem;
use crate::battler::BattlerId;
use crate::manager::BattleOutcome;

/// How a battler disappears when the death state is added.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CollapseKind {
    #[default]
    Normal,
    Boss,
    Instant,
    /// Stays on screen.
    None,
}

impl CollapseKind {
    /// Maps the `Collapse` special-flag value carried by traits.
    pub const fn from_flag(value: u32) -> Self {
        match value {
            1 => Self::Boss,
            2 => Self::Instant,
            3 => Self::None,
            _ => Self::Normal,
        }
    }
}

/// One display instruction for the battle log window.
///
/// Wait commands suspend the log until the matching condition clears; the
/// controller only sees this through [`BattleLog::is_busy`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogCommand {
    AddText(String),
    PushBaseLine,
    PopBaseLine,
    Clear,
    Wait,
    WaitForNewLine,
    WaitForEffect,
    WaitForMovement,
    PerformActionStart {
        subject: BattlerId,
        item: Option<ActionItem>,
    },
    PerformAction {
        subject: BattlerId,
        item: Option<ActionItem>,
    },
    PerformActionEnd(BattlerId),
    /// `animation_id` is already resolved for actor attacks; a negative id
    /// means an enemy's normal attack, which has no animation of its own.
    ShowAnimation {
        subject: BattlerId,
        targets: Vec<BattlerId>,
        animation_id: i32,
    },
    PopupDamage(BattlerId),
    PerformDamage(BattlerId),
    PerformRecovery(BattlerId),
    PerformMiss(BattlerId),
    PerformEvasion(BattlerId),
    PerformMagicEvasion(BattlerId),
    PerformCounter(BattlerId),
    PerformReflection(BattlerId),
    PerformSubstitute {
        substitute: BattlerId,
        target: BattlerId,
    },
    PerformCollapse {
        battler: BattlerId,
        kind: CollapseKind,
    },
}

impl LogCommand {
    /// Sound a renderer plays when it executes this command.
    pub fn sound_cue(&self) -> Option<SoundCue> {
        match self {
            Self::ShowAnimation {
                subject: BattlerId::Enemy(_),
                animation_id,
                ..
            } if *animation_id < 0 => Some(SoundCue::EnemyAttack),
            Self::PerformDamage(BattlerId::Actor(_)) => Some(SoundCue::ActorDamage),
            Self::PerformDamage(BattlerId::Enemy(_)) => Some(SoundCue::EnemyDamage),
            Self::PerformRecovery(_) => Some(SoundCue::Recovery),
            Self::PerformMiss(_) => Some(SoundCue::Miss),
            Self::PerformEvasion(_) => Some(SoundCue::Evasion),
            Self::PerformMagicEvasion(_) => Some(SoundCue::MagicEvasion),
            Self::PerformReflection(_) => Some(SoundCue::Reflection),
            Self::PerformCollapse { battler, kind } => match (battler, kind) {
                (BattlerId::Actor(_), _) => Some(SoundCue::ActorCollapse),
                (BattlerId::Enemy(_), CollapseKind::Boss) => Some(SoundCue::BossCollapse),
                (BattlerId::Enemy(_), CollapseKind::None) => None,
                (BattlerId::Enemy(_), _) => Some(SoundCue::EnemyCollapse),
            },
            _ => None,
        }
    }
}

/// Semantic audio events. Playback is fire-and-forget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, EnumCount, AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum SoundCue {
    BattleStart,
    Escape,
    EnemyAttack,
    EnemyDamage,
    EnemyCollapse,
    BossCollapse,
    ActorDamage,
    ActorCollapse,
    Recovery,
    Miss,
    Evasion,
    MagicEvasion,
    Reflection,
    VictoryMe,
    DefeatMe,
    /// Resume the map music after the battle.
    ReplayBgm,
    StopBgm,
}

/// Queue of display commands.
pub trait BattleLog {
    fn push(&mut self, command: LogCommand);

    /// True while earlier commands are still being shown.
    fn is_busy(&self) -> bool;
}

pub trait SoundSink {
    fn play(&mut self, cue: SoundCue);
}

/// The external event interpreter.
pub trait EventRunner {
    /// Starts page `page_index` of troop `troop_id`.
    fn setup_page(&mut self, troop_id: u32, page_index: usize);

    fn setup_common_event(&mut self, event_id: u32);

    fn is_running(&self) -> bool;

    /// Advances the running event by one tick.
    fn update(&mut self);
}

/// Everything the controller talks to while a battle runs.
pub trait BattleHost: BattleLog + SoundSink + EventRunner {
    /// Adds a line to the message window (start, victory and reward texts).
    fn show_message(&mut self, text: String);

    fn new_message_page(&mut self) {}

    /// Called once with the outcome code when the battle ends.
    fn on_battle_end(&mut self, _outcome: BattleOutcome) {}
}

/// Host that records everything and is never busy. Events run for a fixed
/// number of ticks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordingHost {
    pub commands: Vec<LogCommand>,
    pub sounds: Vec<SoundCue>,
    pub messages: Vec<String>,
    pub pages: Vec<(u32, usize)>,
    pub common_events: Vec<u32>,
    pub outcomes: Vec<BattleOutcome>,
    /// Ticks each started event keeps running.
    pub event_ticks: u32,
    remaining_ticks: u32,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_event_ticks(mut self, ticks: u32) -> Self {
        self.event_ticks = ticks;
        self
    }

    /// Recorded `AddText` lines, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                LogCommand::AddText(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl BattleLog for RecordingHost {
    fn push(&mut self, command: LogCommand) {
        self.commands.push(command);
    }

    fn is_busy(&self) -> bool {
        false
    }
}

impl SoundSink for RecordingHost {
    fn play(&mut self, cue: SoundCue) {
        self.sounds.push(cue);
    }
}

impl EventRunner for RecordingHost {
    fn setup_page(&mut self, troop_id: u32, page_index: usize) {
        self.pages.push((troop_id, page_index));
        self.remaining_ticks = self.event_ticks;
    }

    fn setup_common_event(&mut self, event_id: u32) {
        self.common_events.push(event_id);
        self.remaining_ticks = self.event_ticks;
    }

    fn is_running(&self) -> bool {
        self.remaining_ticks > 0
    }

    fn update(&mut self) {
        self.remaining_ticks = self.remaining_ticks.saturating_sub(1);
    }
}

impl BattleHost for RecordingHost {
    fn show_message(&mut self, text: String) {
        self.messages.push(text);
    }

    fn on_battle_end(&mut self, outcome: BattleOutcome) {
        self.outcomes.push(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enemy_normal_attack_plays_the_attack_sound() {
        let command = LogCommand::ShowAnimation {
            subject: BattlerId::Enemy(0),
            targets: vec![BattlerId::Actor(1)],
            animation_id: -1,
        };
        assert_eq!(command.sound_cue(), Some(SoundCue::EnemyAttack));
        let actor = LogCommand::ShowAnimation {
            subject: BattlerId::Actor(1),
            targets: Vec::new(),
            animation_id: -1,
        };
        assert_eq!(actor.sound_cue(), None);
    }

    #[test]
    fn collapse_sound_follows_kind() {
        let boss = LogCommand::PerformCollapse {
            battler: BattlerId::Enemy(0),
            kind: CollapseKind::from_flag(1),
        };
        assert_eq!(boss.sound_cue(), Some(SoundCue::BossCollapse));
        let ghost = LogCommand::PerformCollapse {
            battler: BattlerId::Enemy(0),
            kind: CollapseKind::from_flag(3),
        };
        assert_eq!(ghost.sound_cue(), None);
    }

    #[test]
    fn recording_host_runs_events_for_fixed_ticks() {
        let mut host = RecordingHost::new().with_event_ticks(2);
        host.setup_page(4, 0);
        assert!(host.is_running());
        host.update();
        assert!(host.is_running());
        host.update();
        assert!(!host.is_running());
        assert_eq!(host.pages, vec![(4, 0)]);
    }

    #[test]
    fn sound_cues_render_snake_case() {
        assert_eq!(SoundCue::VictoryMe.to_string(), "victory_me");
        assert_eq!(SoundCue::BossCollapse.as_ref(), "boss_collapse");
    }
}
