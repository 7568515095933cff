//! Turn-based battle rules shared by loaders, simulators and game shells.
//!
//! `battle-core` owns the whole combat model: battler stats with trait
//! aggregation, states and buffs, action resolution (hit, evasion, critical,
//! damage formulas, effects), party/troop rosters with targeting helpers and
//! the phase controller that sequences input, turns, rewards and battle end.
//!
//! Rendering, audio and the event interpreter stay outside the crate and are
//! reached only through the [`log::BattleHost`] seam. Static game data and
//! randomness come in through the oracles bundled in [`env::BattleEnv`].
pub mod action;
pub mod battler;
pub mod config;
pub mod data;
pub mod env;
pub mod error;
pub mod formula;
pub mod log;
pub mod manager;
#[cfg(feature = "serde")]
pub mod save;
pub mod unit;

#[cfg(test)]
pub(crate) mod testing;

pub use action::{Action, ActionItem};
pub use battler::{
    ActionResult, ActionState, Actor, Battler, BattlerId, BattlerOps, BattlerStats, DropReward,
    Enemy, LevelUp, ParamId, SParamId, UseContext, XParamId,
};
pub use config::BattleConfig;
pub use data::{
    ActorData, ArmorData, ClassData, Damage, DamageType, Effect, EffectCode, EnemyData, HitType,
    ItemData, Occasion, Scope, SkillData, StateData, SystemData, Terms, Trait, TraitCode,
    TroopData, UsableItem, WeaponData,
};
pub use env::{
    BattleEnv, DataOracle, Database, GameVariables, PcgRng, RngOracle, ScriptedRng,
    VariableOracle,
};
pub use error::{ErrorContext, ErrorSeverity, GameError, InputError, SetupError};
pub use formula::{DamageFormula, FormulaError};
pub use log::{
    BattleHost, BattleLog, CollapseKind, EventRunner, LogCommand, Narrator, RecordingHost, SoundCue,
    SoundSink,
};
pub use manager::{BattleEndRoute, BattleManager, BattleOutcome, Phase, Rewards};
#[cfg(feature = "serde")]
pub use save::{BattleSnapshot, SNAPSHOT_VERSION, SnapshotError};
pub use unit::{Combatants, Inventory, Party, Troop, Unit};
