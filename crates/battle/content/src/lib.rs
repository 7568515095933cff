//! Data-driven battle content and its loaders.
//!
//! This crate turns data files into the inputs `battle-core` consumes:
//! - Database tables (editor JSON exports: actors, classes, skills, ...)
//! - Battle options (TOML)
//! - Encounter scenarios (RON): who fights which troop, with what supplies
//!
//! Content is read once before a battle and never appears in battle state.

pub mod scenario;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use scenario::{BattleScenario, StartingItem};

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, ContentFactory, DatabaseLoader, LoadResult, ScenarioLoader};
