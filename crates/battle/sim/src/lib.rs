//! Headless battle runner.
//!
//! Loads a content directory, plays one scenario to the end with the party's
//! commands chosen automatically and prints the battle log.
//!
//! # Module Structure
//!
//! - `config`: [`SimConfig`] from environment variables
//! - `host`: [`ConsoleHost`], the text-only battle host
//! - `runner`: [`run_scenario`] and its [`BattleReport`]
pub mod config;
pub mod host;
pub mod runner;

pub use config::SimConfig;
pub use host::ConsoleHost;
pub use runner::{BattleReport, run_scenario};
