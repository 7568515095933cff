//! Runner configuration read from environment variables.
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Settings for one headless battle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimConfig {
    /// Directory holding the JSON tables, `config.toml` and `scenarios/`.
    pub data_dir: PathBuf,
    pub scenario: String,
    pub seed: u64,
    /// Controller ticks before the run gives up on an unfinished battle.
    pub max_ticks: u32,
    /// Also write logs to `battle-sim.log` here.
    pub log_dir: Option<PathBuf>,
    /// Write a bincode snapshot of the final state here.
    pub snapshot_path: Option<PathBuf>,
}

impl SimConfig {
    pub const DEFAULT_DATA_DIR: &'static str = "crates/battle/content/data";
    pub const DEFAULT_SCENARIO: &'static str = "slime_trio";
    pub const DEFAULT_MAX_TICKS: u32 = 10_000;

    /// Construct configuration from environment variables.
    ///
    /// Environment variables:
    /// - `BATTLE_DATA_DIR` - Content directory (default: `crates/battle/content/data`)
    /// - `BATTLE_SCENARIO` - Scenario file stem (default: `slime_trio`)
    /// - `BATTLE_SEED` - Random seed (default: 0)
    /// - `BATTLE_MAX_TICKS` - Tick limit, at least 1 (default: 10000)
    /// - `BATTLE_LOG_DIR` - Optional log file directory
    /// - `BATTLE_SNAPSHOT` - Optional snapshot output path
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup("BATTLE_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(name) = lookup("BATTLE_SCENARIO").filter(|name| !name.is_empty()) {
            config.scenario = name;
        }
        if let Some(seed) = read_env::<u64>(&lookup, "BATTLE_SEED") {
            config.seed = seed;
        }
        if let Some(ticks) = read_env::<u32>(&lookup, "BATTLE_MAX_TICKS") {
            config.max_ticks = ticks.max(1);
        }
        config.log_dir = lookup("BATTLE_LOG_DIR").map(PathBuf::from);
        config.snapshot_path = lookup("BATTLE_SNAPSHOT").map(PathBuf::from);

        config
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(Self::DEFAULT_DATA_DIR),
            scenario: Self::DEFAULT_SCENARIO.to_owned(),
            seed: 0,
            max_ticks: Self::DEFAULT_MAX_TICKS,
            log_dir: None,
            snapshot_path: None,
        }
    }
}

fn read_env<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
{
    lookup(key)?.parse().ok()
}
