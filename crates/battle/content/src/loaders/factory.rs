//! Content factory for loading a battle data directory.

use std::path::{Path, PathBuf};

use battle_core::{BattleConfig, Database};

use crate::loaders::{ConfigLoader, DatabaseLoader, LoadResult, ScenarioLoader};
use crate::scenario::BattleScenario;

/// Content factory that loads all battle content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── Actors.json, Classes.json, Skills.json, Items.json, Weapons.json,
/// │   Armors.json, States.json, Enemies.json, Troops.json, System.json
/// └── scenarios/
///     ├── slime_trio.ron
///     └── bat_ambush.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load battle options from `config.toml`; a missing file yields the
    /// defaults.
    pub fn load_config(&self) -> LoadResult<BattleConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            tracing::debug!("no config.toml in {}, using defaults", self.data_dir.display());
            return Ok(BattleConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load every database table.
    pub fn load_database(&self) -> LoadResult<Database> {
        DatabaseLoader::load(&self.data_dir)
    }

    /// Load a scenario from `scenarios/{name}.ron`.
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the scenario file (without `.ron` extension)
    pub fn load_scenario(&self, name: &str) -> LoadResult<BattleScenario> {
        let path = self.scenario_dir().join(format!("{}.ron", name));
        ScenarioLoader::load(&path)
    }

    /// Names of the available scenarios, sorted.
    pub fn scenario_names(&self) -> LoadResult<Vec<String>> {
        let dir = self.scenario_dir();
        let entries = std::fs::read_dir(&dir)
            .map_err(|e| anyhow::anyhow!("Failed to list {}: {}", dir.display(), e))?;
        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "ron") {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn scenario_dir(&self) -> PathBuf {
        self.data_dir.join("scenarios")
    }
}
