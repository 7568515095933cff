//! Encounter scenario loader.

use std::path::Path;

use crate::loaders::{LoadResult, read_file};
use crate::scenario::BattleScenario;

/// Loader for battle scenarios from RON files.
pub struct ScenarioLoader;

impl ScenarioLoader {
    /// Load a scenario from a RON file.
    ///
    /// A scenario without a name takes the file stem.
    pub fn load(path: &Path) -> LoadResult<BattleScenario> {
        let content = read_file(path)?;
        let mut scenario = Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;
        if scenario.name.is_empty() {
            if let Some(stem) = path.file_stem() {
                scenario.name = stem.to_string_lossy().into_owned();
            }
        }
        Ok(scenario)
    }

    pub fn parse(content: &str) -> LoadResult<BattleScenario> {
        let scenario: BattleScenario = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse scenario RON: {}", e))?;
        if scenario.party.is_empty() {
            anyhow::bail!("scenario '{}' has an empty party", scenario.name);
        }
        Ok(scenario)
    }
}
