//! Battle options loader.

use std::path::Path;

use battle_core::BattleConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for battle options from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load battle options from a TOML file.
    ///
    /// Keys left out keep their [`BattleConfig::default`] values, so an empty
    /// file is valid.
    pub fn load(path: &Path) -> LoadResult<BattleConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<BattleConfig> {
        let config: BattleConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        Ok(config)
    }
}
