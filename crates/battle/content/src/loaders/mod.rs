//! Content loaders for reading battle data from files.
//!
//! Each loader reads one kind of file; [`ContentFactory`] knows where they
//! live inside a data directory.

pub mod config;
pub mod database;
pub mod factory;
pub mod scenario;

pub use config::ConfigLoader;
pub use database::DatabaseLoader;
pub use factory::ContentFactory;
pub use scenario::ScenarioLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
