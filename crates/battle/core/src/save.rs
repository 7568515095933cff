//! Save snapshots of a battle in progress.
//!
//! A snapshot holds both sides plus the controller fields a reload needs to
//! show the right screen (phase, turn, escape ratio). Queued targets and the
//! action being resolved are not kept; a battle saved mid-action resumes at
//! the turn step.
//!
//! Snapshots are encoded with bincode for compact save files:
//! - Compact size
//! - Non-string map keys (experience per class, inventory by id)

use crate::error::{ErrorContext, ErrorSeverity, GameError};
use crate::manager::{BattleManager, Phase};
use crate::unit::Combatants;

/// Bumped whenever a serialized type changes shape.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BattleSnapshot {
    pub version: u32,
    pub phase: Phase,
    pub escape_ratio: f64,
    pub can_escape: bool,
    pub can_lose: bool,
    pub units: Combatants,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot encoding failed: {0}")]
    Encode(String),

    #[error("snapshot decoding failed: {0}")]
    Decode(String),

    #[error("snapshot version {found} is not supported (expected {expected})")]
    Version { found: u32, expected: u32 },
}

impl GameError for SnapshotError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Encode(_) => ErrorSeverity::Internal,
            Self::Decode(_) | Self::Version { .. } => ErrorSeverity::Fatal,
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Encode(_) => "SNAPSHOT_ENCODE",
            Self::Decode(_) => "SNAPSHOT_DECODE",
            Self::Version { .. } => "SNAPSHOT_VERSION",
        }
    }
}

impl BattleSnapshot {
    pub fn capture(manager: &BattleManager) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            phase: manager.phase(),
            escape_ratio: manager.escape_ratio(),
            can_escape: manager.can_escape(),
            can_lose: manager.can_lose(),
            units: manager.combatants().clone(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        let bytes = bincode::serialize(self).map_err(|e| SnapshotError::Encode(e.to_string()))?;
        tracing::debug!(len = bytes.len(), phase = %self.phase, "snapshot encoded");
        Ok(bytes)
    }

    /// Decodes and checks the version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self =
            bincode::deserialize(bytes).map_err(|e| SnapshotError::Decode(e.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(snapshot)
    }
}
