//! Snapshot persistence for crash recovery.

pub mod json_store;

pub use json_store::JsonFileStore;

use crate::domain::snapshot::GameSnapshot;
use crate::error::AppError;

/// Where room snapshots live between process restarts.
pub trait SnapshotStore: Send + Sync {
    fn load_all(&self) -> Result<Vec<GameSnapshot>, AppError>;
    fn save_all(&self, snapshots: &[GameSnapshot]) -> Result<(), AppError>;
}
