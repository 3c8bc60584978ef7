use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tracing::{info, warn};

use super::SnapshotStore;
use crate::domain::snapshot::GameSnapshot;
use crate::error::AppError;

/// All room snapshots in a single JSON file. Writes go to a sibling temp
/// file first and rename into place, so a crash mid-write never corrupts
/// the previous save.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotStore for JsonFileStore {
    fn load_all(&self) -> Result<Vec<GameSnapshot>, AppError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no snapshot file, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&raw) {
            Ok(snapshots) => Ok(snapshots),
            Err(e) => {
                // A corrupt save should not keep the server down.
                warn!(path = %self.path.display(), error = %e, "snapshot file unreadable, starting empty");
                Ok(Vec::new())
            }
        }
    }

    fn save_all(&self, snapshots: &[GameSnapshot]) -> Result<(), AppError> {
        let json = serde_json::to_vec_pretty(snapshots)
            .map_err(|e| AppError::storage(format!("snapshot serialization failed: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
