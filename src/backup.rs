use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{SnapshotError, StorageError};
use crate::state::{AppState, SnapshotMode, SnapshotSink};

pub fn default_backup_name(at: DateTime<Utc>) -> PathBuf {
    PathBuf::from(format!("ExamOS_Backup_{}.json", at.format("%Y-%m-%d")))
}

pub fn export(state: &AppState, path: &Path) -> Result<(), StorageError> {
    let body = serde_json::to_string_pretty(state).map_err(SnapshotError::from)?;
    std::fs::write(path, body).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "exported backup");
    Ok(())
}

pub fn import(path: &Path, mode: SnapshotMode) -> Result<AppState, StorageError> {
    let body = std::fs::read_to_string(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let state = AppState::from_snapshot(&body, mode)?;
    info!(path = %path.display(), "imported backup");
    Ok(state)
}

/// Import a backup and write it straight to `sink`. The stored snapshot
/// is never parsed, so a corrupt one can be replaced.
pub fn restore<S: SnapshotSink>(
    sink: &S,
    path: &Path,
    mode: SnapshotMode,
) -> Result<AppState, StorageError> {
    let state = import(path, mode)?;
    sink.save(&state.to_snapshot()?)?;
    Ok(state)
}
