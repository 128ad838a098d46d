//! TOML configuration.
//!
//! Read from `<config_dir>/examos/config.toml`, or the file named by
//! `EXAMOS_CONFIG`. Every field has a default, so a missing file is fine.
//! `EXAMOS_DB` overrides the database path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::state::SnapshotMode;
use crate::syllabus::SchedulePolicy;

const DEFAULT_DB_NAME: &str = "examos.db";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database file. Defaults under the user config directory.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    /// Key the application snapshot is stored under.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Seconds between revision scans in `watch`.
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,
    #[serde(default)]
    pub rollback_schedule_on_uncomplete: bool,
    /// Reject malformed snapshots instead of repairing them.
    #[serde(default)]
    pub strict_snapshot: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_storage_key() -> String {
    "exam_os_master_state".into()
}
fn default_scan_interval() -> u64 {
    20
}
fn default_log_level() -> String {
    "warn".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            storage_key: default_storage_key(),
            scan_interval_secs: default_scan_interval(),
            rollback_schedule_on_uncomplete: false,
            strict_snapshot: false,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os("EXAMOS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| config_dir().join(CONFIG_FILE_NAME));

        let mut config = Self::load_from(&path)?;
        if let Ok(db) = std::env::var("EXAMOS_DB") {
            config.db_path = Some(PathBuf::from(db));
        }
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn db_path(&self) -> PathBuf {
        match &self.db_path {
            Some(path) => path.clone(),
            None => {
                let dir = config_dir();
                std::fs::create_dir_all(&dir).ok();
                dir.join(DEFAULT_DB_NAME)
            }
        }
    }

    pub fn policy(&self) -> SchedulePolicy {
        SchedulePolicy {
            rollback_schedule_on_uncomplete: self.rollback_schedule_on_uncomplete,
        }
    }

    pub fn snapshot_mode(&self) -> SnapshotMode {
        if self.strict_snapshot {
            SnapshotMode::Strict
        } else {
            SnapshotMode::Repair
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("examos")
}
