use std::path::PathBuf;
use thiserror::Error;

/// Failures of a single syllabus mutation. The forest is left untouched
/// whenever one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyllabusError {
    #[error("node '{id}' not found in subject '{subject}'")]
    NodeNotFound { subject: String, id: String },

    #[error("parent node '{id}' not found in subject '{subject}'")]
    ParentNotFound { subject: String, id: String },

    #[error("stage index {stage} is out of range (0..{count})", count = crate::models::STAGE_COUNT)]
    StageOutOfRange { stage: usize },

    #[error("node name must not be empty")]
    EmptyName,
}

impl SyllabusError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SyllabusError::NodeNotFound { .. } | SyllabusError::ParentNotFound { .. }
        )
    }
}

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot is malformed: {}", .problems.join("; "))]
    Malformed { problems: Vec<String> },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_are_flagged() {
        let node = SyllabusError::NodeNotFound {
            subject: "History".into(),
            id: "abc".into(),
        };
        let parent = SyllabusError::ParentNotFound {
            subject: "History".into(),
            id: "abc".into(),
        };
        assert!(node.is_not_found());
        assert!(parent.is_not_found());
        assert!(!SyllabusError::EmptyName.is_not_found());
        assert!(!SyllabusError::StageOutOfRange { stage: 20 }.is_not_found());
    }

    #[test]
    fn messages_name_the_target() {
        let err = SyllabusError::NodeNotFound {
            subject: "Polity".into(),
            id: "x1".into(),
        };
        assert_eq!(err.to_string(), "node 'x1' not found in subject 'Polity'");

        let err = SyllabusError::StageOutOfRange { stage: 14 };
        assert_eq!(err.to_string(), "stage index 14 is out of range (0..14)");
    }

    #[test]
    fn malformed_joins_problems() {
        let err = SnapshotError::Malformed {
            problems: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "snapshot is malformed: a; b");
    }
}
