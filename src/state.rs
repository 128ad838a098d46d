use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{SnapshotError, StorageError, SyllabusError};
use crate::models::{default_subjects, Subject};
use crate::syllabus::{SchedulePolicy, Syllabus};

/// The whole persisted document. Only the syllabus and subject list are
/// interpreted; every other key is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub syllabus: Syllabus,
    #[serde(default = "default_subjects")]
    pub subjects: Vec<Subject>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            syllabus: Syllabus::new(),
            subjects: default_subjects(),
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotMode {
    /// Fix stage-length problems and carry on.
    Repair,
    /// Refuse any snapshot that would need repair.
    Strict,
}

impl AppState {
    pub fn from_snapshot(body: &str, mode: SnapshotMode) -> Result<Self, SnapshotError> {
        let mut state: AppState = serde_json::from_str(body)?;
        let problems = state.syllabus.repair();
        if problems.is_empty() {
            return Ok(state);
        }
        match mode {
            SnapshotMode::Strict => Err(SnapshotError::Malformed { problems }),
            SnapshotMode::Repair => {
                for problem in &problems {
                    warn!(problem = %problem, "syllabus snapshot needed repair");
                }
                Ok(state)
            }
        }
    }

    pub fn to_snapshot(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Registered subjects first, then any forest keys without a record.
    pub fn subject_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.subjects.iter().map(|s| s.name.clone()).collect();
        for name in self.syllabus.subject_names() {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    AddNode {
        subject: String,
        parent_id: Option<String>,
        name: String,
    },
    DeleteNode {
        subject: String,
        node_id: String,
    },
    ToggleStage {
        subject: String,
        node_id: String,
        stage: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    Added { id: String },
    Deleted { removed: usize },
    Toggled {
        completed: bool,
        next_revision: Option<DateTime<Utc>>,
    },
}

/// Apply one action to a snapshot, producing the next snapshot. The input
/// is never modified; on error there is no next snapshot.
pub fn reduce(
    state: &AppState,
    action: &Action,
    clock: &dyn Clock,
    policy: SchedulePolicy,
) -> Result<(AppState, Effect), SyllabusError> {
    let mut next = state.clone();
    let effect = match action {
        Action::AddNode {
            subject,
            parent_id,
            name,
        } => {
            let id = next
                .syllabus
                .add_node(subject, parent_id.as_deref(), name)?;
            Effect::Added { id }
        }
        Action::DeleteNode { subject, node_id } => {
            let removed = next.syllabus.delete_node(subject, node_id)?;
            Effect::Deleted { removed }
        }
        Action::ToggleStage {
            subject,
            node_id,
            stage,
        } => {
            let toggle =
                next.syllabus
                    .toggle_stage(subject, node_id, *stage, clock.now(), policy)?;
            Effect::Toggled {
                completed: toggle.completed,
                next_revision: toggle.next_revision,
            }
        }
    };
    Ok((next, effect))
}

/// Where snapshots live between runs.
pub trait SnapshotSink {
    fn load(&self) -> Result<Option<String>, StorageError>;
    fn save(&self, body: &str) -> Result<(), StorageError>;
}

/// Process-wide state container: load on open, save after every applied
/// action.
pub struct Store<S: SnapshotSink> {
    state: AppState,
    sink: S,
    clock: Box<dyn Clock>,
    policy: SchedulePolicy,
}

impl<S: SnapshotSink> Store<S> {
    pub fn open(
        sink: S,
        clock: Box<dyn Clock>,
        policy: SchedulePolicy,
        mode: SnapshotMode,
    ) -> Result<Self, StorageError> {
        let state = match sink.load()? {
            Some(body) => AppState::from_snapshot(&body, mode)?,
            None => {
                info!("no saved snapshot, starting from defaults");
                AppState::default()
            }
        };
        Ok(Self {
            state,
            sink,
            clock,
            policy,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn syllabus(&self) -> &Syllabus {
        &self.state.syllabus
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn dispatch(&mut self, action: Action) -> Result<Result<Effect, SyllabusError>, StorageError> {
        match reduce(&self.state, &action, self.clock.as_ref(), self.policy) {
            Ok((next, effect)) => {
                self.sink.save(&next.to_snapshot()?)?;
                self.state = next;
                debug!(?action, ?effect, "applied action");
                Ok(Ok(effect))
            }
            Err(err) => {
                warn!(?action, error = %err, "action not applied");
                Ok(Err(err))
            }
        }
    }
}

/// Store a default document if the sink holds nothing yet. An existing
/// snapshot is left untouched and is not parsed.
pub fn seed_default<S: SnapshotSink>(sink: &S) -> Result<bool, StorageError> {
    if sink.load()?.is_some() {
        return Ok(false);
    }
    sink.save(&AppState::default().to_snapshot()?)?;
    info!("seeded default snapshot");
    Ok(true)
}

/// In-process sink, used where nothing should touch the disk.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySink {
    body: std::cell::RefCell<Option<String>>,
    saves: std::cell::Cell<usize>,
}

#[cfg(test)]
impl MemorySink {
    pub fn with_snapshot(body: impl Into<String>) -> Self {
        Self {
            body: std::cell::RefCell::new(Some(body.into())),
            saves: std::cell::Cell::new(0),
        }
    }

    pub fn snapshot(&self) -> Option<String> {
        self.body.borrow().clone()
    }

    pub fn saves(&self) -> usize {
        self.saves.get()
    }
}

#[cfg(test)]
impl SnapshotSink for MemorySink {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.body.borrow().clone())
    }

    fn save(&self, body: &str) -> Result<(), StorageError> {
        *self.body.borrow_mut() = Some(body.to_string());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}
