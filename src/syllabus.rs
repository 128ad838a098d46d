use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SyllabusError;
use crate::models::{revision_interval, NodeStats, SyllabusNode, STAGE_COUNT};

const ID_LEN: usize = 9;
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// What to do with the revision schedule when a completed stage is cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulePolicy {
    /// Off: revision dates stay as last computed. On: they are recomputed
    /// from the most recently completed remaining stage.
    pub rollback_schedule_on_uncomplete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageToggle {
    pub completed: bool,
    pub next_revision: Option<DateTime<Utc>>,
}

/// Per subject name, an ordered forest of syllabus nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Syllabus {
    subjects: BTreeMap<String, Vec<SyllabusNode>>,
}

impl Syllabus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subject_names(&self) -> impl Iterator<Item = &str> {
        self.subjects.keys().map(String::as_str)
    }

    pub fn roots(&self, subject: &str) -> &[SyllabusNode] {
        self.subjects
            .get(subject)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn find(&self, subject: &str, id: &str) -> Option<&SyllabusNode> {
        self.roots(subject)
            .iter()
            .flat_map(SyllabusNode::descendants)
            .find(|node| node.id == id)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.all_nodes().any(|(_, node)| node.id == id)
    }

    /// Every node of every subject, pre-order within each subject.
    pub fn all_nodes(&self) -> impl Iterator<Item = (&str, &SyllabusNode)> + '_ {
        self.subjects.iter().flat_map(|(subject, roots)| {
            roots
                .iter()
                .flat_map(SyllabusNode::descendants)
                .map(move |node| (subject.as_str(), node))
        })
    }

    pub fn add_node(
        &mut self,
        subject: &str,
        parent_id: Option<&str>,
        name: &str,
    ) -> Result<String, SyllabusError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SyllabusError::EmptyName);
        }

        let id = self.fresh_id();
        let node = SyllabusNode::new(id.clone(), name);

        match parent_id {
            None => self.subjects.entry(subject.to_string()).or_default().push(node),
            Some(parent_id) => {
                let parent = self
                    .subjects
                    .get_mut(subject)
                    .and_then(|roots| find_mut(roots, parent_id))
                    .ok_or_else(|| SyllabusError::ParentNotFound {
                        subject: subject.to_string(),
                        id: parent_id.to_string(),
                    })?;
                parent.sub_topics.push(node);
            }
        }

        debug!(subject, id = %id, parent = ?parent_id, "added syllabus node");
        Ok(id)
    }

    /// Remove a node and its whole subtree. Returns how many nodes went.
    pub fn delete_node(&mut self, subject: &str, id: &str) -> Result<usize, SyllabusError> {
        let removed = self
            .subjects
            .get_mut(subject)
            .and_then(|roots| remove(roots, id))
            .ok_or_else(|| SyllabusError::NodeNotFound {
                subject: subject.to_string(),
                id: id.to_string(),
            })?;

        let count = removed.descendants().count();
        debug!(subject, id, count, "deleted syllabus subtree");
        Ok(count)
    }

    pub fn toggle_stage(
        &mut self,
        subject: &str,
        id: &str,
        stage: usize,
        now: DateTime<Utc>,
        policy: SchedulePolicy,
    ) -> Result<StageToggle, SyllabusError> {
        let interval =
            revision_interval(stage).ok_or(SyllabusError::StageOutOfRange { stage })?;

        let node = self
            .subjects
            .get_mut(subject)
            .and_then(|roots| find_mut(roots, id))
            .ok_or_else(|| SyllabusError::NodeNotFound {
                subject: subject.to_string(),
                id: id.to_string(),
            })?;
        normalize_node(node);

        let completed = !node.stages[stage];
        node.stages[stage] = completed;

        if completed {
            node.stage_timestamps[stage] = Some(now);
            node.last_revision_date = Some(now);
            node.next_revision_date = Some(now + interval);
        } else {
            node.stage_timestamps[stage] = None;
            if policy.rollback_schedule_on_uncomplete {
                rollback_schedule(node);
            }
        }

        debug!(
            subject,
            id,
            stage,
            completed,
            next = ?node.next_revision_date,
            "toggled stage"
        );
        Ok(StageToggle {
            completed,
            next_revision: node.next_revision_date,
        })
    }

    pub fn subject_stats(&self, subject: &str) -> NodeStats {
        self.roots(subject).iter().map(SyllabusNode::stats).sum()
    }

    pub fn global_stats(&self) -> NodeStats {
        self.subjects
            .values()
            .flatten()
            .map(SyllabusNode::stats)
            .sum()
    }

    /// Nodes at any depth, in any subject, whose next revision has come due.
    /// Each call walks the forest afresh.
    pub fn filter_due(
        &self,
        today: DateTime<Utc>,
    ) -> impl Iterator<Item = (&str, &SyllabusNode)> + '_ {
        self.all_nodes().filter(move |(_, node)| node.is_due(today))
    }

    /// Root nodes of a subject whose name contains `query`, ignoring case.
    pub fn search(&self, subject: &str, query: &str) -> Vec<&SyllabusNode> {
        let needle = query.to_lowercase();
        self.roots(subject)
            .iter()
            .filter(|node| node.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Bring every node back to the canonical stage length and list what
    /// had to change. Logging the problems is left to the caller.
    pub fn repair(&mut self) -> Vec<String> {
        let mut problems = Vec::new();

        for (subject, roots) in self.subjects.iter_mut() {
            for root in roots.iter_mut() {
                repair_tree(subject, root, &mut problems);
            }
        }

        let mut seen = std::collections::HashSet::new();
        for (subject, node) in self.all_nodes() {
            if !seen.insert(node.id.as_str()) {
                problems.push(format!("{}: duplicate node id '{}'", subject, node.id));
            }
        }

        problems
    }

    fn fresh_id(&self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let id: String = (0..ID_LEN)
                .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
                .collect();
            if !self.contains_id(&id) {
                return id;
            }
        }
    }
}

fn find_mut<'a>(nodes: &'a mut [SyllabusNode], id: &str) -> Option<&'a mut SyllabusNode> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_mut(&mut node.sub_topics, id) {
            return Some(found);
        }
    }
    None
}

fn remove(nodes: &mut Vec<SyllabusNode>, id: &str) -> Option<SyllabusNode> {
    if let Some(pos) = nodes.iter().position(|n| n.id == id) {
        return Some(nodes.remove(pos));
    }
    nodes
        .iter_mut()
        .find_map(|node| remove(&mut node.sub_topics, id))
}

fn normalize_node(node: &mut SyllabusNode) -> bool {
    let changed =
        node.stages.len() != STAGE_COUNT || node.stage_timestamps.len() != STAGE_COUNT;
    node.stages.resize(STAGE_COUNT, false);
    node.stage_timestamps.resize(STAGE_COUNT, None);
    changed
}

fn repair_tree(subject: &str, node: &mut SyllabusNode, problems: &mut Vec<String>) {
    let (stages, stamps) = (node.stages.len(), node.stage_timestamps.len());
    if normalize_node(node) {
        problems.push(format!(
            "{}: node '{}' had {} stages and {} stage timestamps, expected {}",
            subject, node.id, stages, stamps, STAGE_COUNT
        ));
    }
    for child in node.sub_topics.iter_mut() {
        repair_tree(subject, child, problems);
    }
}

fn rollback_schedule(node: &mut SyllabusNode) {
    let latest = node
        .stages
        .iter()
        .zip(node.stage_timestamps.iter())
        .enumerate()
        .filter_map(|(i, (done, at))| match (done, at) {
            (true, Some(at)) => Some((i, *at)),
            _ => None,
        })
        .max_by_key(|(_, at)| *at);

    match latest.and_then(|(i, at)| revision_interval(i).map(|d| (at, at + d))) {
        Some((last, next)) => {
            node.last_revision_date = Some(last);
            node.next_revision_date = Some(next);
        }
        None => {
            node.last_revision_date = None;
            node.next_revision_date = None;
        }
    }
}
