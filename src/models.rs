use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const STAGE_COUNT: usize = 14;

pub const SYLLABUS_STAGES: [&str; STAGE_COUNT] = [
    "To-Do",
    "Video (1x)",
    "First Reading",
    "Video (2x)",
    "24h Revision",
    "Test 1",
    "7d Revision",
    "Weekly Reinforce",
    "Structured Rev",
    "Test 2",
    "30d Revision",
    "Mind Maps",
    "Test/Error Log",
    "Final Mastery",
];

// Days until the next revision, indexed by the stage just completed
pub const REVISION_INTERVAL_DAYS: [i64; STAGE_COUNT] =
    [1, 1, 1, 3, 7, 7, 15, 30, 30, 60, 60, 90, 90, 180];

pub fn stage_name(index: usize) -> Option<&'static str> {
    SYLLABUS_STAGES.get(index).copied()
}

pub fn revision_interval(index: usize) -> Option<Duration> {
    REVISION_INTERVAL_DAYS
        .get(index)
        .map(|days| Duration::days(*days))
}

/// Parse a stage reference as typed by a user: either the 1-based number
/// shown next to each stage, or the stage name (case-insensitive).
/// Returns the 0-based stage index.
pub fn parse_stage(s: &str) -> Option<usize> {
    let s = s.trim();
    if let Ok(n) = s.parse::<usize>() {
        return if (1..=STAGE_COUNT).contains(&n) {
            Some(n - 1)
        } else {
            None
        };
    }
    SYLLABUS_STAGES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(s))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Moderate,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Moderate => "moderate",
            Difficulty::Hard => "hard",
        }
    }
}

// Shared by node weightage and subject priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Level {
    Low,
    #[default]
    Medium,
    High,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "Low",
            Level::Medium => "Medium",
            Level::High => "High",
        }
    }
}

/// One topic or sub-topic of a subject's syllabus.
///
/// Field names and the epoch-millisecond timestamp encoding match the
/// snapshot format written by the browser dashboard, so existing
/// snapshots load without conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyllabusNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub stages: Vec<bool>,
    #[serde(default, with = "millis_vec")]
    pub stage_timestamps: Vec<Option<DateTime<Utc>>>,
    #[serde(default = "default_confidence")]
    pub confidence: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub weightage: Level,
    #[serde(default)]
    pub expected_questions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recall_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mind_map_url: Option<String>,
    #[serde(default)]
    pub sub_topics: Vec<SyllabusNode>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub last_revision_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub next_revision_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub revision_level: u32,
}

fn default_confidence() -> u32 {
    1
}

impl SyllabusNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stages: vec![false; STAGE_COUNT],
            stage_timestamps: vec![None; STAGE_COUNT],
            confidence: default_confidence(),
            difficulty: Difficulty::default(),
            weightage: Level::default(),
            expected_questions: 0,
            recall_notes: None,
            mind_map_url: None,
            sub_topics: Vec::new(),
            last_revision_date: None,
            next_revision_date: None,
            revision_level: 0,
        }
    }

    pub fn completed_stages(&self) -> usize {
        self.stages.iter().filter(|done| **done).count()
    }

    /// Total and completed stage slots over this node and every descendant.
    pub fn stats(&self) -> NodeStats {
        self.sub_topics
            .iter()
            .fold(NodeStats::leaf(self), |acc, child| acc + child.stats())
    }

    pub fn mastery(&self) -> u32 {
        self.stats().mastery()
    }

    pub fn is_due(&self, today: DateTime<Utc>) -> bool {
        matches!(self.next_revision_date, Some(next) if next <= today)
    }

    /// Pre-order walk over this node and its whole subtree.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    pub fn descendant_count(&self) -> usize {
        self.descendants().count() - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeStats {
    pub total: usize,
    pub done: usize,
}

impl NodeStats {
    fn leaf(node: &SyllabusNode) -> Self {
        Self {
            total: STAGE_COUNT,
            done: node.completed_stages(),
        }
    }

    /// Rounded completion percentage; 0 for an empty aggregate.
    pub fn mastery(&self) -> u32 {
        if self.total == 0 {
            0
        } else {
            (self.done as f64 / self.total as f64 * 100.0).round() as u32
        }
    }
}

impl std::ops::Add for NodeStats {
    type Output = NodeStats;

    fn add(self, rhs: NodeStats) -> NodeStats {
        NodeStats {
            total: self.total + rhs.total,
            done: self.done + rhs.done,
        }
    }
}

impl std::iter::Sum for NodeStats {
    fn sum<I: Iterator<Item = NodeStats>>(iter: I) -> Self {
        iter.fold(NodeStats::default(), |acc, s| acc + s)
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a SyllabusNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a SyllabusNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.sub_topics.iter().rev());
        Some(node)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub syllabus_progress: f64,
    #[serde(default)]
    pub priority: Level,
    #[serde(default)]
    pub archived: bool,
}

pub const SUBJECT_COLORS: [&str; 7] = [
    "#6366f1", "#ec4899", "#f59e0b", "#10b981", "#3b82f6", "#8b5cf6", "#f43f5e",
];

pub fn default_subjects() -> Vec<Subject> {
    let seed = [
        ("1", "General Studies", 45.0, Level::High),
        ("2", "Quantitative Aptitude", 60.0, Level::Medium),
        ("3", "Reasoning", 30.0, Level::Medium),
        ("4", "English", 75.0, Level::Low),
        ("5", "Current Affairs", 10.0, Level::High),
    ];
    seed.iter()
        .enumerate()
        .map(|(i, (id, name, progress, priority))| Subject {
            id: id.to_string(),
            name: name.to_string(),
            color: SUBJECT_COLORS[i % SUBJECT_COLORS.len()].to_string(),
            syllabus_progress: *progress,
            priority: *priority,
            archived: false,
        })
        .collect()
}

// Stage timestamps as a list of nullable epoch milliseconds
mod millis_vec {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        values: &[Option<DateTime<Utc>>],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| v.map(|dt| dt.timestamp_millis())))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Option<DateTime<Utc>>>, D::Error> {
        let raw: Vec<Option<i64>> = Vec::deserialize(deserializer)?;
        raw.into_iter()
            .map(|ms| match ms {
                None => Ok(None),
                Some(ms) => Utc
                    .timestamp_millis_opt(ms)
                    .single()
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {}", ms))),
            })
            .collect()
    }
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
