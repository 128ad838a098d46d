use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DueEntry {
    pub subject: String,
    pub id: String,
    pub name: String,
    pub next_revision: DateTime<Utc>,
    pub overdue_days: i64,
    pub mastery: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DueReport {
    pub today: DateTime<Utc>,
    pub entries: Vec<DueEntry>,
}

/// Everything due for revision as of `today`. Read-only over the state.
pub fn scan(state: &AppState, today: DateTime<Utc>) -> DueReport {
    let entries = state
        .syllabus
        .filter_due(today)
        .filter_map(|(subject, node)| {
            let next = node.next_revision_date?;
            Some(DueEntry {
                subject: subject.to_string(),
                id: node.id.clone(),
                name: node.name.clone(),
                next_revision: next,
                overdue_days: today.signed_duration_since(next).num_days().max(0),
                mastery: node.mastery(),
            })
        })
        .collect();

    DueReport { today, entries }
}

/// Re-run `tick` every `interval`, `ticks` times (forever when `None`).
/// `load` is called afresh each tick so edits made elsewhere are seen.
pub fn watch<L, T>(
    mut load: L,
    today: impl Fn() -> DateTime<Utc>,
    interval: Duration,
    ticks: Option<u64>,
    mut tick: T,
) -> Result<(), StorageError>
where
    L: FnMut() -> Result<AppState, StorageError>,
    T: FnMut(&DueReport),
{
    info!(interval_secs = interval.as_secs(), ?ticks, "starting revision scan");
    let mut n = 0u64;
    while ticks.map_or(true, |max| n < max) {
        if n > 0 {
            thread::sleep(interval);
        }
        let state = load()?;
        let report = scan(&state, today());
        debug!(tick = n, due = report.entries.len(), "revision scan tick");
        for entry in &report.entries {
            info!(subject = %entry.subject, node = %entry.name, overdue_days = entry.overdue_days, "revision due");
        }
        tick(&report);
        n += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syllabus::SchedulePolicy;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 10, 0, 0).unwrap()
    }

    fn sample_state() -> AppState {
        let mut state = AppState::default();
        let s = &mut state.syllabus;
        let polity = s.add_node("General Studies", None, "Polity").unwrap();
        let rights = s
            .add_node("General Studies", Some(&polity), "Fundamental Rights")
            .unwrap();
        let algebra = s.add_node("Quantitative Aptitude", None, "Algebra").unwrap();
        let policy = SchedulePolicy::default();
        s.toggle_stage("General Studies", &rights, 0, t0(), policy).unwrap();
        s.toggle_stage("Quantitative Aptitude", &algebra, 3, t0(), policy).unwrap();
        s.toggle_stage("General Studies", &polity, 13, t0(), policy).unwrap();
        state
    }

    #[test]
    fn scan_lists_due_nodes_with_overdue_days() {
        let state = sample_state();
        let today = t0() + ChronoDuration::days(5);
        let report = scan(&state, today);

        let names: Vec<&str> = report.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Fundamental Rights", "Algebra"]);
        assert_eq!(report.entries[0].overdue_days, 4);
        assert_eq!(report.entries[1].overdue_days, 2);
        assert_eq!(report.entries[0].mastery, 7);
    }

    #[test]
    fn scan_does_not_touch_state() {
        let state = sample_state();
        let before = state.clone();
        scan(&state, t0() + ChronoDuration::days(400));
        assert_eq!(state, before);
    }

    #[test]
    fn nothing_due_before_first_interval() {
        let state = sample_state();
        assert!(scan(&state, t0()).entries.is_empty());
    }

    #[test]
    fn watch_runs_bounded_ticks_and_reloads() {
        let state = sample_state();
        let mut loads = 0;
        let mut seen = Vec::new();
        watch(
            || {
                loads += 1;
                Ok(state.clone())
            },
            || t0() + ChronoDuration::days(2),
            Duration::from_millis(1),
            Some(3),
            |report| seen.push(report.entries.len()),
        )
        .unwrap();

        assert_eq!(loads, 3);
        assert_eq!(seen, vec![1, 1, 1]);
    }

    #[test]
    fn watch_with_zero_ticks_never_loads() {
        let mut loads = 0;
        watch(
            || {
                loads += 1;
                Ok(AppState::default())
            },
            t0,
            Duration::from_millis(1),
            Some(0),
            |_| panic!("tick should not run"),
        )
        .unwrap();
        assert_eq!(loads, 0);
    }

    #[test]
    fn watch_stops_on_load_error() {
        let result = watch(
            || Err(StorageError::Database(rusqlite::Error::InvalidQuery)),
            t0,
            Duration::from_millis(1),
            None,
            |_| panic!("tick should not run"),
        );
        assert!(matches!(result, Err(StorageError::Database(_))));
    }
}
