mod backup;
mod clock;
mod config;
mod db;
mod error;
mod models;
mod scan;
mod state;
mod syllabus;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clock::{Clock, SystemClock};
use config::Config;
use db::Database;
use models::{
    parse_stage, stage_name, JsonOutput, SyllabusNode, REVISION_INTERVAL_DAYS, STAGE_COUNT,
    SYLLABUS_STAGES,
};
use state::{Action, AppState, Effect, SnapshotSink, Store};

#[derive(Parser)]
#[command(name = "examos")]
#[command(about = "Syllabus mastery and spaced-repetition tracker for exam aspirants")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// List the pipeline stages and their revision intervals
    Stages,

    /// List subjects with their mastery
    Subjects,

    /// Show a subject's syllabus tree
    Tree {
        /// Subject name
        subject: String,
    },

    /// Manage syllabus nodes
    #[command(subcommand)]
    Node(NodeCommands),

    /// Mark a stage complete, or clear it if already complete
    Toggle {
        /// Subject name
        subject: String,

        /// Node ID
        id: String,

        /// Stage number (1-14) or stage name
        stage: String,
    },

    /// List every node due for revision today
    Due,

    /// Search a subject's top-level topics by name
    Search {
        /// Subject name
        subject: String,

        /// Case-insensitive name fragment
        query: Option<String>,

        /// Only show topics due for revision
        #[arg(long)]
        due: bool,
    },

    /// Show mastery statistics
    Stats,

    /// Write the full application state to a JSON backup
    Export {
        /// Output file (default: ExamOS_Backup_<date>.json)
        path: Option<PathBuf>,
    },

    /// Replace the application state from a JSON backup
    Import {
        /// Backup file
        path: PathBuf,
    },

    /// Periodically report nodes due for revision
    Watch {
        /// Seconds between scans (default from config)
        #[arg(long, short)]
        interval: Option<u64>,

        /// Stop after this many scans
        #[arg(long, short = 'n')]
        ticks: Option<u64>,
    },
}

#[derive(Subcommand)]
enum NodeCommands {
    /// Add a topic, at the subject root or under a parent
    Add {
        /// Subject name
        subject: String,

        /// Topic name
        name: String,

        /// Parent node ID
        #[arg(long, short)]
        parent: Option<String>,
    },

    /// Delete a node and all of its sub-topics
    Delete {
        /// Subject name
        subject: String,

        /// Node ID
        id: String,
    },

    /// Show node details
    Show {
        /// Subject name
        subject: String,

        /// Node ID
        id: String,
    },
}

fn init_logging(config: &Config) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("examos={}", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(&config);

    if let Err(e) = run(cli, &config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = config.db_path();
    let db = Database::open(&db_path)?;
    db.init()?;

    // Handled without loading the stored snapshot
    match &cli.command {
        Commands::Watch { interval, ticks } => {
            return watch(&db, config, cli.json, *interval, *ticks);
        }
        Commands::Init => {
            let sink = db.sink(config.storage_key.clone());
            state::seed_default(&sink)?;
            let info = db.snapshot_info(&config.storage_key)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "db_path": db_path.display().to_string(),
                        "snapshot_bytes": info.as_ref().map(|i| i.bytes),
                        "saved_at": info.as_ref().map(|i| i.saved_at.clone())
                    })))?
                );
            } else {
                println!("Database initialized at: {}", db_path.display());
                if let Some(info) = info {
                    println!(
                        "Snapshot '{}': {} bytes, saved {}",
                        info.key, info.bytes, info.saved_at
                    );
                }
            }
            return Ok(());
        }
        Commands::Import { path } => {
            let sink = db.sink(config.storage_key.clone());
            let state = backup::restore(&sink, path, config.snapshot_mode())?;
            let nodes = state.syllabus.all_nodes().count();
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({ "nodes": nodes })))?
                );
            } else {
                println!("Imported {} topic(s) from {}.", nodes, path.display());
            }
            return Ok(());
        }
        _ => {}
    }

    let mut store = Store::open(
        db.sink(config.storage_key.clone()),
        Box::new(SystemClock),
        config.policy(),
        config.snapshot_mode(),
    )?;
    let today = store.clock().today();

    match cli.command {
        Commands::Stages => {
            if cli.json {
                let stages: Vec<_> = SYLLABUS_STAGES
                    .iter()
                    .zip(REVISION_INTERVAL_DAYS.iter())
                    .enumerate()
                    .map(|(i, (name, days))| {
                        serde_json::json!({ "stage": i + 1, "name": name, "interval_days": days })
                    })
                    .collect();
                println!("{}", serde_json::to_string(&JsonOutput::ok(stages))?);
            } else {
                println!("{:<4} {:<20} NEXT REVISION", "#", "STAGE");
                println!("{}", "-".repeat(40));
                for (i, (name, days)) in SYLLABUS_STAGES
                    .iter()
                    .zip(REVISION_INTERVAL_DAYS.iter())
                    .enumerate()
                {
                    println!("{:<4} {:<20} +{}d", i + 1, name, days);
                }
            }
        }

        Commands::Subjects => {
            let state = store.state();
            let rows: Vec<_> = state
                .subject_names()
                .into_iter()
                .map(|name| {
                    let roots = state.syllabus.roots(&name);
                    let nodes: usize = roots.iter().map(|n| n.descendants().count()).sum();
                    let mastery = state.syllabus.subject_stats(&name).mastery();
                    (name, nodes, mastery)
                })
                .collect();

            if cli.json {
                let data: Vec<_> = rows
                    .iter()
                    .map(|(name, nodes, mastery)| {
                        serde_json::json!({ "name": name, "nodes": nodes, "mastery": mastery })
                    })
                    .collect();
                println!("{}", serde_json::to_string(&JsonOutput::ok(data))?);
            } else if rows.is_empty() {
                println!("No subjects found.");
            } else {
                println!("{:<30} {:>6} {:>8}", "SUBJECT", "NODES", "MASTERY");
                println!("{}", "-".repeat(46));
                for (name, nodes, mastery) in rows {
                    println!("{:<30} {:>6} {:>7}%", truncate(&name, 28), nodes, mastery);
                }
            }
        }

        Commands::Tree { subject } => {
            let roots = store.syllabus().roots(&subject);
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(roots))?);
            } else if roots.is_empty() {
                println!("No topics in '{}'. Add one with: examos node add \"{}\" <name>", subject, subject);
            } else {
                println!(
                    "{} ({}% mastery)",
                    subject,
                    store.syllabus().subject_stats(&subject).mastery()
                );
                println!();
                for root in roots {
                    print_tree(root, 0, today);
                }
            }
        }

        Commands::Node(node_cmd) => match node_cmd {
            NodeCommands::Add {
                subject,
                name,
                parent,
            } => {
                let action = Action::AddNode {
                    subject: subject.clone(),
                    parent_id: parent,
                    name: name.clone(),
                };
                if let Some(Effect::Added { id }) = apply(&mut store, action, cli.json)? {
                    if cli.json {
                        println!(
                            "{}",
                            serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                                "id": id,
                                "name": name.trim()
                            })))?
                        );
                    } else {
                        println!("Added '{}' to {} with ID: {}", name.trim(), subject, id);
                    }
                }
            }

            NodeCommands::Delete { subject, id } => {
                let action = Action::DeleteNode {
                    subject,
                    node_id: id.clone(),
                };
                if let Some(Effect::Deleted { removed }) = apply(&mut store, action, cli.json)? {
                    if cli.json {
                        println!(
                            "{}",
                            serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                                "removed": removed
                            })))?
                        );
                    } else {
                        println!("Node {} deleted ({} node(s) removed).", id, removed);
                    }
                }
            }

            NodeCommands::Show { subject, id } => {
                if let Some(node) = store.syllabus().find(&subject, &id) {
                    if cli.json {
                        println!(
                            "{}",
                            serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                                "node": node,
                                "stats": node.stats(),
                                "mastery": node.mastery(),
                                "due": node.is_due(today)
                            })))?
                        );
                    } else {
                        print_node(node, today);
                    }
                } else if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::<()>::err("Node not found"))?
                    );
                } else {
                    println!("Node not found.");
                }
            }
        },

        Commands::Toggle { subject, id, stage } => {
            let stage_idx = parse_stage(&stage).ok_or_else(|| {
                format!(
                    "Invalid stage '{}'. Use a number from 1 to {} or a stage name (see `examos stages`)",
                    stage, STAGE_COUNT
                )
            })?;
            let action = Action::ToggleStage {
                subject,
                node_id: id.clone(),
                stage: stage_idx,
            };
            if let Some(effect) = apply(&mut store, action, cli.json)? {
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&effect))?);
                } else if let Effect::Toggled {
                    completed,
                    next_revision,
                } = effect
                {
                    let verb = if completed { "completed" } else { "cleared" };
                    println!(
                        "Stage '{}' {} for node {}.",
                        stage_name(stage_idx).unwrap_or_default(),
                        verb,
                        id
                    );
                    if let Some(next) = next_revision {
                        println!("Next revision: {}", format_date(next));
                    }
                }
            }
        }

        Commands::Due => {
            let report = scan::scan(store.state(), today);
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&report))?);
            } else {
                print_due(&report);
            }
        }

        Commands::Search { subject, query, due } => {
            let hits: Vec<&SyllabusNode> = store
                .syllabus()
                .search(&subject, query.as_deref().unwrap_or(""))
                .into_iter()
                .filter(|node| !due || node.is_due(today))
                .collect();

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&hits))?);
            } else if hits.is_empty() {
                println!("No matching topics.");
            } else {
                println!("{:<10} {:<40} {:>8}", "ID", "NAME", "MASTERY");
                println!("{}", "-".repeat(60));
                for node in hits {
                    println!(
                        "{:<10} {:<40} {:>7}%{}",
                        node.id,
                        truncate(&node.name, 38),
                        node.mastery(),
                        if node.is_due(today) { "  due" } else { "" }
                    );
                }
            }
        }

        Commands::Stats => {
            let state = store.state();
            let global = state.syllabus.global_stats();
            let nodes = state.syllabus.all_nodes().count();
            let due = state.syllabus.filter_due(today).count();

            if cli.json {
                let subjects: serde_json::Map<String, serde_json::Value> = state
                    .subject_names()
                    .into_iter()
                    .map(|name| {
                        let mastery = state.syllabus.subject_stats(&name).mastery();
                        (name, serde_json::json!(mastery))
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "total_nodes": nodes,
                        "stages_done": global.done,
                        "stages_total": global.total,
                        "mastery": global.mastery(),
                        "due_now": due,
                        "subjects": subjects
                    })))?
                );
            } else {
                println!("=== Syllabus Statistics ===");
                println!("Topics: {}", nodes);
                println!("Stages completed: {}/{}", global.done, global.total);
                println!("Overall mastery: {}%", global.mastery());
                println!("Due for revision: {}", due);
                println!();
                for name in state.subject_names() {
                    let mastery = state.syllabus.subject_stats(&name).mastery();
                    println!("  {:<30} {:>3}% {}", truncate(&name, 28), mastery, mastery_bar(mastery));
                }
            }
        }

        Commands::Export { path } => {
            let path = path.unwrap_or_else(|| backup::default_backup_name(store.clock().now()));
            backup::export(store.state(), &path)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "path": path.display().to_string()
                    })))?
                );
            } else {
                println!("Backup written to: {}", path.display());
            }
        }

        Commands::Init | Commands::Import { .. } | Commands::Watch { .. } => {
            unreachable!("handled before the store is opened")
        }
    }

    Ok(())
}

/// Dispatch an action. Not-found targets are reported to the user and
/// yield `None`; any other rejection is an error.
fn apply<S: SnapshotSink>(
    store: &mut Store<S>,
    action: Action,
    json: bool,
) -> Result<Option<Effect>, Box<dyn std::error::Error>> {
    match store.dispatch(action)? {
        Ok(effect) => Ok(Some(effect)),
        Err(e) if e.is_not_found() => {
            if json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::err(e.to_string()))?);
            } else {
                println!("Not found: {}.", e);
            }
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn watch(
    db: &Database,
    config: &Config,
    json: bool,
    interval: Option<u64>,
    ticks: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let interval = Duration::from_secs(interval.unwrap_or(config.scan_interval_secs).max(1));
    let sink = db.sink(config.storage_key.clone());
    let mode = config.snapshot_mode();
    let clock = SystemClock;

    scan::watch(
        || match sink.load()? {
            Some(body) => Ok(AppState::from_snapshot(&body, mode)?),
            None => Ok(AppState::default()),
        },
        || clock.today(),
        interval,
        ticks,
        |report| {
            if json {
                match serde_json::to_string(report) {
                    Ok(line) => println!("{}", line),
                    Err(e) => eprintln!("Error: {}", e),
                }
            } else {
                print_due(report);
            }
        },
    )?;
    Ok(())
}

fn print_tree(node: &SyllabusNode, depth: usize, today: chrono::DateTime<chrono::Utc>) {
    println!(
        "{}{} {:>3}% {} [{}]{}",
        "  ".repeat(depth),
        stage_bar(&node.stages),
        node.mastery(),
        node.name,
        node.id,
        if node.is_due(today) { "  (revision due)" } else { "" }
    );
    for child in &node.sub_topics {
        print_tree(child, depth + 1, today);
    }
}

fn print_node(node: &SyllabusNode, today: chrono::DateTime<chrono::Utc>) {
    let stats = node.stats();
    println!("Topic: {}", node.name);
    println!("ID: {}", node.id);
    println!(
        "Mastery: {}% ({}/{} stages, {} sub-topic(s))",
        stats.mastery(),
        stats.done,
        stats.total,
        node.descendant_count()
    );
    println!(
        "Difficulty: {}  Weightage: {}  Confidence: {}  Expected questions: {}",
        node.difficulty.as_str(),
        node.weightage.as_str(),
        node.confidence,
        node.expected_questions
    );
    if let Some(last) = node.last_revision_date {
        println!("Last revision: {}", format_date(last));
    }
    if let Some(next) = node.next_revision_date {
        let due = if node.is_due(today) { " (due)" } else { "" };
        println!("Next revision: {}{}", format_date(next), due);
    }
    println!();
    println!("--- Stages ---");
    for (i, name) in SYLLABUS_STAGES.iter().enumerate() {
        let done = node.stages.get(i).copied().unwrap_or(false);
        let at = node
            .stage_timestamps
            .get(i)
            .copied()
            .flatten()
            .map(format_date)
            .unwrap_or_default();
        println!("{:>2}. [{}] {:<20} {}", i + 1, if done { "x" } else { " " }, name, at);
    }
    if !node.sub_topics.is_empty() {
        println!();
        println!("--- Sub-topics ---");
        for child in &node.sub_topics {
            println!("{:<10} {:<40} {:>3}%", child.id, truncate(&child.name, 38), child.mastery());
        }
    }
}

fn print_due(report: &scan::DueReport) {
    if report.entries.is_empty() {
        println!("Nothing due for revision.");
        return;
    }
    println!("{:<22} {:<10} {:<32} OVERDUE", "SUBJECT", "ID", "TOPIC");
    println!("{}", "-".repeat(76));
    for entry in &report.entries {
        println!(
            "{:<22} {:<10} {:<32} {}d",
            truncate(&entry.subject, 20),
            entry.id,
            truncate(&entry.name, 30),
            entry.overdue_days
        );
    }
}

fn stage_bar(stages: &[bool]) -> String {
    stages.iter().map(|done| if *done { '█' } else { '░' }).collect()
}

fn mastery_bar(percent: u32) -> String {
    let filled = (percent.min(100) / 10) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

fn format_date(at: chrono::DateTime<chrono::Utc>) -> String {
    at.with_timezone(&chrono::Local).format("%b %d %Y %H:%M").to_string()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    mod truncate_tests {
        use super::*;

        #[test]
        fn truncate_short_string() {
            assert_eq!(truncate("hello", 10), "hello");
        }

        #[test]
        fn truncate_exact_length() {
            assert_eq!(truncate("hello", 5), "hello");
        }

        #[test]
        fn truncate_long_string() {
            assert_eq!(truncate("hello world", 8), "hello...");
        }

        #[test]
        fn truncate_counts_chars_not_bytes() {
            assert_eq!(truncate("संविधान सभा", 6), "संव...");
        }
    }

    mod bar_tests {
        use super::*;

        #[test]
        fn stage_bar_marks_completed() {
            let mut stages = vec![false; STAGE_COUNT];
            stages[0] = true;
            stages[13] = true;
            let bar = stage_bar(&stages);
            assert_eq!(bar.chars().count(), STAGE_COUNT);
            assert!(bar.starts_with('█'));
            assert!(bar.ends_with('█'));
            assert_eq!(bar.chars().filter(|c| *c == '█').count(), 2);
        }

        #[test]
        fn mastery_bar_scales_to_ten() {
            assert_eq!(mastery_bar(0), "░░░░░░░░░░");
            assert_eq!(mastery_bar(18), "█░░░░░░░░░");
            assert_eq!(mastery_bar(100), "██████████");
            assert_eq!(mastery_bar(250), "██████████");
        }
    }

    mod apply_tests {
        use super::*;
        use crate::clock::FixedClock;
        use crate::state::{MemorySink, SnapshotMode};
        use crate::syllabus::SchedulePolicy;
        use chrono::{TimeZone, Utc};

        fn store() -> Store<MemorySink> {
            Store::open(
                MemorySink::default(),
                Box::new(FixedClock(Utc.with_ymd_and_hms(2024, 3, 10, 10, 0, 0).unwrap())),
                SchedulePolicy::default(),
                SnapshotMode::Repair,
            )
            .unwrap()
        }

        #[test]
        fn not_found_is_reported_not_raised() {
            let mut store = store();
            let result = apply(
                &mut store,
                Action::DeleteNode {
                    subject: "English".into(),
                    node_id: "ghost".into(),
                },
                true,
            )
            .unwrap();
            assert!(result.is_none());
        }

        #[test]
        fn other_rejections_are_errors() {
            let mut store = store();
            let result = apply(
                &mut store,
                Action::AddNode {
                    subject: "English".into(),
                    parent_id: None,
                    name: "  ".into(),
                },
                false,
            );
            assert!(result.is_err());
        }

        #[test]
        fn applied_effect_is_returned() {
            let mut store = store();
            let effect = apply(
                &mut store,
                Action::AddNode {
                    subject: "English".into(),
                    parent_id: None,
                    name: "Grammar".into(),
                },
                false,
            )
            .unwrap();
            assert!(matches!(effect, Some(Effect::Added { .. })));
        }
    }

    mod cli_parsing_tests {
        use super::*;

        #[test]
        fn parse_init_command() {
            let cli = Cli::try_parse_from(["examos", "init"]).unwrap();
            assert!(!cli.json);
            assert!(matches!(cli.command, Commands::Init));
        }

        #[test]
        fn parse_json_flag_global() {
            let cli1 = Cli::try_parse_from(["examos", "--json", "stats"]).unwrap();
            assert!(cli1.json);

            let cli2 = Cli::try_parse_from(["examos", "stats", "--json"]).unwrap();
            assert!(cli2.json);
        }

        #[test]
        fn parse_node_add_root() {
            let cli =
                Cli::try_parse_from(["examos", "node", "add", "General Studies", "Polity"]).unwrap();
            match cli.command {
                Commands::Node(NodeCommands::Add {
                    subject,
                    name,
                    parent,
                }) => {
                    assert_eq!(subject, "General Studies");
                    assert_eq!(name, "Polity");
                    assert!(parent.is_none());
                }
                _ => panic!("Expected Node Add command"),
            }
        }

        #[test]
        fn parse_node_add_with_parent() {
            let cli = Cli::try_parse_from([
                "examos",
                "node",
                "add",
                "General Studies",
                "Fundamental Rights",
                "-p",
                "k3j9x0a1b",
            ])
            .unwrap();
            match cli.command {
                Commands::Node(NodeCommands::Add { parent, .. }) => {
                    assert_eq!(parent, Some("k3j9x0a1b".to_string()));
                }
                _ => panic!("Expected Node Add command"),
            }
        }

        #[test]
        fn parse_node_delete_and_show() {
            let cli = Cli::try_parse_from(["examos", "node", "delete", "English", "abc"]).unwrap();
            assert!(matches!(
                cli.command,
                Commands::Node(NodeCommands::Delete { ref subject, ref id })
                    if subject == "English" && id == "abc"
            ));

            let cli = Cli::try_parse_from(["examos", "node", "show", "English", "abc"]).unwrap();
            assert!(matches!(cli.command, Commands::Node(NodeCommands::Show { .. })));
        }

        #[test]
        fn parse_toggle_command() {
            let cli =
                Cli::try_parse_from(["examos", "toggle", "English", "abc", "First Reading"]).unwrap();
            match cli.command {
                Commands::Toggle { subject, id, stage } => {
                    assert_eq!(subject, "English");
                    assert_eq!(id, "abc");
                    assert_eq!(parse_stage(&stage), Some(2));
                }
                _ => panic!("Expected Toggle command"),
            }
        }

        #[test]
        fn parse_search_with_due() {
            let cli = Cli::try_parse_from(["examos", "search", "English", "gram", "--due"]).unwrap();
            match cli.command {
                Commands::Search { subject, query, due } => {
                    assert_eq!(subject, "English");
                    assert_eq!(query, Some("gram".to_string()));
                    assert!(due);
                }
                _ => panic!("Expected Search command"),
            }
        }

        #[test]
        fn parse_search_without_query() {
            let cli = Cli::try_parse_from(["examos", "search", "English"]).unwrap();
            assert!(matches!(
                cli.command,
                Commands::Search { query: None, due: false, .. }
            ));
        }

        #[test]
        fn parse_watch_flags() {
            let cli = Cli::try_parse_from(["examos", "watch", "-i", "5", "-n", "2"]).unwrap();
            match cli.command {
                Commands::Watch { interval, ticks } => {
                    assert_eq!(interval, Some(5));
                    assert_eq!(ticks, Some(2));
                }
                _ => panic!("Expected Watch command"),
            }
        }

        #[test]
        fn parse_export_optional_path() {
            let cli = Cli::try_parse_from(["examos", "export"]).unwrap();
            assert!(matches!(cli.command, Commands::Export { path: None }));

            let cli = Cli::try_parse_from(["examos", "export", "out.json"]).unwrap();
            match cli.command {
                Commands::Export { path } => assert_eq!(path, Some(PathBuf::from("out.json"))),
                _ => panic!("Expected Export command"),
            }
        }

        #[test]
        fn parse_simple_commands() {
            let parse = |arg: &str| Cli::try_parse_from(["examos", arg]).unwrap().command;
            assert!(matches!(parse("stages"), Commands::Stages));
            assert!(matches!(parse("subjects"), Commands::Subjects));
            assert!(matches!(parse("due"), Commands::Due));
            assert!(matches!(parse("stats"), Commands::Stats));
        }

        #[test]
        fn parse_invalid_command_fails() {
            assert!(Cli::try_parse_from(["examos", "invalid"]).is_err());
        }

        #[test]
        fn parse_missing_required_arg_fails() {
            assert!(Cli::try_parse_from(["examos", "node", "add", "English"]).is_err());
            assert!(Cli::try_parse_from(["examos", "toggle", "English", "abc"]).is_err());
            assert!(Cli::try_parse_from(["examos", "tree"]).is_err());
            assert!(Cli::try_parse_from(["examos", "import"]).is_err());
        }
    }
}
