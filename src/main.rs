//! Task Insight - Binary Entry Point
//!
//! ```text
//! task-insight record      < events.jsonl   # ingest JSON lines from stdin
//! task-insight stats | tasks | scheduling | report
//! ```
//!
//! Configuration comes from `TASK_INSIGHT_MAX_EVENTS` and
//! `TASK_INSIGHT_DATA_DIR`; logging from `RUST_LOG`.

use std::io::{self, BufRead};
use std::sync::Arc;

use task_insight::analytics::{SchedulingAnalyzer, StatisticsEngine, TaskMetricsEngine};
use task_insight::{EventStore, InsightResult, StoreConfig, TaskEvent, TelemetryReport};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: task-insight [record|stats|tasks|scheduling|report]";

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Read one event per line from stdin, skipping lines that do not parse
fn record_from_stdin(store: &EventStore) -> InsightResult<usize> {
    let stdin = io::stdin();
    let mut recorded = 0;

    for (line_num, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match TaskEvent::from_json_line(&line) {
            Ok(event) => {
                store.record_event(event);
                recorded += 1;
            }
            Err(e) => warn!(line = line_num + 1, error = %e, "skipping malformed event"),
        }
    }

    store.flush_mirror();
    Ok(recorded)
}

fn print_json<T: serde::Serialize>(value: &T) -> InsightResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> InsightResult<()> {
    init_logging();

    let config = StoreConfig::from_env();
    if config.data_dir.is_none() {
        warn!("TASK_INSIGHT_DATA_DIR not set, events will not persist");
    }
    let store = Arc::new(EventStore::open(&config));

    let command = std::env::args().nth(1).unwrap_or_else(|| "report".to_string());
    match command.as_str() {
        "record" => {
            let recorded = record_from_stdin(&store)?;
            info!(recorded, retained = store.len(), "recorded events");
        }
        "stats" => print_json(&StatisticsEngine::new(Arc::clone(&store)).calculate())?,
        "tasks" => print_json(&TaskMetricsEngine::new(Arc::clone(&store)).all_task_metrics())?,
        "scheduling" => {
            print_json(&SchedulingAnalyzer::new(Arc::clone(&store)).analyze_all_tasks())?
        }
        "report" => println!("{}", TelemetryReport::generate(&store).to_json_pretty()?),
        other => return Err(format!("unknown command: {}\n{}", other, USAGE).into()),
    }

    Ok(())
}
