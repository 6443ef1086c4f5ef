//! Task Metrics Engine
//!
//! Per-task performance profiles using the same counting rules as the
//! aggregate statistics.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use rayon::prelude::*;

use crate::event_store::EventStore;
use crate::types::{TaskEvent, TaskPerformanceMetrics};

use super::statistics::EventTally;

fn build_metrics(task_identifier: &str, tally: &EventTally) -> TaskPerformanceMetrics {
    TaskPerformanceMetrics {
        task_identifier: task_identifier.to_string(),
        total_scheduled: tally.scheduled,
        total_executed: tally.executed(),
        total_completed: tally.completed(),
        total_failed: tally.failed(),
        total_expired: tally.expired,
        success_rate: tally.success_rate(),
        average_duration: tally.average_duration(),
        min_duration: tally.min_duration(),
        max_duration: tally.max_duration(),
        last_executed_at: tally.last_started,
        generated_at: Utc::now(),
    }
}

/// Metrics for one task, `None` when it has no statistics-relevant events
pub fn compute_task_metrics(events: &[TaskEvent], task_identifier: &str) -> Option<TaskPerformanceMetrics> {
    let tally = EventTally::from_events(
        events
            .iter()
            .filter(|e| e.task_identifier == task_identifier),
    );
    if tally.relevant == 0 {
        return None;
    }
    Some(build_metrics(task_identifier, &tally))
}

/// Metrics for every task in the snapshot, ordered by identifier
pub fn compute_all_task_metrics(events: &[TaskEvent]) -> Vec<TaskPerformanceMetrics> {
    let mut groups: BTreeMap<&str, Vec<&TaskEvent>> = BTreeMap::new();
    for event in events.iter().filter(|e| e.is_task_statistics_event()) {
        groups
            .entry(event.task_identifier.as_str())
            .or_default()
            .push(event);
    }

    let groups: Vec<(&str, Vec<&TaskEvent>)> = groups.into_iter().collect();
    groups
        .par_iter()
        .map(|(task_identifier, task_events)| {
            let tally = EventTally::from_events(task_events.iter().copied());
            build_metrics(task_identifier, &tally)
        })
        .collect()
}

/// Per-task metrics over an injected store
pub struct TaskMetricsEngine {
    store: Arc<EventStore>,
}

impl TaskMetricsEngine {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }

    pub fn task_metrics(&self, task_identifier: &str) -> Option<TaskPerformanceMetrics> {
        compute_task_metrics(&self.store.get_events_for(task_identifier), task_identifier)
    }

    pub fn all_task_metrics(&self) -> Vec<TaskPerformanceMetrics> {
        compute_all_task_metrics(&self.store.get_all_events())
    }
}
