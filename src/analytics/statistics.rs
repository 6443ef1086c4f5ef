//! Statistics Engine
//!
//! Turns a snapshot of task events into aggregate counts and rates.
//! The same counting rules back the per-task metrics.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::event_store::EventStore;
use crate::types::{metadata_keys, TaskEvent, TaskEventType, TaskStatistics};
use crate::utils::local_hour;

/// Raw counts over statistics-relevant events
#[derive(Debug, Clone, Default)]
pub(crate) struct EventTally {
    pub relevant: usize,
    pub scheduled: usize,
    pub started: usize,
    pub completions: usize,
    pub completed_ok: usize,
    pub completed_failed: usize,
    pub failed_explicit: usize,
    pub expired: usize,
    pub cancelled: usize,
    pub continuous: usize,
    pub durations: Vec<f64>,
    pub last_started: Option<DateTime<Utc>>,
    pub starts_by_hour: BTreeMap<u32, usize>,
    pub errors_by_type: HashMap<String, usize>,
}

impl EventTally {
    /// Count `events`, skipping anything that is not a statistics event
    pub fn from_events<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a TaskEvent>,
    {
        let mut tally = Self::default();
        for event in events {
            tally.add(event);
        }
        tally
    }

    fn add(&mut self, event: &TaskEvent) {
        if !event.is_task_statistics_event() {
            return;
        }
        self.relevant += 1;

        match event.event_type {
            TaskEventType::Scheduled => self.scheduled += 1,
            TaskEventType::ExecutionStarted => {
                self.started += 1;
                *self.starts_by_hour.entry(local_hour(event.timestamp)).or_insert(0) += 1;
                if self.last_started.map_or(true, |t| event.timestamp > t) {
                    self.last_started = Some(event.timestamp);
                }
            }
            TaskEventType::ExecutionCompleted => {
                self.completions += 1;
                if event.success {
                    self.completed_ok += 1;
                } else {
                    self.completed_failed += 1;
                    self.count_error(event);
                }
                if let Some(duration) = event.duration {
                    self.durations.push(duration);
                }
            }
            TaskEventType::Failed => {
                self.failed_explicit += 1;
                self.count_error(event);
            }
            TaskEventType::Expired => {
                self.expired += 1;
                self.count_error(event);
            }
            TaskEventType::Cancelled => {
                self.cancelled += 1;
                self.count_error(event);
            }
            TaskEventType::ContinuousTaskStarted
            | TaskEventType::ContinuousTaskPaused
            | TaskEventType::ContinuousTaskResumed
            | TaskEventType::ContinuousTaskStopped
            | TaskEventType::ContinuousTaskProgress => self.continuous += 1,
            TaskEventType::Initialization
            | TaskEventType::AppEnteredBackground
            | TaskEventType::AppWillEnterForeground
            | TaskEventType::DiagnosticDataReceived => {}
        }
    }

    fn count_error(&mut self, event: &TaskEvent) {
        let Some(message) = event.error_message.as_deref() else {
            return;
        };
        let category = event
            .metadata
            .get(metadata_keys::ERROR_CATEGORY)
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| categorize_error(message).to_string());
        *self.errors_by_type.entry(category).or_insert(0) += 1;
    }

    /// Executions: starts, or completions when no start was recorded
    ///
    /// Lifted to the successful completion count only when evicted starts
    /// would otherwise leave `completed > executed`.
    pub fn executed(&self) -> usize {
        if self.started > 0 {
            self.started.max(self.completed_ok)
        } else {
            self.completions
        }
    }

    /// Successful completions
    pub fn completed(&self) -> usize {
        self.completed_ok
    }

    /// Failed completions + explicit failures + expirations + cancellations
    pub fn failed(&self) -> usize {
        self.completed_failed + self.failed_explicit + self.expired + self.cancelled
    }

    pub fn success_rate(&self) -> f64 {
        let executed = self.executed();
        if executed == 0 {
            return 0.0;
        }
        self.completed() as f64 / executed as f64
    }

    pub fn average_duration(&self) -> f64 {
        if self.durations.is_empty() {
            return 0.0;
        }
        self.durations.iter().sum::<f64>() / self.durations.len() as f64
    }

    pub fn min_duration(&self) -> Option<f64> {
        self.durations.iter().copied().reduce(f64::min)
    }

    pub fn max_duration(&self) -> Option<f64> {
        self.durations.iter().copied().reduce(f64::max)
    }
}

/// Derive an error category from a free-form message
pub fn categorize_error(message: &str) -> &'static str {
    let lower = message.to_lowercase();

    if contains_any(&lower, &["timeout", "timed out"]) {
        "timeout"
    } else if contains_any(&lower, &["network", "connection", "offline", "dns", "unreachable"]) {
        "network"
    } else if contains_any(&lower, &["permission", "denied", "unauthorized", "forbidden"]) {
        "permission"
    } else if contains_any(&lower, &["memory", "disk", "quota", "no space", "storage"]) {
        "resource"
    } else if contains_any(&lower, &["cancel"]) {
        "cancelled"
    } else if contains_any(&lower, &["expire"]) {
        "expired"
    } else {
        "other"
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Compute aggregate statistics over a snapshot
pub fn compute_statistics(events: &[TaskEvent]) -> TaskStatistics {
    let tally = EventTally::from_events(events);
    if tally.relevant == 0 {
        return TaskStatistics::empty();
    }

    TaskStatistics {
        total_tasks_scheduled: tally.scheduled,
        total_tasks_executed: tally.executed(),
        total_tasks_completed: tally.completed(),
        total_tasks_failed: tally.failed(),
        total_tasks_expired: tally.expired,
        total_tasks_cancelled: tally.cancelled,
        continuous_task_events: tally.continuous,
        success_rate: tally.success_rate(),
        average_execution_time: tally.average_duration(),
        executions_by_hour: tally.starts_by_hour,
        errors_by_type: tally.errors_by_type,
        last_execution_time: tally.last_started,
        generated_at: Utc::now(),
    }
}

/// Statistics over an injected store
pub struct StatisticsEngine {
    store: Arc<EventStore>,
}

impl StatisticsEngine {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }

    /// Statistics over every retained event
    pub fn calculate(&self) -> TaskStatistics {
        compute_statistics(&self.store.get_all_events())
    }

    /// Statistics over events with `from <= timestamp <= to`
    pub fn calculate_in_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> TaskStatistics {
        compute_statistics(&self.store.get_events_in_date_range(from, to))
    }
}
