//! Aggregate task statistics

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate statistics over a snapshot of task events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatistics {
    pub total_tasks_scheduled: usize,
    /// Execution starts, or completions when no starts were recorded
    pub total_tasks_executed: usize,
    /// Successful completions only
    pub total_tasks_completed: usize,
    /// Failed completions + explicit failures + expirations + cancellations
    pub total_tasks_failed: usize,
    pub total_tasks_expired: usize,
    pub total_tasks_cancelled: usize,
    pub continuous_task_events: usize,
    /// `completed / executed`, always within `[0, 1]`
    pub success_rate: f64,
    /// Mean completion duration in seconds
    pub average_execution_time: f64,
    /// Execution starts keyed by local hour of day (0-23)
    pub executions_by_hour: BTreeMap<u32, usize>,
    pub errors_by_type: HashMap<String, usize>,
    pub last_execution_time: Option<DateTime<Utc>>,
    pub generated_at: DateTime<Utc>,
}

impl TaskStatistics {
    /// Statistics for an empty snapshot
    pub fn empty() -> Self {
        Self {
            total_tasks_scheduled: 0,
            total_tasks_executed: 0,
            total_tasks_completed: 0,
            total_tasks_failed: 0,
            total_tasks_expired: 0,
            total_tasks_cancelled: 0,
            continuous_task_events: 0,
            success_rate: 0.0,
            average_execution_time: 0.0,
            executions_by_hour: BTreeMap::new(),
            errors_by_type: HashMap::new(),
            last_execution_time: None,
            generated_at: Utc::now(),
        }
    }

    /// Whether any statistics-relevant event contributed
    pub fn has_data(&self) -> bool {
        self.total_tasks_scheduled > 0
            || self.total_tasks_executed > 0
            || self.total_tasks_failed > 0
            || self.continuous_task_events > 0
    }
}
