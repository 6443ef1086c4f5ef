//! Per-task performance metrics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Performance profile of one task identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPerformanceMetrics {
    pub task_identifier: String,
    pub total_scheduled: usize,
    pub total_executed: usize,
    pub total_completed: usize,
    pub total_failed: usize,
    pub total_expired: usize,
    pub success_rate: f64,
    /// Mean completion duration in seconds (0 when none carried a duration)
    pub average_duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_executed_at: Option<DateTime<Utc>>,
    pub generated_at: DateTime<Utc>,
}
