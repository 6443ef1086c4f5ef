//! Combined telemetry report
//!
//! Bundles every derived view computed from a single snapshot, for export
//! to reporting collaborators. Store stats are read under the same lock as
//! the events, so counts in the report always agree.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::event_store::{EventStore, EventStoreStats};
use crate::types::{SchedulingAnalysis, TaskEvent, TaskPerformanceMetrics, TaskStatistics};

use super::scheduling::analyze_all;
use super::statistics::compute_statistics;
use super::task_metrics::compute_all_task_metrics;

/// All derived views at one point in time
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryReport {
    pub generated_at: DateTime<Utc>,
    pub store: EventStoreStats,
    pub statistics: TaskStatistics,
    pub tasks: Vec<TaskPerformanceMetrics>,
    pub scheduling: Vec<SchedulingAnalysis>,
}

impl TelemetryReport {
    /// Build a report from the store's current contents
    pub fn generate(store: &EventStore) -> Self {
        let (events, stats) = store.snapshot_with_stats();
        Self::from_snapshot(stats, &events)
    }

    /// Build a report from an already captured snapshot
    pub fn from_snapshot(store: EventStoreStats, events: &[TaskEvent]) -> Self {
        Self {
            generated_at: Utc::now(),
            store,
            statistics: compute_statistics(events),
            tasks: compute_all_task_metrics(events),
            scheduling: analyze_all(events),
        }
    }

    /// Serialize as indented JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
