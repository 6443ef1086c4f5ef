//! Scheduling pattern analysis types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delay statistics for one segment of paired schedule/start events
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentStats {
    pub task_count: usize,
    /// Mean scheduling delay in seconds
    pub average_delay: f64,
}

impl SegmentStats {
    /// Build from a list of delays in seconds
    pub fn from_delays(delays: &[f64]) -> Self {
        if delays.is_empty() {
            return Self::default();
        }
        Self {
            task_count: delays.len(),
            average_delay: delays.iter().sum::<f64>() / delays.len() as f64,
        }
    }
}

/// Category of an optimization suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecommendationKind {
    /// Deferred begin dates are delaying execution
    Timing,
    NetworkRequirement,
    PowerRequirement,
    /// Many scheduled requests never start
    ExecutionRate,
}

/// How much a recommendation is expected to matter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    Low,
    Medium,
    High,
}

/// A configuration change backed by an observed differential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationRecommendation {
    pub kind: RecommendationKind,
    pub priority: RecommendationPriority,
    pub description: String,
    /// Measured value of the worse segment (seconds, or a rate)
    pub observed: f64,
    /// Measured value it is compared against
    pub baseline: f64,
}

/// Scheduling behavior of one task identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingAnalysis {
    pub task_identifier: String,
    pub total_scheduled_tasks: usize,
    pub total_executed_tasks: usize,
    pub execution_rate: f64,
    /// Mean delay across all paired events, in seconds
    pub average_execution_delay: f64,
    pub paired_executions: usize,
    pub immediate: SegmentStats,
    pub delayed: SegmentStats,
    pub network_required: SegmentStats,
    pub power_required: SegmentStats,
    pub unconstrained: SegmentStats,
    pub optimization_recommendations: Vec<OptimizationRecommendation>,
    pub generated_at: DateTime<Utc>,
}
