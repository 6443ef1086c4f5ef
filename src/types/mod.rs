//! Data types for Task Insight
//!
//! This module contains the event record and the derived views computed from it.

mod event;
mod metrics;
mod scheduling;
mod statistics;

pub use event::{metadata_keys, TaskEvent, TaskEventType};
pub use metrics::TaskPerformanceMetrics;
pub use scheduling::{
    OptimizationRecommendation, RecommendationKind, RecommendationPriority, SchedulingAnalysis,
    SegmentStats,
};
pub use statistics::TaskStatistics;

/// Result type for top-level operations (CLI, report export)
pub type InsightResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
