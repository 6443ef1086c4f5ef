//! Analytics over event snapshots
//!
//! Every engine works on an owned snapshot taken from the `EventStore`, so
//! computations need no locking and can run in parallel with new writes.
//!
//! - `statistics`: aggregate counts and rates
//! - `task_metrics`: per-task performance profiles
//! - `scheduling`: schedule-to-start delays and recommendations
//! - `report`: all of the above in one serializable document

mod report;
mod scheduling;
mod statistics;
mod task_metrics;

pub use report::TelemetryReport;
pub use scheduling::{
    analyze_all, analyze_task, SchedulingAnalyzer, DELAY_RATIO_THRESHOLD, LOW_EXECUTION_RATE,
    MIN_DELAY_DIFFERENCE_SECS, MIN_SCHEDULED_FOR_RATE, MIN_SEGMENT_SAMPLES,
};
pub use statistics::{categorize_error, compute_statistics, StatisticsEngine};
pub use task_metrics::{compute_all_task_metrics, compute_task_metrics, TaskMetricsEngine};
