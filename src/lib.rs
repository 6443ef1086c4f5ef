//! Task Insight
//!
//! Bounded event store and analytics engine for background task telemetry.
//!
//! # Features
//!
//! - **Bounded history**: fixed-capacity ring buffer, oldest events evicted first
//! - **Thread-Safe**: one lock per store; snapshots are never torn
//! - **Durable mirror**: JSONL write-through on a background thread
//! - **Statistics**: success rate, failures, durations, hourly distribution
//! - **Per-task metrics**: performance profile per task identifier
//! - **Scheduling analysis**: schedule-to-start delays and recommendations
//!
//! # Modules
//!
//! - `types`: Event record and derived view types
//! - `event_store`: Ring buffer, store, durable mirror
//! - `analytics`: Statistics, task metrics, scheduling analysis, reports
//! - `config`: Store configuration
//! - `error`: Error types
//! - `utils`: Atomic file writes, time helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use task_insight::{EventStore, StatisticsEngine, TaskEvent, TaskEventType};
//!
//! let store = Arc::new(EventStore::in_memory(1000));
//! store.record_event(TaskEvent::new("com.app.refresh", TaskEventType::ExecutionStarted));
//! store.record_event(
//!     TaskEvent::new("com.app.refresh", TaskEventType::ExecutionCompleted).with_duration(2.0),
//! );
//!
//! let stats = StatisticsEngine::new(Arc::clone(&store)).calculate();
//! assert_eq!(stats.success_rate, 1.0);
//! ```

pub mod analytics;
pub mod config;
pub mod error;
pub mod event_store;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use analytics::{SchedulingAnalyzer, StatisticsEngine, TaskMetricsEngine, TelemetryReport};
pub use config::StoreConfig;
pub use error::{ConfigError, MirrorError};
pub use event_store::{DurableMirror, EventSink, EventStore, EventStoreStats, RingBuffer};
pub use types::{
    InsightResult, OptimizationRecommendation, RecommendationKind, SchedulingAnalysis,
    TaskEvent, TaskEventType, TaskPerformanceMetrics, TaskStatistics,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
