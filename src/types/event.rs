//! Task lifecycle events
//!
//! This module defines the event record captured for every background task
//! lifecycle occurrence. Events are immutable facts: once recorded they are
//! only ever cloned out of the store, never edited in place.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Well-known metadata keys read by the analytics engines
pub mod metadata_keys {
    /// Earliest begin date requested when the task was scheduled
    /// (RFC 3339 or unix seconds)
    pub const EARLIEST_BEGIN_DATE: &str = "earliest_begin_date";
    /// `"true"` when the task requires network connectivity
    pub const REQUIRES_NETWORK: &str = "requires_network";
    /// `"true"` when the task requires external power
    pub const REQUIRES_EXTERNAL_POWER: &str = "requires_external_power";
    /// Caller-supplied error category, overrides message-based derivation
    pub const ERROR_CATEGORY: &str = "error_category";
}

/// Lifecycle event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskEventType {
    /// Task was submitted to the scheduler
    Scheduled,
    /// Task handler began running
    ExecutionStarted,
    /// Task handler finished (successfully or not, see `success`)
    ExecutionCompleted,
    /// The system revoked the task's time budget
    Expired,
    /// Task was cancelled before finishing
    Cancelled,
    /// Explicit failure reported by the task
    Failed,
    ContinuousTaskStarted,
    ContinuousTaskPaused,
    ContinuousTaskResumed,
    ContinuousTaskStopped,
    ContinuousTaskProgress,
    /// Instrumentation was initialized
    Initialization,
    AppEnteredBackground,
    AppWillEnterForeground,
    DiagnosticDataReceived,
}

impl TaskEventType {
    /// Every event type, in declaration order
    pub const ALL: [TaskEventType; 15] = [
        TaskEventType::Scheduled,
        TaskEventType::ExecutionStarted,
        TaskEventType::ExecutionCompleted,
        TaskEventType::Expired,
        TaskEventType::Cancelled,
        TaskEventType::Failed,
        TaskEventType::ContinuousTaskStarted,
        TaskEventType::ContinuousTaskPaused,
        TaskEventType::ContinuousTaskResumed,
        TaskEventType::ContinuousTaskStopped,
        TaskEventType::ContinuousTaskProgress,
        TaskEventType::Initialization,
        TaskEventType::AppEnteredBackground,
        TaskEventType::AppWillEnterForeground,
        TaskEventType::DiagnosticDataReceived,
    ];

    /// Whether this event counts toward task statistics
    ///
    /// App lifecycle and diagnostic events are excluded.
    pub fn is_task_statistics_event(&self) -> bool {
        match self {
            TaskEventType::Scheduled
            | TaskEventType::ExecutionStarted
            | TaskEventType::ExecutionCompleted
            | TaskEventType::Expired
            | TaskEventType::Cancelled
            | TaskEventType::Failed
            | TaskEventType::ContinuousTaskStarted
            | TaskEventType::ContinuousTaskPaused
            | TaskEventType::ContinuousTaskResumed
            | TaskEventType::ContinuousTaskStopped
            | TaskEventType::ContinuousTaskProgress => true,
            TaskEventType::Initialization
            | TaskEventType::AppEnteredBackground
            | TaskEventType::AppWillEnterForeground
            | TaskEventType::DiagnosticDataReceived => false,
        }
    }

    /// Whether this event belongs to the continuous task family
    pub fn is_continuous_task_event(&self) -> bool {
        match self {
            TaskEventType::ContinuousTaskStarted
            | TaskEventType::ContinuousTaskPaused
            | TaskEventType::ContinuousTaskResumed
            | TaskEventType::ContinuousTaskStopped
            | TaskEventType::ContinuousTaskProgress => true,
            TaskEventType::Scheduled
            | TaskEventType::ExecutionStarted
            | TaskEventType::ExecutionCompleted
            | TaskEventType::Expired
            | TaskEventType::Cancelled
            | TaskEventType::Failed
            | TaskEventType::Initialization
            | TaskEventType::AppEnteredBackground
            | TaskEventType::AppWillEnterForeground
            | TaskEventType::DiagnosticDataReceived => false,
        }
    }
}

impl std::fmt::Display for TaskEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskEventType::Scheduled => "scheduled",
            TaskEventType::ExecutionStarted => "execution_started",
            TaskEventType::ExecutionCompleted => "execution_completed",
            TaskEventType::Expired => "expired",
            TaskEventType::Cancelled => "cancelled",
            TaskEventType::Failed => "failed",
            TaskEventType::ContinuousTaskStarted => "continuous_task_started",
            TaskEventType::ContinuousTaskPaused => "continuous_task_paused",
            TaskEventType::ContinuousTaskResumed => "continuous_task_resumed",
            TaskEventType::ContinuousTaskStopped => "continuous_task_stopped",
            TaskEventType::ContinuousTaskProgress => "continuous_task_progress",
            TaskEventType::Initialization => "initialization",
            TaskEventType::AppEnteredBackground => "app_entered_background",
            TaskEventType::AppWillEnterForeground => "app_will_enter_foreground",
            TaskEventType::DiagnosticDataReceived => "diagnostic_data_received",
        };
        f.write_str(name)
    }
}

/// An immutable record of one task lifecycle occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEvent {
    /// Unique event ID
    pub id: Uuid,

    /// Logical task name; repeats across the task's lifecycle
    pub task_identifier: String,

    #[serde(rename = "type")]
    pub event_type: TaskEventType,

    pub timestamp: DateTime<Utc>,

    /// Elapsed seconds, present on completions with an observed start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,

    /// Opaque device-state snapshot, carried but never interpreted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_info: Option<serde_json::Value>,
}

impl TaskEvent {
    /// Create a successful event stamped with the current time
    pub fn new(task_identifier: impl Into<String>, event_type: TaskEventType) -> Self {
        Self::with_timestamp(task_identifier, event_type, Utc::now())
    }

    /// Create a successful event with a specific timestamp
    pub fn with_timestamp(
        task_identifier: impl Into<String>,
        event_type: TaskEventType,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_identifier: task_identifier.into(),
            event_type,
            timestamp,
            duration: None,
            success: true,
            error_message: None,
            metadata: HashMap::new(),
            system_info: None,
        }
    }

    /// Set the elapsed duration in seconds
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Set an optional duration (e.g. from `EventStore::completion_duration`)
    pub fn with_optional_duration(mut self, seconds: Option<f64>) -> Self {
        self.duration = seconds;
        self
    }

    /// Mark the event as failed with an error message
    pub fn failed_with(mut self, message: impl Into<String>) -> Self {
        self.success = false;
        self.error_message = Some(message.into());
        self
    }

    /// Set the success flag without attaching a message
    pub fn with_success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }

    /// Add a metadata entry (later values replace earlier ones)
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attach the device snapshot payload
    pub fn with_system_info(mut self, info: serde_json::Value) -> Self {
        self.system_info = Some(info);
        self
    }

    /// Whether a metadata flag is set to a truthy value
    pub fn metadata_flag(&self, key: &str) -> bool {
        self.metadata
            .get(key)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false)
    }

    pub fn is_task_statistics_event(&self) -> bool {
        self.event_type.is_task_statistics_event()
    }

    /// Serialize event to JSON string (for JSONL)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize event from JSON string
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}
