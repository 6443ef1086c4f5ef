//! Event Store Statistics
//!
//! Occupancy figures for a store:
//! - Retained count, capacity and free space
//! - Events by type
//! - Time span covered by the buffer

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{TaskEvent, TaskEventType};

use super::ring_buffer::RingBuffer;

/// Statistics about the Event Store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStoreStats {
    /// Number of retained events
    pub event_count: usize,
    /// Maximum number of retained events
    pub capacity: usize,
    pub available_space: usize,
    pub utilization_percentage: f64,
    /// Retained events by type
    pub events_by_type: HashMap<TaskEventType, usize>,
    /// Number of distinct task identifiers in the buffer
    pub distinct_tasks: usize,
    /// Executions currently tracked as started
    pub tracked_starts: usize,
    pub oldest_event: Option<DateTime<Utc>>,
    pub newest_event: Option<DateTime<Utc>>,
}

impl EventStoreStats {
    /// Gather stats from a buffer (caller holds the store lock)
    pub(crate) fn collect(buffer: &RingBuffer<TaskEvent>, tracked_starts: usize) -> Self {
        let mut events_by_type: HashMap<TaskEventType, usize> = HashMap::new();
        let mut tasks = std::collections::HashSet::new();
        let mut oldest: Option<DateTime<Utc>> = None;
        let mut newest: Option<DateTime<Utc>> = None;

        for event in buffer {
            *events_by_type.entry(event.event_type).or_insert(0) += 1;
            tasks.insert(event.task_identifier.as_str());
            oldest = Some(oldest.map_or(event.timestamp, |t| t.min(event.timestamp)));
            newest = Some(newest.map_or(event.timestamp, |t| t.max(event.timestamp)));
        }

        Self {
            event_count: buffer.len(),
            capacity: buffer.capacity(),
            available_space: buffer.available_space(),
            utilization_percentage: buffer.utilization_percentage(),
            events_by_type,
            distinct_tasks: tasks.len(),
            tracked_starts,
            oldest_event: oldest,
            newest_event: newest,
        }
    }

    /// Count of retained events of one type
    pub fn count_of(&self, event_type: TaskEventType) -> usize {
        self.events_by_type.get(&event_type).copied().unwrap_or(0)
    }
}
