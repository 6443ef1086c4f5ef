//! Event Store - bounded, thread-safe event history
//!
//! The EventStore is the single synchronization point for task events. One
//! `RwLock` guards the ring buffer and the start-time tracker; every mutation
//! takes the write lock and every snapshot takes the read lock, so readers
//! never observe a half-applied append, resize or clear.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::types::TaskEvent;
use crate::utils::seconds_between;

use super::mirror::{DurableMirror, JsonlMirror, MirrorWriter};
use super::ring_buffer::RingBuffer;
use super::start_times::StartTimeTracker;
use super::stats::EventStoreStats;

/// Capability handed to whatever intercepts task lifecycle calls
pub trait EventSink: Send + Sync {
    fn record_event(&self, event: TaskEvent);
}

/// State guarded by the store's lock
struct StoreState {
    buffer: RingBuffer<TaskEvent>,
    start_times: StartTimeTracker,
}

/// Bounded event history with a write-through durable mirror
pub struct EventStore {
    state: RwLock<StoreState>,
    mirror: MirrorWriter,
}

impl EventStore {
    /// Store with the default capacity and no durable mirror
    pub fn new() -> Self {
        Self::in_memory(StoreConfig::default().max_stored_events)
    }

    /// Store without a durable mirror
    pub fn in_memory(max_stored_events: usize) -> Self {
        Self::from_parts(max_stored_events, Vec::new(), MirrorWriter::disabled())
    }

    /// Open a store from config
    ///
    /// With a data directory the JSONL mirror is loaded into the buffer and
    /// kept in sync; if the mirror cannot be opened the store runs in memory.
    pub fn open(config: &StoreConfig) -> Self {
        if let Err(e) = config.validate() {
            warn!(error = %e, "invalid store config, clamping capacity to 1");
        }

        let Some(path) = config.events_path() else {
            return Self::in_memory(config.max_stored_events);
        };

        match JsonlMirror::open(&path, config.max_stored_events) {
            Ok(mirror) => {
                info!(path = %path.display(), "opened event mirror");
                Self::with_mirror(config.max_stored_events, Box::new(mirror))
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "cannot open event mirror, running in memory");
                Self::in_memory(config.max_stored_events)
            }
        }
    }

    /// Store backed by an injected mirror
    ///
    /// Previously mirrored events are loaded first; the most recent
    /// `max_stored_events` of them are kept.
    pub fn with_mirror(max_stored_events: usize, mut mirror: Box<dyn DurableMirror>) -> Self {
        if let Err(e) = mirror.set_capacity(max_stored_events) {
            warn!(error = %e, "failed to bound durable mirror");
        }

        let restored = match mirror.load_all() {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "failed to load durable mirror");
                Vec::new()
            }
        };
        if !restored.is_empty() {
            info!(count = restored.len(), "restored events from mirror");
        }

        Self::from_parts(max_stored_events, restored, MirrorWriter::spawn(mirror))
    }

    fn from_parts(max_stored_events: usize, restored: Vec<TaskEvent>, mirror: MirrorWriter) -> Self {
        let mut buffer = RingBuffer::new(max_stored_events);
        buffer.extend(restored);

        Self {
            state: RwLock::new(StoreState {
                buffer,
                start_times: StartTimeTracker::new(max_stored_events),
            }),
            mirror,
        }
    }

    /// Whether writes are mirrored to durable storage
    pub fn is_mirrored(&self) -> bool {
        self.mirror.is_enabled()
    }

    /// Append an event, evicting the oldest when full
    ///
    /// Returns the evicted event, if any.
    pub fn record_event(&self, event: TaskEvent) -> Option<TaskEvent> {
        let mut state = self.state.write();

        if self.mirror.is_enabled() {
            self.mirror.write(event.clone());
        }
        let evicted = state.buffer.append(event);

        if let Some(old) = &evicted {
            debug!(
                task = %old.task_identifier,
                event_type = %old.event_type,
                "evicted oldest event"
            );
        }
        evicted
    }

    /// Snapshot of all events, oldest first
    pub fn get_all_events(&self) -> Vec<TaskEvent> {
        self.state.read().buffer.to_vec()
    }

    /// Snapshot of events for one task identifier
    pub fn get_events_for(&self, task_identifier: &str) -> Vec<TaskEvent> {
        self.state
            .read()
            .buffer
            .filter(|e| e.task_identifier == task_identifier)
    }

    /// Snapshot of events with `from <= timestamp <= to`
    pub fn get_events_in_date_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<TaskEvent> {
        self.state
            .read()
            .buffer
            .filter(|e| e.timestamp >= from && e.timestamp <= to)
    }

    /// Number of retained events
    pub fn len(&self) -> usize {
        self.state.read().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().buffer.is_empty()
    }

    /// Current retention limit
    pub fn max_stored_events(&self) -> usize {
        self.state.read().buffer.capacity()
    }

    /// Change the retention limit, keeping the most recent events
    pub fn configure(&self, max_stored_events: usize) {
        if max_stored_events == 0 {
            warn!("max stored events must be positive, using 1");
        }

        let mut state = self.state.write();
        let dropped = state.buffer.resize(max_stored_events);
        let capacity = state.buffer.capacity();
        state.start_times.set_capacity(capacity);
        self.mirror.set_capacity(capacity);

        debug!(capacity, dropped = dropped.len(), "resized event store");
    }

    /// Remove every event from the buffer and the mirror
    pub fn clear_all_events(&self) {
        let mut state = self.state.write();
        let count = state.buffer.len();
        state.buffer.clear();
        state.start_times.clear();
        self.mirror.clear();

        info!(count, "cleared all events");
    }

    /// Remember when a task's current execution started
    pub fn mark_task_started(&self, task_identifier: &str, started_at: DateTime<Utc>) {
        self.state.write().start_times.set(task_identifier, started_at);
    }

    pub fn task_start_time(&self, task_identifier: &str) -> Option<DateTime<Utc>> {
        self.state.read().start_times.get(task_identifier)
    }

    /// Forget and return a task's recorded start
    pub fn take_task_start(&self, task_identifier: &str) -> Option<DateTime<Utc>> {
        self.state.write().start_times.remove(task_identifier)
    }

    /// Seconds since the recorded start, consuming it
    ///
    /// `None` when no start was observed for the task.
    pub fn completion_duration(&self, task_identifier: &str, finished_at: DateTime<Utc>) -> Option<f64> {
        self.take_task_start(task_identifier)
            .map(|started| seconds_between(started, finished_at).max(0.0))
    }

    /// Occupancy statistics
    pub fn stats(&self) -> EventStoreStats {
        let state = self.state.read();
        EventStoreStats::collect(&state.buffer, state.start_times.len())
    }

    /// Events and occupancy stats read under one lock acquisition
    pub fn snapshot_with_stats(&self) -> (Vec<TaskEvent>, EventStoreStats) {
        let state = self.state.read();
        let stats = EventStoreStats::collect(&state.buffer, state.start_times.len());
        (state.buffer.to_vec(), stats)
    }

    /// Wait until every mirror write issued so far has been applied
    pub fn flush_mirror(&self) {
        self.mirror.flush();
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for EventStore {
    fn record_event(&self, event: TaskEvent) {
        EventStore::record_event(self, event);
    }
}
