//! Event Store Module
//!
//! Bounded, thread-safe storage for task lifecycle events:
//! - `RingBuffer`: fixed-capacity FIFO with oldest-first eviction
//! - `EventStore`: the single lock every writer and reader goes through
//! - `DurableMirror`: capacity-bounded persistent copy, written off-thread
//! - `StartTimeTracker`: bounded map of in-flight execution starts
//! - `EventStoreStats`: occupancy figures
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//! ┌─────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │ Interceptor │───►│ record_event()   │───►│ mirror thread   │
//! │ (EventSink) │    │ buffer.append()  │    │ events.jsonl    │
//! └─────────────┘    └──────────────────┘    └─────────────────┘
//!
//! Read Path:
//! ┌──────────────────┐    ┌──────────────────────────────┐
//! │ get_all_events() │───►│ analytics on owned snapshot  │
//! │ (read lock)      │    │ (no further locking)         │
//! └──────────────────┘    └──────────────────────────────┘
//! ```

mod mirror;
mod ring_buffer;
mod start_times;
mod stats;
mod store;

pub use mirror::{DurableMirror, JsonlMirror, MemoryMirror};
pub use ring_buffer::{Iter, RingBuffer};
pub use start_times::StartTimeTracker;
pub use stats::EventStoreStats;
pub use store::{EventSink, EventStore};
