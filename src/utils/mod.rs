//! Utility functions and helpers
//!
//! Atomic file rewrites for the mirror and timestamp helpers for analytics.

pub mod atomic;
pub mod time;

pub use atomic::{atomic_write, atomic_write_with, remove_stale_temp, AtomicError, AtomicResult};
pub use time::{local_hour, parse_timestamp, seconds_between};
