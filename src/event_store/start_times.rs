//! Start time tracking
//!
//! Bounded map from task identifier to the time its current execution
//! started. Owned by the store's lock; never shared globally.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Bounded task-identifier → start-time map
#[derive(Debug, Clone)]
pub struct StartTimeTracker {
    starts: HashMap<String, DateTime<Utc>>,
    capacity: usize,
}

impl StartTimeTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            starts: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a start, replacing any earlier start for the same task
    ///
    /// When the map is full the entry with the oldest start time is dropped.
    pub fn set(&mut self, task_identifier: &str, started_at: DateTime<Utc>) {
        if !self.starts.contains_key(task_identifier) && self.starts.len() >= self.capacity {
            self.evict_oldest();
        }
        self.starts.insert(task_identifier.to_string(), started_at);
    }

    pub fn get(&self, task_identifier: &str) -> Option<DateTime<Utc>> {
        self.starts.get(task_identifier).copied()
    }

    pub fn remove(&mut self, task_identifier: &str) -> Option<DateTime<Utc>> {
        self.starts.remove(task_identifier)
    }

    pub fn clear(&mut self) {
        self.starts.clear();
    }

    /// Change the bound, dropping the oldest starts if over it
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.starts.len() > self.capacity {
            self.evict_oldest();
        }
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .starts
            .iter()
            .min_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)))
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.starts.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn test_set_get_remove() {
        let mut tracker = StartTimeTracker::new(4);
        tracker.set("sync", at(10));
        assert_eq!(tracker.get("sync"), Some(at(10)));

        tracker.set("sync", at(20));
        assert_eq!(tracker.get("sync"), Some(at(20)));
        assert_eq!(tracker.len(), 1);

        assert_eq!(tracker.remove("sync"), Some(at(20)));
        assert_eq!(tracker.get("sync"), None);
        assert_eq!(tracker.remove("sync"), None);
    }

    #[test]
    fn test_evicts_oldest_start_when_full() {
        let mut tracker = StartTimeTracker::new(2);
        tracker.set("a", at(5));
        tracker.set("b", at(1));
        tracker.set("c", at(9));

        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.get("b"), None);
        assert_eq!(tracker.get("a"), Some(at(5)));
        assert_eq!(tracker.get("c"), Some(at(9)));
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let mut tracker = StartTimeTracker::new(2);
        tracker.set("a", at(1));
        tracker.set("b", at(2));
        tracker.set("a", at(3));
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.get("b"), Some(at(2)));
    }

    #[test]
    fn test_shrink_capacity() {
        let mut tracker = StartTimeTracker::new(3);
        tracker.set("a", at(1));
        tracker.set("b", at(2));
        tracker.set("c", at(3));

        tracker.set_capacity(1);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.get("c"), Some(at(3)));
    }
}
