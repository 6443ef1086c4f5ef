//! Integration tests for the EventStore
//!
//! Covers retention, concurrency, and the durable mirror round trip.

use std::collections::HashSet;
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::{Duration, TimeZone, Utc};
use task_insight::error::{MirrorError, MirrorResult};
use task_insight::{DurableMirror, EventStore, StoreConfig, TaskEvent, TaskEventType};
use tempfile::TempDir;

fn numbered(i: usize) -> TaskEvent {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    TaskEvent::with_timestamp(
        format!("task-{}", i),
        TaskEventType::Scheduled,
        base + Duration::seconds(i as i64),
    )
}

fn identifiers(events: &[TaskEvent]) -> Vec<String> {
    events.iter().map(|e| e.task_identifier.clone()).collect()
}

#[test]
fn test_default_capacity_keeps_last_thousand() {
    let store = EventStore::new();
    assert_eq!(store.max_stored_events(), 1000);

    for i in 0..1500 {
        store.record_event(numbered(i));
    }

    let events = store.get_all_events();
    assert_eq!(events.len(), 1000);
    let expected: Vec<String> = (500..1500).map(|i| format!("task-{}", i)).collect();
    assert_eq!(identifiers(&events), expected);
}

#[test]
fn test_snapshot_is_idempotent() {
    let store = EventStore::in_memory(10);
    for i in 0..15 {
        store.record_event(numbered(i));
    }
    assert_eq!(store.get_all_events(), store.get_all_events());
}

#[test]
fn test_concurrent_writers_lose_nothing() {
    let store = Arc::new(EventStore::in_memory(10_000));
    let mut handles = vec![];

    for writer in 0..8 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for seq in 0..200 {
                store.record_event(
                    TaskEvent::new(format!("writer-{}", writer), TaskEventType::ExecutionStarted)
                        .with_metadata("seq", seq.to_string()),
                );
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let events = store.get_all_events();
    assert_eq!(events.len(), 1600);

    let ids: HashSet<_> = events.iter().map(|e| e.id).collect();
    assert_eq!(ids.len(), 1600, "no duplicated entries");

    // Each writer's own events stay in program order
    for writer in 0..8 {
        let seqs: Vec<usize> = store
            .get_events_for(&format!("writer-{}", writer))
            .iter()
            .map(|e| e.metadata["seq"].parse().unwrap())
            .collect();
        assert_eq!(seqs, (0..200).collect::<Vec<_>>());
    }
}

#[test]
fn test_readers_never_see_torn_appends() {
    let store = Arc::new(EventStore::in_memory(100_000));
    let done = Arc::new(AtomicBool::new(false));
    let mut readers = vec![];

    for _ in 0..4 {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        readers.push(thread::spawn(move || {
            let mut last_len = 0;
            while !done.load(Ordering::SeqCst) {
                let snapshot = store.get_all_events();
                assert!(snapshot.len() >= last_len);
                last_len = snapshot.len();

                // Per-writer sequences must be gap-free prefixes
                for writer in 0..2 {
                    let name = format!("w{}", writer);
                    let seqs: Vec<usize> = snapshot
                        .iter()
                        .filter(|e| e.task_identifier == name)
                        .map(|e| e.metadata["seq"].parse().unwrap())
                        .collect();
                    assert_eq!(seqs, (0..seqs.len()).collect::<Vec<_>>());
                }
            }
        }));
    }

    let mut writers = vec![];
    for writer in 0..2 {
        let store = Arc::clone(&store);
        writers.push(thread::spawn(move || {
            for seq in 0..2000 {
                store.record_event(
                    TaskEvent::new(format!("w{}", writer), TaskEventType::Scheduled)
                        .with_metadata("seq", seq.to_string()),
                );
            }
        }));
    }

    for writer in writers {
        writer.join().unwrap();
    }
    done.store(true, Ordering::SeqCst);
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(store.len(), 4000);
}

#[test]
fn test_clear_is_all_or_nothing_for_readers() {
    let store = Arc::new(EventStore::in_memory(1000));
    for i in 0..500 {
        store.record_event(numbered(i));
    }

    let done = Arc::new(AtomicBool::new(false));
    let mut readers = vec![];
    for _ in 0..4 {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        readers.push(thread::spawn(move || {
            while !done.load(Ordering::SeqCst) {
                let len = store.get_all_events().len();
                assert!(len == 500 || len == 0, "observed partial clear: {}", len);
            }
        }));
    }

    thread::sleep(std::time::Duration::from_millis(10));
    store.clear_all_events();
    thread::sleep(std::time::Duration::from_millis(10));
    done.store(true, Ordering::SeqCst);

    for reader in readers {
        reader.join().unwrap();
    }
    assert!(store.is_empty());
}

#[test]
fn test_configure_while_writing() {
    let store = Arc::new(EventStore::in_memory(1000));
    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..3000 {
                store.record_event(numbered(i));
            }
        })
    };

    for capacity in [500, 50, 800, 10] {
        store.configure(capacity);
        assert!(store.len() <= capacity);
    }
    writer.join().unwrap();

    assert_eq!(store.max_stored_events(), 10);
    let events = store.get_all_events();
    assert_eq!(events.len(), 10);
    assert_eq!(events.last().unwrap().task_identifier, "task-2999");
}

#[test]
fn test_instances_do_not_share_state() {
    let a = EventStore::in_memory(10);
    let b = EventStore::in_memory(10);
    a.record_event(numbered(1));
    a.mark_task_started("task-1", Utc::now());

    assert!(b.is_empty());
    assert!(b.task_start_time("task-1").is_none());
}

#[test]
fn test_mirror_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let config = StoreConfig::new(5).with_data_dir(temp_dir.path());

    let recorded: Vec<TaskEvent> = (0..8).map(numbered).collect();
    {
        let store = EventStore::open(&config);
        assert!(store.is_mirrored());
        for event in &recorded {
            store.record_event(event.clone());
        }
    }

    let reopened = EventStore::open(&config);
    assert_eq!(reopened.get_all_events(), recorded[3..].to_vec());
}

#[test]
fn test_mirror_follows_configure_and_clear() {
    let temp_dir = TempDir::new().unwrap();
    let config = StoreConfig::new(10).with_data_dir(temp_dir.path());

    {
        let store = EventStore::open(&config);
        for i in 0..10 {
            store.record_event(numbered(i));
        }
        store.configure(3);
    }
    {
        let store = EventStore::open(&config);
        assert_eq!(
            identifiers(&store.get_all_events()),
            vec!["task-7", "task-8", "task-9"]
        );
        store.clear_all_events();
    }

    let store = EventStore::open(&config);
    assert!(store.is_empty());
}

#[test]
fn test_reopen_with_smaller_capacity() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = EventStore::open(&StoreConfig::new(100).with_data_dir(temp_dir.path()));
        for i in 0..20 {
            store.record_event(numbered(i));
        }
        store.flush_mirror();
    }

    let store = EventStore::open(&StoreConfig::new(4).with_data_dir(temp_dir.path()));
    assert_eq!(
        identifiers(&store.get_all_events()),
        vec!["task-16", "task-17", "task-18", "task-19"]
    );
}

#[test]
fn test_unusable_data_dir_falls_back_to_memory() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("not-a-dir");
    fs::write(&blocker, "file in the way").unwrap();

    let store = EventStore::open(&StoreConfig::new(5).with_data_dir(&blocker));
    assert!(!store.is_mirrored());

    store.record_event(numbered(0));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_open_keeps_unrelated_temp_files_in_data_dir() {
    let temp_dir = TempDir::new().unwrap();
    let foreign = temp_dir.path().join("user-download.tmp");
    fs::write(&foreign, "not a mirror file").unwrap();

    let store = EventStore::open(&StoreConfig::new(5).with_data_dir(temp_dir.path()));
    assert!(store.is_mirrored());
    store.record_event(numbered(0));
    store.flush_mirror();

    assert_eq!(fs::read_to_string(&foreign).unwrap(), "not a mirror file");
}

/// Mirror that rejects every operation
struct BrokenMirror;

impl DurableMirror for BrokenMirror {
    fn write(&mut self, _event: &TaskEvent) -> MirrorResult<()> {
        Err(MirrorError::Unavailable("disk on fire".to_string()))
    }

    fn load_all(&self) -> MirrorResult<Vec<TaskEvent>> {
        Err(MirrorError::Unavailable("disk on fire".to_string()))
    }

    fn clear(&mut self) -> MirrorResult<()> {
        Err(MirrorError::Unavailable("disk on fire".to_string()))
    }

    fn set_capacity(&mut self, _capacity: usize) -> MirrorResult<()> {
        Err(MirrorError::Unavailable("disk on fire".to_string()))
    }
}

#[test]
fn test_mirror_failures_do_not_affect_buffer() {
    let store = EventStore::with_mirror(3, Box::new(BrokenMirror));

    for i in 0..5 {
        store.record_event(numbered(i));
    }
    store.flush_mirror();

    assert_eq!(
        identifiers(&store.get_all_events()),
        vec!["task-2", "task-3", "task-4"]
    );

    store.configure(2);
    store.clear_all_events();
    store.record_event(numbered(9));
    assert_eq!(identifiers(&store.get_all_events()), vec!["task-9"]);
}

#[test]
fn test_completion_duration_from_tracked_start() {
    let store = EventStore::in_memory(10);
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    store.mark_task_started("refresh", start);
    store.record_event(TaskEvent::with_timestamp("refresh", TaskEventType::ExecutionStarted, start));

    let end = start + Duration::milliseconds(2500);
    let duration = store.completion_duration("refresh", end);
    store.record_event(
        TaskEvent::with_timestamp("refresh", TaskEventType::ExecutionCompleted, end)
            .with_optional_duration(duration),
    );

    let events = store.get_events_for("refresh");
    assert_eq!(events[1].duration, Some(2.5));

    // No second start observed: completion carries no duration
    assert!(store.completion_duration("refresh", end).is_none());
}
