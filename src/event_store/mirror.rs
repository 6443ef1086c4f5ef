//! Durable mirror of the event buffer
//!
//! The store writes every retention decision through to a mirror so events
//! survive restarts. Mirror writes happen on a dedicated thread fed by an
//! unbounded channel: `record_event` never waits on disk I/O, and a failing
//! mirror only produces log lines.
//!
//! ```text
//! record_event ──► buffer.append ──► tx.send(Write) ──► [mirror thread] ──► events.jsonl
//!                  (under lock)      (non-blocking)
//! ```

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::{MirrorError, MirrorResult};
use crate::types::TaskEvent;
use crate::utils::{atomic_write, atomic_write_with, remove_stale_temp};

/// Persistent copy of the retained events
///
/// Implementations keep at most `capacity` events, most recent wins.
pub trait DurableMirror: Send {
    /// Append one event
    fn write(&mut self, event: &TaskEvent) -> MirrorResult<()>;

    /// Load retained events, oldest first
    fn load_all(&self) -> MirrorResult<Vec<TaskEvent>>;

    fn clear(&mut self) -> MirrorResult<()>;

    /// Change the retention bound, dropping the oldest events if needed
    fn set_capacity(&mut self, capacity: usize) -> MirrorResult<()>;
}

/// JSONL file mirror
///
/// Appends one JSON line per event. The file may temporarily hold up to
/// twice the capacity; it is compacted to the most recent `capacity` lines
/// when that bound is crossed, and `load_all` only ever returns the most
/// recent `capacity` events.
pub struct JsonlMirror {
    path: PathBuf,
    capacity: usize,
    lines_on_disk: usize,
}

impl JsonlMirror {
    /// Open (or create on first write) the mirror file at `path`
    pub fn open<P: AsRef<Path>>(path: P, capacity: usize) -> MirrorResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if remove_stale_temp(&path)? {
            warn!(path = %path.display(), "removed leftover mirror temp file");
        }

        let lines_on_disk = if path.exists() {
            Self::read_lines(&path)?.len()
        } else {
            0
        };

        Ok(Self {
            path,
            capacity: capacity.max(1),
            lines_on_disk,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_lines(path: &Path) -> MirrorResult<Vec<String>> {
        let reader = BufReader::new(File::open(path)?);
        let mut lines = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                lines.push(line);
            }
        }
        Ok(lines)
    }

    /// Rewrite the file keeping only the most recent `capacity` lines
    fn compact(&mut self) -> MirrorResult<()> {
        if !self.path.exists() {
            self.lines_on_disk = 0;
            return Ok(());
        }

        let lines = Self::read_lines(&self.path)?;
        let skip = lines.len().saturating_sub(self.capacity);
        let kept = &lines[skip..];

        atomic_write_with(&self.path, |file| {
            for line in kept {
                writeln!(file, "{}", line)?;
            }
            Ok(())
        })?;

        debug!(dropped = skip, kept = kept.len(), "compacted mirror file");
        self.lines_on_disk = kept.len();
        Ok(())
    }
}

impl DurableMirror for JsonlMirror {
    fn write(&mut self, event: &TaskEvent) -> MirrorResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json_line = event.to_json_line()?;
        writeln!(file, "{}", json_line)?;
        file.flush()?;

        self.lines_on_disk += 1;
        if self.lines_on_disk > self.capacity.saturating_mul(2) {
            self.compact()?;
        }
        Ok(())
    }

    fn load_all(&self) -> MirrorResult<Vec<TaskEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let lines = Self::read_lines(&self.path)?;
        let mut events = Vec::with_capacity(lines.len());

        for (line_num, line) in lines.iter().enumerate() {
            match TaskEvent::from_json_line(line) {
                Ok(event) => events.push(event),
                Err(e) => {
                    // Skip the damaged line, keep loading the rest
                    warn!(line = line_num + 1, error = %e, "failed to parse mirrored event");
                }
            }
        }

        let skip = events.len().saturating_sub(self.capacity);
        Ok(events.split_off(skip))
    }

    fn clear(&mut self) -> MirrorResult<()> {
        atomic_write(&self.path, "")?;
        self.lines_on_disk = 0;
        Ok(())
    }

    fn set_capacity(&mut self, capacity: usize) -> MirrorResult<()> {
        self.capacity = capacity.max(1);
        if self.lines_on_disk > self.capacity {
            self.compact()?;
        }
        Ok(())
    }
}

/// In-memory mirror, mostly for tests and embedding
///
/// Clones share the same storage, so a test can keep a handle while the
/// store owns another.
#[derive(Debug, Clone)]
pub struct MemoryMirror {
    events: Arc<Mutex<VecDeque<TaskEvent>>>,
    capacity: Arc<Mutex<usize>>,
}

impl MemoryMirror {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::new())),
            capacity: Arc::new(Mutex::new(capacity.max(1))),
        }
    }

    /// Create a mirror pre-populated with events (oldest first)
    pub fn with_events(capacity: usize, events: Vec<TaskEvent>) -> Self {
        let mirror = Self::new(capacity);
        {
            let mut stored = mirror.events.lock();
            stored.extend(events);
            while stored.len() > capacity.max(1) {
                stored.pop_front();
            }
        }
        mirror
    }

    /// Copy of the mirrored events, oldest first
    pub fn events(&self) -> Vec<TaskEvent> {
        self.events.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl DurableMirror for MemoryMirror {
    fn write(&mut self, event: &TaskEvent) -> MirrorResult<()> {
        let capacity = *self.capacity.lock();
        let mut events = self.events.lock();
        events.push_back(event.clone());
        while events.len() > capacity {
            events.pop_front();
        }
        Ok(())
    }

    fn load_all(&self) -> MirrorResult<Vec<TaskEvent>> {
        Ok(self.events())
    }

    fn clear(&mut self) -> MirrorResult<()> {
        self.events.lock().clear();
        Ok(())
    }

    fn set_capacity(&mut self, capacity: usize) -> MirrorResult<()> {
        let capacity = capacity.max(1);
        *self.capacity.lock() = capacity;
        let mut events = self.events.lock();
        while events.len() > capacity {
            events.pop_front();
        }
        Ok(())
    }
}

/// Commands processed by the mirror thread, in send order
enum MirrorCommand {
    Write(TaskEvent),
    SetCapacity(usize),
    Clear,
    Flush(oneshot::Sender<()>),
}

/// Handle to the background mirror thread
pub(crate) struct MirrorWriter {
    tx: Option<mpsc::UnboundedSender<MirrorCommand>>,
    handle: Option<JoinHandle<()>>,
}

impl MirrorWriter {
    /// Writer that drops every command (in-memory stores)
    pub(crate) fn disabled() -> Self {
        Self {
            tx: None,
            handle: None,
        }
    }

    /// Move `mirror` onto a dedicated thread
    pub(crate) fn spawn(mut mirror: Box<dyn DurableMirror>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<MirrorCommand>();

        let spawned = thread::Builder::new()
            .name("task-insight-mirror".to_string())
            .spawn(move || {
                while let Some(command) = rx.blocking_recv() {
                    let result = match command {
                        MirrorCommand::Write(event) => mirror.write(&event),
                        MirrorCommand::SetCapacity(capacity) => mirror.set_capacity(capacity),
                        MirrorCommand::Clear => mirror.clear(),
                        MirrorCommand::Flush(ack) => {
                            let _ = ack.send(());
                            Ok(())
                        }
                    };
                    if let Err(e) = result {
                        warn!(error = %e, "durable mirror write failed");
                    }
                }
                debug!("mirror writer stopped");
            });

        match spawned {
            Ok(handle) => Self {
                tx: Some(tx),
                handle: Some(handle),
            },
            Err(e) => {
                warn!(error = %e, "could not start mirror thread, continuing in memory only");
                Self::disabled()
            }
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    fn send(&self, command: MirrorCommand) {
        if let Some(tx) = &self.tx {
            if tx.send(command).is_err() {
                warn!("{}", MirrorError::Unavailable("mirror thread has exited".to_string()));
            }
        }
    }

    pub(crate) fn write(&self, event: TaskEvent) {
        self.send(MirrorCommand::Write(event));
    }

    pub(crate) fn set_capacity(&self, capacity: usize) {
        self.send(MirrorCommand::SetCapacity(capacity));
    }

    pub(crate) fn clear(&self) {
        self.send(MirrorCommand::Clear);
    }

    /// Block until every command sent so far has been applied
    ///
    /// Must not be called from inside an async runtime.
    pub(crate) fn flush(&self) {
        let Some(tx) = &self.tx else {
            return;
        };
        let (ack_tx, ack_rx) = oneshot::channel();
        if tx.send(MirrorCommand::Flush(ack_tx)).is_err() {
            return;
        }
        let _ = ack_rx.blocking_recv();
    }
}

impl Drop for MirrorWriter {
    fn drop(&mut self) {
        // Closing the channel lets the thread drain pending writes and exit
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("mirror thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskEventType;
    use tempfile::TempDir;

    fn event(name: &str) -> TaskEvent {
        TaskEvent::new(name, TaskEventType::Scheduled)
    }

    fn names(events: &[TaskEvent]) -> Vec<String> {
        events.iter().map(|e| e.task_identifier.clone()).collect()
    }

    #[test]
    fn test_jsonl_write_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let mut mirror = JsonlMirror::open(temp_dir.path().join("events.jsonl"), 10).unwrap();

        mirror.write(&event("a")).unwrap();
        mirror.write(&event("b")).unwrap();

        let loaded = mirror.load_all().unwrap();
        assert_eq!(names(&loaded), vec!["a", "b"]);
    }

    #[test]
    fn test_jsonl_load_respects_capacity() {
        let temp_dir = TempDir::new().unwrap();
        let mut mirror = JsonlMirror::open(temp_dir.path().join("events.jsonl"), 3).unwrap();

        for name in ["a", "b", "c", "d", "e"] {
            mirror.write(&event(name)).unwrap();
        }

        assert_eq!(names(&mirror.load_all().unwrap()), vec!["c", "d", "e"]);
    }

    #[test]
    fn test_jsonl_compacts_past_twice_capacity() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("events.jsonl");
        let mut mirror = JsonlMirror::open(&path, 2).unwrap();

        for name in ["a", "b", "c", "d", "e"] {
            mirror.write(&event(name)).unwrap();
        }

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk.lines().count(), 2);
        assert_eq!(names(&mirror.load_all().unwrap()), vec!["d", "e"]);
    }

    #[test]
    fn test_jsonl_skips_corrupted_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("events.jsonl");
        let good = event("ok").to_json_line().unwrap();
        std::fs::write(&path, format!("{}\nnot json\n\n{}\n", good, good)).unwrap();

        let mirror = JsonlMirror::open(&path, 10).unwrap();
        assert_eq!(names(&mirror.load_all().unwrap()), vec!["ok", "ok"]);
    }

    #[test]
    fn test_jsonl_clear_and_set_capacity() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("events.jsonl");
        let mut mirror = JsonlMirror::open(&path, 5).unwrap();

        for name in ["a", "b", "c", "d"] {
            mirror.write(&event(name)).unwrap();
        }
        mirror.set_capacity(2).unwrap();
        assert_eq!(names(&mirror.load_all().unwrap()), vec!["c", "d"]);
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);

        mirror.clear().unwrap();
        assert!(mirror.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_jsonl_reopen_counts_existing_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("events.jsonl");
        {
            let mut mirror = JsonlMirror::open(&path, 2).unwrap();
            for name in ["a", "b", "c", "d"] {
                mirror.write(&event(name)).unwrap();
            }
        }

        let mut reopened = JsonlMirror::open(&path, 2).unwrap();
        reopened.write(&event("e")).unwrap();

        // 4 existing + 1 crosses the 2x bound and compacts
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
        assert_eq!(names(&reopened.load_all().unwrap()), vec!["d", "e"]);
    }

    #[test]
    fn test_jsonl_open_leaves_foreign_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("events.jsonl");
        std::fs::write(temp_dir.path().join("events.tmp"), "interrupted").unwrap();
        std::fs::write(temp_dir.path().join("other.tmp"), "user data").unwrap();

        JsonlMirror::open(&path, 5).unwrap();

        assert!(!temp_dir.path().join("events.tmp").exists());
        assert!(temp_dir.path().join("other.tmp").exists());
    }

    #[test]
    fn test_memory_mirror_shares_storage() {
        let handle = MemoryMirror::new(2);
        let mut owned = handle.clone();

        owned.write(&event("a")).unwrap();
        owned.write(&event("b")).unwrap();
        owned.write(&event("c")).unwrap();

        assert_eq!(names(&handle.events()), vec!["b", "c"]);
    }

    #[test]
    fn test_writer_applies_commands_in_order() {
        let handle = MemoryMirror::new(10);
        let writer = MirrorWriter::spawn(Box::new(handle.clone()));
        assert!(writer.is_enabled());

        writer.write(event("a"));
        writer.write(event("b"));
        writer.clear();
        writer.write(event("c"));
        writer.set_capacity(1);
        writer.write(event("d"));
        writer.flush();

        assert_eq!(names(&handle.events()), vec!["d"]);
    }

    #[test]
    fn test_writer_drains_on_drop() {
        let handle = MemoryMirror::new(10);
        {
            let writer = MirrorWriter::spawn(Box::new(handle.clone()));
            writer.write(event("a"));
            writer.write(event("b"));
        }
        assert_eq!(handle.len(), 2);
    }

    #[test]
    fn test_disabled_writer_is_noop() {
        let writer = MirrorWriter::disabled();
        assert!(!writer.is_enabled());
        writer.write(event("a"));
        writer.flush();
    }
}
