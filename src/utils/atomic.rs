//! Crash-safe file replacement for the event mirror
//!
//! Compaction and clear rewrite `events.jsonl` wholesale. The new content is
//! written to a `.tmp` sibling, synced, then renamed over the target, so a
//! crash leaves either the old file or the new one on disk. A failed write
//! removes its temp file; one orphaned by a crash is removed on the next open.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type AtomicResult<T> = Result<T, AtomicError>;

#[derive(Debug, Error)]
pub enum AtomicError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

const TEMP_EXTENSION: &str = "tmp";

/// Temp file that deletes itself unless committed
struct PendingReplace {
    temp_path: PathBuf,
    committed: bool,
}

impl PendingReplace {
    fn new(target: &Path) -> Self {
        Self {
            temp_path: target.with_extension(TEMP_EXTENSION),
            committed: false,
        }
    }

    fn commit(mut self, target: &Path) -> io::Result<()> {
        fs::rename(&self.temp_path, target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PendingReplace {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}

/// Replace `path` with `content`
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &str) -> AtomicResult<()> {
    atomic_write_with(path, |out| out.write_all(content.as_bytes()))
}

/// Replace `path` with whatever `fill` writes
///
/// Output is buffered; the mirror streams its retained lines through here
/// without collecting them into one string.
pub fn atomic_write_with<P, F>(path: P, fill: F) -> AtomicResult<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let target = path.as_ref();
    if let Some(dir) = target.parent() {
        fs::create_dir_all(dir)?;
    }

    let pending = PendingReplace::new(target);
    let mut out = BufWriter::new(File::create(&pending.temp_path)?);
    fill(&mut out)?;

    let file = out.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    drop(file);

    pending.commit(target)?;
    Ok(())
}

/// Remove the temp sibling of `path` left by an interrupted replace
///
/// Only the one file this module would have created is touched; other
/// `.tmp` files in the same directory belong to someone else.
pub fn remove_stale_temp<P: AsRef<Path>>(path: P) -> AtomicResult<bool> {
    let temp_path = path.as_ref().with_extension(TEMP_EXTENSION);
    if !temp_path.is_file() {
        return Ok(false);
    }
    fs::remove_file(&temp_path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_replaces_content_without_leftovers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.jsonl");
        fs::write(&path, "old\nold\nold\n").unwrap();

        atomic_write(&path, "{}\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{}\n");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_streamed_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("events.jsonl");

        atomic_write_with(&path, |out| {
            for n in 0..3 {
                writeln!(out, "line {}", n)?;
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "line 0\nline 1\nline 2\n");
    }

    #[test]
    fn test_failed_fill_keeps_original() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.jsonl");
        fs::write(&path, "keep\n").unwrap();

        let result = atomic_write_with(&path, |out| {
            writeln!(out, "partial")?;
            Err(io::Error::new(io::ErrorKind::Other, "interrupted"))
        });

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep\n");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_removes_only_own_stale_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.jsonl");
        fs::write(dir.path().join("events.tmp"), "orphan").unwrap();
        fs::write(dir.path().join("download.tmp"), "not ours").unwrap();

        assert!(remove_stale_temp(&path).unwrap());
        assert!(!dir.path().join("events.tmp").exists());
        assert!(dir.path().join("download.tmp").exists());

        assert!(!remove_stale_temp(&path).unwrap());
    }
}
