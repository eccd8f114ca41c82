#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! The persistent record a rescue copy consults and appends to: a skip list
//! of paths known to misbehave, and a forensic, append-only damage log.
//! Both are backed by plain UTF-8 text files so a forensic read doesn't need
//! this crate at all — `grep` works.
//!
//! # Design
//!
//! [`SkipList`] loads its file once at startup into an in-memory
//! `HashSet`, then guards both the set and the on-disk file behind one
//! mutex so membership tests, inserts, and appends never race each other.
//! [`DamageLog`] is simpler: it never reads its own file back, so it only
//! needs to guard the file handle.
//!
//! # Invariants
//!
//! - No duplicate path is ever written to `skip_files.list`.
//! - `damaged_files.log`'s byte length is monotonically non-decreasing
//!   across a process's lifetime (append-only, no truncation, `fsync` after
//!   every record).
//!
//! # Errors
//!
//! Both [`SkipList::open`] and [`DamageLog::open`] return
//! [`fdcore::error::CoreError::Io`] if the backing file cannot be opened or
//! read.

use std::collections::HashSet;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fdcore::error::CoreError;
use time::OffsetDateTime;

/// The closed set of reasons a damage-log record can cite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageReason {
    /// The per-file deadline elapsed.
    Timeout,
    /// A read call failed.
    ReadError,
    /// A write call failed.
    WriteError,
    /// The source or destination file was unexpectedly zero bytes.
    ZeroLength,
    /// The file was skipped because it was already on the skip list.
    Skipped,
    /// A failure that does not fit any of the above.
    Unknown,
}

impl fmt::Display for DamageReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Timeout => "TIMEOUT",
            Self::ReadError => "READ_ERROR",
            Self::WriteError => "WRITE_ERROR",
            Self::ZeroLength => "ZERO_LENGTH",
            Self::Skipped => "SKIPPED",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{text}")
    }
}

/// A persistent, de-duplicated set of paths the rescue copier should never
/// attempt again, backed by `skip_files.list`.
pub struct SkipList {
    path: PathBuf,
    state: Mutex<HashSet<PathBuf>>,
}

impl SkipList {
    /// Loads `path` if it exists (ignoring blank lines and `#` comments), or
    /// starts empty if it does not; the file itself is created lazily on
    /// the first [`SkipList::record`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] if an existing file cannot be read.
    pub fn open(path: PathBuf) -> Result<Self, CoreError> {
        let mut entries = HashSet::new();
        if path.exists() {
            let file = File::open(&path).map_err(|e| CoreError::io("open skip list", &path, e))?;
            for line in BufReader::new(file).lines() {
                let line = line.map_err(|e| CoreError::io("read skip list", &path, e))?;
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    continue;
                }
                entries.insert(PathBuf::from(trimmed));
            }
        }
        Ok(Self {
            path,
            state: Mutex::new(entries),
        })
    }

    /// `true` if `candidate` is already recorded as a file to skip.
    #[must_use]
    pub fn contains(&self, candidate: &Path) -> bool {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(candidate)
    }

    /// Number of paths currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    /// `true` if no paths are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds `path` if not already present, appending it to the backing file
    /// and `fsync`-ing before returning. Does nothing (and performs no I/O)
    /// if the path is already tracked.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] if the append fails.
    pub fn record(&self, path: &Path) -> Result<(), CoreError> {
        let mut guard = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if guard.contains(path) {
            return Ok(());
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| CoreError::io("open skip list for append", &self.path, e))?;
        writeln!(file, "{}", path.display())
            .map_err(|e| CoreError::io("append to skip list", &self.path, e))?;
        file.sync_all().map_err(|e| CoreError::io("fsync skip list", &self.path, e))?;
        guard.insert(path.to_path_buf());
        Ok(())
    }
}

/// An append-only, human-readable record of failures encountered during a
/// rescue copy, backed by `damaged_files.log`. Never parsed back by this
/// crate: it exists purely for forensic inspection.
pub struct DamageLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl DamageLog {
    /// Opens (without requiring existence of) the backing log file at `path`.
    #[must_use]
    pub fn open(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Appends one record: `<ISO-8601 local time> | <reason> | <absolute
    /// path> | <free-text detail>`, fsync'ing before returning.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] if the append fails.
    pub fn record(&self, reason: DamageReason, path: &Path, detail: &str) -> Result<(), CoreError> {
        let _guard = self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let timestamp = OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| CoreError::io("open damage log for append", &self.path, e))?;
        writeln!(
            file,
            "{timestamp} | {reason} | {} | {detail}",
            path.display()
        )
        .map_err(|e| CoreError::io("append to damage log", &self.path, e))?;
        file.sync_all().map_err(|e| CoreError::io("fsync damage log", &self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_list_loads_existing_entries_ignoring_comments_and_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skip_files.list");
        std::fs::write(&path, "# comment\n\n/mnt/usb/bad.bin\n").unwrap();

        let list = SkipList::open(path).unwrap();
        assert!(list.contains(Path::new("/mnt/usb/bad.bin")));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn skip_list_record_is_idempotent_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skip_files.list");
        let list = SkipList::open(path.clone()).unwrap();

        list.record(Path::new("/mnt/usb/a.bin")).unwrap();
        list.record(Path::new("/mnt/usb/a.bin")).unwrap();
        assert_eq!(list.len(), 1);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);

        let reopened = SkipList::open(path).unwrap();
        assert!(reopened.contains(Path::new("/mnt/usb/a.bin")));
    }

    #[test]
    fn damage_log_appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("damaged_files.log");
        let log = DamageLog::open(path.clone());

        log.record(DamageReason::Timeout, Path::new("/mnt/usb/a.bin"), "10s deadline exceeded").unwrap();
        log.record(DamageReason::ReadError, Path::new("/mnt/usb/b.bin"), "input/output error").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("TIMEOUT"));
        assert!(lines[1].contains("READ_ERROR"));
    }

    #[test]
    fn damage_log_is_append_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("damaged_files.log");
        let log = DamageLog::open(path.clone());

        log.record(DamageReason::Unknown, Path::new("/mnt/usb/a.bin"), "first").unwrap();
        let len_after_first = std::fs::metadata(&path).unwrap().len();
        log.record(DamageReason::Unknown, Path::new("/mnt/usb/b.bin"), "second").unwrap();
        let len_after_second = std::fs::metadata(&path).unwrap().len();

        assert!(len_after_second > len_after_first);
    }
}
