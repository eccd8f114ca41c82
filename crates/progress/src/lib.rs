#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! Renders one carriage-return-overwritten progress line per file for the
//! capacity-test, fill, and copy operations, plus a one-line-per-file
//! transition when the active file changes. This mirrors a familiar rsync
//! `--progress` style: enough live feedback to know the run hasn't stalled,
//! without spamming the terminal with one line per byte.
//!
//! # Design
//!
//! [`ProgressReporter`] borrows a writer and renders through
//! [`ProgressReporter::on_update`]. Each call receives a [`ProgressUpdate`]
//! describing the active file and its current byte offset; the reporter
//! diffs against its own state to decide whether to start a new line. A
//! caller that wants no output at all (non-interactive stderr, or
//! `--no-progress`) should simply not call `on_update`, or construct a
//! [`ProgressReporter`] in [`ProgressMode::Quiet`].
//!
//! # Invariants
//!
//! - Exactly one trailing newline is written when [`ProgressReporter::finish`]
//!   is called after a live line was in progress.
//! - Switching to a different `active_path` always starts a fresh line.
//!
//! # Examples
//!
//! ```
//! use fdprogress::{ProgressMode, ProgressReporter, ProgressUpdate};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! let mut buf = Vec::new();
//! let mut reporter = ProgressReporter::new(&mut buf, ProgressMode::PerFile);
//! reporter.on_update(&ProgressUpdate {
//!     path: Path::new("FILL_001_01000000.tmp"),
//!     bytes_done: 1024,
//!     bytes_total: 2048,
//!     elapsed: Duration::from_millis(500),
//!     index: 1,
//!     count: 100,
//!     is_final: true,
//! });
//! reporter.finish().unwrap();
//! assert!(!buf.is_empty());
//! ```

pub mod format;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use format::{estimate_remaining, format_bytes, format_elapsed, format_percent, format_rate};

/// Whether and how progress should be rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressMode {
    /// Render a line per file plus a live in-progress line.
    PerFile,
    /// Render nothing; callers typically skip constructing updates entirely
    /// in this mode, but it is still safe to call `on_update`.
    Quiet,
}

/// A single point-in-time progress observation for one file.
#[derive(Clone, Debug)]
pub struct ProgressUpdate<'a> {
    /// The file currently being processed.
    pub path: &'a Path,
    /// Bytes processed so far for this file.
    pub bytes_done: u64,
    /// Total bytes expected for this file.
    pub bytes_total: u64,
    /// Time spent on this file so far.
    pub elapsed: Duration,
    /// 1-based position in the overall run.
    pub index: u32,
    /// Total number of files in the run.
    pub count: u32,
    /// `true` if this is the last update for this file.
    pub is_final: bool,
}

/// Renders progress for a sequence of files to a writer, one overwritten
/// line at a time.
pub struct ProgressReporter<'a> {
    writer: &'a mut dyn Write,
    mode: ProgressMode,
    active_path: Option<PathBuf>,
    line_active: bool,
    error: Option<io::Error>,
}

impl<'a> ProgressReporter<'a> {
    /// Creates a reporter writing to `writer` in the given mode.
    pub fn new(writer: &'a mut dyn Write, mode: ProgressMode) -> Self {
        Self {
            writer,
            mode,
            active_path: None,
            line_active: false,
            error: None,
        }
    }

    fn record_error(&mut self, error: io::Error) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Renders one observation. Silently records and stops further
    /// rendering if the writer errors; the error surfaces from
    /// [`ProgressReporter::finish`].
    pub fn on_update(&mut self, update: &ProgressUpdate<'_>) {
        if self.mode == ProgressMode::Quiet || self.error.is_some() {
            return;
        }

        let result = (|| -> io::Result<()> {
            let path_changed = self.active_path.as_deref() != Some(update.path);
            if path_changed {
                if self.line_active {
                    writeln!(self.writer)?;
                    self.line_active = false;
                }
                writeln!(self.writer, "{}", update.path.display())?;
                self.active_path = Some(update.path.to_path_buf());
            }

            let size_field = format!("{:>12}", format_bytes(update.bytes_done));
            let percent_field = format_percent(update.bytes_done, update.bytes_total);
            let rate_field = format!("{:>12}", format_rate(update.bytes_done, update.elapsed));
            let elapsed_field = format!("{:>9}", format_elapsed(update.elapsed));
            let eta_field = estimate_remaining(update.bytes_done, update.bytes_total, update.elapsed)
                .map_or_else(|| "--:--:--".to_string(), format_elapsed);

            if self.line_active {
                write!(self.writer, "\r")?;
            }
            write!(
                self.writer,
                "{size_field} {percent_field} {rate_field} {elapsed_field} ETA {eta_field} (file {}/{})",
                update.index, update.count
            )?;

            if update.is_final {
                writeln!(self.writer)?;
                self.line_active = false;
                self.active_path = None;
            } else {
                self.line_active = true;
            }
            Ok(())
        })();

        if let Err(error) = result {
            self.record_error(error);
        }
    }

    /// Flushes any in-progress line with a trailing newline and surfaces the
    /// first write error encountered, if any.
    pub fn finish(self) -> io::Result<()> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.line_active {
            writeln!(self.writer)?;
        }
        Ok(())
    }
}

/// Picks [`ProgressMode::Quiet`] when stderr is not a terminal or the caller
/// passed `--no-progress`/`--quiet`, else [`ProgressMode::PerFile`].
#[must_use]
pub fn resolve_mode(no_progress_flag: bool, quiet_flag: bool) -> ProgressMode {
    if no_progress_flag || quiet_flag || !is_terminal::IsTerminal::is_terminal(&io::stderr()) {
        ProgressMode::Quiet
    } else {
        ProgressMode::PerFile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(path: &Path, done: u64, total: u64, is_final: bool) -> ProgressUpdate<'_> {
        ProgressUpdate {
            path,
            bytes_done: done,
            bytes_total: total,
            elapsed: Duration::from_secs(1),
            index: 1,
            count: 100,
            is_final,
        }
    }

    #[test]
    fn writes_path_header_once_per_file() {
        let mut buf = Vec::new();
        let mut reporter = ProgressReporter::new(&mut buf, ProgressMode::PerFile);
        let path = Path::new("FILL_001_01000000.tmp");
        reporter.on_update(&update(path, 10, 100, false));
        reporter.on_update(&update(path, 50, 100, false));
        reporter.on_update(&update(path, 100, 100, true));
        reporter.finish().unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.matches("FILL_001_01000000.tmp").count(), 1);
    }

    #[test]
    fn quiet_mode_writes_nothing() {
        let mut buf = Vec::new();
        let mut reporter = ProgressReporter::new(&mut buf, ProgressMode::Quiet);
        reporter.on_update(&update(Path::new("x.tmp"), 10, 100, true));
        reporter.finish().unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn switching_files_starts_a_new_header() {
        let mut buf = Vec::new();
        let mut reporter = ProgressReporter::new(&mut buf, ProgressMode::PerFile);
        reporter.on_update(&update(Path::new("a.tmp"), 10, 100, false));
        reporter.on_update(&update(Path::new("b.tmp"), 10, 100, false));
        reporter.finish().unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("a.tmp"));
        assert!(text.contains("b.tmp"));
    }
}
