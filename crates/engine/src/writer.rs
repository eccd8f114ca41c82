//! Streaming chunk writer (C4): produces a file of exactly `nominal_bytes`
//! — a fixed header followed by the repeating printable pattern — without
//! ever materializing the whole payload in memory.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use fdcore::error::CoreError;
use fdcore::pattern::fill_body_pattern;
use fdinterrupt::is_cancelled;

/// Chunk buffer size used while streaming the body pattern. Kept at or below
/// 1 MiB so a single write call never dominates interrupt latency.
const CHUNK_BYTES: usize = 1024 * 1024;

/// Writes `nominal_bytes` worth of header-plus-pattern to `path`, flushing
/// once at the end. Returns the wall-clock duration the write took.
///
/// Checks [`fdinterrupt::is_cancelled`] between chunks; an interrupt mid-write
/// stops immediately and returns [`CoreError::Cancelled`], leaving the
/// partially written file on disk for the caller to clean up.
///
/// # Errors
///
/// Returns [`CoreError::Io`] on any filesystem failure, or
/// [`CoreError::Cancelled`] if cancellation was observed mid-write.
pub fn write_test_file(path: &Path, header_line: &str, nominal_bytes: u64) -> Result<Duration, CoreError> {
    let started = Instant::now();
    let mut file = File::create(path).map_err(|e| CoreError::io("create test file", path, e))?;

    let header_bytes = header_line.as_bytes();
    let header_len = (header_bytes.len() as u64).min(nominal_bytes) as usize;
    file.write_all(&header_bytes[..header_len])
        .map_err(|e| CoreError::io("write header", path, e))?;

    let mut remaining = nominal_bytes - header_len as u64;
    let mut body_offset = 0_u64;
    let mut chunk = vec![0_u8; CHUNK_BYTES.min(remaining.max(1) as usize)];

    while remaining > 0 {
        if is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        let take = (chunk.len() as u64).min(remaining) as usize;
        fill_body_pattern(&mut chunk[..take], body_offset);
        file.write_all(&chunk[..take])
            .map_err(|e| CoreError::io("write body", path, e))?;
        body_offset += take as u64;
        remaining -= take as u64;
    }

    flush_and_sync(&mut file, path)?;
    Ok(started.elapsed())
}

fn flush_and_sync(file: &mut File, path: &Path) -> Result<(), CoreError> {
    file.flush().map_err(|e| CoreError::io("flush test file", path, e))?;
    file.sync_all().map_err(|e| CoreError::io("fsync test file", path, e))
}

/// Maps the common OS-reported write failures to a stable label for the
/// damage log, per the writer's failure classification.
#[must_use]
pub fn classify_io_error(error: &io::Error) -> &'static str {
    match error.kind() {
        io::ErrorKind::StorageFull => "NoSpace",
        io::ErrorKind::PermissionDenied => "PermissionDenied",
        io::ErrorKind::Interrupted => "Cancelled",
        _ => "IOError",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn writes_exact_nominal_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("FILL_001_01000000.tmp");
        write_test_file(&path, "HEADER\n", 10_000).unwrap();
        let metadata = fs::metadata(&path).unwrap();
        assert_eq!(metadata.len(), 10_000);
    }

    #[test]
    fn header_is_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("FILL_002_01000000.tmp");
        write_test_file(&path, "HEADER\n", 100).unwrap();
        let data = fs::read(&path).unwrap();
        assert!(data.starts_with(b"HEADER\n"));
    }

    #[test]
    fn handles_nominal_bytes_shorter_than_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("FILL_003_01000000.tmp");
        write_test_file(&path, "HEADER\n", 3).unwrap();
        let data = fs::read(&path).unwrap();
        assert_eq!(data, b"HEA");
    }

    #[test]
    fn respects_cancellation_between_chunks() {
        fdinterrupt::reset_for_testing();
        fdinterrupt::request_cancel(fdinterrupt::CancelReason::UserRequested);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("FILL_004_01000000.tmp");
        let result = write_test_file(&path, "HEADER\n", 10 * 1024 * 1024);
        fdinterrupt::reset_for_testing();
        assert!(matches!(result, Err(CoreError::Cancelled)));
    }
}
