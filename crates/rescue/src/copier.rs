//! Timed per-file copier (C9): copies one file within a deadline, chunk by
//! chunk, never leaving a partial file visible at the destination on
//! failure.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fdcore::error::CoreError;
use fdinterrupt::is_cancelled;
use filetime::FileTime;

/// The hard wall-clock slice a single chunk read-or-write may take before
/// the copier abandons the file, independent of the overall per-file
/// deadline.
const CHUNK_SLICE: Duration = Duration::from_secs(10);

/// Copies `src` to `dst` using `buffer_bytes`-sized chunks, enforcing
/// `deadline` as a total wall-clock budget and [`CHUNK_SLICE`] as a
/// per-chunk budget. Writes to a sibling temp file and renames onto `dst`
/// only once the copy and optional flush succeed. Preserves `src`'s
/// modification time on `dst`.
///
/// # Errors
///
/// Returns [`CoreError::Timeout`] if the deadline or a chunk slice is
/// exceeded, [`CoreError::Cancelled`] if interrupted, or
/// [`CoreError::Io`] for any other read/write/rename failure. On any
/// error, `dst` is left untouched (no partial file).
pub fn copy_file(
    src: &Path,
    dst: &Path,
    deadline: Duration,
    buffer_bytes: usize,
    force_flush: bool,
) -> Result<u64, CoreError> {
    let started = Instant::now();
    let mut source = File::open(src).map_err(|e| CoreError::io("open source file", src, e))?;

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| CoreError::io("create target directory", parent, e))?;
    }

    let temp_path = sibling_temp_path(dst);
    let result = copy_chunks(
        &mut source,
        &temp_path,
        started,
        deadline,
        buffer_bytes,
        force_flush,
    );

    match result {
        Ok(bytes) => {
            fs::rename(&temp_path, dst).map_err(|e| CoreError::io("rename into place", dst, e))?;
            preserve_mtime(src, dst);
            Ok(bytes)
        }
        Err(error) => {
            let _ = fs::remove_file(&temp_path);
            Err(error)
        }
    }
}

fn sibling_temp_path(dst: &Path) -> PathBuf {
    let file_name = dst.file_name().map_or_else(|| "copy".into(), |n| n.to_os_string());
    let mut temp_name = file_name;
    temp_name.push(".fdtmp");
    dst.with_file_name(temp_name)
}

fn copy_chunks(
    source: &mut File,
    temp_path: &Path,
    started: Instant,
    deadline: Duration,
    buffer_bytes: usize,
    force_flush: bool,
) -> Result<u64, CoreError> {
    let mut dest = File::create(temp_path).map_err(|e| CoreError::io("create temp file", temp_path, e))?;
    let mut buffer = vec![0_u8; buffer_bytes.max(4096)];
    let mut total = 0_u64;

    loop {
        if is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        if started.elapsed() >= deadline {
            return Err(CoreError::timeout(deadline, temp_path));
        }

        let chunk_started = Instant::now();
        let read = source
            .read(&mut buffer)
            .map_err(|e| CoreError::io("read source chunk", temp_path, e))?;
        if read == 0 {
            break;
        }
        dest.write_all(&buffer[..read])
            .map_err(|e| CoreError::io("write target chunk", temp_path, e))?;
        total += read as u64;

        if chunk_started.elapsed() >= CHUNK_SLICE {
            return Err(CoreError::timeout(CHUNK_SLICE, temp_path));
        }
    }

    if force_flush {
        dest.sync_all().map_err(|e| CoreError::io("fsync target file", temp_path, e))?;
    } else {
        dest.flush().map_err(|e| CoreError::io("flush target file", temp_path, e))?;
    }

    Ok(total)
}

fn preserve_mtime(src: &Path, dst: &Path) {
    if let Ok(metadata) = fs::metadata(src) {
        let mtime = FileTime::from_last_modification_time(&metadata);
        let _ = filetime::set_file_mtime(dst, mtime);
    }
}

/// Classifies an I/O error the way the damage log expects, distinguishing
/// read from write failures using the action string attached to the
/// [`CoreError::Io`] variant.
#[must_use]
pub fn classify_copy_error(error: &CoreError) -> fdskiplist::DamageReason {
    match error {
        CoreError::Timeout { .. } => fdskiplist::DamageReason::Timeout,
        CoreError::Io { action, .. } if action.contains("read") => fdskiplist::DamageReason::ReadError,
        CoreError::Io { action, .. } if action.contains("write") => fdskiplist::DamageReason::WriteError,
        _ => fdskiplist::DamageReason::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_content_byte_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.bin");
        let dst = dir.path().join("dst.bin");
        fs::write(&src, vec![7_u8; 1_000_000]).unwrap();

        let bytes = copy_file(&src, &dst, Duration::from_secs(30), 64 * 1024, true).unwrap();
        assert_eq!(bytes, 1_000_000);
        assert_eq!(fs::read(&dst).unwrap(), fs::read(&src).unwrap());
    }

    #[test]
    fn leaves_no_partial_file_on_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("missing.bin");
        let dst = dir.path().join("dst.bin");

        let result = copy_file(&src, &dst, Duration::from_secs(30), 64 * 1024, true);
        assert!(result.is_err());
        assert!(!dst.exists());
    }

    #[test]
    fn times_out_when_deadline_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.bin");
        let dst = dir.path().join("dst.bin");
        fs::write(&src, vec![1_u8; 1024]).unwrap();

        let result = copy_file(&src, &dst, Duration::from_nanos(1), 64 * 1024, true);
        assert!(matches!(result, Err(CoreError::Timeout { .. })));
        assert!(!dst.exists());
        let temp = sibling_temp_path(&dst);
        assert!(!temp.exists());
    }

    #[test]
    fn mirrors_source_mtime_onto_target() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.bin");
        let dst = dir.path().join("dst.bin");
        fs::write(&src, b"data").unwrap();

        copy_file(&src, &dst, Duration::from_secs(30), 64 * 1024, true).unwrap();

        let src_mtime = fs::metadata(&src).unwrap().modified().unwrap();
        let dst_mtime = fs::metadata(&dst).unwrap().modified().unwrap();
        assert_eq!(src_mtime, dst_mtime);
    }
}
