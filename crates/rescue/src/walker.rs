//! Deterministic, sorted-by-name directory walker used to build the
//! supervisor's work queue. Files are listed in the same order on every
//! run, so a rerun after a Rescue failure visits files in the same sequence.

use std::fs;
use std::path::{Path, PathBuf};

use fdcore::error::CoreError;

/// One file discovered under a source root, with its path relative to that
/// root so the supervisor can mirror the directory structure at the target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalkEntry {
    /// Absolute source path.
    pub source_path: PathBuf,
    /// Path relative to the walk root, used to build the mirrored target path.
    pub relative_path: PathBuf,
}

/// Walks `root` depth-first, visiting entries in each directory sorted by
/// name, and returns every regular file found plus the list of directories
/// that must exist at the target (including empty ones).
///
/// # Errors
///
/// Returns [`CoreError::Io`] if a directory cannot be read.
pub fn walk(root: &Path) -> Result<(Vec<WalkEntry>, Vec<PathBuf>), CoreError> {
    let mut files = Vec::new();
    let mut dirs = Vec::new();
    walk_into(root, root, &mut files, &mut dirs)?;
    Ok((files, dirs))
}

fn walk_into(
    root: &Path,
    current: &Path,
    files: &mut Vec<WalkEntry>,
    dirs: &mut Vec<PathBuf>,
) -> Result<(), CoreError> {
    let mut entries: Vec<_> = fs::read_dir(current)
        .map_err(|e| CoreError::io("read directory", current, e))?
        .collect::<Result<_, _>>()
        .map_err(|e| CoreError::io("read directory entry", current, e))?;
    entries.sort_by_key(std::fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| CoreError::io("stat directory entry", &path, e))?;

        if file_type.is_dir() {
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            dirs.push(relative);
            walk_into(root, &path, files, dirs)?;
        } else if file_type.is_file() {
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            files.push(WalkEntry {
                source_path: path,
                relative_path: relative,
            });
        }
        // Symlinks, devices, and other special files are out of scope (§ Non-goals).
    }

    Ok(())
}
