//! Artefact sweep (`fd clean`): the one operation that removes both the
//! test-file family and the wider speed-test artefact families left behind
//! by tooling outside this crate.

use std::fs;
use std::path::Path;

use fdcore::naming::{is_speedtest_artifact_name, is_test_file_name};
use fdcore::report::DeletionReport;

/// Removes every `FILL_*.tmp` and `speedtest*_.txt` artefact directly inside
/// `target_path`. Idempotent: a second call against an already-clean
/// directory removes nothing and still succeeds.
pub fn clean(target_path: &Path) -> DeletionReport {
    let mut removed = Vec::new();
    let mut failed = Vec::new();

    let entries = match fs::read_dir(target_path) {
        Ok(entries) => entries,
        Err(error) => {
            return DeletionReport {
                target_path: target_path.to_path_buf(),
                removed,
                failed: vec![(target_path.to_path_buf(), error.to_string())],
            };
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_test_file_name(name) && !is_speedtest_artifact_name(name) {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => removed.push(path),
            Err(error) => failed.push((path, error.to_string())),
        }
    }

    tracing::info!(
        target = %target_path.display(),
        removed = removed.len(),
        failed = failed.len(),
        "artefact sweep finished"
    );

    DeletionReport {
        target_path: target_path.to_path_buf(),
        removed,
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn clean_removes_both_artifact_families_and_nothing_else() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("FILL_001_01000000.tmp"), b"x").unwrap();
        fs::write(dir.path().join("speedtest_100_1700000000.txt"), b"x").unwrap();
        fs::write(dir.path().join("speedtest_download_100_1700000000.txt"), b"x").unwrap();
        fs::write(dir.path().join("keep.me"), b"x").unwrap();

        let report = clean(dir.path());
        assert_eq!(report.removed.len(), 3);
        assert!(report.failed.is_empty());
        assert!(dir.path().join("keep.me").exists());
    }

    #[test]
    fn clean_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("FILL_001_01000000.tmp"), b"x").unwrap();

        let first = clean(dir.path());
        assert_eq!(first.removed.len(), 1);

        let second = clean(dir.path());
        assert!(second.removed.is_empty());
        assert!(second.failed.is_empty());
    }
}
