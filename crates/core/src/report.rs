//! Terminal-summary data model. Every operation produces one `Report`
//! variant, which the CLI front end renders and which `exit_code()` turns
//! into a process status without re-inspecting the run.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;
use crate::exit_code::ExitCode;
use crate::plan::TestFileState;

/// Summary of a single file's outcome, independent of which operation produced it.
#[derive(Clone, Debug)]
pub struct FileOutcome {
    /// 1-based position in the plan or directory walk.
    pub index: u32,
    /// The file's path.
    pub path: PathBuf,
    /// Bytes actually written or copied.
    pub bytes: u64,
    /// Time spent on this file.
    pub duration: Duration,
    /// Final lifecycle state, for capacity-test files.
    pub state: Option<TestFileState>,
    /// The error that ended this file's processing, if any.
    pub error: Option<String>,
}

impl FileOutcome {
    /// `true` if this file has no recorded error.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Throughput in MiB/s, or `None` if duration was zero.
    #[must_use]
    pub fn speed_mibs(&self) -> Option<f64> {
        let secs = self.duration.as_secs_f64();
        if secs <= 0.0 {
            return None;
        }
        Some(self.bytes as f64 / (1024.0 * 1024.0) / secs)
    }
}

/// Outcome of a `test` or `fill` run (§5/§6).
#[derive(Debug)]
pub struct TestReport {
    /// The directory under test.
    pub target_path: PathBuf,
    /// Per-file outcomes, in plan order.
    pub files: Vec<FileOutcome>,
    /// Frozen baseline speed, if the run lasted long enough to compute one.
    pub baseline_mibs: Option<f64>,
    /// The fatal error that stopped the run early, if any.
    pub fatal: Option<CoreError>,
    /// Whether every file reached `Verified`.
    pub all_verified: bool,
    /// Whether the plan had to shrink file sizes below the normal share (§4.7).
    pub partial_coverage: bool,
    /// Whether test files were deleted as part of this run's auto-delete policy.
    pub deleted: bool,
}

impl TestReport {
    /// The exit code this report maps to: the fatal error's code if one
    /// occurred, `IntegrityFailure` if any file failed verification without
    /// a more specific fatal error, otherwise `Ok`.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if let Some(fatal) = &self.fatal {
            return fatal.exit_code();
        }
        if self.all_verified {
            ExitCode::Ok
        } else {
            ExitCode::IntegrityFailure
        }
    }

    /// Number of files that reached `Verified`.
    #[must_use]
    pub fn verified_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.state == Some(TestFileState::Verified))
            .count()
    }

    /// Mean write speed across files with a valid duration, ignoring baseline freezing.
    #[must_use]
    pub fn observed_mean_mibs(&self) -> Option<f64> {
        let speeds: Vec<f64> = self.files.iter().filter_map(FileOutcome::speed_mibs).collect();
        if speeds.is_empty() {
            return None;
        }
        Some(speeds.iter().sum::<f64>() / speeds.len() as f64)
    }
}

/// Outcome of a `clean` run (§7).
#[derive(Clone, Debug, Default)]
pub struct DeletionReport {
    /// The directory swept.
    pub target_path: PathBuf,
    /// Paths removed.
    pub removed: Vec<PathBuf>,
    /// Paths the sweep found but could not remove, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl DeletionReport {
    /// `Failure` if any removal failed, else `Ok`.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.failed.is_empty() {
            ExitCode::Ok
        } else {
            ExitCode::Failure
        }
    }
}

/// Outcome of a `copy` run, in any of the three modes (§8).
#[derive(Debug)]
pub struct CopyReport {
    /// The source root copied from.
    pub source_root: PathBuf,
    /// The target root copied into.
    pub target_root: PathBuf,
    /// Per-file outcomes, in dispatch order.
    pub files: Vec<FileOutcome>,
    /// Paths recorded to the skip list during this run (Rescue mode only).
    pub skipped: Vec<PathBuf>,
    /// Whether the supervisor downgraded from Auto to Safe mid-run.
    pub downgraded_to_safe: bool,
    /// The fatal error that stopped the run early, if any.
    pub fatal: Option<CoreError>,
}

impl CopyReport {
    /// The exit code this report maps to: the fatal error's code if one
    /// occurred, `Failure` if any per-file error was recorded without a more
    /// specific fatal error, otherwise `Ok`.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if let Some(fatal) = &self.fatal {
            return fatal.exit_code();
        }
        if self.files.iter().all(FileOutcome::succeeded) {
            ExitCode::Ok
        } else {
            ExitCode::Failure
        }
    }

    /// Total bytes copied across all files.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(state: TestFileState, error: Option<&str>) -> FileOutcome {
        FileOutcome {
            index: 1,
            path: PathBuf::from("/mnt/usb/FILL_001_01000000.tmp"),
            bytes: 10 * 1024 * 1024,
            duration: Duration::from_secs(1),
            state: Some(state),
            error: error.map(str::to_owned),
        }
    }

    #[test]
    fn test_report_is_ok_when_all_verified() {
        let report = TestReport {
            target_path: PathBuf::from("/mnt/usb"),
            files: vec![outcome(TestFileState::Verified, None)],
            baseline_mibs: Some(40.0),
            fatal: None,
            all_verified: true,
            partial_coverage: false,
            deleted: false,
        };
        assert_eq!(report.exit_code(), ExitCode::Ok);
        assert_eq!(report.verified_count(), 1);
    }

    #[test]
    fn test_report_is_integrity_failure_without_fatal_error() {
        let report = TestReport {
            target_path: PathBuf::from("/mnt/usb"),
            files: vec![outcome(TestFileState::Failed, Some("mismatch"))],
            baseline_mibs: None,
            fatal: None,
            all_verified: false,
            partial_coverage: false,
            deleted: false,
        };
        assert_eq!(report.exit_code(), ExitCode::IntegrityFailure);
    }

    #[test]
    fn fatal_error_code_takes_priority() {
        let report = TestReport {
            target_path: PathBuf::from("/mnt/usb"),
            files: vec![],
            baseline_mibs: None,
            fatal: Some(CoreError::precondition("free space below 100 MiB")),
            all_verified: false,
            partial_coverage: false,
            deleted: false,
        };
        assert_eq!(report.exit_code(), ExitCode::Precondition);
    }

    #[test]
    fn deletion_report_fails_if_any_removal_failed() {
        let mut report = DeletionReport {
            target_path: PathBuf::from("/mnt/usb"),
            ..Default::default()
        };
        assert_eq!(report.exit_code(), ExitCode::Ok);
        report
            .failed
            .push((PathBuf::from("/mnt/usb/FILL_002_01000000.tmp"), "permission denied".into()));
        assert_eq!(report.exit_code(), ExitCode::Failure);
    }

    #[test]
    fn copy_report_total_bytes_sums_files() {
        let report = CopyReport {
            source_root: PathBuf::from("/src"),
            target_root: PathBuf::from("/dst"),
            files: vec![outcome(TestFileState::Verified, None), outcome(TestFileState::Verified, None)],
            skipped: vec![],
            downgraded_to_safe: false,
            fatal: None,
        };
        assert_eq!(report.total_bytes(), 20 * 1024 * 1024);
        assert_eq!(report.exit_code(), ExitCode::Ok);
    }
}
