//! Configuration surface (ambient component A2): turns the flags a front end
//! collects into the concrete plan/job types the rest of this crate expects,
//! applying the same precedence the teacher's client config resolver uses —
//! explicit flag, then environment variable, then built-in default.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use time::OffsetDateTime;

use crate::plan::{AutoDelete, CopyJob, CopyMode, TestPlan, DEFAULT_FILE_COUNT};

/// Environment variable consulted when `--files` is not given.
pub const ENV_FILE_COUNT: &str = "FILEDO_FILE_COUNT";

/// Environment variable consulted when `--delete`/`--keep` are both absent.
pub const ENV_AUTO_DELETE: &str = "FILEDO_AUTO_DELETE";

/// User-facing request for a `test` or `fill` run, prior to probing free space.
#[derive(Clone, Debug, Default)]
pub struct TestRequest {
    /// The directory to test.
    pub target_path: PathBuf,
    /// Explicit file count, overriding the environment and the default.
    pub file_count: Option<u32>,
    /// Explicit cleanup policy, overriding the environment and the default.
    pub auto_delete: Option<AutoDelete>,
}

impl TestRequest {
    /// Resolves this request plus a probed free-byte count into a [`TestPlan`].
    #[must_use]
    pub fn resolve(&self, free_bytes: u64, started_at: OffsetDateTime) -> TestPlan {
        let file_count = self
            .file_count
            .or_else(|| env_file_count())
            .unwrap_or(DEFAULT_FILE_COUNT);
        let auto_delete = self
            .auto_delete
            .or_else(env_auto_delete)
            .unwrap_or_default();
        TestPlan::with_file_count(
            self.target_path.clone(),
            free_bytes,
            file_count,
            auto_delete,
            started_at,
        )
    }
}

fn env_file_count() -> Option<u32> {
    env::var(ENV_FILE_COUNT).ok()?.parse().ok()
}

fn env_auto_delete() -> Option<AutoDelete> {
    match env::var(ENV_AUTO_DELETE).ok()?.as_str() {
        "keep-all" => Some(AutoDelete::KeepAll),
        "delete-on-success" => Some(AutoDelete::DeleteAllOnSuccess),
        "keep-on-failure" => Some(AutoDelete::KeepOnFailure),
        _ => None,
    }
}

/// User-facing request for a `copy` run, prior to resolving its mode.
#[derive(Clone, Debug)]
pub struct CopyRequest {
    /// Root of the tree to copy from.
    pub source_root: PathBuf,
    /// Root to copy into.
    pub target_root: PathBuf,
    /// `--safe` requested on the command line.
    pub safe_requested: bool,
    /// `--rescue` requested on the command line.
    pub rescue_requested: bool,
    /// Overrides the per-file timeout that the mode would otherwise pick.
    pub per_file_timeout_override: Option<Duration>,
    /// Caps Auto mode's CPU-scaled concurrency; ignored outside Auto mode,
    /// which always runs single-threaded.
    pub concurrency_override: Option<usize>,
}

impl CopyRequest {
    /// Resolves this request into a concrete [`CopyJob`]. `--rescue` implies
    /// `--safe`'s resource budget; requesting both is not an error.
    #[must_use]
    pub fn resolve(&self) -> CopyJob {
        let mut job = if self.rescue_requested {
            CopyJob::rescue(self.source_root.clone(), self.target_root.clone())
        } else if self.safe_requested {
            CopyJob::safe(self.source_root.clone(), self.target_root.clone())
        } else {
            CopyJob::auto(self.source_root.clone(), self.target_root.clone())
        };
        if let Some(timeout) = self.per_file_timeout_override {
            job.per_file_timeout = timeout;
        }
        if job.mode == CopyMode::Auto {
            if let Some(concurrency) = self.concurrency_override {
                job.max_concurrent_files = concurrency.max(1);
            }
        }
        job
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::fixed_timestamp as now;

    #[test]
    fn explicit_file_count_wins_over_default() {
        let request = TestRequest {
            target_path: PathBuf::from("/mnt/usb"),
            file_count: Some(10),
            auto_delete: None,
        };
        let plan = request.resolve(1000 * 1024 * 1024, now());
        assert_eq!(plan.file_count, 10);
    }

    #[test]
    fn default_file_count_is_one_hundred() {
        let request = TestRequest {
            target_path: PathBuf::from("/mnt/usb"),
            file_count: None,
            auto_delete: None,
        };
        let plan = request.resolve(1000 * 1024 * 1024, now());
        assert_eq!(plan.file_count, DEFAULT_FILE_COUNT);
    }

    #[test]
    fn rescue_request_implies_safe_resource_budget() {
        let request = CopyRequest {
            source_root: PathBuf::from("/src"),
            target_root: PathBuf::from("/dst"),
            safe_requested: false,
            rescue_requested: true,
            per_file_timeout_override: None,
            concurrency_override: None,
        };
        let job = request.resolve();
        assert_eq!(job.mode, CopyMode::Rescue);
        assert_eq!(job.max_concurrent_files, 1);
    }

    #[test]
    fn timeout_override_applies_in_every_mode() {
        let request = CopyRequest {
            source_root: PathBuf::from("/src"),
            target_root: PathBuf::from("/dst"),
            safe_requested: false,
            rescue_requested: false,
            per_file_timeout_override: Some(Duration::from_secs(5)),
            concurrency_override: None,
        };
        let job = request.resolve();
        assert_eq!(job.mode, CopyMode::Auto);
        assert_eq!(job.per_file_timeout, Duration::from_secs(5));
    }

    #[test]
    fn concurrency_override_only_applies_in_auto_mode() {
        let auto = CopyRequest {
            source_root: PathBuf::from("/src"),
            target_root: PathBuf::from("/dst"),
            safe_requested: false,
            rescue_requested: false,
            per_file_timeout_override: None,
            concurrency_override: Some(2),
        };
        assert_eq!(auto.resolve().max_concurrent_files, 2);

        let rescue = CopyRequest {
            rescue_requested: true,
            ..auto
        };
        assert_eq!(rescue.resolve().max_concurrent_files, 1);
    }
}
