//! The `TestPlan` / `TestFile` / `BaselineStats` domain model (§3 of the
//! specification) plus the `CopyJob` model shared with the rescue copier.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Duration;

use time::OffsetDateTime;

use crate::naming::{plan_timestamp, test_file_name};
use crate::pattern::header_line;

/// Minimum free space, in bytes, required before a capacity test may start.
pub const MIN_FREE_BYTES: u64 = 100 * 1024 * 1024;

/// Default number of test files a plan writes.
pub const DEFAULT_FILE_COUNT: u32 = 100;

/// Floor on the size of an individual test file when free space is scarce.
pub const MIN_FILE_BYTES: u64 = 1024 * 1024;

/// Default number of random-offset samples read back per file.
pub const DEFAULT_VERIFY_POSITIONS: u32 = 5;

/// Number of leading successfully-written files used to compute the speed baseline.
pub const BASELINE_WINDOW: usize = 3;

/// An opaque, reproducible seed root for a single plan instance. Combined
/// with a file index it drives the verifier's pseudo-random offset sampling
/// (§4.5), so a failure on file N can be re-run deterministically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlanId(u64);

impl PlanId {
    /// Derives a `PlanId` from the target path and the plan's start time.
    #[must_use]
    pub fn derive(target: &Path, started_at: OffsetDateTime) -> Self {
        let mut hasher = DefaultHasher::new();
        target.hash(&mut hasher);
        started_at.unix_timestamp_nanos().hash(&mut hasher);
        Self(hasher.finish())
    }

    /// Builds the 8-byte seed for a given file index's `ChaCha8Rng` stream.
    #[must_use]
    pub fn seed_for_file(self, file_index: u32) -> [u8; 32] {
        let mut hasher = DefaultHasher::new();
        self.0.hash(&mut hasher);
        file_index.hash(&mut hasher);
        let digest = hasher.finish();
        let mut seed = [0_u8; 32];
        seed[..8].copy_from_slice(&digest.to_le_bytes());
        seed[8..16].copy_from_slice(&self.0.to_le_bytes());
        seed[16..20].copy_from_slice(&file_index.to_le_bytes());
        seed
    }
}

/// What to do with successfully-created test files when a plan finishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AutoDelete {
    /// Never delete test files, regardless of outcome.
    KeepAll,
    /// Remove every test file, but only if every file reached `Verified`.
    DeleteAllOnSuccess,
    /// Default: keep files whenever the plan did not fully succeed.
    #[default]
    KeepOnFailure,
}

/// The lifecycle state of a single test file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestFileState {
    /// Slot allocated, nothing written yet.
    Planned,
    /// Write in progress.
    Writing,
    /// Write completed; not yet verified.
    Written,
    /// Header and all samples matched.
    Verified,
    /// Write or verification failed.
    Failed,
}

/// A single comparison made by the verifier at one byte offset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifySample {
    /// Absolute byte offset inside the file.
    pub offset: u64,
    /// The bytes the pattern function says should be there.
    pub expected: Vec<u8>,
    /// The bytes actually read.
    pub observed: Vec<u8>,
}

impl VerifySample {
    /// `true` if `expected == observed`.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.expected == self.observed
    }
}

/// One slot in a `TestPlan`'s file vector (§3).
#[derive(Clone, Debug)]
pub struct TestFile {
    /// 1-based position in the plan.
    pub index: u32,
    /// Absolute path of the test file.
    pub path: PathBuf,
    /// The size this file was planned to be.
    pub nominal_bytes: u64,
    /// The size actually written, populated once writing finishes.
    pub actual_bytes_written: u64,
    /// Wall-clock time the write took, populated once writing finishes.
    pub write_duration: Duration,
    /// Whether the header bytes matched on the most recent verification pass.
    pub header_ok: bool,
    /// Every sample drawn by the most recent verification pass.
    pub verify_samples: Vec<VerifySample>,
    /// Current lifecycle state.
    pub state: TestFileState,
}

impl TestFile {
    fn planned(index: u32, path: PathBuf, nominal_bytes: u64) -> Self {
        Self {
            index,
            path,
            nominal_bytes,
            actual_bytes_written: 0,
            write_duration: Duration::ZERO,
            header_ok: false,
            verify_samples: Vec::new(),
            state: TestFileState::Planned,
        }
    }

    /// `true` iff the invariant for `Verified` holds: exact size and every
    /// sample (plus the header) matched.
    #[must_use]
    pub fn is_fully_verified(&self) -> bool {
        self.state == TestFileState::Verified
            && self.actual_bytes_written == self.nominal_bytes
            && self.header_ok
            && self.verify_samples.iter().all(VerifySample::ok)
    }

    /// Write speed in MiB/s, or `None` if nothing was written or duration was zero.
    #[must_use]
    pub fn speed_mibs(&self) -> Option<f64> {
        let secs = self.write_duration.as_secs_f64();
        if self.actual_bytes_written == 0 || secs <= 0.0 {
            return None;
        }
        Some(self.actual_bytes_written as f64 / (1024.0 * 1024.0) / secs)
    }
}

/// Rolling mean write speed over the first [`BASELINE_WINDOW`] successful
/// writes, frozen thereafter (§4.6).
#[derive(Clone, Debug, Default)]
pub struct BaselineStats {
    samples: Vec<f64>,
    frozen_mean: Option<f64>,
}

impl BaselineStats {
    /// Creates an empty, unfrozen baseline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once [`BASELINE_WINDOW`] samples have been observed.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen_mean.is_some()
    }

    /// The frozen mean speed in MiB/s, if frozen.
    #[must_use]
    pub fn frozen_mibs(&self) -> Option<f64> {
        self.frozen_mean
    }

    /// Records one successful file's write speed. Returns `true` if this
    /// observation is what froze the baseline.
    pub fn observe(&mut self, speed_mibs: f64) -> bool {
        if self.is_frozen() {
            return false;
        }
        self.samples.push(speed_mibs);
        if self.samples.len() >= BASELINE_WINDOW {
            let mean = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
            self.frozen_mean = Some(mean);
            return true;
        }
        false
    }
}

/// Immutable plan for a single capacity test (§3).
#[derive(Clone, Debug)]
pub struct TestPlan {
    /// The directory under test.
    pub target_path: PathBuf,
    /// Free bytes reported by the probe at plan creation.
    pub free_bytes: u64,
    /// Number of files the plan writes.
    pub file_count: u32,
    /// Size of each file (the last file absorbs the integer-division remainder).
    pub per_file_bytes: u64,
    /// Fixed ASCII banner written at the start of every file.
    pub header_line: &'static str,
    /// Number of random-offset samples read back per file.
    pub verify_positions_per_file: u32,
    /// Cleanup policy applied once the plan finishes.
    pub auto_delete: AutoDelete,
    /// Reproducible seed root for verification sampling.
    pub plan_id: PlanId,
    /// `DDHHMMSS` stamp embedded in every file name from this plan.
    pub stamp: String,
    /// Whether `free_bytes` was too small to give every file a full share,
    /// so coverage is partial (§4.7 edge case).
    pub partial_coverage: bool,
}

impl TestPlan {
    /// Builds a plan from a probed free-byte count, applying the edge-case
    /// rules in §4.7: if free space can't give every file its full share,
    /// still create `file_count` files of `max(MIN_FILE_BYTES, per_file_bytes)`
    /// each, flagging partial coverage.
    #[must_use]
    pub fn new(
        target_path: PathBuf,
        free_bytes: u64,
        auto_delete: AutoDelete,
        started_at: OffsetDateTime,
    ) -> Self {
        Self::with_file_count(
            target_path,
            free_bytes,
            DEFAULT_FILE_COUNT,
            auto_delete,
            started_at,
        )
    }

    /// As [`TestPlan::new`], but with an explicit file count (used by `fill`,
    /// which sizes a single large file rather than a 100-file spread).
    #[must_use]
    pub fn with_file_count(
        target_path: PathBuf,
        free_bytes: u64,
        file_count: u32,
        auto_delete: AutoDelete,
        started_at: OffsetDateTime,
    ) -> Self {
        let file_count = file_count.max(1);
        let even_share = free_bytes / u64::from(file_count);
        let (per_file_bytes, partial_coverage) = if even_share < MIN_FILE_BYTES {
            (MIN_FILE_BYTES, true)
        } else {
            (even_share, false)
        };

        Self {
            plan_id: PlanId::derive(&target_path, started_at),
            stamp: plan_timestamp(started_at),
            target_path,
            free_bytes,
            file_count,
            per_file_bytes,
            header_line: header_line(),
            verify_positions_per_file: DEFAULT_VERIFY_POSITIONS,
            auto_delete,
            partial_coverage,
        }
    }

    /// The size of file `index` (1-based): every file is `per_file_bytes`
    /// except the last, which absorbs the division remainder when coverage
    /// is not already partial.
    #[must_use]
    pub fn bytes_for(&self, index: u32) -> u64 {
        if index != self.file_count || self.partial_coverage {
            return self.per_file_bytes;
        }
        let even_total = self.per_file_bytes * u64::from(self.file_count - 1);
        self.free_bytes.saturating_sub(even_total).max(self.per_file_bytes)
    }

    /// Allocates the full `TestFile` vector in `Planned` state, numbered
    /// 1..=`file_count`, named `FILL_<NNN>_<stamp>.tmp`.
    #[must_use]
    pub fn allocate_files(&self) -> Vec<TestFile> {
        (1..=self.file_count)
            .map(|index| {
                let name = test_file_name(index, &self.stamp);
                let path = self.target_path.join(name);
                TestFile::planned(index, path, self.bytes_for(index))
            })
            .collect()
    }
}

/// How the bulk-copy supervisor should run (§4.10).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyMode {
    /// CPU-scaled concurrency, class-sized buffers.
    Auto,
    /// Single worker, small buffers, forced flush.
    Safe,
    /// Safe mode plus skip-list consultation and damage logging.
    Rescue,
}

/// Parameters for a single bulk-copy run (§3).
#[derive(Clone, Debug)]
pub struct CopyJob {
    /// Root of the tree to copy from.
    pub source_root: PathBuf,
    /// Root to copy into (mirrored directory structure).
    pub target_root: PathBuf,
    /// Execution mode.
    pub mode: CopyMode,
    /// Maximum number of files copied concurrently (collapses to 1 outside `Auto`).
    pub max_concurrent_files: usize,
    /// Per-chunk buffer size budget.
    pub max_buffer_bytes: usize,
    /// Hard wall-clock deadline applied to each file by the copier (§4.9).
    pub per_file_timeout: Duration,
    /// Whether to force an `fsync` after every file (always true outside `Auto`).
    pub force_flush: bool,
}

impl CopyJob {
    /// Safe-mode defaults from §4.10: concurrency 1, buffer capped at 4 MiB,
    /// forced flush, 10-second per-file timeout.
    #[must_use]
    pub fn safe(source_root: PathBuf, target_root: PathBuf) -> Self {
        Self {
            source_root,
            target_root,
            mode: CopyMode::Safe,
            max_concurrent_files: 1,
            max_buffer_bytes: 4 * 1024 * 1024,
            per_file_timeout: Duration::from_secs(10),
            force_flush: true,
        }
    }

    /// Rescue mode: identical resource budget to [`CopyJob::safe`], with the
    /// mode tag flipped so the supervisor consults the skip list.
    #[must_use]
    pub fn rescue(source_root: PathBuf, target_root: PathBuf) -> Self {
        Self {
            mode: CopyMode::Rescue,
            ..Self::safe(source_root, target_root)
        }
    }

    /// Auto mode: CPU-scaled concurrency, larger buffer, no forced flush
    /// (matching §9's resolution of the Auto-mode timeout open question).
    #[must_use]
    pub fn auto(source_root: PathBuf, target_root: PathBuf) -> Self {
        let concurrency = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(4);
        Self {
            source_root,
            target_root,
            mode: CopyMode::Auto,
            max_concurrent_files: concurrency,
            max_buffer_bytes: 8 * 1024 * 1024,
            per_file_timeout: Duration::from_secs(30),
            force_flush: false,
        }
    }

    /// Returns a new job downgraded one-way to Safe mode, preserving the
    /// source/target roots. Per §4.10 this transition never reverses.
    #[must_use]
    pub fn downgraded_to_safe(&self) -> Self {
        Self::safe(self.source_root.clone(), self.target_root.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::fixed_timestamp as now;

    #[test]
    fn plan_splits_free_bytes_evenly_by_default() {
        let plan = TestPlan::new(
            PathBuf::from("/mnt/usb"),
            1000 * 1024 * 1024,
            AutoDelete::default(),
            now(),
        );
        assert_eq!(plan.file_count, DEFAULT_FILE_COUNT);
        assert_eq!(plan.per_file_bytes, 10 * 1024 * 1024);
        assert!(!plan.partial_coverage);
    }

    #[test]
    fn plan_flags_partial_coverage_when_free_space_is_scarce() {
        // 50 MiB free split across 100 files would be 512 KiB each, below the floor.
        let plan = TestPlan::new(
            PathBuf::from("/mnt/usb"),
            50 * 1024 * 1024,
            AutoDelete::default(),
            now(),
        );
        assert!(plan.partial_coverage);
        assert_eq!(plan.per_file_bytes, MIN_FILE_BYTES);
        assert_eq!(plan.bytes_for(100), MIN_FILE_BYTES);
    }

    #[test]
    fn last_file_absorbs_integer_division_remainder() {
        let plan = TestPlan::with_file_count(
            PathBuf::from("/mnt/usb"),
            1001 * 1024 * 1024,
            100,
            AutoDelete::default(),
            now(),
        );
        assert!(!plan.partial_coverage);
        let total: u64 = (1..=plan.file_count).map(|i| plan.bytes_for(i)).sum();
        assert!(total <= plan.free_bytes);
        assert!(plan.bytes_for(100) >= plan.bytes_for(1));
    }

    #[test]
    fn plan_id_is_stable_for_same_inputs() {
        let a = PlanId::derive(Path::new("/mnt/usb"), now());
        let b = PlanId::derive(Path::new("/mnt/usb"), now());
        assert_eq!(a, b);
        assert_eq!(a.seed_for_file(4), b.seed_for_file(4));
    }

    #[test]
    fn plan_id_differs_per_file_index() {
        let id = PlanId::derive(Path::new("/mnt/usb"), now());
        assert_ne!(id.seed_for_file(1), id.seed_for_file(2));
    }

    #[test]
    fn baseline_freezes_after_window_and_stays_frozen() {
        let mut baseline = BaselineStats::new();
        assert!(!baseline.observe(40.0));
        assert!(!baseline.observe(42.0));
        assert!(baseline.observe(38.0));
        assert!(baseline.is_frozen());
        let mean = baseline.frozen_mibs().unwrap();
        assert!((mean - 40.0).abs() < 0.5);

        // Further observations do not move the frozen mean.
        assert!(!baseline.observe(1000.0));
        assert_eq!(baseline.frozen_mibs(), Some(mean));
    }

    #[test]
    fn downgrade_to_safe_is_idempotent_in_shape() {
        let auto = CopyJob::auto(PathBuf::from("/src"), PathBuf::from("/dst"));
        let safe = auto.downgraded_to_safe();
        assert_eq!(safe.mode, CopyMode::Safe);
        assert_eq!(safe.max_concurrent_files, 1);
        let safe_again = safe.downgraded_to_safe();
        assert_eq!(safe_again.mode, CopyMode::Safe);
    }
}
