//! Capacity-test orchestrator (C7): drives a [`TestPlan`] through writing,
//! per-file verification, baseline/anomaly tracking, a final re-verification
//! sweep, and cleanup — exactly the algorithm in the component design.

use std::fs;
use std::path::Path;

use fdcore::error::CoreError;
use fdcore::plan::{AutoDelete, BaselineStats, TestFile, TestFileState, TestPlan};
use fdcore::report::{FileOutcome, TestReport};
use fdinterrupt::{is_cancelled, TempFileGuard};
use fdprogress::{ProgressMode, ProgressReporter, ProgressUpdate};

use crate::detector;
use crate::verifier::verify_test_file;
use crate::writer::write_test_file;

/// Runs `plan` to completion (or first failure), reporting progress through
/// `progress_mode`. This is the single entry point `fd test`/`fd fill` call.
pub fn run(plan: &TestPlan, progress_mode: ProgressMode) -> TestReport {
    let mut files = plan.allocate_files();
    let mut baseline = BaselineStats::new();
    let mut fatal: Option<CoreError> = None;
    let mut stderr = std::io::stderr();
    let mut reporter = ProgressReporter::new(&mut stderr, progress_mode);

    tracing::info!(
        target = %plan.target_path.display(),
        file_count = plan.file_count,
        per_file_bytes = plan.per_file_bytes,
        "starting capacity test"
    );

    'write_phase: for file in &mut files {
        if is_cancelled() {
            fatal = Some(CoreError::Cancelled);
            file.state = TestFileState::Failed;
            break 'write_phase;
        }

        file.state = TestFileState::Writing;
        let mut guard = TempFileGuard::new(file.path.clone());

        match write_test_file(&file.path, plan.header_line, file.nominal_bytes) {
            Ok(duration) => {
                file.write_duration = duration;
                file.actual_bytes_written = file.nominal_bytes;
                file.state = TestFileState::Written;
            }
            Err(error) => {
                file.state = TestFileState::Failed;
                fatal = Some(error);
                break 'write_phase;
            }
        }

        report_progress(&mut reporter, file, true);

        match verify_test_file(
            &file.path,
            plan.header_line,
            file.nominal_bytes,
            plan.plan_id,
            file.index,
            plan.verify_positions_per_file,
        ) {
            Ok((header_ok, samples)) => {
                file.header_ok = header_ok;
                file.verify_samples = samples;
                if file.is_fully_verified() {
                    file.state = TestFileState::Verified;
                    guard.disarm();
                } else {
                    file.state = TestFileState::Failed;
                    fatal = Some(CoreError::integrity_failure(
                        file.path.clone(),
                        "header or sample mismatch on initial verification",
                    ));
                    break 'write_phase;
                }
            }
            Err(error) => {
                file.state = TestFileState::Failed;
                fatal = Some(error);
                break 'write_phase;
            }
        }

        if let Some(speed) = file.speed_mibs() {
            if let Some(verdict) = detector::observe(&mut baseline, speed) {
                tracing::warn!(path = %file.path.display(), speed_mibs = speed, ?verdict, "speed anomaly detected");
                fatal = Some(CoreError::speed_anomaly(file.path.clone(), verdict));
                break 'write_phase;
            }
        }
    }

    if fatal.is_none() {
        final_sweep(plan, &mut files, &mut fatal);
    }

    let _ = reporter.finish();

    if let Some(error) = &fatal {
        tracing::warn!(target = %plan.target_path.display(), %error, "capacity test stopped early");
    } else {
        tracing::info!(target = %plan.target_path.display(), "capacity test finished");
    }

    finalize(plan, files, baseline, fatal)
}

fn report_progress(reporter: &mut ProgressReporter<'_>, file: &TestFile, is_final: bool) {
    reporter.on_update(&ProgressUpdate {
        path: &file.path,
        bytes_done: file.actual_bytes_written,
        bytes_total: file.nominal_bytes,
        elapsed: file.write_duration,
        index: file.index,
        count: file.index,
        is_final,
    });
}

/// Re-verifies every successfully written file in order, catching corruption
/// that only manifests once the device's write head has wrapped around.
fn final_sweep(plan: &TestPlan, files: &mut [TestFile], fatal: &mut Option<CoreError>) {
    for file in files.iter_mut() {
        if file.state != TestFileState::Verified {
            continue;
        }
        if is_cancelled() {
            *fatal = Some(CoreError::Cancelled);
            return;
        }
        match verify_test_file(
            &file.path,
            plan.header_line,
            file.nominal_bytes,
            plan.plan_id,
            file.index,
            plan.verify_positions_per_file,
        ) {
            Ok((header_ok, samples)) => {
                file.header_ok = header_ok;
                file.verify_samples = samples;
                if !file.is_fully_verified() {
                    file.state = TestFileState::Failed;
                    *fatal = Some(CoreError::integrity_failure(
                        file.path.clone(),
                        "header or sample mismatch on final sweep",
                    ));
                    return;
                }
            }
            Err(error) => {
                file.state = TestFileState::Failed;
                *fatal = Some(error);
                return;
            }
        }
    }
}

fn finalize(
    plan: &TestPlan,
    files: Vec<TestFile>,
    baseline: BaselineStats,
    fatal: Option<CoreError>,
) -> TestReport {
    let all_verified = fatal.is_none() && files.iter().all(TestFile::is_fully_verified);

    let deleted = match plan.auto_delete {
        AutoDelete::DeleteAllOnSuccess if all_verified => {
            delete_all(&files);
            true
        }
        _ => false,
    };

    let outcomes = files
        .into_iter()
        .map(|file| FileOutcome {
            index: file.index,
            path: file.path,
            bytes: file.actual_bytes_written,
            duration: file.write_duration,
            state: Some(file.state),
            error: (file.state == TestFileState::Failed).then_some("verification failed".to_string()),
        })
        .collect();

    TestReport {
        target_path: plan.target_path.clone(),
        files: outcomes,
        baseline_mibs: baseline.frozen_mibs(),
        fatal,
        all_verified,
        partial_coverage: plan.partial_coverage,
        deleted,
    }
}

fn delete_all(files: &[TestFile]) {
    for file in files {
        let _ = fs::remove_file(&file.path);
    }
}

/// Checks the preconditions the Orchestrator requires before any file is
/// created: the target must be both readable and writable
/// ([`fdplatform::probe_read`]/[`fdplatform::probe_write`]), and free space
/// must meet the minimum floor.
///
/// # Errors
///
/// Returns [`CoreError::Precondition`] if any check fails.
pub fn check_preconditions(target_path: &Path, free_bytes: u64) -> Result<(), CoreError> {
    if free_bytes < fdcore::plan::MIN_FREE_BYTES {
        return Err(CoreError::precondition(format!(
            "only {free_bytes} bytes free, need at least {} MiB",
            fdcore::plan::MIN_FREE_BYTES / (1024 * 1024)
        )));
    }
    if !fdplatform::probe_read(target_path) {
        return Err(CoreError::precondition(format!(
            "{} is not readable",
            target_path.display()
        )));
    }
    if !fdplatform::probe_write(target_path) {
        return Err(CoreError::precondition(format!(
            "{} is not writable",
            target_path.display()
        )));
    }
    Ok(())
}
