//! Bulk-copy supervisor (C10): walks the source tree, mirrors directories,
//! dispatches files to a worker pool sized by the job's mode, and handles
//! skip-list/damage-log bookkeeping in Rescue mode.

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{bounded, Receiver};
use fdcore::error::CoreError;
use fdcore::plan::{CopyJob, CopyMode};
use fdcore::report::{CopyReport, FileOutcome};
use fdinterrupt::is_cancelled;
use fdskiplist::{DamageLog, DamageReason, SkipList};

use crate::copier::{classify_copy_error, copy_file};
use crate::walker::{walk, WalkEntry};

/// Runs `job` to completion. Walks the source tree once, mirrors its
/// directory structure at the target, and copies every file, downgrading
/// one-way to Safe mode if a hardware-class fault is observed mid-run.
pub fn run(job: &CopyJob) -> CopyReport {
    tracing::info!(
        source = %job.source_root.display(),
        target = %job.target_root.display(),
        mode = ?job.mode,
        workers = job.max_concurrent_files,
        "starting bulk copy"
    );

    let (entries, dirs) = match walk(&job.source_root) {
        Ok(v) => v,
        Err(error) => {
            return CopyReport {
                source_root: job.source_root.clone(),
                target_root: job.target_root.clone(),
                files: Vec::new(),
                skipped: Vec::new(),
                downgraded_to_safe: false,
                fatal: Some(error),
            };
        }
    };

    if let Err(error) = mirror_directories(job, &dirs) {
        return CopyReport {
            source_root: job.source_root.clone(),
            target_root: job.target_root.clone(),
            files: Vec::new(),
            skipped: Vec::new(),
            downgraded_to_safe: false,
            fatal: Some(error),
        };
    }

    let downgrade_requested = Arc::new(AtomicBool::new(false));
    let (outcomes, skipped) = dispatch(job, &entries, &downgrade_requested);
    let downgraded = downgrade_requested.load(Ordering::SeqCst);

    tracing::info!(
        source = %job.source_root.display(),
        files_copied = outcomes.iter().filter(|o| o.succeeded()).count(),
        skipped = skipped.len(),
        downgraded_to_safe = downgraded,
        "bulk copy finished"
    );

    CopyReport {
        source_root: job.source_root.clone(),
        target_root: job.target_root.clone(),
        files: outcomes,
        skipped,
        downgraded_to_safe: downgraded,
        fatal: None,
    }
}

fn mirror_directories(job: &CopyJob, dirs: &[PathBuf]) -> Result<(), CoreError> {
    fs::create_dir_all(&job.target_root)
        .map_err(|e| CoreError::io("create target root", &job.target_root, e))?;
    for relative in dirs {
        let target = job.target_root.join(relative);
        fs::create_dir_all(&target).map_err(|e| CoreError::io("mirror directory", &target, e))?;
    }
    Ok(())
}

fn dispatch(
    job: &CopyJob,
    entries: &[WalkEntry],
    downgrade_requested: &Arc<AtomicBool>,
) -> (Vec<FileOutcome>, Vec<PathBuf>) {
    let worker_count = job.max_concurrent_files.max(1);
    let (sender, receiver) = bounded::<(u32, WalkEntry)>(entries.len().max(1));
    for (index, entry) in entries.iter().enumerate() {
        let _ = sender.send((index as u32 + 1, entry.clone()));
    }
    drop(sender);

    let mut handles = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let receiver: Receiver<(u32, WalkEntry)> = receiver.clone();
        let job = job.clone();
        let downgrade_requested = Arc::clone(downgrade_requested);
        handles.push(std::thread::spawn(move || {
            worker_loop(&job, receiver, &downgrade_requested)
        }));
    }

    let mut outcomes = Vec::with_capacity(entries.len());
    let mut skipped = Vec::new();
    for handle in handles {
        if let Ok((mut worker_outcomes, mut worker_skipped)) = handle.join() {
            outcomes.append(&mut worker_outcomes);
            skipped.append(&mut worker_skipped);
        }
    }

    if downgrade_requested.load(Ordering::SeqCst) && job.mode != CopyMode::Safe {
        let done: std::collections::HashSet<_> = outcomes.iter().map(|o| o.path.clone()).collect();
        let remaining: Vec<_> = entries.iter().filter(|e| !done.contains(&e.source_path)).collect();
        let safe_job = job.downgraded_to_safe();
        let (mut safe_outcomes, mut safe_skipped) =
            copy_sequentially(&safe_job, &remaining, outcomes.len() as u32);
        outcomes.append(&mut safe_outcomes);
        skipped.append(&mut safe_skipped);
    }

    outcomes.sort_by_key(|o| o.index);
    (outcomes, skipped)
}

/// Copies `entries` one at a time under `job` (always Safe mode by the time
/// this is called), used to finish a run after a one-way downgrade.
fn copy_sequentially(
    job: &CopyJob,
    entries: &[&WalkEntry],
    index_offset: u32,
) -> (Vec<FileOutcome>, Vec<PathBuf>) {
    let mut outcomes = Vec::with_capacity(entries.len());
    let mut skipped = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        if is_cancelled() {
            break;
        }
        let target_path = job.target_root.join(&entry.relative_path);
        let started = Instant::now();
        match copy_file(&entry.source_path, &target_path, job.per_file_timeout, job.max_buffer_bytes, job.force_flush) {
            Ok(bytes) => outcomes.push(FileOutcome {
                index: index_offset + i as u32 + 1,
                path: entry.source_path.clone(),
                bytes,
                duration: started.elapsed(),
                state: None,
                error: None,
            }),
            Err(error) => {
                skipped.push(entry.source_path.clone());
                outcomes.push(FileOutcome {
                    index: index_offset + i as u32 + 1,
                    path: entry.source_path.clone(),
                    bytes: 0,
                    duration: started.elapsed(),
                    state: None,
                    error: Some(error.to_string()),
                });
            }
        }
    }
    (outcomes, skipped)
}

/// Each worker opens its own handle onto the skip list and damage log.
/// This is only safe because Rescue mode forces `max_concurrent_files` to 1
/// ([`CopyJob::rescue`]); a single worker never races itself for the file
/// lock backing [`SkipList::record`].
fn worker_loop(
    job: &CopyJob,
    receiver: Receiver<(u32, WalkEntry)>,
    downgrade_requested: &Arc<AtomicBool>,
) -> (Vec<FileOutcome>, Vec<PathBuf>) {
    let mut outcomes = Vec::new();
    let mut skipped = Vec::new();
    let skip_list = (job.mode == CopyMode::Rescue)
        .then(|| SkipList::open(job.target_root.join("skip_files.list")).ok())
        .flatten();
    let damage_log = (job.mode == CopyMode::Rescue)
        .then(|| DamageLog::open(job.target_root.join("damaged_files.log")));

    while let Ok((index, entry)) = receiver.recv() {
        if is_cancelled() || downgrade_requested.load(Ordering::SeqCst) {
            break;
        }

        if let Some(skip_list) = &skip_list {
            if skip_list.contains(&entry.source_path) {
                tracing::debug!(path = %entry.source_path.display(), "already on skip list, not retrying");
                skipped.push(entry.source_path.clone());
                outcomes.push(FileOutcome {
                    index,
                    path: entry.source_path.clone(),
                    bytes: 0,
                    duration: std::time::Duration::ZERO,
                    state: None,
                    error: Some("skipped (skip list)".to_string()),
                });
                continue;
            }
        }

        let target_path = job.target_root.join(&entry.relative_path);
        let started = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            copy_file(
                &entry.source_path,
                &target_path,
                job.per_file_timeout,
                job.max_buffer_bytes,
                job.force_flush,
            )
        }));

        match result {
            Ok(Ok(bytes)) => outcomes.push(FileOutcome {
                index,
                path: entry.source_path.clone(),
                bytes,
                duration: started.elapsed(),
                state: None,
                error: None,
            }),
            Ok(Err(error)) => {
                if let (Some(skip_list), Some(damage_log)) = (&skip_list, &damage_log) {
                    let reason = classify_copy_error(&error);
                    if matches!(reason, DamageReason::Timeout | DamageReason::ReadError) {
                        let _ = skip_list.record(&entry.source_path);
                        skipped.push(entry.source_path.clone());
                        tracing::warn!(path = %entry.source_path.display(), ?reason, "recorded to skip list");
                    }
                    let _ = damage_log.record(reason, &entry.source_path, &error.to_string());
                }
                tracing::warn!(path = %entry.source_path.display(), %error, "copy failed");
                outcomes.push(FileOutcome {
                    index,
                    path: entry.source_path.clone(),
                    bytes: 0,
                    duration: started.elapsed(),
                    state: None,
                    error: Some(error.to_string()),
                });
            }
            Err(_panic) => {
                tracing::warn!(path = %entry.source_path.display(), "copy task panicked, downgrading to safe mode");
                downgrade_requested.store(true, Ordering::SeqCst);
                outcomes.push(FileOutcome {
                    index,
                    path: entry.source_path.clone(),
                    bytes: 0,
                    duration: started.elapsed(),
                    state: None,
                    error: Some(CoreError::HardwareClass {
                        detail: "panic caught at copy task boundary".to_string(),
                    }
                    .to_string()),
                });
                break;
            }
        }
    }

    (outcomes, skipped)
}
