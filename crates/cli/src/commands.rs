//! Dispatches a parsed [`crate::args::Command`] to the engine/rescue crates
//! and renders the resulting report.

use std::io::Write;

use fdcore::error::CoreError;
use fdcore::exit_code::ExitCode;
use fdprogress::ProgressMode;
use time::OffsetDateTime;

use crate::args::{Cli, Command};
use crate::render::{render_copy_report, render_deletion_report, render_test_report};

/// Runs the parsed command, writing progress/diagnostics to `stderr` and the
/// final report to `stdout`. Returns the process exit code.
pub fn dispatch(cli: &Cli, stdout: &mut impl Write, stderr: &mut impl Write) -> ExitCode {
    let progress_mode = fdprogress::resolve_mode(cli.no_progress, cli.quiet);

    match &cli.command {
        Command::Test { .. } | Command::Fill { .. } => run_test_or_fill(cli, progress_mode, stdout, stderr),
        Command::Clean { path } => {
            fdlogging::log_verbose(&format!("clean: sweeping {}", path.display()));
            let report = fdengine::clean::clean(path);
            let code = report.exit_code();
            fdlogging::log_info(&format!("clean: removed {} artefact(s)", report.removed.len()));
            let _ = render_deletion_report(stdout, &report);
            code
        }
        Command::Copy { .. } => run_copy(cli, stdout, stderr),
    }
}

fn run_test_or_fill(
    cli: &Cli,
    progress_mode: ProgressMode,
    stdout: &mut impl Write,
    stderr: &mut impl Write,
) -> ExitCode {
    let Some((request, size_mb)) = cli.command.test_request() else {
        unreachable!("run_test_or_fill only called for Test/Fill commands")
    };

    fdlogging::log_verbose(&format!("probing {}", request.target_path.display()));
    let probe = match fdplatform::probe(&request.target_path) {
        Ok(info) => info,
        Err(error) => {
            fdlogging::log_warn(&format!("probe failed: {error}"));
            return report_early_error(stderr, &error);
        }
    };

    let started_at = OffsetDateTime::now_utc();
    let plan = if let Some(size_mb) = size_mb {
        fdcore::plan::TestPlan::with_file_count(
            request.target_path.clone(),
            size_mb * 1024 * 1024,
            1,
            request.auto_delete.unwrap_or_default(),
            started_at,
        )
    } else {
        request.resolve(probe.free_bytes, started_at)
    };

    if let Err(error) = fdengine::orchestrator::check_preconditions(&plan.target_path, probe.free_bytes) {
        return report_early_error(stderr, &error);
    }

    let report = fdengine::orchestrator::run(&plan, progress_mode);
    let code = report.exit_code();
    let _ = render_test_report(stdout, &report);
    code
}

fn run_copy(cli: &Cli, stdout: &mut impl Write, stderr: &mut impl Write) -> ExitCode {
    let Some(request) = cli.command.copy_request() else {
        unreachable!("run_copy only called for the Copy command")
    };
    let mut job = request.resolve();
    if job.mode == fdcore::plan::CopyMode::Auto {
        match fdplatform::probe(&job.target_root) {
            Ok(info) => {
                fdlogging::log_verbose(&format!("target classified as {:?}", info.kind));
                job.max_buffer_bytes = info.kind.auto_buffer_bytes();
            }
            Err(error) => {
                fdlogging::log_warn(&format!("target probe failed: {error}"));
                return report_early_error(stderr, &error);
            }
        }
    }
    let report = fdrescue::supervisor::run(&job);
    let code = report.exit_code();
    if report.downgraded_to_safe {
        fdlogging::log_warn("copy downgraded to safe mode mid-run");
    }
    let _ = render_copy_report(stdout, &report);
    code
}

fn report_early_error(stderr: &mut impl Write, error: &CoreError) -> ExitCode {
    let _ = writeln!(stderr, "fd: {error} [{}]", error.code_name());
    error.exit_code()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser as _;
    use fdcore::exit_code::ExitCode;

    #[test]
    fn clean_on_empty_directory_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from(["fd", "clean", dir.path().to_str().unwrap()]);
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = dispatch(&cli, &mut stdout, &mut stderr);
        assert_eq!(code, ExitCode::Ok);
        assert!(stderr.is_empty());
    }

    #[test]
    fn fill_writes_one_file_of_the_requested_size() {
        fdinterrupt::reset_for_testing();
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from(["fd", "--no-progress", "fill", dir.path().to_str().unwrap(), "2"]);
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = dispatch(&cli, &mut stdout, &mut stderr);
        assert_eq!(code, ExitCode::Ok);
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn copy_in_auto_mode_classifies_the_target_before_copying() {
        fdinterrupt::reset_for_testing();
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("a.txt"), b"hello").unwrap();
        let cli = Cli::parse_from([
            "fd",
            "--no-progress",
            "copy",
            src.path().to_str().unwrap(),
            dst.path().to_str().unwrap(),
            "--mode",
            "auto",
        ]);
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = dispatch(&cli, &mut stdout, &mut stderr);
        assert_eq!(code, ExitCode::Ok);
        assert!(dst.path().join("a.txt").exists());
    }

    #[test]
    fn copy_mirrors_a_small_tree() {
        fdinterrupt::reset_for_testing();
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("a.txt"), b"hello").unwrap();
        let cli = Cli::parse_from([
            "fd",
            "--no-progress",
            "copy",
            src.path().to_str().unwrap(),
            dst.path().to_str().unwrap(),
        ]);
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = dispatch(&cli, &mut stdout, &mut stderr);
        assert_eq!(code, ExitCode::Ok);
        assert!(dst.path().join("a.txt").exists());
    }
}
