//! Renders a finished [`TestReport`]/[`DeletionReport`]/[`CopyReport`] as the
//! plain-text summary the front end prints to stdout once a run completes.

use std::io::{self, Write};

use fdcore::plan::TestFileState;
use fdcore::report::{CopyReport, DeletionReport, TestReport};

/// Prints the final multiline summary for a `test`/`fill` run.
pub fn render_test_report(out: &mut impl Write, report: &TestReport) -> io::Result<()> {
    writeln!(out, "target: {}", report.target_path.display())?;
    writeln!(out, "files verified: {}/{}", report.verified_count(), report.files.len())?;
    if let Some(baseline) = report.baseline_mibs {
        writeln!(out, "baseline speed: {baseline:.2} MiB/s")?;
    }
    if let Some(mean) = report.observed_mean_mibs() {
        writeln!(out, "observed mean speed: {mean:.2} MiB/s")?;
    }
    if report.partial_coverage {
        writeln!(out, "note: free space was too small to give every file its full share")?;
    }
    if report.deleted {
        writeln!(out, "test files removed (delete-on-success)")?;
    }
    if let Some(fatal) = &report.fatal {
        writeln!(out, "result: {fatal} [{}]", report.exit_code())?;
    } else if report.all_verified {
        writeln!(out, "result: {}", report.exit_code())?;
    } else {
        let failing = report
            .files
            .iter()
            .find(|f| f.state != Some(TestFileState::Verified));
        if let Some(file) = failing {
            writeln!(out, "result: first unverified file {}", file.path.display())?;
        }
        writeln!(out, "result: {}", report.exit_code())?;
    }
    Ok(())
}

/// Prints the final summary for a `clean` run.
pub fn render_deletion_report(out: &mut impl Write, report: &DeletionReport) -> io::Result<()> {
    writeln!(out, "target: {}", report.target_path.display())?;
    writeln!(out, "removed: {}", report.removed.len())?;
    for (path, reason) in &report.failed {
        writeln!(out, "failed: {} ({reason})", path.display())?;
    }
    writeln!(out, "result: {}", report.exit_code())
}

/// Prints the final summary for a `copy` run.
pub fn render_copy_report(out: &mut impl Write, report: &CopyReport) -> io::Result<()> {
    writeln!(out, "source: {}", report.source_root.display())?;
    writeln!(out, "target: {}", report.target_root.display())?;
    writeln!(out, "files copied: {}", report.files.iter().filter(|f| f.succeeded()).count())?;
    writeln!(out, "bytes copied: {}", report.total_bytes())?;
    if !report.skipped.is_empty() {
        writeln!(out, "skipped: {}", report.skipped.len())?;
    }
    if report.downgraded_to_safe {
        writeln!(out, "note: downgraded to safe mode after a hardware-class fault")?;
    }
    if let Some(fatal) = &report.fatal {
        writeln!(out, "result: {fatal} [{}]", report.exit_code())?;
    } else {
        writeln!(out, "result: {}", report.exit_code())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn deletion_report_renders_removed_count() {
        let report = DeletionReport {
            target_path: PathBuf::from("/mnt/usb"),
            removed: vec![PathBuf::from("/mnt/usb/FILL_001_01000000.tmp")],
            failed: vec![],
        };
        let mut buf = Vec::new();
        render_deletion_report(&mut buf, &report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("removed: 1"));
        assert!(text.contains("result:"));
    }

    #[test]
    fn copy_report_renders_skip_count() {
        let report = CopyReport {
            source_root: PathBuf::from("/src"),
            target_root: PathBuf::from("/dst"),
            files: vec![],
            skipped: vec![PathBuf::from("/src/bad.bin")],
            downgraded_to_safe: false,
            fatal: None,
        };
        let mut buf = Vec::new();
        render_copy_report(&mut buf, &report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("skipped: 1"));
    }
}
