//! Pure formatting helpers shared by every progress field. Kept free of any
//! writer so they can be unit-tested without capturing output.

use std::time::Duration;

/// Formats a byte count as a fixed-point MiB value, e.g. `12.3 MiB`.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    let mib = bytes as f64 / (1024.0 * 1024.0);
    format!("{mib:.1} MiB")
}

/// Formats a percentage of `done / total`, clamped to `[0, 100]`. Returns
/// `"  ?%"` if `total` is zero.
#[must_use]
pub fn format_percent(done: u64, total: u64) -> String {
    if total == 0 {
        return "  ?%".to_string();
    }
    let pct = (done as f64 / total as f64 * 100.0).clamp(0.0, 100.0);
    format!("{pct:>3.0}%")
}

/// Formats a throughput rate in MiB/s over `elapsed`. Returns `"-- MiB/s"` if
/// elapsed is zero.
#[must_use]
pub fn format_rate(bytes: u64, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return "-- MiB/s".to_string();
    }
    let mibs = bytes as f64 / (1024.0 * 1024.0) / secs;
    format!("{mibs:.1} MiB/s")
}

/// Formats an elapsed duration as `H:MM:SS`.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}

/// Estimates remaining time from bytes done, total bytes, and elapsed time.
/// Returns `None` if no meaningful rate has been established yet.
#[must_use]
pub fn estimate_remaining(done: u64, total: u64, elapsed: Duration) -> Option<Duration> {
    if done == 0 || elapsed.as_secs_f64() <= 0.0 || total <= done {
        return None;
    }
    let rate = done as f64 / elapsed.as_secs_f64();
    let remaining_bytes = (total - done) as f64;
    Some(Duration::from_secs_f64(remaining_bytes / rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_renders_mib() {
        assert_eq!(format_bytes(10 * 1024 * 1024), "10.0 MiB");
    }

    #[test]
    fn format_percent_clamps_and_handles_zero_total() {
        assert_eq!(format_percent(50, 100), " 50%");
        assert_eq!(format_percent(0, 0), "  ?%");
    }

    #[test]
    fn format_elapsed_pads_minutes_and_seconds() {
        assert_eq!(format_elapsed(Duration::from_secs(65)), "0:01:05");
        assert_eq!(format_elapsed(Duration::from_secs(3665)), "1:01:05");
    }

    #[test]
    fn estimate_remaining_is_none_with_no_progress() {
        assert!(estimate_remaining(0, 100, Duration::from_secs(1)).is_none());
    }

    #[test]
    fn estimate_remaining_scales_with_rate() {
        let remaining = estimate_remaining(50, 100, Duration::from_secs(10)).unwrap();
        assert!((remaining.as_secs_f64() - 10.0).abs() < 0.01);
    }
}
