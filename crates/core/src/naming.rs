//! File-naming conventions for test artefacts, and the predicates `clean`
//! uses to recognise them.

use time::OffsetDateTime;

/// Zero-padded `DDHHMMSS` stamp for the start of a plan, using local time
/// when available and falling back to UTC (mirrors `time`'s own fallback).
#[must_use]
pub fn plan_timestamp(now: OffsetDateTime) -> String {
    format!(
        "{:02}{:02}{:02}{:02}",
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// Builds the `FILL_<NNN>_<DDHHMMSS>.tmp` name for file `index` (1-based) of
/// a plan started at `stamp`.
#[must_use]
pub fn test_file_name(index: u32, stamp: &str) -> String {
    format!("FILL_{index:03}_{stamp}.tmp")
}

/// `true` if `name` looks like a test file this engine created, in any run.
#[must_use]
pub fn is_test_file_name(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("FILL_") else {
        return false;
    };
    let Some(rest) = rest.strip_suffix(".tmp") else {
        return false;
    };
    let mut parts = rest.splitn(2, '_');
    let Some(index) = parts.next() else {
        return false;
    };
    let Some(stamp) = parts.next() else {
        return false;
    };
    index.len() == 3
        && index.bytes().all(|b| b.is_ascii_digit())
        && stamp.len() == 8
        && stamp.bytes().all(|b| b.is_ascii_digit())
}

/// `true` if `name` is one of the speed-test artefact families that `clean`
/// also sweeps, even though they are produced by tooling outside this crate.
#[must_use]
pub fn is_speedtest_artifact_name(name: &str) -> bool {
    let candidates = ["speedtest_", "speedtest_download_"];
    candidates.iter().any(|prefix| {
        name.strip_prefix(prefix)
            .is_some_and(|rest| rest.ends_with(".txt"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_is_zero_padded() {
        assert_eq!(test_file_name(7, "15142233"), "FILL_007_15142233.tmp");
        assert_eq!(test_file_name(100, "01000000"), "FILL_100_01000000.tmp");
    }

    #[test]
    fn recognises_its_own_names() {
        assert!(is_test_file_name("FILL_001_01000000.tmp"));
        assert!(is_test_file_name("FILL_100_31235959.tmp"));
    }

    #[test]
    fn rejects_unrelated_names() {
        assert!(!is_test_file_name("FILL_1_01000000.tmp"));
        assert!(!is_test_file_name("fill_001_01000000.tmp"));
        assert!(!is_test_file_name("FILL_001_01000000.txt"));
        assert!(!is_test_file_name("readme.md"));
    }

    #[test]
    fn recognises_speedtest_artifact_families() {
        assert!(is_speedtest_artifact_name("speedtest_100_1700000000.txt"));
        assert!(is_speedtest_artifact_name(
            "speedtest_download_100_1700000000.txt"
        ));
        assert!(!is_speedtest_artifact_name("speedtest_100.csv"));
    }
}
