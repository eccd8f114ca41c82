//! Process exit codes returned by the four core operations.
//!
//! Every [`crate::error::CoreError`] variant maps to exactly one [`ExitCode`],
//! so the CLI front end never has to re-derive a status from error text.

use std::fmt;

/// Exit codes returned by `test`, `fill`, `clean`, and `copy`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed and every invariant it checks held.
    Ok = 0,
    /// Generic verified failure, also used for the forced (second Ctrl+C) exit path.
    Failure = 1,
    /// Target failed a precondition (unreadable, unwritable, insufficient free space).
    Precondition = 2,
    /// Interrupt coordinator observed a first Ctrl+C / SIGTERM and cancelled gracefully.
    Cancelled = 3,
    /// A per-file deadline was exceeded.
    Timeout = 4,
    /// Header or sample mismatch during verification.
    IntegrityFailure = 5,
    /// Anomaly detector raised a speed-based fake-capacity verdict.
    SpeedAnomaly = 6,
    /// A lower layer reported an allocation failure, panic, or bounds fault.
    HardwareClass = 7,
    /// A single read/write syscall failed outside of the above categories.
    Io = 8,
}

impl ExitCode {
    /// Returns the raw process exit status.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// A short, stable, upper-snake-case name for log correlation.
    #[must_use]
    pub const fn code_name(self) -> &'static str {
        match self {
            Self::Ok => "FD_OK",
            Self::Failure => "FD_FAILURE",
            Self::Precondition => "FD_PRECONDITION",
            Self::Cancelled => "FD_CANCELLED",
            Self::Timeout => "FD_TIMEOUT",
            Self::IntegrityFailure => "FD_INTEGRITY_FAILURE",
            Self::SpeedAnomaly => "FD_SPEED_ANOMALY",
            Self::HardwareClass => "FD_HARDWARE_CLASS",
            Self::Io => "FD_IO",
        }
    }

    /// A human-readable description suitable for a trailing diagnostic line.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::Failure => "failure",
            Self::Precondition => "precondition not met",
            Self::Cancelled => "cancelled by user",
            Self::Timeout => "operation timed out",
            Self::IntegrityFailure => "data integrity check failed",
            Self::SpeedAnomaly => "speed anomaly suggests fake capacity",
            Self::HardwareClass => "hardware-class fault",
            Self::Io => "I/O error",
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::ExitCode;

    #[test]
    fn ok_is_zero() {
        assert_eq!(ExitCode::Ok.as_i32(), 0);
    }

    #[test]
    fn every_non_ok_code_is_nonzero() {
        let codes = [
            ExitCode::Failure,
            ExitCode::Precondition,
            ExitCode::Cancelled,
            ExitCode::Timeout,
            ExitCode::IntegrityFailure,
            ExitCode::SpeedAnomaly,
            ExitCode::HardwareClass,
            ExitCode::Io,
        ];
        for code in codes {
            assert_ne!(code.as_i32(), 0, "{code:?} should be non-zero");
        }
    }

    #[test]
    fn code_names_are_unique() {
        let codes = [
            ExitCode::Ok,
            ExitCode::Failure,
            ExitCode::Precondition,
            ExitCode::Cancelled,
            ExitCode::Timeout,
            ExitCode::IntegrityFailure,
            ExitCode::SpeedAnomaly,
            ExitCode::HardwareClass,
            ExitCode::Io,
        ];
        let mut names: Vec<_> = codes.iter().map(|c| c.code_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), codes.len());
    }
}
