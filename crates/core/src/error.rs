//! Closed error-kind taxonomy shared by every long-running operation.
//!
//! Every engine (`fdcore::engine`, `rescue`) reports failures through
//! [`CoreError`] rather than ad-hoc [`std::io::Error`] values, so the CLI can
//! render a single diagnostic shape and map it to an exit code without
//! downcasting.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::exit_code::ExitCode;

/// A structured failure raised by the capacity-test engine or the rescue copier.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The target failed a precondition check (unreadable, unwritable, too little
    /// free space) before any file was created.
    #[error("precondition failed: {reason}")]
    Precondition {
        /// Human-readable explanation of which precondition failed.
        reason: String,
    },

    /// A single read or write call failed outside of a timeout or integrity check.
    #[error("I/O error during {action} on {path}: {source}")]
    Io {
        /// What the component was trying to do, e.g. `"write test file"`.
        action: &'static str,
        /// The path involved.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A per-file deadline elapsed before the copy completed.
    #[error("timed out after {duration:?} copying {path}")]
    Timeout {
        /// The configured deadline.
        duration: Duration,
        /// The file that was being copied.
        path: PathBuf,
    },

    /// A header or sample comparison failed during verification.
    #[error("integrity check failed for {path}: {detail}")]
    IntegrityFailure {
        /// The file that failed verification.
        path: PathBuf,
        /// What specifically mismatched.
        detail: String,
    },

    /// The anomaly detector raised a fake-capacity verdict.
    #[error("speed anomaly at {path}: {verdict}")]
    SpeedAnomaly {
        /// The file whose write speed triggered the verdict.
        path: PathBuf,
        /// The detector's verdict.
        verdict: SpeedVerdict,
    },

    /// The interrupt coordinator observed a cancellation request.
    #[error("operation cancelled")]
    Cancelled,

    /// A lower layer reported an allocation failure, a caught panic, or a
    /// bounds/arithmetic fault at a task boundary.
    #[error("hardware-class fault: {detail}")]
    HardwareClass {
        /// Free-text description of the fault, for the damage log.
        detail: String,
    },
}

/// The two fake-capacity verdicts the anomaly detector can raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeedVerdict {
    /// Write speed collapsed well below the frozen baseline.
    SpeedCollapse,
    /// Write speed implausibly exceeded the frozen baseline (phantom write).
    PhantomWrite,
}

impl fmt::Display for SpeedVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::SpeedCollapse => "speed collapse",
            Self::PhantomWrite => "phantom write",
        };
        write!(f, "{text}")
    }
}

impl CoreError {
    /// Convenience constructor for [`CoreError::Precondition`].
    pub fn precondition(reason: impl Into<String>) -> Self {
        Self::Precondition {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for [`CoreError::Io`].
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Convenience constructor for [`CoreError::Timeout`].
    pub fn timeout(duration: Duration, path: impl Into<PathBuf>) -> Self {
        Self::Timeout {
            duration,
            path: path.into(),
        }
    }

    /// Convenience constructor for [`CoreError::IntegrityFailure`].
    pub fn integrity_failure(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::IntegrityFailure {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Convenience constructor for [`CoreError::SpeedAnomaly`].
    pub fn speed_anomaly(path: impl Into<PathBuf>, verdict: SpeedVerdict) -> Self {
        Self::SpeedAnomaly {
            path: path.into(),
            verdict,
        }
    }

    /// The exit code this error kind maps to.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Precondition { .. } => ExitCode::Precondition,
            Self::Io { .. } => ExitCode::Io,
            Self::Timeout { .. } => ExitCode::Timeout,
            Self::IntegrityFailure { .. } => ExitCode::IntegrityFailure,
            Self::SpeedAnomaly { .. } => ExitCode::SpeedAnomaly,
            Self::Cancelled => ExitCode::Cancelled,
            Self::HardwareClass { .. } => ExitCode::HardwareClass,
        }
    }

    /// Stable upper-snake-case name, forwarded from [`ExitCode::code_name`].
    #[must_use]
    pub const fn code_name(&self) -> &'static str {
        self.exit_code().code_name()
    }

    /// `true` for the error kinds that should also be written to the damage log.
    #[must_use]
    pub const fn is_damage_worthy(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::Timeout { .. } | Self::IntegrityFailure { .. }
        )
    }

    /// The path this error concerns, if any. Used when recording skip/damage entries.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Io { path, .. }
            | Self::Timeout { path, .. }
            | Self::IntegrityFailure { path, .. }
            | Self::SpeedAnomaly { path, .. } => Some(path.as_path()),
            Self::Precondition { .. } | Self::Cancelled | Self::HardwareClass { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_maps_to_timeout_exit_code() {
        let error = CoreError::timeout(Duration::from_secs(10), "/mnt/usb/FILL_006.tmp");
        assert_eq!(error.exit_code(), ExitCode::Timeout);
        assert_eq!(error.code_name(), "FD_TIMEOUT");
    }

    #[test]
    fn speed_anomaly_carries_verdict_in_display() {
        let error = CoreError::speed_anomaly("/mnt/usb/FILL_004.tmp", SpeedVerdict::PhantomWrite);
        assert!(error.to_string().contains("phantom write"));
    }

    #[test]
    fn cancelled_has_no_path() {
        let error = CoreError::Cancelled;
        assert!(error.path().is_none());
    }

    #[test]
    fn io_error_is_damage_worthy_but_precondition_is_not() {
        let io_err = CoreError::io(
            "read test file",
            "/mnt/usb/FILL_001.tmp",
            io::Error::new(io::ErrorKind::TimedOut, "stalled"),
        );
        assert!(io_err.is_damage_worthy());

        let precondition = CoreError::precondition("free space below 100 MiB");
        assert!(!precondition.is_damage_worthy());
    }
}
