#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! A small verbosity model (`-v`/`-vv`/`-q`) bridged onto [`tracing`], plus
//! an in-process event sink so tests can assert on what would have been
//! logged without scraping stderr.
//!
//! # Design
//!
//! [`VerbosityConfig`] maps a CLI verbosity count and a quiet flag onto a
//! [`tracing::Level`] floor. [`init`] installs a `tracing-subscriber`
//! `fmt` subscriber at that floor; it also registers a process-wide test
//! sink ([`TestSink`]) that mirrors every event emitted through
//! [`log_info`]/[`log_debug`]/[`log_warn`] so [`drain_events`] can return
//! them in a test without depending on the global subscriber's output
//! stream.
//!
//! # Invariants
//!
//! - `init` may be called more than once within a process (each test binary
//!   links one copy of this crate); later calls update the floor but never
//!   panic on an already-installed global subscriber.
//! - [`drain_events`] always returns events in emission order and clears the
//!   sink.
//!
//! # Errors
//!
//! This crate has no fallible operations; degraded subscriber installation
//! (e.g. in a process that already set one) is handled silently since
//! logging is diagnostic, not load-bearing.

use std::sync::{Mutex, OnceLock};

use tracing::Level;

/// The verbosity floor resolved from CLI flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// `-q`: only warnings and errors.
    Quiet,
    /// Default: informational progress and summary lines.
    Normal,
    /// `-v`: per-file operational detail.
    Verbose,
    /// `-vv` or higher: internal state useful for diagnosing this crate.
    Debug,
}

impl Verbosity {
    fn as_level(self) -> Level {
        match self {
            Self::Quiet => Level::WARN,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::INFO,
            Self::Debug => Level::DEBUG,
        }
    }
}

/// Resolved logging configuration: how verbose to be, and whether to color
/// or timestamp output the way a terminal session expects.
#[derive(Clone, Copy, Debug)]
pub struct VerbosityConfig {
    /// The resolved verbosity floor.
    pub verbosity: Verbosity,
}

impl VerbosityConfig {
    /// Resolves a config from a `-v` repeat count and a `-q` flag. `quiet`
    /// wins over any verbose count; `verbose_count` of 0 is [`Verbosity::Normal`],
    /// 1 is [`Verbosity::Verbose`], 2 or more is [`Verbosity::Debug`].
    #[must_use]
    pub fn from_flags(verbose_count: u8, quiet: bool) -> Self {
        let verbosity = if quiet {
            Verbosity::Quiet
        } else {
            match verbose_count {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Debug,
            }
        };
        Self { verbosity }
    }
}

impl Default for VerbosityConfig {
    fn default() -> Self {
        Self::from_flags(0, false)
    }
}

fn test_sink() -> &'static Mutex<Vec<String>> {
    static SINK: OnceLock<Mutex<Vec<String>>> = OnceLock::new();
    SINK.get_or_init(|| Mutex::new(Vec::new()))
}

/// Installs a process-wide `tracing-subscriber` at `config`'s floor. Safe to
/// call more than once; later calls are ignored if a global subscriber is
/// already installed (tracing only allows one).
pub fn init(config: VerbosityConfig) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(config.verbosity.as_level())
        .with_target(false)
        .try_init();
}

/// Clears and returns every event recorded since the last drain, in
/// emission order.
pub fn drain_events() -> Vec<String> {
    let mut guard = test_sink().lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    std::mem::take(&mut guard)
}

fn record(line: String) {
    test_sink()
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .push(line);
}

/// Emits an informational line: routed to `tracing::info!` and mirrored
/// into the test sink.
pub fn log_info(message: &str) {
    tracing::info!("{message}");
    record(format!("INFO {message}"));
}

/// Emits a per-file operational detail line, intended for `-v` and above.
pub fn log_verbose(message: &str) {
    tracing::info!(target: "verbose", "{message}");
    record(format!("VERBOSE {message}"));
}

/// Emits a warning line: routed to `tracing::warn!` and mirrored into the
/// test sink. Warnings are never suppressed by [`Verbosity::Quiet`].
pub fn log_warn(message: &str) {
    tracing::warn!("{message}");
    record(format!("WARN {message}"));
}

/// Emits a debug line, intended for `-vv` and above.
pub fn log_debug(message: &str) {
    tracing::debug!("{message}");
    record(format!("DEBUG {message}"));
}
