#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! A process-wide cancellation coordinator. Every long-running operation in
//! this workspace polls [`is_cancelled`] between files rather than threading
//! a cancellation token through every call, and registers cleanup through
//! [`CleanupRegistry::global`] so a Ctrl+C mid-write still removes partial
//! test files.
//!
//! # Design
//!
//! [`install`] arms a SIGINT/SIGTERM handler via `signal-hook`'s flag
//! registration (no signal-unsafe work happens on the signal thread itself —
//! it only flips an [`std::sync::atomic::AtomicBool`]). The first signal
//! requests graceful [`CancelReason::Interrupted`] cancellation; a second
//! escalates to [`request_abort`], which callers should treat as "stop
//! immediately, skip further flushes". [`CleanupRegistry`] holds a LIFO stack
//! of callbacks plus a set of temp-file paths, so the most recently
//! registered guard unwinds first, matching ordinary `Drop` order.
//!
//! # Invariants
//!
//! - [`request_cancel`] is idempotent: calling it twice with different
//!   reasons keeps the first reason.
//! - [`request_abort`] can be set independently of [`request_cancel`].
//! - [`CleanupRegistry::cleanup`] runs every registered callback exactly
//!   once, even if a callback panics (subsequent callbacks still run).
//!
//! # Errors
//!
//! [`install`] returns [`fdcore::error::CoreError::HardwareClass`] if the
//! underlying OS signal registration fails.
//!
//! # Examples
//!
//! ```
//! fdinterrupt::reset_for_testing();
//! assert!(!fdinterrupt::is_cancelled());
//! fdinterrupt::request_cancel(fdinterrupt::CancelReason::UserRequested);
//! assert!(fdinterrupt::is_cancelled());
//! ```

use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Mutex, OnceLock};

use fdcore::error::CoreError;
use fdcore::exit_code::ExitCode;

static CANCEL_REQUESTED: AtomicBool = AtomicBool::new(false);
static ABORT_REQUESTED: AtomicBool = AtomicBool::new(false);
static CANCEL_REASON: AtomicU8 = AtomicU8::new(0);

/// Why an operation was asked to stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CancelReason {
    /// SIGINT observed.
    Interrupted = 1,
    /// SIGTERM observed.
    Terminated = 2,
    /// SIGHUP observed (controlling terminal closed).
    HangUp = 3,
    /// A caller requested cancellation programmatically, not via a signal.
    UserRequested = 4,
}

impl CancelReason {
    const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Interrupted),
            2 => Some(Self::Terminated),
            3 => Some(Self::HangUp),
            4 => Some(Self::UserRequested),
            _ => None,
        }
    }

    /// The exit code this reason maps to when it is the sole cause of a
    /// non-zero exit.
    #[must_use]
    pub const fn exit_code(self) -> ExitCode {
        match self {
            Self::UserRequested => ExitCode::Ok,
            Self::Interrupted | Self::Terminated | Self::HangUp => ExitCode::Cancelled,
        }
    }

    /// A one-line human description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Interrupted => "interrupted by Ctrl+C",
            Self::Terminated => "terminated by SIGTERM",
            Self::HangUp => "controlling terminal closed",
            Self::UserRequested => "cancelled by request",
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// `true` once any cancellation has been requested, by signal or by code.
#[must_use]
pub fn is_cancelled() -> bool {
    CANCEL_REQUESTED.load(Ordering::SeqCst)
}

/// `true` once a second cancellation signal has escalated to an immediate stop.
#[must_use]
pub fn is_abort_requested() -> bool {
    ABORT_REQUESTED.load(Ordering::SeqCst)
}

/// The reason cancellation was requested, if any.
#[must_use]
pub fn cancel_reason() -> Option<CancelReason> {
    CancelReason::from_tag(CANCEL_REASON.load(Ordering::SeqCst))
}

/// Requests cancellation. The first call wins; later calls with a different
/// reason do not overwrite it, but a second call of any kind after the first
/// escalates to [`request_abort`].
pub fn request_cancel(reason: CancelReason) {
    let already = CANCEL_REQUESTED.swap(true, Ordering::SeqCst);
    if already {
        request_abort();
        return;
    }
    CANCEL_REASON.store(reason as u8, Ordering::SeqCst);
}

/// Requests an immediate stop, independent of the graceful cancellation flag.
pub fn request_abort() {
    ABORT_REQUESTED.store(true, Ordering::SeqCst);
}

/// Clears all cancellation state. Test-only: production code never needs to
/// un-cancel a process.
pub fn reset_for_testing() {
    CANCEL_REQUESTED.store(false, Ordering::SeqCst);
    ABORT_REQUESTED.store(false, Ordering::SeqCst);
    CANCEL_REASON.store(0, Ordering::SeqCst);
    CleanupRegistry::global().clear_for_testing();
}

type CleanupCallback = Box<dyn FnMut() + Send>;

/// Holds cleanup callbacks and temp-file guards so cancellation still leaves
/// the target directory clean.
pub struct CleanupRegistry {
    callbacks: Mutex<Vec<CleanupCallback>>,
    temp_files: Mutex<Vec<PathBuf>>,
}

impl CleanupRegistry {
    /// The process-wide registry.
    #[must_use]
    pub fn global() -> &'static Self {
        static INSTANCE: OnceLock<CleanupRegistry> = OnceLock::new();
        INSTANCE.get_or_init(|| Self {
            callbacks: Mutex::new(Vec::new()),
            temp_files: Mutex::new(Vec::new()),
        })
    }

    /// Registers a callback to run on the next [`CleanupRegistry::cleanup`].
    /// Callbacks run LIFO: the most recently registered runs first.
    pub fn register_cleanup(&self, callback: CleanupCallback) {
        self.callbacks.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(callback);
    }

    /// Registers a path to be removed on the next
    /// [`CleanupRegistry::cleanup_temp_files`], if it still exists.
    pub fn register_temp_file(&self, path: PathBuf) {
        self.temp_files.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(path);
    }

    /// Unregisters a path, typically because the operation that created it
    /// finished successfully and the file should survive.
    pub fn unregister_temp_file(&self, path: &Path) {
        let mut guard = self.temp_files.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.retain(|p| p != path);
    }

    /// Number of temp files currently tracked.
    #[must_use]
    pub fn temp_file_count(&self) -> usize {
        self.temp_files.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    /// Removes every tracked temp file from disk, best-effort, then clears
    /// the tracking list.
    pub fn cleanup_temp_files(&self) {
        let mut guard = self.temp_files.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for path in guard.drain(..) {
            let _ = fs::remove_file(&path);
        }
    }

    /// Runs every registered cleanup callback (LIFO) and then
    /// [`CleanupRegistry::cleanup_temp_files`]. A callback that panics does
    /// not stop the remaining callbacks from running.
    pub fn cleanup(&self) {
        let callbacks = {
            let mut guard = self.callbacks.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            std::mem::take(&mut *guard)
        };
        for mut callback in callbacks.into_iter().rev() {
            let _ = panic::catch_unwind(AssertUnwindSafe(|| callback()));
        }
        self.cleanup_temp_files();
    }

    fn clear_for_testing(&self) {
        self.callbacks.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clear();
        self.temp_files.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clear();
    }
}

/// A RAII guard that registers a path as a temp file on creation. Dropping it
/// without calling [`TempFileGuard::disarm`] first removes the file
/// immediately, the same outcome a later [`CleanupRegistry::cleanup_temp_files`]
/// would have produced; [`TempFileGuard::disarm`] is how a caller tells the
/// guard the file is known-good and should survive the drop.
pub struct TempFileGuard {
    path: PathBuf,
    disarmed: bool,
}

impl TempFileGuard {
    /// Registers `path` with the global [`CleanupRegistry`].
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        CleanupRegistry::global().register_temp_file(path.clone());
        Self { path, disarmed: false }
    }

    /// Unregisters the path without removing it: call this once the file is
    /// known-good and should survive process exit.
    pub fn disarm(&mut self) {
        if !self.disarmed {
            CleanupRegistry::global().unregister_temp_file(&self.path);
            self.disarmed = true;
        }
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.disarmed {
            return;
        }
        CleanupRegistry::global().unregister_temp_file(&self.path);
        let _ = fs::remove_file(&self.path);
    }
}

/// Installs SIGINT/SIGTERM/SIGHUP handlers that call [`request_cancel`], and
/// registers a second-signal escalation to [`request_abort`]. Returns an
/// error only if the underlying OS registration fails.
///
/// # Errors
///
/// Returns [`CoreError::HardwareClass`] if `signal-hook` could not register
/// a handler for a given signal number.
#[cfg(unix)]
pub fn install() -> Result<(), CoreError> {
    use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::flag;
    use std::sync::Arc;

    let interrupted = Arc::new(AtomicBool::new(false));
    flag::register(SIGINT, Arc::clone(&interrupted))
        .map_err(|e| CoreError::HardwareClass { detail: format!("SIGINT registration failed: {e}") })?;
    let terminated = Arc::new(AtomicBool::new(false));
    flag::register(SIGTERM, Arc::clone(&terminated))
        .map_err(|e| CoreError::HardwareClass { detail: format!("SIGTERM registration failed: {e}") })?;
    let hungup = Arc::new(AtomicBool::new(false));
    flag::register(SIGHUP, Arc::clone(&hungup))
        .map_err(|e| CoreError::HardwareClass { detail: format!("SIGHUP registration failed: {e}") })?;

    std::thread::spawn(move || loop {
        if interrupted.swap(false, Ordering::SeqCst) {
            request_cancel(CancelReason::Interrupted);
        }
        if terminated.swap(false, Ordering::SeqCst) {
            request_cancel(CancelReason::Terminated);
        }
        if hungup.swap(false, Ordering::SeqCst) {
            request_cancel(CancelReason::HangUp);
        }
        if is_abort_requested() {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    });

    Ok(())
}

/// Non-Unix fallback: cancellation can still be requested programmatically
/// via [`request_cancel`], but no OS signal handler is installed.
#[cfg(not(unix))]
pub fn install() -> Result<(), CoreError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn cancel_request_is_idempotent_for_the_reason() {
        reset_for_testing();
        request_cancel(CancelReason::Interrupted);
        assert_eq!(cancel_reason(), Some(CancelReason::Interrupted));
        // A second, different request should not change the recorded reason...
        request_cancel(CancelReason::Terminated);
        assert_eq!(cancel_reason(), Some(CancelReason::Interrupted));
        // ...but should escalate to abort.
        assert!(is_abort_requested());
    }

    #[test]
    fn abort_can_be_set_independently() {
        reset_for_testing();
        request_abort();
        assert!(is_abort_requested());
        assert!(!is_cancelled());
    }

    #[test]
    fn cleanup_registry_tracks_and_removes_temp_files() {
        reset_for_testing();
        let dir = tempfile::tempdir().unwrap();
        let registry = CleanupRegistry::global();
        let paths: Vec<_> = (0..3)
            .map(|i| {
                let path = dir.path().join(format!("temp_{i}.tmp"));
                fs::write(&path, b"data").unwrap();
                path
            })
            .collect();

        let before = registry.temp_file_count();
        for path in &paths {
            registry.register_temp_file(path.clone());
        }
        assert_eq!(registry.temp_file_count(), before + 3);

        registry.unregister_temp_file(&paths[0]);
        registry.cleanup_temp_files();

        assert!(paths[0].exists());
        assert!(!paths[1].exists());
        assert!(!paths[2].exists());
    }

    #[test]
    fn cleanup_runs_callbacks_lifo() {
        reset_for_testing();
        let order = Arc::new(Mutex::new(Vec::new()));
        let registry = CleanupRegistry::global();

        let a = Arc::clone(&order);
        registry.register_cleanup(Box::new(move || a.lock().unwrap().push(1)));
        let b = Arc::clone(&order);
        registry.register_cleanup(Box::new(move || b.lock().unwrap().push(2)));

        registry.cleanup();
        assert_eq!(*order.lock().unwrap(), vec![2, 1]);
    }

    #[test]
    fn temp_file_guard_unregisters_on_disarm() {
        reset_for_testing();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guarded.tmp");
        fs::write(&path, b"data").unwrap();

        let mut guard = TempFileGuard::new(path.clone());
        assert_eq!(CleanupRegistry::global().temp_file_count(), 1);
        guard.disarm();
        assert_eq!(CleanupRegistry::global().temp_file_count(), 0);

        CleanupRegistry::global().cleanup_temp_files();
        assert!(path.exists());
    }

    #[test]
    fn temp_file_guard_removes_on_drop_without_disarm() {
        reset_for_testing();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unguarded.tmp");
        fs::write(&path, b"data").unwrap();

        {
            let _guard = TempFileGuard::new(path.clone());
        }
        CleanupRegistry::global().cleanup_temp_files();
        assert!(!path.exists());
    }
}
