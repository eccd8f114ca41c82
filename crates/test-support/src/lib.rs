#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! Fixture helpers shared across the workspace's test suites: a small
//! directory-tree builder on top of [`tempfile`], and a fixed-clock helper
//! so tests that derive a [`fdcore::plan::PlanId`] or resolve a
//! [`fdcore::config::TestRequest`] never depend on the wall clock.
//!
//! # Design
//!
//! [`Sandbox`] wraps a [`tempfile::TempDir`] with helpers for writing files
//! and directories at relative paths, used by `fdrescue`/`fdengine`
//! integration-style tests that build small source trees. [`fixed_timestamp`]
//! replaces the ad hoc `fn now() -> OffsetDateTime` each crate used to define
//! locally for its own tests with one shared, deterministic value.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use time::OffsetDateTime;

/// A fixed point in time, used anywhere a test needs to pass a timestamp to
/// a constructor that would otherwise call the system clock (for example
/// [`fdcore::plan::TestPlan::new`]'s `stamp` argument).
#[must_use]
pub fn fixed_timestamp() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("valid fixed unix timestamp")
}

/// A scratch directory with helpers for building small file trees.
pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    /// Creates a fresh, empty temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created; acceptable in
    /// test code since there is no meaningful recovery.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create sandbox tempdir"),
        }
    }

    /// The sandbox's root path.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Resolves `relative` against the sandbox root without creating it.
    #[must_use]
    pub fn child(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Writes `contents` to `relative`, creating any parent directories.
    ///
    /// # Panics
    ///
    /// Panics if the write fails.
    pub fn write_file(&self, relative: &str, contents: &[u8]) -> PathBuf {
        let path = self.child(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directories");
        }
        fs::write(&path, contents).expect("write fixture file");
        path
    }

    /// Creates `relative` as a directory, including any parents.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    pub fn create_dir(&self, relative: &str) -> PathBuf {
        let path = self.child(relative);
        fs::create_dir_all(&path).expect("create fixture directory");
        path
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}
