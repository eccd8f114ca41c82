#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `fdcore` holds the domain model shared by every operation this workspace
//! exposes: the fixed test-file pattern, the file-naming convention, the
//! `TestPlan`/`TestFile`/`BaselineStats` types a capacity test walks through,
//! the `CopyJob` a bulk copy runs under, the `Report` family rendered at the
//! end of a run, and the closed [`error::CoreError`] taxonomy everything
//! above reports through.
//!
//! # Design
//!
//! Nothing in this crate touches a filesystem or a clock beyond taking an
//! [`time::OffsetDateTime`] as an argument. [`plan`] and [`report`] are pure
//! data plus the arithmetic needed to interpret it; the engines in
//! `fdengine` and `fdrescue` are what actually open files. This split keeps
//! the plan/report types trivially testable and keeps every exit-code
//! decision in one place ([`error::CoreError::exit_code`]).
//!
//! # Invariants
//!
//! - Every [`error::CoreError`] variant maps to exactly one [`exit_code::ExitCode`].
//! - [`plan::TestPlan::bytes_for`] never returns less than [`plan::MIN_FILE_BYTES`].
//! - [`pattern::expected_pattern_slice`] is a pure function: the same
//!   `(file_offset, len, header_len)` always produces the same bytes,
//!   independent of call order.
//!
//! # Errors
//!
//! See [`error::CoreError`] for the full taxonomy and [`exit_code::ExitCode`]
//! for how each variant surfaces as a process exit status.
//!
//! # Examples
//!
//! ```
//! use fdcore::plan::{AutoDelete, TestPlan};
//! use std::path::PathBuf;
//! use time::OffsetDateTime;
//!
//! let started = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
//! let plan = TestPlan::new(PathBuf::from("/mnt/usb"), 1_000 * 1024 * 1024, AutoDelete::default(), started);
//! assert_eq!(plan.file_count, 100);
//! ```

pub mod config;
pub mod error;
pub mod exit_code;
pub mod naming;
pub mod pattern;
pub mod plan;
pub mod report;
