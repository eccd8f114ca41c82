#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! The resilient bulk-copy core: a directory walker, a timed per-file
//! copier, and the Auto/Safe/Rescue supervisor that drives them across a
//! whole source tree.
//!
//! # Design
//!
//! [`walker::walk`] produces a deterministic, sorted file list once;
//! [`supervisor::run`] dispatches that list to a worker pool sized by the
//! job's [`fdcore::plan::CopyMode`] and drives [`copier::copy_file`] per
//! entry. A hardware-class fault (a panic caught at the copy task boundary)
//! triggers a one-way downgrade from Auto to Safe for the remainder of the
//! run; Rescue mode additionally consults and maintains a
//! [`fdskiplist::SkipList`] and [`fdskiplist::DamageLog`].
//!
//! # Invariants
//!
//! - Safe and Rescue modes always run with exactly one worker, so the
//!   skip list and damage log never need cross-thread synchronization.
//! - A downgrade to Safe mode is one-way: once triggered, no later file in
//!   the same run is attempted under Auto mode again.
//! - No partial file is ever visible at the destination; [`copier::copy_file`]
//!   always writes to a sibling temp file and renames on success only.
//!
//! # Errors
//!
//! Operations in this crate return [`fdcore::error::CoreError`]; per-file
//! failures are recorded in the returned [`fdcore::report::CopyReport`]
//! rather than aborting the whole run.

pub mod copier;
pub mod supervisor;
pub mod walker;
