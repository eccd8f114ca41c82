#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! The fake-capacity test engine: [`writer`] streams a test file's fixed
//! header and repeating pattern to disk, [`verifier`] reads back the header
//! plus a seeded sample of offsets, [`detector`] watches write speed against
//! a frozen baseline, and [`orchestrator`] sequences all three across a
//! whole [`fdcore::plan::TestPlan`]. [`clean`] sweeps the artefacts any of
//! the above leave behind.
//!
//! # Design
//!
//! The orchestrator is strictly sequential by design: files are written and
//! immediately verified one at a time, because concurrent writes would
//! perturb the very speed signal the detector is watching for. The parallel
//! worker pool used by the bulk-copy side of this workspace lives in
//! `fdrescue`, not here.
//!
//! # Invariants
//!
//! - [`orchestrator::run`] never deletes a test file unless every file
//!   reached [`fdcore::plan::TestFileState::Verified`] and the plan's
//!   [`fdcore::plan::AutoDelete`] policy is
//!   [`fdcore::plan::AutoDelete::DeleteAllOnSuccess`].
//! - A file's `write_duration` and `actual_bytes_written` are only
//!   meaningful once its state is past [`fdcore::plan::TestFileState::Writing`].

pub mod clean;
pub mod detector;
pub mod orchestrator;
pub mod verifier;
pub mod writer;
