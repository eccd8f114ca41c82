//! Command-line grammar (A4): `clap`'s derive API describes the four
//! subcommands and the global verbosity/progress flags.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use fdcore::config::{CopyRequest, TestRequest};
use fdcore::plan::AutoDelete;

/// `fd` — fake-capacity tester and resilient rescue-copy tool.
#[derive(Parser, Debug)]
#[command(name = "fd", version, about)]
pub struct Cli {
    /// Increase verbosity; repeat for more detail (`-v`, `-vv`).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Suppress everything but warnings and errors.
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
    /// Never render the live progress line, even on an interactive terminal.
    #[arg(long = "no-progress", global = true)]
    pub no_progress: bool,
    /// The operation to run.
    #[command(subcommand)]
    pub command: Command,
}

/// The cleanup policy a `test`/`fill` run applies to its own files.
#[derive(Args, Debug, Clone, Copy)]
pub struct KeepPolicy {
    /// Never delete test files, regardless of outcome.
    #[arg(long)]
    pub keep: bool,
    /// Keep test files whenever the run did not fully succeed (the default).
    #[arg(long = "keep-on-failure")]
    pub keep_on_failure: bool,
    /// Remove every test file once the run has fully verified.
    #[arg(long = "delete-on-success")]
    pub delete_on_success: bool,
}

impl KeepPolicy {
    /// Resolves the flags into an [`AutoDelete`], or `None` if no flag was
    /// given so the environment/default precedence in
    /// [`fdcore::config::TestRequest::resolve`] applies.
    #[must_use]
    pub fn resolve(self) -> Option<AutoDelete> {
        if self.delete_on_success {
            Some(AutoDelete::DeleteAllOnSuccess)
        } else if self.keep {
            Some(AutoDelete::KeepAll)
        } else if self.keep_on_failure {
            Some(AutoDelete::KeepOnFailure)
        } else {
            None
        }
    }
}

/// Bulk-copy execution mode, mirroring [`fdcore::plan::CopyMode`].
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// CPU-scaled concurrency, class-sized buffers.
    Auto,
    /// Single worker, small buffers, forced flush.
    Safe,
    /// Safe mode plus skip-list consultation and damage logging.
    Rescue,
}

/// The subcommand selected on the command line.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a full spread of test files across the target's free space,
    /// verifying each as it is written.
    Test {
        /// Directory to test.
        path: PathBuf,
        /// Whether to keep or delete the test files after the run.
        #[command(flatten)]
        keep: KeepPolicy,
    },
    /// Write a single test file of the given size in MiB.
    Fill {
        /// Directory to write into.
        path: PathBuf,
        /// Size of the file to write, in MiB.
        size_mb: u64,
        /// Whether to keep or delete the test file after the run.
        #[command(flatten)]
        keep: KeepPolicy,
    },
    /// Remove every test-file and speed-test artefact directly inside a directory.
    Clean {
        /// Directory to sweep.
        path: PathBuf,
    },
    /// Copy a directory tree with a hard per-file deadline and automatic
    /// fallback to single-threaded Safe mode on a hardware-class fault.
    Copy {
        /// Source directory.
        src: PathBuf,
        /// Destination directory.
        dst: PathBuf,
        /// Execution mode.
        #[arg(long, value_enum, default_value_t = ModeArg::Auto)]
        mode: ModeArg,
        /// Caps the number of files copied concurrently in Auto mode.
        #[arg(long)]
        concurrency: Option<usize>,
        /// Overrides the per-file deadline, in seconds.
        #[arg(long = "timeout-secs")]
        timeout_secs: Option<u64>,
    },
}

impl Command {
    /// Builds the [`TestRequest`] this command resolves, if it is `test` or `fill`.
    #[must_use]
    pub fn test_request(&self) -> Option<(TestRequest, Option<u64>)> {
        match self {
            Self::Test { path, keep } => Some((
                TestRequest {
                    target_path: path.clone(),
                    file_count: None,
                    auto_delete: keep.resolve(),
                },
                None,
            )),
            Self::Fill { path, size_mb, keep } => Some((
                TestRequest {
                    target_path: path.clone(),
                    file_count: Some(1),
                    auto_delete: keep.resolve(),
                },
                Some(*size_mb),
            )),
            Self::Clean { .. } | Self::Copy { .. } => None,
        }
    }

    /// Builds the [`CopyRequest`] this command resolves, if it is `copy`.
    #[must_use]
    pub fn copy_request(&self) -> Option<CopyRequest> {
        match self {
            Self::Copy {
                src,
                dst,
                mode,
                concurrency,
                timeout_secs,
            } => Some(CopyRequest {
                source_root: src.clone(),
                target_root: dst.clone(),
                safe_requested: *mode == ModeArg::Safe,
                rescue_requested: *mode == ModeArg::Rescue,
                per_file_timeout_override: timeout_secs.map(Duration::from_secs),
                concurrency_override: *concurrency,
            }),
            Self::Test { .. } | Self::Fill { .. } | Self::Clean { .. } => None,
        }
    }
}
