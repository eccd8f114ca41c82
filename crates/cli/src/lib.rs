#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! The thin command-line front end (A4) over the fake-capacity engine and
//! the rescue-copy core: `test`, `fill`, `clean`, and `copy` subcommands,
//! global verbosity/progress flags, and report rendering. This crate is
//! intentionally small — it is the glue the distilled specification placed
//! out of scope, rebuilt just far enough that `cargo run` exercises the
//! whole engine end to end.
//!
//! # Design
//!
//! [`run`] parses arguments with [`clap`], installs the process-wide
//! interrupt handler, sets up logging at the resolved verbosity, and
//! delegates to [`commands::dispatch`]. It never panics on malformed input;
//! `clap`'s own error rendering covers that path before `run` is reached.
//!
//! # Invariants
//!
//! - Every subcommand's final report goes to `stdout`; diagnostics and the
//!   live progress line go to `stderr`.
//! - The process exit code always matches the report's
//!   [`fdcore::exit_code::ExitCode`], converted via [`exit_code_from`].
//!
//! # Errors
//!
//! `run` itself is infallible; failures inside a subcommand surface as a
//! non-zero [`fdcore::exit_code::ExitCode`] rather than a `Result`.

pub mod args;
pub mod commands;
pub mod render;

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode as ProcessExitCode;

use clap::Parser;

use args::Cli;

/// Parses `arguments` and runs the resulting command, writing to `stdout`/`stderr`.
/// Returns the resolved [`ExitCode`] as a raw `i32`.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
    Out: Write,
    Err: Write,
{
    let cli = match Cli::try_parse_from(arguments) {
        Ok(cli) => cli,
        Err(error) => {
            // `--help`/`--version` are reported through the same `clap::Error`
            // path but belong on stdout, not stderr.
            if error.exit_code() == 0 {
                let _ = write!(stdout, "{error}");
            } else {
                let _ = write!(stderr, "{error}");
            }
            return error.exit_code();
        }
    };

    fdlogging::init(fdlogging::VerbosityConfig::from_flags(cli.verbose, cli.quiet));
    let _ = fdinterrupt::install();

    commands::dispatch(&cli, stdout, stderr).as_i32()
}

/// Converts the raw status from [`run`] into a [`ProcessExitCode`] the way
/// `main` expects.
#[must_use]
pub fn exit_code_from(status: i32) -> ProcessExitCode {
    u8::try_from(status).map_or(ProcessExitCode::FAILURE, ProcessExitCode::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_flag_reports_success() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let status = run(["fd", "--version"], &mut stdout, &mut stderr);
        assert_eq!(status, 0);
        assert!(!stdout.is_empty());
    }

    #[test]
    fn missing_subcommand_is_a_usage_error() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let status = run(["fd"], &mut stdout, &mut stderr);
        assert_ne!(status, 0);
        assert!(!stderr.is_empty());
    }
}
