use assert_cmd::prelude::*;
use std::process::{Command, Output};

fn fd(args: &[&str]) -> Output {
    #[allow(deprecated)]
    let mut command = Command::cargo_bin("fd").expect("failed to locate the fd binary");
    command.args(args);
    command.output().expect("failed to run fd")
}

#[test]
fn help_lists_usage() {
    let output = fd(&["--help"]);
    assert!(output.status.success(), "fd --help should succeed");
    assert!(output.stderr.is_empty(), "help output should not write to stderr");
    let stdout = String::from_utf8(output.stdout).expect("stdout is UTF-8");
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("fd"));
}

#[test]
fn without_operands_shows_usage_and_fails() {
    let output = fd(&[]);
    assert!(!output.status.success(), "running fd with no subcommand should fail");
    let stderr = String::from_utf8(output.stderr).expect("stderr is UTF-8");
    assert!(stderr.contains("Usage:"));
}

#[test]
fn clean_on_a_real_directory_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output = fd(&["clean", dir.path().to_str().unwrap()]);
    assert!(output.status.success(), "clean on an empty directory should succeed");
}

#[test]
fn unknown_flag_is_rejected() {
    let output = fd(&["--definitely-not-a-flag"]);
    assert!(!output.status.success());
}
