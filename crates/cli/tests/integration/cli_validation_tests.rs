//! CLI argument validation tests.
//!
//! These tests verify that the CLI properly validates arguments and provides
//! helpful error messages without requiring network access.

use predicates::prelude::*;

use super::helpers::{alice, fixture_path, sgl_cmd};

#[test]
fn test_help_output() {
    sgl_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sgl"))
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("accrue"))
        .stdout(predicate::str::contains("liquidate"))
        .stdout(predicate::str::contains("snapshot"));
}

#[test]
fn test_liquidate_help_output() {
    sgl_cmd()
        .args(["liquidate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--users"))
        .stdout(predicate::str::contains("--min-amount-out"))
        .stdout(predicate::str::contains("--send"))
        .stdout(predicate::str::contains("SGL_RPC_URL"));
}

#[test]
fn test_invalid_command() {
    sgl_cmd()
        .arg("invalid_command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_invalid_format() {
    sgl_cmd()
        .args(["--format", "xml", "inspect", &fixture_path("market")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_liquidate_requires_users() {
    sgl_cmd()
        .args(["liquidate", &fixture_path("market")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--users"));
}

#[test]
fn test_liquidate_invalid_address() {
    sgl_cmd()
        .args(["liquidate", &fixture_path("market"), "--users", "not-an-address"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_send_requires_rpc_and_key() {
    sgl_cmd()
        .args([
            "liquidate",
            &fixture_path("market"),
            "--users",
            &alice().to_string(),
            "--send",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--rpc-url"));
}

#[test]
fn test_accrue_requires_elapsed_or_to() {
    sgl_cmd()
        .args(["accrue", &fixture_path("market")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--elapsed"));
}

#[test]
fn test_accrue_elapsed_conflicts_with_to() {
    sgl_cmd()
        .args(["accrue", &fixture_path("market"), "--elapsed", "10", "--to", "20"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_snapshot_requires_rpc_url() {
    sgl_cmd()
        .args(["snapshot", "0x1111111111111111111111111111111111111111"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--rpc-url"));
}

#[test]
fn test_verbose_logs_to_stderr() {
    sgl_cmd()
        .args(["-v", "inspect", &fixture_path("market")])
        .assert()
        .success()
        .stderr(predicate::str::contains("loaded scenario"))
        .stdout(predicate::str::contains("loaded scenario").not());
}
