//! Inspect command tests.

use predicates::prelude::*;
use sgl_rs_sim::{PositionState, SolvencyReport};

use super::helpers::{alice, bob, fixture_path, sgl_cmd};

const STRESSED_RATE: &str = "1200000000000000000";

fn reports(args: &[&str]) -> Vec<SolvencyReport> {
    let output = sgl_cmd().args(args).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_inspect_table_at_cached_rate() {
    sgl_cmd()
        .args(["inspect", &fixture_path("market")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Borrower"))
        .stdout(predicate::str::contains("healthy"))
        .stdout(predicate::str::contains("800,400"))
        .stdout(predicate::str::contains("500,250"))
        .stdout(predicate::str::contains("liquidatable").not());
}

#[test]
fn test_inspect_json_with_rate_override() {
    let market = fixture_path("market");
    let reports = reports(&["inspect", &market, "--rate", STRESSED_RATE, "--format", "json"]);

    assert_eq!(reports.len(), 2);
    let alice_report = reports.iter().find(|r| r.user == alice()).unwrap();
    let bob_report = reports.iter().find(|r| r.user == bob()).unwrap();
    assert_eq!(alice_report.state, PositionState::Liquidatable);
    assert_eq!(bob_report.state, PositionState::Healthy);
    assert!(!alice_report.amount_to_solvency.is_zero());
}

#[test]
fn test_inspect_liquidatable_filter() {
    let market = fixture_path("market");
    let reports = reports(&[
        "inspect",
        &market,
        "--rate",
        STRESSED_RATE,
        "--liquidatable",
        "--format",
        "json",
    ]);

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].user, alice());
}

#[test]
fn test_inspect_no_liquidatable_borrowers() {
    sgl_cmd()
        .args(["inspect", &fixture_path("market"), "--liquidatable"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No borrowers found."));
}

#[test]
fn test_inspect_invalid_scenario() {
    sgl_cmd()
        .args(["inspect", &fixture_path("invalid_scenario")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid scenario"));
}

#[test]
fn test_inspect_missing_file() {
    sgl_cmd()
        .args(["inspect", &fixture_path("does_not_exist")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read scenario"));
}
