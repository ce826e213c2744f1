//! Accrue command tests.

use alloy_primitives::U256;
use predicates::prelude::*;
use sgl_rs_sim::Scenario;

use super::helpers::{fixture_path, output_path, sgl_cmd};

const NOW: u64 = 1_700_000_000;

fn accrue_json(args: &[&str]) -> serde_json::Value {
    let output = sgl_cmd().args(args).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_accrue_one_day() {
    let market = fixture_path("market");
    let json = accrue_json(&["accrue", &market, "--elapsed", "86400", "--format", "json"]);

    assert_eq!(json["timestamp"], NOW + 86_400);
    assert_eq!(json["accrual"]["outcome"], "accrued");
    assert_eq!(json["accrual"]["elapsed"], 86_400);
    assert_eq!(json["events"][0]["event"], "LogAccrue");
}

#[test]
fn test_accrue_writes_scenario() {
    let path = output_path("accrued_market");
    sgl_cmd()
        .args(["accrue", &fixture_path("market"), "--to"])
        .arg((NOW + 86_400).to_string())
        .arg("--output")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("accrued"));

    let scenario: Scenario =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(scenario.timestamp, NOW + 86_400);
    assert!(scenario.market.total_borrow.elastic > U256::from(1_300_650));
    assert_eq!(scenario.market.total_borrow.base, U256::from(1_300_650));

    let info = scenario.market.accrue_info.unwrap();
    assert_eq!(info.last_accrued, NOW + 86_400);
    assert!(!info.fees_earned_fraction.is_zero());

    // written scenarios load again
    scenario.build().unwrap();
}

#[test]
fn test_accrue_same_timestamp_is_unchanged() {
    let market = fixture_path("market");
    let json = accrue_json(&["accrue", &market, "--elapsed", "0", "--format", "json"]);

    assert_eq!(json["accrual"]["outcome"], "unchanged");
    assert_eq!(json["events"].as_array().unwrap().len(), 0);
}

#[test]
fn test_accrue_idle_market_resets_rate() {
    let market = fixture_path("idle_market");
    let json = accrue_json(&["accrue", &market, "--elapsed", "3600", "--format", "json"]);

    assert_eq!(json["accrual"]["outcome"], "idle");
    assert_eq!(json["accrual"]["rate_reset"], true);
    assert_eq!(json["accrual"]["interest_per_second"], 317_097_920);
}

#[test]
fn test_accrue_backwards_fails() {
    sgl_cmd()
        .args(["accrue", &fixture_path("market"), "--to", "1000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}
