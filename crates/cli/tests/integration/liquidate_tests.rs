//! Liquidate command tests.

use alloy_primitives::{Address, U256};
use predicates::prelude::*;
use sgl_rs_sim::{LiquidationOutcome, LiquidationPath, Scenario, ShareVault};

use super::helpers::{alice, bob, fixture_path, liquidator, output_path, sgl_cmd, swapper};

fn users() -> String {
    format!("{},{}", alice(), bob())
}

fn closed_args(scenario: &str) -> Vec<String> {
    vec![
        "liquidate".to_string(),
        fixture_path(scenario),
        "--users".to_string(),
        users(),
        "--swapper".to_string(),
        swapper().to_string(),
        "--caller".to_string(),
        liquidator().to_string(),
    ]
}

fn outcome(args: &[String]) -> LiquidationOutcome {
    let output = sgl_cmd()
        .args(args)
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_closed_market_liquidation() {
    let outcome = outcome(&closed_args("market"));

    assert_eq!(outcome.path, LiquidationPath::Closed);
    assert!(outcome.oracle_updated);
    assert_eq!(outcome.users.len(), 1);
    assert_eq!(outcome.users[0].user, alice());
    assert_eq!(outcome.users[0].borrow_part, U256::from(630_440));
    assert_eq!(outcome.users[0].caller_reward, U256::from(8_186));
    assert_eq!(outcome.returned_share, U256::from(70_609_200_000_000u64));
    assert_eq!(outcome.caller_share, U256::from(619_287_272_000u64));
    assert_eq!(outcome.credited_share, U256::from(69_233_392_728_000u64));

    let names: Vec<_> = outcome.events.iter().map(|event| event.name()).collect();
    assert_eq!(
        names,
        ["LogExchangeRate", "LogRemoveCollateral", "LogRepay", "LogAddAsset"]
    );
}

#[test]
fn test_closed_market_liquidation_table() {
    sgl_cmd()
        .args(closed_args("market"))
        .assert()
        .success()
        .stdout(predicate::str::contains("closed market swap"))
        .stdout(predicate::str::contains("630,440"))
        .stdout(predicate::str::contains("8.19%"))
        .stdout(predicate::str::contains("LogRepay"));
}

#[test]
fn test_liquidation_writes_scenario() {
    let path = output_path("liquidated_market");
    sgl_cmd()
        .args(closed_args("market"))
        .arg("--output")
        .arg(&path)
        .assert()
        .success();

    let scenario: Scenario =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let world = scenario.build().unwrap();

    assert_eq!(world.market.user_borrow_part(alice()), U256::from(169_960));
    assert_eq!(world.market.user_borrow_part(bob()), U256::from(500_250));
    assert_eq!(world.market.total_borrow.elastic, U256::from(670_210));
    assert_eq!(world.market.exchange_rate, U256::from(1_200_000_000_000_000_000u64));
    assert_eq!(world.vault.balance_of(liquidator(), 1), U256::from(619_287_272_000u64));
    assert_eq!(
        world.vault.balance_of(Address::repeat_byte(0xfe), 1),
        U256::from(756_520_000_000u64)
    );
}

#[test]
fn test_min_amount_out() {
    let mut args = closed_args("market");
    args.extend(["--min-amount-out".to_string(), "706092".to_string()]);
    outcome(&args);

    let mut args = closed_args("market");
    args.extend(["--min-amount-out".to_string(), "706093".to_string()]);
    sgl_cmd()
        .args(args)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Liquidation simulation failed"));
}

#[test]
fn test_explicit_max_parts_cap_the_closing_factor() {
    let mut args = closed_args("market");
    args.extend(["--max-parts".to_string(), "1000,1000".to_string()]);
    let outcome = outcome(&args);

    assert_eq!(outcome.path, LiquidationPath::Closed);
    assert_eq!(outcome.users[0].borrow_part, U256::from(1_000));
    assert_eq!(outcome.returned_share, U256::from(111_900_000_000u64));
}

#[test]
fn test_order_book_liquidation() {
    let args = vec![
        "liquidate".to_string(),
        fixture_path("market_order_book"),
        "--users".to_string(),
        users(),
        "--caller".to_string(),
        liquidator().to_string(),
    ];
    let outcome = outcome(&args);

    assert_eq!(outcome.path, LiquidationPath::OrderBook { pool_index: 3 });
    assert_eq!(outcome.users.len(), 1);
    assert_eq!(outcome.users[0].borrow_amount, U256::from(550_400));
    assert_eq!(outcome.credited_share, U256::from(66_292_043_000_000u64));
    assert_eq!(outcome.protocol_share, U256::ZERO);
}

#[test]
fn test_order_book_liquidation_writes_remaining_bids() {
    let path = output_path("order_book_liquidated");
    sgl_cmd()
        .args([
            "liquidate",
            &fixture_path("market_order_book"),
            "--users",
            &users(),
            "--output",
        ])
        .arg(&path)
        .assert()
        .success();

    let scenario: Scenario =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let world = scenario.build().unwrap();

    // the default caps sum to 1_300_650, well inside the 10M pool
    let book = world.order_book.unwrap();
    assert_eq!(book.bid_amount, U256::from(9_335_943));
    assert_eq!(world.market.user_borrow_part(alice()), U256::from(250_000));
}

#[test]
fn test_unknown_swapper_fails() {
    sgl_cmd()
        .args([
            "liquidate",
            &fixture_path("market"),
            "--users",
            &alice().to_string(),
            "--swapper",
            &Address::repeat_byte(0x77).to_string(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Liquidation simulation failed"));
}

#[test]
fn test_solvent_borrowers_fail() {
    sgl_cmd()
        .args([
            "liquidate",
            &fixture_path("market"),
            "--users",
            &bob().to_string(),
            "--swapper",
            &swapper().to_string(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Liquidation simulation failed"));
}
