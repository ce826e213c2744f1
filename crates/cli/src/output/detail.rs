//! Detailed output formatting for single operations.

use colored::Colorize;
use sgl_rs_sim::math::{interest_per_second_to_apr, rate_to_f64};
use sgl_rs_sim::{AccrualOutcome, LiquidationOutcome, LiquidationPath, Scenario};

use super::{format_amount, format_fee};

fn format_rate(rate: alloy_primitives::U256) -> String {
    format!("{:.6}", rate_to_f64(rate))
}

fn format_apr(interest_per_second: u64) -> String {
    format!("{:.2}%", interest_per_second_to_apr(interest_per_second) * 100.0)
}

fn header(output: &mut String, title: &str) {
    output.push_str(&format!("{}\n", "=".repeat(60)));
    output.push_str(&format!("{}\n", title.bold()));
    output.push_str(&format!("{}\n\n", "=".repeat(60)));
}

pub fn format_liquidation_detail(outcome: &LiquidationOutcome) -> String {
    let mut output = String::new();
    header(&mut output, "Liquidation");

    let venue = match outcome.path {
        LiquidationPath::OrderBook { pool_index } => format!("order book (pool {})", pool_index),
        LiquidationPath::Closed => "closed market swap".to_string(),
    };
    output.push_str(&format!("{}\n", "Settlement".cyan().bold()));
    output.push_str(&format!("  Venue:         {}\n", venue));
    output.push_str(&format!(
        "  Exchange Rate: {}{}\n\n",
        format_rate(outcome.exchange_rate),
        if outcome.oracle_updated {
            String::new()
        } else {
            format!(" {}", "(cached, oracle unavailable)".yellow())
        }
    ));

    output.push_str(&format!("{}\n", "Borrowers".cyan().bold()));
    for user in &outcome.users {
        output.push_str(&format!("  {}\n", user.user));
        output.push_str(&format!("    Borrow Part:      {}\n", format_amount(user.borrow_part)));
        output.push_str(&format!("    Repaid:           {}\n", format_amount(user.borrow_amount)));
        output.push_str(&format!(
            "    Collateral Share: {}\n",
            format_amount(user.collateral_share)
        ));
        if matches!(outcome.path, LiquidationPath::Closed) {
            output.push_str(&format!("    Caller Reward:    {}\n", format_fee(user.caller_reward)));
        }
    }
    output.push('\n');

    output.push_str(&format!("{}\n", "Asset Shares".cyan().bold()));
    output.push_str(&format!("  Returned:  {}\n", format_amount(outcome.returned_share)));
    output.push_str(&format!("  Debt:      {}\n", format_amount(outcome.borrow_share)));
    output.push_str(&format!("  Caller:    {}\n", format_amount(outcome.caller_share)));
    output.push_str(&format!("  Protocol:  {}\n", format_amount(outcome.protocol_share)));
    output.push_str(&format!("  Credited:  {}\n\n", format_amount(outcome.credited_share)));

    output.push_str(&format!("{}\n", "Events".cyan().bold()));
    for event in &outcome.events {
        output.push_str(&format!("  {}\n", event.name()));
    }

    output
}

pub fn format_accrual_detail(outcome: &AccrualOutcome, timestamp: u64) -> String {
    let mut output = String::new();
    header(&mut output, "Interest Accrual");

    output.push_str(&format!("  Timestamp:  {}\n", timestamp));
    match outcome {
        AccrualOutcome::Unchanged => {
            output.push_str(&format!(
                "  Outcome:    {}\n",
                "unchanged, no time elapsed".dimmed()
            ));
        }
        AccrualOutcome::Idle {
            interest_per_second,
            rate_reset,
        } => {
            output.push_str(&format!("  Outcome:    {}\n", "idle, no open debt".yellow()));
            output.push_str(&format!(
                "  Rate:       {}/s ({} APR){}\n",
                interest_per_second,
                format_apr(*interest_per_second),
                if *rate_reset { ", reset" } else { "" }
            ));
        }
        AccrualOutcome::Accrued(accrual) => {
            output.push_str(&format!("  Outcome:    {}\n", "accrued".green()));
            output.push_str(&format!("  Elapsed:    {} seconds\n", accrual.elapsed));
            output.push_str(&format!("  Interest:   {}\n", format_amount(accrual.extra_amount)));
            output.push_str(&format!("  Fee Mint:   {}\n", format_amount(accrual.fee_fraction)));
            output.push_str(&format!(
                "  Utilization: {:.2}%\n",
                rate_to_f64(accrual.utilization) * 100.0
            ));
            output.push_str(&format!(
                "  Rate:       {}/s ({} APR)\n\n",
                accrual.interest_per_second,
                format_apr(accrual.interest_per_second)
            ));

            output.push_str(&format!("{}\n", "Totals".cyan().bold()));
            output.push_str(&format!(
                "  Borrow: {} / {}\n",
                format_amount(accrual.total_borrow.elastic),
                format_amount(accrual.total_borrow.base)
            ));
            output.push_str(&format!(
                "  Asset:  {} / {}\n",
                format_amount(accrual.total_asset.elastic),
                format_amount(accrual.total_asset.base)
            ));
        }
    }

    output
}

pub fn format_snapshot_detail(scenario: &Scenario) -> String {
    let mut output = String::new();
    let market = &scenario.market;
    header(&mut output, "Market Snapshot");

    output.push_str(&format!("  Market:        {}\n", market.address));
    output.push_str(&format!("  Timestamp:     {}\n", scenario.timestamp));
    output.push_str(&format!("  Asset Id:      {}\n", market.asset_id));
    output.push_str(&format!("  Collateral Id: {}\n", market.collateral_id));
    output.push_str(&format!("  Exchange Rate: {}\n", format_rate(market.exchange_rate)));
    output.push_str(&format!(
        "  Total Borrow:  {} / {}\n",
        format_amount(market.total_borrow.elastic),
        format_amount(market.total_borrow.base)
    ));
    output.push_str(&format!(
        "  Total Asset:   {} / {}\n",
        format_amount(market.total_asset.elastic),
        format_amount(market.total_asset.base)
    ));
    if let Some(info) = &market.accrue_info {
        output.push_str(&format!(
            "  Interest:      {}/s ({} APR)\n",
            info.interest_per_second,
            format_apr(info.interest_per_second)
        ));
    }
    output.push_str(&format!("  Positions:     {}\n", market.positions.len()));
    output.push_str(&format!("  Lenders:       {}\n", market.lenders.len()));

    output
}
