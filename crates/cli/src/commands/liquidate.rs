//! Liquidation simulation and broadcast.

use alloy_primitives::{Bytes, U256};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use sgl_rs_contracts::SingularityClient;
use sgl_rs_sim::{encode_min_amount_out, LiquidationRequest, Market, Scenario};
use tracing::info;

use super::{load_world, write_scenario};
use crate::cli::{LiquidateArgs, OutputFormat};
use crate::output::format_liquidation_detail;

/// Builds the `liquidate` call for `args`.
///
/// Without `--max-parts` each user is capped at their current borrow part, so
/// the order-book pool check sees the real batch size.
fn build_request(
    args: &LiquidateArgs,
    market: &Market,
    default_timestamp: u64,
) -> Result<LiquidationRequest> {
    let max_borrow_parts = if args.max_parts.is_empty() {
        args.users
            .iter()
            .map(|user| market.user_borrow_part(*user))
            .collect()
    } else if args.max_parts.len() == args.users.len() {
        args.max_parts.clone()
    } else {
        bail!(
            "--max-parts has {} values but --users has {}",
            args.max_parts.len(),
            args.users.len()
        );
    };

    let collateral_to_asset_swap_data = args
        .min_amount_out
        .map(|min| Bytes::from(encode_min_amount_out(min)))
        .unwrap_or_default();

    Ok(LiquidationRequest {
        users: args.users.clone(),
        max_borrow_parts,
        swapper: args.swapper,
        collateral_to_asset_swap_data,
        usdo_to_borrowed_swap_data: Bytes::new(),
        caller: args.caller,
        timestamp: args.timestamp.unwrap_or(default_timestamp),
    })
}

pub async fn run_liquidate(args: &LiquidateArgs, format: OutputFormat) -> Result<()> {
    let mut world = load_world(&args.scenario)?;
    let request = build_request(args, &world.market, world.timestamp)?;

    let outcome = world
        .liquidate(&request)
        .context("Liquidation simulation failed")?;
    info!(
        users = outcome.users.len(),
        path = ?outcome.path,
        "simulated liquidation"
    );

    match format {
        OutputFormat::Table => {
            println!("{}", format_liquidation_detail(&outcome));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&outcome)?;
            println!("{}", json);
        }
    }

    if let Some(path) = &args.output {
        write_scenario(path, &Scenario::from_world(&world))?;
    }

    if args.broadcast.send {
        let (Some(rpc_url), Some(private_key)) =
            (&args.broadcast.rpc_url, &args.broadcast.private_key)
        else {
            bail!("--send requires --rpc-url and --private-key");
        };

        let client = SingularityClient::new(rpc_url, private_key)?;
        let receipt = client
            .execute_liquidation(world.market.address, &request)
            .await?;

        match format {
            OutputFormat::Table => {
                println!("{}", "Liquidation sent".green().bold());
                println!("  Transaction: {}", receipt.transaction_hash);
                if let Some(block) = receipt.block_number {
                    println!("  Block:       {}", block);
                }
                for event in &receipt.events {
                    println!("  {}", event.name());
                }
            }
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&serde_json::json!({
                    "transaction_hash": receipt.transaction_hash,
                    "block_number": receipt.block_number,
                    "events": receipt.events,
                }))?;
                println!("{}", json);
            }
        }
    }

    Ok(())
}
