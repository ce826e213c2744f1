//! Market snapshots over JSON-RPC.

use anyhow::{Context, Result};
use sgl_rs_contracts::{SingularityClient, SnapshotAccounts, SnapshotReader};

use super::write_scenario;
use crate::cli::{OutputFormat, SnapshotArgs};
use crate::output::format_snapshot_detail;

pub async fn run_snapshot(args: &SnapshotArgs, format: OutputFormat) -> Result<()> {
    let client = SingularityClient::read_only(&args.rpc_url)?;
    let timestamp = client.latest_timestamp().await?;

    let accounts = SnapshotAccounts {
        borrowers: args.borrowers.clone(),
        lenders: args.lenders.clone(),
    };
    let scenario = SnapshotReader::new(client.provider())
        .read(args.market, &accounts, timestamp)
        .await?;

    // a snapshot that does not build is not worth writing
    scenario
        .clone()
        .build()
        .context("Snapshot does not form a valid scenario")?;

    if let Some(path) = &args.output {
        write_scenario(path, &scenario)?;
        if let OutputFormat::Table = format {
            println!("{}", format_snapshot_detail(&scenario));
        }
        return Ok(());
    }

    match format {
        OutputFormat::Table => {
            println!("{}", format_snapshot_detail(&scenario));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&scenario)?;
            println!("{}", json);
        }
    }

    Ok(())
}
