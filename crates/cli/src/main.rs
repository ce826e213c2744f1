//! Singularity CLI - inspect and simulate lending market liquidations.

mod cli;
mod commands;
mod logging;
mod output;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use commands::{run_accrue, run_inspect, run_liquidate, run_snapshot};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Inspect(args) => {
            run_inspect(&args, cli.format)?;
        }
        Commands::Accrue(args) => {
            run_accrue(&args, cli.format)?;
        }
        Commands::Liquidate(args) => {
            run_liquidate(&args, cli.format).await?;
        }
        Commands::Snapshot(args) => {
            run_snapshot(&args, cli.format).await?;
        }
    }

    Ok(())
}
