//! CLI argument definitions using clap.

use std::path::PathBuf;

use alloy_primitives::{Address, U256};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

/// Singularity CLI - simulate lending market liquidations
#[derive(Parser, Debug)]
#[command(name = "sgl")]
#[command(about = "CLI tool for simulating Singularity market liquidations", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the solvency of every borrower in a scenario
    Inspect(InspectArgs),
    /// Accrue interest in a scenario up to a later time
    Accrue(AccrueArgs),
    /// Simulate a liquidation batch, optionally sending it on-chain
    Liquidate(LiquidateArgs),
    /// Read a deployed market into a scenario file
    Snapshot(SnapshotArgs),
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Scenario file (JSON)
    pub scenario: PathBuf,

    /// Exchange rate to evaluate at instead of the cached one (collateral per asset, 1e18-scaled)
    #[arg(long)]
    pub rate: Option<U256>,

    /// Only show borrowers that can be liquidated
    #[arg(long)]
    pub liquidatable: bool,
}

#[derive(Parser, Debug)]
pub struct AccrueArgs {
    /// Scenario file (JSON)
    pub scenario: PathBuf,

    /// Seconds to advance the scenario clock by
    #[arg(long, conflicts_with = "to", required_unless_present = "to")]
    pub elapsed: Option<u64>,

    /// Unix timestamp to accrue to
    #[arg(long)]
    pub to: Option<u64>,

    /// Write the resulting scenario to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct LiquidateArgs {
    /// Scenario file (JSON)
    pub scenario: PathBuf,

    /// Borrowers to liquidate (comma separated)
    #[arg(long, value_delimiter = ',', required = true)]
    pub users: Vec<Address>,

    /// Maximum borrow part per borrower (comma separated, defaults to each borrower's debt)
    #[arg(long, value_delimiter = ',')]
    pub max_parts: Vec<U256>,

    /// Swapper used by a closed-market liquidation
    #[arg(long, default_value_t = Address::ZERO)]
    pub swapper: Address,

    /// Minimum asset amount the swap must return
    #[arg(long)]
    pub min_amount_out: Option<U256>,

    /// Address receiving the caller reward
    #[arg(long, default_value_t = Address::ZERO)]
    pub caller: Address,

    /// Time of the liquidation (defaults to the scenario clock)
    #[arg(long)]
    pub timestamp: Option<u64>,

    /// Write the resulting scenario to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub broadcast: BroadcastArgs,
}

#[derive(Args, Debug)]
pub struct BroadcastArgs {
    /// Send the liquidation to the scenario's market after a successful simulation
    #[arg(long, requires_all = ["rpc_url", "private_key"])]
    pub send: bool,

    /// RPC URL of the market's chain (can also use SGL_RPC_URL env var)
    #[arg(long, env = "SGL_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Private key for signing transactions (can also use PRIVATE_KEY env var)
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,
}

#[derive(Parser, Debug)]
pub struct SnapshotArgs {
    /// Market contract address
    pub market: Address,

    /// RPC URL of the market's chain (can also use SGL_RPC_URL env var)
    #[arg(long, env = "SGL_RPC_URL")]
    pub rpc_url: String,

    /// Borrowers to include (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub borrowers: Vec<Address>,

    /// Lenders to include (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub lenders: Vec<Address>,

    /// Write the scenario to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}
