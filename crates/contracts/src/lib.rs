//! Contract bindings and RPC clients for Singularity lending markets.
//!
//! This crate connects the off-chain engine in `sgl-rs-sim` to deployed
//! markets: Solidity bindings for the market and its YieldBox, conversion of
//! engine events to and from EVM logs, `liquidate` transactions, and a reader
//! that snapshots a live market into a simulation scenario.
//!
//! # Example
//!
//! ```no_run
//! use sgl_rs_contracts::{SingularityClient, SnapshotAccounts, SnapshotReader};
//! use alloy::primitives::Address;
//!
//! #[tokio::main]
//! async fn main() -> sgl_rs_contracts::Result<()> {
//!     let client = SingularityClient::read_only("https://arb1.arbitrum.io/rpc")?;
//!     let market: Address = "0x0000000000000000000000000000000000000001".parse().unwrap();
//!
//!     let accounts = SnapshotAccounts::default();
//!     let timestamp = client.latest_timestamp().await?;
//!     let scenario = SnapshotReader::new(client.provider())
//!         .read(market, &accounts, timestamp)
//!         .await?;
//!
//!     let world = scenario.build()?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logs;
pub mod market_client;
pub mod prepared_call;
pub mod provider;
pub mod singularity;
pub mod snapshot;

pub use error::{ContractError, Result};
pub use logs::{decode_event, decode_market_logs, encode_event, MARKET_EVENT_TOPICS};
pub use market_client::{liquidate_call, LiquidationReceipt, SingularityClient};
pub use prepared_call::PreparedCall;
pub use provider::{connect_read_only, connect_with_signer, HttpProvider};
pub use singularity::{ISingularity, IYieldBox};
pub use snapshot::{SnapshotAccounts, SnapshotReader};
