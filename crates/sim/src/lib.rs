//! Singularity Market Simulation SDK
//!
//! This crate reproduces the accounting of a Singularity lending market off
//! chain: utilization-driven interest accrual, elastic/base share ledgers,
//! solvency checks and batch liquidation through either an order book or a
//! closed-market swap. Integer math matches the on-chain market bit for bit.
//!
//! # Overview
//!
//! The simulation SDK allows you to:
//! - Accrue interest and follow the interest rate controller
//! - Check borrower solvency and size liquidations
//! - Simulate batch liquidations with in-memory vault, oracle, swapper and
//!   order book collaborators
//! - Load whole simulation worlds from JSON scenario files
//! - Share a market between threads behind a single lock
//!
//! # Example
//!
//! ```rust,ignore
//! use sgl_rs_sim::{LiquidationRequest, Scenario};
//!
//! let scenario: Scenario = serde_json::from_str(&std::fs::read_to_string("scenario.json")?)?;
//! let mut world = scenario.build()?;
//!
//! let outcome = world.liquidate(&LiquidationRequest {
//!     users: vec![borrower],
//!     max_borrow_parts: vec![U256::MAX],
//!     swapper,
//!     caller,
//!     timestamp: world.timestamp,
//!     ..Default::default()
//! })?;
//!
//! println!("liquidated {} borrowers via {:?}", outcome.users.len(), outcome.path);
//! ```

pub mod accrual;
pub mod error;
pub mod events;
pub mod liquidation;
pub mod market;
pub mod math;
pub mod oracle;
pub mod order_book;
pub mod position;
pub mod rebase;
pub mod scenario;
pub mod shared;
pub mod solvency;
pub mod swapper;
pub mod vault;

// Re-export commonly used types
pub use error::{AssetId, SimError};

// Accrual exports
pub use accrual::{
    compute_accrual, next_interest_per_second, AccrualOutcome, AccrueInfo, InterestModel,
    INTEREST_ELASTICITY, MAXIMUM_INTEREST_PER_SECOND, MAXIMUM_TARGET_UTILIZATION,
    MINIMUM_INTEREST_PER_SECOND, MINIMUM_TARGET_UTILIZATION, STARTING_INTEREST_PER_SECOND,
};

// Market exports
pub use events::MarketEvent;
pub use market::{Market, MarketConfig, MINIMUM_TOTAL_ASSET_BASE};
pub use position::{BorrowPosition, PositionState};
pub use rebase::Rebase;
pub use solvency::{get_caller_reward, SolvencyReport};

// Liquidation exports
pub use liquidation::{
    Collaborators, LiquidationOutcome, LiquidationPath, LiquidationRequest, UserLiquidation,
};
pub use shared::SharedMarket;

// Math exports
pub use math::{
    RoundingDirection, COLLATERALIZATION_RATE_PRECISION, EXCHANGE_RATE_PRECISION, FEE_PRECISION,
    LIQUIDATION_MULTIPLIER_PRECISION,
};

// Collaborator exports
pub use oracle::{FixedOracle, Oracle, OracleResponse};
pub use order_book::{BidBook, BidExecution, BidPool, LiquidationQueue};
pub use swapper::{
    decode_min_amount_out, encode_min_amount_out, AllowList, RateSwapper, SwapOutput, SwapRequest,
    Swapper, SwapperRegistry,
};
pub use vault::{MemoryVault, ShareVault, VaultAsset};

// Scenario exports
pub use scenario::{Scenario, World};
