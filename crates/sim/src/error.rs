//! Error types for the simulation library.

use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Vault (YieldBox) asset identifier
pub type AssetId = u64;

/// Errors that can occur during simulation.
///
/// Every error aborts the whole operation; a failed [`crate::Market::liquidate`]
/// leaves the market and vault exactly as they were before the call.
#[derive(Debug, Error)]
pub enum SimError {
    /// Interest accrual was attempted with a timestamp before the last accrual
    #[error("Invalid interest accrual: timestamp {timestamp} is before last accrual {last_accrued}")]
    InvalidInterestAccrual { timestamp: u64, last_accrued: u64 },

    /// No borrower in the batch had anything to liquidate
    #[error("SGL: solvent")]
    Solvent,

    /// Closed-market batch contained no insolvent borrower
    #[error("SGL: no users found")]
    NoUsersFound,

    /// Borrower would be insolvent after the operation
    #[error("SGL: insolvent (user {user})")]
    Insolvent { user: Address },

    /// Swapper is not on the registry allow-list
    #[error("SGL: Invalid swapper {swapper}")]
    InvalidSwapper { swapper: Address },

    /// Swap output below the caller-supplied minimum
    #[error("SGL: min limit (expected at least {min}, got {received})")]
    MinLimit { min: U256, received: U256 },

    /// Liquidation venue returned less than the debt it closed
    #[error("SGL: not enough (returned {returned} share, needed {needed})")]
    NotEnoughReturned { returned: U256, needed: U256 },

    /// Asset pool cannot cover a borrow
    #[error("SGL: not enough assets (available {available} share, requested {requested})")]
    NotEnoughAssets { available: U256, requested: U256 },

    /// Asset pool total base would fall below the minimum
    #[error("SGL: below minimum")]
    BelowMinimum,

    /// `users` and `max_borrow_parts` have different lengths
    #[error("Length mismatch: {users} users, {parts} max borrow parts")]
    LengthMismatch { users: usize, parts: usize },

    /// Arithmetic underflow
    #[error("Arithmetic underflow in {context}")]
    Underflow { context: &'static str },

    /// Arithmetic overflow
    #[error("Arithmetic overflow in {context}")]
    Overflow { context: &'static str },

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Swap data could not be decoded as a minimum output amount
    #[error("Invalid swap data: {0}")]
    InvalidSwapData(String),

    /// Vault has no such asset registered
    #[error("Unknown vault asset {asset_id}")]
    UnknownAsset { asset_id: AssetId },

    /// Vault balance too small for a transfer
    #[error("Insufficient shares of asset {asset_id} for {owner}: have {have}, need {need}")]
    InsufficientShares {
        owner: Address,
        asset_id: AssetId,
        have: U256,
        need: U256,
    },

    /// Order book has no bid pool able to execute
    #[error("No available bid pool")]
    NoBidPool,

    /// Shared market lock was poisoned by a panicking holder
    #[error("Market lock poisoned")]
    LockPoisoned,

    /// Scenario file is inconsistent
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),
}

/// Result type alias for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;
