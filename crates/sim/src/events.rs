//! Market events.
//!
//! Every state change the market makes is recorded as a [`MarketEvent`] in its
//! journal, mirroring the logs the on-chain market emits.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Event recorded by a market operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum MarketEvent {
    LogAccrue {
        accrued_amount: U256,
        fee_fraction: U256,
        rate: u64,
        utilization: U256,
    },
    LogExchangeRate {
        rate: U256,
    },
    LogAddCollateral {
        from: Address,
        to: Address,
        share: U256,
    },
    LogRemoveCollateral {
        from: Address,
        to: Address,
        share: U256,
    },
    LogBorrow {
        from: Address,
        to: Address,
        amount: U256,
        fee_amount: U256,
        part: U256,
    },
    LogRepay {
        from: Address,
        to: Address,
        amount: U256,
        part: U256,
    },
    LogAddAsset {
        from: Address,
        to: Address,
        share: U256,
        fraction: U256,
    },
}

impl MarketEvent {
    /// Solidity event name
    pub fn name(&self) -> &'static str {
        match self {
            MarketEvent::LogAccrue { .. } => "LogAccrue",
            MarketEvent::LogExchangeRate { .. } => "LogExchangeRate",
            MarketEvent::LogAddCollateral { .. } => "LogAddCollateral",
            MarketEvent::LogRemoveCollateral { .. } => "LogRemoveCollateral",
            MarketEvent::LogBorrow { .. } => "LogBorrow",
            MarketEvent::LogRepay { .. } => "LogRepay",
            MarketEvent::LogAddAsset { .. } => "LogAddAsset",
        }
    }
}
