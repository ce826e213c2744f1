//! Liquidation queue (order book) collaborator.
//!
//! Market makers pre-fund bid pools with the market's asset. When a pool is
//! large enough to cover a whole batch, the market hands the seized collateral
//! to the queue, which executes bids and pays the market in asset shares.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::{AssetId, SimError};
use crate::math::{
    checked_sub, mul_div_down, RoundingDirection, EXCHANGE_RATE_PRECISION, FEE_PRECISION,
};
use crate::vault::ShareVault;

/// Next bid pool able to take a liquidation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidPool {
    pub pool_index: u64,
    pub available: bool,
    /// Asset amount committed by bidders
    pub total_amount: U256,
}

/// Result of executing bids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidExecution {
    /// Asset amount paid to the market
    pub amount_executed: U256,
    /// Collateral amount consumed by the bids
    pub collateral_liquidated: U256,
}

/// Order book contract interface.
pub trait LiquidationQueue {
    fn address(&self) -> Address;

    fn get_next_avail_bid_pool(&self) -> BidPool;

    /// Sells `collateral_amount` of the collateral the queue already holds.
    fn execute_bids(
        &mut self,
        vault: &mut dyn ShareVault,
        collateral_amount: U256,
        swap_data: &[u8],
    ) -> Result<BidExecution, SimError>;
}

/// Single pre-funded bid pool.
///
/// Bidders buy collateral at `price` (asset per collateral, 1e18-scaled) less
/// `discount` (`FEE_PRECISION` percentage). Proceeds are deposited to `market`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidBook {
    pub address: Address,
    pub market: Address,
    pub asset_id: AssetId,
    pub collateral_id: AssetId,
    #[serde(default)]
    pub pool_index: u64,
    /// Asset amount still committed by bidders
    pub bid_amount: U256,
    pub price: U256,
    #[serde(default)]
    pub discount: U256,
}

impl BidBook {
    /// Asset amount the bids pay for `collateral_amount`
    pub fn quote(&self, collateral_amount: U256) -> Result<U256, SimError> {
        let gross = mul_div_down(collateral_amount, self.price, EXCHANGE_RATE_PRECISION)?;
        Ok(gross.saturating_sub(mul_div_down(gross, self.discount, FEE_PRECISION)?))
    }
}

impl LiquidationQueue for BidBook {
    fn address(&self) -> Address {
        self.address
    }

    fn get_next_avail_bid_pool(&self) -> BidPool {
        BidPool {
            pool_index: self.pool_index,
            available: !self.bid_amount.is_zero(),
            total_amount: self.bid_amount,
        }
    }

    fn execute_bids(
        &mut self,
        vault: &mut dyn ShareVault,
        collateral_amount: U256,
        _swap_data: &[u8],
    ) -> Result<BidExecution, SimError> {
        let payment = self.quote(collateral_amount)?;
        if payment > self.bid_amount {
            return Err(SimError::NoBidPool);
        }

        let collateral_share =
            vault.to_share(self.collateral_id, collateral_amount, RoundingDirection::Down)?;
        vault.withdraw(self.collateral_id, self.address, collateral_share)?;
        vault.deposit(self.asset_id, self.market, payment)?;

        self.bid_amount = checked_sub(self.bid_amount, payment, "bid amount")?;

        Ok(BidExecution {
            amount_executed: payment,
            collateral_liquidated: collateral_amount,
        })
    }
}
