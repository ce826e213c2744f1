//! Swapper collaborator and the swapper allow-list.
//!
//! In a closed-market liquidation the seized collateral is handed to a
//! swapper, which sells it for the market's asset and deposits the proceeds
//! back to the market. Only swappers on the registry allow-list may be used.

use std::collections::BTreeSet;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};

use crate::error::{AssetId, SimError};
use crate::math::{mul_div_down, EXCHANGE_RATE_PRECISION, FEE_PRECISION};
use crate::vault::ShareVault;

/// Parameters of a single swap
#[derive(Debug, Clone, Copy)]
pub struct SwapRequest<'a> {
    pub token_in: AssetId,
    pub token_out: AssetId,
    /// Shares of `token_in` already transferred to the swapper
    pub share_in: U256,
    /// Receiver of the `token_out` shares
    pub to: Address,
    pub min_amount_out: U256,
    pub dex_data: &'a [u8],
}

/// Proceeds of a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapOutput {
    pub amount_out: U256,
    pub share_out: U256,
}

/// DEX adapter selling collateral for asset
pub trait Swapper {
    fn address(&self) -> Address;

    fn swap(&mut self, vault: &mut dyn ShareVault, request: SwapRequest<'_>)
        -> Result<SwapOutput, SimError>;
}

/// Governance registry of allowed swappers
pub trait SwapperRegistry {
    fn is_swapper(&self, swapper: Address) -> bool;
}

/// Set-backed swapper allow-list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowList {
    swappers: BTreeSet<Address>,
}

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(&mut self, swapper: Address) {
        self.swappers.insert(swapper);
    }

    pub fn revoke(&mut self, swapper: Address) {
        self.swappers.remove(&swapper);
    }

    pub fn iter(&self) -> impl Iterator<Item = Address> + '_ {
        self.swappers.iter().copied()
    }
}

impl FromIterator<Address> for AllowList {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        Self {
            swappers: iter.into_iter().collect(),
        }
    }
}

impl SwapperRegistry for AllowList {
    fn is_swapper(&self, swapper: Address) -> bool {
        self.swappers.contains(&swapper)
    }
}

/// Decodes the minimum output amount carried in swap data.
///
/// Empty data means no minimum.
pub fn decode_min_amount_out(data: &[u8]) -> Result<U256, SimError> {
    if data.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::abi_decode(data).map_err(|e| SimError::InvalidSwapData(e.to_string()))
}

/// Encodes a minimum output amount as swap data
pub fn encode_min_amount_out(min_amount_out: U256) -> Vec<u8> {
    min_amount_out.abi_encode()
}

/// Swapper selling at a fixed price minus a haircut.
///
/// `price` is asset per collateral scaled by `EXCHANGE_RATE_PRECISION`;
/// `haircut` is a `FEE_PRECISION` percentage kept by the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSwapper {
    pub address: Address,
    pub price: U256,
    #[serde(default)]
    pub haircut: U256,
}

impl RateSwapper {
    pub fn new(address: Address, price: U256) -> Self {
        Self {
            address,
            price,
            haircut: U256::ZERO,
        }
    }

    pub fn with_haircut(mut self, haircut: U256) -> Self {
        self.haircut = haircut;
        self
    }

    /// Asset amount paid for `amount_in` collateral
    pub fn quote(&self, amount_in: U256) -> Result<U256, SimError> {
        let gross = mul_div_down(amount_in, self.price, EXCHANGE_RATE_PRECISION)?;
        Ok(gross.saturating_sub(mul_div_down(gross, self.haircut, FEE_PRECISION)?))
    }
}

impl Swapper for RateSwapper {
    fn address(&self) -> Address {
        self.address
    }

    fn swap(
        &mut self,
        vault: &mut dyn ShareVault,
        request: SwapRequest<'_>,
    ) -> Result<SwapOutput, SimError> {
        let amount_in = vault.withdraw(request.token_in, self.address, request.share_in)?;
        let amount_out = self.quote(amount_in)?;

        if amount_out < request.min_amount_out {
            return Err(SimError::MinLimit {
                min: request.min_amount_out,
                received: amount_out,
            });
        }

        let share_out = vault.deposit(request.token_out, request.to, amount_out)?;
        Ok(SwapOutput {
            amount_out,
            share_out,
        })
    }
}
