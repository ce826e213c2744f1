//! Share vault (YieldBox) collaborator.
//!
//! The market never holds tokens directly. Collateral and lent assets sit in a
//! share vault and the market only moves vault shares around. This module
//! defines the [`ShareVault`] interface the engine calls and [`MemoryVault`],
//! an in-memory implementation using YieldBox's share math.
//!
//! # Share math
//!
//! YieldBox adds a virtual offset to both sides of every conversion so an
//! empty asset starts at `1e8` shares per token unit:
//!
//! ```text
//! share  = amount * (total_share + 1e8) / (total_amount + 1)
//! amount = share * (total_amount + 1) / (total_share + 1e8)
//! ```

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};

use crate::error::{AssetId, SimError};
use crate::math::{checked_add, checked_mul, checked_sub, mul_div_down, RoundingDirection};

/// Virtual shares added to every YieldBox conversion (1e8)
pub const VAULT_VIRTUAL_SHARES: U256 = U256::from_limbs([100_000_000, 0, 0, 0]);

/// Virtual amount added to every YieldBox conversion (1)
pub const VAULT_VIRTUAL_AMOUNT: U256 = U256::from_limbs([1, 0, 0, 0]);

/// Share vault interface used by the market and the liquidation venues.
pub trait ShareVault {
    /// Converts a token amount to vault shares.
    ///
    /// Fails with [`SimError::Overflow`] where the vault contract would revert.
    fn to_share(
        &self,
        asset_id: AssetId,
        amount: U256,
        rounding: RoundingDirection,
    ) -> Result<U256, SimError>;

    /// Converts vault shares to a token amount
    fn to_amount(
        &self,
        asset_id: AssetId,
        share: U256,
        rounding: RoundingDirection,
    ) -> Result<U256, SimError>;

    /// Moves shares between two holders
    fn transfer(
        &mut self,
        from: Address,
        to: Address,
        asset_id: AssetId,
        share: U256,
    ) -> Result<(), SimError>;

    /// Share balance of a holder
    fn balance_of(&self, owner: Address, asset_id: AssetId) -> U256;

    /// Deposits `amount` tokens for `to`, returning the shares minted
    fn deposit(&mut self, asset_id: AssetId, to: Address, amount: U256) -> Result<U256, SimError>;

    /// Burns `share` from `from`, returning the token amount released
    fn withdraw(&mut self, asset_id: AssetId, from: Address, share: U256)
        -> Result<U256, SimError>;
}

/// Totals of one vault asset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VaultAsset {
    /// Tokens held for the asset
    pub total_amount: U256,
    /// Shares outstanding for the asset
    pub total_share: U256,
}

impl VaultAsset {
    fn virtual_totals(&self) -> Result<(U256, U256), SimError> {
        Ok((
            checked_add(self.total_amount, VAULT_VIRTUAL_AMOUNT, "vault total amount")?,
            checked_add(self.total_share, VAULT_VIRTUAL_SHARES, "vault total share")?,
        ))
    }

    pub fn to_share(&self, amount: U256, rounding: RoundingDirection) -> Result<U256, SimError> {
        let (total_amount, total_share) = self.virtual_totals()?;

        let share = mul_div_down(amount, total_share, total_amount)?;
        if rounding.is_up() && checked_mul(share, total_amount, "to_share")? / total_share < amount
        {
            return checked_add(share, U256::from(1), "to_share");
        }
        Ok(share)
    }

    pub fn to_amount(&self, share: U256, rounding: RoundingDirection) -> Result<U256, SimError> {
        let (total_amount, total_share) = self.virtual_totals()?;

        let amount = mul_div_down(share, total_amount, total_share)?;
        if rounding.is_up() && checked_mul(amount, total_share, "to_amount")? / total_amount < share
        {
            return checked_add(amount, U256::from(1), "to_amount");
        }
        Ok(amount)
    }
}

/// In-memory share vault
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryVault {
    assets: BTreeMap<AssetId, VaultAsset>,
    balances: BTreeMap<(Address, AssetId), U256>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an asset with the given totals (no holder is credited)
    pub fn register_asset(&mut self, asset_id: AssetId, asset: VaultAsset) {
        self.assets.insert(asset_id, asset);
    }

    /// Totals of an asset, if registered
    pub fn asset(&self, asset_id: AssetId) -> Option<&VaultAsset> {
        self.assets.get(&asset_id)
    }

    /// Iterates over all registered assets
    pub fn assets(&self) -> impl Iterator<Item = (AssetId, VaultAsset)> + '_ {
        self.assets.iter().map(|(asset_id, asset)| (*asset_id, *asset))
    }

    /// Sets a holder's balance directly.
    ///
    /// Used to load snapshots; totals are not adjusted.
    pub fn set_balance(&mut self, owner: Address, asset_id: AssetId, share: U256) {
        self.balances.insert((owner, asset_id), share);
    }

    /// Iterates over all non-zero balances
    pub fn balances(&self) -> impl Iterator<Item = (Address, AssetId, U256)> + '_ {
        self.balances
            .iter()
            .filter(|(_, share)| !share.is_zero())
            .map(|((owner, asset_id), share)| (*owner, *asset_id, *share))
    }

    fn asset_mut(&mut self, asset_id: AssetId) -> Result<&mut VaultAsset, SimError> {
        self.assets
            .get_mut(&asset_id)
            .ok_or(SimError::UnknownAsset { asset_id })
    }

    fn debit(&mut self, owner: Address, asset_id: AssetId, share: U256) -> Result<(), SimError> {
        let have = self.balance_of(owner, asset_id);
        if have < share {
            return Err(SimError::InsufficientShares {
                owner,
                asset_id,
                have,
                need: share,
            });
        }
        self.balances.insert((owner, asset_id), have - share);
        Ok(())
    }

    fn credit(&mut self, owner: Address, asset_id: AssetId, share: U256) -> Result<(), SimError> {
        let balance = self.balance_of(owner, asset_id);
        let balance = checked_add(balance, share, "vault balance")?;
        self.balances.insert((owner, asset_id), balance);
        Ok(())
    }
}

impl ShareVault for MemoryVault {
    fn to_share(
        &self,
        asset_id: AssetId,
        amount: U256,
        rounding: RoundingDirection,
    ) -> Result<U256, SimError> {
        self.assets
            .get(&asset_id)
            .copied()
            .unwrap_or_default()
            .to_share(amount, rounding)
    }

    fn to_amount(
        &self,
        asset_id: AssetId,
        share: U256,
        rounding: RoundingDirection,
    ) -> Result<U256, SimError> {
        self.assets
            .get(&asset_id)
            .copied()
            .unwrap_or_default()
            .to_amount(share, rounding)
    }

    fn transfer(
        &mut self,
        from: Address,
        to: Address,
        asset_id: AssetId,
        share: U256,
    ) -> Result<(), SimError> {
        if !self.assets.contains_key(&asset_id) {
            return Err(SimError::UnknownAsset { asset_id });
        }
        self.debit(from, asset_id, share)?;
        self.credit(to, asset_id, share)
    }

    fn balance_of(&self, owner: Address, asset_id: AssetId) -> U256 {
        self.balances
            .get(&(owner, asset_id))
            .copied()
            .unwrap_or_default()
    }

    fn deposit(&mut self, asset_id: AssetId, to: Address, amount: U256) -> Result<U256, SimError> {
        let asset = self.asset_mut(asset_id)?;
        let share = asset.to_share(amount, RoundingDirection::Down)?;
        asset.total_amount = checked_add(asset.total_amount, amount, "vault total amount")?;
        asset.total_share = checked_add(asset.total_share, share, "vault total share")?;
        self.credit(to, asset_id, share)?;
        Ok(share)
    }

    fn withdraw(
        &mut self,
        asset_id: AssetId,
        from: Address,
        share: U256,
    ) -> Result<U256, SimError> {
        self.debit(from, asset_id, share)?;
        let asset = self.asset_mut(asset_id)?;
        let amount = asset.to_amount(share, RoundingDirection::Down)?;
        asset.total_amount = checked_sub(asset.total_amount, amount, "vault total amount")?;
        asset.total_share = checked_sub(asset.total_share, share, "vault total share")?;
        Ok(amount)
    }
}
