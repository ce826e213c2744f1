//! Market state and its lending operations.
//!
//! A [`Market`] lends one vault asset against one vault collateral. It keeps
//! two rebases:
//!
//! - `total_borrow`: elastic is the debt owed in asset tokens, base is the sum
//!   of borrow parts.
//! - `total_asset`: elastic is the vault shares available to lend, base is the
//!   sum of lender fractions.
//!
//! Tokens never live in the market itself. Collateral and asset shares are
//! held by the market's address in a [`ShareVault`].
//!
//! Every mutating operation is staged: it runs against copies of the market
//! and the vault and only commits when the whole operation succeeds.
//!
//! # Example
//!
//! ```rust
//! use sgl_rs_sim::{Market, MarketConfig, MemoryVault, ShareVault, VaultAsset};
//! use alloy_primitives::{Address, U256};
//!
//! let mut vault = MemoryVault::new();
//! vault.register_asset(1, VaultAsset::default());
//! vault.register_asset(2, VaultAsset::default());
//!
//! let lender = Address::repeat_byte(0x01);
//! let share = vault.deposit(1, lender, U256::from(10_000)).unwrap();
//!
//! let mut market = Market::new(Address::repeat_byte(0x11), 1, 2, MarketConfig::default(), 0);
//! let fraction = market.add_asset(&mut vault, lender, lender, share).unwrap();
//! assert_eq!(fraction, share);
//! ```

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::accrual::{compute_accrual, AccrualOutcome, AccrueInfo, InterestModel};
use crate::error::{AssetId, SimError};
use crate::events::MarketEvent;
use crate::math::{
    checked_add, checked_sub, mul_div_down, RoundingDirection, FEE_PRECISION, UTILIZATION_PRECISION,
};
use crate::oracle::Oracle;
use crate::position::BorrowPosition;
use crate::rebase::Rebase;
use crate::vault::ShareVault;

/// Lender fractions that must remain in the asset pool
pub const MINIMUM_TOTAL_ASSET_BASE: U256 = U256::from_limbs([1_000, 0, 0, 0]);

/// Governance parameters of a market.
///
/// Percentages are scaled by `FEE_PRECISION` (1e5 = 100%); multipliers by
/// `LIQUIDATION_MULTIPLIER_PRECISION` (1e5 = 1x).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Collateral seized per unit of debt in closed-market liquidations
    pub liquidation_multiplier: U256,
    /// Collateral seized per unit of debt in order-book liquidations
    pub order_book_liquidation_multiplier: U256,
    /// Collateral haircut used by the solvency check
    pub closed_collateralization_rate: U256,
    /// Collateral haircut used to size order-book liquidations
    pub lq_collateralization_rate: U256,
    /// Caller's cut of the order-book surplus
    pub caller_fee: U256,
    /// Protocol's cut of interest and of the closed-market surplus
    pub protocol_fee: U256,
    /// Fee added to every new borrow
    pub borrow_opening_fee: U256,
    pub min_liquidator_reward: U256,
    pub max_liquidator_reward: U256,
    /// Margin added on top of the amount to solvency when sizing a closing
    pub liquidation_bonus_amount: U256,
    /// Receiver of the protocol's share of liquidation proceeds
    pub fee_to: Address,
    pub interest_model: InterestModel,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            liquidation_multiplier: U256::from(112_000),
            order_book_liquidation_multiplier: U256::from(127_000),
            closed_collateralization_rate: U256::from(75_000),
            lq_collateralization_rate: U256::from(25_000),
            caller_fee: U256::from(1_000),
            protocol_fee: U256::from(10_000),
            borrow_opening_fee: U256::from(50),
            min_liquidator_reward: U256::from(1_000),
            max_liquidator_reward: U256::from(10_000),
            liquidation_bonus_amount: U256::from(10_000),
            fee_to: Address::ZERO,
            interest_model: InterestModel::default(),
        }
    }
}

/// A Singularity lending market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Market {
    /// Address holding the market's vault shares
    pub address: Address,
    /// Vault id of the lent asset
    pub asset_id: AssetId,
    /// Vault id of the collateral
    pub collateral_id: AssetId,
    pub config: MarketConfig,
    pub total_borrow: Rebase,
    pub total_asset: Rebase,
    /// Sum of all borrowers' collateral shares
    pub total_collateral_share: U256,
    pub accrue_info: AccrueInfo,
    /// Cached oracle rate: collateral per asset, 1e18-scaled
    pub exchange_rate: U256,
    pub positions: BTreeMap<Address, BorrowPosition>,
    /// Lender fraction balances
    pub lenders: BTreeMap<Address, U256>,
    events: Vec<MarketEvent>,
}

impl Market {
    /// Creates an empty market whose interest clock starts at `timestamp`.
    pub fn new(
        address: Address,
        asset_id: AssetId,
        collateral_id: AssetId,
        config: MarketConfig,
        timestamp: u64,
    ) -> Self {
        let accrue_info = AccrueInfo::new(&config.interest_model, timestamp);
        Self {
            address,
            asset_id,
            collateral_id,
            config,
            total_borrow: Rebase::default(),
            total_asset: Rebase::default(),
            total_collateral_share: U256::ZERO,
            accrue_info,
            exchange_rate: U256::ZERO,
            positions: BTreeMap::new(),
            lenders: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Returns the position of `user` (all zeroes if unknown)
    pub fn position(&self, user: Address) -> BorrowPosition {
        self.positions.get(&user).copied().unwrap_or_default()
    }

    pub fn user_borrow_part(&self, user: Address) -> U256 {
        self.position(user).borrow_part
    }

    pub fn user_collateral_share(&self, user: Address) -> U256 {
        self.position(user).collateral_share
    }

    /// Lender fractions held by `lender`
    pub fn balance_of(&self, lender: Address) -> U256 {
        self.lenders.get(&lender).copied().unwrap_or_default()
    }

    /// Events journaled so far
    pub fn events(&self) -> &[MarketEvent] {
        &self.events
    }

    /// Drains the event journal
    pub fn take_events(&mut self) -> Vec<MarketEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn record(&mut self, event: MarketEvent) {
        debug!(market = %self.address, event = event.name(), ?event, "journaled market event");
        self.events.push(event);
    }

    pub(crate) fn position_mut(&mut self, user: Address) -> &mut BorrowPosition {
        self.positions.entry(user).or_default()
    }

    /// Runs `operation` against copies of the market and the vault and
    /// commits both only if it succeeds.
    pub(crate) fn transact<V, T>(
        &mut self,
        vault: &mut V,
        operation: impl FnOnce(&mut Market, &mut V) -> Result<T, SimError>,
    ) -> Result<T, SimError>
    where
        V: ShareVault + Clone,
    {
        let mut staged_market = self.clone();
        let mut staged_vault = vault.clone();

        let result = operation(&mut staged_market, &mut staged_vault)?;

        *self = staged_market;
        *vault = staged_vault;
        Ok(result)
    }

    /// Refreshes the cached exchange rate.
    ///
    /// An oracle failure is tolerated: the cached rate is kept and returned.
    /// Returns whether the rate was updated together with the rate in force.
    pub fn update_exchange_rate(&mut self, oracle: &mut dyn Oracle) -> (bool, U256) {
        let response = oracle.get();
        if response.success {
            self.exchange_rate = response.rate;
            self.record(MarketEvent::LogExchangeRate {
                rate: response.rate,
            });
        } else {
            warn!(
                market = %self.address,
                cached_rate = %self.exchange_rate,
                "oracle query failed, using cached exchange rate"
            );
        }
        (response.success, self.exchange_rate)
    }

    /// Accrues interest up to `timestamp`.
    ///
    /// A second call with the same timestamp is a no-op.
    pub fn accrue(
        &mut self,
        vault: &dyn ShareVault,
        timestamp: u64,
    ) -> Result<AccrualOutcome, SimError> {
        let last_accrued = self.accrue_info.last_accrued;
        if timestamp < last_accrued {
            return Err(SimError::InvalidInterestAccrual {
                timestamp,
                last_accrued,
            });
        }

        let asset_pool_amount =
            vault.to_amount(self.asset_id, self.total_asset.elastic, RoundingDirection::Down)?;
        let outcome = compute_accrual(
            &self.config.interest_model,
            &self.accrue_info,
            self.total_borrow,
            self.total_asset,
            asset_pool_amount,
            self.config.protocol_fee,
            timestamp - last_accrued,
        )?;

        match &outcome {
            AccrualOutcome::Unchanged => {}
            AccrualOutcome::Idle {
                interest_per_second,
                rate_reset,
            } => {
                self.accrue_info.last_accrued = timestamp;
                if *rate_reset {
                    self.accrue_info.interest_per_second = *interest_per_second;
                    self.record(MarketEvent::LogAccrue {
                        accrued_amount: U256::ZERO,
                        fee_fraction: U256::ZERO,
                        rate: *interest_per_second,
                        utilization: U256::ZERO,
                    });
                }
            }
            AccrualOutcome::Accrued(accrual) => {
                self.total_borrow = accrual.total_borrow;
                self.total_asset = accrual.total_asset;
                self.accrue_info.fees_earned_fraction = checked_add(
                    self.accrue_info.fees_earned_fraction,
                    accrual.fee_fraction,
                    "fees earned fraction",
                )?;
                self.accrue_info.interest_per_second = accrual.interest_per_second;
                self.accrue_info.last_accrued = timestamp;
                self.record(MarketEvent::LogAccrue {
                    accrued_amount: accrual.extra_amount,
                    fee_fraction: accrual.fee_fraction,
                    rate: accrual.interest_per_second,
                    utilization: accrual.utilization,
                });
            }
        }

        Ok(outcome)
    }

    /// Deposits `share` asset shares from `from` and mints lender fractions to `to`.
    pub fn add_asset<V: ShareVault + Clone>(
        &mut self,
        vault: &mut V,
        from: Address,
        to: Address,
        share: U256,
    ) -> Result<U256, SimError> {
        self.transact(vault, |market, vault| {
            let borrowed_share =
                vault.to_share(market.asset_id, market.total_borrow.elastic, RoundingDirection::Up)?;
            let all_share = checked_add(market.total_asset.elastic, borrowed_share, "all share")?;

            let fraction = if all_share.is_zero() {
                share
            } else {
                mul_div_down(share, market.total_asset.base, all_share)?
            };

            if checked_add(market.total_asset.base, fraction, "total asset base")?
                < MINIMUM_TOTAL_ASSET_BASE
            {
                return Err(SimError::BelowMinimum);
            }

            market.total_asset = market.total_asset.add_both(share, fraction)?;
            let balance = checked_add(market.balance_of(to), fraction, "lender balance")?;
            market.lenders.insert(to, balance);

            vault.transfer(from, market.address, market.asset_id, share)?;
            market.record(MarketEvent::LogAddAsset {
                from,
                to,
                share,
                fraction,
            });
            Ok(fraction)
        })
    }

    /// Deposits `share` collateral shares from `from` for borrower `to`.
    pub fn add_collateral<V: ShareVault + Clone>(
        &mut self,
        vault: &mut V,
        from: Address,
        to: Address,
        share: U256,
    ) -> Result<(), SimError> {
        self.transact(vault, |market, vault| {
            let position = market.position_mut(to);
            position.collateral_share =
                checked_add(position.collateral_share, share, "user collateral share")?;
            market.total_collateral_share =
                checked_add(market.total_collateral_share, share, "total collateral share")?;

            vault.transfer(from, market.address, market.collateral_id, share)?;
            market.record(MarketEvent::LogAddCollateral { from, to, share });
            Ok(())
        })
    }

    /// Withdraws `share` collateral shares of `from` to `to`.
    ///
    /// The borrower must stay solvent at the cached exchange rate.
    pub fn remove_collateral<V: ShareVault + Clone>(
        &mut self,
        vault: &mut V,
        from: Address,
        to: Address,
        share: U256,
    ) -> Result<(), SimError> {
        self.transact(vault, |market, vault| {
            let position = market.position_mut(from);
            position.collateral_share =
                checked_sub(position.collateral_share, share, "user collateral share")?;
            market.total_collateral_share =
                checked_sub(market.total_collateral_share, share, "total collateral share")?;

            vault.transfer(market.address, to, market.collateral_id, share)?;
            market.record(MarketEvent::LogRemoveCollateral { from, to, share });

            if !market.is_solvent(&*vault, from, market.exchange_rate)? {
                return Err(SimError::Insolvent { user: from });
            }
            Ok(())
        })
    }

    /// Borrows `amount` asset for `from`, sending the shares to `to`.
    ///
    /// The opening fee is added to the debt. Returns the borrow part and the
    /// asset share sent out.
    pub fn borrow<V: ShareVault + Clone>(
        &mut self,
        vault: &mut V,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(U256, U256), SimError> {
        self.transact(vault, |market, vault| {
            let fee_amount = mul_div_down(amount, market.config.borrow_opening_fee, FEE_PRECISION)?;
            let debt = checked_add(amount, fee_amount, "borrow amount")?;
            let (total_borrow, part) = market.total_borrow.add(debt, RoundingDirection::Up)?;
            market.total_borrow = total_borrow;

            let position = market.position_mut(from);
            position.borrow_part = checked_add(position.borrow_part, part, "user borrow part")?;

            let share = vault.to_share(market.asset_id, amount, RoundingDirection::Down)?;
            if market.total_asset.elastic < share {
                return Err(SimError::NotEnoughAssets {
                    available: market.total_asset.elastic,
                    requested: share,
                });
            }
            market.total_asset.elastic -= share;

            vault.transfer(market.address, to, market.asset_id, share)?;
            market.record(MarketEvent::LogBorrow {
                from,
                to,
                amount,
                fee_amount,
                part,
            });

            if !market.is_solvent(&*vault, from, market.exchange_rate)? {
                return Err(SimError::Insolvent { user: from });
            }
            Ok((part, share))
        })
    }

    /// Repays `part` of `to`'s debt with asset shares taken from `from`.
    ///
    /// Returns the debt amount repaid.
    pub fn repay<V: ShareVault + Clone>(
        &mut self,
        vault: &mut V,
        from: Address,
        to: Address,
        part: U256,
    ) -> Result<U256, SimError> {
        self.transact(vault, |market, vault| {
            let (total_borrow, amount) = market.total_borrow.sub(part, RoundingDirection::Up)?;
            market.total_borrow = total_borrow;

            let position = market.position_mut(to);
            position.borrow_part = checked_sub(position.borrow_part, part, "user borrow part")?;

            let share = vault.to_share(market.asset_id, amount, RoundingDirection::Up)?;
            market.total_asset.elastic =
                checked_add(market.total_asset.elastic, share, "total asset elastic")?;

            vault.transfer(from, market.address, market.asset_id, share)?;
            market.record(MarketEvent::LogRepay {
                from,
                to,
                amount,
                part,
            });
            Ok(amount)
        })
    }

    /// Current utilization of the asset pool (1e18-scaled)
    pub fn utilization(&self, vault: &dyn ShareVault) -> Result<U256, SimError> {
        let available =
            vault.to_amount(self.asset_id, self.total_asset.elastic, RoundingDirection::Down)?;
        let full = checked_add(available, self.total_borrow.elastic, "full asset amount")?;
        if full.is_zero() {
            return Ok(U256::ZERO);
        }
        mul_div_down(self.total_borrow.elastic, UTILIZATION_PRECISION, full)
    }
}
