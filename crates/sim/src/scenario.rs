//! Scenario files.
//!
//! A [`Scenario`] is the serializable description of a whole simulation world:
//! market state and parameters, vault contents, oracle answer, swappers and an
//! optional order book. [`Scenario::build`] validates it and turns it into a
//! [`World`] that operations can run against; [`Scenario::from_world`] goes
//! the other way so post-operation state can be written back out.
//!
//! Amounts are `U256` and accept both decimal and `0x`-prefixed strings.
//! Omitted market parameters take their deployment defaults.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::accrual::{AccrualOutcome, AccrueInfo};
use crate::error::{AssetId, SimError};
use crate::liquidation::{Collaborators, LiquidationOutcome, LiquidationRequest};
use crate::market::{Market, MarketConfig};
use crate::math::{checked_add, RoundingDirection};
use crate::oracle::FixedOracle;
use crate::order_book::{BidBook, LiquidationQueue};
use crate::position::BorrowPosition;
use crate::rebase::Rebase;
use crate::solvency::SolvencyReport;
use crate::swapper::{AllowList, RateSwapper, Swapper};
use crate::vault::{MemoryVault, ShareVault, VaultAsset};

/// Serializable simulation world
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Simulation clock (unix seconds)
    pub timestamp: u64,
    pub market: MarketState,
    #[serde(default)]
    pub vault: VaultState,
    /// Defaults to an oracle answering the market's cached rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle: Option<FixedOracle>,
    #[serde(default)]
    pub swappers: Vec<RateSwapper>,
    /// Defaults to every listed swapper
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_swappers: Option<Vec<Address>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_book: Option<BidBook>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketState {
    pub address: Address,
    pub asset_id: AssetId,
    pub collateral_id: AssetId,
    #[serde(default)]
    pub config: MarketConfig,
    #[serde(default)]
    pub total_borrow: Rebase,
    #[serde(default)]
    pub total_asset: Rebase,
    /// Defaults to the sum of the positions' collateral
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_collateral_share: Option<U256>,
    /// Defaults to a fresh accrual clock at the scenario timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrue_info: Option<AccrueInfo>,
    #[serde(default)]
    pub exchange_rate: U256,
    #[serde(default)]
    pub positions: Vec<PositionEntry>,
    #[serde(default)]
    pub lenders: Vec<LenderEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionEntry {
    pub user: Address,
    #[serde(default)]
    pub borrow_part: U256,
    #[serde(default)]
    pub collateral_share: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LenderEntry {
    pub lender: Address,
    pub fraction: U256,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultState {
    #[serde(default)]
    pub assets: Vec<VaultAssetEntry>,
    /// Share balances. The market's own balances default to its book totals.
    #[serde(default)]
    pub balances: Vec<BalanceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultAssetEntry {
    pub asset_id: AssetId,
    pub total_amount: U256,
    pub total_share: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub owner: Address,
    pub asset_id: AssetId,
    pub share: U256,
}

/// A market together with everything it talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct World {
    pub timestamp: u64,
    pub market: Market,
    pub vault: MemoryVault,
    pub oracle: FixedOracle,
    pub registry: AllowList,
    pub swappers: Vec<RateSwapper>,
    pub order_book: Option<BidBook>,
}

fn invalid(message: impl Into<String>) -> SimError {
    SimError::InvalidScenario(message.into())
}

impl Scenario {
    /// Validates the scenario and builds its world.
    pub fn build(self) -> Result<World, SimError> {
        let state = self.market;
        if state.asset_id == state.collateral_id {
            return Err(invalid("asset and collateral must be different vault assets"));
        }

        let mut vault = MemoryVault::new();
        for entry in &self.vault.assets {
            if vault.asset(entry.asset_id).is_some() {
                return Err(invalid(format!("vault asset {} listed twice", entry.asset_id)));
            }
            vault.register_asset(
                entry.asset_id,
                VaultAsset {
                    total_amount: entry.total_amount,
                    total_share: entry.total_share,
                },
            );
        }
        for asset_id in [state.asset_id, state.collateral_id] {
            if vault.asset(asset_id).is_none() {
                return Err(invalid(format!("vault asset {asset_id} is not registered")));
            }
        }

        let mut positions = BTreeMap::new();
        let mut collateral_sum = U256::ZERO;
        for entry in &state.positions {
            let position = BorrowPosition::new(entry.borrow_part, entry.collateral_share);
            if positions.insert(entry.user, position).is_some() {
                return Err(invalid(format!("position of {} listed twice", entry.user)));
            }
            collateral_sum = checked_add(collateral_sum, entry.collateral_share, "collateral sum")?;
        }
        let total_collateral_share = state.total_collateral_share.unwrap_or(collateral_sum);

        let mut listed = BTreeSet::new();
        for entry in &self.vault.balances {
            if vault.asset(entry.asset_id).is_none() {
                return Err(invalid(format!(
                    "balance of {} in unregistered asset {}",
                    entry.owner, entry.asset_id
                )));
            }
            if !listed.insert((entry.owner, entry.asset_id)) {
                return Err(invalid(format!(
                    "balance of {} in asset {} listed twice",
                    entry.owner, entry.asset_id
                )));
            }
            vault.set_balance(entry.owner, entry.asset_id, entry.share);
        }
        if !listed.contains(&(state.address, state.collateral_id)) {
            vault.set_balance(state.address, state.collateral_id, total_collateral_share);
        }
        if !listed.contains(&(state.address, state.asset_id)) {
            vault.set_balance(state.address, state.asset_id, state.total_asset.elastic);
        }

        let mut outstanding: BTreeMap<AssetId, U256> = BTreeMap::new();
        for (_, asset_id, share) in vault.balances() {
            let total = outstanding.entry(asset_id).or_default();
            *total = checked_add(*total, share, "vault balances")?;
        }
        for (asset_id, held) in outstanding {
            let total_share = vault.asset(asset_id).map(|asset| asset.total_share).unwrap_or_default();
            if held > total_share {
                return Err(invalid(format!(
                    "balances of asset {asset_id} ({held}) exceed its total share ({total_share})"
                )));
            }
        }

        if let Some(book) = &self.order_book {
            if book.market != state.address {
                return Err(invalid("order book pays a different market"));
            }
            if book.asset_id != state.asset_id || book.collateral_id != state.collateral_id {
                return Err(invalid("order book trades different vault assets"));
            }
        }

        let accrue_info = state
            .accrue_info
            .unwrap_or_else(|| AccrueInfo::new(&state.config.interest_model, self.timestamp));

        let mut market = Market::new(
            state.address,
            state.asset_id,
            state.collateral_id,
            state.config,
            self.timestamp,
        );
        market.total_borrow = state.total_borrow;
        market.total_asset = state.total_asset;
        market.total_collateral_share = total_collateral_share;
        market.accrue_info = accrue_info;
        market.exchange_rate = state.exchange_rate;
        market.positions = positions;
        market.lenders = state
            .lenders
            .into_iter()
            .map(|entry| (entry.lender, entry.fraction))
            .collect();

        let registry: AllowList = match self.allowed_swappers {
            Some(allowed) => allowed.into_iter().collect(),
            None => self.swappers.iter().map(|swapper| swapper.address).collect(),
        };

        Ok(World {
            timestamp: self.timestamp,
            oracle: self
                .oracle
                .unwrap_or_else(|| FixedOracle::new(market.exchange_rate)),
            market,
            vault,
            registry,
            swappers: self.swappers,
            order_book: self.order_book,
        })
    }

    /// Describes the current state of `world`.
    pub fn from_world(world: &World) -> Self {
        let market = &world.market;
        Scenario {
            timestamp: world.timestamp,
            market: MarketState {
                address: market.address,
                asset_id: market.asset_id,
                collateral_id: market.collateral_id,
                config: market.config.clone(),
                total_borrow: market.total_borrow,
                total_asset: market.total_asset,
                total_collateral_share: Some(market.total_collateral_share),
                accrue_info: Some(market.accrue_info),
                exchange_rate: market.exchange_rate,
                positions: market
                    .positions
                    .iter()
                    .map(|(user, position)| PositionEntry {
                        user: *user,
                        borrow_part: position.borrow_part,
                        collateral_share: position.collateral_share,
                    })
                    .collect(),
                lenders: market
                    .lenders
                    .iter()
                    .map(|(lender, fraction)| LenderEntry {
                        lender: *lender,
                        fraction: *fraction,
                    })
                    .collect(),
            },
            vault: VaultState {
                assets: world
                    .vault
                    .assets()
                    .map(|(asset_id, asset)| VaultAssetEntry {
                        asset_id,
                        total_amount: asset.total_amount,
                        total_share: asset.total_share,
                    })
                    .collect(),
                balances: world
                    .vault
                    .balances()
                    .map(|(owner, asset_id, share)| BalanceEntry {
                        owner,
                        asset_id,
                        share,
                    })
                    .collect(),
            },
            oracle: Some(world.oracle),
            swappers: world.swappers.clone(),
            allowed_swappers: Some(world.registry.iter().collect()),
            order_book: world.order_book.clone(),
        }
    }
}

impl World {
    /// Accrues interest up to `timestamp` and advances the clock
    pub fn accrue(&mut self, timestamp: u64) -> Result<AccrualOutcome, SimError> {
        let outcome = self.market.accrue(&self.vault, timestamp)?;
        self.timestamp = timestamp;
        Ok(outcome)
    }

    /// Runs a liquidation against this world's collaborators.
    ///
    /// On error every collaborator is left as it was, including the bid book
    /// and the swappers the market rolled forward before the batch aborted.
    pub fn liquidate(
        &mut self,
        request: &LiquidationRequest,
    ) -> Result<LiquidationOutcome, SimError> {
        let staged_book = self.order_book.clone();
        let staged_swappers = self.swappers.clone();

        let collaborators = Collaborators {
            vault: &mut self.vault,
            oracle: &mut self.oracle,
            registry: &self.registry,
            order_book: self
                .order_book
                .as_mut()
                .map(|book| book as &mut dyn LiquidationQueue),
            swappers: self
                .swappers
                .iter_mut()
                .map(|swapper| swapper as &mut dyn Swapper)
                .collect(),
        };
        let outcome = match self.market.liquidate(request, collaborators) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.order_book = staged_book;
                self.swappers = staged_swappers;
                return Err(e);
            }
        };
        self.timestamp = self.timestamp.max(request.timestamp);
        Ok(outcome)
    }

    /// Solvency summaries of every borrower at the cached exchange rate
    pub fn solvency_reports(&self) -> Result<Vec<SolvencyReport>, SimError> {
        self.market.solvency_reports(&self.vault, self.market.exchange_rate)
    }

    /// Asset amount held by `owner` in the vault
    pub fn asset_amount_of(&self, owner: Address) -> Result<U256, SimError> {
        let share = self.vault.balance_of(owner, self.market.asset_id);
        self.vault
            .to_amount(self.market.asset_id, share, RoundingDirection::Down)
    }
}
