//! Reads a deployed market into a simulation scenario.
//!
//! The chain does not enumerate borrowers or lenders, so the caller names the
//! accounts to include. Everything else (ledgers, parameters, interest model,
//! vault totals and the market's own vault balances) is read from the market
//! and its YieldBox at the latest block.

use alloy::primitives::{Address, U256};
use sgl_rs_sim::scenario::{
    BalanceEntry, LenderEntry, MarketState, PositionEntry, VaultAssetEntry, VaultState,
};
use sgl_rs_sim::{AccrueInfo, AssetId, InterestModel, MarketConfig, Rebase, Scenario};
use tracing::{debug, info};

use crate::error::{ContractError, Result};
use crate::provider::HttpProvider;
use crate::singularity::{ISingularity, IYieldBox};

fn call_failed(what: &str, error: impl std::fmt::Display) -> ContractError {
    ContractError::CallFailed(format!("Failed to get {}: {}", what, error))
}

fn asset_id(value: U256, what: &str) -> Result<AssetId> {
    AssetId::try_from(value)
        .map_err(|_| ContractError::OutOfRange(format!("{} {} does not fit in u64", what, value)))
}

/// Accounts to read besides the market's own state
#[derive(Debug, Clone, Default)]
pub struct SnapshotAccounts {
    pub borrowers: Vec<Address>,
    pub lenders: Vec<Address>,
}

/// Reads market state over JSON-RPC.
pub struct SnapshotReader<'a> {
    provider: &'a HttpProvider,
}

impl<'a> SnapshotReader<'a> {
    pub fn new(provider: &'a HttpProvider) -> Self {
        Self { provider }
    }

    /// Reads `market` into a scenario whose clock is `timestamp`.
    ///
    /// Accounts with no debt, collateral or lender balance are left out.
    pub async fn read(
        &self,
        market: Address,
        accounts: &SnapshotAccounts,
        timestamp: u64,
    ) -> Result<Scenario> {
        let contract = ISingularity::new(market, self.provider);

        let asset = asset_id(
            contract.assetId().call().await.map_err(|e| call_failed("asset id", e))?,
            "asset id",
        )?;
        let collateral = asset_id(
            contract
                .collateralId()
                .call()
                .await
                .map_err(|e| call_failed("collateral id", e))?,
            "collateral id",
        )?;
        let yield_box = contract
            .yieldBox()
            .call()
            .await
            .map_err(|e| call_failed("yieldBox", e))?;

        let config = self.read_config(&contract).await?;

        let total_asset = contract
            .totalAsset()
            .call()
            .await
            .map_err(|e| call_failed("total asset", e))?;
        let total_borrow = contract
            .totalBorrow()
            .call()
            .await
            .map_err(|e| call_failed("total borrow", e))?;
        let total_collateral_share = contract
            .totalCollateralShare()
            .call()
            .await
            .map_err(|e| call_failed("total collateral share", e))?;
        let accrue_info = contract
            .accrueInfo()
            .call()
            .await
            .map_err(|e| call_failed("accrue info", e))?;
        let exchange_rate = contract
            .exchangeRate()
            .call()
            .await
            .map_err(|e| call_failed("exchange rate", e))?;

        let mut positions = Vec::new();
        for &user in &accounts.borrowers {
            let borrow_part = contract
                .userBorrowPart(user)
                .call()
                .await
                .map_err(|e| call_failed("user borrow part", e))?;
            let collateral_share = contract
                .userCollateralShare(user)
                .call()
                .await
                .map_err(|e| call_failed("user collateral share", e))?;
            if borrow_part.is_zero() && collateral_share.is_zero() {
                debug!(%user, "skipping account without a position");
                continue;
            }
            positions.push(PositionEntry {
                user,
                borrow_part,
                collateral_share,
            });
        }

        let mut lenders = Vec::new();
        for &lender in &accounts.lenders {
            let fraction = contract
                .balanceOf(lender)
                .call()
                .await
                .map_err(|e| call_failed("lender balance", e))?;
            if !fraction.is_zero() {
                lenders.push(LenderEntry { lender, fraction });
            }
        }

        let vault = self.read_vault(yield_box, market, [asset, collateral]).await?;

        info!(
            %market,
            positions = positions.len(),
            lenders = lenders.len(),
            %exchange_rate,
            "read market snapshot"
        );

        Ok(Scenario {
            timestamp,
            market: MarketState {
                address: market,
                asset_id: asset,
                collateral_id: collateral,
                config,
                total_borrow: Rebase::new(
                    U256::from(total_borrow.elastic),
                    U256::from(total_borrow.base),
                ),
                total_asset: Rebase::new(
                    U256::from(total_asset.elastic),
                    U256::from(total_asset.base),
                ),
                total_collateral_share: Some(total_collateral_share),
                accrue_info: Some(AccrueInfo {
                    interest_per_second: accrue_info.interestPerSecond,
                    last_accrued: accrue_info.lastAccrued,
                    fees_earned_fraction: U256::from(accrue_info.feesEarnedFraction),
                }),
                exchange_rate,
                positions,
                lenders,
            },
            vault,
            oracle: None,
            swappers: Vec::new(),
            allowed_swappers: None,
            order_book: None,
        })
    }

    async fn read_config(
        &self,
        contract: &ISingularity::ISingularityInstance<&HttpProvider>,
    ) -> Result<MarketConfig> {
        let interest_model = InterestModel {
            starting_interest_per_second: contract
                .startingInterestPerSecond()
                .call()
                .await
                .map_err(|e| call_failed("starting interest", e))?,
            minimum_interest_per_second: contract
                .minimumInterestPerSecond()
                .call()
                .await
                .map_err(|e| call_failed("minimum interest", e))?,
            maximum_interest_per_second: contract
                .maximumInterestPerSecond()
                .call()
                .await
                .map_err(|e| call_failed("maximum interest", e))?,
            interest_elasticity: contract
                .interestElasticity()
                .call()
                .await
                .map_err(|e| call_failed("interest elasticity", e))?,
            minimum_target_utilization: contract
                .minimumTargetUtilization()
                .call()
                .await
                .map_err(|e| call_failed("minimum target utilization", e))?,
            maximum_target_utilization: contract
                .maximumTargetUtilization()
                .call()
                .await
                .map_err(|e| call_failed("maximum target utilization", e))?,
        };

        Ok(MarketConfig {
            liquidation_multiplier: contract
                .liquidationMultiplier()
                .call()
                .await
                .map_err(|e| call_failed("liquidation multiplier", e))?,
            order_book_liquidation_multiplier: contract
                .orderBookLiquidationMultiplier()
                .call()
                .await
                .map_err(|e| call_failed("order book liquidation multiplier", e))?,
            closed_collateralization_rate: contract
                .closedCollateralizationRate()
                .call()
                .await
                .map_err(|e| call_failed("closed collateralization rate", e))?,
            lq_collateralization_rate: contract
                .lqCollateralizationRate()
                .call()
                .await
                .map_err(|e| call_failed("lq collateralization rate", e))?,
            caller_fee: contract
                .callerFee()
                .call()
                .await
                .map_err(|e| call_failed("caller fee", e))?,
            protocol_fee: contract
                .protocolFee()
                .call()
                .await
                .map_err(|e| call_failed("protocol fee", e))?,
            borrow_opening_fee: contract
                .borrowOpeningFee()
                .call()
                .await
                .map_err(|e| call_failed("borrow opening fee", e))?,
            min_liquidator_reward: contract
                .minLiquidatorReward()
                .call()
                .await
                .map_err(|e| call_failed("min liquidator reward", e))?,
            max_liquidator_reward: contract
                .maxLiquidatorReward()
                .call()
                .await
                .map_err(|e| call_failed("max liquidator reward", e))?,
            liquidation_bonus_amount: contract
                .liquidationBonusAmount()
                .call()
                .await
                .map_err(|e| call_failed("liquidation bonus amount", e))?,
            fee_to: contract
                .feeTo()
                .call()
                .await
                .map_err(|e| call_failed("fee receiver", e))?,
            interest_model,
        })
    }

    async fn read_vault(
        &self,
        yield_box: Address,
        market: Address,
        asset_ids: [AssetId; 2],
    ) -> Result<VaultState> {
        let contract = IYieldBox::new(yield_box, self.provider);
        let mut state = VaultState::default();

        for asset_id in asset_ids {
            let id = U256::from(asset_id);
            let totals = contract
                .assetTotals(id)
                .call()
                .await
                .map_err(|e| call_failed("asset totals", e))?;
            let share = contract
                .balanceOf(market, id)
                .call()
                .await
                .map_err(|e| call_failed("market vault balance", e))?;

            state.assets.push(VaultAssetEntry {
                asset_id,
                total_amount: totals.totalAmount,
                total_share: totals.totalShare,
            });
            state.balances.push(BalanceEntry {
                owner: market,
                asset_id,
                share,
            });
        }

        Ok(state)
    }
}
