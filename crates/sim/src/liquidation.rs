//! Batch liquidation.
//!
//! [`Market::liquidate`] refreshes the exchange rate, accrues interest and then
//! settles a batch of borrowers through one of two venues:
//!
//! - **Order book**: when the next bid pool can cover the sum of the requested
//!   borrow parts, every insolvent borrower is closed down to solvency and the
//!   seized collateral is sold to the pool in one go. The caller earns a flat
//!   `caller_fee` of the surplus.
//! - **Closed market**: otherwise each insolvent borrower is settled on its own
//!   through an allow-listed swapper. The surplus is split between the
//!   protocol (`protocol_fee`) and the caller (a reward interpolated on the
//!   borrower's pre-liquidation debt).
//!
//! Solvent borrowers in a batch are skipped. Anything else that goes wrong
//! aborts the whole batch and leaves the market and vault untouched.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SimError;
use crate::events::MarketEvent;
use crate::market::Market;
use crate::math::{
    checked_add, checked_mul, checked_sub, min, mul_div_down, RoundingDirection,
    EXCHANGE_RATE_PRECISION, FEE_PRECISION, LIQUIDATION_MULTIPLIER_PRECISION,
};
use crate::oracle::Oracle;
use crate::order_book::LiquidationQueue;
use crate::solvency::get_caller_reward;
use crate::swapper::{decode_min_amount_out, SwapRequest, Swapper, SwapperRegistry};
use crate::vault::ShareVault;

/// Arguments of a `liquidate` call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationRequest {
    pub users: Vec<Address>,
    /// Upper bound on the borrow part closed per user
    pub max_borrow_parts: Vec<U256>,
    /// Swapper used by the closed-market path
    pub swapper: Address,
    /// ABI-encoded `uint256` minimum swap output, or empty
    #[serde(default)]
    pub collateral_to_asset_swap_data: Bytes,
    /// Passed through to the order book
    #[serde(default)]
    pub usdo_to_borrowed_swap_data: Bytes,
    /// Receiver of the caller's share
    pub caller: Address,
    pub timestamp: u64,
}

/// External contracts a liquidation talks to
pub struct Collaborators<'a, V> {
    pub vault: &'a mut V,
    pub oracle: &'a mut dyn Oracle,
    pub registry: &'a dyn SwapperRegistry,
    pub order_book: Option<&'a mut dyn LiquidationQueue>,
    /// Swappers reachable by address
    pub swappers: Vec<&'a mut dyn Swapper>,
}

/// Venue a batch was settled through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum LiquidationPath {
    OrderBook { pool_index: u64 },
    Closed,
}

/// What happened to one borrower
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLiquidation {
    pub user: Address,
    pub borrow_part: U256,
    pub borrow_amount: U256,
    pub collateral_share: U256,
    /// Caller reward percentage applied (closed path only)
    pub caller_reward: U256,
}

/// Result of a successful `liquidate` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationOutcome {
    pub path: LiquidationPath,
    pub exchange_rate: U256,
    /// Whether the oracle answered (otherwise the cached rate was used)
    pub oracle_updated: bool,
    pub users: Vec<UserLiquidation>,
    /// Asset shares received from the venue
    pub returned_share: U256,
    /// Asset shares that repaid the closed debt
    pub borrow_share: U256,
    pub caller_share: U256,
    pub protocol_share: U256,
    /// Asset shares credited to lenders
    pub credited_share: U256,
    pub events: Vec<MarketEvent>,
}

/// Running totals of a batch
#[derive(Debug, Default)]
struct Settlement {
    users: Vec<UserLiquidation>,
    returned_share: U256,
    borrow_share: U256,
    caller_share: U256,
    protocol_share: U256,
    credited_share: U256,
}

impl Settlement {
    fn absorb(&mut self, other: Settlement) -> Result<(), SimError> {
        self.users.extend(other.users);
        self.returned_share = checked_add(self.returned_share, other.returned_share, "returned share")?;
        self.borrow_share = checked_add(self.borrow_share, other.borrow_share, "borrow share")?;
        self.caller_share = checked_add(self.caller_share, other.caller_share, "caller share")?;
        self.protocol_share = checked_add(self.protocol_share, other.protocol_share, "protocol share")?;
        self.credited_share = checked_add(self.credited_share, other.credited_share, "credited share")?;
        Ok(())
    }
}

/// Collateral share seized for `borrow_amount` of debt
fn seized_collateral_share(
    market: &Market,
    vault: &dyn ShareVault,
    borrow_amount: U256,
    exchange_rate: U256,
    multiplier: U256,
) -> Result<U256, SimError> {
    let scaled = checked_mul(borrow_amount, multiplier, "seized collateral")?;
    let collateral_amount = mul_div_down(
        scaled,
        exchange_rate,
        LIQUIDATION_MULTIPLIER_PRECISION * EXCHANGE_RATE_PRECISION,
    )?;
    vault.to_share(market.collateral_id, collateral_amount, RoundingDirection::Down)
}

impl Market {
    /// Liquidates a batch of borrowers.
    ///
    /// The call is atomic: on error the market and the vault are restored to
    /// their state at entry. Other collaborators are the caller's to stage, as
    /// [`World::liquidate`](crate::scenario::World::liquidate) does.
    pub fn liquidate<V: ShareVault + Clone>(
        &mut self,
        request: &LiquidationRequest,
        collaborators: Collaborators<'_, V>,
    ) -> Result<LiquidationOutcome, SimError> {
        if request.users.len() != request.max_borrow_parts.len() {
            return Err(SimError::LengthMismatch {
                users: request.users.len(),
                parts: request.max_borrow_parts.len(),
            });
        }

        let Collaborators {
            vault,
            oracle,
            registry,
            mut order_book,
            mut swappers,
        } = collaborators;

        self.transact(vault, |market, vault| {
            let first_event = market.events().len();

            let (oracle_updated, exchange_rate) = market.update_exchange_rate(oracle);
            market.accrue(&*vault, request.timestamp)?;

            let order_book_pool = match order_book.as_deref_mut() {
                Some(book) => {
                    let pool = book.get_next_avail_bid_pool();
                    let needed = request
                        .max_borrow_parts
                        .iter()
                        .try_fold(U256::ZERO, |sum, part| checked_add(sum, *part, "needed"))?;
                    (pool.available && pool.total_amount >= needed).then_some((book, pool))
                }
                None => None,
            };

            let (path, settlement) = match order_book_pool {
                Some((book, pool)) => {
                    info!(
                        market = %market.address,
                        pool_index = pool.pool_index,
                        bid_amount = %pool.total_amount,
                        users = request.users.len(),
                        "liquidating through the order book"
                    );
                    let settlement =
                        market.order_book_liquidation(vault, book, request, exchange_rate)?;
                    (
                        LiquidationPath::OrderBook {
                            pool_index: pool.pool_index,
                        },
                        settlement,
                    )
                }
                None => {
                    info!(
                        market = %market.address,
                        swapper = %request.swapper,
                        users = request.users.len(),
                        "liquidating through the closed market"
                    );
                    let settlement = market.closed_liquidation(
                        vault,
                        registry,
                        &mut swappers,
                        request,
                        exchange_rate,
                    )?;
                    (LiquidationPath::Closed, settlement)
                }
            };

            info!(
                market = %market.address,
                liquidated = settlement.users.len(),
                returned_share = %settlement.returned_share,
                caller_share = %settlement.caller_share,
                protocol_share = %settlement.protocol_share,
                credited_share = %settlement.credited_share,
                "liquidation settled"
            );

            Ok(LiquidationOutcome {
                path,
                exchange_rate,
                oracle_updated,
                users: settlement.users,
                returned_share: settlement.returned_share,
                borrow_share: settlement.borrow_share,
                caller_share: settlement.caller_share,
                protocol_share: settlement.protocol_share,
                credited_share: settlement.credited_share,
                events: market.events()[first_event..].to_vec(),
            })
        })
    }

    fn order_book_liquidation(
        &mut self,
        vault: &mut dyn ShareVault,
        book: &mut dyn LiquidationQueue,
        request: &LiquidationRequest,
        exchange_rate: U256,
    ) -> Result<Settlement, SimError> {
        let queue = book.address();
        let mut settlement = Settlement::default();
        let mut all_borrow_amount = U256::ZERO;
        let mut all_borrow_part = U256::ZERO;
        let mut all_collateral_share = U256::ZERO;

        for &user in &request.users {
            if self.is_solvent(&*vault, user, exchange_rate)? {
                debug!(%user, "skipping solvent borrower");
                continue;
            }

            let borrow_amount = self.compute_amount_to_solvency(&*vault, user, exchange_rate)?;
            if borrow_amount.is_zero() {
                continue;
            }

            let borrow_part = self.total_borrow.to_base(borrow_amount, RoundingDirection::Down)?;
            let collateral_share = seized_collateral_share(
                self,
                &*vault,
                borrow_amount,
                exchange_rate,
                self.config.order_book_liquidation_multiplier,
            )?;

            let position = self.position_mut(user);
            position.borrow_part = checked_sub(position.borrow_part, borrow_part, "user borrow part")?;
            position.collateral_share =
                checked_sub(position.collateral_share, collateral_share, "user collateral share")?;

            self.record(MarketEvent::LogRemoveCollateral {
                from: user,
                to: queue,
                share: collateral_share,
            });
            self.record(MarketEvent::LogRepay {
                from: queue,
                to: user,
                amount: borrow_amount,
                part: borrow_part,
            });
            debug!(%user, %borrow_amount, %borrow_part, %collateral_share, "closed borrower to solvency");

            all_borrow_amount = checked_add(all_borrow_amount, borrow_amount, "all borrow amount")?;
            all_borrow_part = checked_add(all_borrow_part, borrow_part, "all borrow part")?;
            all_collateral_share =
                checked_add(all_collateral_share, collateral_share, "all collateral share")?;

            settlement.users.push(UserLiquidation {
                user,
                borrow_part,
                borrow_amount,
                collateral_share,
                caller_reward: self.config.caller_fee,
            });
        }

        if all_borrow_amount.is_zero() {
            return Err(SimError::Solvent);
        }

        self.total_borrow = self.total_borrow.sub_both(all_borrow_amount, all_borrow_part)?;
        self.total_collateral_share = checked_sub(
            self.total_collateral_share,
            all_collateral_share,
            "total collateral share",
        )?;

        let balance_before = vault.balance_of(self.address, self.asset_id);
        vault.transfer(self.address, queue, self.collateral_id, all_collateral_share)?;
        let collateral_amount =
            vault.to_amount(self.collateral_id, all_collateral_share, RoundingDirection::Down)?;
        let execution = book.execute_bids(
            &mut *vault,
            collateral_amount,
            &request.usdo_to_borrowed_swap_data,
        )?;
        let balance_after = vault.balance_of(self.address, self.asset_id);
        debug!(
            amount_executed = %execution.amount_executed,
            collateral_liquidated = %execution.collateral_liquidated,
            "order book executed bids"
        );

        let returned_share = checked_sub(balance_after, balance_before, "returned share")?;
        let borrow_share = vault.to_share(self.asset_id, all_borrow_amount, RoundingDirection::Up)?;
        let extra_share = returned_share
            .checked_sub(borrow_share)
            .ok_or(SimError::NotEnoughReturned {
                returned: returned_share,
                needed: borrow_share,
            })?;

        let caller_share = mul_div_down(extra_share, self.config.caller_fee, FEE_PRECISION)?;
        vault.transfer(self.address, request.caller, self.asset_id, caller_share)?;

        let credited_share = checked_sub(returned_share, caller_share, "credited share")?;
        self.total_asset.elastic =
            checked_add(self.total_asset.elastic, credited_share, "total asset elastic")?;
        self.record(MarketEvent::LogAddAsset {
            from: queue,
            to: self.address,
            share: credited_share,
            fraction: U256::ZERO,
        });

        settlement.returned_share = returned_share;
        settlement.borrow_share = borrow_share;
        settlement.caller_share = caller_share;
        settlement.credited_share = credited_share;
        Ok(settlement)
    }

    fn closed_liquidation(
        &mut self,
        vault: &mut dyn ShareVault,
        registry: &dyn SwapperRegistry,
        swappers: &mut [&mut dyn Swapper],
        request: &LiquidationRequest,
        exchange_rate: U256,
    ) -> Result<Settlement, SimError> {
        let invalid_swapper = SimError::InvalidSwapper {
            swapper: request.swapper,
        };
        if !registry.is_swapper(request.swapper) {
            return Err(invalid_swapper);
        }
        let swapper = swappers
            .iter_mut()
            .find(|swapper| swapper.address() == request.swapper)
            .ok_or(invalid_swapper)?;

        let mut settlement = Settlement::default();
        for (&user, &max_borrow_part) in request.users.iter().zip(&request.max_borrow_parts) {
            if self.is_solvent(&*vault, user, exchange_rate)? {
                debug!(%user, "skipping solvent borrower");
                continue;
            }

            let user_settlement = self.liquidate_user(
                vault,
                &mut **swapper,
                request,
                user,
                max_borrow_part,
                exchange_rate,
            )?;
            settlement.absorb(user_settlement)?;
        }

        if settlement.users.is_empty() {
            return Err(SimError::NoUsersFound);
        }
        Ok(settlement)
    }

    fn liquidate_user(
        &mut self,
        vault: &mut dyn ShareVault,
        swapper: &mut dyn Swapper,
        request: &LiquidationRequest,
        user: Address,
        max_borrow_part: U256,
        exchange_rate: U256,
    ) -> Result<Settlement, SimError> {
        let swapper_address = swapper.address();

        // the reward is priced on the debt before anything is closed
        let (start_tvl, max_tvl) = self.compute_min_and_max_ltv_in_asset(
            &*vault,
            self.user_collateral_share(user),
            exchange_rate,
        )?;
        let caller_reward =
            get_caller_reward(&self.config, self.borrowed_amount(user)?, start_tvl, max_tvl)?;

        let closing_factor = self.compute_closing_factor(&*vault, user, exchange_rate)?;
        let borrow_part = min(max_borrow_part, closing_factor);
        let borrow_amount = self.total_borrow.to_elastic(borrow_part, RoundingDirection::Down)?;
        let collateral_share = seized_collateral_share(
            self,
            &*vault,
            borrow_amount,
            exchange_rate,
            self.config.liquidation_multiplier,
        )?;

        let position = self.position_mut(user);
        position.borrow_part = checked_sub(position.borrow_part, borrow_part, "user borrow part")?;
        position.collateral_share =
            checked_sub(position.collateral_share, collateral_share, "user collateral share")?;

        if borrow_amount.is_zero() {
            return Err(SimError::Solvent);
        }

        self.total_borrow = self.total_borrow.sub_both(borrow_amount, borrow_part)?;
        // the position check above bounds the seized share by the total
        self.total_collateral_share = checked_sub(
            self.total_collateral_share,
            collateral_share,
            "total collateral share",
        )?;

        self.record(MarketEvent::LogRemoveCollateral {
            from: user,
            to: swapper_address,
            share: collateral_share,
        });
        self.record(MarketEvent::LogRepay {
            from: swapper_address,
            to: user,
            amount: borrow_amount,
            part: borrow_part,
        });
        debug!(%user, %borrow_amount, %borrow_part, %collateral_share, %caller_reward, "closing borrower");

        let borrow_share = vault.to_share(self.asset_id, borrow_amount, RoundingDirection::Up)?;
        let min_amount_out = decode_min_amount_out(&request.collateral_to_asset_swap_data)?;

        let balance_before = vault.balance_of(self.address, self.asset_id);
        vault.transfer(self.address, swapper_address, self.collateral_id, collateral_share)?;
        let output = swapper.swap(
            &mut *vault,
            SwapRequest {
                token_in: self.collateral_id,
                token_out: self.asset_id,
                share_in: collateral_share,
                to: self.address,
                min_amount_out,
                dex_data: &request.collateral_to_asset_swap_data,
            },
        )?;
        if output.amount_out < min_amount_out {
            return Err(SimError::MinLimit {
                min: min_amount_out,
                received: output.amount_out,
            });
        }
        let balance_after = vault.balance_of(self.address, self.asset_id);

        let returned_share = checked_sub(balance_after, balance_before, "returned share")?;
        let extra_share = returned_share
            .checked_sub(borrow_share)
            .ok_or(SimError::NotEnoughReturned {
                returned: returned_share,
                needed: borrow_share,
            })?;

        let protocol_share = mul_div_down(extra_share, self.config.protocol_fee, FEE_PRECISION)?;
        let caller_share = mul_div_down(extra_share, caller_reward, FEE_PRECISION)?;
        vault.transfer(self.address, self.config.fee_to, self.asset_id, protocol_share)?;
        vault.transfer(self.address, request.caller, self.asset_id, caller_share)?;

        let paid_out = checked_add(protocol_share, caller_share, "liquidation fees")?;
        let credited_share = checked_sub(returned_share, paid_out, "credited share")?;
        self.total_asset.elastic =
            checked_add(self.total_asset.elastic, credited_share, "total asset elastic")?;
        self.record(MarketEvent::LogAddAsset {
            from: swapper_address,
            to: self.address,
            share: credited_share,
            fraction: U256::ZERO,
        });

        Ok(Settlement {
            users: vec![UserLiquidation {
                user,
                borrow_part,
                borrow_amount,
                collateral_share,
                caller_reward,
            }],
            returned_share,
            borrow_share,
            caller_share,
            protocol_share,
            credited_share,
        })
    }
}
