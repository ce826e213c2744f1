//! Solvency checks and liquidation sizing.
//!
//! All values are in asset token units unless noted otherwise. The exchange
//! rate is collateral per asset scaled by `EXCHANGE_RATE_PRECISION`, so a
//! collateral amount converts to asset as `amount * 1e18 / rate`.
//!
//! Two haircuts are applied to collateral:
//!
//! - `closed_collateralization_rate` (75%) decides solvency and bounds the
//!   liquidator reward curve.
//! - `lq_collateralization_rate` (25%) sizes the amount to solvency, which is
//!   what an order-book liquidation closes.
//!
//! These functions assume interest has been accrued in the same unit of work.

use alloy_primitives::{Address, I256, U256};
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::market::{Market, MarketConfig};
use crate::math::{
    checked_add, checked_mul, mul_div_down, RoundingDirection, COLLATERALIZATION_RATE_PRECISION,
    EXCHANGE_RATE_PRECISION, FEE_PRECISION,
};
use crate::position::PositionState;
use crate::vault::ShareVault;

/// Scale turning `share * rate_in_1e5` into a 1e18-scaled collateral value
const COLLATERAL_SCALE: U256 = U256::from_limbs([10_000_000_000_000, 0, 0, 0]); // 1e18 / 1e5

/// Per-borrower solvency summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvencyReport {
    pub user: Address,
    pub borrow_part: U256,
    pub collateral_share: U256,
    /// Collateral in collateral token units
    pub collateral_amount: U256,
    /// Debt in asset units
    pub borrowed: U256,
    /// Reward curve start (debt at which liquidation becomes possible)
    pub min_tvl: U256,
    /// Full collateral value in asset units
    pub max_tvl: U256,
    pub amount_to_solvency: U256,
    pub closing_factor: U256,
    /// Closed-market caller reward (`FEE_PRECISION` percentage)
    pub liquidator_reward: U256,
    pub state: PositionState,
}

/// Interpolated caller reward for a closed-market liquidation.
///
/// The reward falls linearly from `max_liquidator_reward` when the debt equals
/// `start_tvl` to `min_liquidator_reward` when it reaches `max_tvl`.
/// Computed with signed integers truncating toward zero.
pub fn get_caller_reward(
    config: &MarketConfig,
    borrowed: U256,
    start_tvl: U256,
    max_tvl: U256,
) -> Result<U256, SimError> {
    if borrowed.is_zero() || start_tvl.is_zero() || borrowed < start_tvl {
        return Ok(U256::ZERO);
    }
    if borrowed >= max_tvl {
        return Ok(config.min_liquidator_reward);
    }

    let reward_percentage =
        mul_div_down(borrowed - start_tvl, FEE_PRECISION, max_tvl - start_tvl)?;

    let min_reward = I256::from_raw(config.min_liquidator_reward);
    let max_reward = I256::from_raw(config.max_liquidator_reward);
    let overflow = SimError::Overflow {
        context: "caller reward",
    };
    let reward = min_reward
        .checked_sub(max_reward)
        .and_then(|diff| diff.checked_mul(I256::from_raw(reward_percentage)))
        .and_then(|scaled| scaled.checked_div(I256::from_raw(FEE_PRECISION)))
        .and_then(|step| step.checked_add(max_reward))
        .ok_or(overflow)?;

    if reward.is_negative() {
        Ok(U256::ZERO)
    } else {
        Ok(reward.into_raw())
    }
}

impl Market {
    /// Debt of `borrow_part` at the current borrow ratio, times `multiplier`
    fn scaled_debt(&self, borrow_part: U256, multiplier: U256) -> Result<U256, SimError> {
        if self.total_borrow.base.is_zero() {
            return checked_mul(borrow_part, multiplier, "scaled debt");
        }
        let debt = checked_mul(borrow_part, self.total_borrow.elastic, "scaled debt")?;
        mul_div_down(debt, multiplier, self.total_borrow.base)
    }

    /// Debt of `user` in asset units, rounded down
    pub fn borrowed_amount(&self, user: Address) -> Result<U256, SimError> {
        self.scaled_debt(self.user_borrow_part(user), U256::from(1))
    }

    /// Collateral amount after a `FEE_PRECISION` haircut, scaled by 1e18
    fn haircut_collateral(
        &self,
        vault: &dyn ShareVault,
        collateral_share: U256,
        rate: U256,
    ) -> Result<U256, SimError> {
        let scaled = checked_mul(collateral_share, COLLATERAL_SCALE, "haircut collateral")?;
        let scaled = checked_mul(scaled, rate, "haircut collateral")?;
        vault.to_amount(self.collateral_id, scaled, RoundingDirection::Down)
    }

    /// Returns whether `user`'s collateral covers their debt at `exchange_rate`.
    ///
    /// Fails with [`SimError::Overflow`] when the position is too large for
    /// the on-chain check to complete.
    pub fn is_solvent(
        &self,
        vault: &dyn ShareVault,
        user: Address,
        exchange_rate: U256,
    ) -> Result<bool, SimError> {
        let position = self.position(user);
        if position.borrow_part.is_zero() {
            return Ok(true);
        }
        if position.collateral_share.is_zero() {
            return Ok(false);
        }

        let collateral = self.haircut_collateral(
            vault,
            position.collateral_share,
            self.config.closed_collateralization_rate,
        )?;
        Ok(collateral >= self.scaled_debt(position.borrow_part, exchange_rate)?)
    }

    /// Debt in excess of the collateral value at the order-book haircut.
    pub fn compute_amount_to_solvency(
        &self,
        vault: &dyn ShareVault,
        user: Address,
        exchange_rate: U256,
    ) -> Result<U256, SimError> {
        let position = self.position(user);
        if position.borrow_part.is_zero() {
            return Ok(U256::ZERO);
        }
        if exchange_rate.is_zero() {
            return Err(SimError::DivisionByZero);
        }

        let collateral_in_asset = self.haircut_collateral(
            vault,
            position.collateral_share,
            self.config.lq_collateralization_rate,
        )? / exchange_rate;
        let borrowed = self.scaled_debt(position.borrow_part, U256::from(1))?;

        Ok(borrowed.saturating_sub(collateral_in_asset))
    }

    /// Returns `(min, max)` where `max` is the collateral value in asset and
    /// `min` is `max` at the closed collateralization rate.
    pub fn compute_min_and_max_ltv_in_asset(
        &self,
        vault: &dyn ShareVault,
        collateral_share: U256,
        exchange_rate: U256,
    ) -> Result<(U256, U256), SimError> {
        let collateral_amount =
            vault.to_amount(self.collateral_id, collateral_share, RoundingDirection::Down)?;
        let max = mul_div_down(collateral_amount, EXCHANGE_RATE_PRECISION, exchange_rate)?;
        let min = mul_div_down(
            max,
            self.config.closed_collateralization_rate,
            COLLATERALIZATION_RATE_PRECISION,
        )?;
        Ok((min, max))
    }

    /// Maximum debt one liquidation call may close for `user`.
    ///
    /// Zero for a solvent borrower, the whole debt once it reaches the full
    /// collateral value, otherwise the amount to solvency plus the bonus margin.
    pub fn compute_closing_factor(
        &self,
        vault: &dyn ShareVault,
        user: Address,
        exchange_rate: U256,
    ) -> Result<U256, SimError> {
        if self.is_solvent(vault, user, exchange_rate)? {
            return Ok(U256::ZERO);
        }

        let position = self.position(user);
        let borrowed = self.borrowed_amount(user)?;
        let (_, max_tvl) =
            self.compute_min_and_max_ltv_in_asset(vault, position.collateral_share, exchange_rate)?;
        if borrowed >= max_tvl {
            return Ok(borrowed);
        }

        let amount_to_solvency = self.compute_amount_to_solvency(vault, user, exchange_rate)?;
        let bonus = mul_div_down(self.config.liquidation_bonus_amount, borrowed, FEE_PRECISION)?;
        checked_add(amount_to_solvency, bonus, "closing factor")
    }

    /// Closed-market caller reward for `user` at `exchange_rate`.
    pub fn compute_liquidator_reward(
        &self,
        vault: &dyn ShareVault,
        user: Address,
        exchange_rate: U256,
    ) -> Result<U256, SimError> {
        let position = self.position(user);
        let (min_tvl, max_tvl) =
            self.compute_min_and_max_ltv_in_asset(vault, position.collateral_share, exchange_rate)?;
        get_caller_reward(&self.config, self.borrowed_amount(user)?, min_tvl, max_tvl)
    }

    /// Classifies `user` at `exchange_rate`
    pub fn position_state(
        &self,
        vault: &dyn ShareVault,
        user: Address,
        exchange_rate: U256,
    ) -> Result<PositionState, SimError> {
        Ok(if !self.position(user).has_debt() {
            PositionState::Empty
        } else if self.is_solvent(vault, user, exchange_rate)? {
            PositionState::Healthy
        } else {
            PositionState::Liquidatable
        })
    }

    /// Full solvency summary of `user` at `exchange_rate`.
    pub fn solvency_report(
        &self,
        vault: &dyn ShareVault,
        user: Address,
        exchange_rate: U256,
    ) -> Result<SolvencyReport, SimError> {
        let position = self.position(user);
        let (min_tvl, max_tvl) =
            self.compute_min_and_max_ltv_in_asset(vault, position.collateral_share, exchange_rate)?;
        let borrowed = self.borrowed_amount(user)?;

        Ok(SolvencyReport {
            user,
            borrow_part: position.borrow_part,
            collateral_share: position.collateral_share,
            collateral_amount: vault.to_amount(
                self.collateral_id,
                position.collateral_share,
                RoundingDirection::Down,
            )?,
            borrowed,
            min_tvl,
            max_tvl,
            amount_to_solvency: self.compute_amount_to_solvency(vault, user, exchange_rate)?,
            closing_factor: self.compute_closing_factor(vault, user, exchange_rate)?,
            liquidator_reward: get_caller_reward(&self.config, borrowed, min_tvl, max_tvl)?,
            state: self.position_state(vault, user, exchange_rate)?,
        })
    }

    /// Solvency summaries of every borrower with debt, in address order
    pub fn solvency_reports(
        &self,
        vault: &dyn ShareVault,
        exchange_rate: U256,
    ) -> Result<Vec<SolvencyReport>, SimError> {
        self.positions
            .iter()
            .filter(|(_, position)| position.has_debt())
            .map(|(user, _)| self.solvency_report(vault, *user, exchange_rate))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::BorrowPosition;
    use crate::rebase::Rebase;
    use crate::vault::{MemoryVault, VaultAsset};

    const ASSET: u64 = 1;
    const COLLATERAL: u64 = 2;

    fn user() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn e18() -> U256 {
        EXCHANGE_RATE_PRECISION
    }

    /// Vault where one collateral unit is exactly 1e8 shares
    fn create_test_vault() -> MemoryVault {
        let mut vault = MemoryVault::new();
        vault.register_asset(ASSET, VaultAsset::default());
        vault.register_asset(
            COLLATERAL,
            VaultAsset {
                total_amount: U256::from(1_000_000_000u64),
                total_share: U256::from(1_000_000_000u64) * U256::from(100_000_000u64),
            },
        );
        vault
    }

    fn create_test_market(borrow_part: u64, collateral_share: U256) -> Market {
        let mut market = Market::new(Address::repeat_byte(0x11), ASSET, COLLATERAL, MarketConfig::default(), 0);
        market.total_borrow = Rebase::new(U256::from(1_000_000), U256::from(1_000_000));
        market.positions.insert(
            user(),
            BorrowPosition::new(U256::from(borrow_part), collateral_share),
        );
        market
    }

    fn collateral_units(units: u64) -> U256 {
        U256::from(units) * U256::from(100_000_000u64)
    }

    #[test]
    fn test_no_debt_is_solvent() {
        let vault = create_test_vault();
        let market = create_test_market(0, U256::ZERO);
        assert!(market.is_solvent(&vault, user(), e18()).unwrap());
        assert_eq!(market.position_state(&vault, user(), e18()).unwrap(), PositionState::Empty);
    }

    #[test]
    fn test_debt_without_collateral_is_insolvent() {
        let vault = create_test_vault();
        let market = create_test_market(1, U256::ZERO);
        assert!(!market.is_solvent(&vault, user(), e18()).unwrap());
    }

    #[test]
    fn test_solvency_boundary() {
        let vault = create_test_vault();
        let rate = U256::from(750_000_000_000_000_000u64);

        // 1M collateral at 0.75 collateral per asset is worth 1.33M asset,
        // 75% of which exactly covers the 1M debt
        let boundary = collateral_units(1_000_000);
        let market = create_test_market(1_000_000, boundary);
        assert!(market.is_solvent(&vault, user(), rate).unwrap());
        assert_eq!(
            market.compute_amount_to_solvency(&vault, user(), rate).unwrap(),
            U256::from(666_667)
        );
        assert_eq!(market.compute_closing_factor(&vault, user(), rate).unwrap(), U256::ZERO);

        let market = create_test_market(1_000_000, boundary - U256::from(1));
        assert!(!market.is_solvent(&vault, user(), rate).unwrap());
        assert_eq!(
            market.position_state(&vault, user(), rate).unwrap(),
            PositionState::Liquidatable
        );
    }

    #[test]
    fn test_solvency_monotonic_in_rate_and_collateral() {
        let vault = create_test_vault();
        let rates: Vec<U256> = (1..=20u64)
            .map(|step| U256::from(step) * U256::from(100_000_000_000_000_000u64))
            .collect();
        let shares: Vec<U256> = (0..=20u64).map(|step| collateral_units(step * 100_000)).collect();

        for share in &shares {
            let market = create_test_market(1_000_000, *share);
            let mut was_solvent = true;
            for rate in &rates {
                let solvent = market.is_solvent(&vault, user(), *rate).unwrap();
                assert!(was_solvent || !solvent, "solvency flipped back as the rate rose");
                was_solvent = solvent;
            }
        }

        for rate in &rates {
            let mut was_solvent = false;
            for share in &shares {
                let solvent = create_test_market(1_000_000, *share).is_solvent(&vault, user(), *rate).unwrap();
                assert!(!was_solvent || solvent, "more collateral made the position insolvent");
                was_solvent = solvent;
            }
        }
    }

    #[test]
    fn test_min_and_max_ltv() {
        let vault = create_test_vault();
        let market = create_test_market(0, U256::ZERO);

        // 1000 collateral at 2 collateral per asset
        let (min, max) = market
            .compute_min_and_max_ltv_in_asset(&vault, collateral_units(1_000), U256::from(2) * e18())
            .unwrap();
        assert_eq!(max, U256::from(500));
        assert_eq!(min, U256::from(375));
    }

    #[test]
    fn test_min_and_max_ltv_zero_rate() {
        let vault = create_test_vault();
        let market = create_test_market(0, U256::ZERO);
        let result = market.compute_min_and_max_ltv_in_asset(&vault, collateral_units(1), U256::ZERO);
        assert!(matches!(result, Err(SimError::DivisionByZero)));
    }

    #[test]
    fn test_closing_factor_partial() {
        let vault = create_test_vault();
        // 1.2M collateral at par: max TVL 1.2M, solvent up to 900k of debt
        let market = create_test_market(1_000_000, collateral_units(1_200_000));
        let closing = market.compute_closing_factor(&vault, user(), e18()).unwrap();

        // amount to solvency = 1M - 300k, bonus = 10% of 1M
        assert_eq!(closing, U256::from(700_000 + 100_000));
    }

    #[test]
    fn test_closing_factor_underwater_closes_everything() {
        let vault = create_test_vault();
        let market = create_test_market(1_000_000, collateral_units(900_000));
        let closing = market.compute_closing_factor(&vault, user(), e18()).unwrap();
        assert_eq!(closing, U256::from(1_000_000));
    }

    #[test]
    fn test_caller_reward_edges() {
        let config = MarketConfig::default();
        let start = U256::from(750);
        let max = U256::from(1_000);

        assert_eq!(get_caller_reward(&config, U256::ZERO, start, max).unwrap(), U256::ZERO);
        assert_eq!(get_caller_reward(&config, U256::from(10), U256::ZERO, max).unwrap(), U256::ZERO);
        assert_eq!(get_caller_reward(&config, U256::from(749), start, max).unwrap(), U256::ZERO);
        assert_eq!(get_caller_reward(&config, start, start, max).unwrap(), config.max_liquidator_reward);
        assert_eq!(get_caller_reward(&config, max, start, max).unwrap(), config.min_liquidator_reward);
        assert_eq!(get_caller_reward(&config, U256::from(5_000), start, max).unwrap(), config.min_liquidator_reward);
    }

    #[test]
    fn test_caller_reward_interpolation_truncates() {
        let config = MarketConfig::default();
        // pct = 1e5 / 3 = 33333; -9000 * 33333 / 1e5 = -2999.97, truncated to -2999
        let reward = get_caller_reward(&config, U256::from(101), U256::from(100), U256::from(103)).unwrap();
        assert_eq!(reward, U256::from(10_000 - 2_999));
    }

    #[test]
    fn test_caller_reward_within_bounds() {
        let config = MarketConfig::default();
        let triples = [(1u64, 7u64), (100, 101), (750, 1_000), (123_456, 987_654), (1, 1)];

        for (start, max) in triples {
            for borrowed in start..=(start + 50).min(max) {
                let reward =
                    get_caller_reward(&config, U256::from(borrowed), U256::from(start), U256::from(max))
                        .unwrap();
                assert!(reward >= config.min_liquidator_reward);
                assert!(reward <= config.max_liquidator_reward);
            }
        }
    }

    #[test]
    fn test_solvency_report() {
        let vault = create_test_vault();
        let market = create_test_market(1_000_000, collateral_units(1_200_000));
        let report = market.solvency_report(&vault, user(), e18()).unwrap();

        assert_eq!(report.borrowed, U256::from(1_000_000));
        assert_eq!(report.collateral_amount, U256::from(1_200_000));
        assert_eq!(report.max_tvl, U256::from(1_200_000));
        assert_eq!(report.min_tvl, U256::from(900_000));
        assert_eq!(report.amount_to_solvency, U256::from(700_000));
        assert_eq!(report.state, PositionState::Liquidatable);
        // pct = 100k * 1e5 / 300k = 33333
        assert_eq!(report.liquidator_reward, U256::from(10_000 - 2_999));

        let reports = market.solvency_reports(&vault, e18()).unwrap();
        assert_eq!(reports, vec![report]);
    }

    #[test]
    fn test_large_collateral_overflow_is_an_error() {
        let mut vault = MemoryVault::new();
        vault.register_asset(ASSET, VaultAsset::default());
        vault.register_asset(
            COLLATERAL,
            VaultAsset {
                total_amount: U256::from(10).pow(U256::from(27)),
                total_share: U256::from(10).pow(U256::from(35)),
            },
        );
        // 1e34 shares hold 1e26 collateral, far more than the debt, but the
        // haircut product times the vault total exceeds 2^256
        let market = create_test_market(1_000_000, U256::from(10).pow(U256::from(34)));

        let result = market.is_solvent(&vault, user(), e18());
        assert!(matches!(result, Err(SimError::Overflow { .. })));
        assert!(market.position_state(&vault, user(), e18()).is_err());
        assert!(market.solvency_report(&vault, user(), e18()).is_err());
    }
}
