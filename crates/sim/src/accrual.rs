//! Utilization-driven interest accrual.
//!
//! The market charges a per-second interest rate on all outstanding debt and
//! nudges that rate after every accrual depending on utilization:
//!
//! ```text
//! utilization < 70%:  rate = rate * E / (E + under² * elapsed)   (decay)
//! utilization > 80%:  rate = rate * (E + over² * elapsed) / E    (growth)
//! otherwise:          unchanged
//!
//! under = (70% - utilization) / 70%
//! over  = (utilization - 80%) / (100% - 80%)
//! ```
//!
//! `E` is the interest elasticity: the larger it is, the slower the rate moves.
//! This is a proportional controller clamped to
//! `[minimum_interest_per_second, maximum_interest_per_second]`.
//!
//! A share of every accrued interest amount (the protocol fee) is minted to the
//! protocol as new lender fractions without adding elastic backing.
//!
//! # Example
//!
//! ```rust
//! use sgl_rs_sim::accrual::{next_interest_per_second, InterestModel};
//! use alloy_primitives::U256;
//!
//! let model = InterestModel::default();
//! let low_utilization = U256::from(300_000_000_000_000_000u64); // 30%
//!
//! let rate = next_interest_per_second(
//!     &model,
//!     model.starting_interest_per_second,
//!     low_utilization,
//!     3600,
//! )
//! .unwrap();
//! assert!(rate < model.starting_interest_per_second);
//! ```

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::math::{
    checked_add, checked_mul, mul_div_down, FACTOR_PRECISION, FEE_PRECISION, FULL_UTILIZATION,
    INTEREST_PRECISION, UTILIZATION_PRECISION,
};
use crate::rebase::Rebase;

/// Starting rate, approximately 1% APR
pub const STARTING_INTEREST_PER_SECOND: u64 = 317_097_920;

/// Rate floor, approximately 0.25% APR
pub const MINIMUM_INTEREST_PER_SECOND: u64 = 79_274_480;

/// Rate ceiling, approximately 1000% APR
pub const MAXIMUM_INTEREST_PER_SECOND: u64 = 317_097_920_000;

/// Interest elasticity: the rate halves or doubles in 28800 seconds (8 hours) at the extremes
pub const INTEREST_ELASTICITY: U256 = U256::from_limbs([
    0xBB66_8800_0000_0000,
    0xA2B6_3D65_D79D_094A,
    0x54,
    0,
]); // 28800e36

/// Lower edge of the target utilization band (70%)
pub const MINIMUM_TARGET_UTILIZATION: U256 = U256::from_limbs([700_000_000_000_000_000, 0, 0, 0]);

/// Upper edge of the target utilization band (80%)
pub const MAXIMUM_TARGET_UTILIZATION: U256 = U256::from_limbs([800_000_000_000_000_000, 0, 0, 0]);

/// Parameters of the interest controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterestModel {
    pub starting_interest_per_second: u64,
    pub minimum_interest_per_second: u64,
    pub maximum_interest_per_second: u64,
    pub interest_elasticity: U256,
    pub minimum_target_utilization: U256,
    pub maximum_target_utilization: U256,
}

impl Default for InterestModel {
    fn default() -> Self {
        Self {
            starting_interest_per_second: STARTING_INTEREST_PER_SECOND,
            minimum_interest_per_second: MINIMUM_INTEREST_PER_SECOND,
            maximum_interest_per_second: MAXIMUM_INTEREST_PER_SECOND,
            interest_elasticity: INTEREST_ELASTICITY,
            minimum_target_utilization: MINIMUM_TARGET_UTILIZATION,
            maximum_target_utilization: MAXIMUM_TARGET_UTILIZATION,
        }
    }
}

/// Accrual bookkeeping of a market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrueInfo {
    /// Current per-second interest rate (1e18-scaled)
    pub interest_per_second: u64,
    /// Timestamp of the last accrual
    pub last_accrued: u64,
    /// Lender fractions minted to the protocol so far
    #[serde(default)]
    pub fees_earned_fraction: U256,
}

impl AccrueInfo {
    /// Fresh accrual state starting at `timestamp`
    pub fn new(model: &InterestModel, timestamp: u64) -> Self {
        Self {
            interest_per_second: model.starting_interest_per_second,
            last_accrued: timestamp,
            fees_earned_fraction: U256::ZERO,
        }
    }
}

/// Result of accruing over a non-empty period with open debt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accrual {
    /// Seconds since the previous accrual
    pub elapsed: u64,
    /// Interest added to the debt
    pub extra_amount: U256,
    /// Lender fractions minted to the protocol
    pub fee_fraction: U256,
    /// Rate after the controller step
    pub interest_per_second: u64,
    /// Utilization measured after adding interest (1e18-scaled)
    pub utilization: U256,
    /// Borrow pool after adding interest
    pub total_borrow: Rebase,
    /// Asset pool after minting the fee fractions
    pub total_asset: Rebase,
}

/// What an accrual call did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AccrualOutcome {
    /// No time elapsed since the last accrual
    Unchanged,
    /// No open debt; the rate went back to its starting value
    Idle {
        interest_per_second: u64,
        rate_reset: bool,
    },
    /// Interest was charged
    Accrued(Accrual),
}

/// Applies one controller step to the interest rate.
pub fn next_interest_per_second(
    model: &InterestModel,
    interest_per_second: u64,
    utilization: U256,
    elapsed: u64,
) -> Result<u64, SimError> {
    let elapsed = U256::from(elapsed);
    let rate = U256::from(interest_per_second);
    let elasticity = model.interest_elasticity;

    // elasticity + factor^2 * elapsed
    let scale = |factor: U256| -> Result<U256, SimError> {
        let squared = checked_mul(factor, factor, "rate factor")?;
        let stretch = checked_mul(squared, elapsed, "rate factor")?;
        checked_add(elasticity, stretch, "rate scale")
    };

    if utilization < model.minimum_target_utilization {
        let under_factor = mul_div_down(
            model.minimum_target_utilization - utilization,
            FACTOR_PRECISION,
            model.minimum_target_utilization,
        )?;
        let decayed = mul_div_down(rate, elasticity, scale(under_factor)?)?.saturating_to::<u64>();

        Ok(decayed.max(model.minimum_interest_per_second))
    } else if utilization > model.maximum_target_utilization {
        let over_factor = mul_div_down(
            utilization - model.maximum_target_utilization,
            FACTOR_PRECISION,
            FULL_UTILIZATION.saturating_sub(model.maximum_target_utilization),
        )?;
        let grown = mul_div_down(rate, scale(over_factor)?, elasticity)?;

        Ok(grown
            .min(U256::from(model.maximum_interest_per_second))
            .saturating_to::<u64>())
    } else {
        Ok(interest_per_second)
    }
}

/// Computes the effect of accruing interest over `elapsed` seconds.
///
/// `asset_pool_amount` is the token amount behind `total_asset.elastic`
/// (vault shares converted down), i.e. what lenders hold that is not lent out.
pub fn compute_accrual(
    model: &InterestModel,
    info: &AccrueInfo,
    total_borrow: Rebase,
    total_asset: Rebase,
    asset_pool_amount: U256,
    protocol_fee: U256,
    elapsed: u64,
) -> Result<AccrualOutcome, SimError> {
    if elapsed == 0 {
        return Ok(AccrualOutcome::Unchanged);
    }

    if total_borrow.base.is_zero() {
        return Ok(AccrualOutcome::Idle {
            interest_per_second: model.starting_interest_per_second,
            rate_reset: info.interest_per_second != model.starting_interest_per_second,
        });
    }

    let interest = checked_mul(
        U256::from(info.interest_per_second),
        U256::from(elapsed),
        "accrued interest",
    )?;
    let extra_amount = mul_div_down(total_borrow.elastic, interest, INTEREST_PRECISION)?;

    let mut total_borrow = total_borrow;
    total_borrow.elastic = checked_add(total_borrow.elastic, extra_amount, "total borrow elastic")?;

    let full_asset_amount = checked_add(asset_pool_amount, total_borrow.elastic, "full asset amount")?;

    let fee_amount = mul_div_down(extra_amount, protocol_fee, FEE_PRECISION)?;
    let fee_fraction = mul_div_down(fee_amount, total_asset.base, full_asset_amount)?;

    let mut total_asset = total_asset;
    total_asset.base = checked_add(total_asset.base, fee_fraction, "total asset base")?;

    let utilization =
        mul_div_down(total_borrow.elastic, UTILIZATION_PRECISION, full_asset_amount)?;
    let interest_per_second =
        next_interest_per_second(model, info.interest_per_second, utilization, elapsed)?;

    Ok(AccrualOutcome::Accrued(Accrual {
        elapsed,
        extra_amount,
        fee_fraction,
        interest_per_second,
        utilization,
        total_borrow,
        total_asset,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pct(value: u64) -> U256 {
        U256::from(value) * U256::from(10_000_000_000_000_000u64)
    }

    #[test]
    fn test_elasticity_constant() {
        let expected = U256::from(28_800u64) * U256::from(10u64).pow(U256::from(36u64));
        assert_eq!(INTEREST_ELASTICITY, expected);
    }

    #[test]
    fn test_rate_unchanged_inside_band() {
        let model = InterestModel::default();
        let rate = next_interest_per_second(&model, STARTING_INTEREST_PER_SECOND, pct(75), 86_400).unwrap();
        assert_eq!(rate, STARTING_INTEREST_PER_SECOND);
    }

    #[test]
    fn test_rate_decays_below_band() {
        let model = InterestModel::default();
        let rate = next_interest_per_second(&model, STARTING_INTEREST_PER_SECOND, pct(35), 3_600).unwrap();

        // under = 0.5, scale = 28800 + 0.25 * 3600 = 29700 (in 1e36 units)
        let expected = 317_097_920u64 * 28_800 / 29_700;
        assert_eq!(rate, expected);
    }

    #[test]
    fn test_rate_decay_clamped_to_minimum() {
        let model = InterestModel::default();
        let rate = next_interest_per_second(&model, STARTING_INTEREST_PER_SECOND, U256::ZERO, 10_000_000).unwrap();
        assert_eq!(rate, MINIMUM_INTEREST_PER_SECOND);
    }

    #[test]
    fn test_rate_grows_above_band() {
        let model = InterestModel::default();
        let rate = next_interest_per_second(&model, STARTING_INTEREST_PER_SECOND, pct(90), 28_800).unwrap();

        // over = 0.5, scale = 28800 + 0.25 * 28800 = 36000
        let expected = 317_097_920u64 * 36_000 / 28_800;
        assert_eq!(rate, expected);
    }

    #[test]
    fn test_rate_growth_clamped_to_maximum() {
        let model = InterestModel::default();
        let rate = next_interest_per_second(&model, MAXIMUM_INTEREST_PER_SECOND, pct(100), 86_400).unwrap();
        assert_eq!(rate, MAXIMUM_INTEREST_PER_SECOND);
    }

    #[test]
    fn test_compute_accrual_zero_elapsed() {
        let model = InterestModel::default();
        let info = AccrueInfo::new(&model, 1_000);
        let outcome = compute_accrual(
            &model,
            &info,
            Rebase::new(U256::from(100), U256::from(100)),
            Rebase::new(U256::from(100), U256::from(100)),
            U256::from(100),
            U256::from(10_000),
            0,
        )
        .unwrap();
        assert_eq!(outcome, AccrualOutcome::Unchanged);
    }

    #[test]
    fn test_compute_accrual_idle_resets_rate() {
        let model = InterestModel::default();
        let mut info = AccrueInfo::new(&model, 1_000);
        info.interest_per_second = MINIMUM_INTEREST_PER_SECOND;

        let outcome = compute_accrual(
            &model,
            &info,
            Rebase::default(),
            Rebase::new(U256::from(100), U256::from(100)),
            U256::from(100),
            U256::from(10_000),
            60,
        )
        .unwrap();

        assert_eq!(
            outcome,
            AccrualOutcome::Idle {
                interest_per_second: STARTING_INTEREST_PER_SECOND,
                rate_reset: true
            }
        );
    }

    #[test]
    fn test_compute_accrual_charges_interest_and_fee() {
        let model = InterestModel::default();
        let mut info = AccrueInfo::new(&model, 0);
        // 1e-6 per second makes the numbers easy to follow
        info.interest_per_second = 1_000_000_000_000;

        let unit = U256::from(1_000_000_000_000_000_000u64);
        let total_borrow = Rebase::new(U256::from(750) * unit, U256::from(750) * unit);
        let total_asset = Rebase::new(U256::from(250) * unit, U256::from(1_000) * unit);

        let outcome = compute_accrual(
            &model,
            &info,
            total_borrow,
            total_asset,
            U256::from(250) * unit,
            U256::from(10_000), // 10%
            100,
        )
        .unwrap();

        let AccrualOutcome::Accrued(accrual) = outcome else {
            panic!("expected interest to accrue");
        };

        // 750 * 1e-6 * 100 = 0.075 tokens of interest
        let extra = U256::from(75_000_000_000_000_000u64);
        assert_eq!(accrual.extra_amount, extra);
        assert_eq!(accrual.total_borrow.elastic, U256::from(750) * unit + extra);
        assert_eq!(accrual.total_borrow.base, total_borrow.base);

        // fee = 0.0075, fraction = 0.0075 * 1000 / 1000.075
        let fee = U256::from(7_500_000_000_000_000u64);
        let full = U256::from(1_000) * unit + extra;
        assert_eq!(accrual.fee_fraction, fee * U256::from(1_000) * unit / full);
        assert_eq!(accrual.total_asset.base, total_asset.base + accrual.fee_fraction);
        assert_eq!(accrual.total_asset.elastic, total_asset.elastic);

        // 75% utilization is inside the band
        assert_eq!(accrual.interest_per_second, info.interest_per_second);
    }
}
