//! Fixed-point helpers and protocol precisions.
//!
//! All arithmetic is unsigned integer math with truncating division, matching
//! the on-chain market bit for bit. Nothing here uses floating point except the
//! display helpers at the bottom.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Precision of fee percentages (1e5 = 100%)
pub const FEE_PRECISION: U256 = U256::from_limbs([100_000, 0, 0, 0]);

/// Precision of collateralization rates (1e5 = 100%)
pub const COLLATERALIZATION_RATE_PRECISION: U256 = U256::from_limbs([100_000, 0, 0, 0]);

/// Precision of liquidation multipliers (1e5 = 1x)
pub const LIQUIDATION_MULTIPLIER_PRECISION: U256 = U256::from_limbs([100_000, 0, 0, 0]);

/// Precision of the oracle exchange rate (1e18)
pub const EXCHANGE_RATE_PRECISION: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Precision of utilization values (1e18 = 100%)
pub const UTILIZATION_PRECISION: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Precision of the interest controller's under/over factors
pub const FACTOR_PRECISION: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// 100% utilization
pub const FULL_UTILIZATION: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Precision of the per-second interest rate (1e18)
pub const INTEREST_PRECISION: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Seconds in a 365 day year
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Rounding direction for share/amount conversions.
///
/// The direction is always chosen so the protocol keeps the dust: round down
/// what a user receives, round up what a user owes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingDirection {
    Up,
    Down,
}

impl RoundingDirection {
    pub fn is_up(self) -> bool {
        matches!(self, RoundingDirection::Up)
    }

    /// Returns the other direction
    pub fn opposite(self) -> Self {
        match self {
            RoundingDirection::Up => RoundingDirection::Down,
            RoundingDirection::Down => RoundingDirection::Up,
        }
    }
}

/// `a * b`, aborting with an overflow error naming `context`
pub fn checked_mul(a: U256, b: U256, context: &'static str) -> Result<U256, SimError> {
    a.checked_mul(b).ok_or(SimError::Overflow { context })
}

/// `x * y / d`, rounded down
///
/// Overflow of the product aborts, as the on-chain checked arithmetic does.
pub fn mul_div_down(x: U256, y: U256, d: U256) -> Result<U256, SimError> {
    if d.is_zero() {
        return Err(SimError::DivisionByZero);
    }
    Ok(checked_mul(x, y, "mul_div")? / d)
}

/// `x * y / d`, rounded up
pub fn mul_div_up(x: U256, y: U256, d: U256) -> Result<U256, SimError> {
    if d.is_zero() {
        return Err(SimError::DivisionByZero);
    }
    let product = checked_mul(x, y, "mul_div")?;
    let quotient = product / d;
    if (product % d).is_zero() {
        Ok(quotient)
    } else {
        checked_add(quotient, U256::from(1), "mul_div")
    }
}

/// `x * y / d` with the given rounding
pub fn mul_div(
    x: U256,
    y: U256,
    d: U256,
    rounding: RoundingDirection,
) -> Result<U256, SimError> {
    match rounding {
        RoundingDirection::Up => mul_div_up(x, y, d),
        RoundingDirection::Down => mul_div_down(x, y, d),
    }
}

pub fn min(a: U256, b: U256) -> U256 {
    if a < b {
        a
    } else {
        b
    }
}

pub fn max(a: U256, b: U256) -> U256 {
    if a > b {
        a
    } else {
        b
    }
}

/// `a - b`, aborting with an underflow error naming `context`
pub fn checked_sub(a: U256, b: U256, context: &'static str) -> Result<U256, SimError> {
    a.checked_sub(b).ok_or(SimError::Underflow { context })
}

/// `a + b`, aborting with an overflow error naming `context`
pub fn checked_add(a: U256, b: U256, context: &'static str) -> Result<U256, SimError> {
    a.checked_add(b).ok_or(SimError::Overflow { context })
}

/// Converts a 1e18-scaled value to f64 (display only)
pub fn rate_to_f64(value: U256) -> f64 {
    value.saturating_to::<u128>() as f64 / 1e18
}

/// Converts a 1e5-scaled percentage to f64 (display only)
pub fn fee_to_f64(value: U256) -> f64 {
    value.saturating_to::<u128>() as f64 / 1e5
}

/// Simple yearly rate for a per-second interest rate (display only)
pub fn interest_per_second_to_apr(interest_per_second: u64) -> f64 {
    interest_per_second as f64 * SECONDS_PER_YEAR as f64 / 1e18
}
