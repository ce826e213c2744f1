//! Elastic/base accounting.
//!
//! A [`Rebase`] tracks a pool where `elastic` is the real token amount and
//! `base` is the proportional unit held by participants. The market keeps two:
//! `total_borrow` (elastic = debt, base = borrow parts) and `total_asset`
//! (elastic = vault shares held for lenders, base = lender fractions).
//!
//! Conversions round in the direction the caller asks for. Callers pick the
//! direction that keeps dust in the protocol.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::math::{checked_add, checked_sub, mul_div_down, RoundingDirection};

/// Elastic/base pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rebase {
    /// Real token amount
    pub elastic: U256,
    /// Proportional units
    pub base: U256,
}

impl Rebase {
    pub fn new(elastic: U256, base: U256) -> Self {
        Self { elastic, base }
    }

    /// Converts an elastic amount to base units.
    ///
    /// An empty pool (`elastic == 0`) maps one to one.
    pub fn to_base(&self, elastic: U256, rounding: RoundingDirection) -> Result<U256, SimError> {
        if self.elastic.is_zero() {
            return Ok(elastic);
        }

        let mut base = mul_div_down(elastic, self.base, self.elastic)?;
        if rounding.is_up()
            && !self.base.is_zero()
            && mul_div_down(base, self.elastic, self.base)? < elastic
        {
            base = checked_add(base, U256::from(1), "rebase base")?;
        }
        Ok(base)
    }

    /// Converts base units to an elastic amount.
    ///
    /// A pool without base (`base == 0`) maps one to one.
    pub fn to_elastic(&self, base: U256, rounding: RoundingDirection) -> Result<U256, SimError> {
        if self.base.is_zero() {
            return Ok(base);
        }

        let mut elastic = mul_div_down(base, self.elastic, self.base)?;
        if rounding.is_up()
            && !self.elastic.is_zero()
            && mul_div_down(elastic, self.base, self.elastic)? < base
        {
            elastic = checked_add(elastic, U256::from(1), "rebase elastic")?;
        }
        Ok(elastic)
    }

    /// Adds `elastic` to the pool, returning the new pool and the base minted
    pub fn add(&self, elastic: U256, rounding: RoundingDirection) -> Result<(Rebase, U256), SimError> {
        let base = self.to_base(elastic, rounding)?;
        let total = Rebase {
            elastic: checked_add(self.elastic, elastic, "rebase elastic")?,
            base: checked_add(self.base, base, "rebase base")?,
        };
        Ok((total, base))
    }

    /// Removes `base` from the pool, returning the new pool and the elastic released
    pub fn sub(&self, base: U256, rounding: RoundingDirection) -> Result<(Rebase, U256), SimError> {
        let elastic = self.to_elastic(base, rounding)?;
        let total = Rebase {
            elastic: checked_sub(self.elastic, elastic, "rebase elastic")?,
            base: checked_sub(self.base, base, "rebase base")?,
        };
        Ok((total, elastic))
    }

    /// Adds a precomputed elastic/base delta
    pub fn add_both(&self, elastic: U256, base: U256) -> Result<Rebase, SimError> {
        Ok(Rebase {
            elastic: checked_add(self.elastic, elastic, "rebase elastic")?,
            base: checked_add(self.base, base, "rebase base")?,
        })
    }

    /// Removes a precomputed elastic/base delta
    pub fn sub_both(&self, elastic: U256, base: U256) -> Result<Rebase, SimError> {
        Ok(Rebase {
            elastic: checked_sub(self.elastic, elastic, "rebase elastic")?,
            base: checked_sub(self.base, base, "rebase base")?,
        })
    }
}
