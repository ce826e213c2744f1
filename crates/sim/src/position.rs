//! Borrower positions.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// A borrower's debt and collateral in one market.
///
/// Positions are created implicitly by the first borrow or collateral deposit
/// and are never removed: a fully liquidated position is simply all zeroes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowPosition {
    /// Share of `total_borrow.base`
    pub borrow_part: U256,
    /// Collateral held for the borrower, in vault shares
    pub collateral_share: U256,
}

impl BorrowPosition {
    pub fn new(borrow_part: U256, collateral_share: U256) -> Self {
        Self {
            borrow_part,
            collateral_share,
        }
    }

    /// Returns true when the position holds neither debt nor collateral
    pub fn is_empty(&self) -> bool {
        self.borrow_part.is_zero() && self.collateral_share.is_zero()
    }

    /// Returns true when the position owes something
    pub fn has_debt(&self) -> bool {
        !self.borrow_part.is_zero()
    }
}

/// Liquidation state of a borrower.
///
/// A partially liquidated borrower is either `Healthy` again or still
/// `Liquidatable`; a fully liquidated one has no debt left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionState {
    /// No debt
    Empty,
    /// Debt covered at the closed collateralization rate
    Healthy,
    /// Debt not covered; open to liquidation
    Liquidatable,
}

impl PositionState {
    pub fn is_liquidatable(self) -> bool {
        matches!(self, PositionState::Liquidatable)
    }
}

impl std::fmt::Display for PositionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionState::Empty => write!(f, "empty"),
            PositionState::Healthy => write!(f, "healthy"),
            PositionState::Liquidatable => write!(f, "liquidatable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_position_is_empty() {
        let position = BorrowPosition::default();
        assert!(position.is_empty());
        assert!(!position.has_debt());
    }

    #[test]
    fn test_collateral_only_position() {
        let position = BorrowPosition::new(U256::ZERO, U256::from(10));
        assert!(!position.is_empty());
        assert!(!position.has_debt());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PositionState::Liquidatable.to_string(), "liquidatable");
        assert!(PositionState::Liquidatable.is_liquidatable());
        assert!(!PositionState::Healthy.is_liquidatable());
    }
}
