//! Price oracle collaborator.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Answer of an oracle query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleResponse {
    /// Whether a fresh rate was obtained
    pub success: bool,
    /// Collateral per asset, scaled by `EXCHANGE_RATE_PRECISION`
    pub rate: U256,
}

/// Price oracle.
///
/// A failed query is not an error: the market keeps using its cached rate.
pub trait Oracle {
    fn get(&mut self) -> OracleResponse;
}

/// Oracle returning a fixed answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedOracle {
    pub rate: U256,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl FixedOracle {
    pub fn new(rate: U256) -> Self {
        Self {
            rate,
            available: true,
        }
    }

    /// An oracle whose every query fails
    pub fn unavailable() -> Self {
        Self {
            rate: U256::ZERO,
            available: false,
        }
    }
}

impl Oracle for FixedOracle {
    fn get(&mut self) -> OracleResponse {
        OracleResponse {
            success: self.available,
            rate: if self.available { self.rate } else { U256::ZERO },
        }
    }
}
