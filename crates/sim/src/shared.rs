//! Thread-safe market handle.
//!
//! [`SharedMarket`] serializes every operation on a market and its vault
//! behind one lock held for the whole call, including the swap or order-book
//! call made during a liquidation. Two liquidations can therefore never
//! interleave, and a venue never sees the market mid-update.

use std::sync::{Arc, Mutex};

use crate::error::SimError;
use crate::liquidation::{Collaborators, LiquidationOutcome, LiquidationRequest};
use crate::market::Market;
use crate::oracle::Oracle;
use crate::order_book::LiquidationQueue;
use crate::swapper::{Swapper, SwapperRegistry};
use crate::vault::ShareVault;

#[derive(Debug)]
struct MarketCell<V> {
    market: Market,
    vault: V,
}

/// Market and vault behind a single lock
#[derive(Debug)]
pub struct SharedMarket<V> {
    inner: Arc<Mutex<MarketCell<V>>>,
}

impl<V> Clone for SharedMarket<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: ShareVault + Clone> SharedMarket<V> {
    pub fn new(market: Market, vault: V) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MarketCell { market, vault })),
        }
    }

    /// Runs `operation` with exclusive access to the market and the vault.
    pub fn with<T>(
        &self,
        operation: impl FnOnce(&mut Market, &mut V) -> Result<T, SimError>,
    ) -> Result<T, SimError> {
        let mut cell = self.inner.lock().map_err(|_| SimError::LockPoisoned)?;
        let MarketCell { market, vault } = &mut *cell;
        operation(market, vault)
    }

    /// Liquidates a batch while holding the lock.
    pub fn liquidate(
        &self,
        request: &LiquidationRequest,
        oracle: &mut dyn Oracle,
        registry: &dyn SwapperRegistry,
        order_book: Option<&mut dyn LiquidationQueue>,
        swappers: Vec<&mut dyn Swapper>,
    ) -> Result<LiquidationOutcome, SimError> {
        self.with(|market, vault| {
            market.liquidate(
                request,
                Collaborators {
                    vault,
                    oracle,
                    registry,
                    order_book: order_book.map(|book| book as &mut dyn LiquidationQueue),
                    swappers: swappers
                        .into_iter()
                        .map(|swapper| swapper as &mut dyn Swapper)
                        .collect(),
                },
            )
        })
    }

    /// Copies of the market and the vault
    pub fn snapshot(&self) -> Result<(Market, V), SimError> {
        self.with(|market, vault| Ok((market.clone(), vault.clone())))
    }
}
