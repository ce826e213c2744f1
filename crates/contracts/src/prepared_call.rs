//! Prepared call types for deferred transaction execution.
//!
//! A [`PreparedCall`] is a market transaction that has been built but not
//! sent. It can be inspected (target, calldata), dry-run with `eth_call`,
//! sent, or taken apart for batching.

use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::Provider;
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::sol_types::SolCall;
use tracing::debug;

use crate::error::{ContractError, Result};
use crate::provider::HttpProvider;

/// A prepared transaction that can be inspected, simulated or executed.
pub struct PreparedCall<'a, C: SolCall> {
    to: Address,
    call: C,
    value: U256,
    provider: &'a HttpProvider,
}

impl<'a, C: SolCall> PreparedCall<'a, C> {
    pub fn new(to: Address, call: C, value: U256, provider: &'a HttpProvider) -> Self {
        Self {
            to,
            call,
            value,
            provider,
        }
    }

    /// Consumes self and returns `(address, call)`.
    pub fn prepare(self) -> (Address, C) {
        (self.to, self.call)
    }

    /// Returns the target address for this call.
    pub fn to(&self) -> Address {
        self.to
    }

    /// Returns the value (ETH) to send with this call.
    pub fn value(&self) -> U256 {
        self.value
    }

    /// ABI-encoded calldata, selector included
    pub fn calldata(&self) -> Bytes {
        self.call.abi_encode().into()
    }

    fn request(&self) -> TransactionRequest {
        TransactionRequest::default()
            .to(self.to)
            .input(self.calldata().into())
            .value(self.value)
    }

    /// Dry-runs the call with `eth_call`; a revert surfaces as an error.
    pub async fn simulate(&self, from: Address) -> Result<C::Return> {
        let tx = self.request().from(from);
        let output = self
            .provider
            .call(tx)
            .await
            .map_err(|e| ContractError::CallFailed(format!("Simulation reverted: {}", e)))?;

        C::abi_decode_returns(&output)
            .map_err(|e| ContractError::CallFailed(format!("Failed to decode return data: {}", e)))
    }

    /// Sends the transaction and waits for the receipt.
    pub async fn send(self) -> Result<TransactionReceipt> {
        debug!(to = %self.to, selector = ?C::SELECTOR, "sending transaction");

        let pending = self
            .provider
            .send_transaction(self.request())
            .await
            .map_err(|e| {
                ContractError::TransactionFailed(format!("Failed to send transaction: {}", e))
            })?;

        let receipt = pending.get_receipt().await.map_err(|e| {
            ContractError::TransactionFailed(format!("Failed to get receipt: {}", e))
        })?;

        Ok(receipt)
    }
}
