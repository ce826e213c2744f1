//! Client for a deployed Singularity market.

use alloy::{
    eips::BlockNumberOrTag,
    primitives::{Address, B256, U256},
    providers::Provider,
    rpc::types::Filter,
};
use sgl_rs_sim::{LiquidationRequest, MarketEvent};
use tracing::debug;

use crate::error::{ContractError, Result};
use crate::logs::{decode_market_logs, MARKET_EVENT_TOPICS};
use crate::prepared_call::PreparedCall;
use crate::provider::{connect_read_only, connect_with_signer, HttpProvider};
use crate::singularity::ISingularity;

/// Builds the `liquidate` call for a batch.
pub fn liquidate_call(request: &LiquidationRequest) -> ISingularity::liquidateCall {
    ISingularity::liquidateCall {
        users: request.users.clone(),
        maxBorrowParts: request.max_borrow_parts.clone(),
        swapper: request.swapper,
        collateralToAssetSwapData: request.collateral_to_asset_swap_data.clone(),
        usdoToBorrowedSwapData: request.usdo_to_borrowed_swap_data.clone(),
    }
}

/// A mined `liquidate` transaction
#[derive(Debug, Clone)]
pub struct LiquidationReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    /// Market events decoded from the receipt
    pub events: Vec<MarketEvent>,
}

/// Client for reading from and liquidating on Singularity markets.
pub struct SingularityClient {
    provider: HttpProvider,
    signer_address: Option<Address>,
}

impl SingularityClient {
    /// Create a client that can send transactions.
    pub fn new(rpc_url: &str, private_key: &str) -> Result<Self> {
        let (provider, signer_address) = connect_with_signer(rpc_url, private_key)?;
        Ok(Self {
            provider,
            signer_address: Some(signer_address),
        })
    }

    /// Create a client limited to view calls.
    pub fn read_only(rpc_url: &str) -> Result<Self> {
        Ok(Self {
            provider: connect_read_only(rpc_url)?,
            signer_address: None,
        })
    }

    pub fn provider(&self) -> &HttpProvider {
        &self.provider
    }

    pub fn signer_address(&self) -> Option<Address> {
        self.signer_address
    }

    /// Create a prepared `liquidate` transaction for `market`.
    pub fn liquidate(
        &self,
        market: Address,
        request: &LiquidationRequest,
    ) -> PreparedCall<'_, ISingularity::liquidateCall> {
        PreparedCall::new(market, liquidate_call(request), U256::ZERO, &self.provider)
    }

    /// Dry-runs a liquidation from the signer's address.
    pub async fn simulate_liquidation(
        &self,
        market: Address,
        request: &LiquidationRequest,
    ) -> Result<()> {
        let from = self.signer_address.ok_or(ContractError::MissingSigner)?;
        self.liquidate(market, request).simulate(from).await?;
        Ok(())
    }

    /// Simulates, sends and waits for a liquidation.
    pub async fn execute_liquidation(
        &self,
        market: Address,
        request: &LiquidationRequest,
    ) -> Result<LiquidationReceipt> {
        self.simulate_liquidation(market, request).await?;

        let receipt = self.liquidate(market, request).send().await?;
        let events = decode_market_logs(market, receipt.inner.logs())?;
        debug!(
            tx = %receipt.transaction_hash,
            events = events.len(),
            "liquidation mined"
        );

        Ok(LiquidationReceipt {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            events,
        })
    }

    /// Timestamp of the latest block.
    pub async fn latest_timestamp(&self) -> Result<u64> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| ContractError::RpcConnection(format!("Failed to get latest block: {}", e)))?
            .ok_or_else(|| ContractError::RpcConnection("Latest block not found".to_string()))?;
        Ok(block.header.timestamp)
    }

    /// Cached exchange rate of a market.
    pub async fn exchange_rate(&self, market: Address) -> Result<U256> {
        let contract = ISingularity::new(market, &self.provider);
        contract.exchangeRate().call().await.map_err(|e| {
            ContractError::CallFailed(format!("Failed to get exchange rate: {}", e))
        })
    }

    /// Market events emitted in a block range.
    pub async fn market_events(
        &self,
        market: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<MarketEvent>> {
        let filter = Filter::new()
            .address(market)
            .event_signature(MARKET_EVENT_TOPICS.to_vec())
            .from_block(from_block)
            .to_block(to_block);

        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(|e| ContractError::RpcConnection(format!("Failed to get logs: {}", e)))?;
        debug!(%market, from_block, to_block, logs = logs.len(), "fetched market logs");

        decode_market_logs(market, &logs)
    }
}
