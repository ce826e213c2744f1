//! Error types for the contracts crate.

use alloy_primitives::B256;
use sgl_rs_sim::SimError;
use thiserror::Error;

/// Errors that can occur when talking to a deployed market.
#[derive(Debug, Error)]
pub enum ContractError {
    /// RPC connection failed.
    #[error("RPC connection failed: {0}")]
    RpcConnection(String),

    /// A view call failed.
    #[error("Call failed: {0}")]
    CallFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Invalid private key.
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// No signer configured for a call that needs one.
    #[error("No signer configured")]
    MissingSigner,

    /// Log topic does not belong to a market event.
    #[error("Unknown event topic {0}")]
    UnknownEvent(B256),

    /// Log data could not be decoded.
    #[error("Undecodable log: {0}")]
    UndecodableLog(String),

    /// On-chain value does not fit the engine's types.
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// The snapshot did not form a valid simulation world.
    #[error(transparent)]
    Sim(#[from] SimError),
}

/// Result type alias for contract operations.
pub type Result<T> = std::result::Result<T, ContractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_rpc_connection() {
        let error = ContractError::RpcConnection("connection refused".to_string());
        assert_eq!(error.to_string(), "RPC connection failed: connection refused");
    }

    #[test]
    fn test_error_display_unknown_event() {
        let error = ContractError::UnknownEvent(B256::ZERO);
        assert_eq!(
            error.to_string(),
            "Unknown event topic 0x0000000000000000000000000000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn test_sim_error_is_transparent() {
        let error = ContractError::from(SimError::NoUsersFound);
        assert_eq!(error.to_string(), SimError::NoUsersFound.to_string());
    }
}
