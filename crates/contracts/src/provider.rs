//! Provider construction for market clients.

use alloy::{
    network::EthereumWallet,
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};

use crate::error::{ContractError, Result};

/// The provider type used by market clients.
///
/// Read-only and signing providers are erased to the same type so a client
/// can be built either way.
pub type HttpProvider = DynProvider;

fn parse_url(rpc_url: &str) -> Result<url::Url> {
    rpc_url
        .parse()
        .map_err(|e| ContractError::RpcConnection(format!("{}", e)))
}

/// Connects a provider without a wallet.
pub fn connect_read_only(rpc_url: &str) -> Result<HttpProvider> {
    let url = parse_url(rpc_url)?;
    Ok(ProviderBuilder::new().connect_http(url).erased())
}

/// Connects a provider that signs with `private_key`.
///
/// Returns the provider together with the signer's address.
pub fn connect_with_signer(rpc_url: &str, private_key: &str) -> Result<(HttpProvider, Address)> {
    let signer: PrivateKeySigner = private_key
        .parse()
        .map_err(|_| ContractError::InvalidPrivateKey)?;
    let signer_address = signer.address();
    let wallet = EthereumWallet::from(signer);

    let url = parse_url(rpc_url)?;
    let provider = ProviderBuilder::new().wallet(wallet).connect_http(url).erased();
    Ok((provider, signer_address))
}
