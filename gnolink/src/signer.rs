//! Signing provider capability.
//!
//! The transfer core never owns a wallet session. It is handed a
//! [`SigningProvider`] per call and only asks it who it is, which chain it is
//! on, and to authorize and broadcast a single native transfer.
//!
//! [`LocalSigningProvider`] implements the capability with an alloy
//! `PrivateKeySigner` and an HTTP provider. It stands in for an externally
//! connected wallet in tooling and tests against a live node.

use alloy::network::{Ethereum, TransactionBuilder};
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::Signer;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::TransportError;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::SignerError;
use crate::keys::Keypair;

/// EIP-1193 error code for "user rejected the request".
pub const USER_REJECTED_CODE: i64 = 4001;

/// A connected wallet able to authorize and broadcast transactions.
#[async_trait]
pub trait SigningProvider: Send + Sync {
    /// The account the wallet is currently signing for.
    fn active_address(&self) -> Option<Address>;

    /// The chain the wallet is currently connected to.
    fn active_chain_id(&self) -> Option<u64>;

    /// Whether the wallet session is live.
    fn is_connected(&self) -> bool {
        self.active_address().is_some()
    }

    /// Authorize and broadcast a native transfer, returning its hash.
    ///
    /// May suspend for as long as the wallet needs, including waiting on
    /// a human to approve the request.
    async fn sign_and_broadcast(
        &self,
        destination: Address,
        value: U256,
    ) -> Result<TxHash, SignerError>;
}

/// Builder for constructing a [`LocalSigningProvider`].
#[derive(Debug, Default)]
pub struct LocalSigningProviderBuilder {
    /// Raw private key hex string.
    private_key: Option<String>,
    /// Already generated keypair.
    keypair: Option<Keypair>,
    /// JSON-RPC endpoint URL.
    rpc_url: Option<String>,
    /// Chain ID (auto-detected if not set).
    chain_id: Option<u64>,
}

impl LocalSigningProviderBuilder {
    /// Set the private key directly (hex string, with or without 0x prefix).
    #[must_use]
    pub fn private_key(mut self, key: impl Into<String>) -> Self {
        self.private_key = Some(key.into());
        self
    }

    /// Sign with an existing keypair.
    #[must_use]
    pub fn keypair(mut self, keypair: Keypair) -> Self {
        self.keypair = Some(keypair);
        self
    }

    /// Set the JSON-RPC endpoint URL.
    #[must_use]
    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    /// Set the chain ID explicitly (auto-detected from RPC if not set).
    #[must_use]
    pub const fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Build the [`LocalSigningProvider`].
    ///
    /// Either `private_key` or `keypair` must be set. `rpc_url` is required.
    pub async fn build(mut self) -> Result<LocalSigningProvider, SignerError> {
        let rpc_url = self
            .rpc_url
            .take()
            .ok_or_else(|| SignerError::Config("rpc_url is required".into()))?;

        let mut signer = if let Some(keypair) = self.keypair.take() {
            keypair.into_signer()
        } else if let Some(ref key) = self.private_key {
            Keypair::from_private_key(key)
                .map_err(|e| SignerError::Config(e.to_string()))?
                .into_signer()
        } else {
            return Err(SignerError::Config(
                "either private_key or keypair is required".into(),
            ));
        };

        if let Some(chain_id) = self.chain_id {
            signer.set_chain_id(Some(chain_id));
        }

        let address = signer.address();

        let provider: DynProvider<Ethereum> = ProviderBuilder::new()
            .wallet(signer)
            .connect(&rpc_url)
            .await
            .map_err(|e| SignerError::Config(format!("failed to connect to '{rpc_url}': {e}")))?
            .erased();

        let chain_id = if let Some(id) = self.chain_id {
            id
        } else {
            provider
                .get_chain_id()
                .await
                .map_err(|e| SignerError::Config(format!("failed to get chain ID: {e}")))?
        };

        info!(address = %address, chain_id, "local signing provider connected");

        Ok(LocalSigningProvider {
            provider,
            address,
            chain_id,
        })
    }
}

/// A [`SigningProvider`] backed by a local private key and an RPC node.
#[derive(Clone)]
pub struct LocalSigningProvider {
    /// Type-erased provider with the wallet filler attached.
    provider: DynProvider<Ethereum>,
    /// The signing address.
    address: Address,
    /// The chain ID the node reported (or was configured with).
    chain_id: u64,
}

impl std::fmt::Debug for LocalSigningProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigningProvider")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

impl LocalSigningProvider {
    /// Create a builder for constructing a [`LocalSigningProvider`].
    #[must_use]
    pub fn builder() -> LocalSigningProviderBuilder {
        LocalSigningProviderBuilder::default()
    }

    /// Get the signing address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Get the chain ID.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Get a reference to the underlying provider.
    #[must_use]
    pub const fn provider(&self) -> &DynProvider<Ethereum> {
        &self.provider
    }
}

#[async_trait]
impl SigningProvider for LocalSigningProvider {
    fn active_address(&self) -> Option<Address> {
        Some(self.address)
    }

    fn active_chain_id(&self) -> Option<u64> {
        Some(self.chain_id)
    }

    async fn sign_and_broadcast(
        &self,
        destination: Address,
        value: U256,
    ) -> Result<TxHash, SignerError> {
        let tx = TransactionRequest::default()
            .with_from(self.address)
            .with_to(destination)
            .with_value(value);

        debug!(to = %destination, value = %value, "broadcasting native transfer");

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(classify_send_error)?;

        Ok(*pending.tx_hash())
    }
}

/// Map a transport error to a rejection or a broadcast failure.
pub(crate) fn classify_send_error(err: TransportError) -> SignerError {
    match err.as_error_resp() {
        Some(payload) if payload.code == USER_REJECTED_CODE => {
            SignerError::rejected(payload.message.to_string())
        }
        _ => SignerError::broadcast(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use alloy::rpc::json_rpc::ErrorPayload;
    use alloy::transports::RpcError;

    use super::*;

    fn error_resp(code: i64, message: &'static str) -> TransportError {
        RpcError::ErrorResp(ErrorPayload {
            code,
            message: message.into(),
            data: None,
        })
    }

    #[test]
    fn test_user_rejection_is_classified() {
        let err = classify_send_error(error_resp(4001, "User rejected the request."));
        assert_eq!(err, SignerError::Rejected("User rejected the request.".into()));
    }

    #[test]
    fn test_node_error_is_broadcast_failure() {
        let err = classify_send_error(error_resp(-32000, "insufficient funds for gas * price + value"));
        assert!(matches!(err, SignerError::Broadcast(msg) if msg.contains("insufficient funds")));
    }

    #[tokio::test]
    async fn test_builder_requires_rpc_url() {
        let err = LocalSigningProvider::builder()
            .keypair(Keypair::generate().unwrap())
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, SignerError::Config(msg) if msg.contains("rpc_url")));
    }

    #[tokio::test]
    async fn test_builder_requires_key() {
        let err = LocalSigningProvider::builder()
            .rpc_url("http://localhost:8545")
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, SignerError::Config(msg) if msg.contains("private_key")));
    }

    #[tokio::test]
    async fn test_builder_connects_over_http() {
        let keypair = Keypair::generate().unwrap();
        let expected = keypair.address();
        let signer = LocalSigningProvider::builder()
            .keypair(keypair)
            .rpc_url("https://rpc.gnosischain.com")
            .chain_id(100)
            .build()
            .await
            .unwrap();
        assert_eq!(signer.active_address(), Some(expected));
        assert_eq!(signer.active_chain_id(), Some(100));
        assert!(signer.is_connected());
    }

    #[tokio::test]
    async fn test_builder_rejects_bad_key() {
        let err = LocalSigningProvider::builder()
            .private_key("0xnot-a-key")
            .rpc_url("http://localhost:8545")
            .chain_id(100)
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, SignerError::Config(msg) if msg.contains("invalid private key")));
    }
}
