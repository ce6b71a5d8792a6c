//! Chain gateway capability: read access to balances and confirmations.

use std::time::Duration;

use alloy::network::{Ethereum, ReceiptResponse};
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::GatewayError;

/// Default delay between receipt polls, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Default delay between receipt polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);

/// Default number of consecutive polls a transaction may be unknown to the
/// node before it is reported as dropped.
pub const DEFAULT_DROPPED_AFTER: u32 = 30;

/// Default number of consecutive failed polls tolerated before the wait
/// gives up with the last RPC error.
pub const DEFAULT_MAX_POLL_ERRORS: u32 = 5;

/// What the chain says about a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    /// The transaction made it into a block.
    pub included: bool,
    /// The transaction was included but its execution failed.
    pub reverted: bool,
}

impl Confirmation {
    /// Included and executed successfully.
    #[must_use]
    pub const fn succeeded() -> Self {
        Self {
            included: true,
            reverted: false,
        }
    }

    /// Included but reverted.
    #[must_use]
    pub const fn reverted() -> Self {
        Self {
            included: true,
            reverted: true,
        }
    }

    /// Never included.
    #[must_use]
    pub const fn dropped() -> Self {
        Self {
            included: false,
            reverted: false,
        }
    }
}

/// Network-backed read access used by the transfer core.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Wait until the chain settles the fate of `hash`.
    ///
    /// No deadline is applied here; wrap the call if one is needed.
    async fn await_confirmation(&self, hash: TxHash) -> Result<Confirmation, GatewayError>;

    /// Native balance of `address` in smallest units.
    async fn balance(&self, address: Address) -> Result<U256, GatewayError>;
}

/// A [`ChainGateway`] backed by a JSON-RPC node.
///
/// Confirmation polls `eth_getTransactionReceipt`. While no receipt exists,
/// it also checks that the node still knows the transaction; once the node
/// has forgotten it for `dropped_after` consecutive polls the transaction is
/// reported as dropped. A failed poll is retried on the next tick; only
/// `max_poll_errors` failures in a row end the wait with an error.
#[derive(Clone)]
pub struct RpcGateway {
    provider: DynProvider<Ethereum>,
    poll_interval: Duration,
    dropped_after: u32,
    max_poll_errors: u32,
}

impl std::fmt::Debug for RpcGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcGateway")
            .field("poll_interval", &self.poll_interval)
            .field("dropped_after", &self.dropped_after)
            .field("max_poll_errors", &self.max_poll_errors)
            .finish_non_exhaustive()
    }
}

impl RpcGateway {
    /// Connect to a JSON-RPC endpoint.
    pub async fn connect(rpc_url: &str) -> Result<Self, GatewayError> {
        let provider = ProviderBuilder::new()
            .connect(rpc_url)
            .await
            .map_err(|e| GatewayError::Connect(format!("failed to connect to '{rpc_url}': {e}")))?
            .erased();
        info!(rpc_url, "chain gateway connected");
        Ok(Self::from_provider(provider))
    }

    /// Wrap an existing provider, e.g. the one a signer already holds.
    #[must_use]
    pub const fn from_provider(provider: DynProvider<Ethereum>) -> Self {
        Self {
            provider,
            poll_interval: DEFAULT_POLL_INTERVAL,
            dropped_after: DEFAULT_DROPPED_AFTER,
            max_poll_errors: DEFAULT_MAX_POLL_ERRORS,
        }
    }

    /// Set the delay between receipt polls.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set how many unknown polls mark a transaction as dropped.
    #[must_use]
    pub fn with_dropped_after(mut self, polls: u32) -> Self {
        self.dropped_after = polls.max(1);
        self
    }

    /// Set how many failed polls in a row end the wait.
    #[must_use]
    pub fn with_max_poll_errors(mut self, polls: u32) -> Self {
        self.max_poll_errors = polls.max(1);
        self
    }

    /// Ask the node which chain it serves.
    pub async fn chain_id(&self) -> Result<u64, GatewayError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| GatewayError::rpc(format!("failed to get chain ID: {e}")))
    }

    /// One receipt poll. `Ok(None)` means the outcome is still open.
    async fn poll_once(
        &self,
        hash: TxHash,
        unknown_polls: &mut u32,
    ) -> Result<Option<Confirmation>, GatewayError> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| GatewayError::rpc(format!("failed to get receipt: {e}")))?;

        if let Some(receipt) = receipt {
            let reverted = !ReceiptResponse::status(&receipt);
            debug!(hash = %hash, reverted, "receipt found");
            return Ok(Some(Confirmation {
                included: true,
                reverted,
            }));
        }

        let known = self
            .provider
            .get_transaction_by_hash(hash)
            .await
            .map_err(|e| GatewayError::rpc(format!("failed to get transaction: {e}")))?
            .is_some();

        if known {
            *unknown_polls = 0;
        } else {
            *unknown_polls += 1;
            if *unknown_polls >= self.dropped_after {
                debug!(hash = %hash, polls = *unknown_polls, "transaction no longer known");
                return Ok(Some(Confirmation::dropped()));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl ChainGateway for RpcGateway {
    async fn await_confirmation(&self, hash: TxHash) -> Result<Confirmation, GatewayError> {
        let mut unknown_polls = 0u32;
        let mut failed_polls = 0u32;
        loop {
            match self.poll_once(hash, &mut unknown_polls).await {
                Ok(Some(confirmation)) => return Ok(confirmation),
                Ok(None) => failed_polls = 0,
                Err(err) => {
                    failed_polls += 1;
                    if failed_polls >= self.max_poll_errors {
                        return Err(err);
                    }
                    warn!(hash = %hash, attempt = failed_polls, %err, "receipt poll failed, retrying");
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn balance(&self, address: Address) -> Result<U256, GatewayError> {
        self.provider
            .get_balance(address)
            .await
            .map_err(|e| GatewayError::rpc(format!("failed to get balance: {e}")))
    }
}
