//! Connected-account summary for display.

use alloy::primitives::{Address, U256};
use serde::Serialize;
use tracing::debug;

use crate::amount::format_amount_fixed;
use crate::error::AccountError;
use crate::gateway::ChainGateway;
use crate::network::Network;
use crate::signer::SigningProvider;

/// Fractional digits shown for balances.
pub const BALANCE_DISPLAY_PLACES: usize = 5;

/// What a wallet panel shows for the connected account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    /// Connected address.
    pub address: Address,
    /// Network the signer is on.
    pub network: Network,
    /// Native balance in smallest units.
    pub balance: U256,
    /// Whether the signer must switch chains before it can send.
    pub needs_network_switch: bool,
}

impl AccountSummary {
    /// Build a summary for the signer's active account.
    pub async fn fetch(
        signer: &dyn SigningProvider,
        gateway: &dyn ChainGateway,
        required_chain_id: u64,
    ) -> Result<Self, AccountError> {
        if !signer.is_connected() {
            return Err(AccountError::NotConnected);
        }
        let (Some(address), Some(chain_id)) = (signer.active_address(), signer.active_chain_id())
        else {
            return Err(AccountError::NotConnected);
        };

        let balance = gateway.balance(address).await?;
        debug!(address = %address, chain_id, balance = %balance, "account summary fetched");

        Ok(Self {
            address,
            network: Network::from_chain_id(chain_id),
            balance,
            needs_network_switch: chain_id != required_chain_id,
        })
    }

    /// Shortened address, e.g. `0x1234...abcd`.
    #[must_use]
    pub fn short_address(&self) -> String {
        shorten_address(&self.address)
    }

    /// Balance with five fractional digits and the native symbol.
    #[must_use]
    pub fn balance_display(&self) -> String {
        format!(
            "{} {}",
            format_amount_fixed(self.balance, self.network.decimals, BALANCE_DISPLAY_PLACES),
            self.network.symbol
        )
    }
}

/// First six and last four characters of the checksummed address.
#[must_use]
pub fn shorten_address(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
