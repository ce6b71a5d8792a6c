//! Known EVM networks and how to display them.

use serde::{Deserialize, Serialize};

use crate::amount::NATIVE_DECIMALS;

/// Chain id of Ethereum mainnet.
pub const ETHEREUM_CHAIN_ID: u64 = 1;
/// Chain id of Polygon PoS.
pub const POLYGON_CHAIN_ID: u64 = 137;
/// Chain id of Arbitrum One.
pub const ARBITRUM_CHAIN_ID: u64 = 42_161;
/// Chain id of Gnosis Chain.
pub const GNOSIS_CHAIN_ID: u64 = 100;

const KNOWN: &[(u64, &str, &str)] = &[
    (ETHEREUM_CHAIN_ID, "Ethereum", "ETH"),
    (POLYGON_CHAIN_ID, "Polygon", "POL"),
    (ARBITRUM_CHAIN_ID, "Arbitrum One", "ETH"),
    (GNOSIS_CHAIN_ID, "Gnosis Chain", "xDAI"),
];

/// Display metadata for a network's native asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    /// Numeric chain id.
    pub chain_id: u64,
    /// Human-readable network name.
    pub name: String,
    /// Ticker of the native asset.
    pub symbol: String,
    /// Fractional digits of the native asset.
    pub decimals: u8,
}

impl Network {
    /// Look up a network by chain id.
    ///
    /// Unknown chains are named `Chain <id>` and assumed to use an
    /// 18-decimal native asset.
    #[must_use]
    pub fn from_chain_id(chain_id: u64) -> Self {
        let (name, symbol) = KNOWN
            .iter()
            .find(|(id, _, _)| *id == chain_id)
            .map_or_else(
                || (format!("Chain {chain_id}"), "ETH".to_string()),
                |(_, name, symbol)| ((*name).to_string(), (*symbol).to_string()),
            );
        Self {
            chain_id,
            name,
            symbol,
            decimals: NATIVE_DECIMALS,
        }
    }

    /// Gnosis Chain, the network transfers target by default.
    #[must_use]
    pub fn gnosis() -> Self {
        Self::from_chain_id(GNOSIS_CHAIN_ID)
    }

    /// Whether the chain id is in the known network table.
    #[must_use]
    pub fn is_known(&self) -> bool {
        KNOWN.iter().any(|(id, _, _)| *id == self.chain_id)
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
