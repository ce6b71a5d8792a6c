//! Ephemeral keypair generation.
//!
//! A [`Keypair`] is a fresh secp256k1 private key drawn from a
//! cryptographically secure source, together with its Ethereum address.
//! Generation is pure: every call is independent and holds no shared state.
//!
//! The secret never appears in `Debug` output or tracing events. Callers
//! decide how long to keep a keypair around; the key material is zeroized
//! when the underlying signing key is dropped.

use alloy::primitives::{Address, B256, hex};
use alloy::signers::local::PrivateKeySigner;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::error::KeyError;

/// How many 32-byte draws to attempt before giving up on the entropy source.
///
/// A uniformly random draw is an invalid scalar with probability ~2^-128,
/// so repeated failures mean the source itself is broken.
const MAX_DRAWS: usize = 8;

/// A private key and the address derived from it.
pub struct Keypair {
    signer: PrivateKeySigner,
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

impl Keypair {
    /// Generate a new keypair from the operating system's CSPRNG.
    pub fn generate() -> Result<Self, KeyError> {
        Self::generate_with(&mut OsRng)
    }

    /// Generate a new keypair from the given cryptographically secure RNG.
    pub fn generate_with<R>(rng: &mut R) -> Result<Self, KeyError>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        for _ in 0..MAX_DRAWS {
            let mut bytes = B256::ZERO;
            rng.try_fill_bytes(&mut bytes.0)
                .map_err(|e| KeyError::RandomnessUnavailable(e.to_string()))?;

            // Zero and values at or above the curve order are not valid keys.
            if let Ok(signer) = PrivateKeySigner::from_bytes(&bytes) {
                return Ok(Self { signer });
            }
        }

        Err(KeyError::RandomnessUnavailable(format!(
            "no valid secp256k1 scalar after {MAX_DRAWS} draws"
        )))
    }

    /// Import a keypair from a hex private key, with or without `0x`.
    pub fn from_private_key(key: &str) -> Result<Self, KeyError> {
        let key = key.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);
        let signer = key
            .parse::<PrivateKeySigner>()
            .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self { signer })
    }

    /// The address derived from this keypair's private key.
    #[must_use]
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// The EIP-55 checksummed address string.
    #[must_use]
    pub fn address_string(&self) -> String {
        self.address().to_checksum(None)
    }

    /// The raw 32-byte private key.
    ///
    /// **Security Warning**: Handle this value carefully.
    #[must_use]
    pub fn private_key(&self) -> B256 {
        self.signer.to_bytes()
    }

    /// The private key as `0x`-prefixed lowercase hex, for one-time display.
    ///
    /// **Security Warning**: Handle this value carefully.
    #[must_use]
    pub fn private_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signer.to_bytes()))
    }

    /// Convert into an alloy signer so the wallet can sign on its own.
    #[must_use]
    pub fn into_signer(self) -> PrivateKeySigner {
        self.signer
    }
}

/// Derive the Ethereum address for a raw private key.
pub fn derive_address(private_key: &B256) -> Result<Address, KeyError> {
    PrivateKeySigner::from_bytes(private_key)
        .map(|signer| signer.address())
        .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))
}
