//! Unified error types for gnolink.
//!
//! Each stage of the transfer core owns a focused error enum. All of them
//! convert into [`Error`] for callers that only want a single type.

// ============================================================================
// Main Error Type
// ============================================================================

/// Result type alias for gnolink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for gnolink.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Key generation or import error.
    #[error("key: {0}")]
    Key(#[from] KeyError),

    /// Amount parsing error.
    #[error("amount: {0}")]
    Amount(#[from] AmountError),

    /// Transfer precondition error.
    #[error("transfer: {0}")]
    Transfer(#[from] TransferError),

    /// Signing provider error.
    #[error("signer: {0}")]
    Signer(#[from] SignerError),

    /// Chain gateway error.
    #[error("gateway: {0}")]
    Gateway(#[from] GatewayError),

    /// Account summary error.
    #[error("account: {0}")]
    Account(#[from] AccountError),

    /// Configuration error.
    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

// ============================================================================
// Key Errors
// ============================================================================

/// Error type for keypair generation and import.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// The secure randomness source failed or kept producing unusable output.
    #[error("secure randomness unavailable: {0}")]
    RandomnessUnavailable(String),

    /// The supplied private key is not a valid secp256k1 scalar.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),
}

// ============================================================================
// Amount Errors
// ============================================================================

/// Error type for human-readable amount parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// No digits were supplied.
    #[error("amount is empty")]
    Empty,

    /// The input is not a plain decimal number.
    #[error("amount is not a decimal number")]
    Malformed,

    /// The amount is below zero.
    #[error("amount must not be negative")]
    Negative,

    /// The amount is exactly zero.
    #[error("amount must be greater than zero")]
    Zero,

    /// More fractional digits than the native unit supports.
    #[error("amount has more than {decimals} fractional digits")]
    TooPrecise {
        /// Fractional digits supported by the unit.
        decimals: u8,
    },

    /// The scaled value does not fit in 256 bits.
    #[error("amount is too large")]
    Overflow,
}

// ============================================================================
// Transfer Errors
// ============================================================================

/// Precondition failures reported by the orchestrator before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    /// No connected signing provider.
    #[error("signing provider is not connected")]
    NotConnected,

    /// The signer is on a different network than the request requires.
    #[error("wrong network: expected chain {expected}, signer is on chain {actual}")]
    WrongNetwork {
        /// Chain id the request requires.
        expected: u64,
        /// Chain id the signer is currently on.
        actual: u64,
    },

    /// The amount failed validation.
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),
}

/// An attempted state change the transfer lifecycle does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal transfer transition {from} -> {to}")]
pub struct TransitionError {
    /// State the lifecycle was in.
    pub from: &'static str,
    /// State that was requested.
    pub to: &'static str,
}

// ============================================================================
// Collaborator Errors
// ============================================================================

/// Errors raised by a [`SigningProvider`](crate::signer::SigningProvider).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignerError {
    /// The wallet declined to authorize the transaction.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The network refused the signed transaction.
    #[error("broadcast failed: {0}")]
    Broadcast(String),

    /// The wallet session went away mid-request.
    #[error("not connected")]
    NotConnected,

    /// The provider could not be constructed.
    #[error("config: {0}")]
    Config(String),
}

impl SignerError {
    /// Create a rejection error.
    #[inline]
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Create a broadcast error.
    #[inline]
    pub fn broadcast(msg: impl Into<String>) -> Self {
        Self::Broadcast(msg.into())
    }
}

/// Errors raised by a [`ChainGateway`](crate::gateway::ChainGateway).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Could not reach the RPC endpoint.
    #[error("connect: {0}")]
    Connect(String),

    /// The RPC call failed.
    #[error("rpc: {0}")]
    Rpc(String),
}

impl GatewayError {
    /// Create an RPC error.
    #[inline]
    pub fn rpc(msg: impl Into<String>) -> Self {
        Self::Rpc(msg.into())
    }
}

/// Errors raised while building an account summary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    /// No connected signing provider.
    #[error("signing provider is not connected")]
    NotConnected,

    /// The balance lookup failed.
    #[error("{0}")]
    Gateway(#[from] GatewayError),
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("parse: {0}")]
    Parse(#[from] serde_json::Error),

    /// Missing required field.
    #[error("missing: {0}")]
    Missing(String),

    /// Invalid value.
    #[error("invalid: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create a missing field error.
    #[inline]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing(field.into())
    }

    /// Create an invalid value error.
    #[inline]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

// ============================================================================
// Tests
// ============================================================================
