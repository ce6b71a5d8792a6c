//! Commonly used types, re-exported for glob import.

pub use crate::account::AccountSummary;
pub use crate::amount::{NATIVE_DECIMALS, format_amount, parse_amount};
pub use crate::config::GnolinkConfig;
pub use crate::error::{
    AccountError, AmountError, GatewayError, KeyError, SignerError, TransferError,
};
pub use crate::gateway::{ChainGateway, Confirmation, RpcGateway};
pub use crate::keys::{Keypair, derive_address};
pub use crate::network::{GNOSIS_CHAIN_ID, Network};
pub use crate::signer::{LocalSigningProvider, SigningProvider};
pub use crate::transfer::{
    Failure, FailureReason, TransferOrchestrator, TransferOutcome, TransferRequest, TransferState,
};
