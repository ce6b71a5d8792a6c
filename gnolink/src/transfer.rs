//! Native-asset transfer orchestration.
//!
//! A transfer moves through a one-way lifecycle:
//!
//! ```text
//! Idle ──► Submitting ──► Submitted(hash) ──► Confirmed(hash)
//!              │                 │
//!              └──► Failed ◄─────┘
//! ```
//!
//! Preconditions (connected signer, matching chain, positive amount) are
//! checked synchronously by [`TransferOrchestrator::prepare`] before anything
//! touches the network. [`PreparedTransfer::execute`] then drives the
//! lifecycle, mapping signer and gateway failures to a terminal
//! [`TransferState::Failed`] instead of returning them as errors.
//!
//! Every call produces an independent [`TransferOutcome`]. There is no
//! retry and no implicit timeout.
//!
//! # Examples
//!
//! ```rust,ignore
//! let orchestrator = TransferOrchestrator::new(Arc::new(gateway));
//! let request = TransferRequest::new(keypair.address(), "0.001", GNOSIS_CHAIN_ID);
//!
//! let transfer = orchestrator.prepare(request, &signer)?;
//! let mut states = transfer.subscribe();
//! tokio::spawn(async move {
//!     while states.changed().await.is_ok() {
//!         render(&states.borrow());
//!     }
//! });
//! let outcome = transfer.execute().await;
//! ```

use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{Instrument, error, info, warn};

use crate::amount::parse_amount;
use crate::error::{SignerError, TransferError, TransitionError};
use crate::gateway::{ChainGateway, Confirmation};
use crate::network::Network;
use crate::signer::SigningProvider;
use crate::telemetry::{Telemetry, TransferMetrics};

// ============================================================================
// Request
// ============================================================================

/// A request to move native currency to `destination`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Recipient address.
    pub destination: Address,
    /// Positive decimal amount in human units, e.g. `"0.001"`.
    pub amount: String,
    /// Chain the signer must be connected to.
    pub chain_id: u64,
}

impl TransferRequest {
    /// Create a new transfer request.
    #[must_use]
    pub fn new(destination: Address, amount: impl Into<String>, chain_id: u64) -> Self {
        Self {
            destination,
            amount: amount.into(),
            chain_id,
        }
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Why a transfer ended in [`TransferState::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The wallet declined to authorize the transaction.
    Rejected,
    /// The network refused the signed transaction.
    BroadcastFailed,
    /// Included in a block but execution failed.
    Reverted,
    /// Accepted for broadcast but never included.
    Dropped,
    /// The gateway could not report on a submitted transaction.
    ConfirmationUnavailable,
}

impl FailureReason {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rejected => "rejected",
            Self::BroadcastFailed => "broadcast_failed",
            Self::Reverted => "reverted",
            Self::Dropped => "dropped",
            Self::ConfirmationUnavailable => "confirmation_unavailable",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Details of a failed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// Classification of the failure.
    pub reason: FailureReason,
    /// Hash, when the network had already accepted the transaction.
    pub hash: Option<TxHash>,
    /// Human-readable detail for display.
    pub detail: String,
}

impl Failure {
    /// Create a new failure.
    #[must_use]
    pub fn new(reason: FailureReason, hash: Option<TxHash>, detail: impl Into<String>) -> Self {
        Self {
            reason,
            hash,
            detail: detail.into(),
        }
    }

    /// Classify an error raised while the signer was authorizing or broadcasting.
    #[must_use]
    pub fn from_signer_error(err: SignerError) -> Self {
        match err {
            SignerError::Rejected(msg) => Self::new(FailureReason::Rejected, None, msg),
            SignerError::NotConnected => {
                Self::new(FailureReason::Rejected, None, "signer disconnected")
            }
            SignerError::Broadcast(msg) | SignerError::Config(msg) => {
                Self::new(FailureReason::BroadcastFailed, None, msg)
            }
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.reason, self.detail)
    }
}

/// Where a transfer is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    /// Nothing in flight.
    Idle,
    /// Handed to the signer for authorization and broadcast.
    Submitting,
    /// Accepted by the network, awaiting inclusion.
    Submitted(TxHash),
    /// Included and executed successfully.
    Confirmed(TxHash),
    /// Terminal failure.
    Failed(Failure),
}

impl TransferState {
    /// Stable string form of the state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Submitted(_) => "submitted",
            Self::Confirmed(_) => "confirmed",
            Self::Failed(_) => "failed",
        }
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed(_) | Self::Failed(_))
    }

    /// Whether a transfer is in flight (a UI should block resubmission).
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Submitting | Self::Submitted(_))
    }

    /// The transaction hash, once one has been assigned.
    #[must_use]
    pub const fn hash(&self) -> Option<TxHash> {
        match self {
            Self::Submitted(hash) | Self::Confirmed(hash) => Some(*hash),
            Self::Failed(failure) => failure.hash,
            Self::Idle | Self::Submitting => None,
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// Hashes are immutable once assigned: a confirmation or failure after
    /// submission must carry the submitted hash.
    #[must_use]
    pub fn can_advance_to(&self, next: &Self) -> bool {
        match (self, next) {
            (Self::Idle, Self::Submitting) | (Self::Submitting, Self::Submitted(_)) => true,
            (Self::Submitting, Self::Failed(failure)) => failure.hash.is_none(),
            (Self::Submitted(hash), Self::Confirmed(confirmed)) => hash == confirmed,
            (Self::Submitted(hash), Self::Failed(failure)) => failure.hash == Some(*hash),
            _ => false,
        }
    }
}

impl std::fmt::Display for TransferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submitted(hash) | Self::Confirmed(hash) => {
                write!(f, "{} ({hash:#x})", self.as_str())
            }
            Self::Failed(failure) => write!(f, "failed ({failure})"),
            Self::Idle | Self::Submitting => write!(f, "{}", self.as_str()),
        }
    }
}

/// The transition log of one transfer, published to watchers as it changes.
#[derive(Debug)]
struct Lifecycle {
    history: Vec<TransferState>,
    tx: watch::Sender<TransferState>,
}

impl Lifecycle {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(TransferState::Idle);
        Self {
            history: vec![TransferState::Idle],
            tx,
        }
    }

    fn current(&self) -> &TransferState {
        // history always starts with Idle
        &self.history[self.history.len() - 1]
    }

    fn advance(&mut self, next: TransferState) -> Result<(), TransitionError> {
        let current = self.current();
        if !current.can_advance_to(&next) {
            return Err(TransitionError {
                from: current.as_str(),
                to: next.as_str(),
            });
        }
        self.tx.send_replace(next.clone());
        self.history.push(next);
        Ok(())
    }
}

/// The result of one `send` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    history: Vec<TransferState>,
    metrics: TransferMetrics,
}

impl TransferOutcome {
    /// The final state.
    #[must_use]
    pub fn state(&self) -> &TransferState {
        &self.history[self.history.len() - 1]
    }

    /// Every state the transfer passed through, starting with `Idle`.
    #[must_use]
    pub fn history(&self) -> &[TransferState] {
        &self.history
    }

    /// The transaction hash, if the network ever accepted the transfer.
    #[must_use]
    pub fn hash(&self) -> Option<TxHash> {
        self.state().hash()
    }

    /// Whether the transfer was confirmed.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        matches!(self.state(), TransferState::Confirmed(_))
    }

    /// The failure, if the transfer failed.
    #[must_use]
    pub fn failure(&self) -> Option<&Failure> {
        match self.state() {
            TransferState::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Timings collected while the transfer ran.
    #[must_use]
    pub const fn metrics(&self) -> &TransferMetrics {
        &self.metrics
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Drives native transfers through a [`ChainGateway`].
#[derive(Clone)]
pub struct TransferOrchestrator {
    gateway: Arc<dyn ChainGateway>,
}

impl std::fmt::Debug for TransferOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferOrchestrator").finish_non_exhaustive()
    }
}

impl TransferOrchestrator {
    /// Create an orchestrator that confirms through `gateway`.
    #[must_use]
    pub fn new(gateway: Arc<dyn ChainGateway>) -> Self {
        Self { gateway }
    }

    /// Validate a request against the signer without touching the network.
    ///
    /// Checks, in order: the signer is connected, it is on the request's
    /// chain, and the amount is a positive decimal the chain can represent.
    pub fn prepare<'a>(
        &self,
        request: TransferRequest,
        signer: &'a dyn SigningProvider,
    ) -> Result<PreparedTransfer<'a>, TransferError> {
        if !signer.is_connected() {
            return Err(TransferError::NotConnected);
        }
        let actual = signer.active_chain_id().ok_or(TransferError::NotConnected)?;
        if actual != request.chain_id {
            return Err(TransferError::WrongNetwork {
                expected: request.chain_id,
                actual,
            });
        }

        let network = Network::from_chain_id(request.chain_id);
        let value = parse_amount(&request.amount, network.decimals)?;

        Ok(PreparedTransfer {
            signer,
            gateway: Arc::clone(&self.gateway),
            destination: request.destination,
            value,
            chain_id: request.chain_id,
            lifecycle: Lifecycle::new(),
        })
    }

    /// Validate and run a transfer to completion.
    pub async fn send(
        &self,
        request: TransferRequest,
        signer: &dyn SigningProvider,
    ) -> Result<TransferOutcome, TransferError> {
        let transfer = self.prepare(request, signer)?;
        Ok(transfer.execute().await)
    }
}

/// A validated transfer that has not started yet.
pub struct PreparedTransfer<'a> {
    signer: &'a dyn SigningProvider,
    gateway: Arc<dyn ChainGateway>,
    destination: Address,
    value: U256,
    chain_id: u64,
    lifecycle: Lifecycle,
}

impl std::fmt::Debug for PreparedTransfer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedTransfer")
            .field("destination", &self.destination)
            .field("value", &self.value)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

impl PreparedTransfer<'_> {
    /// Recipient address.
    #[must_use]
    pub const fn destination(&self) -> Address {
        self.destination
    }

    /// Amount in smallest units.
    #[must_use]
    pub const fn value(&self) -> U256 {
        self.value
    }

    /// Watch state changes as they happen.
    ///
    /// A watcher sees the latest state; use [`TransferOutcome::history`] for
    /// the complete sequence.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TransferState> {
        self.lifecycle.tx.subscribe()
    }

    /// Run the transfer to a terminal state.
    pub async fn execute(mut self) -> TransferOutcome {
        let span = Telemetry::transfer_span(self.chain_id, self.destination, self.value);
        async move {
            let mut telemetry = Telemetry::new();
            self.enter(TransferState::Submitting);

            let hash = match self
                .signer
                .sign_and_broadcast(self.destination, self.value)
                .await
            {
                Ok(hash) => hash,
                Err(err) => {
                    let failure = Failure::from_signer_error(err);
                    warn!(reason = %failure.reason, detail = %failure.detail, "transfer not submitted");
                    self.enter(TransferState::Failed(failure));
                    return self.finish(&mut telemetry);
                }
            };

            telemetry.record_submitted(hash);
            self.enter(TransferState::Submitted(hash));

            let next = match self.gateway.await_confirmation(hash).await {
                Ok(Confirmation {
                    included: true,
                    reverted: false,
                }) => TransferState::Confirmed(hash),
                Ok(Confirmation { included: true, .. }) => TransferState::Failed(Failure::new(
                    FailureReason::Reverted,
                    Some(hash),
                    "transaction reverted",
                )),
                Ok(Confirmation { included: false, .. }) => TransferState::Failed(Failure::new(
                    FailureReason::Dropped,
                    Some(hash),
                    "transaction was never included",
                )),
                Err(err) => TransferState::Failed(Failure::new(
                    FailureReason::ConfirmationUnavailable,
                    Some(hash),
                    err.to_string(),
                )),
            };

            if let TransferState::Failed(failure) = &next {
                warn!(hash = %hash, reason = %failure.reason, detail = %failure.detail, "transfer failed");
            } else {
                info!(hash = %hash, "transfer confirmed");
            }
            self.enter(next);
            self.finish(&mut telemetry)
        }
        .instrument(span)
        .await
    }

    fn enter(&mut self, next: TransferState) {
        // The flow in `execute` only requests legal transitions.
        let result = self.lifecycle.advance(next);
        debug_assert!(result.is_ok(), "transfer lifecycle violated: {result:?}");
        if let Err(err) = result {
            error!(%err, "transfer lifecycle violated");
        }
    }

    fn finish(self, telemetry: &mut Telemetry) -> TransferOutcome {
        let metrics = telemetry.complete(self.lifecycle.current().as_str());
        TransferOutcome {
            history: self.lifecycle.history,
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::GatewayError;

    struct IdleSigner;

    #[async_trait]
    impl SigningProvider for IdleSigner {
        fn active_address(&self) -> Option<Address> {
            Some(Address::repeat_byte(0x11))
        }

        fn active_chain_id(&self) -> Option<u64> {
            Some(100)
        }

        async fn sign_and_broadcast(
            &self,
            _destination: Address,
            _value: U256,
        ) -> Result<TxHash, SignerError> {
            Err(SignerError::NotConnected)
        }
    }

    struct IdleGateway;

    #[async_trait]
    impl ChainGateway for IdleGateway {
        async fn await_confirmation(&self, _hash: TxHash) -> Result<Confirmation, GatewayError> {
            Ok(Confirmation::dropped())
        }

        async fn balance(&self, _address: Address) -> Result<U256, GatewayError> {
            Ok(U256::ZERO)
        }
    }

    fn hash(byte: u8) -> TxHash {
        TxHash::repeat_byte(byte)
    }

    #[test]
    fn test_legal_transitions() {
        let h = hash(1);
        assert!(TransferState::Idle.can_advance_to(&TransferState::Submitting));
        assert!(TransferState::Submitting.can_advance_to(&TransferState::Submitted(h)));
        assert!(TransferState::Submitted(h).can_advance_to(&TransferState::Confirmed(h)));
        assert!(TransferState::Submitting.can_advance_to(&TransferState::Failed(Failure::new(
            FailureReason::Rejected,
            None,
            "no"
        ))));
        assert!(
            TransferState::Submitted(h).can_advance_to(&TransferState::Failed(Failure::new(
                FailureReason::Reverted,
                Some(h),
                "reverted"
            )))
        );
    }

    #[test]
    fn test_illegal_transitions() {
        let h = hash(1);
        let failed = TransferState::Failed(Failure::new(FailureReason::Rejected, None, "no"));

        assert!(!TransferState::Idle.can_advance_to(&TransferState::Submitted(h)));
        assert!(!TransferState::Submitting.can_advance_to(&TransferState::Confirmed(h)));
        assert!(!TransferState::Submitted(h).can_advance_to(&TransferState::Confirmed(hash(2))));
        assert!(!TransferState::Submitted(h).can_advance_to(&TransferState::Submitting));
        assert!(!TransferState::Confirmed(h).can_advance_to(&failed));
        assert!(!failed.can_advance_to(&TransferState::Submitting));
        assert!(!failed.can_advance_to(&TransferState::Idle));
    }

    #[test]
    fn test_terminal_states_are_sticky() {
        let h = hash(3);
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(TransferState::Submitting).unwrap();
        lifecycle.advance(TransferState::Submitted(h)).unwrap();
        lifecycle.advance(TransferState::Confirmed(h)).unwrap();

        let err = lifecycle
            .advance(TransferState::Failed(Failure::new(
                FailureReason::Reverted,
                Some(h),
                "late",
            )))
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError {
                from: "confirmed",
                to: "failed"
            }
        );
        assert_eq!(lifecycle.current(), &TransferState::Confirmed(h));
        assert_eq!(lifecycle.history.len(), 4);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "transfer lifecycle violated")]
    fn test_illegal_step_panics_in_debug_builds() {
        let orchestrator = TransferOrchestrator::new(Arc::new(IdleGateway));
        let request = TransferRequest::new(Address::repeat_byte(0x22), "0.001", 100);
        let mut transfer = orchestrator.prepare(request, &IdleSigner).unwrap();

        transfer.enter(TransferState::Confirmed(hash(4)));
    }

    #[test]
    fn test_watchers_see_latest_state() {
        let mut lifecycle = Lifecycle::new();
        let rx = lifecycle.tx.subscribe();
        assert_eq!(*rx.borrow(), TransferState::Idle);

        lifecycle.advance(TransferState::Submitting).unwrap();
        assert_eq!(*rx.borrow(), TransferState::Submitting);
    }

    #[test]
    fn test_state_hash_and_flags() {
        let h = hash(9);
        assert_eq!(TransferState::Idle.hash(), None);
        assert_eq!(TransferState::Submitted(h).hash(), Some(h));
        assert!(TransferState::Submitted(h).is_pending());
        assert!(!TransferState::Submitted(h).is_terminal());
        assert!(TransferState::Confirmed(h).is_terminal());
        assert_eq!(
            TransferState::Failed(Failure::new(FailureReason::Dropped, Some(h), "gone")).hash(),
            Some(h)
        );
    }

    #[test]
    fn test_failure_classification() {
        let failure = Failure::from_signer_error(SignerError::rejected("user said no"));
        assert_eq!(failure.reason, FailureReason::Rejected);
        assert_eq!(failure.reason.as_str(), "rejected");

        let failure = Failure::from_signer_error(SignerError::broadcast("nonce too low"));
        assert_eq!(failure.reason, FailureReason::BroadcastFailed);
        assert_eq!(failure.reason.as_str(), "broadcast_failed");
        assert_eq!(failure.to_string(), "broadcast_failed: nonce too low");
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_value(FailureReason::ConfirmationUnavailable).unwrap();
        assert_eq!(json, "confirmation_unavailable");

        let json = serde_json::to_value(TransferState::Submitting).unwrap();
        assert_eq!(json, "submitting");
    }
}
