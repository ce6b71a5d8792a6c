//! End-to-end transfer lifecycle against in-memory wallet and chain fakes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use gnolink::prelude::*;
use tokio::sync::Mutex;
use tokio_test::{assert_err, assert_ok};

/// How the fake wallet answers `sign_and_broadcast`.
#[derive(Clone)]
enum SignerBehavior {
    Accept(TxHash),
    Reject,
    BroadcastFails,
}

struct FakeSigner {
    address: Option<Address>,
    chain_id: Option<u64>,
    behavior: SignerBehavior,
    calls: AtomicUsize,
    sent: Mutex<Vec<(Address, U256)>>,
}

impl FakeSigner {
    fn connected(chain_id: u64, behavior: SignerBehavior) -> Self {
        Self {
            address: Some(Address::repeat_byte(0x11)),
            chain_id: Some(chain_id),
            behavior,
            calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn disconnected() -> Self {
        Self {
            address: None,
            chain_id: None,
            behavior: SignerBehavior::Reject,
            calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SigningProvider for FakeSigner {
    fn active_address(&self) -> Option<Address> {
        self.address
    }

    fn active_chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    async fn sign_and_broadcast(
        &self,
        destination: Address,
        value: U256,
    ) -> Result<TxHash, SignerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().await.push((destination, value));
        match &self.behavior {
            SignerBehavior::Accept(hash) => Ok(*hash),
            SignerBehavior::Reject => Err(SignerError::rejected("User rejected the request.")),
            SignerBehavior::BroadcastFails => Err(SignerError::broadcast("insufficient funds")),
        }
    }
}

struct FakeGateway {
    answer: Result<Confirmation, GatewayError>,
    awaited: Mutex<Vec<TxHash>>,
}

impl FakeGateway {
    fn answering(answer: Result<Confirmation, GatewayError>) -> Arc<Self> {
        Arc::new(Self {
            answer,
            awaited: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChainGateway for FakeGateway {
    async fn await_confirmation(&self, hash: TxHash) -> Result<Confirmation, GatewayError> {
        self.awaited.lock().await.push(hash);
        self.answer.clone()
    }

    async fn balance(&self, _address: Address) -> Result<U256, GatewayError> {
        Ok(U256::ZERO)
    }
}

fn hash() -> TxHash {
    TxHash::repeat_byte(0xab)
}

fn request_to_new_wallet(amount: &str) -> TransferRequest {
    let keypair = Keypair::generate().unwrap();
    TransferRequest::new(keypair.address(), amount, GNOSIS_CHAIN_ID)
}

#[tokio::test]
async fn test_confirmed_transfer_walks_every_state() {
    let signer = FakeSigner::connected(100, SignerBehavior::Accept(hash()));
    let gateway = FakeGateway::answering(Ok(Confirmation::succeeded()));
    let orchestrator = TransferOrchestrator::new(gateway.clone());

    let request = request_to_new_wallet("0.001");
    let destination = request.destination;
    let outcome = assert_ok!(orchestrator.send(request, &signer).await);

    assert_eq!(
        outcome.history(),
        &[
            TransferState::Idle,
            TransferState::Submitting,
            TransferState::Submitted(hash()),
            TransferState::Confirmed(hash()),
        ]
    );
    assert!(outcome.is_confirmed());
    assert_eq!(outcome.hash(), Some(hash()));
    assert!(outcome.metrics().to_submission.is_some());
    assert!(outcome.metrics().to_terminal.is_some());

    let sent = signer.sent.lock().await;
    assert_eq!(
        sent.as_slice(),
        &[(destination, U256::from(1_000_000_000_000_000u64))]
    );
    assert_eq!(gateway.awaited.lock().await.as_slice(), &[hash()]);
}

#[tokio::test]
async fn test_zero_amount_never_reaches_signer() {
    let signer = FakeSigner::connected(100, SignerBehavior::Accept(hash()));
    let orchestrator = TransferOrchestrator::new(FakeGateway::answering(Ok(
        Confirmation::succeeded(),
    )));

    let err = assert_err!(orchestrator.send(request_to_new_wallet("0"), &signer).await);
    assert_eq!(err, TransferError::InvalidAmount(AmountError::Zero));
    assert_eq!(signer.calls(), 0);
}

#[tokio::test]
async fn test_negative_amount_never_reaches_signer() {
    let signer = FakeSigner::connected(100, SignerBehavior::Accept(hash()));
    let orchestrator = TransferOrchestrator::new(FakeGateway::answering(Ok(
        Confirmation::succeeded(),
    )));

    let err = assert_err!(orchestrator.send(request_to_new_wallet("-1"), &signer).await);
    assert_eq!(err, TransferError::InvalidAmount(AmountError::Negative));
    assert_eq!(signer.calls(), 0);
}

#[tokio::test]
async fn test_excess_precision_is_rejected_not_truncated() {
    let signer = FakeSigner::connected(100, SignerBehavior::Accept(hash()));
    let orchestrator = TransferOrchestrator::new(FakeGateway::answering(Ok(
        Confirmation::succeeded(),
    )));

    let err = assert_err!(
        orchestrator
            .send(request_to_new_wallet("0.0000000000000000001"), &signer)
            .await
    );
    assert_eq!(
        err,
        TransferError::InvalidAmount(AmountError::TooPrecise { decimals: 18 })
    );
    assert_eq!(signer.calls(), 0);
}

#[tokio::test]
async fn test_wrong_network_never_reaches_signer() {
    let signer = FakeSigner::connected(1, SignerBehavior::Accept(hash()));
    let orchestrator = TransferOrchestrator::new(FakeGateway::answering(Ok(
        Confirmation::succeeded(),
    )));

    let err = assert_err!(orchestrator.send(request_to_new_wallet("0.001"), &signer).await);
    assert_eq!(
        err,
        TransferError::WrongNetwork {
            expected: 100,
            actual: 1
        }
    );
    assert_eq!(signer.calls(), 0);
}

#[tokio::test]
async fn test_network_is_checked_before_amount() {
    let signer = FakeSigner::connected(1, SignerBehavior::Accept(hash()));
    let orchestrator = TransferOrchestrator::new(FakeGateway::answering(Ok(
        Confirmation::succeeded(),
    )));

    let err = assert_err!(orchestrator.send(request_to_new_wallet("0"), &signer).await);
    assert!(matches!(err, TransferError::WrongNetwork { .. }));
}

#[tokio::test]
async fn test_disconnected_signer_is_rejected() {
    let signer = FakeSigner::disconnected();
    let orchestrator = TransferOrchestrator::new(FakeGateway::answering(Ok(
        Confirmation::succeeded(),
    )));

    let err = assert_err!(orchestrator.send(request_to_new_wallet("0.001"), &signer).await);
    assert_eq!(err, TransferError::NotConnected);
    assert_eq!(signer.calls(), 0);
}

#[tokio::test]
async fn test_rejection_never_reports_submitted() {
    let signer = FakeSigner::connected(100, SignerBehavior::Reject);
    let gateway = FakeGateway::answering(Ok(Confirmation::succeeded()));
    let orchestrator = TransferOrchestrator::new(gateway.clone());

    let outcome = assert_ok!(orchestrator.send(request_to_new_wallet("0.001"), &signer).await);

    let failure = outcome.failure().unwrap();
    assert_eq!(failure.reason, FailureReason::Rejected);
    assert_eq!(failure.reason.as_str(), "rejected");
    assert_eq!(failure.hash, None);
    assert!(
        !outcome
            .history()
            .iter()
            .any(|state| matches!(state, TransferState::Submitted(_)))
    );
    assert_eq!(outcome.history().len(), 3);
    assert!(gateway.awaited.lock().await.is_empty());
}

#[tokio::test]
async fn test_broadcast_failure() {
    let signer = FakeSigner::connected(100, SignerBehavior::BroadcastFails);
    let orchestrator = TransferOrchestrator::new(FakeGateway::answering(Ok(
        Confirmation::succeeded(),
    )));

    let outcome = assert_ok!(orchestrator.send(request_to_new_wallet("0.001"), &signer).await);
    let failure = outcome.failure().unwrap();
    assert_eq!(failure.reason, FailureReason::BroadcastFailed);
    assert!(failure.detail.contains("insufficient funds"));
    assert!(outcome.metrics().to_submission.is_none());
}

#[tokio::test]
async fn test_revert_after_submission() {
    let signer = FakeSigner::connected(100, SignerBehavior::Accept(hash()));
    let orchestrator = TransferOrchestrator::new(FakeGateway::answering(Ok(
        Confirmation::reverted(),
    )));

    let outcome = assert_ok!(orchestrator.send(request_to_new_wallet("0.001"), &signer).await);

    let tail = &outcome.history()[2..];
    assert_eq!(tail[0], TransferState::Submitted(hash()));
    match &tail[1] {
        TransferState::Failed(failure) => {
            assert_eq!(failure.reason, FailureReason::Reverted);
            assert_eq!(failure.hash, Some(hash()));
        }
        other => panic!("expected failure, got {other}"),
    }
    assert_eq!(outcome.hash(), Some(hash()));
}

#[tokio::test]
async fn test_dropped_transaction() {
    let signer = FakeSigner::connected(100, SignerBehavior::Accept(hash()));
    let orchestrator = TransferOrchestrator::new(FakeGateway::answering(Ok(
        Confirmation::dropped(),
    )));

    let outcome = assert_ok!(orchestrator.send(request_to_new_wallet("0.001"), &signer).await);
    let failure = outcome.failure().unwrap();
    assert_eq!(failure.reason, FailureReason::Dropped);
    assert_eq!(failure.hash, Some(hash()));
}

#[tokio::test]
async fn test_gateway_error_keeps_hash() {
    let signer = FakeSigner::connected(100, SignerBehavior::Accept(hash()));
    let orchestrator = TransferOrchestrator::new(FakeGateway::answering(Err(
        GatewayError::rpc("connection reset"),
    )));

    let outcome = assert_ok!(orchestrator.send(request_to_new_wallet("0.001"), &signer).await);
    let failure = outcome.failure().unwrap();
    assert_eq!(failure.reason, FailureReason::ConfirmationUnavailable);
    assert_eq!(failure.hash, Some(hash()));
    assert!(failure.detail.contains("connection reset"));
}

#[tokio::test]
async fn test_watcher_sees_terminal_state() {
    let signer = FakeSigner::connected(100, SignerBehavior::Accept(hash()));
    let orchestrator = TransferOrchestrator::new(FakeGateway::answering(Ok(
        Confirmation::succeeded(),
    )));

    let transfer = assert_ok!(orchestrator.prepare(request_to_new_wallet("0.5"), &signer));
    assert_eq!(transfer.value(), U256::from(500_000_000_000_000_000u64));

    let states = transfer.subscribe();
    assert_eq!(*states.borrow(), TransferState::Idle);

    let outcome = transfer.execute().await;
    assert_eq!(*states.borrow(), TransferState::Confirmed(hash()));
    assert_eq!(outcome.state(), &TransferState::Confirmed(hash()));
}

#[tokio::test]
async fn test_concurrent_sends_are_independent() {
    let signer = FakeSigner::connected(100, SignerBehavior::Accept(hash()));
    let orchestrator = TransferOrchestrator::new(FakeGateway::answering(Ok(
        Confirmation::succeeded(),
    )));

    let (first, second) = tokio::join!(
        orchestrator.send(request_to_new_wallet("0.001"), &signer),
        orchestrator.send(request_to_new_wallet("0.002"), &signer),
    );
    let first = assert_ok!(first);
    let second = assert_ok!(second);

    assert!(first.is_confirmed());
    assert!(second.is_confirmed());
    assert_eq!(first.history().len(), 4);
    assert_eq!(second.history().len(), 4);
    assert_eq!(signer.calls(), 2);
}
