#![cfg_attr(docsrs, feature(doc_cfg))]
//! GnoLink is the transfer core behind a wallet screen: it generates
//! throwaway EVM keypairs and moves native currency from a connected wallet
//! to them, exposing the transfer as an explicit state machine.
//!
//! The wallet session and the RPC node are injected as capabilities
//! ([`signer::SigningProvider`] and [`gateway::ChainGateway`]), so the core
//! runs the same against a real wallet, a local key, or a test fake.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gnolink::prelude::*;
//!
//! let keypair = Keypair::generate()?;
//! let orchestrator = TransferOrchestrator::new(Arc::new(gateway));
//! let request = TransferRequest::new(keypair.address(), "0.001", GNOSIS_CHAIN_ID);
//! let outcome = orchestrator.send(request, &signer).await?;
//! ```

pub mod account;
pub mod amount;
pub mod config;
pub mod error;
pub mod gateway;
pub mod keys;
pub mod network;
pub mod prelude;
pub mod signer;
pub mod telemetry;
pub mod transfer;

pub use error::{Error, Result};
