//! Telemetry for transfers using the `tracing` ecosystem.
//!
//! The orchestrator emits structured events inside a `transfer` span and
//! returns a small [`TransferMetrics`] snapshot with each outcome. Export is
//! left to whichever subscriber the embedding application installs:
//!
//! ```rust,ignore
//! tracing_subscriber::fmt::init();
//! ```
//!
//! Private keys are never attached to spans or events.

use std::time::{Duration, Instant};

use alloy::primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};
use tracing::{Span, info, info_span};

/// Timings collected for a single transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferMetrics {
    /// Time from entering `Submitting` until the network accepted the transaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_submission: Option<Duration>,
    /// Time from entering `Submitting` until a terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_terminal: Option<Duration>,
}

impl std::fmt::Display for TransferMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Transfer Metrics")?;
        match self.to_submission {
            Some(d) => writeln!(f, "  Submission: {:.2}s", d.as_secs_f64())?,
            None => writeln!(f, "  Submission: -")?,
        }
        match self.to_terminal {
            Some(d) => writeln!(f, "  Terminal:   {:.2}s", d.as_secs_f64())?,
            None => writeln!(f, "  Terminal:   -")?,
        }
        Ok(())
    }
}

/// Collects timings for one transfer and emits the matching events.
#[derive(Debug, Clone, Copy)]
pub struct Telemetry {
    start: Instant,
    metrics: TransferMetrics,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl Telemetry {
    /// Start timing a transfer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            metrics: TransferMetrics::default(),
        }
    }

    /// Record that the network accepted the transaction.
    pub fn record_submitted(&mut self, hash: TxHash) {
        let elapsed = self.start.elapsed();
        self.metrics.to_submission = Some(elapsed);
        Span::current().record("hash", tracing::field::display(hash));
        info!(hash = %hash, elapsed_ms = elapsed.as_millis(), "transfer_submitted");
    }

    /// Complete the transfer and return final metrics.
    #[must_use]
    pub fn complete(&mut self, state: &str) -> TransferMetrics {
        let elapsed = self.start.elapsed();
        self.metrics.to_terminal = Some(elapsed);
        info!(state, duration_ms = elapsed.as_millis(), "transfer_completed");
        self.metrics
    }

    /// Create a span for a transfer.
    #[must_use]
    pub fn transfer_span(chain_id: u64, destination: Address, value: U256) -> Span {
        info_span!(
            "transfer",
            chain_id,
            destination = %destination,
            value = %value,
            hash = tracing::field::Empty
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_collector() {
        let mut telemetry = Telemetry::new();
        assert!(telemetry.metrics.to_submission.is_none());

        telemetry.record_submitted(TxHash::repeat_byte(0xab));
        assert!(telemetry.metrics.to_submission.is_some());

        let metrics = telemetry.complete("confirmed");
        assert!(metrics.to_terminal.is_some());
        assert!(metrics.to_terminal >= metrics.to_submission);
    }

    #[test]
    fn test_metrics_display() {
        let metrics = TransferMetrics {
            to_submission: Some(Duration::from_millis(1500)),
            to_terminal: None,
        };
        let text = metrics.to_string();
        assert!(text.contains("Submission: 1.50s"));
        assert!(text.contains("Terminal:   -"));
    }

    #[test]
    fn test_metrics_serialization_skips_missing() {
        let json = serde_json::to_value(TransferMetrics::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
