//! Notarization gateway — durable external recording of lifecycle
//! transitions, with bounded retry.
//!
//! The ledger service itself is out of scope; the engine only requires
//! "submit record, return confirmation id or fail" semantics. Retry
//! ownership lives here: both error kinds are retryable, delays back off
//! exponentially, and after the configured attempts the whole triggering
//! operation fails (the caller rolls back any guarded local state).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use stayswap_types::{
    BookingId, LedgerRef, ProposalId, ProposalTransition, Result, RetryPolicy, SwapError,
    SwapProposal,
};

/// Failure reported by the notarization ledger. The engine treats both
/// kinds as retryable.
#[derive(Debug, Error)]
pub enum NotaryError {
    /// The ledger was unreachable or the call timed out.
    #[error("network error: {0}")]
    Network(String),
    /// The ledger answered but refused the record.
    #[error("ledger rejected record: {0}")]
    Rejected(String),
}

/// The record submitted to the ledger for one lifecycle transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotaryRecord {
    pub proposal: ProposalId,
    pub transition: ProposalTransition,
    pub source_booking: BookingId,
    pub target_booking: Option<BookingId>,
    pub recorded_at: DateTime<Utc>,
}

impl NotaryRecord {
    /// Build the record for a proposal transition, stamped now.
    #[must_use]
    pub fn for_transition(proposal: &SwapProposal, transition: ProposalTransition) -> Self {
        Self {
            proposal: proposal.id,
            transition,
            source_booking: proposal.source_booking,
            target_booking: proposal.target_booking,
            recorded_at: Utc::now(),
        }
    }

    /// Canonical signing payload.
    ///
    /// Format: `"stayswap:rec:v1:" || proposal || transition || source || target`
    #[must_use]
    pub fn canonical_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(128);
        payload.extend_from_slice(b"stayswap:rec:v1:");
        payload.extend_from_slice(self.proposal.0.as_bytes());
        payload.extend_from_slice(self.transition.to_string().as_bytes());
        payload.extend_from_slice(self.source_booking.0.as_bytes());
        match self.target_booking {
            Some(target) => payload.extend_from_slice(target.0.as_bytes()),
            None => payload.extend_from_slice(&[0u8; 16]),
        }
        payload
    }

    /// SHA-256 digest of the canonical payload.
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_payload());
        hasher.finalize().into()
    }

    /// Hex rendering of the digest, for logs and audit trails.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }
}

/// Confirmation returned by the ledger for a submitted record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotaryReceipt {
    pub confirmation: LedgerRef,
    pub timestamp: DateTime<Utc>,
}

/// Collaborator contract for the external notarization ledger.
pub trait NotaryClient: Send + Sync {
    fn submit(&self, record: &NotaryRecord) -> std::result::Result<NotaryReceipt, NotaryError>;
}

/// Wraps a [`NotaryClient`] with the engine's retry discipline.
pub struct NotaryGateway {
    client: Arc<dyn NotaryClient>,
    policy: RetryPolicy,
}

impl NotaryGateway {
    #[must_use]
    pub fn new(client: Arc<dyn NotaryClient>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Submit a record, retrying per the policy. There is no cancellation
    /// of an attempt in flight; delays apply between attempts only.
    ///
    /// # Errors
    /// Returns [`SwapError::NotarizationFailed`] with the last underlying
    /// cause once attempts are exhausted.
    pub fn submit(&self, record: &NotaryRecord) -> Result<NotaryReceipt> {
        let mut last_error: Option<NotaryError> = None;
        for attempt in 1..=self.policy.max_attempts {
            match self.client.submit(record) {
                Ok(receipt) => {
                    if attempt > 1 {
                        tracing::debug!(
                            proposal = %record.proposal,
                            transition = %record.transition,
                            attempt,
                            "notarization succeeded after retry"
                        );
                    }
                    return Ok(receipt);
                }
                Err(err) => {
                    tracing::warn!(
                        proposal = %record.proposal,
                        transition = %record.transition,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %err,
                        "notarization attempt failed"
                    );
                    last_error = Some(err);
                    if let Some(delay) = self.policy.delay_after(attempt) {
                        if !delay.is_zero() {
                            std::thread::sleep(delay);
                        }
                    }
                }
            }
        }
        Err(SwapError::NotarizationFailed {
            attempts: self.policy.max_attempts,
            cause: last_error
                .map_or_else(|| "no attempts were made".to_string(), |e| e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::RecordingNotary;
    use chrono::Utc;
    use stayswap_types::{BookingId, UserId};

    fn record() -> NotaryRecord {
        let proposal = SwapProposal::dummy(
            UserId::new(),
            BookingId::new(),
            BookingId::new(),
            Utc::now() + chrono::Duration::hours(1),
        );
        NotaryRecord::for_transition(&proposal, ProposalTransition::Created)
    }

    #[test]
    fn digest_is_deterministic() {
        let r = record();
        assert_eq!(r.digest(), r.digest());
        assert_eq!(r.digest_hex().len(), 64);
    }

    #[test]
    fn digest_differs_by_transition() {
        let a = record();
        let mut b = a.clone();
        b.transition = ProposalTransition::Cancelled;
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn gateway_returns_first_success() {
        let notary = Arc::new(RecordingNotary::new());
        let gateway = NotaryGateway::new(notary.clone(), RetryPolicy::immediate(3));
        let receipt = gateway.submit(&record()).unwrap();
        assert!(!receipt.confirmation.as_str().is_empty());
        assert_eq!(notary.submission_count(), 1);
    }

    #[test]
    fn gateway_retries_then_succeeds() {
        let notary = Arc::new(RecordingNotary::failing_first(2));
        let gateway = NotaryGateway::new(notary.clone(), RetryPolicy::immediate(3));
        let receipt = gateway.submit(&record());
        assert!(receipt.is_ok());
        assert_eq!(notary.submission_count(), 3);
    }

    #[test]
    fn gateway_exhausts_and_reports_cause() {
        let notary = Arc::new(RecordingNotary::failing_first(u32::MAX));
        let gateway = NotaryGateway::new(notary.clone(), RetryPolicy::immediate(3));
        let err = gateway.submit(&record()).unwrap_err();
        match err {
            SwapError::NotarizationFailed { attempts, cause } => {
                assert_eq!(attempts, 3);
                assert!(cause.contains("network"), "cause: {cause}");
            }
            other => panic!("expected NotarizationFailed, got {other}"),
        }
        assert_eq!(notary.submission_count(), 3);
    }

    #[test]
    fn record_serde_roundtrip() {
        let r = record();
        let json = serde_json::to_string(&r).unwrap();
        let back: NotaryRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(r.proposal, back.proposal);
        assert_eq!(r.transition, back.transition);
    }
}
