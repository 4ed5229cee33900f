//! External collaborator contracts consumed by the lifecycle manager.
//!
//! Implementations are out of scope for the engine:
//! - the **ownership transfer service** executes the actual asset
//!   handover on accept and returns a confirmation id
//! - the **notification dispatcher** is fire-and-forget; failures are
//!   logged and never block a transition
//!
//! (The notarization ledger contract lives in [`crate::notary`].)
//!
//! The `test-helpers` feature ships recording/failing doubles for all
//! three collaborators so both unit and integration suites can drive the
//! manager without real services.

use thiserror::Error;

use stayswap_types::{Booking, LedgerRef, ProposalId, SwapProposal, UserId};

/// Failure from the ownership transfer service.
#[derive(Debug, Error)]
#[error("transfer service error: {0}")]
pub struct TransferError(pub String);

/// Executes the two-sided asset handover for an accepted proposal.
/// Invoked only on accept; the returned confirmation id is recorded
/// before the proposal is marked completed.
pub trait OwnershipTransfer: Send + Sync {
    fn transfer(
        &self,
        proposal: &SwapProposal,
        source: &Booking,
        target: &Booking,
    ) -> std::result::Result<LedgerRef, TransferError>;
}

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    ProposalReceived,
    ProposalAccepted,
    ProposalRejected,
    ProposalCancelled,
    ProposalExpired,
    SwapCompleted,
}

impl std::fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProposalReceived => write!(f, "PROPOSAL_RECEIVED"),
            Self::ProposalAccepted => write!(f, "PROPOSAL_ACCEPTED"),
            Self::ProposalRejected => write!(f, "PROPOSAL_REJECTED"),
            Self::ProposalCancelled => write!(f, "PROPOSAL_CANCELLED"),
            Self::ProposalExpired => write!(f, "PROPOSAL_EXPIRED"),
            Self::SwapCompleted => write!(f, "SWAP_COMPLETED"),
        }
    }
}

/// A notification payload for one party of a proposal.
#[derive(Debug, Clone)]
pub struct SwapNotice {
    pub proposal: ProposalId,
    pub kind: NoticeKind,
}

/// Failure from the notification dispatcher.
#[derive(Debug, Error)]
#[error("notification dispatch error: {0}")]
pub struct NotifyError(pub String);

/// Fire-and-forget delivery of lifecycle notifications.
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, user: UserId, notice: &SwapNotice) -> std::result::Result<(), NotifyError>;
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

#[cfg(any(test, feature = "test-helpers"))]
mod doubles {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

    use chrono::Utc;

    use super::{
        NotificationDispatcher, NotifyError, OwnershipTransfer, SwapNotice, TransferError,
    };
    use crate::notary::{NotaryClient, NotaryError, NotaryReceipt, NotaryRecord};
    use stayswap_types::{Booking, LedgerRef, SwapProposal, UserId};

    /// Notary double: records submissions, optionally failing the first N
    /// (or everything after the first N) with a network error, otherwise
    /// confirming with sequential ids.
    #[derive(Default)]
    pub struct RecordingNotary {
        submissions: Mutex<Vec<NotaryRecord>>,
        confirmations: AtomicU64,
        failures_remaining: AtomicU32,
        successes_before_outage: Option<u64>,
    }

    impl RecordingNotary {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail the first `n` submissions before succeeding.
        #[must_use]
        pub fn failing_first(n: u32) -> Self {
            Self {
                failures_remaining: AtomicU32::new(n),
                ..Self::default()
            }
        }

        /// Succeed the first `n` submissions, then fail every later one —
        /// a ledger outage that starts mid-lifecycle.
        #[must_use]
        pub fn failing_after(n: u64) -> Self {
            Self {
                successes_before_outage: Some(n),
                ..Self::default()
            }
        }

        #[must_use]
        pub fn submission_count(&self) -> usize {
            self.submissions
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .len()
        }

        #[must_use]
        pub fn submissions(&self) -> Vec<NotaryRecord> {
            self.submissions
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone()
        }
    }

    impl NotaryClient for RecordingNotary {
        fn submit(&self, record: &NotaryRecord) -> Result<NotaryReceipt, NotaryError> {
            self.submissions
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(record.clone());
            let remaining = self.failures_remaining.load(Ordering::SeqCst);
            if remaining > 0 {
                if remaining != u32::MAX {
                    self.failures_remaining.fetch_sub(1, Ordering::SeqCst);
                }
                return Err(NotaryError::Network("ledger unreachable".to_string()));
            }
            if let Some(limit) = self.successes_before_outage {
                if self.confirmations.load(Ordering::SeqCst) >= limit {
                    return Err(NotaryError::Network("ledger unreachable".to_string()));
                }
            }
            let n = self.confirmations.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(NotaryReceipt {
                confirmation: LedgerRef::new(format!("conf-{n}")),
                timestamp: Utc::now(),
            })
        }
    }

    /// Transfer double: confirms instantly with sequential ids.
    #[derive(Default)]
    pub struct InstantTransfer {
        confirmations: AtomicU64,
    }

    impl InstantTransfer {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl OwnershipTransfer for InstantTransfer {
        fn transfer(
            &self,
            _proposal: &SwapProposal,
            _source: &Booking,
            _target: &Booking,
        ) -> Result<LedgerRef, TransferError> {
            let n = self.confirmations.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(LedgerRef::new(format!("xfer-{n}")))
        }
    }

    /// Transfer double that always fails.
    pub struct FailingTransfer;

    impl OwnershipTransfer for FailingTransfer {
        fn transfer(
            &self,
            _proposal: &SwapProposal,
            _source: &Booking,
            _target: &Booking,
        ) -> Result<LedgerRef, TransferError> {
            Err(TransferError("escrow service unavailable".to_string()))
        }
    }

    /// Dispatcher double: records every notice; optionally fails every
    /// dispatch so tests can prove notification failures never block.
    #[derive(Default)]
    pub struct RecordingDispatcher {
        notices: Mutex<Vec<(UserId, SwapNotice)>>,
        failing: bool,
    }

    impl RecordingDispatcher {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        #[must_use]
        pub fn failing() -> Self {
            Self {
                notices: Mutex::new(Vec::new()),
                failing: true,
            }
        }

        #[must_use]
        pub fn notices(&self) -> Vec<(UserId, SwapNotice)> {
            self.notices
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone()
        }
    }

    impl NotificationDispatcher for RecordingDispatcher {
        fn dispatch(&self, user: UserId, notice: &SwapNotice) -> Result<(), NotifyError> {
            self.notices
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push((user, notice.clone()));
            if self.failing {
                return Err(NotifyError("push gateway timeout".to_string()));
            }
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub use doubles::{FailingTransfer, InstantTransfer, RecordingDispatcher, RecordingNotary};
