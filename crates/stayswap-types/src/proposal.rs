//! # SwapProposal — the unit of negotiation
//!
//! A proposal links a source booking (the proposer's) to a target booking
//! (the respondent's) and carries the offered terms.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  accept   ┌──────────┐  transfer ok  ┌───────────┐
//!   │ PENDING ├──────────▶│ ACCEPTED ├──────────────▶│ COMPLETED │
//!   └─┬──┬──┬─┘           └────┬─────┘               └───────────┘
//!     │  │  │ expire           │ transfer failed
//!     │  │  ▼                  ▼
//!     │  │ ┌─────────┐    ┌──────────┐
//!     │  │ │ EXPIRED │    │ REJECTED │◀── reject
//!     │  │ └─────────┘    └──────────┘
//!     │  └──────────────────────┘
//!     │ cancel
//!     ▼
//!   ┌───────────┐
//!   │ CANCELLED │
//!   └───────────┘
//! ```
//!
//! Rejected, Cancelled, Expired, and Completed are terminal. Every
//! transition is recorded on the external notarization ledger; the
//! returned confirmation reference is stored per transition in
//! [`LedgerRefs`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BookingId, LedgerRef, ProposalId, UserId};

/// The lifecycle state of a swap proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Awaiting the respondent's decision.
    Pending,
    /// Respondent accepted; ownership transfer in flight.
    Accepted,
    /// Respondent declined, or an accepted swap's transfer failed.
    Rejected,
    /// Proposer withdrew while pending.
    Cancelled,
    /// The expiry timestamp passed before a decision.
    Expired,
    /// Ownership transfer confirmed; both bookings swapped.
    Completed,
}

impl ProposalStatus {
    /// Can this proposal transition to the given target status?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::Pending,
                Self::Accepted | Self::Rejected | Self::Cancelled | Self::Expired
            ) | (Self::Accepted, Self::Completed | Self::Rejected)
        )
    }

    /// Whether this status admits no further transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Rejected | Self::Cancelled | Self::Expired | Self::Completed
        )
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::Rejected => write!(f, "REJECTED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::Completed => write!(f, "COMPLETED"),
        }
    }
}

// ---------------------------------------------------------------------------
// ProposalKind
// ---------------------------------------------------------------------------

/// What is being offered, as a tagged variant.
///
/// Lifecycle code matches exhaustively on this, so adding a new proposal
/// kind is a compile-time-visible change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalKind {
    /// Straight booking-for-booking exchange.
    Exchange,
    /// Booking exchange sweetened with a cash top-up from the proposer.
    CashTopUp { amount: Decimal },
}

impl std::fmt::Display for ProposalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exchange => write!(f, "EXCHANGE"),
            Self::CashTopUp { amount } => write!(f, "CASH_TOP_UP({amount})"),
        }
    }
}

// ---------------------------------------------------------------------------
// ProposalTransition
// ---------------------------------------------------------------------------

/// The notarized lifecycle transitions. Each successful transition stores
/// the ledger confirmation reference under its own slot. Completion is
/// not a ledger transition: it is proven by the ownership-transfer
/// confirmation id instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalTransition {
    Created,
    Accepted,
    Rejected,
    Cancelled,
    Expired,
}

impl std::fmt::Display for ProposalTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::Rejected => write!(f, "REJECTED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// Per-transition ledger confirmation references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRefs {
    pub created: Option<LedgerRef>,
    pub accepted: Option<LedgerRef>,
    pub rejected: Option<LedgerRef>,
    pub cancelled: Option<LedgerRef>,
    pub expired: Option<LedgerRef>,
}

impl LedgerRefs {
    /// Store the confirmation for a transition, overwriting any prior value.
    pub fn record(&mut self, transition: ProposalTransition, reference: LedgerRef) {
        let slot = match transition {
            ProposalTransition::Created => &mut self.created,
            ProposalTransition::Accepted => &mut self.accepted,
            ProposalTransition::Rejected => &mut self.rejected,
            ProposalTransition::Cancelled => &mut self.cancelled,
            ProposalTransition::Expired => &mut self.expired,
        };
        *slot = Some(reference);
    }

    /// The confirmation recorded for a transition, if any.
    #[must_use]
    pub fn get(&self, transition: ProposalTransition) -> Option<&LedgerRef> {
        match transition {
            ProposalTransition::Created => self.created.as_ref(),
            ProposalTransition::Accepted => self.accepted.as_ref(),
            ProposalTransition::Rejected => self.rejected.as_ref(),
            ProposalTransition::Cancelled => self.cancelled.as_ref(),
            ProposalTransition::Expired => self.expired.as_ref(),
        }
    }
}

// ---------------------------------------------------------------------------
// SwapProposal
// ---------------------------------------------------------------------------

/// A negotiation instance between two bookings.
///
/// The respondent (target-side party) is **not stored** here: it is always
/// derived from the target booking's current owner at read time, so a
/// completed swap elsewhere can never leave a stale copy behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapProposal {
    pub id: ProposalId,
    /// The proposer's booking.
    pub source_booking: BookingId,
    /// The respondent's booking. `None` for an auction-style open listing
    /// until a target is chosen.
    pub target_booking: Option<BookingId>,
    pub proposer: UserId,
    pub kind: ProposalKind,
    /// Free-form conditions attached by the proposer.
    pub conditions: Option<String>,
    pub status: ProposalStatus,
    pub expires_at: DateTime<Utc>,
    /// Ledger confirmation per notarized transition.
    pub ledger: LedgerRefs,
    /// Confirmation id returned by the ownership transfer service.
    pub transfer_confirmation: Option<LedgerRef>,
    pub proposed_at: DateTime<Utc>,
    /// When the respondent (or the sweeper) resolved the proposal.
    pub responded_at: Option<DateTime<Utc>>,
}

impl SwapProposal {
    /// Whether the expiry timestamp has passed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// The cash top-up offered, if any.
    #[must_use]
    pub fn cash_top_up(&self) -> Option<Decimal> {
        match &self.kind {
            ProposalKind::Exchange => None,
            ProposalKind::CashTopUp { amount } => Some(*amount),
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl SwapProposal {
    /// Create a dummy pending proposal for unit tests.
    #[must_use]
    pub fn dummy(
        proposer: UserId,
        source_booking: BookingId,
        target_booking: BookingId,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ProposalId::new(),
            source_booking,
            target_booking: Some(target_booking),
            proposer,
            kind: ProposalKind::Exchange,
            conditions: None,
            status: ProposalStatus::Pending,
            expires_at,
            ledger: LedgerRefs::default(),
            transfer_confirmation: None,
            proposed_at: Utc::now(),
            responded_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_transitions_valid() {
        for target in [
            ProposalStatus::Accepted,
            ProposalStatus::Rejected,
            ProposalStatus::Cancelled,
            ProposalStatus::Expired,
        ] {
            assert!(ProposalStatus::Pending.can_transition_to(target));
        }
    }

    #[test]
    fn accepted_transitions() {
        assert!(ProposalStatus::Accepted.can_transition_to(ProposalStatus::Completed));
        assert!(ProposalStatus::Accepted.can_transition_to(ProposalStatus::Rejected));
        assert!(!ProposalStatus::Accepted.can_transition_to(ProposalStatus::Pending));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for terminal in [
            ProposalStatus::Rejected,
            ProposalStatus::Cancelled,
            ProposalStatus::Expired,
            ProposalStatus::Completed,
        ] {
            assert!(terminal.is_terminal());
            for target in [
                ProposalStatus::Pending,
                ProposalStatus::Accepted,
                ProposalStatus::Completed,
            ] {
                assert!(!terminal.can_transition_to(target));
            }
        }
    }

    #[test]
    fn ledger_refs_record_and_get() {
        let mut refs = LedgerRefs::default();
        assert!(refs.get(ProposalTransition::Created).is_none());
        refs.record(ProposalTransition::Created, LedgerRef::new("conf-1"));
        assert_eq!(
            refs.get(ProposalTransition::Created).map(LedgerRef::as_str),
            Some("conf-1")
        );
        assert!(refs.get(ProposalTransition::Accepted).is_none());
    }

    #[test]
    fn cash_top_up_extraction() {
        let mut p = SwapProposal::dummy(
            UserId::new(),
            BookingId::new(),
            BookingId::new(),
            Utc::now() + chrono::Duration::hours(1),
        );
        assert_eq!(p.cash_top_up(), None);
        p.kind = ProposalKind::CashTopUp {
            amount: Decimal::new(150, 0),
        };
        assert_eq!(p.cash_top_up(), Some(Decimal::new(150, 0)));
    }

    #[test]
    fn expiry_check() {
        let p = SwapProposal::dummy(
            UserId::new(),
            BookingId::new(),
            BookingId::new(),
            Utc::now() + chrono::Duration::hours(1),
        );
        assert!(!p.is_expired_at(Utc::now()));
        assert!(p.is_expired_at(Utc::now() + chrono::Duration::hours(2)));
    }

    #[test]
    fn serde_roundtrip() {
        let p = SwapProposal::dummy(
            UserId::new(),
            BookingId::new(),
            BookingId::new(),
            Utc::now() + chrono::Duration::hours(1),
        );
        let json = serde_json::to_string(&p).unwrap();
        let back: SwapProposal = serde_json::from_str(&json).unwrap();
        assert_eq!(p.id, back.id);
        assert_eq!(p.status, back.status);
        assert_eq!(p.kind, back.kind);
    }
}
