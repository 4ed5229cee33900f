//! In-memory conditional-update stores.
//!
//! The engine assumes a multi-writer environment: multiple service
//! instances race over the same booking and proposal rows, and the
//! datastore's *conditional* update is the actual exclusion mechanism.
//! These stores reproduce that contract in memory: every mutation runs
//! under one guard and checks its precondition atomically with the write,
//! so exactly one of two racing check-and-set calls succeeds.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use stayswap_types::{
    Booking, BookingId, BookingStatus, LedgerRef, ProposalId, ProposalStatus, ProposalTransition,
    Result, SwapError, SwapProposal, UserId,
};

/// Recover the guard even if a previous holder panicked: the maps stay
/// structurally sound because every mutation is a single write.
fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// BookingDirectory
// ---------------------------------------------------------------------------

/// Source of truth for booking rows.
///
/// Status changes go through [`Self::compare_and_set_status`] only; the
/// lock manager and swap completion are the sole callers.
#[derive(Default)]
pub struct BookingDirectory {
    bookings: Mutex<HashMap<BookingId, Booking>>,
}

impl BookingDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a booking (listing creation).
    pub fn insert(&self, booking: Booking) {
        guard(&self.bookings).insert(booking.id, booking);
    }

    /// Fetch a booking by id.
    pub fn get(&self, id: BookingId) -> Result<Booking> {
        guard(&self.bookings)
            .get(&id)
            .cloned()
            .ok_or(SwapError::BookingNotFound(id))
    }

    /// Atomically flip the status from `expected` to `next`.
    ///
    /// The precondition check and the write happen under one guard; a
    /// caller that lost a race sees [`SwapError::BookingStatusConflict`]
    /// with the status that actually held.
    pub fn compare_and_set_status(
        &self,
        id: BookingId,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Booking> {
        debug_assert!(
            expected.can_transition_to(next),
            "illegal booking transition {expected} -> {next}"
        );
        let mut bookings = guard(&self.bookings);
        let booking = bookings
            .get_mut(&id)
            .ok_or(SwapError::BookingNotFound(id))?;
        if booking.status != expected {
            return Err(SwapError::BookingStatusConflict {
                booking: id,
                expected,
                actual: booking.status,
            });
        }
        booking.status = next;
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }

    /// Exchange the owners of two bookings (swap completion).
    pub fn swap_owners(&self, a: BookingId, b: BookingId) -> Result<()> {
        let mut bookings = guard(&self.bookings);
        let owner_a = bookings
            .get(&a)
            .ok_or(SwapError::BookingNotFound(a))?
            .owner;
        let owner_b = bookings
            .get(&b)
            .ok_or(SwapError::BookingNotFound(b))?
            .owner;
        let now = Utc::now();
        if let Some(booking) = bookings.get_mut(&a) {
            booking.owner = owner_b;
            booking.updated_at = now;
        }
        if let Some(booking) = bookings.get_mut(&b) {
            booking.owner = owner_a;
            booking.updated_at = now;
        }
        Ok(())
    }

    /// The current owner of a booking — the derived-owner lookup every
    /// authorization check uses instead of a stored copy.
    pub fn owner_of(&self, id: BookingId) -> Result<UserId> {
        self.get(id).map(|b| b.owner)
    }

    /// All bookings currently open for proposals.
    #[must_use]
    pub fn open_bookings(&self) -> Vec<Booking> {
        guard(&self.bookings)
            .values()
            .filter(|b| b.is_open())
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// ProposalBook
// ---------------------------------------------------------------------------

/// Source of truth for proposal rows.
///
/// Upholds the pair-uniqueness invariant (at most one non-terminal
/// proposal per ordered (source, target) pair) inside the insert guard,
/// and offers check-and-set status transitions so racing accept / cancel /
/// expire calls get exactly one winner.
#[derive(Default)]
pub struct ProposalBook {
    proposals: Mutex<HashMap<ProposalId, SwapProposal>>,
}

impl ProposalBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new pending proposal, enforcing pair uniqueness atomically.
    pub fn insert_pending(&self, proposal: SwapProposal) -> Result<()> {
        debug_assert!(proposal.status == ProposalStatus::Pending);
        let mut proposals = guard(&self.proposals);
        if let Some(target) = proposal.target_booking {
            let duplicate = proposals.values().any(|p| {
                !p.status.is_terminal()
                    && p.source_booking == proposal.source_booking
                    && p.target_booking == Some(target)
            });
            if duplicate {
                return Err(SwapError::DuplicateProposal {
                    source_booking: proposal.source_booking,
                    target,
                });
            }
        }
        proposals.insert(proposal.id, proposal);
        Ok(())
    }

    /// Fetch a proposal by id.
    pub fn get(&self, id: ProposalId) -> Result<SwapProposal> {
        guard(&self.proposals)
            .get(&id)
            .cloned()
            .ok_or(SwapError::ProposalNotFound(id))
    }

    /// Remove a proposal row (creation rollback only).
    pub fn remove(&self, id: ProposalId) -> Result<SwapProposal> {
        guard(&self.proposals)
            .remove(&id)
            .ok_or(SwapError::ProposalNotFound(id))
    }

    /// Atomically transition `expected` -> `next`. The single-winner
    /// guarantee for racing transitions lives here.
    pub fn compare_and_set_status(
        &self,
        id: ProposalId,
        expected: ProposalStatus,
        next: ProposalStatus,
        responded_at: Option<DateTime<Utc>>,
    ) -> Result<SwapProposal> {
        let mut proposals = guard(&self.proposals);
        let proposal = proposals
            .get_mut(&id)
            .ok_or(SwapError::ProposalNotFound(id))?;
        if proposal.status != expected {
            return Err(SwapError::ProposalStatusConflict {
                proposal: id,
                expected,
                actual: proposal.status,
            });
        }
        proposal.status = next;
        if responded_at.is_some() {
            proposal.responded_at = responded_at;
        }
        Ok(proposal.clone())
    }

    /// Attach the ledger confirmation for a transition.
    pub fn record_ledger_ref(
        &self,
        id: ProposalId,
        transition: ProposalTransition,
        reference: LedgerRef,
    ) -> Result<SwapProposal> {
        let mut proposals = guard(&self.proposals);
        let proposal = proposals
            .get_mut(&id)
            .ok_or(SwapError::ProposalNotFound(id))?;
        proposal.ledger.record(transition, reference);
        Ok(proposal.clone())
    }

    /// Attach the ownership-transfer confirmation id.
    pub fn record_transfer_confirmation(
        &self,
        id: ProposalId,
        reference: LedgerRef,
    ) -> Result<SwapProposal> {
        let mut proposals = guard(&self.proposals);
        let proposal = proposals
            .get_mut(&id)
            .ok_or(SwapError::ProposalNotFound(id))?;
        proposal.transfer_confirmation = Some(reference);
        Ok(proposal.clone())
    }

    /// Choose the target booking of an open (auction-style) listing,
    /// enforcing pair uniqueness atomically with the write.
    pub fn set_target(&self, id: ProposalId, target: BookingId) -> Result<SwapProposal> {
        let mut proposals = guard(&self.proposals);
        let source = proposals
            .get(&id)
            .ok_or(SwapError::ProposalNotFound(id))?
            .source_booking;
        let duplicate = proposals.values().any(|p| {
            p.id != id
                && !p.status.is_terminal()
                && p.source_booking == source
                && p.target_booking == Some(target)
        });
        if duplicate {
            return Err(SwapError::DuplicateProposal { source_booking: source, target });
        }
        let proposal = proposals
            .get_mut(&id)
            .ok_or(SwapError::ProposalNotFound(id))?;
        proposal.target_booking = Some(target);
        Ok(proposal.clone())
    }

    /// The open (non-terminal) proposal linking an ordered pair, if any.
    #[must_use]
    pub fn open_between(&self, source: BookingId, target: BookingId) -> Option<ProposalId> {
        guard(&self.proposals)
            .values()
            .find(|p| {
                !p.status.is_terminal()
                    && p.source_booking == source
                    && p.target_booking == Some(target)
            })
            .map(|p| p.id)
    }

    /// All pending proposals whose expiry has passed at `now`.
    #[must_use]
    pub fn expired_pending(&self, now: DateTime<Utc>) -> Vec<SwapProposal> {
        guard(&self.proposals)
            .values()
            .filter(|p| p.status == ProposalStatus::Pending && p.is_expired_at(now))
            .cloned()
            .collect()
    }
}
