//! Proposal lifecycle manager — owner of the state machine.
//!
//! Every transition follows the same discipline:
//! 1. authorize against the **derived** respondent/proposer
//! 2. check-and-set the status (the single-winner decision for racing
//!    accept / cancel / expire calls)
//! 3. notarize the transition with bounded retry
//! 4. on retry exhaustion, revert the check-and-set (compensating
//!    rollback) and surface one failure with the cause attached
//! 5. attach the ledger confirmation, mirror the targeting link, release
//!    locks, notify the counterparty
//!
//! Success is never reported while the ledger record is unconfirmed.

use std::sync::Arc;

use chrono::Utc;

use stayswap_intake::{
    BookingDirectory, EligibilityValidator, LockManager, ProposalBook, TargetingIndex,
    WeightedScorer,
};
use stayswap_types::{
    Booking, BookingId, BookingStatus, EngineConfig, LedgerRefs, LinkStatus, ProposalId,
    ProposalKind, ProposalStatus, ProposalTransition, Result, SwapError, SwapProposal,
    TargetingLink, UserId,
};

use crate::external::{NoticeKind, NotificationDispatcher, OwnershipTransfer, SwapNotice};
use crate::notary::{NotaryClient, NotaryGateway, NotaryRecord};

/// Input for proposal creation.
#[derive(Debug, Clone)]
pub struct ProposalRequest {
    pub proposer: UserId,
    pub source_booking: BookingId,
    /// `None` opens an auction-style listing: no target, no locks, until
    /// a target is chosen.
    pub target_booking: Option<BookingId>,
    pub kind: ProposalKind,
    pub conditions: Option<String>,
    pub expires_at: chrono::DateTime<Utc>,
}

/// How a pending proposal is being resolved. Expiry runs the cancel
/// machinery with its own cause tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Reject,
    Cancel,
    Expire,
}

impl Resolution {
    fn next_status(self) -> ProposalStatus {
        match self {
            Self::Reject => ProposalStatus::Rejected,
            Self::Cancel => ProposalStatus::Cancelled,
            Self::Expire => ProposalStatus::Expired,
        }
    }

    fn transition(self) -> ProposalTransition {
        match self {
            Self::Reject => ProposalTransition::Rejected,
            Self::Cancel => ProposalTransition::Cancelled,
            Self::Expire => ProposalTransition::Expired,
        }
    }

    fn link_status(self) -> LinkStatus {
        match self {
            Self::Reject => LinkStatus::Rejected,
            Self::Cancel | Self::Expire => LinkStatus::Cancelled,
        }
    }
}

/// Drives proposals through creation, acceptance, rejection,
/// cancellation, expiry, and completion.
pub struct LifecycleManager {
    directory: Arc<BookingDirectory>,
    proposals: Arc<ProposalBook>,
    targeting: Arc<TargetingIndex>,
    locks: LockManager,
    validator: EligibilityValidator,
    notary: NotaryGateway,
    transfer: Arc<dyn OwnershipTransfer>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl LifecycleManager {
    #[must_use]
    pub fn new(
        directory: Arc<BookingDirectory>,
        proposals: Arc<ProposalBook>,
        targeting: Arc<TargetingIndex>,
        notary_client: Arc<dyn NotaryClient>,
        transfer: Arc<dyn OwnershipTransfer>,
        notifier: Arc<dyn NotificationDispatcher>,
        config: &EngineConfig,
    ) -> Self {
        let locks = LockManager::new(Arc::clone(&directory));
        let validator = EligibilityValidator::new(
            Arc::clone(&directory),
            Arc::clone(&proposals),
            Arc::new(WeightedScorer::new(config.weights)),
            config.compatibility_threshold,
        );
        Self {
            directory,
            proposals,
            targeting,
            locks,
            validator,
            notary: NotaryGateway::new(notary_client, config.notary_retry),
            transfer,
            notifier,
        }
    }

    /// The eligibility validator, for read-side pre-checks.
    #[must_use]
    pub fn validator(&self) -> &EligibilityValidator {
        &self.validator
    }

    // -----------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------

    /// Create a proposal.
    ///
    /// With a target: validate eligibility, lock source then target
    /// (rolling back the first lock on partial failure), persist the
    /// pending row, notarize the creation. If notarization exhausts its
    /// retries the row is removed and both bookings unlocked — the whole
    /// operation fails atomically from the caller's perspective.
    ///
    /// Without a target (open listing): source-side checks only, no locks
    /// until [`Self::choose_target`].
    pub fn create(&self, request: ProposalRequest) -> Result<SwapProposal> {
        let now = Utc::now();
        if request.expires_at <= now {
            return Err(SwapError::ExpiryNotInFuture {
                expires_at: request.expires_at,
            });
        }

        match request.target_booking {
            Some(target) => {
                self.validator
                    .validate(request.proposer, request.source_booking, target)
                    .into_result()?;
                self.locks
                    .lock_pair(request.source_booking, target, request.proposer)?;
            }
            None => {
                let source = self.directory.get(request.source_booking)?;
                if source.owner != request.proposer {
                    return Err(SwapError::NotBookingOwner {
                        user: request.proposer,
                        booking: request.source_booking,
                    });
                }
                if !source.is_open() {
                    return Err(SwapError::BookingNotOpen {
                        booking: request.source_booking,
                        status: source.status,
                    });
                }
            }
        }

        let proposal = SwapProposal {
            id: ProposalId::new(),
            source_booking: request.source_booking,
            target_booking: request.target_booking,
            proposer: request.proposer,
            kind: request.kind,
            conditions: request.conditions,
            status: ProposalStatus::Pending,
            expires_at: request.expires_at,
            ledger: LedgerRefs::default(),
            transfer_confirmation: None,
            proposed_at: now,
            responded_at: None,
        };

        if let Err(err) = self.proposals.insert_pending(proposal.clone()) {
            // A duplicate slipped in between validation and insert.
            if request.target_booking.is_some() {
                self.release_quietly(&proposal);
            }
            return Err(err);
        }

        let record = NotaryRecord::for_transition(&proposal, ProposalTransition::Created);
        match self.notary.submit(&record) {
            Ok(receipt) => {
                let stored = self.proposals.record_ledger_ref(
                    proposal.id,
                    ProposalTransition::Created,
                    receipt.confirmation,
                )?;
                if let Some(target) = stored.target_booking {
                    self.targeting.upsert(TargetingLink::new(
                        stored.id,
                        stored.source_booking,
                        target,
                    ));
                    self.notify_owner_of(target, NoticeKind::ProposalReceived, stored.id);
                }
                tracing::info!(
                    proposal = %stored.id,
                    source = %stored.source_booking,
                    kind = %stored.kind,
                    "swap proposal created"
                );
                Ok(stored)
            }
            Err(err) => {
                // Unwind: no half-created proposal survives.
                if let Err(remove_err) = self.proposals.remove(proposal.id) {
                    tracing::warn!(
                        proposal = %proposal.id,
                        error = %remove_err,
                        "failed to remove proposal during creation rollback"
                    );
                }
                if proposal.target_booking.is_some() {
                    self.release_quietly(&proposal);
                }
                Err(err)
            }
        }
    }

    /// Choose the target of an open listing. Proposer only, while
    /// pending; runs full eligibility against the target and acquires
    /// both locks (with the same partial-failure rollback as create).
    pub fn choose_target(
        &self,
        proposal_id: ProposalId,
        target: BookingId,
        caller: UserId,
    ) -> Result<SwapProposal> {
        let proposal = self.proposals.get(proposal_id)?;
        if proposal.proposer != caller {
            return Err(SwapError::NotProposer {
                user: caller,
                proposal: proposal_id,
            });
        }
        if proposal.status != ProposalStatus::Pending {
            return Err(SwapError::ProposalNotPending {
                proposal: proposal_id,
                status: proposal.status,
            });
        }
        if proposal.is_expired_at(Utc::now()) {
            return Err(SwapError::ProposalExpired {
                proposal: proposal_id,
                expired_at: proposal.expires_at,
            });
        }
        if proposal.target_booking.is_some() {
            return Err(SwapError::TargetAlreadyChosen(proposal_id));
        }

        self.validator
            .validate(caller, proposal.source_booking, target)
            .into_result()?;
        self.locks
            .lock_pair(proposal.source_booking, target, caller)?;

        match self.proposals.set_target(proposal_id, target) {
            Ok(updated) => {
                self.targeting.upsert(TargetingLink::new(
                    updated.id,
                    updated.source_booking,
                    target,
                ));
                self.notify_owner_of(target, NoticeKind::ProposalReceived, updated.id);
                Ok(updated)
            }
            Err(err) => {
                if let Err(release_err) = self
                    .locks
                    .release_pair(proposal.source_booking, Some(target))
                {
                    tracing::warn!(
                        proposal = %proposal_id,
                        error = %release_err,
                        "failed to release locks after target-selection rollback"
                    );
                }
                Err(err)
            }
        }
    }

    // -----------------------------------------------------------------
    // Accept (and completion)
    // -----------------------------------------------------------------

    /// Accept a proposal. Respondent only; expiry is re-checked here, not
    /// just at sweep time. On success the ownership transfer runs, its
    /// confirmation id is recorded, and the proposal completes; a
    /// transfer failure rolls the proposal back to its rejected
    /// equivalent and unlocks both bookings.
    pub fn accept(&self, proposal_id: ProposalId, caller: UserId) -> Result<SwapProposal> {
        let now = Utc::now();
        let proposal = self.proposals.get(proposal_id)?;
        let target = proposal
            .target_booking
            .ok_or(SwapError::NoTargetChosen(proposal_id))?;

        let respondent = self.directory.owner_of(target)?;
        if caller != respondent {
            return Err(SwapError::NotRespondent {
                user: caller,
                proposal: proposal_id,
            });
        }
        if proposal.status != ProposalStatus::Pending {
            return Err(SwapError::ProposalNotPending {
                proposal: proposal_id,
                status: proposal.status,
            });
        }
        if proposal.is_expired_at(now) {
            return Err(SwapError::ProposalExpired {
                proposal: proposal_id,
                expired_at: proposal.expires_at,
            });
        }

        // Single-winner decision against racing cancel / expire.
        let accepted = self.proposals.compare_and_set_status(
            proposal_id,
            ProposalStatus::Pending,
            ProposalStatus::Accepted,
            Some(now),
        )?;

        let record = NotaryRecord::for_transition(&accepted, ProposalTransition::Accepted);
        let receipt = match self.notary.submit(&record) {
            Ok(receipt) => receipt,
            Err(err) => {
                self.revert_status(proposal_id, ProposalStatus::Accepted, ProposalStatus::Pending);
                return Err(err);
            }
        };
        self.proposals.record_ledger_ref(
            proposal_id,
            ProposalTransition::Accepted,
            receipt.confirmation,
        )?;
        self.targeting
            .set_status_for_proposal(proposal_id, LinkStatus::Accepted);
        self.notify(proposal.proposer, NoticeKind::ProposalAccepted, proposal_id);

        self.complete(&accepted, respondent)
    }

    /// Completion side effects: delegate the asset handover, record its
    /// confirmation, move both bookings to `Swapped`, exchange owners.
    fn complete(&self, accepted: &SwapProposal, respondent: UserId) -> Result<SwapProposal> {
        let source = accepted.source_booking;
        let target = accepted
            .target_booking
            .ok_or(SwapError::NoTargetChosen(accepted.id))?;
        let source_booking = self.directory.get(source)?;
        let target_booking = self.directory.get(target)?;

        match self.transfer.transfer(accepted, &source_booking, &target_booking) {
            Ok(confirmation) => {
                self.proposals
                    .record_transfer_confirmation(accepted.id, confirmation)?;
                self.directory.compare_and_set_status(
                    source,
                    BookingStatus::Locked,
                    BookingStatus::Swapped,
                )?;
                self.directory.compare_and_set_status(
                    target,
                    BookingStatus::Locked,
                    BookingStatus::Swapped,
                )?;
                self.directory.swap_owners(source, target)?;
                let completed = self.proposals.compare_and_set_status(
                    accepted.id,
                    ProposalStatus::Accepted,
                    ProposalStatus::Completed,
                    None,
                )?;
                self.notify(completed.proposer, NoticeKind::SwapCompleted, completed.id);
                self.notify(respondent, NoticeKind::SwapCompleted, completed.id);
                tracing::info!(proposal = %completed.id, "swap completed");
                Ok(completed)
            }
            Err(err) => {
                tracing::warn!(
                    proposal = %accepted.id,
                    error = %err,
                    "ownership transfer failed; rolling back to rejected"
                );
                self.revert_status(
                    accepted.id,
                    ProposalStatus::Accepted,
                    ProposalStatus::Rejected,
                );
                self.targeting
                    .set_status_for_proposal(accepted.id, LinkStatus::Rejected);
                if let Err(release_err) = self.locks.release_pair(source, Some(target)) {
                    tracing::warn!(
                        proposal = %accepted.id,
                        error = %release_err,
                        "failed to release locks after transfer rollback"
                    );
                }
                self.notify(accepted.proposer, NoticeKind::ProposalRejected, accepted.id);
                Err(SwapError::TransferFailed {
                    cause: err.to_string(),
                })
            }
        }
    }

    // -----------------------------------------------------------------
    // Reject / Cancel / Expire
    // -----------------------------------------------------------------

    /// Reject a pending proposal. Respondent only.
    pub fn reject(&self, proposal_id: ProposalId, caller: UserId) -> Result<SwapProposal> {
        self.resolve(proposal_id, Some(caller), Resolution::Reject)
    }

    /// Cancel a pending proposal. Proposer only.
    pub fn cancel(&self, proposal_id: ProposalId, caller: UserId) -> Result<SwapProposal> {
        self.resolve(proposal_id, Some(caller), Resolution::Cancel)
    }

    /// Expire a lapsed pending proposal (sweeper-driven; no caller).
    pub(crate) fn expire(&self, proposal_id: ProposalId) -> Result<SwapProposal> {
        self.resolve(proposal_id, None, Resolution::Expire)
    }

    /// Shared resolution path for reject / cancel / expire: authorize,
    /// check-and-set, notarize (revert on exhaustion), mirror the link,
    /// unlock both bookings, notify.
    fn resolve(
        &self,
        proposal_id: ProposalId,
        caller: Option<UserId>,
        resolution: Resolution,
    ) -> Result<SwapProposal> {
        let now = Utc::now();
        let proposal = self.proposals.get(proposal_id)?;

        match resolution {
            Resolution::Reject => {
                let target = proposal
                    .target_booking
                    .ok_or(SwapError::NoTargetChosen(proposal_id))?;
                let respondent = self.directory.owner_of(target)?;
                if caller != Some(respondent) {
                    return Err(SwapError::NotRespondent {
                        user: caller.unwrap_or(respondent),
                        proposal: proposal_id,
                    });
                }
            }
            Resolution::Cancel => {
                if caller != Some(proposal.proposer) {
                    return Err(SwapError::NotProposer {
                        user: caller.unwrap_or(proposal.proposer),
                        proposal: proposal_id,
                    });
                }
            }
            Resolution::Expire => {}
        }

        if proposal.status != ProposalStatus::Pending {
            return Err(SwapError::ProposalNotPending {
                proposal: proposal_id,
                status: proposal.status,
            });
        }

        let next = resolution.next_status();
        let resolved =
            self.proposals
                .compare_and_set_status(proposal_id, ProposalStatus::Pending, next, Some(now))?;

        let transition = resolution.transition();
        let record = NotaryRecord::for_transition(&resolved, transition);
        let receipt = match self.notary.submit(&record) {
            Ok(receipt) => receipt,
            Err(err) => {
                self.revert_status(proposal_id, next, ProposalStatus::Pending);
                return Err(err);
            }
        };
        self.proposals
            .record_ledger_ref(proposal_id, transition, receipt.confirmation)?;
        self.targeting
            .set_status_for_proposal(proposal_id, resolution.link_status());

        // Unlock both sides. Idempotent, so an open listing (never
        // locked) and cleanup retries are both no-ops.
        self.locks
            .release_pair(resolved.source_booking, resolved.target_booking)?;

        match resolution {
            Resolution::Reject => {
                self.notify(resolved.proposer, NoticeKind::ProposalRejected, proposal_id);
            }
            Resolution::Cancel => {
                if let Some(target) = resolved.target_booking {
                    self.notify_owner_of(target, NoticeKind::ProposalCancelled, proposal_id);
                }
            }
            Resolution::Expire => {
                self.notify(resolved.proposer, NoticeKind::ProposalExpired, proposal_id);
                if let Some(target) = resolved.target_booking {
                    self.notify_owner_of(target, NoticeKind::ProposalExpired, proposal_id);
                }
            }
        }

        tracing::info!(proposal = %proposal_id, status = %next, "proposal resolved");
        self.proposals.get(proposal_id)
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    /// Compensating status rollback. A failure here is logged, not
    /// propagated: the original error is the one the caller must see.
    fn revert_status(&self, proposal_id: ProposalId, from: ProposalStatus, to: ProposalStatus) {
        if let Err(err) = self
            .proposals
            .compare_and_set_status(proposal_id, from, to, None)
        {
            tracing::warn!(
                proposal = %proposal_id,
                error = %err,
                "failed to revert proposal status during rollback"
            );
        }
    }

    /// Release both locks of a failed creation, logging failures.
    fn release_quietly(&self, proposal: &SwapProposal) {
        if let Err(err) = self
            .locks
            .release_pair(proposal.source_booking, proposal.target_booking)
        {
            tracing::warn!(
                proposal = %proposal.id,
                error = %err,
                "failed to release locks during creation rollback"
            );
        }
    }

    /// Fire-and-forget notification: failures are logged, never block.
    fn notify(&self, user: UserId, kind: NoticeKind, proposal: ProposalId) {
        let notice = SwapNotice { proposal, kind };
        if let Err(err) = self.notifier.dispatch(user, &notice) {
            tracing::warn!(user = %user, kind = %kind, error = %err, "notification dispatch failed");
        }
    }

    /// Notify the current (derived) owner of a booking.
    fn notify_owner_of(&self, booking: BookingId, kind: NoticeKind, proposal: ProposalId) {
        match self.directory.owner_of(booking) {
            Ok(owner) => self.notify(owner, kind, proposal),
            Err(err) => {
                tracing::warn!(%booking, error = %err, "could not derive owner for notification");
            }
        }
    }

    /// Current booking row (read-through for tests and read-side callers).
    pub fn booking(&self, id: BookingId) -> Result<Booking> {
        self.directory.get(id)
    }

    /// Current proposal row.
    pub fn proposal(&self, id: ProposalId) -> Result<SwapProposal> {
        self.proposals.get(id)
    }
}
