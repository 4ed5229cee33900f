//! Error types for the StaySwap engine.
//!
//! All errors use the `SS_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Eligibility / validation errors (never retried, surfaced verbatim)
//! - 2xx: Concurrency conflicts (lock lost, check-and-set lost — retryable by the caller)
//! - 3xx: Proposal lifecycle errors
//! - 4xx: External-dependency failures (retried internally, then surfaced once)
//! - 9xx: General / internal errors

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{BookingId, BookingStatus, ProposalId, ProposalStatus, UserId};

/// Central error enum for all StaySwap operations.
#[derive(Debug, Error)]
pub enum SwapError {
    // =================================================================
    // Eligibility / Validation Errors (1xx)
    // =================================================================
    /// The requested booking was not found.
    #[error("SS_ERR_100: Booking not found: {0}")]
    BookingNotFound(BookingId),

    /// The caller does not own the booking they are acting on.
    #[error("SS_ERR_101: User {user} does not own booking {booking}")]
    NotBookingOwner { user: UserId, booking: BookingId },

    /// The booking is not open for swapping.
    #[error("SS_ERR_102: Booking {booking} is not open for swapping (status: {status})")]
    BookingNotOpen {
        booking: BookingId,
        status: BookingStatus,
    },

    /// The caller attempted to propose against their own booking.
    #[error("SS_ERR_103: Cannot propose a swap against your own booking")]
    SelfSwapBlocked,

    /// An open proposal already links these two bookings.
    #[error("SS_ERR_104: A proposal already exists between bookings {source_booking} and {target}")]
    DuplicateProposal {
        source_booking: BookingId,
        target: BookingId,
    },

    /// The requested expiry timestamp is not strictly in the future.
    #[error("SS_ERR_105: Proposal expiry must be in the future (got {expires_at})")]
    ExpiryNotInFuture { expires_at: DateTime<Utc> },

    // =================================================================
    // Concurrency Conflicts (2xx)
    // =================================================================
    /// A lock attempt lost the race: the booking is already locked (or
    /// otherwise not available). Deterministic failure, never blocks.
    #[error("SS_ERR_200: Booking {booking} is not available for locking (status: {status})")]
    BookingUnavailable {
        booking: BookingId,
        status: BookingStatus,
    },

    /// A proposal check-and-set lost the race: the status precondition no
    /// longer held when the update ran.
    #[error(
        "SS_ERR_201: Proposal {proposal} status conflict: expected {expected}, found {actual}"
    )]
    ProposalStatusConflict {
        proposal: ProposalId,
        expected: ProposalStatus,
        actual: ProposalStatus,
    },

    /// A booking status update failed its precondition (e.g. unlocking a
    /// booking that has already been swapped away).
    #[error(
        "SS_ERR_202: Booking {booking} status conflict: expected {expected}, found {actual}"
    )]
    BookingStatusConflict {
        booking: BookingId,
        expected: BookingStatus,
        actual: BookingStatus,
    },

    // =================================================================
    // Proposal Lifecycle Errors (3xx)
    // =================================================================
    /// The requested proposal was not found.
    #[error("SS_ERR_300: Proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    /// The proposal is not pending, so the requested transition is invalid.
    #[error("SS_ERR_301: Proposal {proposal} is not pending (status: {status})")]
    ProposalNotPending {
        proposal: ProposalId,
        status: ProposalStatus,
    },

    /// The proposal's expiry timestamp has passed.
    #[error("SS_ERR_302: Proposal {proposal} expired at {expired_at}")]
    ProposalExpired {
        proposal: ProposalId,
        expired_at: DateTime<Utc>,
    },

    /// Only the target booking's current owner may accept or reject.
    #[error("SS_ERR_303: User {user} is not the respondent for proposal {proposal}")]
    NotRespondent { user: UserId, proposal: ProposalId },

    /// Only the original proposer may cancel.
    #[error("SS_ERR_304: User {user} is not the proposer of proposal {proposal}")]
    NotProposer { user: UserId, proposal: ProposalId },

    /// The proposal has no target booking yet (open listing), so the
    /// requested operation cannot run.
    #[error("SS_ERR_305: Proposal {0} has no target booking chosen")]
    NoTargetChosen(ProposalId),

    /// The proposal already has a target booking; open-listing targeting
    /// applies only once.
    #[error("SS_ERR_306: Proposal {0} already has a target booking")]
    TargetAlreadyChosen(ProposalId),

    // =================================================================
    // External-Dependency Failures (4xx)
    // =================================================================
    /// The notarization ledger rejected or failed the record after all
    /// retries; any guarded local state has been rolled back.
    #[error("SS_ERR_400: Notarization failed after {attempts} attempts: {cause}")]
    NotarizationFailed { attempts: u32, cause: String },

    /// The ownership transfer service failed; the proposal has been rolled
    /// back to its rejected-equivalent state.
    #[error("SS_ERR_401: Ownership transfer failed: {cause}")]
    TransferFailed { cause: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("SS_ERR_900: Internal error: {0}")]
    Internal(String),
}

impl SwapError {
    /// Whether this error is a concurrency conflict (2xx) — the caller may
    /// retry the whole operation, unlike validation errors.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::BookingUnavailable { .. }
                | Self::ProposalStatusConflict { .. }
                | Self::BookingStatusConflict { .. }
        )
    }

    /// Whether this error is a structural validation failure (1xx).
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::BookingNotFound(_)
                | Self::NotBookingOwner { .. }
                | Self::BookingNotOpen { .. }
                | Self::SelfSwapBlocked
                | Self::DuplicateProposal { .. }
                | Self::ExpiryNotInFuture { .. }
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SwapError>;
