//! Asset lock manager — mutual exclusion on bookings.
//!
//! A booking is held by at most one in-flight proposal. Locking an
//! already-locked booking fails deterministically rather than blocking;
//! the exclusion mechanism is the directory's conditional update, not an
//! in-process mutex, so it holds across service instances.

use std::sync::Arc;

use stayswap_types::{Booking, BookingId, BookingStatus, Result, SwapError, UserId};

use crate::store::BookingDirectory;

/// Acquires and releases booking locks against the directory.
pub struct LockManager {
    directory: Arc<BookingDirectory>,
}

impl LockManager {
    #[must_use]
    pub fn new(directory: Arc<BookingDirectory>) -> Self {
        Self { directory }
    }

    /// Lock a booking for a proposal.
    ///
    /// # Errors
    /// Returns [`SwapError::BookingUnavailable`] if the booking is already
    /// locked or swapped — a deterministic failure, never a wait.
    pub fn lock(&self, booking: BookingId, by: UserId) -> Result<Booking> {
        match self.directory.compare_and_set_status(
            booking,
            BookingStatus::Available,
            BookingStatus::Locked,
        ) {
            Ok(locked) => {
                tracing::debug!(%booking, user = %by, "booking locked");
                Ok(locked)
            }
            Err(SwapError::BookingStatusConflict { actual, .. }) => {
                Err(SwapError::BookingUnavailable {
                    booking,
                    status: actual,
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Release a booking lock. Idempotent: unlocking an already-available
    /// booking is a no-op success, so cleanup paths can retry freely.
    ///
    /// # Errors
    /// Returns [`SwapError::BookingStatusConflict`] if the booking has
    /// already been swapped away.
    pub fn unlock(&self, booking: BookingId) -> Result<Booking> {
        let current = self.directory.get(booking)?;
        match current.status {
            BookingStatus::Available => Ok(current),
            BookingStatus::Locked => {
                match self.directory.compare_and_set_status(
                    booking,
                    BookingStatus::Locked,
                    BookingStatus::Available,
                ) {
                    Ok(released) => Ok(released),
                    // Lost a race against another cleanup that already
                    // released it — still an idempotent success.
                    Err(SwapError::BookingStatusConflict {
                        actual: BookingStatus::Available,
                        ..
                    }) => self.directory.get(booking),
                    Err(err) => Err(err),
                }
            }
            BookingStatus::Swapped => Err(SwapError::BookingStatusConflict {
                booking,
                expected: BookingStatus::Locked,
                actual: BookingStatus::Swapped,
            }),
        }
    }

    /// Lock source then target. If the target lock fails, the source lock
    /// is released before the error reaches the caller — no booking is
    /// left stuck in `Locked` with no owning proposal.
    pub fn lock_pair(
        &self,
        source: BookingId,
        target: BookingId,
        by: UserId,
    ) -> Result<(Booking, Booking)> {
        let locked_source = self.lock(source, by)?;
        match self.lock(target, by) {
            Ok(locked_target) => Ok((locked_source, locked_target)),
            Err(err) => {
                if let Err(unlock_err) = self.unlock(source) {
                    tracing::warn!(
                        booking = %source,
                        error = %unlock_err,
                        "failed to release source lock after pair-lock rollback"
                    );
                }
                Err(err)
            }
        }
    }

    /// Release both sides of a pair. Both unlocks are attempted even when
    /// the first fails; the first error (if any) is returned afterwards.
    pub fn release_pair(&self, source: BookingId, target: Option<BookingId>) -> Result<()> {
        let source_result = self.unlock(source).map(|_| ());
        let target_result = match target {
            Some(target) => self.unlock(target).map(|_| ()),
            None => Ok(()),
        };
        source_result.and(target_result)
    }
}
