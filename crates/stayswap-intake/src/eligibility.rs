//! Eligibility validator — the hard gate in front of proposal creation.
//!
//! ## Design Principles
//!
//! - **Fail-closed on structure**: ownership, openness, self-swap, and
//!   duplicate checks are hard failures with one specific error per cause
//! - **Fail-open on analytics**: a low compatibility score is a warning,
//!   and a scoring *failure* is a warning too — negotiation is never
//!   blocked by an analytics outage
//! - **Ordered with short-circuit**: checks run in a fixed order and stop
//!   at the first hard failure

use std::sync::Arc;

use stayswap_types::{
    Booking, BookingId, CompatibilityAnalysis, FactorWeights, Result, SwapError, UserId,
};

use crate::store::{BookingDirectory, ProposalBook};

/// Seam for compatibility scoring, so validation can degrade gracefully
/// when the scorer (or a lookup it depends on) fails.
pub trait CompatibilityScorer: Send + Sync {
    fn score(&self, source: &Booking, target: &Booking) -> Result<CompatibilityAnalysis>;
}

/// Default scorer: the pure analyzer with fixed weights. Infallible.
pub struct WeightedScorer {
    weights: FactorWeights,
}

impl WeightedScorer {
    #[must_use]
    pub fn new(weights: FactorWeights) -> Self {
        Self { weights }
    }
}

impl CompatibilityScorer for WeightedScorer {
    fn score(&self, source: &Booking, target: &Booking) -> Result<CompatibilityAnalysis> {
        Ok(stayswap_compat::analyze(source, target, &self.weights))
    }
}

/// Which checks ran and passed. Checks after a short-circuit stay `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EligibilityChecks {
    pub owns_source: bool,
    pub source_open: bool,
    pub target_open: bool,
    pub distinct_parties: bool,
    pub no_duplicate: bool,
    pub compatibility: bool,
}

/// The validator's verdict: hard errors, soft warnings, and the analysis
/// (when scoring ran and succeeded).
#[derive(Debug)]
pub struct EligibilityReport {
    pub is_valid: bool,
    pub errors: Vec<SwapError>,
    pub warnings: Vec<String>,
    pub checks: EligibilityChecks,
    pub analysis: Option<CompatibilityAnalysis>,
}

impl EligibilityReport {
    fn rejected(error: SwapError, checks: EligibilityChecks, warnings: Vec<String>) -> Self {
        Self {
            is_valid: false,
            errors: vec![error],
            warnings,
            checks,
            analysis: None,
        }
    }

    /// Consume the report, yielding the first hard error if invalid.
    pub fn into_result(mut self) -> Result<Self> {
        if self.is_valid {
            Ok(self)
        } else {
            Err(self.errors.drain(..).next().unwrap_or_else(|| {
                SwapError::Internal("eligibility rejected with no recorded error".to_string())
            }))
        }
    }
}

/// Combines ownership, availability, duplicate, and compatibility checks
/// into a single verdict.
pub struct EligibilityValidator {
    directory: Arc<BookingDirectory>,
    proposals: Arc<ProposalBook>,
    scorer: Arc<dyn CompatibilityScorer>,
    threshold: u8,
}

impl EligibilityValidator {
    #[must_use]
    pub fn new(
        directory: Arc<BookingDirectory>,
        proposals: Arc<ProposalBook>,
        scorer: Arc<dyn CompatibilityScorer>,
        threshold: u8,
    ) -> Self {
        Self {
            directory,
            proposals,
            scorer,
            threshold,
        }
    }

    /// Validate a proposal from `user` offering `source` against `target`.
    #[must_use]
    pub fn validate(&self, user: UserId, source: BookingId, target: BookingId) -> EligibilityReport {
        let mut checks = EligibilityChecks::default();
        let mut warnings = Vec::new();

        // 1. Caller owns the source booking.
        let source_booking = match self.directory.get(source) {
            Ok(booking) => booking,
            Err(err) => return EligibilityReport::rejected(err, checks, warnings),
        };
        if source_booking.owner != user {
            return EligibilityReport::rejected(
                SwapError::NotBookingOwner {
                    user,
                    booking: source,
                },
                checks,
                warnings,
            );
        }
        checks.owns_source = true;

        // 2. Source booking is still listed. A lock does not end the
        //    listing — contention over locked bookings is settled by the
        //    lock manager, and the duplicate check below names the cause
        //    when the holder is a proposal between this exact pair.
        if !source_booking.is_listed() {
            return EligibilityReport::rejected(
                SwapError::BookingNotOpen {
                    booking: source,
                    status: source_booking.status,
                },
                checks,
                warnings,
            );
        }
        checks.source_open = true;

        // 3. Target exists and is still listed.
        let target_booking = match self.directory.get(target) {
            Ok(booking) => booking,
            Err(err) => return EligibilityReport::rejected(err, checks, warnings),
        };
        if !target_booking.is_listed() {
            return EligibilityReport::rejected(
                SwapError::BookingNotOpen {
                    booking: target,
                    status: target_booking.status,
                },
                checks,
                warnings,
            );
        }
        checks.target_open = true;

        // 4. Not proposing against the caller's own booking.
        if target_booking.owner == user {
            return EligibilityReport::rejected(SwapError::SelfSwapBlocked, checks, warnings);
        }
        checks.distinct_parties = true;

        // 5. No open proposal already links this ordered pair.
        if self.proposals.open_between(source, target).is_some() {
            return EligibilityReport::rejected(
                SwapError::DuplicateProposal { source_booking: source, target },
                checks,
                warnings,
            );
        }
        checks.no_duplicate = true;

        // 6. Compatibility: below threshold is a warning; a scoring
        //    failure is a warning and counts as passed.
        let analysis = match self.scorer.score(&source_booking, &target_booking) {
            Ok(analysis) => {
                if analysis.overall < self.threshold {
                    warnings.push(format!(
                        "compatibility score {} is below the threshold of {}",
                        analysis.overall, self.threshold
                    ));
                }
                Some(analysis)
            }
            Err(err) => {
                tracing::warn!(error = %err, "compatibility scoring failed during validation");
                warnings.push("unable to calculate compatibility".to_string());
                None
            }
        };
        checks.compatibility = true;

        EligibilityReport {
            is_valid: true,
            errors: Vec::new(),
            warnings,
            checks,
            analysis,
        }
    }
}
