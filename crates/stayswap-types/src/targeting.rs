//! Targeting types — the lightweight "who is targeting whom" layer.
//!
//! A [`TargetingLink`] is a directed edge recording that one booking is
//! being proposed against another, kept separately from the full proposal
//! row so browse listings can answer "is this booking spoken for" without
//! loading proposal graphs. Link status mirrors the parent proposal's
//! status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BookingId, LinkId, ProposalId, ProposalStatus};

/// Status of a targeting link. Mirrors the parent proposal:
/// expiry maps to `Cancelled` (a system-initiated withdrawal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkStatus {
    Active,
    Accepted,
    Rejected,
    Cancelled,
}

impl LinkStatus {
    /// The link status mirroring a proposal status.
    #[must_use]
    pub fn mirroring(status: ProposalStatus) -> Self {
        match status {
            ProposalStatus::Pending => Self::Active,
            ProposalStatus::Accepted | ProposalStatus::Completed => Self::Accepted,
            ProposalStatus::Rejected => Self::Rejected,
            ProposalStatus::Cancelled | ProposalStatus::Expired => Self::Cancelled,
        }
    }
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::Rejected => write!(f, "REJECTED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A directed edge: `source` booking is proposing against `target` booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetingLink {
    pub id: LinkId,
    /// The proposal this link mirrors.
    pub proposal: ProposalId,
    pub source: BookingId,
    pub target: BookingId,
    pub status: LinkStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TargetingLink {
    #[must_use]
    pub fn new(proposal: ProposalId, source: BookingId, target: BookingId) -> Self {
        let now = Utc::now();
        Self {
            id: LinkId::new(),
            proposal,
            source,
            target,
            status: LinkStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this link touches the given booking on either side.
    #[must_use]
    pub fn touches(&self, booking: BookingId) -> bool {
        self.source == booking || self.target == booking
    }
}

/// Per-booking view assembled from the raw bidirectional link rows.
///
/// A booking may be targeted by many others (`incoming`) but may itself
/// target at most one (`outgoing`). When the raw rows violate that
/// invariant, the transform keeps the earliest outbound link and counts
/// the rest in `dropped_outgoing` instead of failing the read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetingView {
    pub booking: BookingId,
    /// Links from other bookings targeting this one.
    pub incoming: Vec<TargetingLink>,
    /// This booking's single outbound active proposal, if any.
    pub outgoing: Option<TargetingLink>,
    /// Number of extra outbound active links dropped by the transform.
    pub dropped_outgoing: usize,
    /// Count of incoming links as reported by the source query, kept for
    /// consistency validation against `incoming.len()`.
    pub reported_incoming_count: usize,
}

/// Severity of a consistency finding. Targeting anomalies are diagnostic,
/// never request-fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingSeverity {
    Low,
    Medium,
    High,
}

/// A data-integrity anomaly detected while validating targeting views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyFinding {
    pub booking: BookingId,
    pub severity: FindingSeverity,
    pub detail: String,
}
