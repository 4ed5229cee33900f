//! Targeting index — the lightweight "who is targeting whom" layer.
//!
//! Kept apart from the proposal book so browse listings can answer
//! "is this booking spoken for" without loading proposal graphs. Link
//! rows mirror their parent proposal's status; the lifecycle manager is
//! the only writer.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use stayswap_types::{
    Booking, BookingId, ConsistencyFinding, FindingSeverity, LinkId, LinkStatus, ProposalId,
    TargetingLink, TargetingView,
};

use crate::store::BookingDirectory;

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bidirectional index of targeting links.
#[derive(Default)]
pub struct TargetingIndex {
    links: Mutex<HashMap<LinkId, TargetingLink>>,
}

impl TargetingIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the link mirroring a proposal. A proposal has at
    /// most one link; re-targeting an open listing replaces it.
    pub fn upsert(&self, link: TargetingLink) {
        let mut links = guard(&self.links);
        links.retain(|_, existing| existing.proposal != link.proposal);
        links.insert(link.id, link);
    }

    /// Mirror a proposal transition onto its link. Returns the number of
    /// rows touched (0 when the proposal never had a link).
    pub fn set_status_for_proposal(&self, proposal: ProposalId, status: LinkStatus) -> usize {
        let mut links = guard(&self.links);
        let mut touched = 0;
        for link in links.values_mut().filter(|l| l.proposal == proposal) {
            link.status = status;
            link.updated_at = Utc::now();
            touched += 1;
        }
        touched
    }

    /// All links touching a booking on either side.
    #[must_use]
    pub fn links_for(&self, booking: BookingId) -> Vec<TargetingLink> {
        guard(&self.links)
            .values()
            .filter(|l| l.touches(booking))
            .cloned()
            .collect()
    }

    /// Whether a booking has an `Accepted` link in either direction —
    /// such bookings never appear in open-browse results.
    #[must_use]
    pub fn is_spoken_for(&self, booking: BookingId) -> bool {
        guard(&self.links)
            .values()
            .any(|l| l.status == LinkStatus::Accepted && l.touches(booking))
    }

    /// Transform the raw bidirectional rows into a per-booking view.
    ///
    /// A booking may have at most one outbound active link; when the rows
    /// violate that, the earliest link wins and the rest are dropped and
    /// counted — the read degrades, it never fails.
    #[must_use]
    pub fn view_for(&self, booking: BookingId) -> TargetingView {
        let links = guard(&self.links);

        let mut incoming: Vec<TargetingLink> = links
            .values()
            .filter(|l| l.target == booking && l.status == LinkStatus::Active)
            .cloned()
            .collect();
        incoming.sort_by_key(|l| l.created_at);

        let mut outbound: Vec<TargetingLink> = links
            .values()
            .filter(|l| l.source == booking && l.status == LinkStatus::Active)
            .cloned()
            .collect();
        outbound.sort_by_key(|l| l.created_at);

        let dropped_outgoing = outbound.len().saturating_sub(1);
        if dropped_outgoing > 0 {
            tracing::warn!(
                %booking,
                dropped = dropped_outgoing,
                "booking has multiple outbound active links; keeping the earliest"
            );
        }
        let outgoing = outbound.into_iter().next();

        let reported_incoming_count = incoming.len();
        TargetingView {
            booking,
            incoming,
            outgoing,
            dropped_outgoing,
            reported_incoming_count,
        }
    }

    /// Open bookings that are not spoken for — the browse listing feed.
    #[must_use]
    pub fn browseable(&self, directory: &BookingDirectory) -> Vec<Booking> {
        directory
            .open_bookings()
            .into_iter()
            .filter(|b| !self.is_spoken_for(b.id))
            .collect()
    }
}

/// Validate a transformed row set: count mismatches are logical invariant
/// violations, reported as medium-severity findings rather than errors.
#[must_use]
pub fn validate_views(views: &[TargetingView]) -> Vec<ConsistencyFinding> {
    let mut findings = Vec::new();
    for view in views {
        if view.reported_incoming_count != view.incoming.len() {
            findings.push(ConsistencyFinding {
                booking: view.booking,
                severity: FindingSeverity::Medium,
                detail: format!(
                    "incoming count mismatch: reported {} but materialized {}",
                    view.reported_incoming_count,
                    view.incoming.len()
                ),
            });
        }
        if view.dropped_outgoing > 0 {
            findings.push(ConsistencyFinding {
                booking: view.booking,
                severity: FindingSeverity::Medium,
                detail: format!(
                    "{} extra outbound active link(s) dropped by the transform",
                    view.dropped_outgoing
                ),
            });
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use stayswap_types::{Booking, UserId};

    fn link(source: BookingId, target: BookingId) -> TargetingLink {
        TargetingLink::new(ProposalId::new(), source, target)
    }

    #[test]
    fn view_splits_directions() {
        let index = TargetingIndex::new();
        let subject = BookingId::new();
        let other_a = BookingId::new();
        let other_b = BookingId::new();

        index.upsert(link(other_a, subject));
        index.upsert(link(other_b, subject));
        index.upsert(link(subject, other_a));

        let view = index.view_for(subject);
        assert_eq!(view.incoming.len(), 2);
        assert!(view.outgoing.is_some());
        assert_eq!(view.dropped_outgoing, 0);
    }

    #[test]
    fn multiple_outbound_links_keep_earliest() {
        let index = TargetingIndex::new();
        let subject = BookingId::new();
        let first = link(subject, BookingId::new());
        let first_id = first.id;
        index.upsert(first);
        let mut second = link(subject, BookingId::new());
        second.created_at += chrono::Duration::seconds(5);
        index.upsert(second);

        let view = index.view_for(subject);
        assert_eq!(view.dropped_outgoing, 1);
        assert_eq!(view.outgoing.map(|l| l.id), Some(first_id));
    }

    #[test]
    fn accepted_link_marks_both_sides_spoken_for() {
        let index = TargetingIndex::new();
        let source = BookingId::new();
        let target = BookingId::new();
        let l = link(source, target);
        let proposal = l.proposal;
        index.upsert(l);
        assert!(!index.is_spoken_for(source));

        index.set_status_for_proposal(proposal, LinkStatus::Accepted);
        assert!(index.is_spoken_for(source));
        assert!(index.is_spoken_for(target));
    }

    #[test]
    fn status_mirror_updates_link() {
        let index = TargetingIndex::new();
        let l = link(BookingId::new(), BookingId::new());
        let proposal = l.proposal;
        let booking = l.source;
        index.upsert(l);

        assert_eq!(index.set_status_for_proposal(proposal, LinkStatus::Cancelled), 1);
        let links = index.links_for(booking);
        assert_eq!(links[0].status, LinkStatus::Cancelled);
        // Cancelled links no longer appear in the active view.
        assert!(index.view_for(booking).outgoing.is_none());
    }

    #[test]
    fn spoken_for_bookings_hidden_from_browse() {
        let directory = BookingDirectory::new();
        let index = TargetingIndex::new();
        let a = Booking::dummy(UserId::new(), "Paris, France", Decimal::new(500, 0));
        let b = Booking::dummy(UserId::new(), "Rome, Italy", Decimal::new(600, 0));
        directory.insert(a.clone());
        directory.insert(b.clone());

        let l = link(a.id, b.id);
        let proposal = l.proposal;
        index.upsert(l);
        assert_eq!(index.browseable(&directory).len(), 2);

        index.set_status_for_proposal(proposal, LinkStatus::Accepted);
        assert!(index.browseable(&directory).is_empty());
    }

    #[test]
    fn validate_views_flags_count_mismatch() {
        let index = TargetingIndex::new();
        let subject = BookingId::new();
        index.upsert(link(BookingId::new(), subject));

        let mut view = index.view_for(subject);
        assert!(validate_views(std::slice::from_ref(&view)).is_empty());

        // Simulate a corrupted aggregation row.
        view.reported_incoming_count = 3;
        let findings = validate_views(&[view]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, FindingSeverity::Medium);
        assert!(findings[0].detail.contains("mismatch"));
    }

    #[test]
    fn upsert_replaces_link_for_same_proposal() {
        let index = TargetingIndex::new();
        let proposal = ProposalId::new();
        let source = BookingId::new();
        let first_target = BookingId::new();
        let second_target = BookingId::new();

        index.upsert(TargetingLink::new(proposal, source, first_target));
        index.upsert(TargetingLink::new(proposal, source, second_target));

        let view = index.view_for(source);
        assert_eq!(view.dropped_outgoing, 0);
        assert_eq!(view.outgoing.map(|l| l.target), Some(second_target));
    }
}
