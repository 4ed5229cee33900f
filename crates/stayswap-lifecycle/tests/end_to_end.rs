//! End-to-end integration tests across all planes.
//!
//! These tests exercise the full proposal lifecycle:
//! Admission (Intake) -> Lifecycle Manager -> external collaborators
//!
//! They verify that the planes work together correctly in realistic
//! scenarios: full swaps, rejection and cancellation round-trips, lock
//! races, duplicate guards, auction-style open listings, and expiration
//! sweeps that survive individual failures.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use stayswap_intake::{BookingDirectory, ProposalBook, TargetingIndex};
use stayswap_lifecycle::{
    ExpirationSweeper, InstantTransfer, LifecycleManager, ProposalRequest, RecordingDispatcher,
    RecordingNotary,
};
use stayswap_types::{
    Booking, BookingId, BookingStatus, EngineConfig, ProposalKind, ProposalStatus,
    ProposalTransition, RetryPolicy, SwapError, SwapProposal, UserId,
};

/// Helper: full engine pipeline — stores, manager, sweeper, doubles.
struct SwapPipeline {
    directory: Arc<BookingDirectory>,
    proposals: Arc<ProposalBook>,
    targeting: Arc<TargetingIndex>,
    notary: Arc<RecordingNotary>,
    dispatcher: Arc<RecordingDispatcher>,
    manager: Arc<LifecycleManager>,
    sweeper: ExpirationSweeper,
}

impl SwapPipeline {
    fn new() -> Self {
        let directory = Arc::new(BookingDirectory::new());
        let proposals = Arc::new(ProposalBook::new());
        let targeting = Arc::new(TargetingIndex::new());
        let notary = Arc::new(RecordingNotary::new());
        let dispatcher = Arc::new(RecordingDispatcher::new());

        let config = EngineConfig {
            notary_retry: RetryPolicy::immediate(3),
            ..EngineConfig::default()
        };

        let manager = Arc::new(LifecycleManager::new(
            Arc::clone(&directory),
            Arc::clone(&proposals),
            Arc::clone(&targeting),
            notary.clone(),
            Arc::new(InstantTransfer::new()),
            dispatcher.clone(),
            &config,
        ));
        let sweeper = ExpirationSweeper::new(Arc::clone(&manager), Arc::clone(&proposals));

        Self {
            directory,
            proposals,
            targeting,
            notary,
            dispatcher,
            manager,
            sweeper,
        }
    }

    fn add_booking(&self, owner: UserId, location: &str, value: i64) -> Booking {
        let booking = Booking::dummy(owner, location, Decimal::new(value, 0));
        self.directory.insert(booking.clone());
        booking
    }

    fn propose(&self, proposer: UserId, source: BookingId, target: BookingId) -> SwapProposal {
        self.manager
            .create(ProposalRequest {
                proposer,
                source_booking: source,
                target_booking: Some(target),
                kind: ProposalKind::Exchange,
                conditions: None,
                expires_at: Utc::now() + chrono::Duration::hours(1),
            })
            .expect("proposal creation should succeed")
    }

    fn booking_status(&self, id: BookingId) -> BookingStatus {
        self.directory.get(id).expect("booking exists").status
    }
}

// =============================================================================
// Test: full swap across all planes
// =============================================================================
#[test]
fn e2e_full_swap() {
    let pipeline = SwapPipeline::new();
    let alice = UserId::new();
    let bob = UserId::new();

    let paris = pipeline.add_booking(alice, "Paris, France", 500);
    let rome = pipeline.add_booking(bob, "Rome, Italy", 520);

    let proposal = pipeline.propose(alice, paris.id, rome.id);
    assert_eq!(proposal.status, ProposalStatus::Pending);
    assert_eq!(pipeline.booking_status(paris.id), BookingStatus::Locked);
    assert_eq!(pipeline.booking_status(rome.id), BookingStatus::Locked);

    let completed = pipeline.manager.accept(proposal.id, bob).unwrap();
    assert_eq!(completed.status, ProposalStatus::Completed);
    assert!(completed.ledger.created.is_some());
    assert!(completed.ledger.accepted.is_some());
    assert!(completed.transfer_confirmation.is_some());

    // Ownership exchanged; bookings terminally swapped.
    assert_eq!(pipeline.directory.get(paris.id).unwrap().owner, bob);
    assert_eq!(pipeline.directory.get(rome.id).unwrap().owner, alice);
    assert_eq!(pipeline.booking_status(paris.id), BookingStatus::Swapped);
    assert_eq!(pipeline.booking_status(rome.id), BookingStatus::Swapped);

    // The ledger saw exactly the creation and the acceptance.
    let transitions: Vec<ProposalTransition> = pipeline
        .notary
        .submissions()
        .iter()
        .map(|r| r.transition)
        .collect();
    assert_eq!(
        transitions,
        vec![ProposalTransition::Created, ProposalTransition::Accepted]
    );

    // Both bookings are spoken for and hidden from browse.
    assert!(pipeline.targeting.is_spoken_for(paris.id));
    assert!(pipeline.targeting.browseable(&pipeline.directory).is_empty());
}

// =============================================================================
// Test: rejection releases everything and notifies the proposer
// =============================================================================
#[test]
fn e2e_reject_flow() {
    let pipeline = SwapPipeline::new();
    let alice = UserId::new();
    let bob = UserId::new();
    let paris = pipeline.add_booking(alice, "Paris, France", 500);
    let rome = pipeline.add_booking(bob, "Rome, Italy", 520);

    let proposal = pipeline.propose(alice, paris.id, rome.id);
    let rejected = pipeline.manager.reject(proposal.id, bob).unwrap();

    assert_eq!(rejected.status, ProposalStatus::Rejected);
    assert!(rejected.ledger.rejected.is_some());
    assert_eq!(pipeline.booking_status(paris.id), BookingStatus::Available);
    assert_eq!(pipeline.booking_status(rome.id), BookingStatus::Available);

    let notices = pipeline.dispatcher.notices();
    assert!(
        notices
            .iter()
            .any(|(user, notice)| *user == alice
                && notice.kind == stayswap_lifecycle::NoticeKind::ProposalRejected)
    );
}

// =============================================================================
// Test: create-then-cancel round trip leaves no residue
// =============================================================================
#[test]
fn e2e_cancel_round_trip() {
    let pipeline = SwapPipeline::new();
    let alice = UserId::new();
    let bob = UserId::new();
    let paris = pipeline.add_booking(alice, "Paris, France", 500);
    let rome = pipeline.add_booking(bob, "Rome, Italy", 520);

    let proposal = pipeline.propose(alice, paris.id, rome.id);
    let cancelled = pipeline.manager.cancel(proposal.id, alice).unwrap();

    assert_eq!(cancelled.status, ProposalStatus::Cancelled);
    assert_eq!(pipeline.booking_status(paris.id), BookingStatus::Available);
    assert_eq!(pipeline.booking_status(rome.id), BookingStatus::Available);

    // No residual active targeting link in either direction.
    assert!(pipeline.targeting.view_for(paris.id).outgoing.is_none());
    assert!(pipeline.targeting.view_for(rome.id).incoming.is_empty());
    // Both bookings are browseable again.
    assert_eq!(pipeline.targeting.browseable(&pipeline.directory).len(), 2);
}

// =============================================================================
// Test: duplicate-proposal guard holds until the first turns terminal
// =============================================================================
#[test]
fn e2e_duplicate_guard() {
    let pipeline = SwapPipeline::new();
    let alice = UserId::new();
    let bob = UserId::new();
    let paris = pipeline.add_booking(alice, "Paris, France", 500);
    let rome = pipeline.add_booking(bob, "Rome, Italy", 520);

    let first = pipeline.propose(alice, paris.id, rome.id);

    let err = pipeline
        .manager
        .create(ProposalRequest {
            proposer: alice,
            source_booking: paris.id,
            target_booking: Some(rome.id),
            kind: ProposalKind::Exchange,
            conditions: None,
            expires_at: Utc::now() + chrono::Duration::hours(1),
        })
        .unwrap_err();
    assert!(matches!(err, SwapError::DuplicateProposal { .. }));

    pipeline.manager.cancel(first.id, alice).unwrap();
    // The pair is free again.
    pipeline.propose(alice, paris.id, rome.id);
}

// =============================================================================
// Test: two proposals racing for the same target — one winner
// =============================================================================
#[test]
fn e2e_lock_race_single_winner() {
    let pipeline = SwapPipeline::new();
    let bob = UserId::new();
    let rome = pipeline.add_booking(bob, "Rome, Italy", 520);

    let mut handles = Vec::new();
    for i in 0..4 {
        let manager = Arc::clone(&pipeline.manager);
        let proposer = UserId::new();
        let source = pipeline.add_booking(proposer, "Paris, France", 480 + i);
        let target = rome.id;
        handles.push(std::thread::spawn(move || {
            manager
                .create(ProposalRequest {
                    proposer,
                    source_booking: source.id,
                    target_booking: Some(target),
                    kind: ProposalKind::Exchange,
                    conditions: None,
                    expires_at: Utc::now() + chrono::Duration::hours(1),
                })
                .is_ok()
        }));
    }

    let wins = handles
        .into_iter()
        .map(|h| h.join().unwrap_or(false))
        .filter(|won| *won)
        .count();
    assert_eq!(wins, 1, "exactly one racing proposal may lock the target");
    assert_eq!(pipeline.booking_status(rome.id), BookingStatus::Locked);

    // The losers' sources were all released.
    let stuck = pipeline
        .directory
        .open_bookings()
        .len();
    assert_eq!(stuck, 3, "losing proposers' bookings must be unlocked");
}

// =============================================================================
// Test: auction-style open listing, then target selection, then swap
// =============================================================================
#[test]
fn e2e_open_listing_flow() {
    let pipeline = SwapPipeline::new();
    let alice = UserId::new();
    let bob = UserId::new();
    let paris = pipeline.add_booking(alice, "Paris, France", 500);
    let rome = pipeline.add_booking(bob, "Rome, Italy", 520);

    let listing = pipeline
        .manager
        .create(ProposalRequest {
            proposer: alice,
            source_booking: paris.id,
            target_booking: None,
            kind: ProposalKind::Exchange,
            conditions: None,
            expires_at: Utc::now() + chrono::Duration::hours(1),
        })
        .unwrap();
    assert!(listing.target_booking.is_none());
    // An open listing holds no locks.
    assert_eq!(pipeline.booking_status(paris.id), BookingStatus::Available);

    pipeline
        .manager
        .choose_target(listing.id, rome.id, alice)
        .unwrap();
    assert_eq!(pipeline.booking_status(paris.id), BookingStatus::Locked);

    let completed = pipeline.manager.accept(listing.id, bob).unwrap();
    assert_eq!(completed.status, ProposalStatus::Completed);
}

// =============================================================================
// Test: cash top-up proposals flow through the same lifecycle
// =============================================================================
#[test]
fn e2e_cash_top_up() {
    let pipeline = SwapPipeline::new();
    let alice = UserId::new();
    let bob = UserId::new();
    let paris = pipeline.add_booking(alice, "Paris, France", 400);
    let rome = pipeline.add_booking(bob, "Rome, Italy", 600);

    let proposal = pipeline
        .manager
        .create(ProposalRequest {
            proposer: alice,
            source_booking: paris.id,
            target_booking: Some(rome.id),
            kind: ProposalKind::CashTopUp {
                amount: Decimal::new(200, 0),
            },
            conditions: Some("top-up payable on completion".to_string()),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        })
        .unwrap();
    assert_eq!(proposal.cash_top_up(), Some(Decimal::new(200, 0)));

    let completed = pipeline.manager.accept(proposal.id, bob).unwrap();
    assert_eq!(completed.status, ProposalStatus::Completed);
    assert_eq!(completed.cash_top_up(), Some(Decimal::new(200, 0)));
}

// =============================================================================
// Test: accepting a lapsed proposal fails even before any sweep
// =============================================================================
#[test]
fn e2e_accept_after_expiry_fails() {
    let pipeline = SwapPipeline::new();
    let alice = UserId::new();
    let bob = UserId::new();
    let paris = pipeline.add_booking(alice, "Paris, France", 500);
    let rome = pipeline.add_booking(bob, "Rome, Italy", 520);

    let proposal = pipeline
        .manager
        .create(ProposalRequest {
            proposer: alice,
            source_booking: paris.id,
            target_booking: Some(rome.id),
            kind: ProposalKind::Exchange,
            conditions: None,
            expires_at: Utc::now() + chrono::Duration::milliseconds(1),
        })
        .unwrap();
    std::thread::sleep(std::time::Duration::from_millis(10));

    let err = pipeline.manager.accept(proposal.id, bob).unwrap_err();
    assert!(matches!(err, SwapError::ProposalExpired { .. }));

    // The sweeper later finalizes it through the same machinery.
    let outcome = pipeline.sweeper.force_check();
    assert_eq!(outcome.processed, 1);
    assert_eq!(
        pipeline.proposals.get(proposal.id).unwrap().status,
        ProposalStatus::Expired
    );
    assert_eq!(pipeline.booking_status(paris.id), BookingStatus::Available);
}

// =============================================================================
// Test: sweep batch survives an individual failure
// =============================================================================
#[test]
fn e2e_sweep_survives_partial_failure() {
    let pipeline = SwapPipeline::new();
    let alice = UserId::new();
    let bob = UserId::new();
    let carol = UserId::new();
    let dave = UserId::new();

    let a = pipeline.add_booking(alice, "Paris, France", 500);
    let b = pipeline.add_booking(bob, "Rome, Italy", 520);
    let c = pipeline.add_booking(carol, "Lisbon, Portugal", 450);
    let d = pipeline.add_booking(dave, "Porto, Portugal", 470);

    let make = |proposer: UserId, source: BookingId, target: BookingId| {
        pipeline
            .manager
            .create(ProposalRequest {
                proposer,
                source_booking: source,
                target_booking: Some(target),
                kind: ProposalKind::Exchange,
                conditions: None,
                expires_at: Utc::now() + chrono::Duration::milliseconds(1),
            })
            .unwrap()
    };
    let doomed = make(alice, a.id, b.id);
    let healthy = make(carol, c.id, d.id);
    std::thread::sleep(std::time::Duration::from_millis(10));

    // Sabotage the first proposal's unlock.
    pipeline
        .directory
        .compare_and_set_status(a.id, BookingStatus::Locked, BookingStatus::Swapped)
        .unwrap();

    let outcome = pipeline.sweeper.force_check();
    assert_eq!(outcome.scanned, 2);
    assert_eq!(outcome.failed, 1);
    assert!(outcome.processed >= 1, "the healthy proposal must still run");

    assert_eq!(
        pipeline.proposals.get(healthy.id).unwrap().status,
        ProposalStatus::Expired
    );
    assert_eq!(pipeline.booking_status(c.id), BookingStatus::Available);
    assert_eq!(pipeline.booking_status(d.id), BookingStatus::Available);

    let health = pipeline.sweeper.health();
    assert!(health.total_swaps_processed >= 1);
    assert!(health.last_error.is_some());
    drop(doomed);
}

// =============================================================================
// Test: validator warnings surface without blocking creation
// =============================================================================
#[test]
fn e2e_low_compatibility_warns_but_proposal_proceeds() {
    let pipeline = SwapPipeline::new();
    let alice = UserId::new();
    let bob = UserId::new();
    // Wildly mismatched: different country, 10x value, different type.
    let paris = pipeline.add_booking(alice, "Paris, France", 500);
    let mut tokyo = Booking::dummy(bob, "Tokyo, Japan", Decimal::new(5000, 0));
    tokyo.accommodation = stayswap_types::Accommodation::Hostel;
    tokyo.guests = 8;
    pipeline.directory.insert(tokyo.clone());

    let report = pipeline
        .manager
        .validator()
        .validate(alice, paris.id, tokyo.id);
    assert!(report.is_valid);
    let analysis = report.analysis.expect("analysis should be present");
    assert!(analysis.overall < 60);
    assert!(analysis.has_poor_factor());
    assert!(!analysis.potential_issues.is_empty());

    // Creation still goes through — a weak score is never a hard stop.
    let proposal = pipeline.propose(alice, paris.id, tokyo.id);
    assert_eq!(proposal.status, ProposalStatus::Pending);
}
