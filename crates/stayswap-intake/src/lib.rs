//! # stayswap-intake
//!
//! **Admission Plane**: conditional-update stores, booking locks,
//! eligibility validation, and the targeting index.
//!
//! ## Architecture
//!
//! The admission plane sits between the caller-facing layer and the
//! lifecycle manager:
//! 1. **BookingDirectory / ProposalBook**: mutex-guarded row stores whose
//!    only mutations are conditional (check-and-set) — the in-memory
//!    stand-in for the datastore's atomic conditional update
//! 2. **LockManager**: booking mutual exclusion; pair acquisition with
//!    rollback on partial failure
//! 3. **EligibilityValidator**: hard gate — ownership, openness,
//!    self-swap, and duplicate checks fail closed; compatibility scoring
//!    fails open (warnings only)
//! 4. **TargetingIndex**: lightweight "who is targeting whom" edges for
//!    browse listings, decoupled from full proposal rows
//!
//! ## Proposal Flow
//!
//! ```text
//! API -> EligibilityValidator.validate() -> LockManager.lock_pair()
//!     -> ProposalBook.insert_pending() -> (lifecycle plane)
//! ```

pub mod eligibility;
pub mod lock_manager;
pub mod store;
pub mod targeting;

pub use eligibility::{
    CompatibilityScorer, EligibilityChecks, EligibilityReport, EligibilityValidator,
    WeightedScorer,
};
pub use lock_manager::LockManager;
pub use store::{BookingDirectory, ProposalBook};
pub use targeting::{TargetingIndex, validate_views};
