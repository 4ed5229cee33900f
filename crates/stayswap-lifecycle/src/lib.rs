//! # stayswap-lifecycle
//!
//! **Finality Plane**: the proposal lifecycle manager, the notarization
//! gateway, and the expiration sweeper.
//!
//! ## Architecture
//!
//! The finality plane sits behind the admission plane and in front of the
//! external collaborators:
//! 1. **LifecycleManager**: owns the state machine — create / accept /
//!    reject / cancel / expire, with check-and-set single-winner
//!    transitions and compensating rollback
//! 2. **NotaryGateway**: bounded-retry submission of every transition to
//!    the external ledger; success is never reported while the record is
//!    unconfirmed
//! 3. **ExpirationSweeper + SweepScheduler**: periodic reaping of lapsed
//!    proposals through the same transition path as user-driven
//!    resolutions; the scheduler owns the timer, tests drive ticks
//!    directly
//!
//! ## Transition Flow
//!
//! ```text
//! caller -> LifecycleManager -> ProposalBook.compare_and_set_status()
//!        -> NotaryGateway.submit() (retry, rollback on exhaustion)
//!        -> LockManager.release_pair() -> TargetingIndex -> notifier
//! ```

pub mod external;
pub mod manager;
pub mod notary;
pub mod sweeper;

pub use external::{
    NoticeKind, NotificationDispatcher, NotifyError, OwnershipTransfer, SwapNotice, TransferError,
};
#[cfg(any(test, feature = "test-helpers"))]
pub use external::{FailingTransfer, InstantTransfer, RecordingDispatcher, RecordingNotary};
pub use manager::{LifecycleManager, ProposalRequest};
pub use notary::{NotaryClient, NotaryError, NotaryGateway, NotaryReceipt, NotaryRecord};
pub use sweeper::{ExpirationSweeper, SweepOutcome, SweepScheduler, SweeperHealth};
