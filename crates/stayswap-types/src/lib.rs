//! # stayswap-types
//!
//! Shared types, errors, and configuration for the **StaySwap** booking
//! swap engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`BookingId`], [`ProposalId`], [`LinkId`], [`UserId`], [`LedgerRef`]
//! - **Booking model**: [`Booking`], [`BookingStatus`], [`Accommodation`], [`DateRange`]
//! - **Proposal model**: [`SwapProposal`], [`ProposalStatus`], [`ProposalKind`],
//!   [`ProposalTransition`], [`LedgerRefs`]
//! - **Targeting model**: [`TargetingLink`], [`LinkStatus`], [`TargetingView`],
//!   [`ConsistencyFinding`]
//! - **Analysis model**: [`CompatibilityAnalysis`], [`FactorScore`], [`FactorWeights`]
//! - **Configuration**: [`EngineConfig`], [`RetryPolicy`]
//! - **Errors**: [`SwapError`] with `SS_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod analysis;
pub mod booking;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod proposal;
pub mod targeting;

// Re-export all primary types at crate root for ergonomic imports:
//   use stayswap_types::{Booking, SwapProposal, ProposalStatus, ...};

pub use analysis::*;
pub use booking::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use proposal::*;
pub use targeting::*;

// Constants are accessed via `stayswap_types::constants::FOO`
// (not re-exported to avoid name collisions).
