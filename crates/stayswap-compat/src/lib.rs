//! # stayswap-compat
//!
//! **Compatibility Plane**: pure scoring of how well two bookings fit as
//! an exchange.
//!
//! The only entry point is [`analyze`]:
//!
//! ```text
//! analyze(&a, &b, &weights) -> CompatibilityAnalysis
//! ```
//!
//! Five weighted factors, each in its own module:
//! 1. **location** — exact match / same country / different country
//! 2. **dates** — duration similarity, partial-overlap conflict, season bonus
//! 3. **value** — percentage difference, neutral on zero totals
//! 4. **accommodation** — category identity and cluster affinity
//! 5. **guests** — headcount proximity with capacity-mismatch penalty
//!
//! This crate never touches a store, a clock, or a network: given the
//! same bookings and weights it always returns the same analysis, so the
//! eligibility validator and any browse layer can call it freely.

mod accommodation;
mod analyzer;
mod dates;
mod guests;
mod location;
mod narrative;
mod value;

pub use analyzer::analyze;
