//! System-wide constants for the StaySwap engine.

/// Default compatibility factor weight: location.
pub const WEIGHT_LOCATION: f64 = 0.25;

/// Default compatibility factor weight: stay dates.
pub const WEIGHT_DATES: f64 = 0.20;

/// Default compatibility factor weight: monetary value.
pub const WEIGHT_VALUE: f64 = 0.30;

/// Default compatibility factor weight: accommodation category.
pub const WEIGHT_ACCOMMODATION: f64 = 0.15;

/// Default compatibility factor weight: guest count.
pub const WEIGHT_GUESTS: f64 = 0.10;

/// Neutral factor score used when a side is missing the data a factor needs.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Minimum overall compatibility score below which the eligibility
/// validator emits a warning (never a hard failure).
pub const DEFAULT_COMPATIBILITY_THRESHOLD: u8 = 40;

/// Default proposal time-to-live: 7 days.
pub const DEFAULT_PROPOSAL_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Default expiration sweep interval: 5 minutes.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Default number of notarization submit attempts before giving up.
pub const DEFAULT_NOTARY_ATTEMPTS: u32 = 3;

/// Default base delay before the first notarization retry, in milliseconds.
pub const DEFAULT_NOTARY_BASE_DELAY_MS: u64 = 250;

/// Default exponential backoff multiplier between notarization retries.
pub const DEFAULT_NOTARY_BACKOFF_MULTIPLIER: u32 = 2;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "StaySwap";
