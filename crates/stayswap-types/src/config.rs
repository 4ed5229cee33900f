//! Configuration types for the StaySwap engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{FactorWeights, constants};

/// Bounded-retry policy for external-dependency calls (notarization).
///
/// Delays grow exponentially: `base_delay`, `base_delay * multiplier`,
/// `base_delay * multiplier^2`, ... Timeouts are per attempt; there is no
/// overall operation deadline and no cancellation of an attempt in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of attempts (first try included).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub multiplier: u32,
}

impl RetryPolicy {
    /// The delay to sleep after the given failed attempt (1-based).
    /// Returns `None` once attempts are exhausted.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = self.multiplier.saturating_pow(attempt.saturating_sub(1));
        Some(self.base_delay.saturating_mul(factor))
    }

    /// A policy with no delays, for tests that must not sleep.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            multiplier: 1,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: constants::DEFAULT_NOTARY_ATTEMPTS,
            base_delay: Duration::from_millis(constants::DEFAULT_NOTARY_BASE_DELAY_MS),
            multiplier: constants::DEFAULT_NOTARY_BACKOFF_MULTIPLIER,
        }
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Overall compatibility score below which the validator warns.
    pub compatibility_threshold: u8,
    /// Default proposal time-to-live when the caller supplies none.
    pub default_ttl: Duration,
    /// Interval between expiration sweeps.
    pub sweep_interval: Duration,
    /// Retry policy for notarization submissions.
    pub notary_retry: RetryPolicy,
    /// Compatibility factor weights.
    pub weights: FactorWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            compatibility_threshold: constants::DEFAULT_COMPATIBILITY_THRESHOLD,
            default_ttl: Duration::from_secs(constants::DEFAULT_PROPOSAL_TTL_SECS),
            sweep_interval: Duration::from_secs(constants::DEFAULT_SWEEP_INTERVAL_SECS),
            notary_retry: RetryPolicy::default(),
            weights: FactorWeights::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.compatibility_threshold, 40);
        assert_eq!(cfg.sweep_interval, Duration::from_secs(300));
        assert_eq!(cfg.notary_retry.max_attempts, 3);
    }

    #[test]
    fn retry_delays_grow_exponentially() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
            multiplier: 2,
        };
        assert_eq!(policy.delay_after(1), Some(Duration::from_millis(100)));
        assert_eq!(policy.delay_after(2), Some(Duration::from_millis(200)));
        assert_eq!(policy.delay_after(3), Some(Duration::from_millis(400)));
        assert_eq!(policy.delay_after(4), None);
    }

    #[test]
    fn immediate_policy_never_sleeps() {
        let policy = RetryPolicy::immediate(3);
        assert_eq!(policy.delay_after(1), Some(Duration::ZERO));
        assert_eq!(policy.delay_after(2), Some(Duration::ZERO));
        assert_eq!(policy.delay_after(3), None);
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = EngineConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
