//! Compatibility analysis value objects.
//!
//! A [`CompatibilityAnalysis`] is ephemeral: recomputed on demand, never
//! persisted or cached by the engine. Factor scores are plain `f64`
//! analytics values; money stays in `rust_decimal` on the bookings.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Qualitative banding of a factor score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactorStatus {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl FactorStatus {
    /// Band a raw factor score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            Self::Excellent
        } else if score >= 65.0 {
            Self::Good
        } else if score >= 50.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

impl std::fmt::Display for FactorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excellent => write!(f, "EXCELLENT"),
            Self::Good => write!(f, "GOOD"),
            Self::Fair => write!(f, "FAIR"),
            Self::Poor => write!(f, "POOR"),
        }
    }
}

/// One weighted factor of a compatibility analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorScore {
    /// Raw score in [0, 100].
    pub score: f64,
    /// Weight applied when aggregating into the overall score.
    pub weight: f64,
    pub status: FactorStatus,
    /// Human-readable explanation of how the score was derived.
    pub detail: String,
}

impl FactorScore {
    #[must_use]
    pub fn new(score: f64, weight: f64, detail: impl Into<String>) -> Self {
        let score = score.clamp(0.0, 100.0);
        Self {
            score,
            weight,
            status: FactorStatus::from_score(score),
            detail: detail.into(),
        }
    }

    /// This factor's contribution to the weighted sum.
    #[must_use]
    pub fn weighted(&self) -> f64 {
        self.score * self.weight
    }
}

/// Weights for the five compatibility factors.
///
/// Caller-supplied weights are used **verbatim** — the analyzer never
/// renormalizes, so weights that do not sum to 1.0 shift the overall
/// score accordingly (documented behavior; check [`Self::is_normalized`]
/// before supplying custom weights).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    pub location: f64,
    pub dates: f64,
    pub value: f64,
    pub accommodation: f64,
    pub guests: f64,
}

impl FactorWeights {
    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.location + self.dates + self.value + self.accommodation + self.guests
    }

    /// Whether the weights sum to 1.0 (within floating-point tolerance).
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        (self.total() - 1.0).abs() < 1e-9
    }
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            location: constants::WEIGHT_LOCATION,
            dates: constants::WEIGHT_DATES,
            value: constants::WEIGHT_VALUE,
            accommodation: constants::WEIGHT_ACCOMMODATION,
            guests: constants::WEIGHT_GUESTS,
        }
    }
}

/// The full result of comparing two bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityAnalysis {
    /// Weighted overall score, rounded and clamped to [0, 100].
    pub overall: u8,
    pub location: FactorScore,
    pub dates: FactorScore,
    pub value: FactorScore,
    pub accommodation: FactorScore,
    pub guests: FactorScore,
    /// Deterministic guidance derived from the factor statuses.
    pub recommendations: Vec<String>,
    /// Deterministic list of flagged problems (one per Poor factor, plus
    /// value-gap advisories).
    pub potential_issues: Vec<String>,
}

impl CompatibilityAnalysis {
    /// The five factors in canonical order, labeled.
    #[must_use]
    pub fn factors(&self) -> [(&'static str, &FactorScore); 5] {
        [
            ("location", &self.location),
            ("dates", &self.dates),
            ("value", &self.value),
            ("accommodation", &self.accommodation),
            ("guests", &self.guests),
        ]
    }

    /// Whether any factor landed in the Poor band.
    #[must_use]
    pub fn has_poor_factor(&self) -> bool {
        self.factors()
            .iter()
            .any(|(_, f)| f.status == FactorStatus::Poor)
    }
}
