//! The compatibility analyzer: the only function this crate exposes.
//!
//! ```text
//! analyze(&a, &b, &weights) -> CompatibilityAnalysis
//! ```
//!
//! Pure and total: no side effects, no clock, no stores, and no panics on
//! malformed bookings — every factor degrades to a neutral score when its
//! inputs are unusable. Weights are applied **verbatim**; callers who
//! supply weights that do not sum to 1.0 get a correspondingly shifted
//! overall score (clamped to [0, 100] after rounding).

use stayswap_types::{Booking, CompatibilityAnalysis, FactorScore, FactorWeights};

use crate::{accommodation, dates, guests, location, narrative, value};

/// Compare two bookings across the five weighted factors.
#[must_use]
pub fn analyze(a: &Booking, b: &Booking, weights: &FactorWeights) -> CompatibilityAnalysis {
    let (location_score, location_detail) = location::score(&a.location, &b.location);
    let (dates_score, dates_detail) = dates::score(&a.stay, &b.stay);
    let (value_score, value_detail) = value::score(a.value, b.value);
    let (accommodation_score, accommodation_detail) =
        accommodation::score(a.accommodation, b.accommodation);
    let (guests_score, guests_detail) = guests::score(a.guests, b.guests);

    let mut analysis = CompatibilityAnalysis {
        overall: 0,
        location: FactorScore::new(location_score, weights.location, location_detail),
        dates: FactorScore::new(dates_score, weights.dates, dates_detail),
        value: FactorScore::new(value_score, weights.value, value_detail),
        accommodation: FactorScore::new(
            accommodation_score,
            weights.accommodation,
            accommodation_detail,
        ),
        guests: FactorScore::new(guests_score, weights.guests, guests_detail),
        recommendations: Vec::new(),
        potential_issues: Vec::new(),
    };

    let weighted_sum: f64 = analysis.factors().iter().map(|(_, f)| f.weighted()).sum();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        analysis.overall = weighted_sum.round().clamp(0.0, 100.0) as u8;
    }

    analysis.recommendations = narrative::recommendations(&analysis);
    analysis.potential_issues = narrative::potential_issues(&analysis);
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use stayswap_types::{FactorStatus, UserId};

    fn booking(value: i64) -> Booking {
        Booking::dummy(UserId::new(), "Paris, France", Decimal::new(value, 0))
    }

    #[test]
    fn identical_bookings_score_above_95_with_no_issues() {
        let a = booking(500);
        let mut b = a.clone();
        b.id = stayswap_types::BookingId::new();
        b.owner = UserId::new();

        let analysis = analyze(&a, &b, &FactorWeights::default());
        assert!(analysis.overall > 95, "got {}", analysis.overall);
        assert!(analysis.potential_issues.is_empty());
        assert!((analysis.accommodation.score - 100.0).abs() < f64::EPSILON);
        assert!((analysis.guests.score - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn value_gap_500_vs_600_lands_between_60_and_90() {
        let a = booking(500);
        let b = booking(600);
        let analysis = analyze(&a, &b, &FactorWeights::default());
        assert!(
            analysis.value.score > 60.0 && analysis.value.score < 90.0,
            "got {}",
            analysis.value.score
        );
    }

    #[test]
    fn zero_value_side_scores_exactly_fifty() {
        let a = booking(0);
        let b = booking(600);
        let analysis = analyze(&a, &b, &FactorWeights::default());
        assert!((analysis.value.score - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn overall_always_within_bounds_for_normalized_weights() {
        let a = booking(500);
        let b = Booking::dummy(UserId::new(), "Tokyo, Japan", Decimal::new(5000, 0));
        let analysis = analyze(&a, &b, &FactorWeights::default());
        assert!(analysis.overall <= 100);
    }

    #[test]
    fn unnormalized_weights_used_verbatim() {
        let a = booking(500);
        let mut b = a.clone();
        b.id = stayswap_types::BookingId::new();

        // Half-scale weights: overall should land near half of the
        // normalized result, not be silently renormalized.
        let half = FactorWeights {
            location: 0.125,
            dates: 0.10,
            value: 0.15,
            accommodation: 0.075,
            guests: 0.05,
        };
        let scaled = analyze(&a, &b, &half);
        let normal = analyze(&a, &b, &FactorWeights::default());
        assert!(u16::from(scaled.overall) * 2 + 1 >= u16::from(normal.overall));
        assert!(scaled.overall < normal.overall);
    }

    #[test]
    fn oversized_weights_clamp_at_100() {
        let a = booking(500);
        let mut b = a.clone();
        b.id = stayswap_types::BookingId::new();
        let double = FactorWeights {
            location: 0.5,
            dates: 0.4,
            value: 0.6,
            accommodation: 0.3,
            guests: 0.2,
        };
        let analysis = analyze(&a, &b, &double);
        assert_eq!(analysis.overall, 100);
    }

    #[test]
    fn poor_factor_produces_matching_issue() {
        let a = booking(500);
        let b = booking(5000); // 900% value gap -> Poor
        let analysis = analyze(&a, &b, &FactorWeights::default());
        assert_eq!(analysis.value.status, FactorStatus::Poor);
        assert!(
            analysis
                .potential_issues
                .iter()
                .any(|i| i.starts_with("value"))
        );
    }

    #[test]
    fn high_overall_recommends_strongly() {
        let a = booking(500);
        let mut b = a.clone();
        b.id = stayswap_types::BookingId::new();
        let analysis = analyze(&a, &b, &FactorWeights::default());
        assert!(analysis.recommendations[0].contains("Highly recommended"));
    }

    #[test]
    fn malformed_booking_never_panics() {
        let mut a = booking(0);
        a.location = String::new();
        a.guests = 0;
        a.stay = stayswap_types::DateRange::new(a.stay.end, a.stay.start);
        let b = booking(600);
        let analysis = analyze(&a, &b, &FactorWeights::default());
        assert!(analysis.overall <= 100);
    }
}
