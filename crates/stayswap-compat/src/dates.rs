//! Stay-date factor: duration similarity, overlap handling, season bonus.
//!
//! Identical windows are an exact match (the cleanest possible exchange).
//! *Partially* overlapping windows are the conflict case and score below
//! 50 with a Poor banding. Disjoint windows score on duration similarity
//! with a same-season bonus.

use chrono::{Datelike, NaiveDate};
use stayswap_types::DateRange;
use stayswap_types::constants::NEUTRAL_SCORE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

fn season(date: NaiveDate) -> Season {
    match date.month() {
        12 | 1 | 2 => Season::Winter,
        3..=5 => Season::Spring,
        6..=8 => Season::Summer,
        _ => Season::Autumn,
    }
}

/// Ratio of the shorter duration to the longer, in [0, 1].
fn duration_ratio(a: &DateRange, b: &DateRange) -> f64 {
    let (na, nb) = (a.nights(), b.nights());
    let (lo, hi) = if na <= nb { (na, nb) } else { (nb, na) };
    if hi == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    {
        lo as f64 / hi as f64
    }
}

/// Score two stay windows. Returns `(score, detail)`.
pub(crate) fn score(a: &DateRange, b: &DateRange) -> (f64, String) {
    if !a.is_valid() || !b.is_valid() {
        return (
            NEUTRAL_SCORE,
            "malformed stay window; scored neutral".to_string(),
        );
    }

    if a == b {
        return (100.0, "identical stay windows".to_string());
    }

    let ratio = duration_ratio(a, b);

    if a.overlaps(b) {
        // Partial overlap: the two stays compete for the same nights.
        let score = 30.0 + 15.0 * ratio;
        return (
            score,
            format!("stay windows partially overlap ({a} vs {b})"),
        );
    }

    let mut score = 50.0 + 40.0 * ratio;
    let mut detail = format!(
        "duration similarity {:.0}% ({} vs {} nights)",
        ratio * 100.0,
        a.nights(),
        b.nights()
    );
    if season(a.start) == season(b.start) {
        score += 10.0;
        detail.push_str(", same season");
    }

    (score.min(100.0), detail)
}
