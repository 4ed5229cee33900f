//! Monetary-value factor: percentage difference between booking totals.
//!
//! A zero (or negative, or unconvertible) total on either side
//! short-circuits to a fixed neutral score of exactly 50 — never a
//! division by zero.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use stayswap_types::constants::NEUTRAL_SCORE;

/// Score two booking values. Returns `(score, detail)`.
pub(crate) fn score(a: Decimal, b: Decimal) -> (f64, String) {
    if a <= Decimal::ZERO || b <= Decimal::ZERO {
        return (
            NEUTRAL_SCORE,
            "zero or missing value on one side; scored neutral".to_string(),
        );
    }

    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let Some(pct) = ((hi - lo) / lo * Decimal::ONE_HUNDRED).to_f64() else {
        return (
            NEUTRAL_SCORE,
            "value difference not representable; scored neutral".to_string(),
        );
    };

    let score = (100.0 - pct).max(0.0);
    (score, format!("value difference {pct:.1}%"))
}
