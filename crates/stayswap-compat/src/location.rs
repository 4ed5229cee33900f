//! Location factor: how well two booking locations line up.
//!
//! Works on free-form "City, Country" strings. An empty location on
//! either side scores neutral rather than failing the analysis.

use stayswap_types::constants::NEUTRAL_SCORE;

/// Score two location strings. Returns `(score, detail)`.
pub(crate) fn score(a: &str, b: &str) -> (f64, String) {
    let na = normalize(a);
    let nb = normalize(b);

    if na.is_empty() || nb.is_empty() {
        return (
            NEUTRAL_SCORE,
            "location missing on one side; scored neutral".to_string(),
        );
    }

    if na == nb {
        return (95.0, format!("exact location match ({na})"));
    }

    let (city_a, country_a) = split_city_country(&na);
    let (city_b, country_b) = split_city_country(&nb);

    if !country_a.is_empty() && country_a == country_b {
        let similarity = token_similarity(city_a, city_b);
        let score = 50.0 + 40.0 * similarity;
        return (
            score,
            format!(
                "same country ({country_a}), city similarity {:.0}%",
                similarity * 100.0
            ),
        );
    }

    (30.0, "different countries".to_string())
}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Split a normalized "city, country" string. The country is the last
/// comma-separated segment; a single-segment string has no country.
fn split_city_country(normalized: &str) -> (&str, &str) {
    match normalized.rsplit_once(',') {
        Some((city, country)) => (city.trim(), country.trim()),
        None => (normalized, ""),
    }
}

/// Jaccard similarity over whitespace-separated tokens, in [0, 1].
fn token_similarity(a: &str, b: &str) -> f64 {
    let ta: std::collections::HashSet<&str> = a.split_whitespace().collect();
    let tb: std::collections::HashSet<&str> = b.split_whitespace().collect();
    if ta.is_empty() && tb.is_empty() {
        return 1.0;
    }
    let intersection = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    if union == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    {
        intersection as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_scores_above_ninety() {
        let (score, _) = score("Paris, France", "paris, france");
        assert!(score > 90.0);
    }

    #[test]
    fn same_country_scores_mid_band() {
        let (score, detail) = score("Paris, France", "Lyon, France");
        assert!((50.0..=90.0).contains(&score), "got {score}");
        assert!(detail.contains("same country"));
    }

    #[test]
    fn same_country_similar_city_scores_higher() {
        let (similar, _) = score("New York City, USA", "New York, USA");
        let (dissimilar, _) = score("New York City, USA", "Austin, USA");
        assert!(similar > dissimilar);
    }

    #[test]
    fn different_countries_score_below_fifty() {
        let (score, _) = score("Paris, France", "Tokyo, Japan");
        assert!(score < 50.0);
    }

    #[test]
    fn empty_location_is_neutral_not_fatal() {
        let (score, detail) = score("", "Paris, France");
        assert!((score - NEUTRAL_SCORE).abs() < f64::EPSILON);
        assert!(detail.contains("neutral"));
    }

    #[test]
    fn no_country_segment_means_no_country_match() {
        // Single-segment locations have no country to compare.
        let (score, _) = score("Paris", "Lyon");
        assert!(score < 50.0);
    }
}
