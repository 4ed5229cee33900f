//! Deterministic narrative derivation: recommendations and potential
//! issues are pure functions of the factor statuses and the overall score.

use stayswap_types::{CompatibilityAnalysis, FactorStatus};

/// Build the recommendation list for an otherwise-complete analysis.
pub(crate) fn recommendations(analysis: &CompatibilityAnalysis) -> Vec<String> {
    let mut out = Vec::new();

    if analysis.overall >= 80 {
        out.push("Highly recommended swap: the bookings are strongly aligned.".to_string());
    } else if analysis.overall >= 60 {
        out.push("Reasonable match: review the flagged differences before proposing.".to_string());
    } else {
        out.push("Weak match: consider revised terms before proposing.".to_string());
    }

    if analysis.value.status == FactorStatus::Poor || analysis.value.status == FactorStatus::Fair {
        out.push("A cash top-up could offset the value gap.".to_string());
    }

    if analysis.dates.status == FactorStatus::Poor {
        out.push("Adjusting either stay window would resolve the date conflict.".to_string());
    }

    out
}

/// Build the potential-issue list: one entry per Poor factor.
pub(crate) fn potential_issues(analysis: &CompatibilityAnalysis) -> Vec<String> {
    analysis
        .factors()
        .iter()
        .filter(|(_, f)| f.status == FactorStatus::Poor)
        .map(|(name, f)| format!("{name} compatibility is poor: {}", f.detail))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stayswap_types::FactorScore;

    fn analysis_with(overall: u8, value_score: f64, dates_score: f64) -> CompatibilityAnalysis {
        CompatibilityAnalysis {
            overall,
            location: FactorScore::new(90.0, 0.25, "ok"),
            dates: FactorScore::new(dates_score, 0.20, "dates detail"),
            value: FactorScore::new(value_score, 0.30, "value detail"),
            accommodation: FactorScore::new(100.0, 0.15, "ok"),
            guests: FactorScore::new(100.0, 0.10, "ok"),
            recommendations: Vec::new(),
            potential_issues: Vec::new(),
        }
    }

    #[test]
    fn high_overall_gets_highly_recommended() {
        let analysis = analysis_with(90, 95.0, 95.0);
        let recs = recommendations(&analysis);
        assert!(recs[0].contains("Highly recommended"));
    }

    #[test]
    fn low_overall_gets_weak_match() {
        let analysis = analysis_with(45, 30.0, 30.0);
        let recs = recommendations(&analysis);
        assert!(recs[0].contains("Weak match"));
    }

    #[test]
    fn value_gap_suggests_cash_top_up() {
        let analysis = analysis_with(70, 55.0, 95.0);
        let recs = recommendations(&analysis);
        assert!(recs.iter().any(|r| r.contains("cash top-up")));
    }

    #[test]
    fn poor_factors_become_issues() {
        let analysis = analysis_with(60, 30.0, 40.0);
        let issues = potential_issues(&analysis);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().any(|i| i.starts_with("value")));
        assert!(issues.iter().any(|i| i.starts_with("dates")));
    }

    #[test]
    fn no_poor_factors_means_no_issues() {
        let analysis = analysis_with(95, 95.0, 95.0);
        assert!(potential_issues(&analysis).is_empty());
    }
}
