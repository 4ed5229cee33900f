//! Accommodation factor: category identity and cluster affinity.

use stayswap_types::booking::{Accommodation, AccommodationCluster};
use stayswap_types::constants::NEUTRAL_SCORE;

/// Score two accommodation categories. Returns `(score, detail)`.
pub(crate) fn score(a: Accommodation, b: Accommodation) -> (f64, String) {
    if a == Accommodation::Other || b == Accommodation::Other {
        return (
            NEUTRAL_SCORE,
            "unrecognized accommodation category; scored neutral".to_string(),
        );
    }

    if a == b {
        return (100.0, format!("identical category ({a})"));
    }

    if a.cluster() == b.cluster() {
        let cluster = match a.cluster() {
            AccommodationCluster::Serviced => "serviced",
            AccommodationCluster::SelfCatered => "self-catered",
            AccommodationCluster::Budget => "budget",
            AccommodationCluster::Unknown => "unknown",
        };
        return (75.0, format!("related categories ({a} / {b}, both {cluster})"));
    }

    (40.0, format!("unrelated categories ({a} vs {b})"))
}
