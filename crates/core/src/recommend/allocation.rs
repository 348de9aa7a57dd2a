use std::collections::{BTreeMap, BTreeSet};

// Reference allocations at the two ends of the risk scale. Each sums to 1.0.
const SAFEST_PORTFOLIO: &[(&str, f64)] = &[
    ("Bonds", 0.70),
    ("US Large Cap", 0.20),
    ("International Developed", 0.10),
];

const RISKIEST_PORTFOLIO: &[(&str, f64)] = &[
    ("US Large Cap", 0.50),
    ("International Developed", 0.25),
    ("International Emerging", 0.15),
    ("Technology", 0.10),
];

/// Category weights for a given risk score, blended by linear interpolation
/// between the safest and riskiest reference portfolios.
///
/// The score is normalized to t = (score - 1) / 9; each category in the
/// union of the two references gets weight safe + (risky - safe) * t.
/// Categories that interpolate to zero or below are dropped and the rest is
/// renormalized to sum to 1.0. The output is a continuous glide path, not a
/// lookup table, and iterates in a fixed (alphabetical) order.
pub fn blend_allocation(risk_score: f64) -> BTreeMap<String, f64> {
    let t = (risk_score - 1.0) / 9.0;

    let categories: BTreeSet<&str> = SAFEST_PORTFOLIO
        .iter()
        .chain(RISKIEST_PORTFOLIO)
        .map(|(name, _)| *name)
        .collect();

    let mut blended = BTreeMap::new();
    for category in categories {
        let safe = endpoint_weight(SAFEST_PORTFOLIO, category);
        let risky = endpoint_weight(RISKIEST_PORTFOLIO, category);
        let weight = safe + (risky - safe) * t;
        if weight > 0.0 {
            blended.insert(category.to_string(), weight);
        }
    }

    let total: f64 = blended.values().sum();
    blended
        .into_iter()
        .map(|(category, weight)| (category, weight / total))
        .collect()
}

fn endpoint_weight(table: &[(&str, f64)], category: &str) -> f64 {
    table
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, w)| *w)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight(allocation: &BTreeMap<String, f64>, category: &str) -> f64 {
        allocation.get(category).copied().unwrap_or(0.0)
    }

    #[test]
    fn weights_sum_to_one_across_the_score_range() {
        let mut score = 1.0;
        while score <= 10.0 {
            let allocation = blend_allocation(score);
            let total: f64 = allocation.values().sum();
            assert!((total - 1.0).abs() < 1e-9, "sum {total} at score {score}");
            score += 0.25;
        }
    }

    #[test]
    fn midpoint_score_blends_bonds_to_35_percent() {
        // t = 0.5; every interpolated weight stays positive, so the
        // pre-normalization weights already sum to 1.0 and Bonds lands at
        // exactly 0.70 + (0.0 - 0.70) * 0.5 = 0.35.
        let allocation = blend_allocation(5.5);
        assert!((weight(&allocation, "Bonds") - 0.35).abs() < 1e-9);
        let total: f64 = allocation.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn glide_path_is_monotonic() {
        let mut prev_bonds = f64::INFINITY;
        let mut prev_tech = f64::NEG_INFINITY;
        let mut score = 1.0;
        while score <= 10.0 {
            let allocation = blend_allocation(score);
            let bonds = weight(&allocation, "Bonds");
            let tech = weight(&allocation, "Technology");
            assert!(bonds <= prev_bonds + 1e-12, "bonds rose at score {score}");
            assert!(tech >= prev_tech - 1e-12, "tech fell at score {score}");
            prev_bonds = bonds;
            prev_tech = tech;
            score += 0.5;
        }
    }

    #[test]
    fn extremes_match_the_reference_portfolios() {
        let safest = blend_allocation(1.0);
        assert!((weight(&safest, "Bonds") - 0.70).abs() < 1e-9);
        assert_eq!(weight(&safest, "Technology"), 0.0);

        let riskiest = blend_allocation(10.0);
        assert_eq!(weight(&riskiest, "Bonds"), 0.0);
        assert!((weight(&riskiest, "US Large Cap") - 0.50).abs() < 1e-9);
        assert!((weight(&riskiest, "Technology") - 0.10).abs() < 1e-9);
    }
}
