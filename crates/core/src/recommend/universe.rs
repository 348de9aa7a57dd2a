//! Static mapping from asset-class categories to the ETF symbols eligible
//! for selection in that category. Built at compile time; never mutated.

pub const ETF_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "US Large Cap",
        &[
            "VOO", "VTI", "SPY", "IVV", "VTV", "VUG", "SCHX", "SCHG", "VV", "IWF", "IVW", "IWD",
            "IWB",
        ],
    ),
    ("US Mid Cap", &["IJH", "VO", "IWR", "MDY"]),
    ("US Small Cap", &["IJR", "VB", "VBR", "VXF", "IWM"]),
    (
        "International Developed",
        &["VEA", "IEFA", "EFA", "SCHF", "SPDW", "EFV", "VGK", "VEU"],
    ),
    ("International Emerging", &["IEMG", "VWO"]),
    (
        "Bonds",
        &[
            "BND", "AGG", "BNDX", "VCIT", "BSV", "VTEB", "VCSH", "IEF", "GOVT", "LQD", "IUSB",
            "VGIT", "BIV",
        ],
    ),
    ("Technology", &["QQQ", "VGT", "XLK", "QQQM", "IYW", "SMH"]),
    ("Alternatives", &["GLD", "VNQ", "IBIT", "IAU", "FBTC"]),
];

/// Eligible symbols for a category; empty for unknown categories.
pub fn category_symbols(category: &str) -> &'static [&'static str] {
    ETF_CATEGORIES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, symbols)| *symbols)
        .unwrap_or(&[])
}

/// Every tracked symbol across all categories, sorted and deduplicated.
/// This is the ingest universe for the worker.
pub fn tracked_symbols() -> Vec<&'static str> {
    let mut out: Vec<&'static str> = ETF_CATEGORIES
        .iter()
        .flat_map(|(_, symbols)| symbols.iter().copied())
        .collect();
    out.sort_unstable();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_category_resolves() {
        assert!(category_symbols("Bonds").contains(&"BND"));
        assert!(category_symbols("Technology").contains(&"QQQ"));
    }

    #[test]
    fn unknown_category_is_empty() {
        assert!(category_symbols("Crypto").is_empty());
    }

    #[test]
    fn tracked_symbols_are_sorted_and_unique() {
        let symbols = tracked_symbols();
        assert!(symbols.windows(2).all(|w| w[0] < w[1]));
        assert!(symbols.contains(&"VOO"));
    }
}
