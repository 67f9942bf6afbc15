//! Fuzzy filtering of the key catalogue.

use std::fmt;

use clap::ValueEnum;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::label::LabelKey;

/// How matched keys are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FilterOrder {
    /// Keep catalogue (alphabetical) order.
    #[default]
    Catalogue,
    /// Best match score first; equal scores keep catalogue order.
    Score,
}

/// Case-sensitive subsequence matcher over label key names.
pub struct FuzzyFilter {
    matcher: SkimMatcherV2,
    order: FilterOrder,
}

impl FuzzyFilter {
    /// Create a filter with the given ordering.
    #[must_use]
    pub fn new(order: FilterOrder) -> Self {
        Self {
            matcher: SkimMatcherV2::default().respect_case(),
            order,
        }
    }

    /// The configured ordering.
    #[must_use]
    pub const fn order(&self) -> FilterOrder {
        self.order
    }

    /// Keys whose names fuzzily match `query`.
    ///
    /// An empty query returns the catalogue unchanged.
    #[must_use]
    pub fn filter(&self, query: &str, catalogue: &[LabelKey]) -> Vec<LabelKey> {
        if query.is_empty() {
            return catalogue.to_vec();
        }

        let mut scored: Vec<(i64, &LabelKey)> = catalogue
            .iter()
            .filter_map(|key| {
                self.matcher
                    .fuzzy_match(key.name(), query)
                    .map(|score| (score, key))
            })
            .collect();

        if self.order == FilterOrder::Score {
            // Stable, so ties stay in catalogue order.
            scored.sort_by(|a, b| b.0.cmp(&a.0));
        }

        scored.into_iter().map(|(_, key)| key.clone()).collect()
    }
}

impl Default for FuzzyFilter {
    fn default() -> Self {
        Self::new(FilterOrder::default())
    }
}

impl fmt::Debug for FuzzyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuzzyFilter")
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use test_case::test_case;

    fn catalogue(names: &[&str]) -> Vec<LabelKey> {
        names.iter().copied().map(LabelKey::new).collect()
    }

    fn names(keys: &[LabelKey]) -> Vec<&str> {
        keys.iter().map(LabelKey::name).collect()
    }

    fn is_subsequence(needle: &str, haystack: &str) -> bool {
        let mut hay = haystack.chars();
        needle.chars().all(|c| hay.any(|h| h == c))
    }

    const KEYS: &[&str] = &[
        "beta.kubernetes.io/arch",
        "env",
        "kubernetes.io/hostname",
        "node.kubernetes.io/instance-type",
        "topology.kubernetes.io/zone",
        "zone",
    ];

    #[test]
    fn test_empty_query_passes_through() {
        let keys = catalogue(KEYS);
        assert_eq!(FuzzyFilter::default().filter("", &keys), keys);
    }

    #[test]
    fn test_empty_catalogue_gives_empty_result() {
        let filter = FuzzyFilter::default();
        assert!(filter.filter("", &[]).is_empty());
        assert!(filter.filter("zone", &[]).is_empty());
    }

    #[test_case("z", &["topology.kubernetes.io/zone", "zone"] ; "single char")]
    #[test_case("hstnm", &["kubernetes.io/hostname"] ; "gapped subsequence")]
    #[test_case("ENV", &[] ; "case sensitive")]
    #[test_case("xyz", &[] ; "no match")]
    fn test_catalogue_order_matches(query: &str, expected: &[&str]) {
        let keys = catalogue(KEYS);
        let result = FuzzyFilter::new(FilterOrder::Catalogue).filter(query, &keys);
        assert_eq!(names(&result), expected);
    }

    #[test]
    fn test_scenario_query_z() {
        let keys = catalogue(&["env", "zone"]);
        let result = FuzzyFilter::default().filter("z", &keys);
        assert_eq!(names(&result), vec!["zone"]);
    }

    #[test]
    fn test_score_order_prefers_tighter_match() {
        let keys = catalogue(&["aexnxv", "env"]);

        let by_catalogue = FuzzyFilter::new(FilterOrder::Catalogue).filter("env", &keys);
        assert_eq!(names(&by_catalogue), vec!["aexnxv", "env"]);

        let by_score = FuzzyFilter::new(FilterOrder::Score).filter("env", &keys);
        assert_eq!(names(&by_score), vec!["env", "aexnxv"]);
    }

    proptest! {
        #[test]
        fn matches_are_subsequences(
            names in prop::collection::btree_set("[a-cA-C./]{0,8}", 0..12),
            query in "[a-cA-C]{0,3}",
        ) {
            let keys: Vec<LabelKey> = names.into_iter().map(LabelKey::new).collect();
            for order in [FilterOrder::Catalogue, FilterOrder::Score] {
                let result = FuzzyFilter::new(order).filter(&query, &keys);

                let mut seen = HashSet::new();
                for key in &result {
                    prop_assert!(is_subsequence(&query, key.name()));
                    prop_assert!(keys.contains(key));
                    prop_assert!(seen.insert(key.name().to_string()));
                }
            }
        }

        #[test]
        fn empty_query_is_identity(names in prop::collection::btree_set("[a-z./]{1,8}", 0..12)) {
            let keys: Vec<LabelKey> = names.into_iter().map(LabelKey::new).collect();
            prop_assert_eq!(FuzzyFilter::new(FilterOrder::Score).filter("", &keys), keys);
        }
    }
}
