use captrend::{TrendPipeline, NOISE};
use proptest::prelude::*;

const WORDS: &[&str] = &[
    "grill", "charcoal", "night", "coffee", "latte", "beach", "sunset", "sale", "promo", "vibes",
];

fn caption() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS.to_vec()), 1..6)
        .prop_map(|words| words.join(" "))
}

proptest! {
    #[test]
    fn prop_labels_align_and_clusters_are_well_formed(
        texts in prop::collection::vec(caption(), 0..12)
    ) {
        let pipeline = TrendPipeline::default();
        let response = pipeline.detect(&texts).unwrap();

        prop_assert_eq!(response.labels.len(), texts.len());

        for summary in &response.clusters {
            prop_assert_ne!(summary.cluster, NOISE);
            prop_assert!(summary.top_terms.len() <= 8);
        }

        let ids: Vec<i32> = response.clusters.iter().map(|s| s.cluster).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        prop_assert_eq!(ids, sorted);
    }

    #[test]
    fn prop_detection_is_deterministic(
        texts in prop::collection::vec(caption(), 0..10)
    ) {
        let pipeline = TrendPipeline::default();
        let first = pipeline.detect(&texts).unwrap();
        let second = pipeline.detect(&texts).unwrap();
        prop_assert_eq!(first, second);
    }
}
