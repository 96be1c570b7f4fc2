use proptest::prelude::*;
use tf_idf_personalizer::{
    cosine_similarity,
    personalize::rank,
    utils::scaler::min_max_scale,
    BlendWeights, SearchResult, SpVec,
};

fn unit() -> impl Strategy<Value = f64> {
    0.0f64..=1.0
}

proptest! {
    #[test]
    fn min_max_spans_unit_interval(values in prop::collection::vec(-1e6f64..1e6, 1..64)) {
        let scaled = min_max_scale(&values);
        prop_assert_eq!(scaled.len(), values.len());
        prop_assert!(scaled.iter().all(|v| (0.0..=1.0).contains(v)));

        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if max > min {
            prop_assert!(scaled.contains(&0.0));
            prop_assert!(scaled.contains(&1.0));
        } else {
            prop_assert!(scaled.iter().all(|v| *v == 0.0));
        }
    }

    #[test]
    fn constant_batch_is_all_zero(value in -1e6f64..1e6, n in 1usize..32) {
        prop_assert!(min_max_scale(&vec![value; n]).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn blend_stays_in_bounds_and_sorted(
        components in prop::collection::vec((unit(), unit(), unit()), 0..40),
        top_k in 1usize..20,
    ) {
        let results: Vec<SearchResult> = (0..components.len())
            .map(|i| SearchResult::new(i.to_string(), i as f64, "text"))
            .collect();
        let n: Vec<f64> = components.iter().map(|c| c.0).collect();
        let t: Vec<f64> = components.iter().map(|c| c.1).collect();
        let m: Vec<f64> = components.iter().map(|c| c.2).collect();

        let ranked = rank(&results, &n, &t, &m, &BlendWeights::default(), top_k, 6);
        prop_assert_eq!(ranked.len(), components.len().min(top_k));
        prop_assert!(ranked.iter().all(|r| (0.0..=1.0).contains(&r.blended_score)));
        prop_assert!(ranked.windows(2).all(|w| w[0].blended_score >= w[1].blended_score));
    }

    #[test]
    fn cosine_of_non_negative_vectors_is_a_unit_score(
        a in prop::collection::vec(0.0f64..10.0, 1..16),
        b in prop::collection::vec(0.0f64..10.0, 1..16),
    ) {
        let len = a.len().min(b.len());
        let c = cosine_similarity(&SpVec::from_dense(&a[..len]), &SpVec::from_dense(&b[..len]));
        prop_assert!((0.0..=1.0).contains(&c));
    }
}
