//! BM25 shortlist properties against a brute-force ranking.

use fuzzytm::{Bm25Matches, EditCosts, FilterMatches, ScoreScale, SparseVector};
use proptest::prelude::*;

use super::common::{bm25_of, corpus_ids_strategy, pattern_ids_strategy};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_shortlist_is_exact_top_k(
        corpus in corpus_ids_strategy(),
        pattern in pattern_ids_strategy(),
        buffer in 1usize..15,
        cutoff in -1.0f32..1.0,
    ) {
        let bm25 = bm25_of(&corpus);
        let mut filter = Bm25Matches::new(
            0.0, pattern.len(), 1, &bm25, buffer, cutoff, ScoreScale::default(),
        );
        filter.register_pattern(&pattern, &EditCosts::default());
        let best = filter.get_best_matches();

        let mut expected: Vec<(u32, f32)> = bm25
            .compute_product(&SparseVector::from_counts(&pattern))
            .iter()
            .filter(|&(_, score)| score > cutoff)
            .collect();
        expected.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        expected.truncate(buffer);

        let got: Vec<u32> = best.iter().map(|&(s_id, _)| s_id).collect();
        let want: Vec<u32> = expected.iter().map(|&(s_id, _)| s_id).collect();
        prop_assert_eq!(got, want);
        prop_assert!(best.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn prop_cover_sums_to_score(
        corpus in corpus_ids_strategy(),
        pattern in pattern_ids_strategy(),
    ) {
        let bm25 = bm25_of(&corpus);
        let filter = Bm25Matches::new(0.0, pattern.len(), 1, &bm25, 5, 0.0, ScoreScale::default());
        let mut words = pattern.clone();
        words.sort_unstable();
        words.dedup();
        let counts: Vec<u32> = words
            .iter()
            .map(|w| pattern.iter().filter(|p| *p == w).count() as u32)
            .collect();

        let scores = bm25.compute_product(&SparseVector::from_counts(&pattern));
        for (s_id, score) in scores.iter() {
            let total: f32 = filter.cover(&words, &counts, s_id).iter().sum();
            prop_assert!((total - score).abs() <= 1e-3 * score.abs().max(1.0));
        }
    }
}
