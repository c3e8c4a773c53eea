//! End-to-end matcher properties over random text corpora.

use fuzzytm::{FuzzyMatch, MatchOptions, PenaltyTokens, DEFAULT_MAX_TOKENS_IN_PATTERN};
use proptest::prelude::*;

use super::common::{assert_well_ranked, text_corpus_strategy};

fn build(corpus: &[String], sort_each: bool) -> FuzzyMatch {
    let mut fm = FuzzyMatch::new(PenaltyTokens::NONE, DEFAULT_MAX_TOKENS_IN_PATTERN);
    for (i, text) in corpus.iter().enumerate() {
        fm.add_tm(i.to_string(), text, sort_each).unwrap();
    }
    fm.sort().unwrap();
    fm
}

fn summary(fm: &FuzzyMatch, query: &str, options: &MatchOptions) -> Vec<(u32, f32)> {
    fm.match_sentence(query, options)
        .unwrap()
        .into_iter()
        .map(|m| (m.s_id, m.score))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_corpus_entry_matches_itself(corpus in text_corpus_strategy(), pick in any::<prop::sample::Index>()) {
        let fm = build(&corpus, false);
        let query = &corpus[pick.index(corpus.len())];
        let options = MatchOptions { fuzzy: 1.0, min_subseq_length: 1, ..MatchOptions::default() };

        let matches = fm.match_sentence(query, &options).unwrap();
        prop_assert!(!matches.is_empty());
        prop_assert_eq!(matches[0].score, 1.0);
        let text = fm.sentence_text(matches[0].s_id);
        prop_assert_eq!(text.as_deref(), Some(query.as_str()));
    }

    #[test]
    fn prop_results_are_well_ranked(
        corpus in text_corpus_strategy(),
        query in text_corpus_strategy(),
        fuzzy in 0.0f32..1.0,
        contrast in prop::sample::select(vec![0.0f32, 0.5]),
    ) {
        let fm = build(&corpus, false);
        let options = MatchOptions {
            fuzzy,
            contrastive_factor: contrast,
            min_subseq_length: 1,
            ..MatchOptions::default()
        };
        let matches = fm.match_sentence(&query[0], &options).unwrap();
        assert_well_ranked(&matches, &options);
    }

    #[test]
    fn prop_reload_preserves_results(corpus in text_corpus_strategy(), query in text_corpus_strategy()) {
        let fm = build(&corpus, false);
        let loaded = FuzzyMatch::from_bytes(&fm.to_bytes().unwrap()).unwrap();
        let options = MatchOptions { fuzzy: 0.3, min_subseq_length: 1, ..MatchOptions::default() };
        for q in &query {
            prop_assert_eq!(summary(&fm, q, &options), summary(&loaded, q, &options));
        }
    }

    #[test]
    fn prop_incremental_build_equals_batch(corpus in text_corpus_strategy()) {
        let batch = build(&corpus, false);
        let incremental = build(&corpus, true);
        prop_assert_eq!(batch.to_bytes().unwrap(), incremental.to_bytes().unwrap());
    }

    #[test]
    fn prop_sort_is_idempotent(corpus in text_corpus_strategy()) {
        let mut fm = build(&corpus, false);
        let before = fm.to_bytes().unwrap();
        fm.sort().unwrap();
        prop_assert_eq!(before, fm.to_bytes().unwrap());
    }
}
