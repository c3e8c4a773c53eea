//! Agenda engine properties.
//!
//! - Every admitted agenda item records the longest shared run exactly
//! - Every sentence that shares a long enough run is admitted
//! - Coverage always equals the number of marked pattern positions

use std::ops::ControlFlow;

use fuzzytm::edit_distance::longest_common_run;
use fuzzytm::{compute_min_exact_match, EditCosts, FilterMatches, NGramMatches, SuffixArrayIndex};
use proptest::prelude::*;

use super::common::{corpus_ids_strategy, index_of, pattern_ids_strategy};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_agenda_records_longest_run(
        corpus in corpus_ids_strategy(),
        pattern in pattern_ids_strategy(),
        fuzzy in 0.0f32..=1.0,
        min_seq in 1usize..4,
    ) {
        let index = index_of(&corpus);
        let p_len = pattern.len();
        let min_seq = min_seq.min(p_len);
        let mut filter = NGramMatches::new(fuzzy, p_len, min_seq, &index);
        filter.register_pattern(&pattern, &EditCosts::default());
        let bounds = *filter.bounds();
        let threshold = bounds.min_exact_match.max(bounds.min_seq_len).max(1);

        for (s_id, sentence) in corpus.iter().enumerate() {
            let run = longest_common_run(&pattern, sentence).0;
            let admitted = filter.agenda().get(&(s_id as u32));
            if bounds.accepts_length(sentence.len()) && run >= threshold {
                let item = admitted.expect("viable sentence missing from agenda");
                prop_assert_eq!(item.maxmatch, run);
            } else {
                prop_assert!(admitted.is_none());
            }
        }
    }

    #[test]
    fn prop_coverage_counts_marked_positions(
        corpus in corpus_ids_strategy(),
        pattern in pattern_ids_strategy(),
        fuzzy in 0.0f32..=1.0,
    ) {
        let index = index_of(&corpus);
        let mut filter = NGramMatches::new(fuzzy, pattern.len(), 1, &index);
        filter.register_pattern(&pattern, &EditCosts::default());

        for item in filter.agenda().values() {
            let marked = item.map_pattern.iter().filter(|&&m| m).count();
            prop_assert_eq!(item.coverage, marked);
            prop_assert!(item.coverage <= pattern.len());
            prop_assert!(item.maxmatch <= pattern.len());
        }
        let candidates = filter.candidates();
        prop_assert!(candidates.windows(2).all(|w| w[0].s_id < w[1].s_id));
        prop_assert_eq!(candidates.len(), filter.sentence_count());
    }

    #[test]
    fn prop_min_exact_match_bounds(fuzzy in 0.0f32..=1.0, len in 0usize..200) {
        let m = compute_min_exact_match(fuzzy, len);
        prop_assert!(m <= len);
    }

    #[test]
    fn prop_ranges_are_ordered_and_exact(
        corpus in corpus_ids_strategy(),
        pattern in pattern_ids_strategy(),
    ) {
        let index = index_of(&corpus);
        let mut last = usize::MAX;
        let mut ok = true;
        index.for_each_suffix_range(&pattern, |range| {
            ok &= range.match_length <= last && range.begin < range.end;
            last = range.match_length;
            let p = &pattern[range.pattern_start..];
            for slot in range.begin..range.end {
                let pos = index.suffixes()[slot] as usize;
                let lcp = index.buffer()[pos..]
                    .iter()
                    .zip(p)
                    .take_while(|(a, b)| a == b)
                    .count();
                ok &= lcp == range.match_length;
            }
            ControlFlow::Continue(())
        });
        prop_assert!(ok);
    }
}

/// Feeding ranges shortest first makes the pruning stop before any
/// evidence is recorded.
#[test]
fn ascending_feed_under_counts() {
    let corpus = vec![vec![2, 3, 4, 5], vec![6, 7]];
    let index: SuffixArrayIndex = index_of(&corpus);
    let pattern = [2, 3, 4, 5];

    let mut ranges = Vec::new();
    index.for_each_suffix_range(&pattern, |r| {
        ranges.push(r);
        ControlFlow::Continue(())
    });

    let mut descending = NGramMatches::new(0.5, 4, 2, &index);
    for r in &ranges {
        if descending.register_suffix_range(r.begin, r.end, r.match_length).is_break() {
            break;
        }
    }

    let mut ascending = NGramMatches::new(0.5, 4, 2, &index);
    for r in ranges.iter().rev() {
        if ascending.register_suffix_range(r.begin, r.end, r.match_length).is_break() {
            break;
        }
    }

    assert_eq!(descending.agenda().get(&0).map(|item| item.coverage), Some(4));
    assert!(ascending.agenda().is_empty());
}
