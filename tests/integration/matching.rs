//! End-to-end fuzzy matching through the public API.

use super::common::{
    approx, assert_well_ranked, build_matcher, build_matcher_with, menu_matcher, options, scores,
    TM,
};
use fuzzytm::{FilterStrategy, MatchOptions, PenaltyTokens, SubsequenceOptions};

// ============================================================================
// FUZZY MATCHING
// ============================================================================

#[test]
fn exact_entry_ranks_first_with_full_score() {
    let fm = build_matcher(&TM);
    let results = scores(&fm, "the cat sat on the mat", &options(0.5));
    assert_eq!(results.len(), 2);
    assert_eq!(results[0], ("0".to_string(), 1.0));
    assert_eq!(results[1].0, "1");
    assert!(approx(results[1].1, 1.0 - 1.0 / 6.0));
}

#[test]
fn threshold_drops_weaker_matches() {
    let fm = build_matcher(&TM);
    let results = scores(&fm, "the cat sat on the mat", &options(0.9));
    assert_eq!(results, vec![("0".to_string(), 1.0)]);
}

#[test]
fn unknown_query_words_count_as_edits() {
    let fm = build_matcher(&TM);
    let results = scores(&fm, "the cat sat on the rug", &options(0.6));
    let ids: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, ["0", "1"]);
    assert!(approx(results[0].1, 5.0 / 6.0));
    assert!(approx(results[1].1, 4.0 / 6.0));
}

#[test]
fn idf_penalty_punishes_missing_rare_words() {
    let fm = build_matcher(&TM);
    let options = MatchOptions {
        fuzzy: 0.6,
        vocab_idf_penalty: 0.5,
        ..MatchOptions::default()
    };
    let matches = fm.match_sentence("the cat sat on the rug", &options).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, "0");
    assert!(approx(matches[0].penalty, 0.5 / 6.0));
    assert!(approx(matches[0].score, 5.0 / 6.0 - 0.5 / 6.0));
}

#[test]
fn pretokenized_queries_match_like_text() {
    let fm = build_matcher(&TM);
    let tokens = ["the", "cat", "sat", "on", "the", "mat"];
    let from_tokens = fm.match_tokens(&tokens, &options(0.5)).unwrap();
    let from_text = fm.match_sentence("the cat sat on the mat", &options(0.5)).unwrap();
    assert_eq!(from_tokens, from_text);
}

#[test]
fn no_perfect_skips_identical_entries() {
    let fm = build_matcher(&TM);
    let options = MatchOptions {
        fuzzy: 0.5,
        no_perfect: true,
        ..MatchOptions::default()
    };
    let results = scores(&fm, "the cat sat on the mat", &options);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0, "1");
}

#[test]
fn number_of_matches_truncates() {
    let fm = build_matcher(&TM);
    let options = MatchOptions {
        fuzzy: 0.5,
        number_of_matches: 1,
        ..MatchOptions::default()
    };
    let matches = fm.match_sentence("the cat sat on the mat", &options).unwrap();
    assert_eq!(matches.len(), 1);
    assert_well_ranked(&matches, &options);
}

// ============================================================================
// PENALTY TOKENS
// ============================================================================

#[test]
fn numbers_match_loosely_with_a_penalty() {
    let fm = build_matcher_with(&["Order 12 units", "Order 15 boxes"], PenaltyTokens::NBR);
    let matches = fm.match_sentence("Order 13 units", &options(0.5)).unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].id, "0");
    assert!(approx(matches[0].penalty, 0.1 / 3.0));
    assert!(approx(matches[0].score, 1.0 - 0.1 / 3.0));
    assert_eq!(matches[1].id, "1");
    assert!(approx(matches[1].score, 2.0 / 3.0 - 0.1 / 3.0));
}

#[test]
fn without_number_class_different_numbers_break_runs() {
    let fm = build_matcher(&["Order 12 units", "Order 15 boxes"]);
    assert!(scores(&fm, "Order 13 units", &options(0.5)).is_empty());
}

#[test]
fn case_differences_are_penalized_per_token() {
    let fm = build_matcher_with(&["Hello World"], PenaltyTokens::CAS);
    let matches = fm.match_sentence("hello world", &options(0.5)).unwrap();
    assert_eq!(matches.len(), 1);
    assert!(approx(matches[0].score, 0.9));

    // the same surface costs nothing
    let matches = fm.match_sentence("Hello World", &options(0.5)).unwrap();
    assert_eq!(matches[0].score, 1.0);
}

// ============================================================================
// FILTERS
// ============================================================================

#[test]
fn bm25_filter_agrees_with_ngram_filter_on_small_corpus() {
    let fm = menu_matcher();
    let ngram = scores(&fm, "close the file menu", &options(0.5));
    let bm25 = scores(
        &fm,
        "close the file menu",
        &MatchOptions {
            fuzzy: 0.5,
            filter: FilterStrategy::bm25(5),
            ..MatchOptions::default()
        },
    );
    assert_eq!(ngram, bm25);
    assert_eq!(ngram[0], ("1".to_string(), 1.0));
    assert_eq!(ngram[1], ("0".to_string(), 0.75));
}

#[test]
fn bm25_buffer_bounds_the_candidates() {
    let fm = menu_matcher();
    let options = MatchOptions {
        fuzzy: 0.5,
        filter: FilterStrategy::bm25(1),
        ..MatchOptions::default()
    };
    let results = scores(&fm, "close the file menu", &options);
    assert_eq!(results, vec![("1".to_string(), 1.0)]);
}

// ============================================================================
// CONTRASTIVE RANKING
// ============================================================================

#[test]
fn contrastive_ranking_keeps_the_best_first_and_only_lowers_scores() {
    let fm = build_matcher(&TM);
    let plain = fm.match_sentence("the cat sat on the mat", &options(0.5)).unwrap();
    let contrast = fm
        .match_sentence(
            "the cat sat on the mat",
            &MatchOptions {
                fuzzy: 0.5,
                contrastive_factor: 0.5,
                ..MatchOptions::default()
            },
        )
        .unwrap();

    assert_eq!(contrast.len(), plain.len());
    assert_eq!(contrast[0], plain[0]);
    for m in &contrast {
        let original = plain.iter().find(|p| p.s_id == m.s_id).unwrap();
        assert!(m.score <= original.score);
    }
}

// ============================================================================
// SUBSEQUENCE
// ============================================================================

#[test]
fn subsequence_finds_shared_runs_regardless_of_edit_cost() {
    let fm = build_matcher(&TM);
    let matches = fm
        .subsequence("the file menu is open", &SubsequenceOptions::default())
        .unwrap();
    let found: Vec<(&str, usize)> = matches.iter().map(|m| (m.id, m.max_subseq)).collect();
    assert_eq!(found, [("3", 3), ("4", 3)]);
    assert!(matches.iter().all(|m| approx(m.score, 0.6)));
}

#[test]
fn subsequence_ratio_gate() {
    let fm = build_matcher(&TM);
    let options = SubsequenceOptions {
        min_subseq_ratio: 0.7,
        ..SubsequenceOptions::default()
    };
    assert!(fm.subsequence("the file menu is open", &options).unwrap().is_empty());
}

#[test]
fn subsequence_with_bm25_filter_and_idf_weighting_stays_in_range() {
    let fm = menu_matcher();
    let options = SubsequenceOptions {
        min_subseq_length: 2,
        idf_weighting: true,
        filter: FilterStrategy::bm25(5),
        ..SubsequenceOptions::default()
    };
    let matches = fm.subsequence("reopen the file menu", &options).unwrap();
    let ids: Vec<&str> = matches.iter().map(|m| m.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"0") && ids.contains(&"1"));
    assert!(matches.iter().all(|m| (0.0..=1.0).contains(&m.score)));
}
