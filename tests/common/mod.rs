//! Shared test utilities and fixtures.

#![allow(dead_code)]

use fuzzytm::{Match, MatchOptions};

// Re-export canonical test utilities from fuzzytm::testing
pub use fuzzytm::testing::{build_matcher, build_matcher_with, options, scores, FILLER};

// ============================================================================
// FIXTURES
// ============================================================================

/// A small software-UI translation memory.
pub const TM: [&str; 6] = [
    "the cat sat on the mat",
    "the dog sat on the mat",
    "a cat ran across the road",
    "open the file menu",
    "close the file menu",
    "press the red button to start",
];

/// Entries without a word shared by more than half of them once padded with
/// [`FILLER`], so every BM25 idf is non-negative.
pub const MENU_TM: [&str; 4] = [
    "open the file menu",
    "close the file menu",
    "save the current document",
    "print the current page",
];

pub fn menu_matcher() -> fuzzytm::FuzzyMatch {
    let corpus: Vec<&str> = MENU_TM.iter().chain(FILLER.iter()).copied().collect();
    build_matcher(&corpus)
}

// ============================================================================
// ASSERTIONS
// ============================================================================

/// Results are bounded, sorted, within `[0, 1]`, above the threshold and
/// free of duplicates.
pub fn assert_well_ranked(matches: &[Match<'_>], options: &MatchOptions) {
    assert!(
        matches.len() <= options.number_of_matches,
        "{} matches for nmatch {}",
        matches.len(),
        options.number_of_matches
    );
    for m in matches {
        assert!((0.0..=1.0).contains(&m.score), "score {} out of range", m.score);
        if options.contrastive_factor == 0.0 {
            assert!(m.score + 1e-5 >= options.fuzzy, "score {} below {}", m.score, options.fuzzy);
        }
    }
    for pair in matches.windows(2) {
        assert!(pair[0].score >= pair[1].score, "not sorted: {:?}", pair);
    }
    let mut ids: Vec<u32> = matches.iter().map(|m| m.s_id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), matches.len(), "duplicate entries");
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

// ============================================================================
// STRATEGIES
// ============================================================================

use fuzzytm::{Bm25, Bm25Params, SuffixArrayIndex, WordId};
use proptest::prelude::*;

/// Largest word id the id strategies produce.
pub const MAX_WORD_ID: WordId = 8;

/// Corpus sentences over a small alphabet, so runs are frequent.
pub fn corpus_ids_strategy() -> impl Strategy<Value = Vec<Vec<WordId>>> {
    prop::collection::vec(prop::collection::vec(2..=MAX_WORD_ID, 1..8), 1..12)
}

/// Patterns may contain the unknown-word id, which no corpus sentence has.
pub fn pattern_ids_strategy() -> impl Strategy<Value = Vec<WordId>> {
    prop::collection::vec(1..=MAX_WORD_ID, 1..8)
}

/// Short lowercase sentences for end-to-end properties.
pub fn text_corpus_strategy() -> impl Strategy<Value = Vec<String>> {
    let word = prop::sample::select(vec!["a", "b", "c", "d", "e", "ab", "cd", "ee"]);
    let sentence = prop::collection::vec(word, 1..7).prop_map(|words| words.join(" "));
    prop::collection::vec(sentence, 1..10)
}

pub fn index_of(corpus: &[Vec<WordId>]) -> SuffixArrayIndex {
    let mut index = SuffixArrayIndex::new();
    for sentence in corpus {
        index.add_sentence(sentence);
    }
    index.sort(MAX_WORD_ID as usize + 1);
    index
}

pub fn bm25_of(corpus: &[Vec<WordId>]) -> Bm25 {
    let mut bm25 = Bm25::new(Bm25Params::default());
    for sentence in corpus {
        bm25.add_sentence(sentence);
    }
    bm25.sort(MAX_WORD_ID as usize + 1).unwrap();
    bm25
}
