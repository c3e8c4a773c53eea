//! Test utilities shared across unit and integration tests.
//!
//! This module is always compiled but hidden from documentation.
//! It provides canonical implementations of test helpers to avoid duplication.

#![doc(hidden)]

use crate::config::MatchOptions;
use crate::fuzzy_match::FuzzyMatch;
use crate::tokenizer::PenaltyTokens;
use crate::types::DEFAULT_MAX_TOKENS_IN_PATTERN;

/// Sentences that share almost nothing with typical test queries. Padding a
/// small corpus with them keeps BM25 idf values positive.
pub const FILLER: [&str; 4] = [
    "quarterly revenue grew",
    "press enter to continue",
    "mountains are tall",
    "bring an umbrella",
];

/// Build a finalized matcher whose entry ids are `"0"`, `"1"`, ...
///
/// This is the canonical implementation used across all tests.
pub fn build_matcher(texts: &[&str]) -> FuzzyMatch {
    build_matcher_with(texts, PenaltyTokens::NONE)
}

/// [`build_matcher`] with a penalty-token mask.
pub fn build_matcher_with(texts: &[&str], penalty_tokens: PenaltyTokens) -> FuzzyMatch {
    let mut fm = FuzzyMatch::new(penalty_tokens, DEFAULT_MAX_TOKENS_IN_PATTERN);
    for (i, text) in texts.iter().enumerate() {
        fm.add_tm(i.to_string(), text, false)
            .unwrap_or_else(|e| panic!("entry {} ({:?}): {}", i, text, e));
    }
    fm.sort().expect("non-empty test corpus");
    fm
}

/// Default options at a given threshold.
pub fn options(fuzzy: f32) -> MatchOptions {
    MatchOptions {
        fuzzy,
        ..MatchOptions::default()
    }
}

/// `(id, score)` pairs of a query, for compact assertions.
pub fn scores(fm: &FuzzyMatch, query: &str, options: &MatchOptions) -> Vec<(String, f32)> {
    fm.match_sentence(query, options)
        .expect("valid query")
        .into_iter()
        .map(|m| (m.id.to_string(), m.score))
        .collect()
}
