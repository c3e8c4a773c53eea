// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Arbitrary corpora, queries and options through the full matcher.

#![no_main]

use arbitrary::Arbitrary;
use fuzzytm::{FilterStrategy, FuzzyMatch, MatchOptions, PenaltyTokens, SubsequenceOptions};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    entries: Vec<String>,
    query: String,
    penalty_bits: u8,
    fuzzy: u8,
    contrast: u8,
    bm25: bool,
}

fuzz_target!(|input: Input| {
    let penalty_tokens = PenaltyTokens(input.penalty_bits & PenaltyTokens::ALL.0);
    let mut fm = FuzzyMatch::new(penalty_tokens, 64);
    for (i, text) in input.entries.iter().take(32).enumerate() {
        let _ = fm.add_tm(i.to_string(), text, false);
    }
    if fm.sort().is_err() {
        return;
    }

    let filter = if input.bm25 {
        FilterStrategy::bm25(8)
    } else {
        FilterStrategy::NGram
    };
    let options = MatchOptions {
        fuzzy: f32::from(input.fuzzy) / 255.0,
        contrastive_factor: f32::from(input.contrast) / 255.0,
        filter,
        ..MatchOptions::default()
    };

    if let Ok(matches) = fm.match_sentence(&input.query, &options) {
        assert!(matches.len() <= options.number_of_matches);
        for m in &matches {
            assert!((0.0..=1.0).contains(&m.score));
        }
    }

    let subseq = SubsequenceOptions {
        filter,
        ..SubsequenceOptions::default()
    };
    let _ = fm.subsequence(&input.query, &subseq);
});
