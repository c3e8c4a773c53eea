// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Candidate filters: cheap shortlisting before edit-distance scoring.
//!
//! Two variants share the [`FilterMatches`] capability:
//!
//! | Filter            | Evidence                       | Shortlist size        |
//! |-------------------|--------------------------------|-----------------------|
//! | [`NGramMatches`]  | exact n-grams (suffix array)   | every viable sentence |
//! | [`Bm25Matches`]   | BM25 term overlap              | at most `buffer`      |
//!
//! Which one runs is the caller's choice through
//! [`FilterStrategy`](crate::config::FilterStrategy).

mod bm25;
mod ngram;

pub use bm25::Bm25Matches;
pub use ngram::{compute_min_exact_match, AgendaItem, NGramMatches};

use crate::edit_distance::EditCosts;
use crate::types::{SentenceId, WordId};

/// Tolerance added before flooring the allowed length difference.
const LENGTH_EPSILON: f32 = 0.00005;

/// Bounds derived from the pattern length and the fuzzy ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterBounds {
    pub p_length: usize,
    pub min_seq_len: usize,
    /// Edits tolerated at this fuzzy ratio.
    pub differences: usize,
    /// Largest `|p_length - sentence_length|` a candidate may have.
    pub max_differences_with_pattern: usize,
    /// Shortest exact run a viable candidate must share with the pattern.
    pub min_exact_match: usize,
}

impl FilterBounds {
    pub fn new(fuzzy: f32, p_length: usize, min_seq_len: usize) -> Self {
        let slack = p_length as f32 * (1.0 - fuzzy);
        Self {
            p_length,
            min_seq_len,
            differences: slack.ceil() as usize,
            max_differences_with_pattern: (slack + LENGTH_EPSILON).floor() as usize,
            min_exact_match: compute_min_exact_match(fuzzy, p_length),
        }
    }

    /// Whether a sentence of `length` tokens can still reach the threshold.
    pub fn accepts_length(&self, length: usize) -> bool {
        self.p_length.abs_diff(length) <= self.max_differences_with_pattern
    }
}

/// A shortlisted sentence and the evidence that put it there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub s_id: SentenceId,
    /// Longest exact n-gram seen by the filter; `0` when the filter does not
    /// track n-grams.
    pub max_match: usize,
}

/// Shortlists candidate sentences for one pattern.
pub trait FilterMatches {
    /// Collect evidence for `pattern`. Called once per query.
    fn register_pattern(&mut self, pattern: &[WordId], costs: &EditCosts);

    /// Shortlisted sentences, ordered by sentence id for the n-gram filter
    /// and by descending BM25 score for the BM25 filter.
    fn candidates(&self) -> Vec<Candidate>;

    fn bounds(&self) -> &FilterBounds;

    /// Per-word score contribution at `s_id`, for filters that can explain
    /// their scores.
    fn term_cover(&self, _words: &[WordId], _counts: &[u32], _s_id: SentenceId) -> Option<Vec<f32>> {
        None
    }
}
