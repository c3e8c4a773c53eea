//! BM25 shortlist: bounded top-K over sparse BM25 scores.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use tracing::trace;

use super::{Candidate, FilterBounds, FilterMatches};
use crate::bm25::{Bm25, SparseVector};
use crate::config::ScoreScale;
use crate::edit_distance::EditCosts;
use crate::types::{SentenceId, WordId};

/// Heap entry: higher score wins, lower sentence id breaks ties.
#[derive(Debug, Clone, Copy)]
struct Scored {
    score: f32,
    s_id: SentenceId,
}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scored {}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.s_id.cmp(&self.s_id))
    }
}

/// Top-K filter over a finalized [`Bm25`] engine.
#[derive(Debug)]
pub struct Bm25Matches<'a> {
    bm25: &'a Bm25,
    bounds: FilterBounds,
    buffer: usize,
    cutoff_threshold: f32,
    scale: ScoreScale,
    best_matches: Vec<(SentenceId, i32)>,
}

impl<'a> Bm25Matches<'a> {
    pub fn new(
        fuzzy: f32,
        p_length: usize,
        min_seq_len: usize,
        bm25: &'a Bm25,
        buffer: usize,
        cutoff_threshold: f32,
        scale: ScoreScale,
    ) -> Self {
        Self {
            bm25,
            bounds: FilterBounds::new(fuzzy, p_length, min_seq_len),
            buffer,
            cutoff_threshold,
            scale,
            best_matches: Vec::new(),
        }
    }

    /// `(sentence, scaled score)` in descending score order.
    pub fn get_best_matches(&self) -> Vec<(SentenceId, i32)> {
        self.best_matches.clone()
    }

    /// Contribution of each of `unique_pattern_wids` (weighted by `counts`)
    /// to the BM25 score of `s_id`.
    pub fn cover(&self, unique_pattern_wids: &[WordId], counts: &[u32], s_id: SentenceId) -> Vec<f32> {
        let pattern = SparseVector::from_pairs(
            unique_pattern_wids
                .iter()
                .zip(counts)
                .map(|(&wid, &count)| (wid, count as f32)),
        );
        let coverage = self.bm25.get_cover(&pattern, s_id);
        unique_pattern_wids
            .iter()
            .map(|&wid| coverage.get(wid))
            .collect()
    }
}

impl FilterMatches for Bm25Matches<'_> {
    fn register_pattern(&mut self, pattern: &[WordId], _costs: &EditCosts) {
        let scores = self.bm25.compute_product(&SparseVector::from_counts(pattern));

        let mut k_best: BinaryHeap<Reverse<Scored>> = BinaryHeap::with_capacity(self.buffer + 1);
        for (s_id, score) in scores.iter() {
            if score > self.cutoff_threshold {
                k_best.push(Reverse(Scored { score, s_id }));
                if k_best.len() > self.buffer {
                    k_best.pop();
                }
            }
        }

        // ascending Reverse order is descending score order
        self.best_matches = k_best
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(entry)| (entry.s_id, self.scale.apply(entry.score)))
            .collect();

        trace!(
            candidates = scores.len(),
            kept = self.best_matches.len(),
            "bm25 shortlist"
        );
    }

    fn candidates(&self) -> Vec<Candidate> {
        self.best_matches
            .iter()
            .map(|&(s_id, _)| Candidate { s_id, max_match: 0 })
            .collect()
    }

    fn bounds(&self) -> &FilterBounds {
        &self.bounds
    }

    fn term_cover(&self, words: &[WordId], counts: &[u32], s_id: SentenceId) -> Option<Vec<f32>> {
        Some(self.cover(words, counts, s_id))
    }
}
