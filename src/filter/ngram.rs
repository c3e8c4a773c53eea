//! N-gram agenda: per-sentence evidence from exact suffix-array matches.
//!
//! Suffix ranges arrive longest first. The first range that reaches a
//! sentence sets its high-water mark; later ranges only extend coverage
//! past that mark, so coverage counts distinct pattern positions and not
//! matches found.
//!
//! Pruning uses the pigeonhole bound of [`compute_min_exact_match`]: with at
//! most `d` edits the pattern splits into at most `d + 1` exact runs, so one
//! run has length `>= ceil((L - d) / (d + 1))`.

use std::ops::ControlFlow;

use ahash::AHashMap;

use super::{Candidate, FilterBounds, FilterMatches};
use crate::edit_distance::EditCosts;
use crate::index::SuffixArrayIndex;
use crate::types::{SentenceId, WordId};

/// Shortest exact run any match at ratio `fuzzy` must contain.
pub fn compute_min_exact_match(fuzzy: f32, p_length: usize) -> usize {
    let differences = (p_length as f32 * (1.0 - fuzzy)).ceil() as usize;
    let remaining = p_length.saturating_sub(differences);
    remaining.div_ceil(differences + 1)
}

/// Evidence accumulated for one corpus sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaItem {
    pub sentence_id: SentenceId,
    /// Longest match registered so far.
    pub maxmatch: usize,
    /// Number of `true` entries in `map_pattern`.
    pub coverage: usize,
    pub map_pattern: Vec<bool>,
}

impl AgendaItem {
    fn new(sentence_id: SentenceId, p_length: usize) -> Self {
        Self {
            sentence_id,
            maxmatch: 0,
            coverage: 0,
            map_pattern: vec![false; p_length],
        }
    }

    fn extend_to(&mut self, match_length: usize) {
        if match_length <= self.maxmatch {
            return;
        }
        for covered in &mut self.map_pattern[self.maxmatch..match_length] {
            if !*covered {
                *covered = true;
                self.coverage += 1;
            }
        }
        self.maxmatch = match_length;
    }
}

/// Agenda engine over a sorted [`SuffixArrayIndex`].
#[derive(Debug)]
pub struct NGramMatches<'a> {
    index: &'a SuffixArrayIndex,
    bounds: FilterBounds,
    agenda: AHashMap<SentenceId, AgendaItem>,
}

impl<'a> NGramMatches<'a> {
    pub fn new(fuzzy: f32, p_length: usize, min_seq_len: usize, index: &'a SuffixArrayIndex) -> Self {
        Self {
            index,
            bounds: FilterBounds::new(fuzzy, p_length, min_seq_len),
            agenda: AHashMap::with_capacity(p_length),
        }
    }

    /// Register slots `[begin, end)` of the suffix array, all matching the
    /// pattern on exactly `match_length` tokens.
    ///
    /// Must be called in non-increasing `match_length` order. Returns
    /// `Break` once `match_length` is below the pruning threshold, since no
    /// later range can be longer.
    pub fn register_suffix_range(
        &mut self,
        begin: usize,
        end: usize,
        match_length: usize,
    ) -> ControlFlow<()> {
        if match_length < self.bounds.min_exact_match || match_length < self.bounds.min_seq_len {
            return ControlFlow::Break(());
        }
        let match_length = match_length.min(self.bounds.p_length);

        for slot in begin..end {
            if !self.bounds.accepts_length(self.index.sentence_length(slot)) {
                continue;
            }
            let s_id = self.index.sentence_id(slot);
            let p_length = self.bounds.p_length;
            self.agenda
                .entry(s_id)
                .or_insert_with(|| AgendaItem::new(s_id, p_length))
                .extend_to(match_length);
        }
        ControlFlow::Continue(())
    }

    pub fn agenda(&self) -> &AHashMap<SentenceId, AgendaItem> {
        &self.agenda
    }

    pub fn sentence_count(&self) -> usize {
        self.agenda.len()
    }
}

impl FilterMatches for NGramMatches<'_> {
    fn register_pattern(&mut self, pattern: &[WordId], _costs: &EditCosts) {
        let index = self.index;
        index.for_each_suffix_range(pattern, |range| {
            self.register_suffix_range(range.begin, range.end, range.match_length)
        });
    }

    fn candidates(&self) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = self
            .agenda
            .values()
            .map(|item| Candidate {
                s_id: item.sentence_id,
                max_match: item.maxmatch,
            })
            .collect();
        candidates.sort_unstable_by_key(|c| c.s_id);
        candidates
    }

    fn bounds(&self) -> &FilterBounds {
        &self.bounds
    }
}
