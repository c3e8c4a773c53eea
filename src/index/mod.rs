// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Generalized suffix array over corpus word ids.
//!
//! Every corpus sentence is appended to one flat buffer and terminated by
//! [`SENTENCE_SEPARATOR`]. The suffix array holds every *word* position of
//! that buffer (separator positions are left out), sorted by the word-id
//! sequence that starts there.
//!
//! # Range enumeration
//!
//! For each start offset `i` of a pattern, the suffix range is narrowed one
//! token at a time. Inside a range all suffixes share the same first `L`
//! tokens, so the next token is sorted too and narrowing is two partition
//! points. The difference between the range at `L` and at `L + 1` is the
//! group of suffixes whose longest match at offset `i` is *exactly* `L`.
//!
//! ```text
//! pattern: the cat sat      offset 0
//! L=1  [the ........]       every suffix starting with "the"
//! L=2  [the cat ....]       narrowed
//! L=3  [the cat sat ]       narrowed
//! exact groups: L=3 → R(3), L=2 → R(2) \ R(3), L=1 → R(1) \ R(2)
//! ```
//!
//! Groups of every offset are emitted together, longest first.
//!
//! # INVARIANTS
//!
//! 1. **SORTED**: after `sort`, `suffixes` is lexicographically sorted
//! 2. **COMPLETE**: every word position of every sentence has one slot
//! 3. **DESCENDING**: `for_each_suffix_range` never emits a longer group after a shorter one

mod sais;

use std::ops::ControlFlow;

use crate::types::{SentenceId, WordId, SENTENCE_SEPARATOR};

pub use sais::suffix_array;

/// Location of one sentence inside the flat buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceSpan {
    pub start: u32,
    pub len: u32,
}

/// A group of suffix-array slots sharing a matched prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuffixRange {
    /// Pattern offset the match starts at.
    pub pattern_start: usize,
    pub begin: usize,
    pub end: usize,
    pub match_length: usize,
}

/// Suffix array and sentence table for the whole corpus.
#[derive(Debug, Clone, Default)]
pub struct SuffixArrayIndex {
    buffer: Vec<WordId>,
    sentences: Vec<SentenceSpan>,
    suffixes: Vec<u32>,
    /// Sentence of each suffix-array slot.
    suffix_sentence: Vec<SentenceId>,
    sorted: bool,
}

impl SuffixArrayIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sentence and return its id. Invalidates the suffix array.
    pub fn add_sentence(&mut self, ids: &[WordId]) -> SentenceId {
        let s_id = self.sentences.len() as SentenceId;
        self.sentences.push(SentenceSpan {
            start: self.buffer.len() as u32,
            len: ids.len() as u32,
        });
        self.buffer.extend_from_slice(ids);
        self.buffer.push(SENTENCE_SEPARATOR);
        self.sorted = false;
        s_id
    }

    /// Build the suffix array. No-op when nothing changed.
    pub fn sort(&mut self, alphabet_size: usize) {
        if self.sorted {
            return;
        }

        let sa = suffix_array(&self.buffer, alphabet_size);
        self.suffixes = sa
            .into_iter()
            .filter(|&pos| self.buffer[pos] != SENTENCE_SEPARATOR)
            .map(|pos| pos as u32)
            .collect();
        self.rebuild_suffix_sentences();
        self.sorted = true;
    }

    fn rebuild_suffix_sentences(&mut self) {
        let starts: Vec<u32> = self.sentences.iter().map(|s| s.start).collect();
        self.suffix_sentence = self
            .suffixes
            .iter()
            .map(|&pos| (starts.partition_point(|&start| start <= pos) - 1) as SentenceId)
            .collect();
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Number of sentences.
    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Word ids of a sentence.
    pub fn sentence(&self, s_id: SentenceId) -> &[WordId] {
        let span = self.sentences[s_id as usize];
        &self.buffer[span.start as usize..(span.start + span.len) as usize]
    }

    pub fn sentence_len(&self, s_id: SentenceId) -> usize {
        self.sentences[s_id as usize].len as usize
    }

    /// Number of suffix-array slots.
    pub fn suffix_count(&self) -> usize {
        self.suffixes.len()
    }

    /// Sentence containing the suffix at `slot`.
    pub fn sentence_id(&self, slot: usize) -> SentenceId {
        self.suffix_sentence[slot]
    }

    /// Length of the sentence containing the suffix at `slot`.
    pub fn sentence_length(&self, slot: usize) -> usize {
        self.sentence_len(self.suffix_sentence[slot])
    }

    /// Flattened `[ids..., SEPARATOR]*` buffer.
    pub fn buffer(&self) -> &[WordId] {
        &self.buffer
    }

    pub fn spans(&self) -> &[SentenceSpan] {
        &self.sentences
    }

    pub fn suffixes(&self) -> &[u32] {
        &self.suffixes
    }

    /// Restore from a flattened buffer and an already sorted suffix array.
    ///
    /// Returns `None` when the parts are inconsistent.
    pub fn from_parts(buffer: Vec<WordId>, suffixes: Vec<u32>) -> Option<Self> {
        if buffer.last().is_some_and(|&last| last != SENTENCE_SEPARATOR) {
            return None;
        }

        let mut sentences = Vec::new();
        let mut start = 0usize;
        for (pos, &id) in buffer.iter().enumerate() {
            if id == SENTENCE_SEPARATOR {
                sentences.push(SentenceSpan {
                    start: start as u32,
                    len: (pos - start) as u32,
                });
                start = pos + 1;
            }
        }

        let words = buffer.len() - sentences.len();
        if suffixes.len() != words
            || suffixes.iter().any(|&pos| {
                buffer
                    .get(pos as usize)
                    .map_or(true, |&id| id == SENTENCE_SEPARATOR)
            })
        {
            return None;
        }

        let mut index = Self {
            buffer,
            sentences,
            suffixes,
            suffix_sentence: Vec::new(),
            sorted: true,
        };
        index.rebuild_suffix_sentences();
        Some(index)
    }

    #[inline]
    fn token_at(&self, pos: usize) -> WordId {
        self.buffer.get(pos).copied().unwrap_or(SENTENCE_SEPARATOR)
    }

    /// Narrow `[lo, hi)` (all sharing `depth` tokens) to suffixes whose next
    /// token is `token`.
    fn narrow(&self, lo: usize, hi: usize, depth: usize, token: WordId) -> (usize, usize) {
        let slots = &self.suffixes[lo..hi];
        let first = slots.partition_point(|&pos| self.token_at(pos as usize + depth) < token);
        let last = slots.partition_point(|&pos| self.token_at(pos as usize + depth) <= token);
        (lo + first, lo + last)
    }

    /// Emit exact-length match groups for `pattern`, longest first.
    ///
    /// Stops as soon as `f` returns `ControlFlow::Break`.
    pub fn for_each_suffix_range<F>(&self, pattern: &[WordId], mut f: F)
    where
        F: FnMut(SuffixRange) -> ControlFlow<()>,
    {
        let mut groups: Vec<SuffixRange> = Vec::new();

        for start in 0..pattern.len() {
            let (mut lo, mut hi) = (0, self.suffixes.len());
            let mut depth = 0;

            while start + depth < pattern.len() {
                let (next_lo, next_hi) = self.narrow(lo, hi, depth, pattern[start + depth]);
                if next_lo == next_hi {
                    break;
                }
                if depth > 0 {
                    push_difference(&mut groups, start, depth, (lo, hi), (next_lo, next_hi));
                }
                lo = next_lo;
                hi = next_hi;
                depth += 1;
            }

            if depth > 0 {
                groups.push(SuffixRange {
                    pattern_start: start,
                    begin: lo,
                    end: hi,
                    match_length: depth,
                });
            }
        }

        groups.sort_by(|a, b| b.match_length.cmp(&a.match_length));

        for group in groups {
            if f(group).is_break() {
                break;
            }
        }
    }
}

/// Push `outer \ inner` as at most two ranges of exact length `depth`.
fn push_difference(
    groups: &mut Vec<SuffixRange>,
    start: usize,
    depth: usize,
    outer: (usize, usize),
    inner: (usize, usize),
) {
    for (begin, end) in [(outer.0, inner.0), (inner.1, outer.1)] {
        if begin < end {
            groups.push(SuffixRange {
                pattern_start: start,
                begin,
                end,
                match_length: depth,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // the=2 cat=3 sat=4 dog=5 a=6 ran=7
    fn corpus() -> SuffixArrayIndex {
        let mut index = SuffixArrayIndex::new();
        index.add_sentence(&[2, 3, 4]);
        index.add_sentence(&[2, 5, 4]);
        index.add_sentence(&[6, 3, 7]);
        index.sort(8);
        index
    }

    fn suffix<'a>(index: &'a SuffixArrayIndex, slot: usize) -> &'a [WordId] {
        &index.buffer()[index.suffixes()[slot] as usize..]
    }

    #[test]
    fn suffix_array_is_sorted_and_complete() {
        let index = corpus();
        assert_eq!(index.suffix_count(), 9);
        for slot in 1..index.suffix_count() {
            assert!(suffix(&index, slot - 1) <= suffix(&index, slot));
        }
    }

    #[test]
    fn slots_map_back_to_sentences() {
        let index = corpus();
        for slot in 0..index.suffix_count() {
            let s_id = index.sentence_id(slot);
            let span = index.spans()[s_id as usize];
            let pos = index.suffixes()[slot];
            assert!(pos >= span.start && pos < span.start + span.len);
            assert_eq!(index.sentence_length(slot), 3);
        }
    }

    #[test]
    fn groups_are_exact_and_descending() {
        let index = corpus();
        let pattern = [2, 3, 4];
        let mut seen = Vec::new();
        index.for_each_suffix_range(&pattern, |range| {
            seen.push(range);
            ControlFlow::Continue(())
        });

        assert!(seen
            .windows(2)
            .all(|w| w[0].match_length >= w[1].match_length));
        assert_eq!(seen[0].match_length, 3);
        assert_eq!(seen[0].end - seen[0].begin, 1);
        assert_eq!(index.sentence_id(seen[0].begin), 0);

        // every reported suffix matches exactly match_length tokens
        for range in &seen {
            for slot in range.begin..range.end {
                let s = suffix(&index, slot);
                let p = &pattern[range.pattern_start..];
                let lcp = s.iter().zip(p).take_while(|(a, b)| a == b).count();
                assert_eq!(lcp, range.match_length);
            }
        }
    }

    #[test]
    fn break_stops_enumeration() {
        let index = corpus();
        let mut calls = 0;
        index.for_each_suffix_range(&[2, 3, 4], |_| {
            calls += 1;
            ControlFlow::Break(())
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn unknown_tokens_match_nothing() {
        let index = corpus();
        let mut calls = 0;
        index.for_each_suffix_range(&[1, 1], |_| {
            calls += 1;
            ControlFlow::Continue(())
        });
        assert_eq!(calls, 0);
    }

    #[test]
    fn sort_is_idempotent() {
        let mut index = corpus();
        let before = index.suffixes().to_vec();
        index.sort(8);
        assert_eq!(index.suffixes(), &before[..]);
        assert!(index.is_sorted());
    }

    #[test]
    fn from_parts_round_trips() {
        let index = corpus();
        let restored =
            SuffixArrayIndex::from_parts(index.buffer().to_vec(), index.suffixes().to_vec())
                .unwrap();
        assert_eq!(restored.len(), 3);
        assert_eq!(restored.sentence(2), &[6, 3, 7]);
        assert!(SuffixArrayIndex::from_parts(vec![2, 3], vec![0, 1]).is_none());
    }
}
