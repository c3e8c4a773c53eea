// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! BM25 weight table over corpus sentences.
//!
//! Sentences are kept in one flat buffer, each stored as
//! `[len, ids..., SEPARATOR]`, with a table of start offsets. `sort` scans the
//! buffer once for term and document frequencies and then fills a dense
//! `vocab_size × sentences` table with
//!
//! ```text
//! idf(t)    = ln((N - df + 0.5) / (df + 0.5))
//! w(t, s)   = idf(t) * (k1 + 1) * tf / (tf + k1 * ((1 - b) + b * |s| / avg))
//! ```
//!
//! Query time is a sparse-vector × dense-table product.

use ahash::AHashMap;
use ndarray::Array2;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::config::Bm25Params;
use crate::error::{Error, Result};
use crate::types::{SentenceId, WordId, SENTENCE_SEPARATOR};

/// Sparse `index → value` vector, sorted by index with no duplicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(u32, f32)>,
}

impl SparseVector {
    /// Count multiplicities of `ids`.
    pub fn from_counts(ids: &[WordId]) -> Self {
        Self::from_pairs(ids.iter().map(|&id| (id, 1.0)))
    }

    /// Sum values per index.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u32, f32)>,
    {
        let mut acc: AHashMap<u32, f32> = AHashMap::new();
        for (idx, value) in pairs {
            *acc.entry(idx).or_insert(0.0) += value;
        }
        let mut entries: Vec<(u32, f32)> = acc.into_iter().collect();
        entries.sort_unstable_by_key(|&(idx, _)| idx);
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.entries.iter().copied()
    }

    /// Value at `idx`, zero when absent.
    pub fn get(&self, idx: u32) -> f32 {
        self.entries
            .binary_search_by_key(&idx, |&(i, _)| i)
            .map_or(0.0, |pos| self.entries[pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// BM25 engine: flattened corpus plus the finalized weight table.
#[derive(Debug, Clone)]
pub struct Bm25 {
    params: Bm25Params,
    buffer: Vec<WordId>,
    sentence_pos: Vec<usize>,
    /// `table[[term, sentence]]`
    table: Array2<f32>,
    idf: Vec<f32>,
    doc_freq: Vec<u32>,
    avg_length: f32,
    sorted: bool,
}

impl Bm25 {
    pub fn new(params: Bm25Params) -> Self {
        Self {
            params,
            buffer: Vec::new(),
            sentence_pos: Vec::new(),
            table: Array2::zeros((0, 0)),
            idf: Vec::new(),
            doc_freq: Vec::new(),
            avg_length: 0.0,
            sorted: false,
        }
    }

    pub fn params(&self) -> Bm25Params {
        self.params
    }

    /// Append a sentence. Marks the table stale.
    pub fn add_sentence(&mut self, ids: &[WordId]) -> SentenceId {
        let s_id = self.sentence_pos.len() as SentenceId;
        self.sentence_pos.push(self.buffer.len());
        self.buffer.push(ids.len() as WordId);
        self.buffer.extend_from_slice(ids);
        self.buffer.push(SENTENCE_SEPARATOR);
        self.sorted = false;
        s_id
    }

    /// Number of sentences.
    pub fn len(&self) -> usize {
        self.sentence_pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentence_pos.is_empty()
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Rows of the weight table.
    pub fn vocab_size(&self) -> usize {
        self.table.nrows()
    }

    /// Word ids of a sentence.
    pub fn sentence(&self, s_id: SentenceId) -> &[WordId] {
        let pos = self.sentence_pos[s_id as usize];
        let len = self.buffer[pos] as usize;
        &self.buffer[pos + 1..pos + 1 + len]
    }

    pub fn sentence_length(&self, s_id: SentenceId) -> usize {
        self.buffer[self.sentence_pos[s_id as usize]] as usize
    }

    pub fn avg_length(&self) -> f32 {
        self.avg_length
    }

    /// Smoothed idf of `term`; zero for terms outside the table.
    pub fn idf(&self, term: WordId) -> f32 {
        self.idf.get(term as usize).copied().unwrap_or(0.0)
    }

    /// Sentences containing each term, indexed by word id.
    pub fn doc_freq(&self) -> &[u32] {
        &self.doc_freq
    }

    pub fn weight(&self, term: WordId, s_id: SentenceId) -> f32 {
        self.table
            .get((term as usize, s_id as usize))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn table(&self) -> &Array2<f32> {
        &self.table
    }

    /// Finalize the weight table. No-op when already finalized.
    pub fn sort(&mut self, vocab_size: usize) -> Result<()> {
        if self.sorted && self.table.nrows() == vocab_size {
            return Ok(());
        }
        if self.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        let postings = self.count_terms(vocab_size);
        debug!(
            sentences = self.len(),
            vocab_size,
            "bm25: term and document frequencies"
        );

        self.compute_idf();
        debug!(avg_length = self.avg_length, "bm25: idf");

        self.table = self.fill_table(vocab_size, &postings);
        debug!(rows = self.table.nrows(), cols = self.table.ncols(), "bm25: weight table");

        self.sorted = true;
        Ok(())
    }

    /// One pass over the buffer: per-term postings `(sentence, tf)` and
    /// document frequencies.
    fn count_terms(&mut self, vocab_size: usize) -> Vec<Vec<(SentenceId, u32)>> {
        let mut postings: Vec<Vec<(SentenceId, u32)>> = vec![Vec::new(); vocab_size];
        let mut doc_freq = vec![0u32; vocab_size];
        let mut seen: AHashMap<WordId, u32> = AHashMap::new();

        for s_id in 0..self.len() as SentenceId {
            seen.clear();
            for &term in self.sentence(s_id) {
                if (term as usize) < vocab_size {
                    *seen.entry(term).or_insert(0) += 1;
                }
            }
            for (&term, &tf) in &seen {
                postings[term as usize].push((s_id, tf));
                doc_freq[term as usize] += 1;
            }
        }

        for list in &mut postings {
            list.sort_unstable_by_key(|&(s_id, _)| s_id);
        }

        self.doc_freq = doc_freq;
        postings
    }

    fn compute_idf(&mut self) {
        let n = self.len() as f32;
        self.idf = self
            .doc_freq
            .iter()
            .map(|&df| {
                let df = df as f32;
                ((n - df + 0.5) / (df + 0.5)).ln()
            })
            .collect();

        let total: usize = self
            .sentence_pos
            .iter()
            .map(|&pos| self.buffer[pos] as usize)
            .sum();
        self.avg_length = total as f32 / n;
    }

    /// BM25 weight `term` would have in `s_id` with frequency `tf`.
    pub fn term_weight(&self, term: WordId, tf: f32, s_id: SentenceId) -> f32 {
        self.saturate(self.idf(term), tf, self.sentence_length(s_id))
    }

    fn saturate(&self, idf: f32, tf: f32, len: usize) -> f32 {
        let Bm25Params { k1, b } = self.params;
        let avg = self.avg_length.max(f32::EPSILON);
        let norm = k1 * ((1.0 - b) + b * len as f32 / avg);
        idf * (k1 + 1.0) * tf / (tf + norm)
    }

    fn fill_table(&self, vocab_size: usize, postings: &[Vec<(SentenceId, u32)>]) -> Array2<f32> {
        let row = |term: usize, list: &[(SentenceId, u32)]| -> Vec<(SentenceId, f32)> {
            let idf = self.idf[term];
            list.iter()
                .map(|&(s_id, tf)| (s_id, self.saturate(idf, tf as f32, self.sentence_length(s_id))))
                .collect()
        };

        #[cfg(feature = "parallel")]
        let rows: Vec<Vec<(SentenceId, f32)>> = postings
            .par_iter()
            .enumerate()
            .map(|(term, list)| row(term, list.as_slice()))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let rows: Vec<Vec<(SentenceId, f32)>> = postings
            .iter()
            .enumerate()
            .map(|(term, list)| row(term, list.as_slice()))
            .collect();

        let mut table = Array2::zeros((vocab_size, self.len()));
        for (term, weights) in rows.into_iter().enumerate() {
            for (s_id, w) in weights {
                table[[term, s_id as usize]] = w;
            }
        }
        table
    }

    /// Restore a finalized engine from sentences and a stored table.
    ///
    /// Frequencies and idf are recomputed from the sentences. Returns `None`
    /// when the table shape does not fit.
    pub fn with_table<'a, I>(params: Bm25Params, sentences: I, table: Array2<f32>) -> Option<Self>
    where
        I: IntoIterator<Item = &'a [WordId]>,
    {
        let mut engine = Self::new(params);
        for ids in sentences {
            engine.add_sentence(ids);
        }
        if engine.is_empty() || table.ncols() != engine.len() {
            return None;
        }
        engine.count_terms(table.nrows());
        engine.compute_idf();
        engine.table = table;
        engine.sorted = true;
        Some(engine)
    }

    /// Per-sentence scores of a sparse pattern vector. Only sentences with a
    /// nonzero score are present.
    pub fn compute_product(&self, pattern: &SparseVector) -> SparseVector {
        let mut scores = vec![0.0f32; self.table.ncols()];
        let mut touched = vec![false; self.table.ncols()];

        for (term, count) in pattern.iter() {
            if term as usize >= self.table.nrows() {
                continue;
            }
            for (s_id, &w) in self.table.row(term as usize).indexed_iter() {
                if w != 0.0 {
                    scores[s_id] += count * w;
                    touched[s_id] = true;
                }
            }
        }

        SparseVector {
            entries: scores
                .into_iter()
                .enumerate()
                .filter(|&(s_id, score)| touched[s_id] && score != 0.0)
                .map(|(s_id, score)| (s_id as u32, score))
                .collect(),
        }
    }

    /// Per-term contribution of `pattern` to the score of `s_id`.
    pub fn get_cover(&self, pattern: &SparseVector, s_id: SentenceId) -> SparseVector {
        SparseVector {
            entries: pattern
                .iter()
                .map(|(term, count)| (term, count * self.weight(term, s_id)))
                .filter(|&(_, w)| w != 0.0)
                .collect(),
        }
    }
}
