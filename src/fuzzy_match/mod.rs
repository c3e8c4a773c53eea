// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Translation-memory matcher: corpus building and finalization.
//!
//! A [`FuzzyMatch`] moves through three states:
//!
//! ```text
//! Empty ──add_tm──▶ Building ──sort──▶ Finalized ──match/subsequence──▶ (read-only)
//!                      ▲                   │
//!                      └──────add_tm───────┘
//! ```
//!
//! Queries take `&self` and never mutate, so a finalized matcher can be shared
//! across threads. Adding entries needs `&mut self`, which rules out queries
//! running concurrently with a rebuild.

mod scoring;

use std::io::{self, Write};

use tracing::debug;

use crate::bm25::Bm25;
use crate::config::FuzzyMatchConfig;
use crate::error::{Error, Result};
use crate::index::SuffixArrayIndex;
use crate::tokenizer::{PenaltyTokens, Sentence, Tokenizer};
use crate::types::{SentenceId, WordId, UNKNOWN_WORD};
use crate::vocab::VocabIndexer;

/// Fuzzy matcher over a translation memory.
#[derive(Debug, Clone)]
pub struct FuzzyMatch {
    pub(crate) config: FuzzyMatchConfig,
    pub(crate) tokenizer: Tokenizer,
    pub(crate) vocab: VocabIndexer,
    pub(crate) index: SuffixArrayIndex,
    pub(crate) bm25: Bm25,
    /// External id of each entry, by sentence id.
    pub(crate) ids: Vec<String>,
    pub(crate) sentences: Vec<Sentence>,
}

/// A query after tokenization and vocabulary lookup.
#[derive(Debug, Clone)]
pub(crate) struct Pattern {
    pub sentence: Sentence,
    pub ids: Vec<WordId>,
}

impl Pattern {
    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

impl Default for FuzzyMatch {
    fn default() -> Self {
        Self::build(FuzzyMatchConfig::default())
    }
}

impl FuzzyMatch {
    pub fn new(penalty_tokens: PenaltyTokens, max_tokens_in_pattern: usize) -> Self {
        Self::build(FuzzyMatchConfig {
            penalty_tokens,
            max_tokens_in_pattern: max_tokens_in_pattern.max(1),
            ..FuzzyMatchConfig::default()
        })
    }

    pub fn with_config(config: FuzzyMatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: FuzzyMatchConfig) -> Self {
        Self {
            config,
            tokenizer: Tokenizer::new(),
            vocab: VocabIndexer::new(),
            index: SuffixArrayIndex::new(),
            bm25: Bm25::new(config.bm25),
            ids: Vec::new(),
            sentences: Vec::new(),
        }
    }

    pub fn config(&self) -> &FuzzyMatchConfig {
        &self.config
    }

    pub fn penalty_tokens(&self) -> PenaltyTokens {
        self.config.penalty_tokens
    }

    pub fn max_tokens_in_pattern(&self) -> usize {
        self.config.max_tokens_in_pattern
    }

    /// Tokenize with the integrated tokenizer.
    pub fn tokenize(&self, text: &str) -> Sentence {
        self.tokenizer.tokenize(text)
    }

    /// Add a raw-text entry. With `sort`, finalize right away.
    pub fn add_tm(&mut self, id: impl Into<String>, text: &str, sort: bool) -> Result<SentenceId> {
        let sentence = self.tokenizer.tokenize(text);
        self.add_sentence(id.into(), sentence, sort)
    }

    /// Add a pre-tokenized entry.
    pub fn add_tm_tokens<S: AsRef<str>>(
        &mut self,
        id: impl Into<String>,
        tokens: &[S],
        sort: bool,
    ) -> Result<SentenceId> {
        self.add_sentence(id.into(), Sentence::from_tokens(tokens), sort)
    }

    fn add_sentence(&mut self, id: String, sentence: Sentence, sort: bool) -> Result<SentenceId> {
        self.check_length(sentence.len())?;

        let pt = self.config.penalty_tokens;
        let ids: Vec<WordId> = sentence
            .keys(pt)
            .iter()
            .map(|key| self.vocab.insert(key))
            .collect();

        let s_id = self.index.add_sentence(&ids);
        let bm25_id = self.bm25.add_sentence(&ids);
        debug_assert_eq!(s_id, bm25_id);
        self.ids.push(id);
        self.sentences.push(sentence);

        if sort {
            self.sort()?;
        }
        Ok(s_id)
    }

    fn check_length(&self, len: usize) -> Result<()> {
        if len == 0 {
            return Err(Error::EmptyPattern);
        }
        let max = self.config.max_tokens_in_pattern;
        if len > max {
            return Err(Error::PatternTooLong { len, max });
        }
        Ok(())
    }

    /// Finalize the suffix index, the BM25 table, and document frequencies.
    /// No-op when nothing changed since the last call.
    pub fn sort(&mut self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        if self.is_sorted() {
            return Ok(());
        }

        let vocab_size = self.vocab.size();
        self.index.sort(vocab_size);
        debug!(
            sentences = self.len(),
            suffixes = self.index.suffix_count(),
            "suffix index sorted"
        );

        self.bm25.sort(vocab_size)?;
        self.vocab.set_doc_freq(self.bm25.doc_freq().to_vec());
        debug!(vocab_size, "translation memory finalized");
        Ok(())
    }

    pub fn is_sorted(&self) -> bool {
        self.index.is_sorted() && self.bm25.is_sorted()
    }

    /// Number of corpus entries.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn vocab(&self) -> &VocabIndexer {
        &self.vocab
    }

    /// External id of an entry.
    pub fn sentence_id(&self, s_id: SentenceId) -> Option<&str> {
        self.ids.get(s_id as usize).map(String::as_str)
    }

    pub fn sentence(&self, s_id: SentenceId) -> Option<&Sentence> {
        self.sentences.get(s_id as usize)
    }

    /// Display text of an entry.
    pub fn sentence_text(&self, s_id: SentenceId) -> Option<String> {
        self.sentence(s_id).map(Sentence::detokenize)
    }

    /// Write one `s_id<TAB>id<TAB>text` line per entry.
    pub fn dump<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for (s_id, (id, sentence)) in self.ids.iter().zip(&self.sentences).enumerate() {
            writeln!(w, "{}\t{}\t{}", s_id, id, sentence.detokenize())?;
        }
        Ok(())
    }

    /// Largest IDF a word can have: `ln(N)`, kept strictly positive.
    fn max_idf(&self) -> f32 {
        (self.len() as f32).ln().max(f32::EPSILON)
    }

    /// Normalized rarity penalty of one pattern word.
    ///
    /// Known words get `ln(N / df) / ln(N)`, so a word present in every entry
    /// costs nothing and a word present in one costs `1`. Words absent from
    /// the corpus cost `unknown_vocab_word_penalty`.
    pub fn compute_idf_penalty(&self, word_id: WordId, unknown_vocab_word_penalty: f32) -> f32 {
        let df = self.vocab.doc_freq(word_id);
        if word_id == UNKNOWN_WORD || df == 0 {
            return unknown_vocab_word_penalty;
        }
        let idf = (self.len() as f32 / df as f32).ln();
        idf / self.max_idf()
    }

    /// Largest IDF penalty any match of a pattern can receive, given the
    /// [`compute_idf_penalty`] of each of its positions.
    ///
    /// That is the mean weight of the whole pattern left unmatched, never
    /// more than `1`, so the penalty stays on the scale of the score.
    ///
    /// [`compute_idf_penalty`]: FuzzyMatch::compute_idf_penalty
    pub fn compute_max_idf_penalty(&self, idf_penalties: &[f32]) -> f32 {
        if idf_penalties.is_empty() {
            return 0.0;
        }
        let total: f32 = idf_penalties.iter().sum();
        (total / idf_penalties.len() as f32).clamp(0.0, 1.0)
    }

    /// Tokenize, look up and validate a query.
    pub(crate) fn prepare(&self, sentence: Sentence) -> Result<Pattern> {
        self.check_length(sentence.len())?;
        if self.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        if !self.is_sorted() {
            return Err(Error::NotFinalized);
        }

        let pt = self.config.penalty_tokens;
        let ids = sentence
            .keys(pt)
            .iter()
            .map(|key| self.vocab.lookup(key))
            .collect();
        Ok(Pattern { sentence, ids })
    }
}
