//! Core data types shared by the index, the filters, and the matcher.

use serde::Serialize;

/// Vocabulary index of a normalized token.
pub type WordId = u32;

/// Sequential id assigned to a corpus entry at insertion.
pub type SentenceId = u32;

/// Marks the end of a sentence in flattened token buffers.
pub const SENTENCE_SEPARATOR: WordId = 0;

/// Stand-in for pattern tokens the vocabulary has never seen.
///
/// Never stored in the corpus, so it never matches anything.
pub const UNKNOWN_WORD: WordId = 1;

/// First id handed out to a real vocabulary entry.
pub const FIRST_WORD_ID: WordId = 2;

/// Default cap on tokens per pattern (and per corpus entry).
pub const DEFAULT_MAX_TOKENS_IN_PATTERN: usize = 300;

/// A ranked translation-memory match.
///
/// Borrows the matched entry from the matcher that produced it, so a `Match`
/// cannot outlive the corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match<'a> {
    /// Final score, higher is better. In `[0, 1]` for fuzzy matching.
    pub score: f32,
    /// Portion of the score lost to penalty tokens and IDF penalties.
    pub penalty: f32,
    /// Longest contiguous run shared with the pattern.
    pub max_subseq: usize,
    /// Sequential corpus id.
    pub s_id: SentenceId,
    /// External id given at insertion.
    pub id: &'a str,
    /// Normalized word ids of the matched entry.
    pub tokens: &'a [WordId],
}

impl Match<'_> {
    /// Number of tokens in the matched entry.
    pub fn length(&self) -> usize {
        self.tokens.len()
    }
}
