//! Translation-memory fuzzy matching over suffix arrays and BM25.
//!
//! A corpus of segments (the translation memory) is indexed once. Each query
//! sentence is then scored against it by token-level edit distance, after a
//! cheap candidate filter has narrowed the corpus down to a few sentences.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────────┐
//! │ tokenizer.rs │────▶│   vocab.rs   │────▶│  index/ (SA-IS)  │
//! │  (Sentence,  │     │ (key → id,   │     │  bm25.rs (table) │
//! │ PenaltyTokens│     │  doc freq)   │     └────────┬─────────┘
//! └──────────────┘     └──────────────┘              │
//!                                                    ▼
//! ┌────────────────────────────────────────────────────────────┐
//! │ filter/  NGramMatches (agenda)  |  Bm25Matches (top-K)     │
//! └──────────────────────────────┬─────────────────────────────┘
//!                                ▼
//! ┌────────────────────────────────────────────────────────────┐
//! │ fuzzy_match/  FuzzyMatch: gates, edit_distance, penalties, │
//! │               contrastive re-rank, subsequence mode        │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! | Module          | Role                                              |
//! |-----------------|---------------------------------------------------|
//! | `tokenizer`     | Segmentation, token classes, penalty-token mask   |
//! | `vocab`         | Normalized key to word id, document frequency     |
//! | `index`         | Flattened corpus and generalized suffix array     |
//! | `bm25`          | Dense term x sentence weight table                |
//! | `filter`        | Candidate shortlists behind [`FilterMatches`]     |
//! | `edit_distance` | Weighted token Levenshtein with backtrace         |
//! | `fuzzy_match`   | The orchestrator, [`FuzzyMatch`]                  |
//! | `binary`        | Persisted index format                            |
//!
//! # Usage
//!
//! ```
//! use fuzzytm::{FuzzyMatch, MatchOptions, PenaltyTokens};
//!
//! let mut tm = FuzzyMatch::new(PenaltyTokens::NONE, 300);
//! tm.add_tm("a", "the cat sat", false)?;
//! tm.add_tm("b", "the dog sat", false)?;
//! tm.sort()?;
//!
//! let options = MatchOptions { fuzzy: 0.6, ..MatchOptions::default() };
//! let matches = tm.match_sentence("the cat sat", &options)?;
//! assert_eq!(matches[0].id, "a");
//! assert_eq!(matches[0].score, 1.0);
//! # Ok::<(), fuzzytm::Error>(())
//! ```

pub mod binary;
pub mod bm25;
pub mod config;
pub mod edit_distance;
mod error;
pub mod filter;
mod fuzzy_match;
pub mod index;
pub mod tokenizer;
mod types;
pub mod vocab;

#[doc(hidden)]
pub mod testing;

pub use bm25::{Bm25, SparseVector};
pub use config::{
    Bm25Params, FilterStrategy, FuzzyMatchConfig, MatchOptions, Rounding, ScoreScale,
    SubsequenceOptions,
};
pub use edit_distance::{Alignment, EditCosts};
pub use error::{Error, Result};
pub use filter::{
    compute_min_exact_match, AgendaItem, Bm25Matches, Candidate, FilterBounds, FilterMatches,
    NGramMatches,
};
pub use fuzzy_match::FuzzyMatch;
pub use index::{SuffixArrayIndex, SuffixRange};
pub use tokenizer::{PenaltyTokens, Sentence, Token, TokenClass, Tokenizer};
pub use types::{
    Match, SentenceId, WordId, DEFAULT_MAX_TOKENS_IN_PATTERN, FIRST_WORD_ID, SENTENCE_SEPARATOR,
    UNKNOWN_WORD,
};
pub use vocab::VocabIndexer;
