//! Construction-time and per-query configuration.
//!
//! Everything here is `serde`-derivable with `#[serde(default)]`, so a JSON
//! options file only needs the knobs it changes.

use serde::{Deserialize, Serialize};

use crate::edit_distance::EditCosts;
use crate::error::{Error, Result};
use crate::tokenizer::PenaltyTokens;
use crate::types::DEFAULT_MAX_TOKENS_IN_PATTERN;

/// BM25 free parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f32,
    /// Length normalization strength, in `[0, 1]`.
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

impl Bm25Params {
    pub fn validate(&self) -> Result<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "bm25 k1 must be a finite value >= 0, got {}",
                self.k1
            )));
        }
        if !self.b.is_finite() || !(0.0..=1.0).contains(&self.b) {
            return Err(Error::InvalidConfig(format!(
                "bm25 b must be in [0, 1], got {}",
                self.b
            )));
        }
        Ok(())
    }
}

/// Matcher configuration, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyMatchConfig {
    pub penalty_tokens: PenaltyTokens,
    /// Longest accepted pattern, also enforced on corpus entries.
    pub max_tokens_in_pattern: usize,
    pub bm25: Bm25Params,
}

impl Default for FuzzyMatchConfig {
    fn default() -> Self {
        Self {
            penalty_tokens: PenaltyTokens::NONE,
            max_tokens_in_pattern: DEFAULT_MAX_TOKENS_IN_PATTERN,
            bm25: Bm25Params::default(),
        }
    }
}

impl FuzzyMatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens_in_pattern == 0 {
            return Err(Error::InvalidConfig(
                "max_tokens_in_pattern must be at least 1".to_string(),
            ));
        }
        self.bm25.validate()
    }
}

/// Rounding applied when a BM25 score is scaled to a fixed-point integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rounding {
    /// Toward zero.
    #[default]
    Truncate,
    /// To the nearest integer, ties away from zero.
    Nearest,
}

/// Fixed-point policy for Top-K scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreScale {
    pub factor: f32,
    pub rounding: Rounding,
}

impl Default for ScoreScale {
    fn default() -> Self {
        Self {
            factor: 1000.0,
            rounding: Rounding::Truncate,
        }
    }
}

impl ScoreScale {
    pub fn apply(&self, score: f32) -> i32 {
        let scaled = score * self.factor;
        match self.rounding {
            Rounding::Truncate => scaled as i32,
            Rounding::Nearest => scaled.round() as i32,
        }
    }
}

/// Which candidate filter shortlists sentences before scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FilterStrategy {
    /// Exact n-gram evidence from the suffix array.
    ///
    /// Finds every sentence that can reach the fuzzy threshold. Cost grows
    /// with the number of sentences sharing long n-grams with the pattern.
    #[default]
    NGram,
    /// BM25 shortlist of at most `buffer` sentences.
    ///
    /// Bounded cost per query, but a sentence outside the shortlist is
    /// never scored even if it would pass the threshold.
    Bm25 {
        buffer: usize,
        cutoff_threshold: f32,
        #[serde(default)]
        scale: ScoreScale,
    },
}

impl FilterStrategy {
    /// BM25 shortlist with default cutoff and scale.
    pub fn bm25(buffer: usize) -> Self {
        FilterStrategy::Bm25 {
            buffer,
            cutoff_threshold: 0.0,
            scale: ScoreScale::default(),
        }
    }
}

/// Per-query knobs for fuzzy matching.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    /// Minimum accepted score, in `[0, 1]`.
    pub fuzzy: f32,
    pub number_of_matches: usize,
    /// Skip exact matches.
    pub no_perfect: bool,
    /// Down-weight matches too similar to a better one. `0` disables.
    pub contrastive_factor: f32,
    pub min_subseq_length: usize,
    pub min_subseq_ratio: f32,
    /// Penalty weight of words missing from the vocabulary. `0` disables the
    /// IDF penalty altogether.
    pub vocab_idf_penalty: f32,
    pub edit_costs: EditCosts,
    pub filter: FilterStrategy,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            fuzzy: 0.7,
            number_of_matches: 10,
            no_perfect: false,
            contrastive_factor: 0.0,
            min_subseq_length: 2,
            min_subseq_ratio: 0.0,
            vocab_idf_penalty: 0.0,
            edit_costs: EditCosts::default(),
            filter: FilterStrategy::NGram,
        }
    }
}

impl MatchOptions {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.fuzzy) {
            return Err(Error::InvalidConfig(format!(
                "fuzzy must be in [0, 1], got {}",
                self.fuzzy
            )));
        }
        if self.contrastive_factor < 0.0 || self.vocab_idf_penalty < 0.0 {
            return Err(Error::InvalidConfig(
                "contrastive_factor and vocab_idf_penalty must be >= 0".to_string(),
            ));
        }
        validate_filter(&self.filter)
    }
}

/// Per-query knobs for subsequence (coverage-only) matching.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubsequenceOptions {
    pub number_of_matches: usize,
    pub no_perfect: bool,
    pub min_subseq_length: usize,
    pub min_subseq_ratio: f32,
    /// Weight coverage by word rarity instead of counting tokens.
    pub idf_weighting: bool,
    pub filter: FilterStrategy,
}

impl Default for SubsequenceOptions {
    fn default() -> Self {
        Self {
            number_of_matches: 10,
            no_perfect: false,
            min_subseq_length: 3,
            min_subseq_ratio: 0.3,
            idf_weighting: false,
            filter: FilterStrategy::NGram,
        }
    }
}

impl SubsequenceOptions {
    pub fn validate(&self) -> Result<()> {
        validate_filter(&self.filter)
    }
}

fn validate_filter(filter: &FilterStrategy) -> Result<()> {
    match *filter {
        FilterStrategy::NGram => Ok(()),
        FilterStrategy::Bm25 {
            buffer,
            cutoff_threshold,
            scale,
        } => {
            if buffer == 0 {
                return Err(Error::InvalidConfig("bm25 buffer must be at least 1".to_string()));
            }
            if !cutoff_threshold.is_finite() || !scale.factor.is_finite() || scale.factor <= 0.0 {
                return Err(Error::InvalidConfig(
                    "bm25 cutoff and scale factor must be finite, factor > 0".to_string(),
                ));
            }
            Ok(())
        }
    }
}
