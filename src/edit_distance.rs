// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Token-level edit distance with configurable costs.
//!
//! The same DP as a character Levenshtein, lifted to word ids, with two
//! twists:
//! 1. Substitution, insertion and deletion costs are configurable.
//! 2. A backtrace recovers which pattern tokens survived as exact matches,
//!    so penalty tokens and IDF penalties can be charged afterwards.
//!
//! The early exit of the character version carries over through
//! [`EditCosts::length_bound`]: the length difference alone prices a lower
//! bound on the cost, so the matcher skips the DP for candidates that cannot
//! reach the threshold.

use serde::{Deserialize, Serialize};

use crate::tokenizer::{PenaltyTokens, Token, TokenClass};
use crate::types::WordId;

/// Edit operation costs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditCosts {
    pub substitution: f32,
    /// Cost of a sentence token missing from the pattern.
    pub insertion: f32,
    /// Cost of a pattern token missing from the sentence.
    pub deletion: f32,
    /// Cost of an aligned penalty token whose surface form differs.
    pub penalty: f32,
}

impl Default for EditCosts {
    fn default() -> Self {
        Self {
            substitution: 1.0,
            insertion: 1.0,
            deletion: 1.0,
            penalty: 0.1,
        }
    }
}

impl EditCosts {
    /// Lower bound on the cost of aligning sequences of these lengths.
    pub fn length_bound(&self, a_len: usize, b_len: usize) -> f32 {
        let diff = a_len.abs_diff(b_len) as f32;
        if a_len > b_len {
            diff * self.deletion.min(self.substitution + self.insertion)
        } else {
            diff * self.insertion.min(self.substitution + self.deletion)
        }
    }
}

/// Result of aligning a pattern with a sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub cost: f32,
    /// `matched_pattern[i]` is true when pattern token `i` aligned to an equal token.
    pub matched_pattern: Vec<bool>,
    /// `(pattern_pos, sentence_pos)` of every exact alignment.
    pub pairs: Vec<(usize, usize)>,
}

impl Alignment {
    pub fn is_exact(&self) -> bool {
        self.cost == 0.0
    }
}

/// Cheapest alignment of `pattern` onto `sentence`.
pub fn align(pattern: &[WordId], sentence: &[WordId], costs: &EditCosts) -> Alignment {
    let n = pattern.len();
    let m = sentence.len();

    // dp[i][j] = cost of aligning pattern[..i] with sentence[..j]
    let width = m + 1;
    let mut dp = vec![0.0f32; (n + 1) * width];
    for j in 1..=m {
        dp[j] = dp[j - 1] + costs.insertion;
    }
    for i in 1..=n {
        dp[i * width] = dp[(i - 1) * width] + costs.deletion;
        for j in 1..=m {
            let diag = dp[(i - 1) * width + j - 1]
                + if pattern[i - 1] == sentence[j - 1] {
                    0.0
                } else {
                    costs.substitution
                };
            let up = dp[(i - 1) * width + j] + costs.deletion;
            let left = dp[i * width + j - 1] + costs.insertion;
            dp[i * width + j] = diag.min(up).min(left);
        }
    }

    // Backtrace, preferring exact diagonal moves
    let mut matched_pattern = vec![false; n];
    let mut pairs = Vec::new();
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        let here = dp[i * width + j];
        if i > 0 && j > 0 {
            let same = pattern[i - 1] == sentence[j - 1];
            let step = if same { 0.0 } else { costs.substitution };
            if approx_eq(here, dp[(i - 1) * width + j - 1] + step) {
                if same {
                    matched_pattern[i - 1] = true;
                    pairs.push((i - 1, j - 1));
                }
                i -= 1;
                j -= 1;
                continue;
            }
        }
        if i > 0 && approx_eq(here, dp[(i - 1) * width + j] + costs.deletion) {
            i -= 1;
        } else {
            j -= 1;
        }
    }
    pairs.reverse();

    Alignment {
        cost: dp[n * width + m],
        matched_pattern,
        pairs,
    }
}

#[inline]
fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1e-4
}

/// Plain weighted distance between two id sequences.
pub fn distance(a: &[WordId], b: &[WordId], costs: &EditCosts) -> f32 {
    let mut prev: Vec<f32> = (0..=b.len()).map(|j| j as f32 * costs.insertion).collect();
    let mut row = vec![0.0f32; b.len() + 1];
    for (i, &ac) in a.iter().enumerate() {
        row[0] = (i + 1) as f32 * costs.deletion;
        for (j, &bc) in b.iter().enumerate() {
            let sub = if ac == bc { 0.0 } else { costs.substitution };
            row[j + 1] = (prev[j] + sub)
                .min(prev[j + 1] + costs.deletion)
                .min(row[j] + costs.insertion);
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}

/// Count aligned pairs whose surface forms differ on an active penalty class.
pub fn surface_penalty(
    pattern: &[Token],
    sentence: &[Token],
    pairs: &[(usize, usize)],
    pt: PenaltyTokens,
) -> usize {
    pairs
        .iter()
        .filter(|&&(p, s)| {
            let (Some(a), Some(b)) = (pattern.get(p), sentence.get(s)) else {
                return false;
            };
            let surface_differs = a.surface != b.surface && a.class == b.class && {
                match a.class {
                    TokenClass::Tag => pt.contains(PenaltyTokens::TAG),
                    TokenClass::Punctuation => pt.contains(PenaltyTokens::PCT),
                    TokenClass::Separator => pt.contains(PenaltyTokens::SEP),
                    TokenClass::Number => pt.contains(PenaltyTokens::NBR),
                    TokenClass::Word => pt.contains(PenaltyTokens::CAS),
                }
            };
            let joiner_differs = pt.contains(PenaltyTokens::JNR) && a.joined != b.joined;
            surface_differs || joiner_differs
        })
        .count()
}

/// Longest common contiguous run: `(length, a_start, b_start)`.
pub fn longest_common_run(a: &[WordId], b: &[WordId]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    for i in 0..a.len() {
        for j in 0..b.len() {
            row[j + 1] = if a[i] == b[j] { prev[j] + 1 } else { 0 };
            if row[j + 1] > best.0 {
                best = (row[j + 1], i + 1 - row[j + 1], j + 1 - row[j + 1]);
            }
        }
        std::mem::swap(&mut prev, &mut row);
    }
    best
}
