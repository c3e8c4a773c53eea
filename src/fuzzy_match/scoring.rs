//! Query path: candidate filtering, edit-distance scoring, ranking.

use std::cmp::Ordering;

use ahash::AHashMap;
use tracing::trace;

use super::{FuzzyMatch, Pattern};
use crate::config::{FilterStrategy, MatchOptions, SubsequenceOptions};
use crate::edit_distance::{align, distance, longest_common_run, surface_penalty, EditCosts};
use crate::error::Result;
use crate::filter::{Bm25Matches, Candidate, FilterBounds, FilterMatches, NGramMatches};
use crate::tokenizer::Sentence;
use crate::types::{Match, SentenceId, WordId};

/// Slack on the fuzzy threshold.
const SCORE_EPSILON: f32 = 1e-5;

/// Per-position IDF penalties of a pattern and the most they can add up to.
#[derive(Debug, Clone)]
struct IdfWeights {
    weights: Vec<f32>,
    max_penalty: f32,
}

/// A candidate that survived scoring.
#[derive(Debug, Clone, Copy)]
struct Ranked {
    s_id: SentenceId,
    score: f32,
    penalty: f32,
    max_subseq: usize,
}

fn rank_order(a: &Ranked, b: &Ranked) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.penalty.total_cmp(&b.penalty))
        .then_with(|| a.s_id.cmp(&b.s_id))
}

impl FuzzyMatch {
    /// Fuzzy-match raw text.
    pub fn match_sentence(&self, text: &str, options: &MatchOptions) -> Result<Vec<Match<'_>>> {
        self.match_pattern(self.tokenize(text), options)
    }

    /// Fuzzy-match pre-tokenized input.
    pub fn match_tokens<S: AsRef<str>>(
        &self,
        tokens: &[S],
        options: &MatchOptions,
    ) -> Result<Vec<Match<'_>>> {
        self.match_pattern(Sentence::from_tokens(tokens), options)
    }

    /// Coverage-only matching of raw text.
    pub fn subsequence(&self, text: &str, options: &SubsequenceOptions) -> Result<Vec<Match<'_>>> {
        self.subsequence_pattern(self.tokenize(text), options)
    }

    pub fn subsequence_tokens<S: AsRef<str>>(
        &self,
        tokens: &[S],
        options: &SubsequenceOptions,
    ) -> Result<Vec<Match<'_>>> {
        self.subsequence_pattern(Sentence::from_tokens(tokens), options)
    }

    fn filter_for(
        &self,
        strategy: &FilterStrategy,
        fuzzy: f32,
        p_length: usize,
        min_seq_len: usize,
    ) -> Box<dyn FilterMatches + '_> {
        match *strategy {
            FilterStrategy::NGram => {
                Box::new(NGramMatches::new(fuzzy, p_length, min_seq_len, &self.index))
            }
            FilterStrategy::Bm25 {
                buffer,
                cutoff_threshold,
                scale,
            } => Box::new(Bm25Matches::new(
                fuzzy,
                p_length,
                min_seq_len,
                &self.bm25,
                buffer,
                cutoff_threshold,
                scale,
            )),
        }
    }

    fn match_pattern(&self, sentence: Sentence, options: &MatchOptions) -> Result<Vec<Match<'_>>> {
        options.validate()?;
        let pattern = self.prepare(sentence)?;
        let p_length = pattern.len();
        let min_seq_len = options.min_subseq_length.min(p_length);

        let mut filter = self.filter_for(&options.filter, options.fuzzy, p_length, min_seq_len);
        filter.register_pattern(&pattern.ids, &options.edit_costs);
        let candidates = filter.candidates();
        trace!(candidates = candidates.len(), "filtered");

        let idf_weights = (options.vocab_idf_penalty > 0.0).then(|| {
            let weights: Vec<f32> = pattern
                .ids
                .iter()
                .map(|&wid| self.compute_idf_penalty(wid, options.vocab_idf_penalty))
                .collect();
            let max_penalty = self.compute_max_idf_penalty(&weights);
            IdfWeights {
                weights,
                max_penalty,
            }
        });

        let mut ranked: Vec<Ranked> = candidates
            .iter()
            .filter_map(|candidate| {
                self.score_candidate(
                    &pattern,
                    candidate,
                    filter.bounds(),
                    options,
                    idf_weights.as_ref(),
                )
            })
            .collect();
        ranked.sort_by(rank_order);

        if options.contrastive_factor > 0.0 {
            ranked = self.contrastive_rerank(
                ranked,
                options.contrastive_factor,
                options.number_of_matches,
                &options.edit_costs,
            );
        }
        ranked.truncate(options.number_of_matches);

        Ok(self.into_matches(ranked))
    }

    fn score_candidate(
        &self,
        pattern: &Pattern,
        candidate: &Candidate,
        bounds: &FilterBounds,
        options: &MatchOptions,
        idf_weights: Option<&IdfWeights>,
    ) -> Option<Ranked> {
        let s_id = candidate.s_id;
        let s_ids = self.index.sentence(s_id);
        let (p_len, s_len) = (pattern.len(), s_ids.len());
        if !bounds.accepts_length(s_len) {
            return None;
        }

        let max_subseq = if candidate.max_match > 0 {
            candidate.max_match
        } else {
            longest_common_run(&pattern.ids, s_ids).0
        };
        if max_subseq < options.min_subseq_length.min(p_len)
            || (max_subseq as f32) / (p_len as f32) < options.min_subseq_ratio
        {
            return None;
        }

        let costs = &options.edit_costs;
        let max_len = p_len.max(s_len) as f32;
        if score_upper_bound(costs, p_len, s_len) + SCORE_EPSILON < options.fuzzy {
            trace!(s_id, "length bound below threshold");
            return None;
        }

        let alignment = align(&pattern.ids, s_ids, costs);
        if options.no_perfect && alignment.is_exact() && p_len == s_len {
            return None;
        }

        let base = 1.0 - alignment.cost / max_len;

        let sentence = &self.sentences[s_id as usize];
        let surface = surface_penalty(
            &pattern.sentence.tokens,
            &sentence.tokens,
            &alignment.pairs,
            self.config.penalty_tokens,
        );
        let mut penalty = surface as f32 * costs.penalty / max_len;

        if let Some(idf) = idf_weights {
            let missing: f32 = idf
                .weights
                .iter()
                .zip(&alignment.matched_pattern)
                .filter(|&(_, &matched)| !matched)
                .map(|(w, _)| w)
                .sum();
            penalty += (missing / p_len as f32).min(idf.max_penalty);
        }

        let score = (base - penalty).max(0.0);
        trace!(s_id, base, penalty, score, "scored candidate");
        if score + SCORE_EPSILON < options.fuzzy {
            return None;
        }

        Some(Ranked {
            s_id,
            score,
            penalty,
            max_subseq,
        })
    }

    /// Similarity of two corpus entries in `[0, 1]`.
    fn entry_similarity(&self, a: SentenceId, b: SentenceId, costs: &EditCosts) -> f32 {
        let (a, b) = (self.index.sentence(a), self.index.sentence(b));
        let max_len = a.len().max(b.len()).max(1) as f32;
        (1.0 - distance(a, b, costs) / max_len).max(0.0)
    }

    /// Greedy selection penalizing candidates close to already selected ones.
    fn contrastive_rerank(
        &self,
        mut remaining: Vec<Ranked>,
        factor: f32,
        k: usize,
        costs: &EditCosts,
    ) -> Vec<Ranked> {
        let mut selected: Vec<Ranked> = Vec::with_capacity(k.min(remaining.len()));
        // max similarity of each remaining candidate to the selected set
        let mut closest = vec![0.0f32; remaining.len()];

        while selected.len() < k && !remaining.is_empty() {
            let mut best = 0;
            let mut best_score = f32::NEG_INFINITY;
            for (i, candidate) in remaining.iter().enumerate() {
                let adjusted = candidate.score - factor * closest[i];
                if adjusted > best_score {
                    best = i;
                    best_score = adjusted;
                }
            }

            let mut pick = remaining.remove(best);
            closest.remove(best);
            pick.score = best_score.max(0.0);

            for (i, candidate) in remaining.iter().enumerate() {
                let sim = self.entry_similarity(pick.s_id, candidate.s_id, costs);
                closest[i] = closest[i].max(sim);
            }
            selected.push(pick);
        }
        selected
    }

    fn subsequence_pattern(
        &self,
        sentence: Sentence,
        options: &SubsequenceOptions,
    ) -> Result<Vec<Match<'_>>> {
        options.validate()?;
        let pattern = self.prepare(sentence)?;
        let p_length = pattern.len();
        let min_seq_len = options.min_subseq_length.min(p_length);

        let mut filter = self.filter_for(&options.filter, 0.0, p_length, min_seq_len);
        filter.register_pattern(&pattern.ids, &EditCosts::default());
        let bounds = *filter.bounds();

        let idf_weights: Option<Vec<f32>> = (options.idf_weighting
            && matches!(options.filter, FilterStrategy::NGram))
        .then(|| {
            pattern
                .ids
                .iter()
                .map(|&wid| self.compute_idf_penalty(wid, 1.0))
                .collect()
        });

        let mut ranked: Vec<Ranked> = Vec::new();
        for candidate in filter.candidates() {
            let s_ids = self.index.sentence(candidate.s_id);
            if !bounds.accepts_length(s_ids.len()) {
                continue;
            }
            if options.no_perfect && s_ids == pattern.ids.as_slice() {
                continue;
            }

            let (run, p_start, _) = longest_common_run(&pattern.ids, s_ids);
            let ratio = run as f32 / p_length as f32;
            if run == 0 || run < min_seq_len || ratio < options.min_subseq_ratio {
                continue;
            }

            let score = if !options.idf_weighting {
                ratio
            } else if let Some(weights) = &idf_weights {
                weighted_ratio(weights, p_start, run).unwrap_or(ratio)
            } else {
                let run_ids = &pattern.ids[p_start..p_start + run];
                self.cover_ratio(&*filter, &pattern.ids, run_ids, candidate.s_id)
                    .unwrap_or(ratio)
            };

            trace!(s_id = candidate.s_id, run, score, "subsequence candidate");
            ranked.push(Ranked {
                s_id: candidate.s_id,
                score,
                penalty: 0.0,
                max_subseq: run,
            });
        }

        ranked.sort_by(rank_order);
        ranked.truncate(options.number_of_matches);
        Ok(self.into_matches(ranked))
    }

    /// BM25 contribution of the run's words at `s_id`, over what the whole
    /// pattern would contribute if `s_id` contained each word once.
    fn cover_ratio(
        &self,
        filter: &dyn FilterMatches,
        pattern: &[WordId],
        run: &[WordId],
        s_id: SentenceId,
    ) -> Option<f32> {
        let (run_words, run_counts) = unique_counts(run);
        let covered: f32 = filter.term_cover(&run_words, &run_counts, s_id)?.iter().sum();

        let (pattern_words, pattern_counts) = unique_counts(pattern);
        let total: f32 = pattern_words
            .iter()
            .zip(&pattern_counts)
            .map(|(&wid, &count)| count as f32 * self.bm25.term_weight(wid, 1.0, s_id))
            .sum();
        if total <= 0.0 {
            return None;
        }
        Some((covered / total).clamp(0.0, 1.0))
    }

    fn into_matches(&self, ranked: Vec<Ranked>) -> Vec<Match<'_>> {
        ranked
            .into_iter()
            .map(|r| Match {
                score: r.score,
                penalty: r.penalty,
                max_subseq: r.max_subseq,
                s_id: r.s_id,
                id: &self.ids[r.s_id as usize],
                tokens: self.index.sentence(r.s_id),
            })
            .collect()
    }
}

/// Best score a sentence of `s_len` tokens can reach against a pattern of
/// `p_len` tokens, before any alignment is computed.
fn score_upper_bound(costs: &EditCosts, p_len: usize, s_len: usize) -> f32 {
    let max_len = p_len.max(s_len).max(1) as f32;
    1.0 - costs.length_bound(p_len, s_len) / max_len
}

/// Share of the pattern's IDF weight inside the run.
fn weighted_ratio(weights: &[f32], start: usize, run: usize) -> Option<f32> {
    let total: f32 = weights.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let covered: f32 = weights[start..start + run].iter().sum();
    Some((covered / total).clamp(0.0, 1.0))
}

/// Distinct ids in first-seen order with their multiplicities.
fn unique_counts(ids: &[WordId]) -> (Vec<WordId>, Vec<u32>) {
    let mut order: Vec<WordId> = Vec::new();
    let mut counts: AHashMap<WordId, u32> = AHashMap::new();
    for &wid in ids {
        let count = counts.entry(wid).or_insert(0);
        if *count == 0 {
            order.push(wid);
        }
        *count += 1;
    }
    let counts = order.iter().map(|wid| counts[wid]).collect();
    (order, counts)
}
