use super::normalizer::{name_tokens, normalize_name};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

/// Anything that exposes a company name the matcher can compare against.
pub trait MatchText {
    fn match_text(&self) -> &str;
}

impl MatchText for String {
    fn match_text(&self) -> &str {
        self
    }
}

impl MatchText for str {
    fn match_text(&self) -> &str {
        self
    }
}

impl<T: MatchText + ?Sized> MatchText for &T {
    fn match_text(&self) -> &str {
        (**self).match_text()
    }
}

/// Acceptance threshold and blend weights for fuzzy name matching.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// A candidate is accepted only when its combined score is strictly above this.
    pub threshold: f64,
    /// Weight of edit similarity; token overlap receives the remainder.
    pub edit_weight: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            edit_weight: 0.6,
        }
    }
}

/// A scored pairing between a query name and one record from a candidate pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate<R> {
    pub record: R,
    pub query: String,
    pub candidate_index: usize,
    pub score: f64,
    pub edit_similarity: f64,
    pub token_overlap: f64,
}

impl<R: Clone> MatchCandidate<&R> {
    pub fn cloned(&self) -> MatchCandidate<R> {
        MatchCandidate {
            record: self.record.clone(),
            query: self.query.clone(),
            candidate_index: self.candidate_index,
            score: self.score,
            edit_similarity: self.edit_similarity,
            token_overlap: self.token_overlap,
        }
    }
}

/// Similarity components for a single normalized pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    pub edit_similarity: f64,
    pub token_overlap: f64,
    pub combined: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FuzzyMatcher {
    config: MatchConfig,
}

impl FuzzyMatcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> MatchConfig {
        self.config
    }

    /// Scores one pair after normalization. Returns `None` when either side normalizes to
    /// nothing, so blank names never match.
    pub fn similarity(&self, query: &str, candidate: &str) -> Option<Similarity> {
        let query_norm = normalize_name(query);
        let candidate_norm = normalize_name(candidate);
        if query_norm.is_empty() || candidate_norm.is_empty() {
            return None;
        }

        let longest = query_norm
            .chars()
            .count()
            .max(candidate_norm.chars().count());
        let distance = strsim::levenshtein(&query_norm, &candidate_norm);
        let edit_similarity = 1.0 - distance as f64 / longest as f64;

        let query_tokens: HashSet<String> = name_tokens(query).into_iter().collect();
        let candidate_tokens: HashSet<String> = name_tokens(candidate).into_iter().collect();
        let shared = query_tokens.intersection(&candidate_tokens).count();
        let token_overlap = shared as f64 / query_tokens.len() as f64;

        let combined = self.config.edit_weight * edit_similarity
            + (1.0 - self.config.edit_weight) * token_overlap;

        Some(Similarity {
            edit_similarity,
            token_overlap,
            combined,
        })
    }

    /// Every scorable candidate, best first. Ties keep pool order.
    pub fn rank<'a, R: MatchText>(
        &self,
        query: &str,
        candidates: &'a [R],
    ) -> Vec<MatchCandidate<&'a R>> {
        let mut ranked: Vec<MatchCandidate<&'a R>> = candidates
            .iter()
            .enumerate()
            .filter_map(|(candidate_index, record)| {
                self.similarity(query, record.match_text())
                    .map(|similarity| MatchCandidate {
                        record,
                        query: query.to_string(),
                        candidate_index,
                        score: similarity.combined,
                        edit_similarity: similarity.edit_similarity,
                        token_overlap: similarity.token_overlap,
                    })
            })
            .collect();

        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked
    }

    /// The top-ranked candidate, if it clears the acceptance threshold.
    pub fn best_match<'a, R: MatchText>(
        &self,
        query: &str,
        candidates: &'a [R],
    ) -> Option<MatchCandidate<&'a R>> {
        let top = self.rank(query, candidates).into_iter().next()?;
        debug!(
            query,
            candidate = top.record.match_text(),
            score = top.score,
            edit_similarity = top.edit_similarity,
            token_overlap = top.token_overlap,
            threshold = self.config.threshold,
            "top fuzzy candidate"
        );

        (top.score > self.config.threshold).then_some(top)
    }

    /// Best score in the pool regardless of threshold; 0.0 when nothing is scorable.
    pub fn best_score<R: MatchText>(&self, query: &str, candidates: &[R]) -> f64 {
        self.rank(query, candidates)
            .first()
            .map(|candidate| candidate.score)
            .unwrap_or(0.0)
    }
}

/// Matches `name` against `pool` with the default threshold and weights.
pub fn resolve_identity<'a, R: MatchText>(
    name: &str,
    pool: &'a [R],
) -> Option<MatchCandidate<&'a R>> {
    FuzzyMatcher::default().best_match(name, pool)
}
