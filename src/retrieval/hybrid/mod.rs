//! Blending of semantic and lexical rankings.
//!
//! Both scorers produce a candidate pool larger than the requested `top_k`. Semantic
//! scores are min-max normalized over their pool and lexical scores are divided by the
//! best lexical score, so both halves land in `[0, 1]` before weighting. A chunk that
//! only one scorer returned contributes 0 for the other half.

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::retrieval::chunk_store::ChunkStore;
use crate::retrieval::{lexical, semantic};
use crate::{QaError, Result};

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_SEMANTIC_WEIGHT: f32 = 0.7;
pub const DEFAULT_BM25_WEIGHT: f32 = 0.3;

const CANDIDATE_MULTIPLIER: usize = 4;
const MIN_CANDIDATES: usize = 20;

/// Substrings that mark OCR serialization artifacts rather than document prose
pub const NON_PROSE_MARKERS: [&str; 3] = [
    "OCRPageObj",
    "image_annotation",
    "dimensions=OCRPageDimensions",
];

#[inline]
pub fn contains_non_prose_marker(text: &str) -> bool {
    NON_PROSE_MARKERS.iter().any(|marker| text.contains(marker))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankParams {
    pub top_k: usize,
    pub semantic_weight: f32,
    pub bm25_weight: f32,
}

impl Default for RankParams {
    #[inline]
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            semantic_weight: DEFAULT_SEMANTIC_WEIGHT,
            bm25_weight: DEFAULT_BM25_WEIGHT,
        }
    }
}

impl RankParams {
    #[inline]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[inline]
    pub fn with_weights(mut self, semantic_weight: f32, bm25_weight: f32) -> Self {
        self.semantic_weight = semantic_weight;
        self.bm25_weight = bm25_weight;
        self
    }

    #[inline]
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(QaError::InvalidParameters(
                "top_k must be at least 1".to_string(),
            ));
        }
        for (name, weight) in [
            ("semantic_weight", self.semantic_weight),
            ("bm25_weight", self.bm25_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(QaError::InvalidParameters(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, weight
                )));
            }
        }
        Ok(())
    }

    fn candidate_pool(&self, corpus_size: usize) -> usize {
        self.top_k
            .saturating_mul(CANDIDATE_MULTIPLIER)
            .max(MIN_CANDIDATES)
            .min(corpus_size)
    }
}

/// A chunk ranked against one query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    /// Position of the chunk in the corpus
    pub index: usize,
    pub text: String,
    /// Raw cosine similarity, 0 when the chunk was outside the semantic candidates
    pub semantic_score: f32,
    /// Raw BM25 score, 0 when no query term matched
    pub lexical_score: f32,
    pub combined_score: f32,
}

/// What a retrieval produced
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    /// No corpus has been ingested, or ingestion left nothing usable
    NoDocuments,
    /// Ranking found chunks but every one was discarded by the content filter
    NoRelevantPassages,
    Passages(Vec<ScoredChunk>),
}

impl RetrievalOutcome {
    /// Ranked passages, empty for both empty states
    #[inline]
    pub fn passages(&self) -> &[ScoredChunk] {
        match self {
            Self::Passages(passages) => passages,
            Self::NoDocuments | Self::NoRelevantPassages => &[],
        }
    }

    #[inline]
    pub fn into_passages(self) -> Vec<ScoredChunk> {
        match self {
            Self::Passages(passages) => passages,
            Self::NoDocuments | Self::NoRelevantPassages => Vec::new(),
        }
    }
}

fn normalize_semantic(candidates: &[(usize, f32)]) -> HashMap<usize, f32> {
    let (min, max) = candidates
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), (_, s)| {
            (min.min(*s), max.max(*s))
        });
    let range = max - min;

    candidates
        .iter()
        .map(|(index, score)| {
            let normalized = if range > f32::EPSILON {
                (score - min) / range
            } else {
                1.0
            };
            (*index, normalized)
        })
        .collect()
}

fn normalize_lexical(candidates: &[(usize, f32)]) -> HashMap<usize, f32> {
    let max = candidates
        .iter()
        .map(|(_, score)| *score)
        .fold(0.0_f32, f32::max);

    candidates
        .iter()
        .map(|(index, score)| {
            let normalized = if max > 0.0 { score / max } else { 0.0 };
            (*index, normalized)
        })
        .collect()
}

/// Rank chunks by the weighted blend of semantic and lexical relevance.
///
/// Returns at most `params.top_k` chunks in descending combined score, ties broken by
/// ascending chunk index. The content filter is not applied here; see [`search`].
#[inline]
pub fn rank(
    store: &ChunkStore,
    query: &str,
    query_embedding: &[f32],
    params: &RankParams,
) -> Result<Vec<ScoredChunk>> {
    params.validate()?;

    if store.is_empty() {
        return Ok(Vec::new());
    }

    let pool = params.candidate_pool(store.len());
    let semantic_candidates = semantic::rank(query_embedding, store, pool)?;
    let lexical_candidates = lexical::rank(store.lexical_index(), query, pool);

    let semantic_norm = normalize_semantic(&semantic_candidates);
    let lexical_norm = normalize_lexical(&lexical_candidates);
    let semantic_raw: HashMap<usize, f32> = semantic_candidates.iter().copied().collect();
    let lexical_raw: HashMap<usize, f32> = lexical_candidates.iter().copied().collect();

    let mut indices: Vec<usize> = semantic_raw
        .keys()
        .chain(lexical_raw.keys())
        .copied()
        .collect();
    indices.sort_unstable();
    indices.dedup();

    let combined: Vec<(usize, f32)> = indices
        .into_iter()
        .map(|index| {
            let semantic = semantic_norm.get(&index).copied().unwrap_or(0.0);
            let lexical = lexical_norm.get(&index).copied().unwrap_or(0.0);
            (
                index,
                params.semantic_weight * semantic + params.bm25_weight * lexical,
            )
        })
        .collect();

    let ranked = semantic::top_k(combined, params.top_k);

    debug!(
        "Ranked {} semantic and {} lexical candidates into {} results",
        semantic_candidates.len(),
        lexical_candidates.len(),
        ranked.len()
    );

    Ok(ranked
        .into_iter()
        .filter_map(|(index, combined_score)| {
            let chunk = store.get(index)?;
            Some(ScoredChunk {
                index,
                text: chunk.text.clone(),
                semantic_score: semantic_raw.get(&index).copied().unwrap_or(0.0),
                lexical_score: lexical_raw.get(&index).copied().unwrap_or(0.0),
                combined_score,
            })
        })
        .collect())
}

/// Rank and then drop chunks that carry [`NON_PROSE_MARKERS`].
#[inline]
pub fn search(
    store: &ChunkStore,
    query: &str,
    query_embedding: &[f32],
    params: &RankParams,
) -> Result<RetrievalOutcome> {
    params.validate()?;

    if store.is_empty() {
        return Ok(RetrievalOutcome::NoDocuments);
    }

    let ranked = rank(store, query, query_embedding, params)?;
    let ranked_count = ranked.len();
    let passages: Vec<ScoredChunk> = ranked
        .into_iter()
        .filter(|passage| !contains_non_prose_marker(&passage.text))
        .collect();

    if passages.len() < ranked_count {
        warn!(
            "Discarded {} non-prose passages from results",
            ranked_count - passages.len()
        );
    }

    if passages.is_empty() {
        return Ok(RetrievalOutcome::NoRelevantPassages);
    }

    Ok(RetrievalOutcome::Passages(passages))
}
