//! Dense cosine-similarity scoring over a [`ChunkStore`].

#[cfg(test)]
mod tests;

use std::cmp::Ordering;

use crate::retrieval::chunk_store::ChunkStore;
use crate::{QaError, Result};

/// Added to the norm product so zero vectors score 0 instead of NaN
pub const EPSILON: f32 = 1e-9;

/// Cosine similarity in `[-1, 1]`
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|y| y * y).sum::<f32>().sqrt();
    dot / (norm_a * norm_b + EPSILON)
}

/// Descending by score, then ascending by chunk index
#[inline]
pub fn by_score_then_index(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

/// Keep the `k` best entries in rank order.
///
/// Uses partial selection so only the retained prefix is fully sorted.
pub(crate) fn top_k(mut scored: Vec<(usize, f32)>, k: usize) -> Vec<(usize, f32)> {
    if k == 0 {
        return Vec::new();
    }
    if k < scored.len() {
        scored.select_nth_unstable_by(k - 1, by_score_then_index);
        scored.truncate(k);
    }
    scored.sort_by(by_score_then_index);
    scored
}

/// Rank every chunk in `store` by cosine similarity to `query` and return the top `k`
/// as `(chunk index, score)` pairs.
///
/// An empty store yields an empty ranking. A query whose dimension differs from the
/// corpus is rejected.
#[inline]
pub fn rank(query: &[f32], store: &ChunkStore, k: usize) -> Result<Vec<(usize, f32)>> {
    if store.is_empty() {
        return Ok(Vec::new());
    }

    if query.len() != store.dimension() {
        return Err(QaError::DimensionMismatch(format!(
            "query embedding has dimension {} but the corpus uses {}",
            query.len(),
            store.dimension()
        )));
    }

    let scored = store
        .chunks()
        .iter()
        .enumerate()
        .map(|(index, chunk)| (index, cosine_similarity(&chunk.embedding, query)))
        .collect();

    Ok(top_k(scored, k))
}
