#[cfg(test)]
mod tests;

use tracing::{debug, warn};

use crate::retrieval::lexical::LexicalIndex;
use crate::{QaError, Result};

/// A passage of document text together with its dense embedding
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub embedding: Vec<f32>,
}

/// The active document corpus.
///
/// A store is immutable once built. Re-ingestion builds a fresh store and the
/// owner swaps it in, so a half-loaded corpus is never observable.
#[derive(Debug, Clone, Default)]
pub struct ChunkStore {
    chunks: Vec<Chunk>,
    dimension: usize,
    lexical: LexicalIndex,
}

impl ChunkStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from parallel sequences of chunk texts and embeddings.
    ///
    /// Chunks whose text is blank after trimming are dropped together with their
    /// embedding. Fails with [`QaError::DimensionMismatch`] when the sequences differ
    /// in length, the embeddings do not share a single non-zero dimension, or any
    /// component is NaN or infinite.
    #[inline]
    pub fn from_parts(chunks: Vec<String>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(QaError::DimensionMismatch(format!(
                "received {} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let dimension = embeddings.first().map_or(0, Vec::len);
        if !embeddings.is_empty() && dimension == 0 {
            return Err(QaError::DimensionMismatch(
                "embeddings must have at least one dimension".to_string(),
            ));
        }

        if let Some((position, embedding)) = embeddings
            .iter()
            .enumerate()
            .find(|(_, embedding)| embedding.len() != dimension)
        {
            return Err(QaError::DimensionMismatch(format!(
                "embedding {} has dimension {} but expected {}",
                position,
                embedding.len(),
                dimension
            )));
        }

        if let Some(position) = embeddings
            .iter()
            .position(|embedding| embedding.iter().any(|value| !value.is_finite()))
        {
            return Err(QaError::DimensionMismatch(format!(
                "embedding {} contains a non-finite component",
                position
            )));
        }

        let received = chunks.len();
        let chunks: Vec<Chunk> = chunks
            .into_iter()
            .zip(embeddings)
            .filter_map(|(text, embedding)| {
                let text = text.trim();
                (!text.is_empty()).then(|| Chunk {
                    text: text.to_string(),
                    embedding,
                })
            })
            .collect();

        if chunks.len() < received {
            warn!(
                "Dropped {} blank chunks while loading corpus",
                received - chunks.len()
            );
        }

        let dimension = if chunks.is_empty() { 0 } else { dimension };
        let lexical = LexicalIndex::build(chunks.iter().map(|chunk| chunk.text.as_str()));

        debug!(
            "Loaded corpus of {} chunks with dimension {}",
            chunks.len(),
            dimension
        );

        Ok(Self {
            chunks,
            dimension,
            lexical,
        })
    }

    /// Replace the contents of this store.
    ///
    /// The replacement is built completely before it is assigned, so on error the
    /// previous corpus is left untouched.
    #[inline]
    pub fn load(&mut self, chunks: Vec<String>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        *self = Self::from_parts(chunks, embeddings)?;
        Ok(())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Embedding dimension shared by every chunk, or 0 for an empty store
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    #[inline]
    pub fn lexical_index(&self) -> &LexicalIndex {
        &self.lexical
    }
}
