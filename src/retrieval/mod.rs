// Retrieval module
// Hybrid semantic + keyword ranking over the active document corpus

pub mod chunk_store;
pub mod hybrid;
pub mod lexical;
pub mod semantic;


use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::database::sqlite::Database;
use crate::embeddings::Embedder;
use crate::{QaError, Result};

pub use chunk_store::{Chunk, ChunkStore};
pub use hybrid::{RankParams, RetrievalOutcome, ScoredChunk};

const PREVIEW_CHARS: usize = 200;

/// Owner of the active corpus and entry point for ranking queries against it.
///
/// The corpus is held as an immutable snapshot. [`Retriever::ingest`] builds a new
/// [`ChunkStore`] and swaps it in; queries already running keep the snapshot they
/// started with.
pub struct Retriever {
    store: RwLock<Arc<ChunkStore>>,
    embedder: Arc<dyn Embedder>,
}

/// Summary of the active corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusSummary {
    pub chunk_count: usize,
    pub dimension: usize,
    pub total_characters: usize,
    pub previews: Vec<String>,
}

impl Retriever {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store: RwLock::new(Arc::new(ChunkStore::new())),
            embedder,
        }
    }

    /// Rebuild the in-memory corpus from the chunk records in `database`
    #[inline]
    pub async fn restore(&self, database: &Database) -> Result<usize> {
        let records = database.list_chunks().await?;
        let mut texts = Vec::with_capacity(records.len());
        let mut embeddings = Vec::with_capacity(records.len());
        for record in records {
            embeddings.push(record.embedding_vector()?);
            texts.push(record.text);
        }

        let store = ChunkStore::from_parts(texts, embeddings)?;
        let count = store.len();
        self.replace(store).await;

        info!("Restored {} chunks from the chunk database", count);
        Ok(count)
    }

    /// Replace the active corpus.
    ///
    /// Fails with [`QaError::DimensionMismatch`] on malformed input, in which case the
    /// previous corpus stays active.
    #[inline]
    pub async fn ingest(&self, chunks: Vec<String>, embeddings: Vec<Vec<f32>>) -> Result<usize> {
        let store = ChunkStore::from_parts(chunks, embeddings)?;
        let count = store.len();
        self.replace(store).await;
        Ok(count)
    }

    /// Swap in an already validated store
    #[inline]
    pub async fn replace(&self, store: ChunkStore) {
        let count = store.len();
        *self.store.write().await = Arc::new(store);
        info!("Active corpus replaced with {} chunks", count);
    }

    #[inline]
    pub async fn clear(&self) {
        self.replace(ChunkStore::new()).await;
    }

    /// The corpus as of this call
    #[inline]
    pub async fn snapshot(&self) -> Arc<ChunkStore> {
        Arc::clone(&*self.store.read().await)
    }

    #[inline]
    pub async fn is_empty(&self) -> bool {
        self.snapshot().await.is_empty()
    }

    /// Embed `query` and rank the corpus against it
    #[inline]
    pub async fn retrieve(&self, query: &str, params: RankParams) -> Result<RetrievalOutcome> {
        params.validate()?;

        let store = self.snapshot().await;
        if store.is_empty() {
            debug!("Retrieval requested with no documents ingested");
            return Ok(RetrievalOutcome::NoDocuments);
        }

        let embedder = Arc::clone(&self.embedder);
        let text = query.to_string();
        let query_embedding = tokio::task::spawn_blocking(move || embedder.embed(&text))
            .await
            .map_err(|e| QaError::Other(anyhow::anyhow!("Embedding task failed: {}", e)))??;

        self.rank_snapshot(store, query, query_embedding, params)
            .await
    }

    /// Rank the corpus against a query whose embedding is already known
    #[inline]
    pub async fn retrieve_with_embedding(
        &self,
        query: &str,
        query_embedding: Vec<f32>,
        params: RankParams,
    ) -> Result<RetrievalOutcome> {
        let store = self.snapshot().await;
        self.rank_snapshot(store, query, query_embedding, params)
            .await
    }

    async fn rank_snapshot(
        &self,
        store: Arc<ChunkStore>,
        query: &str,
        query_embedding: Vec<f32>,
        params: RankParams,
    ) -> Result<RetrievalOutcome> {
        let text = query.to_string();
        let outcome = tokio::task::spawn_blocking(move || {
            hybrid::search(&store, &text, &query_embedding, &params)
        })
        .await
        .map_err(|e| QaError::Other(anyhow::anyhow!("Ranking task failed: {}", e)))??;

        debug!(
            "Retrieved {} passages for query '{}'",
            outcome.passages().len(),
            query
        );
        Ok(outcome)
    }

    /// Chunk count, dimension and leading chunk previews of the active corpus
    #[inline]
    pub async fn summary(&self, preview_count: usize) -> CorpusSummary {
        let store = self.snapshot().await;
        CorpusSummary {
            chunk_count: store.len(),
            dimension: store.dimension(),
            total_characters: store.chunks().iter().map(|c| c.text.chars().count()).sum(),
            previews: store
                .chunks()
                .iter()
                .take(preview_count)
                .map(|chunk| chunk.text.chars().take(PREVIEW_CHARS).collect())
                .collect(),
        }
    }
}
