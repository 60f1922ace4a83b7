// Indexer module
// Turns a document into the active corpus: split, filter, embed, persist, swap


use std::path::Path;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::database::sqlite::Database;
use crate::database::sqlite::models::NewDocumentChunk;
use crate::embeddings::{ChunkingConfig, Embedder, is_text_chunk, split_into_chunks};
use crate::retrieval::{ChunkStore, Retriever};
use crate::{QaError, Result};

const DEFAULT_EMBED_BATCH_SIZE: usize = 16;

/// Outcome of one ingest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Chunks now in the active corpus
    pub chunks: usize,
    /// Characters of extracted text
    pub text_length: usize,
    /// Chunks dropped as too short or non-prose
    pub discarded_chunks: usize,
}

pub struct DocumentIndexer {
    database: Database,
    retriever: Arc<Retriever>,
    embedder: Arc<dyn Embedder>,
    chunking: ChunkingConfig,
    batch_size: usize,
    /// Held while the stored and the active corpus are replaced, so both always
    /// come from the same document
    commit_lock: Mutex<()>,
}

impl DocumentIndexer {
    #[inline]
    pub fn new(
        database: Database,
        retriever: Arc<Retriever>,
        embedder: Arc<dyn Embedder>,
        chunking: ChunkingConfig,
    ) -> Self {
        Self {
            database,
            retriever,
            embedder,
            chunking,
            batch_size: DEFAULT_EMBED_BATCH_SIZE,
            commit_lock: Mutex::new(()),
        }
    }

    /// Number of chunks sent to the embedder per call
    #[inline]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Read a plain-text or markdown file and ingest its contents
    #[inline]
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestReport> {
        info!("Ingesting document {}", path.display());

        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            QaError::Ingestion(format!("Failed to read {}: {}", path.display(), e))
        })?;

        self.ingest_text(&text).await
    }

    /// Replace the active corpus with the chunks of `text`.
    ///
    /// The chunk database and the in-memory corpus are only touched once every chunk
    /// has been embedded; any earlier failure leaves both as they were.
    #[inline]
    pub async fn ingest_text(&self, text: &str) -> Result<IngestReport> {
        if text.trim().is_empty() {
            warn!("No text extracted from document");
            return Err(QaError::Ingestion(
                "No text extracted from document".to_string(),
            ));
        }

        let raw_chunks = split_into_chunks(text, self.chunking.chunk_size, self.chunking.chunk_overlap);
        let raw_count = raw_chunks.len();
        let chunks: Vec<String> = raw_chunks
            .into_iter()
            .filter(|chunk| is_text_chunk(chunk, self.chunking.min_chunk_chars))
            .collect();
        debug!("Kept {} of {} chunks after filtering", chunks.len(), raw_count);

        if chunks.is_empty() {
            warn!("No valid text chunks found in document after filtering");
            return Err(QaError::Ingestion(
                "No valid text chunks found in document. Please check the document content."
                    .to_string(),
            ));
        }

        let embeddings = self.embed_chunks(&chunks).await?;
        let records: Vec<NewDocumentChunk> = chunks
            .iter()
            .zip(&embeddings)
            .map(|(text, embedding)| NewDocumentChunk::new(text.clone(), embedding.clone()))
            .collect();

        let store = ChunkStore::from_parts(chunks, embeddings)?;
        let count = store.len();
        {
            let _commit = self.commit_lock.lock().await;
            self.database.replace_chunks(&records).await?;
            self.retriever.replace(store).await;
        }

        let report = IngestReport {
            chunks: count,
            text_length: text.chars().count(),
            discarded_chunks: raw_count - count,
        };
        info!(
            "Document processed: {} chunks from {} characters",
            report.chunks, report.text_length
        );
        Ok(report)
    }

    /// Drop the active corpus and every stored chunk
    #[inline]
    pub async fn clear(&self) -> Result<u64> {
        let _commit = self.commit_lock.lock().await;
        let removed = self.database.clear_chunks().await?;
        self.retriever.clear().await;
        info!("Removed {} stored chunks", removed);
        Ok(removed)
    }

    async fn embed_chunks(&self, chunks: &[String]) -> Result<Vec<Vec<f32>>> {
        let bar = if console::user_attended_stderr() {
            ProgressBar::new(chunks.len() as u64).with_style(
                ProgressStyle::with_template("{spinner} [{pos}/{len}] Embedding chunks")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            )
        } else {
            ProgressBar::hidden()
        };

        let mut embeddings = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let embedder = Arc::clone(&self.embedder);
            let batch = batch.to_vec();
            let size = batch.len();

            let batch_embeddings = tokio::task::spawn_blocking(move || embedder.embed_batch(&batch))
                .await
                .map_err(|e| QaError::Other(anyhow::anyhow!("Embedding task failed: {}", e)))??;

            if batch_embeddings.len() != size {
                bar.abandon();
                return Err(QaError::DimensionMismatch(format!(
                    "embedder returned {} vectors for {} chunks",
                    batch_embeddings.len(),
                    size
                )));
            }

            embeddings.extend(batch_embeddings);
            bar.inc(size as u64);
        }

        bar.finish_and_clear();
        Ok(embeddings)
    }
}
