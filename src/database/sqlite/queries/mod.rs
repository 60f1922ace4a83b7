
use super::models::*;
use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::debug;

pub struct DocumentChunkQueries;

impl DocumentChunkQueries {
    /// Replace every stored chunk with `chunks` in a single transaction
    #[inline]
    pub async fn replace_all(pool: &SqlitePool, chunks: &[NewDocumentChunk]) -> Result<u64> {
        let mut tx = pool.begin().await.context("Failed to begin transaction")?;

        let removed = sqlx::query("DELETE FROM document_chunks")
            .execute(&mut *tx)
            .await
            .context("Failed to delete existing chunks")?
            .rows_affected();

        for chunk in chunks {
            let embedding = chunk
                .embedding_json()
                .context("Failed to serialize chunk embedding")?;
            sqlx::query("INSERT INTO document_chunks (text, embedding) VALUES (?, ?)")
                .bind(&chunk.text)
                .bind(embedding)
                .execute(&mut *tx)
                .await
                .context("Failed to insert chunk")?;
        }

        tx.commit().await.context("Failed to commit chunk replacement")?;

        debug!(
            "Replaced {} stored chunks with {}",
            removed,
            chunks.len()
        );
        Ok(chunks.len() as u64)
    }

    /// All chunks in insertion order
    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<DocumentChunk>> {
        let chunks = sqlx::query_as::<_, DocumentChunk>(
            "SELECT id, text, embedding, created_date FROM document_chunks ORDER BY id",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list chunks")?;

        Ok(chunks)
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM document_chunks")
            .fetch_one(pool)
            .await
            .context("Failed to count chunks")?;

        Ok(count)
    }

    #[inline]
    pub async fn clear(pool: &SqlitePool) -> Result<u64> {
        let removed = sqlx::query("DELETE FROM document_chunks")
            .execute(pool)
            .await
            .context("Failed to clear chunks")?
            .rows_affected();

        Ok(removed)
    }
}
