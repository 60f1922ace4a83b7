use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

use crate::QaError;
use crate::database::sqlite::models::{DocumentChunk, NewDocumentChunk};
use crate::database::sqlite::queries::DocumentChunkQueries;


pub mod models;
pub mod queries;

pub type DbPool = Pool<Sqlite>;

/// Backing record store for the chunks of the active document
#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    #[inline]
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    #[inline]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    #[inline]
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    /// Open `chunks.db` inside `base_dir`, creating the directory if needed
    #[inline]
    pub async fn initialize_from_base_dir(base_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(base_dir).with_context(|| {
            format!("Failed to create base directory: {}", base_dir.display())
        })?;

        Self::new(base_dir.join("chunks.db")).await
    }

    // Chunk operations
    #[inline]
    pub async fn replace_chunks(&self, chunks: &[NewDocumentChunk]) -> crate::Result<u64> {
        DocumentChunkQueries::replace_all(&self.pool, chunks)
            .await
            .map_err(database_error)
    }

    #[inline]
    pub async fn list_chunks(&self) -> crate::Result<Vec<DocumentChunk>> {
        DocumentChunkQueries::list_all(&self.pool)
            .await
            .map_err(database_error)
    }

    #[inline]
    pub async fn count_chunks(&self) -> crate::Result<i64> {
        DocumentChunkQueries::count(&self.pool)
            .await
            .map_err(database_error)
    }

    #[inline]
    pub async fn clear_chunks(&self) -> crate::Result<u64> {
        DocumentChunkQueries::clear(&self.pool)
            .await
            .map_err(database_error)
    }
}

fn database_error(error: anyhow::Error) -> QaError {
    QaError::Database(format!("{:#}", error))
}
