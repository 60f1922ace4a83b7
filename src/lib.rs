use thiserror::Error;

pub type Result<T> = std::result::Result<T, QaError>;

#[derive(Error, Debug)]
pub enum QaError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Invalid session id: {0:?} (expected 1-128 characters of [A-Za-z0-9_-])")]
    InvalidSessionId(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("{service} request failed: {message}")]
    Upstream { service: String, message: String },

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl QaError {
    #[inline]
    pub fn upstream(service: &str, error: impl std::fmt::Display) -> Self {
        Self::Upstream {
            service: service.to_string(),
            message: error.to_string(),
        }
    }
}

pub mod assistant;
pub mod commands;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod indexer;
pub mod retrieval;
pub mod session;
