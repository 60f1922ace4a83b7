
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{QaError, Result};

/// A persisted chunk; `embedding` holds the vector as a JSON array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DocumentChunk {
    pub id: i64,
    pub text: String,
    pub embedding: String,
    pub created_date: NaiveDateTime,
}

impl DocumentChunk {
    #[inline]
    pub fn embedding_vector(&self) -> Result<Vec<f32>> {
        serde_json::from_str(&self.embedding).map_err(|e| {
            QaError::Database(format!(
                "Chunk {} has a malformed embedding: {}",
                self.id, e
            ))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocumentChunk {
    pub text: String,
    pub embedding: Vec<f32>,
}

impl NewDocumentChunk {
    #[inline]
    pub fn new(text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            text: text.into(),
            embedding,
        }
    }

    #[inline]
    pub fn embedding_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.embedding)?)
    }
}
