// Embeddings module
// Model backends (embedding and completion) and document chunking

pub mod chunking;
pub mod ollama;

use crate::Result;

pub use chunking::{ChunkingConfig, is_text_chunk, split_into_chunks};
pub use ollama::OllamaClient;

/// Turns text into dense vectors.
///
/// Implementations may block on network I/O; async callers run them on
/// `tokio::task::spawn_blocking`.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, returning one vector per input in input order
    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Produces an answer for a fully rendered prompt
pub trait Completer: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String>;
}
