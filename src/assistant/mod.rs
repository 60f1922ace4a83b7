// Assistant module
// Question answering over the active corpus, recorded in the chat history


use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::config::RetrievalConfig;
use crate::embeddings::Completer;
use crate::retrieval::{RetrievalOutcome, Retriever, ScoredChunk};
use crate::session::{Attributes, ChatHistory, validate_session_id};
use crate::{QaError, Result};

pub const NO_DOCUMENTS_ANSWER: &str = "No documents available. Please upload a document first.";
pub const NO_RELEVANT_PASSAGES_ANSWER: &str =
    "I couldn't find relevant information in the document.";

const EXCERPT_SEPARATOR: &str = "\n---\n";
const TRUNCATION_MARKER: &str = "... [truncated]";

/// Reply to one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    /// Preview of the excerpts the answer was based on, empty for the fixed replies
    pub context: String,
    /// Combined score of the best passage, 0 for the fixed replies
    pub score: f32,
}

impl Answer {
    fn fixed(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            context: String::new(),
            score: 0.0,
        }
    }
}

/// Joins retrieval, the completion model and the chat history
pub struct Assistant {
    retriever: Arc<Retriever>,
    history: Arc<ChatHistory>,
    completer: Arc<dyn Completer>,
    settings: RetrievalConfig,
}

impl Assistant {
    #[inline]
    pub fn new(
        retriever: Arc<Retriever>,
        history: Arc<ChatHistory>,
        completer: Arc<dyn Completer>,
        settings: RetrievalConfig,
    ) -> Self {
        Self {
            retriever,
            history,
            completer,
            settings,
        }
    }

    #[inline]
    pub fn retriever(&self) -> &Arc<Retriever> {
        &self.retriever
    }

    #[inline]
    pub fn history(&self) -> &Arc<ChatHistory> {
        &self.history
    }

    /// Answer `question` from the active corpus and record the exchange under
    /// `session_id`.
    ///
    /// An empty corpus or a fully filtered result produce fixed replies rather than
    /// errors. Failures of the embedding or completion backend are returned as
    /// [`QaError::Upstream`] and nothing is recorded.
    #[inline]
    pub async fn ask(&self, session_id: &str, question: &str) -> Result<Answer> {
        validate_session_id(session_id)?;
        info!("Answering question for session {}", session_id);

        let outcome = self
            .retriever
            .retrieve(question, self.settings.answer_params())
            .await?;

        let (answer, document_context) = match outcome {
            RetrievalOutcome::NoDocuments => (Answer::fixed(NO_DOCUMENTS_ANSWER), None),
            RetrievalOutcome::NoRelevantPassages => {
                (Answer::fixed(NO_RELEVANT_PASSAGES_ANSWER), None)
            }
            RetrievalOutcome::Passages(passages) => {
                let answer = self.answer_from(question, &passages).await?;
                let context = document_context(&answer, &passages);
                (answer, Some(context))
            }
        };

        self.history
            .add_exchange(session_id, question, answer.answer.clone(), document_context)
            .await?;

        Ok(answer)
    }

    async fn answer_from(&self, question: &str, passages: &[ScoredChunk]) -> Result<Answer> {
        let context = join_excerpts(passages);
        let prompt = build_prompt(
            &truncate_chars(&context, self.settings.max_context_chars, TRUNCATION_MARKER),
            question,
        );
        debug!(
            "Prompting with {} passages ({} characters)",
            passages.len(),
            prompt.chars().count()
        );

        let completer = Arc::clone(&self.completer);
        let reply = tokio::task::spawn_blocking(move || completer.complete(&prompt))
            .await
            .map_err(|e| QaError::Other(anyhow::anyhow!("Completion task failed: {}", e)))??;

        Ok(Answer {
            answer: reply,
            context: context_preview(&context, self.settings.context_preview_chars),
            score: passages.first().map_or(0.0, |p| p.combined_score),
        })
    }
}

fn document_context(answer: &Answer, passages: &[ScoredChunk]) -> Attributes {
    let mut context = Attributes::new();
    context.insert("context".to_string(), json!(answer.context));
    context.insert("score".to_string(), json!(answer.score));
    context.insert(
        "chunks".to_string(),
        json!(passages.iter().map(|p| p.index).collect::<Vec<_>>()),
    );
    context
}

/// Passage texts in rank order, separated by a horizontal rule
#[inline]
pub fn join_excerpts(passages: &[ScoredChunk]) -> String {
    passages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(EXCERPT_SEPARATOR)
}

#[inline]
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are an AI assistant. Use the following document excerpts to answer the user's question as specifically as possible.\n\nDocument Excerpts:\n{}\n\nUser Question: {}\n\nAnswer:",
        context, question
    )
}

/// The first `max_chars` characters of `context`, followed by `...` when cut
#[inline]
pub fn context_preview(context: &str, max_chars: usize) -> String {
    truncate_chars(context, max_chars, "...")
}

fn truncate_chars(text: &str, max_chars: usize, marker: &str) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str(marker);
    truncated
}
