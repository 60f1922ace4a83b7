
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::assistant::Answer;
use crate::assistant::Assistant;
use crate::config::Config;
use crate::database::sqlite::Database;
use crate::embeddings::{Completer, Embedder, OllamaClient};
use crate::indexer::{DocumentIndexer, IngestReport};
use crate::retrieval::{RankParams, RetrievalOutcome, Retriever};
use crate::session::{ChatHistory, Message, SessionStats};

/// Session used when the caller does not name one
pub const DEFAULT_SESSION: &str = "default";

const STATUS_PREVIEWS: usize = 3;
const SEARCH_PREVIEW_CHARS: usize = 300;

/// Everything a command needs, opened from one configuration
pub struct Workspace {
    config: Config,
    database: Database,
    client: Arc<OllamaClient>,
    retriever: Arc<Retriever>,
    history: Arc<ChatHistory>,
    indexer: DocumentIndexer,
}

impl Workspace {
    /// Open the chunk database and chat history under the configured base directory
    /// and restore the active corpus from the stored chunks
    #[inline]
    pub async fn open(config: Config) -> Result<Self> {
        let workspace = Self::connect(config).await?;
        workspace
            .retriever
            .restore(&workspace.database)
            .await
            .context("Failed to restore document chunks")?;
        Ok(workspace)
    }

    /// Like [`Workspace::open`] but with an empty active corpus; stored chunks are
    /// left unread
    #[inline]
    pub async fn connect(config: Config) -> Result<Self> {
        let database = Database::initialize_from_base_dir(config.get_base_dir())
            .await
            .context("Failed to initialize chunk database")?;

        let client = Arc::new(
            OllamaClient::new(&config.ollama).context("Failed to create Ollama client")?,
        );
        let embedder: Arc<dyn Embedder> = Arc::<OllamaClient>::clone(&client);
        let retriever = Arc::new(Retriever::new(Arc::clone(&embedder)));
        let indexer = DocumentIndexer::new(
            database.clone(),
            Arc::clone(&retriever),
            embedder,
            config.chunking.clone(),
        )
        .with_batch_size(config.ollama.batch_size as usize);

        let history = Arc::new(
            ChatHistory::new(config.sessions_dir())
                .await
                .context("Failed to open chat history")?,
        );

        Ok(Self {
            config,
            database,
            client,
            retriever,
            history,
            indexer,
        })
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn retriever(&self) -> &Arc<Retriever> {
        &self.retriever
    }

    #[inline]
    pub fn history(&self) -> &Arc<ChatHistory> {
        &self.history
    }

    #[inline]
    pub fn indexer(&self) -> &DocumentIndexer {
        &self.indexer
    }

    #[inline]
    pub fn assistant(&self) -> Assistant {
        let completer: Arc<dyn Completer> = Arc::<OllamaClient>::clone(&self.client);
        Assistant::new(
            Arc::clone(&self.retriever),
            Arc::clone(&self.history),
            completer,
            self.config.retrieval.clone(),
        )
    }
}

/// Replace the active corpus with the contents of a text or markdown file
#[inline]
pub async fn ingest_document(config: Config, path: &Path) -> Result<IngestReport> {
    let workspace = Workspace::open(config).await?;

    let report = workspace
        .indexer()
        .ingest_file(path)
        .await
        .with_context(|| format!("Failed to ingest {}", path.display()))?;

    println!("✓ Document processed: {}", path.display());
    println!("  Chunks indexed: {}", report.chunks);
    println!("  Characters extracted: {}", report.text_length);
    if report.discarded_chunks > 0 {
        println!("  Chunks discarded: {}", report.discarded_chunks);
    }

    Ok(report)
}

/// Ask one question and record the exchange in `session_id`
#[inline]
pub async fn ask_question(config: Config, question: &str, session_id: &str) -> Result<Answer> {
    let workspace = Workspace::open(config).await?;

    let answer = workspace
        .assistant()
        .ask(session_id, question)
        .await
        .context("Failed to answer question")?;

    println!("{}", answer.answer);
    if !answer.context.is_empty() {
        println!();
        println!("Score: {:.3}", answer.score);
        println!("Context:");
        println!("{}", answer.context);
    }

    Ok(answer)
}

/// Print the passages a question would be answered from
#[inline]
pub async fn search(config: Config, query: &str, params: RankParams) -> Result<RetrievalOutcome> {
    let workspace = Workspace::open(config).await?;

    let outcome = workspace
        .retriever()
        .retrieve(query, params)
        .await
        .context("Search failed")?;

    match &outcome {
        RetrievalOutcome::NoDocuments => {
            println!("No documents available. Use 'doc-qa ingest <file>' first.");
        }
        RetrievalOutcome::NoRelevantPassages => {
            println!("No relevant passages found for: {}", query);
        }
        RetrievalOutcome::Passages(passages) => {
            println!("Top {} passages for: {}", passages.len(), query);
            println!();
            for (rank, passage) in passages.iter().enumerate() {
                println!(
                    "{}. chunk #{} (combined {:.3}, semantic {:.3}, bm25 {:.3})",
                    rank + 1,
                    passage.index,
                    passage.combined_score,
                    passage.semantic_score,
                    passage.lexical_score
                );
                let preview: String = passage.text.chars().take(SEARCH_PREVIEW_CHARS).collect();
                println!("   {}", preview.replace('\n', "\n   "));
                println!();
            }
        }
    }

    Ok(outcome)
}

#[inline]
pub async fn show_history(config: Config, session_id: &str) -> Result<Vec<Message>> {
    let workspace = Workspace::open(config).await?;
    let messages = workspace.history().get_messages(session_id).await?;

    if messages.is_empty() {
        println!("No messages in session '{}'.", session_id);
        return Ok(messages);
    }

    println!("Session '{}' ({} messages):", session_id, messages.len());
    println!();
    for message in &messages {
        println!(
            "[{}] {}:",
            message.timestamp.format("%Y-%m-%d %H:%M:%S"),
            message.role
        );
        println!("{}", message.content);
        println!();
    }

    Ok(messages)
}

#[inline]
pub async fn show_session_stats(config: Config, session_id: &str) -> Result<SessionStats> {
    let workspace = Workspace::open(config).await?;
    let stats = workspace.history().get_session_stats(session_id).await?;

    println!("Session '{}':", session_id);
    println!("  Total messages: {}", stats.total_messages);
    println!("  User messages: {}", stats.user_messages);
    println!("  Assistant messages: {}", stats.assistant_messages);
    println!(
        "  Document context: {}",
        if stats.has_document_context { "yes" } else { "no" }
    );
    if let Some(last) = stats.last_message_at {
        println!("  Last message: {}", last.format("%Y-%m-%d %H:%M:%S"));
    }

    Ok(stats)
}

#[inline]
pub async fn list_sessions(config: Config) -> Result<Vec<String>> {
    let workspace = Workspace::open(config).await?;
    let sessions = workspace.history().list_sessions().await?;

    if sessions.is_empty() {
        println!("No chat sessions yet.");
    } else {
        println!("Chat sessions ({} total):", sessions.len());
        for session in &sessions {
            println!("  {}", session);
        }
    }

    Ok(sessions)
}

#[inline]
pub async fn clear_session(config: Config, session_id: &str) -> Result<bool> {
    let workspace = Workspace::open(config).await?;
    let removed = workspace.history().clear_session(session_id).await?;

    if removed {
        println!("✓ Cleared session '{}'", session_id);
    } else {
        println!("Session '{}' had no history.", session_id);
    }

    Ok(removed)
}

/// Drop the active corpus and every stored chunk
#[inline]
pub async fn clear_documents(config: Config) -> Result<u64> {
    // Stored chunks may be unreadable; clearing must not depend on loading them
    let workspace = Workspace::connect(config).await?;
    let removed = workspace.indexer().clear().await?;

    println!("✓ Removed {} document chunks", removed);
    Ok(removed)
}

#[inline]
pub async fn show_status(config: Config) -> Result<()> {
    let workspace = Workspace::open(config).await?;
    let config = workspace.config();

    println!("📊 Doc QA Status");
    println!();

    println!("🤖 Ollama:");
    let probe = OllamaClient::new(&config.ollama)?
        .with_timeout(Duration::from_secs(5))
        .with_retry_attempts(1);
    let probe_result = tokio::task::spawn_blocking(move || probe.health_check())
        .await
        .context("Health check task failed")?;
    match probe_result {
        Ok(()) => println!(
            "   ✅ Connected to {}:{} ({}, {})",
            config.ollama.host,
            config.ollama.port,
            config.ollama.model,
            config.ollama.completion_model
        ),
        Err(e) => {
            warn!("Ollama health check failed: {:#}", e);
            println!("   ❌ Unavailable: {:#}", e);
            println!("   Use 'doc-qa config' to update connection settings.");
        }
    }

    println!();
    println!("📄 Document:");
    let summary = workspace.retriever().summary(STATUS_PREVIEWS).await;
    if summary.chunk_count == 0 {
        println!("   📭 No document ingested yet");
    } else {
        println!("   Chunks: {}", summary.chunk_count);
        println!("   Embedding dimension: {}", summary.dimension);
        println!("   Characters: {}", summary.total_characters);
        for preview in &summary.previews {
            println!("   • {}", preview.replace('\n', " "));
        }
    }

    println!();
    println!("💬 Sessions:");
    let sessions = workspace.history().list_sessions().await?;
    if sessions.is_empty() {
        println!("   No chat sessions yet");
    } else {
        for session in &sessions {
            let stats = workspace.history().get_session_stats(session).await?;
            println!("   {} ({} messages)", session, stats.total_messages);
        }
    }

    info!("Status reported for {}", config.get_base_dir().display());
    Ok(())
}
