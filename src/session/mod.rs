// Session module
// Append-only chat history, one JSON record per session

pub mod models;


use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{QaError, Result};

pub use models::{Attributes, Message, Role, SessionRecord, SessionStats};

const MAX_SESSION_ID_LENGTH: usize = 128;
/// Idle per-session locks are dropped once the registry grows past this size
const LOCK_REGISTRY_PRUNE_THRESHOLD: usize = 256;

/// Session ids become file names, so they are limited to `[A-Za-z0-9_-]{1,128}`
#[inline]
pub fn validate_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LENGTH
        && session_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

    if valid {
        Ok(())
    } else {
        Err(QaError::InvalidSessionId(session_id.to_string()))
    }
}

/// A message before it is given an id and timestamp
struct Draft {
    role: Role,
    content: String,
    document_context: Attributes,
    metadata: Attributes,
}

/// Persistent per-session message logs.
///
/// Writes to one session are serialized through a per-session lock, so concurrent
/// appends never lose messages. Reads need no lock: records are replaced by an
/// atomic rename and a reader sees either the old or the new file.
#[derive(Debug)]
pub struct ChatHistory {
    storage_dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ChatHistory {
    /// Open (and create if needed) the session directory
    #[inline]
    pub async fn new(storage_dir: impl Into<PathBuf>) -> Result<Self> {
        let storage_dir = storage_dir.into();
        tokio::fs::create_dir_all(&storage_dir).await?;
        info!("Chat history stored in {}", storage_dir.display());

        Ok(Self {
            storage_dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    #[inline]
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.storage_dir.join(format!("{}.json", session_id))
    }

    fn temp_path(&self, session_id: &str) -> PathBuf {
        self.storage_dir.join(format!(".{}.json.tmp", session_id))
    }

    fn session_lock(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

        if locks.len() > LOCK_REGISTRY_PRUNE_THRESHOLD {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }

        Arc::clone(locks.entry(session_id.to_string()).or_default())
    }

    /// Append a message and persist the session before returning it.
    ///
    /// The timestamp is never earlier than the previous message's, so ordering by
    /// time and ordering by append agree.
    #[inline]
    pub async fn add_message(
        &self,
        session_id: &str,
        role: Role,
        content: impl Into<String>,
        document_context: Option<Attributes>,
        metadata: Option<Attributes>,
    ) -> Result<Message> {
        let mut appended = self
            .append(
                session_id,
                vec![Draft {
                    role,
                    content: content.into(),
                    document_context: document_context.unwrap_or_default(),
                    metadata: metadata.unwrap_or_default(),
                }],
            )
            .await?;

        appended
            .pop()
            .ok_or_else(|| QaError::Other(anyhow::anyhow!("No message was appended")))
    }

    /// Append a user question and the assistant's answer as one write.
    ///
    /// Both messages land under a single lock acquisition, so concurrent exchanges
    /// on the same session never interleave and a question is never stored without
    /// its answer.
    #[inline]
    pub async fn add_exchange(
        &self,
        session_id: &str,
        question: impl Into<String>,
        answer: impl Into<String>,
        document_context: Option<Attributes>,
    ) -> Result<(Message, Message)> {
        let mut appended = self
            .append(
                session_id,
                vec![
                    Draft {
                        role: Role::User,
                        content: question.into(),
                        document_context: Attributes::new(),
                        metadata: Attributes::new(),
                    },
                    Draft {
                        role: Role::Assistant,
                        content: answer.into(),
                        document_context: document_context.unwrap_or_default(),
                        metadata: Attributes::new(),
                    },
                ],
            )
            .await?;

        let answer = appended.pop();
        let question = appended.pop();
        question
            .zip(answer)
            .ok_or_else(|| QaError::Other(anyhow::anyhow!("Exchange was not appended")))
    }

    async fn append(&self, session_id: &str, drafts: Vec<Draft>) -> Result<Vec<Message>> {
        validate_session_id(session_id)?;

        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;

        let mut messages = self.read_messages(session_id).await;
        let mut appended = Vec::with_capacity(drafts.len());

        for draft in drafts {
            let now = Utc::now();
            let timestamp = messages
                .last()
                .map_or(now, |previous| now.max(previous.timestamp));

            let message = Message {
                id: Uuid::new_v4(),
                timestamp,
                role: draft.role,
                content: draft.content,
                document_context: draft.document_context,
                metadata: draft.metadata,
            };
            messages.push(message.clone());
            appended.push(message);
        }

        self.write_record(session_id, &SessionRecord { messages })
            .await?;

        for message in &appended {
            debug!(
                "Added {} message {} to session {}",
                message.role, message.id, session_id
            );
        }
        Ok(appended)
    }

    /// All messages of a session in append order; empty when the session does not
    /// exist or its record cannot be read
    #[inline]
    pub async fn get_messages(&self, session_id: &str) -> Result<Vec<Message>> {
        validate_session_id(session_id)?;
        Ok(self.read_messages(session_id).await)
    }

    /// Delete a session. Returns whether a record existed.
    #[inline]
    pub async fn clear_session(&self, session_id: &str) -> Result<bool> {
        validate_session_id(session_id)?;

        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;

        match tokio::fs::remove_file(self.session_path(session_id)).await {
            Ok(()) => {
                info!("Cleared session {}", session_id);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    #[inline]
    pub async fn get_session_stats(&self, session_id: &str) -> Result<SessionStats> {
        let messages = self.get_messages(session_id).await?;
        Ok(SessionStats::from_messages(&messages))
    }

    /// Ids of all sessions with a record on disk, sorted
    #[inline]
    pub async fn list_sessions(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.storage_dir).await?;
        let mut sessions = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if validate_session_id(stem).is_ok() {
                sessions.push(stem.to_string());
            }
        }

        sessions.sort();
        Ok(sessions)
    }

    async fn read_messages(&self, session_id: &str) -> Vec<Message> {
        let path = self.session_path(session_id);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(
                    "Could not read session record {}: {}; treating as empty",
                    path.display(),
                    e
                );
                return Vec::new();
            }
        };

        match serde_json::from_slice::<SessionRecord>(&bytes) {
            Ok(record) => record.messages,
            Err(e) => {
                warn!(
                    "Corrupt session record {}: {}; treating as empty",
                    path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    async fn write_record(&self, session_id: &str, record: &SessionRecord) -> Result<()> {
        let temp_path = self.temp_path(session_id);
        let json = serde_json::to_vec_pretty(record)?;

        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&temp_path, self.session_path(session_id)).await?;
        Ok(())
    }
}
