
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Free-form JSON object attached to a message
pub type Attributes = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry of a session's history. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub document_context: Attributes,
    #[serde(default)]
    pub metadata: Attributes,
}

impl Message {
    #[inline]
    pub fn has_document_context(&self) -> bool {
        !self.document_context.is_empty()
    }
}

/// On-disk shape of a session record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub total_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub has_document_context: bool,
    pub last_message_at: Option<DateTime<Utc>>,
}

impl SessionStats {
    #[inline]
    pub fn from_messages(messages: &[Message]) -> Self {
        Self {
            total_messages: messages.len(),
            user_messages: messages.iter().filter(|m| m.role == Role::User).count(),
            assistant_messages: messages
                .iter()
                .filter(|m| m.role == Role::Assistant)
                .count(),
            has_document_context: messages.iter().any(Message::has_document_context),
            last_message_at: messages.last().map(|m| m.timestamp),
        }
    }
}
