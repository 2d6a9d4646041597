// OpenAI Assistants API (v2) wire types
// https://platform.openai.com/docs/api-reference/assistants

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::traits::{AssistantTurn, MessageHandle, RunHandle, RunStatus, ThreadHandle};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadObject {
    pub id: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageObject {
    pub id: String,
    pub thread_id: String,
    pub role: String,
    #[serde(default)]
    pub content: Vec<MessageContent>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextValue },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextValue {
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunObject {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListObject<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

/// Provider timestamps are unix seconds
pub(crate) fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
}

impl MessageObject {
    /// Text parts joined with newlines, other part kinds skipped
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                MessageContent::Text { text } => Some(text.value.as_str()),
                MessageContent::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }
}

impl From<ThreadObject> for ThreadHandle {
    fn from(thread: ThreadObject) -> Self {
        Self {
            id: thread.id,
            created_at: timestamp(thread.created_at),
        }
    }
}

impl From<MessageObject> for MessageHandle {
    fn from(message: MessageObject) -> Self {
        Self {
            id: message.id,
            thread_id: message.thread_id,
            created_at: timestamp(message.created_at),
        }
    }
}

impl From<MessageObject> for AssistantTurn {
    fn from(message: MessageObject) -> Self {
        let text = message.text();
        Self {
            id: message.id,
            role: message.role,
            text,
            created_at: timestamp(message.created_at),
        }
    }
}

impl From<RunObject> for RunHandle {
    fn from(run: RunObject) -> Self {
        Self {
            id: run.id,
            thread_id: run.thread_id,
            status: run.status,
        }
    }
}
