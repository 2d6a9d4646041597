use chrono::{DateTime, Utc};
use parley_types::{Reply, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted turn. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub thread_id: String,
    pub owner_id: Option<String>,
    pub role: Role,
    pub content: String,
    /// Provider clock where one is available
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    pub fn new(
        thread_id: impl Into<String>,
        owner_id: Option<String>,
        role: Role,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            thread_id: thread_id.into(),
            owner_id,
            role,
            content: content.into(),
            created_at,
        }
    }

    pub fn user(
        thread_id: impl Into<String>,
        owner_id: Option<String>,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::new(thread_id, owner_id, Role::User, content, created_at)
    }

    pub fn assistant(
        thread_id: impl Into<String>,
        owner_id: Option<String>,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::new(thread_id, owner_id, Role::Assistant, content, created_at)
    }

    pub fn to_reply(&self) -> Reply {
        Reply {
            role: self.role,
            content: self.content.clone(),
        }
    }
}
