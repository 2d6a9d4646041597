use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One conversation, keyed by the provider-assigned thread id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub thread_id: String,
    /// Absent for anonymous sessions
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Thread {
    pub fn new(thread_id: impl Into<String>, owner_id: Option<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            thread_id: thread_id.into(),
            owner_id,
            created_at,
        }
    }

    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id.as_deref() == Some(owner_id)
    }
}
