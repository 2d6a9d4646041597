use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{PersistError, Result};
use crate::models::{NewUser, StoredMessage, Thread, User};
use crate::trait_client::{ConversationStore, UserStore};

/// Process-local store for development and tests
///
/// Holds everything behind `RwLock`s; nothing survives a restart.
#[derive(Default)]
pub struct InMemoryStore {
    threads: RwLock<Vec<Thread>>,
    messages: RwLock<HashMap<String, Vec<StoredMessage>>>,
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn create_thread(&self, thread: Thread) -> Result<()> {
        self.threads.write().await.push(thread);
        Ok(())
    }

    async fn find_thread_by_owner(&self, owner_id: &str) -> Result<Option<Thread>> {
        let threads = self.threads.read().await;
        // max_by_key keeps the last of equal keys, so ties go to the newest insert
        Ok(threads
            .iter()
            .filter(|t| t.is_owned_by(owner_id))
            .max_by_key(|t| t.created_at)
            .cloned())
    }

    async fn find_owned_thread(&self, thread_id: &str, owner_id: &str) -> Result<Option<Thread>> {
        let threads = self.threads.read().await;
        Ok(threads
            .iter()
            .find(|t| t.thread_id == thread_id && t.is_owned_by(owner_id))
            .cloned())
    }

    async fn save_message(&self, message: StoredMessage) -> Result<()> {
        self.messages
            .write()
            .await
            .entry(message.thread_id.clone())
            .or_default()
            .push(message);
        Ok(())
    }

    async fn get_messages(&self, thread_id: &str) -> Result<Vec<StoredMessage>> {
        let mut messages = self
            .messages
            .read()
            .await
            .get(thread_id)
            .cloned()
            .unwrap_or_default();
        // Stable sort keeps insertion order for equal timestamps
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn latest_message_at(&self, thread_id: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .messages
            .read()
            .await
            .get(thread_id)
            .and_then(|messages| messages.iter().map(|m| m.created_at).max()))
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;
        let email = user.email.to_lowercase();
        if users.values().any(|u| u.email.to_lowercase() == email) {
            return Err(PersistError::DuplicateEmail(user.email));
        }

        let user = user.into_user(Uuid::new_v4().to_string(), Utc::now());
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_lowercase();
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }
}
