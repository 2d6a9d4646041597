use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{NewUser, StoredMessage, Thread, User};

/// Durable record of threads and their turns
///
/// Implementations must return a thread's messages ordered by `created_at`,
/// falling back to insertion order for equal timestamps.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Record a newly allocated thread
    async fn create_thread(&self, thread: Thread) -> Result<()>;

    /// Most recently created thread of an owner
    async fn find_thread_by_owner(&self, owner_id: &str) -> Result<Option<Thread>>;

    /// Thread with this id, only if it belongs to `owner_id`
    async fn find_owned_thread(&self, thread_id: &str, owner_id: &str) -> Result<Option<Thread>>;

    /// Append a turn
    async fn save_message(&self, message: StoredMessage) -> Result<()>;

    /// All turns of a thread, oldest first
    async fn get_messages(&self, thread_id: &str) -> Result<Vec<StoredMessage>>;

    /// Timestamp of the newest turn of a thread
    async fn latest_message_at(&self, thread_id: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .get_messages(thread_id)
            .await?
            .last()
            .map(|m| m.created_at))
    }
}

/// Account lookups used by authentication and the consultation workflow
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `DuplicateEmail` when the address is taken
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;
}
