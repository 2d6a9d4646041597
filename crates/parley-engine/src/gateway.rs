use chrono::{DateTime, Utc};
use parley_llm::{AssistantClient, MessageHandle, RunHandle, RunStatus, ThreadHandle};
use parley_persist::{ConversationStore, Thread};
use parley_types::Reply;
use std::sync::Arc;

use crate::error::Result;

/// Most recent assistant turn of a thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestReply {
    pub reply: Reply,
    /// Provider timestamp; `None` when the fallback text was substituted
    pub created_at: Option<DateTime<Utc>>,
}

impl LatestReply {
    pub fn is_fallback(&self) -> bool {
        self.created_at.is_none()
    }
}

/// Thin adapter over the provider's assistant threads
pub struct AssistantGateway {
    client: Arc<dyn AssistantClient>,
    store: Arc<dyn ConversationStore>,
}

impl AssistantGateway {
    pub fn new(client: Arc<dyn AssistantClient>, store: Arc<dyn ConversationStore>) -> Self {
        Self { client, store }
    }

    /// Allocate a provider thread, recording it only when it has an owner
    pub async fn create_thread(&self, owner_id: Option<&str>) -> Result<ThreadHandle> {
        let handle = self.client.create_thread().await?;
        if let Some(owner_id) = owner_id {
            self.store
                .create_thread(Thread::new(&handle.id, Some(owner_id.to_string()), handle.created_at))
                .await?;
            tracing::info!(thread_id = %handle.id, owner_id, "thread created");
        } else {
            tracing::info!(thread_id = %handle.id, "anonymous thread created");
        }
        Ok(handle)
    }

    pub async fn submit_message(&self, thread_id: &str, text: &str) -> Result<MessageHandle> {
        Ok(self.client.add_message(thread_id, text).await?)
    }

    pub async fn start_run(&self, thread_id: &str) -> Result<RunHandle> {
        Ok(self.client.create_run(thread_id).await?)
    }

    /// Single status check, errors left raw so the waiter can count them
    pub async fn poll_run(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> std::result::Result<RunStatus, parley_llm::ProviderError> {
        Ok(self.client.retrieve_run(thread_id, run_id).await?.status)
    }

    pub async fn latest_reply(&self, thread_id: &str) -> Result<LatestReply> {
        let turns = self.client.list_messages(thread_id).await?;
        Ok(match turns.into_iter().find(|t| t.is_assistant()) {
            Some(turn) => LatestReply {
                reply: Reply::assistant(turn.text),
                created_at: Some(turn.created_at),
            },
            None => LatestReply {
                reply: Reply::fallback(),
                created_at: None,
            },
        })
    }
}
