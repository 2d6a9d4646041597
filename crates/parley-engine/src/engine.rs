use parley_persist::{ConversationStore, StoredMessage, UserStore};
use parley_types::Reply;
use std::sync::Arc;

use crate::classifier::{Relevance, RelevanceValidator};
use crate::consultation::{ConsultationDesk, Mailer};
use crate::error::{EngineError, Result};
use crate::extract::extract_text;
use crate::gateway::AssistantGateway;
use crate::notifier::RealtimeNotifier;
use crate::policy::PolicyIndex;
use crate::router::{Caller, MessageRouter};
use crate::uploads::UploadRegistry;

/// Query relayed with an upload when the user gave none
pub const DEFAULT_UPLOAD_QUERY: &str = "No query provided. Ask me anything about this file!";

/// Thread handed to a caller by [`ChatEngine::current_thread`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadAssignment {
    pub thread_id: String,
    /// True when a new provider thread was allocated for this call
    pub created: bool,
}

/// A file submitted into a thread by its owner
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub thread_id: String,
    pub owner_id: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub query: Option<String>,
}

/// Entry point for every conversation operation
pub struct ChatEngine {
    pub(crate) gateway: Arc<AssistantGateway>,
    pub(crate) store: Arc<dyn ConversationStore>,
    pub(crate) users: Arc<dyn UserStore>,
    pub(crate) router: MessageRouter,
    pub(crate) policies: Arc<PolicyIndex>,
    pub(crate) notifier: Arc<RealtimeNotifier>,
    pub(crate) uploads: UploadRegistry,
    pub(crate) validator: Arc<dyn RelevanceValidator>,
    pub(crate) mailer: Arc<dyn Mailer>,
    pub(crate) desk: ConsultationDesk,
}

impl ChatEngine {
    pub fn builder() -> crate::builder::EngineBuilder {
        crate::builder::EngineBuilder::new()
    }

    pub fn policies(&self) -> &PolicyIndex {
        &self.policies
    }

    pub fn notifier(&self) -> &Arc<RealtimeNotifier> {
        &self.notifier
    }

    pub fn uploads(&self) -> &UploadRegistry {
        &self.uploads
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// The caller's thread, allocating one on first contact
    ///
    /// Owners get their most recent stored thread. Anonymous callers keep
    /// the thread held in their session.
    pub async fn current_thread(&self, caller: &Caller) -> Result<ThreadAssignment> {
        let existing = match caller.owner_id() {
            Some(owner_id) => self
                .store
                .find_thread_by_owner(owner_id)
                .await?
                .map(|t| t.thread_id),
            None => caller.session_thread.clone(),
        };

        if let Some(thread_id) = existing {
            return Ok(ThreadAssignment {
                thread_id,
                created: false,
            });
        }

        let handle = self.gateway.create_thread(caller.owner_id()).await?;
        Ok(ThreadAssignment {
            thread_id: handle.id,
            created: true,
        })
    }

    /// Ok when the caller may read and post to the thread
    pub async fn authorize_thread(&self, thread_id: &str, caller: &Caller) -> Result<()> {
        self.router.validate_thread(thread_id, caller).await
    }

    /// Stored turns of a thread the caller may read, oldest first
    pub async fn history(&self, thread_id: &str, caller: &Caller) -> Result<Vec<StoredMessage>> {
        self.router.validate_thread(thread_id, caller).await?;
        Ok(self.store.get_messages(thread_id).await?)
    }

    pub async fn send_message(&self, thread_id: &str, text: &str, caller: &Caller) -> Result<Reply> {
        self.router.handle(thread_id, text, caller).await
    }

    /// Relay an uploaded file's text to the assistant
    ///
    /// Only one upload per owner runs at a time; the busy flag is released
    /// however this returns.
    pub async fn upload(&self, request: UploadRequest) -> Result<Reply> {
        let caller = Caller::owner(&request.owner_id);
        self.router.validate_thread(&request.thread_id, &caller).await?;

        let _guard = self.uploads.try_acquire(&request.owner_id)?;

        let file_name = request.file_name.clone();
        let bytes = request.bytes;
        let text = tokio::task::spawn_blocking(move || extract_text(&file_name, &bytes))
            .await
            .map_err(|e| EngineError::Internal(format!("extraction task failed: {}", e)))??;

        let relevance = match self.validator.validate(&text).await {
            Ok(relevance) => relevance,
            Err(e) => {
                tracing::warn!(thread_id = %request.thread_id, error = %e, "relevance check degraded, accepting upload");
                Relevance {
                    is_relevant: true,
                    explanation: String::new(),
                }
            }
        };

        let message = if relevance.is_relevant {
            let query = request
                .query
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .unwrap_or(DEFAULT_UPLOAD_QUERY);
            format!(
                "File uploaded: {}\nContent:\n{}\n\nUser query: {}",
                request.file_name, text, query
            )
        } else {
            format!(
                "File uploaded: {}\nNot related to healthcare/finance/marketing/{}: {}",
                request.file_name,
                self.desk.team_name(),
                relevance.explanation
            )
        };

        tracing::info!(
            thread_id = %request.thread_id,
            file_name = %request.file_name,
            relevant = relevance.is_relevant,
            "relaying upload"
        );
        self.router
            .relay(&request.thread_id, &message, Some(&request.owner_id))
            .await
    }

    /// Notify the team and the user, then post the confirmation into the thread
    pub async fn request_consultation(
        &self,
        thread_id: &str,
        owner_id: &str,
        description: &str,
    ) -> Result<Reply> {
        self.router
            .validate_thread(thread_id, &Caller::owner(owner_id))
            .await?;

        let user = self
            .users
            .find_by_id(owner_id)
            .await?
            .ok_or(EngineError::UserNotFound)?;
        let name = user.display_name();

        let emails = self.desk.emails(name, &user.email, description);
        match emails.operator {
            Some(operator) => self
                .mailer
                .send(operator)
                .await
                .map_err(|e| EngineError::Mail(e.to_string()))?,
            None => tracing::warn!(thread_id, "no operator address configured, skipping team email"),
        }
        self.mailer
            .send(emails.confirmation)
            .await
            .map_err(|e| EngineError::Mail(e.to_string()))?;

        let message = self.desk.confirmation_message(name, &user.email, description);
        self.router.relay(thread_id, &message, Some(owner_id)).await
    }
}
