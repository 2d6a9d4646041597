use chrono::Utc;
use parley_persist::{ConversationStore, StoredMessage};
use parley_types::{Reply, ServerEvent};
use std::sync::Arc;

use crate::classifier::{IntentClassification, IntentClassifier, PolicyMatcher};
use crate::error::{EngineError, Result};
use crate::gateway::AssistantGateway;
use crate::notifier::RealtimeNotifier;
use crate::policy::{PolicyIndex, PolicyMatch};
use crate::waiter::{stamp_after_latest, RunCompletionWaiter, RunJob};

/// Who is talking: an authenticated owner, or an anonymous session holding
/// the thread id it was handed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub owner_id: Option<String>,
    pub session_thread: Option<String>,
}

impl Caller {
    pub fn owner(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            session_thread: None,
        }
    }

    pub fn anonymous(session_thread: Option<String>) -> Self {
        Self {
            owner_id: None,
            session_thread,
        }
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }
}

/// Decides how each user message is answered
pub struct MessageRouter {
    gateway: Arc<AssistantGateway>,
    store: Arc<dyn ConversationStore>,
    policies: Arc<PolicyIndex>,
    classifier: Arc<dyn IntentClassifier>,
    matcher: Arc<dyn PolicyMatcher>,
    notifier: Arc<RealtimeNotifier>,
    waiter: RunCompletionWaiter,
}

impl MessageRouter {
    pub fn new(
        gateway: Arc<AssistantGateway>,
        store: Arc<dyn ConversationStore>,
        policies: Arc<PolicyIndex>,
        classifier: Arc<dyn IntentClassifier>,
        matcher: Arc<dyn PolicyMatcher>,
        notifier: Arc<RealtimeNotifier>,
        waiter: RunCompletionWaiter,
    ) -> Self {
        Self {
            gateway,
            store,
            policies,
            classifier,
            matcher,
            notifier,
            waiter,
        }
    }

    /// Owners must own the thread; anonymous callers must hold it in their session
    pub async fn validate_thread(&self, thread_id: &str, caller: &Caller) -> Result<()> {
        let valid = match caller.owner_id() {
            Some(owner_id) => self
                .store
                .find_owned_thread(thread_id, owner_id)
                .await?
                .is_some(),
            None => caller.session_thread.as_deref() == Some(thread_id),
        };

        if valid {
            Ok(())
        } else {
            tracing::info!(thread_id, owner_id = ?caller.owner_id, "rejected message for foreign thread");
            Err(EngineError::InvalidThread)
        }
    }

    /// Answer one user message
    pub async fn handle(&self, thread_id: &str, raw_text: &str, caller: &Caller) -> Result<Reply> {
        self.validate_thread(thread_id, caller).await?;

        let intent = match self.classifier.classify(raw_text).await {
            Ok(intent) => intent,
            Err(e) => {
                tracing::warn!(thread_id, error = %e, "intent classification degraded");
                IntentClassification::not_policy()
            }
        };

        if intent.is_policy_request {
            let query = if intent.search_term.trim().is_empty() {
                raw_text
            } else {
                intent.search_term.as_str()
            };
            return self
                .answer_policy_request(thread_id, raw_text, query, caller.owner_id())
                .await;
        }

        self.relay(thread_id, raw_text, caller.owner_id()).await
    }

    /// Forward text verbatim to the assistant and wait for its run
    ///
    /// Callers are expected to have validated the thread already.
    pub async fn relay(&self, thread_id: &str, text: &str, owner_id: Option<&str>) -> Result<Reply> {
        let owner = owner_id.map(str::to_string);

        let submitted = match self.gateway.submit_message(thread_id, text).await {
            Ok(handle) => handle,
            Err(e) => {
                // Keep history complete even though the provider never saw the turn
                let asked_at = stamp_after_latest(self.store.as_ref(), thread_id, Utc::now()).await?;
                self.save_turn(StoredMessage::user(thread_id, owner, text, asked_at))
                    .await?;
                return Err(e);
            }
        };

        let asked_at =
            stamp_after_latest(self.store.as_ref(), thread_id, submitted.created_at).await?;
        self.save_turn(StoredMessage::user(thread_id, owner.clone(), text, asked_at))
            .await?;

        let run = self.gateway.start_run(thread_id).await?;
        tracing::info!(thread_id, run_id = %run.id, "run started");

        self.waiter
            .wait(RunJob {
                thread_id: thread_id.to_string(),
                run_id: run.id,
                owner_id: owner,
                after: asked_at,
            })
            .await
    }

    /// Short-circuit path: the reply is fully determined without a run
    async fn answer_policy_request(
        &self,
        thread_id: &str,
        raw_text: &str,
        query: &str,
        owner_id: Option<&str>,
    ) -> Result<Reply> {
        let owner = owner_id.map(str::to_string);
        let asked_at = stamp_after_latest(self.store.as_ref(), thread_id, Utc::now()).await?;
        self.save_turn(StoredMessage::user(thread_id, owner.clone(), raw_text, asked_at))
            .await?;

        let matched = self.policies.best_match(query, self.matcher.as_ref()).await;
        tracing::info!(thread_id, query, found = matched.is_found(), "policy request answered");

        let reply = Reply::assistant(self.compose_policy_reply(&matched));
        let answered_at = stamp_after_latest(self.store.as_ref(), thread_id, Utc::now()).await?;
        self.save_turn(StoredMessage::assistant(thread_id, owner, reply.content.clone(), answered_at))
            .await?;

        self.notifier
            .publish(thread_id, ServerEvent::new_message(reply.clone()));
        Ok(reply)
    }

    fn compose_policy_reply(&self, matched: &PolicyMatch) -> String {
        let record = matched
            .matched_policy_id
            .as_deref()
            .and_then(|id| self.policies.get(id));

        match record {
            Some(record) => format!(
                "Found a policy: {}\n{}\n\n{}",
                record.name,
                self.policies.url_for(record),
                matched.confidence_reason
            ),
            None => format!(
                "I couldn't find a matching policy. {}\n\nYou can browse all policies at {}",
                matched.confidence_reason,
                self.policies.index_url()
            ),
        }
    }

    async fn save_turn(&self, message: StoredMessage) -> Result<()> {
        self.store.save_message(message).await?;
        Ok(())
    }
}
