use anyhow::{anyhow, Result};
use parley_llm::{AssistantClient, ChatClient};
use parley_persist::{ConversationStore, UserStore};
use parley_types::WaiterConfig;
use std::sync::Arc;

use crate::classifier::{IntentClassifier, LlmClassifier, PolicyMatcher, RelevanceValidator};
use crate::consultation::{ConsultationDesk, Mailer};
use crate::engine::ChatEngine;
use crate::gateway::AssistantGateway;
use crate::notifier::{RealtimeNotifier, DEFAULT_CONNECTION_BUFFER};
use crate::policy::PolicyIndex;
use crate::router::MessageRouter;
use crate::uploads::UploadRegistry;
use crate::waiter::RunCompletionWaiter;

/// Builder for constructing a ChatEngine
pub struct EngineBuilder {
    assistant: Option<Arc<dyn AssistantClient>>,
    classifier: Option<Arc<dyn IntentClassifier>>,
    matcher: Option<Arc<dyn PolicyMatcher>>,
    validator: Option<Arc<dyn RelevanceValidator>>,
    conversations: Option<Arc<dyn ConversationStore>>,
    users: Option<Arc<dyn UserStore>>,
    mailer: Option<Arc<dyn Mailer>>,
    policies: Option<PolicyIndex>,
    waiter_config: WaiterConfig,
    connection_buffer: usize,
    operator_email: Option<String>,
    team_name: String,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            assistant: None,
            classifier: None,
            matcher: None,
            validator: None,
            conversations: None,
            users: None,
            mailer: None,
            policies: None,
            waiter_config: WaiterConfig::default(),
            connection_buffer: DEFAULT_CONNECTION_BUFFER,
            operator_email: None,
            team_name: "Healthematics".to_string(),
        }
    }

    /// Provider client used for threads and runs
    pub fn assistant_client(mut self, client: Arc<dyn AssistantClient>) -> Self {
        self.assistant = Some(client);
        self
    }

    /// Use one chat model for intent, policy matching and upload relevance
    pub fn chat_client(mut self, client: Arc<dyn ChatClient>, model: impl Into<String>) -> Self {
        let classifier = Arc::new(LlmClassifier::new(client, model));
        self.classifier = Some(classifier.clone());
        self.matcher = Some(classifier.clone());
        self.validator = Some(classifier);
        self
    }

    pub fn intent_classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn policy_matcher(mut self, matcher: Arc<dyn PolicyMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn relevance_validator(mut self, validator: Arc<dyn RelevanceValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn conversation_store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.conversations = Some(store);
        self
    }

    pub fn user_store(mut self, store: Arc<dyn UserStore>) -> Self {
        self.users = Some(store);
        self
    }

    pub fn mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn policy_index(mut self, index: PolicyIndex) -> Self {
        self.policies = Some(index);
        self
    }

    pub fn waiter_config(mut self, config: WaiterConfig) -> Self {
        self.waiter_config = config;
        self
    }

    /// Events buffered per realtime connection before it starts missing them
    pub fn connection_buffer(mut self, buffer: usize) -> Self {
        self.connection_buffer = buffer;
        self
    }

    /// Operator address and the team name used in consultation emails
    pub fn consultation(mut self, operator_email: Option<String>, team_name: impl Into<String>) -> Self {
        self.operator_email = operator_email;
        self.team_name = team_name.into();
        self
    }

    pub fn build(self) -> Result<ChatEngine> {
        let assistant = self
            .assistant
            .ok_or_else(|| anyhow!("assistant client is required"))?;
        let classifier = self
            .classifier
            .ok_or_else(|| anyhow!("intent classifier is required"))?;
        let matcher = self
            .matcher
            .ok_or_else(|| anyhow!("policy matcher is required"))?;
        let validator = self
            .validator
            .ok_or_else(|| anyhow!("relevance validator is required"))?;
        let store = self
            .conversations
            .ok_or_else(|| anyhow!("conversation store is required"))?;
        let users = self.users.ok_or_else(|| anyhow!("user store is required"))?;
        let mailer = self.mailer.ok_or_else(|| anyhow!("mailer is required"))?;
        let policies = Arc::new(self.policies.unwrap_or_else(|| PolicyIndex::empty("")));

        let notifier = Arc::new(RealtimeNotifier::with_buffer(self.connection_buffer));
        let gateway = Arc::new(AssistantGateway::new(assistant, Arc::clone(&store)));
        let waiter = RunCompletionWaiter::new(
            Arc::clone(&gateway),
            Arc::clone(&store),
            Arc::clone(&notifier),
            self.waiter_config,
        );
        let router = MessageRouter::new(
            Arc::clone(&gateway),
            Arc::clone(&store),
            Arc::clone(&policies),
            classifier,
            matcher,
            Arc::clone(&notifier),
            waiter,
        );

        Ok(ChatEngine {
            gateway,
            store,
            users,
            router,
            policies,
            notifier,
            uploads: UploadRegistry::new(),
            validator,
            mailer,
            desk: ConsultationDesk::new(self.operator_email, self.team_name),
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
