use crate::error::Result;
use crate::types::Message;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trait for one-shot chat completions
///
/// Used for the small structured calls around the assistant: intent
/// classification, semantic policy matching and upload relevance checks.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Non-streaming chat completion
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;
}

/// Trait for the provider's stateful assistant threads
///
/// Every call is a single request against the provider. None of them block
/// waiting for a run to finish; polling is the caller's business.
#[async_trait]
pub trait AssistantClient: Send + Sync {
    /// Allocate a new provider-side thread
    async fn create_thread(&self) -> Result<ThreadHandle>;

    /// Append a user turn to a thread
    async fn add_message(&self, thread_id: &str, content: &str) -> Result<MessageHandle>;

    /// Start processing the thread with the configured assistant
    async fn create_run(&self, thread_id: &str) -> Result<RunHandle>;

    /// Single status check for a run
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<RunHandle>;

    /// Turns of a thread, newest first
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<AssistantTurn>>;
}

/// Convenience trait for clients that support both chat and assistant threads
pub trait ProviderClient: ChatClient + AssistantClient {}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Ask the provider to constrain output to a JSON object
    pub json_mode: bool,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn json_mode(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
    pub raw: serde_json::Value,
}

impl ChatResponse {
    /// Text content with surrounding whitespace removed, empty when absent
    pub fn text(&self) -> &str {
        self.content.as_deref().map(str::trim).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadHandle {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHandle {
    pub id: String,
    pub thread_id: String,
    /// Provider clock, authoritative for ordering
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
}

/// Run lifecycle as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Terminal states other than success
    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            Self::Failed | Self::Cancelled | Self::Expired | Self::Incomplete
        )
    }

    pub fn is_terminal(&self) -> bool {
        self.is_completed() || self.is_failed()
    }
}

/// One turn read back from a provider thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantTurn {
    pub id: String,
    pub role: String,
    /// Text parts joined with newlines and trimmed
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl AssistantTurn {
    pub fn is_assistant(&self) -> bool {
        self.role == "assistant"
    }
}
