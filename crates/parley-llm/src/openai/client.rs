// OpenAI client: chat completions plus the stateful Assistants API

use crate::error::{ProviderError, Result};
use crate::openai::assistants::{ListObject, MessageObject, RunObject, ThreadObject};
use crate::traits::{
    AssistantClient, AssistantTurn, ChatClient, ChatOptions, ChatRequest, ChatResponse,
    MessageHandle, ProviderClient, RunHandle, ThreadHandle, TokenUsage,
};
use crate::types::Message;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const ASSISTANTS_BETA: &str = "assistants=v2";

/// OpenAI client (HTTP direct, no SDK)
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
    assistant_id: Option<String>,
}

impl OpenAIClient {
    /// Create new client with API key
    pub fn new(api_key: impl Into<String>) -> anyhow::Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .context("Invalid API key format")?,
        );
        headers.insert("OpenAI-Beta", HeaderValue::from_static(ASSISTANTS_BETA));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: OPENAI_API_BASE.to_string(),
            assistant_id: None,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Assistant that runs are started with
    pub fn with_assistant(mut self, assistant_id: impl Into<String>) -> Self {
        self.assistant_id = Some(assistant_id.into());
        self
    }

    /// Build chat completion request payload
    fn build_chat_request(&self, model: &str, messages: &[Message], options: &ChatOptions) -> Value {
        let openai_messages: Vec<Value> = messages
            .iter()
            .map(|msg| self.convert_message(msg))
            .collect();

        let mut request = serde_json::Map::new();
        request.insert("model".to_string(), serde_json::json!(model));
        request.insert("messages".to_string(), Value::Array(openai_messages));

        if let Some(temp) = options.temperature {
            request.insert("temperature".to_string(), serde_json::json!(temp));
        }
        if let Some(max_tokens) = options.max_tokens {
            request.insert("max_tokens".to_string(), serde_json::json!(max_tokens));
        }
        if options.json_mode {
            request.insert(
                "response_format".to_string(),
                serde_json::json!({ "type": "json_object" }),
            );
        }

        Value::Object(request)
    }

    /// Convert our Message type to OpenAI format
    fn convert_message(&self, message: &Message) -> Value {
        serde_json::json!({
            "role": message.role(),
            "content": message.content().as_text(),
        })
    }

    fn assistant_id(&self) -> Result<&str> {
        self.assistant_id
            .as_deref()
            .ok_or_else(|| ProviderError::Rejected("No assistant configured".to_string()))
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, payload: &Value) -> Result<T> {
        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, path))
            .json(payload)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http_client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "OpenAI API error");
            return Err(ProviderError::from_status(status, error_text));
        }
        Ok(response.json().await?)
    }
}

// ============================================================================
// TRAIT IMPLEMENTATIONS
// ============================================================================

#[async_trait]
impl ChatClient for OpenAIClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = self.build_chat_request(&request.model, &request.messages, &request.options);

        let raw: OpenAIChatResponse = self.post("/chat/completions", &payload).await?;

        // Convert to provider-agnostic response
        let choice = raw.choices.first();
        Ok(ChatResponse {
            content: choice.and_then(|c| c.message.content.clone()),
            usage: raw.usage.as_ref().map(|usage| TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            }),
            finish_reason: choice.and_then(|c| c.finish_reason.clone()),
            raw: serde_json::to_value(&raw).unwrap_or(Value::Null),
        })
    }
}

#[async_trait]
impl AssistantClient for OpenAIClient {
    async fn create_thread(&self) -> Result<ThreadHandle> {
        let thread: ThreadObject = self.post("/threads", &serde_json::json!({})).await?;
        tracing::debug!(thread_id = %thread.id, "created provider thread");
        Ok(thread.into())
    }

    async fn add_message(&self, thread_id: &str, content: &str) -> Result<MessageHandle> {
        let payload = serde_json::json!({
            "role": "user",
            "content": content,
        });
        let message: MessageObject = self
            .post(&format!("/threads/{}/messages", thread_id), &payload)
            .await?;
        Ok(message.into())
    }

    async fn create_run(&self, thread_id: &str) -> Result<RunHandle> {
        let payload = serde_json::json!({ "assistant_id": self.assistant_id()? });
        let run: RunObject = self
            .post(&format!("/threads/{}/runs", thread_id), &payload)
            .await?;
        tracing::debug!(thread_id, run_id = %run.id, "started run");
        Ok(run.into())
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<RunHandle> {
        let run: RunObject = self
            .get(&format!("/threads/{}/runs/{}", thread_id, run_id))
            .await?;
        if let Some(err) = &run.last_error {
            tracing::warn!(thread_id, run_id, code = %err.code, "run reported error: {}", err.message);
        }
        Ok(run.into())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<AssistantTurn>> {
        let list: ListObject<MessageObject> = self
            .get(&format!("/threads/{}/messages?order=desc", thread_id))
            .await?;
        Ok(list.data.into_iter().map(AssistantTurn::from).collect())
    }
}

// OpenAI supports both chat and assistant threads
impl ProviderClient for OpenAIClient {}

// ============================================================================
// OPENAI-SPECIFIC RESPONSE TYPES (for Chat Completions)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIChatResponse {
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Choice {
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResponseMessage {
    pub role: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}
