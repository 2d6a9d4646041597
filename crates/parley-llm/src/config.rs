// Configuration layer for provider client creation

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::openai::OpenAIClient;
use crate::traits::{ChatClient, ProviderClient};

/// Configuration for OpenAI provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: String,
    /// Base URL for OpenAI API (optional, defaults to https://api.openai.com/v1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Assistant used for thread runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            assistant_id: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_assistant(mut self, assistant_id: impl Into<String>) -> Self {
        self.assistant_id = Some(assistant_id.into());
        self
    }
}

/// Factory for creating provider clients from configuration
pub struct ClientFactory;

impl ClientFactory {
    /// Concrete client, for callers that hand it out under several traits
    pub fn create_openai_client(config: OpenAIConfig) -> Result<Arc<OpenAIClient>> {
        Ok(Arc::new(Self::build(config)?))
    }

    fn build(config: OpenAIConfig) -> Result<OpenAIClient> {
        let mut client = OpenAIClient::new(config.api_key)?;
        if let Some(base_url) = config.base_url {
            client = client.with_base_url(base_url);
        }
        if let Some(assistant_id) = config.assistant_id {
            client = client.with_assistant(assistant_id);
        }
        Ok(client)
    }

    /// Create a client supporting both chat and assistant threads
    pub fn create_client(config: OpenAIConfig) -> Result<Arc<dyn ProviderClient>> {
        Ok(Arc::new(Self::build(config)?))
    }

    /// Create a chat-only client
    pub fn create_chat_client(config: OpenAIConfig) -> Result<Arc<dyn ChatClient>> {
        Ok(Arc::new(Self::build(config)?))
    }
}
