pub mod config;
pub mod error;
pub mod openai;
pub mod traits;
pub mod types;

pub use config::{ClientFactory, OpenAIConfig};
pub use error::ProviderError;
pub use openai::OpenAIClient;
pub use traits::{
    AssistantClient, AssistantTurn, ChatClient, ChatOptions, ChatRequest, ChatResponse,
    MessageHandle, ProviderClient, RunHandle, RunStatus, ThreadHandle, TokenUsage,
};
pub use types::{Content, Message};
