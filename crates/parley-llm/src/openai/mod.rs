pub mod assistants;
pub mod client;

pub use assistants::{ListObject, MessageContent, MessageObject, RunObject, ThreadObject};
pub use client::OpenAIClient;
