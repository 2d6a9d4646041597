// Structured language-model calls around the assistant: intent
// classification, semantic policy matching and upload relevance.

use async_trait::async_trait;
use parley_llm::{ChatClient, ChatOptions, ChatRequest, Message, ProviderError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use crate::policy::PolicyRecord;

/// Characters of an upload shown to the relevance check
const RELEVANCE_SAMPLE_CHARS: usize = 1000;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Malformed classifier output: {0}")]
    Malformed(String),
}

/// Whether a message asks for a policy, and which one
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentClassification {
    #[serde(default)]
    pub is_policy_request: bool,
    #[serde(default)]
    pub search_term: String,
}

impl IntentClassification {
    /// Value used whenever classification can't be trusted
    pub fn not_policy() -> Self {
        Self::default()
    }

    pub fn policy(search_term: impl Into<String>) -> Self {
        Self {
            is_policy_request: true,
            search_term: search_term.into(),
        }
    }
}

/// Raw answer of the semantic policy matcher
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatcherVerdict {
    #[serde(default)]
    pub policy_id: Option<String>,
    #[serde(default)]
    pub policy_name: Option<String>,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relevance {
    pub is_relevant: bool,
    pub explanation: String,
}

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<IntentClassification, ClassifyError>;
}

#[async_trait]
pub trait PolicyMatcher: Send + Sync {
    /// Pick the catalog entry a query refers to, given the full catalog
    async fn match_policy(
        &self,
        query: &str,
        catalog: &[PolicyRecord],
    ) -> Result<MatcherVerdict, ClassifyError>;
}

#[async_trait]
pub trait RelevanceValidator: Send + Sync {
    async fn validate(&self, text: &str) -> Result<Relevance, ClassifyError>;
}

/// All three classifiers backed by one chat-completion client
pub struct LlmClassifier {
    client: Arc<dyn ChatClient>,
    model: String,
    topics: String,
}

impl LlmClassifier {
    pub fn new(client: Arc<dyn ChatClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            topics: "healthcare, finance, marketing".to_string(),
        }
    }

    /// Topics an upload must relate to
    pub fn with_topics(mut self, topics: impl Into<String>) -> Self {
        self.topics = topics.into();
        self
    }

    async fn ask(&self, messages: Vec<Message>, options: ChatOptions) -> Result<String, ClassifyError> {
        let request = ChatRequest::new(&self.model, messages).with_options(options);
        let response = self.client.chat(request).await?;
        Ok(response.text().to_string())
    }
}

/// Strict parse of a JSON answer, tolerating a surrounding code fence
pub(crate) fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, ClassifyError> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    serde_json::from_str(body).map_err(|e| ClassifyError::Malformed(format!("{}: {}", e, raw)))
}

/// First `max_chars` characters, never splitting a code point
fn sample(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[async_trait]
impl IntentClassifier for LlmClassifier {
    async fn classify(&self, text: &str) -> Result<IntentClassification, ClassifyError> {
        let system = "Decide whether the user is asking for an organisational policy document. \
            Return JSON: { \"isPolicyRequest\": boolean, \"searchTerm\": string }. \
            searchTerm is the shortest phrase naming the policy, or an empty string.";
        let raw = self
            .ask(
                vec![Message::system(system), Message::human(text)],
                ChatOptions::new().temperature(0.3).max_tokens(100).json_mode(),
            )
            .await?;
        parse_json(&raw)
    }
}

#[async_trait]
impl PolicyMatcher for LlmClassifier {
    async fn match_policy(
        &self,
        query: &str,
        catalog: &[PolicyRecord],
    ) -> Result<MatcherVerdict, ClassifyError> {
        let listing = catalog
            .iter()
            .map(|r| format!("- id: {} | name: {} | description: {} | subcategory: {}", r.id, r.name, r.description, r.subcategory))
            .collect::<Vec<_>>()
            .join("\n");
        let system = format!(
            "Pick the policy from this catalog that best answers the request.\n{}\n\n\
             Return JSON: {{ \"policyId\": string or null, \"policyName\": string or null, \"reason\": string }}. \
             Use null when no policy fits and say why in reason.",
            listing
        );
        let raw = self
            .ask(
                vec![Message::system(system), Message::human(query)],
                ChatOptions::new().temperature(0.0).max_tokens(200).json_mode(),
            )
            .await?;
        parse_json(&raw)
    }
}

#[async_trait]
impl RelevanceValidator for LlmClassifier {
    async fn validate(&self, text: &str) -> Result<Relevance, ClassifyError> {
        let prompt = format!(
            "Check if text relates to {} or our services.\nText: \"{}\"\nReturn: \"yes\" or \"no\" with explanation.",
            self.topics,
            sample(text, RELEVANCE_SAMPLE_CHARS)
        );
        let explanation = self
            .ask(vec![Message::human(prompt)], ChatOptions::new().max_tokens(100))
            .await?;
        Ok(Relevance {
            is_relevant: explanation.to_lowercase().starts_with("yes"),
            explanation,
        })
    }
}
