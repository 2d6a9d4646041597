#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use chrono::Utc;
use parley_api::{config::Config, create_router, state::AppState};
use parley_engine::{
    parse_catalog, ChatEngine, ClassifyError, IntentClassification, IntentClassifier, Mailer,
    MatcherVerdict, OutgoingEmail, PolicyIndex, PolicyMatcher, PolicyRecord, Relevance,
    RelevanceValidator,
};
use parley_llm::{
    AssistantClient, AssistantTurn, MessageHandle, ProviderError, RunHandle, RunStatus,
    ThreadHandle,
};
use parley_persist::{ConversationStore, InMemoryStore, NewUser, Thread, UserStore};
use parley_types::WaiterConfig;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

pub const CATALOG: &str = r#"{
    "data": [
        {
            "_id": "p1",
            "policyName": {"name": "Privacy Policy", "desc": "covers data handling", "createdAt": "2023-07-02T10:00:00.000Z"},
            "pSubId": {"name": "Compliance"},
            "pCategoryId": {"name": "Legal"}
        }
    ]
}"#;

const CONFIG: &str = r#"
    [server]
    host = "127.0.0.1"
    port = 0

    [cors]
    enabled = true
    origins = ["http://localhost:5173"]

    [mongodb]
    database = "parley_test"

    [llm]
    classifier_model = "test-model"

    [policy]
    catalog_path = "unused.json"
    public_base_url = "https://policies.test/policies/4/6"
    index_url = "https://policies.test/policies"

    [logging]
    level = "debug"
    format = "pretty"
"#;

/// Assistant that either completes every run at once or never finishes
pub struct FakeAssistant {
    reply: String,
    finishes: bool,
    threads: AtomicUsize,
    pub submitted: Mutex<Vec<String>>,
}

impl FakeAssistant {
    pub fn answering(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            finishes: true,
            threads: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn stuck() -> Self {
        Self {
            finishes: false,
            ..Self::answering("")
        }
    }
}

#[async_trait]
impl AssistantClient for FakeAssistant {
    async fn create_thread(&self) -> Result<ThreadHandle, ProviderError> {
        let n = self.threads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ThreadHandle {
            id: format!("thread_{}", n),
            created_at: Utc::now(),
        })
    }

    async fn add_message(&self, thread_id: &str, content: &str) -> Result<MessageHandle, ProviderError> {
        self.submitted.lock().unwrap().push(content.to_string());
        Ok(MessageHandle {
            id: "msg_user".into(),
            thread_id: thread_id.to_string(),
            created_at: Utc::now(),
        })
    }

    async fn create_run(&self, thread_id: &str) -> Result<RunHandle, ProviderError> {
        Ok(RunHandle {
            id: "run_1".into(),
            thread_id: thread_id.to_string(),
            status: RunStatus::Queued,
        })
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<RunHandle, ProviderError> {
        Ok(RunHandle {
            id: run_id.to_string(),
            thread_id: thread_id.to_string(),
            status: if self.finishes {
                RunStatus::Completed
            } else {
                RunStatus::InProgress
            },
        })
    }

    async fn list_messages(&self, _thread_id: &str) -> Result<Vec<AssistantTurn>, ProviderError> {
        Ok(vec![AssistantTurn {
            id: "msg_reply".into(),
            role: "assistant".into(),
            text: self.reply.clone(),
            created_at: Utc::now(),
        }])
    }
}

pub struct NotPolicy;

#[async_trait]
impl IntentClassifier for NotPolicy {
    async fn classify(&self, _text: &str) -> Result<IntentClassification, ClassifyError> {
        Ok(IntentClassification::not_policy())
    }
}

pub struct NoMatch;

#[async_trait]
impl PolicyMatcher for NoMatch {
    async fn match_policy(
        &self,
        _query: &str,
        _catalog: &[PolicyRecord],
    ) -> Result<MatcherVerdict, ClassifyError> {
        Err(ClassifyError::Malformed("no verdict".into()))
    }
}

pub struct AlwaysRelevant;

#[async_trait]
impl RelevanceValidator for AlwaysRelevant {
    async fn validate(&self, _text: &str) -> Result<Relevance, ClassifyError> {
        Ok(Relevance {
            is_relevant: true,
            explanation: "yes".into(),
        })
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub assistant: Arc<FakeAssistant>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn test_config() -> Config {
    let mut config: Config = toml::from_str(CONFIG).unwrap();
    config.jwt_key = "test-secret".to_string();
    config
}

pub fn test_app() -> TestApp {
    test_app_with(FakeAssistant::answering("Hello from the assistant"))
}

pub fn test_app_with(assistant: FakeAssistant) -> TestApp {
    let assistant = Arc::new(assistant);
    let store = Arc::new(InMemoryStore::new());
    let mailer = Arc::new(RecordingMailer::default());
    let config = test_config();

    let policies = PolicyIndex::new(
        parse_catalog(CATALOG).unwrap(),
        config.policy.public_base_url.clone(),
    )
    .with_index_url(config.policy.index_url.clone());

    let engine = ChatEngine::builder()
        .assistant_client(assistant.clone())
        .intent_classifier(Arc::new(NotPolicy))
        .policy_matcher(Arc::new(NoMatch))
        .relevance_validator(Arc::new(AlwaysRelevant))
        .conversation_store(store.clone())
        .user_store(store.clone())
        .mailer(mailer.clone())
        .policy_index(policies)
        .waiter_config(
            WaiterConfig::default()
                .with_poll_interval(Duration::from_millis(1))
                .with_max_attempts(5)
                .with_late_completion_attempts(0),
        )
        .consultation(Some("ops@example.com".into()), "Acme")
        .build()
        .unwrap();

    let state = AppState::new(config, engine);
    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        assistant,
        mailer,
    }
}

impl TestApp {
    /// Account stored directly, with a token for it
    pub async fn user(&self, email: &str) -> (String, String) {
        let mut new_user = NewUser::new(email, "not-a-real-hash");
        new_user.name = Some("Dana".to_string());
        let user = self.store.create_user(new_user).await.unwrap();
        let token = self.state.keys.issue(&user.id, &user.email).unwrap();
        (user.id, token)
    }

    pub async fn owned_thread(&self, thread_id: &str, owner_id: &str) {
        self.store
            .create_thread(Thread::new(thread_id, Some(owner_id.to_string()), Utc::now()))
            .await
            .unwrap();
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, headers, json)
    }
}

pub fn post_json(uri: &str, body: Value, token: Option<&str>, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(uri: &str, token: Option<&str>, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub const BOUNDARY: &str = "parley-test-boundary";

/// multipart/form-data body with text fields and one file
pub fn multipart_upload(
    token: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header("authorization", format!("Bearer {}", token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}
