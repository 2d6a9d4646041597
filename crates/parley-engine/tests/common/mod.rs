#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parley_engine::{
    parse_catalog, ChatEngine, ClassifyError, IntentClassification, IntentClassifier, Mailer,
    MatcherVerdict, OutgoingEmail, PolicyIndex, PolicyMatcher, PolicyRecord, Relevance,
    RelevanceValidator,
};
use parley_llm::{
    AssistantClient, AssistantTurn, MessageHandle, ProviderError, RunHandle, RunStatus,
    ThreadHandle,
};
use parley_persist::{ConversationStore, InMemoryStore, Thread};
use parley_types::WaiterConfig;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const CATALOG: &str = r#"{
    "data": [
        {
            "_id": "p1",
            "policyName": {"name": "Privacy Policy", "desc": "covers data handling", "createdAt": "2023-07-02T10:00:00.000Z"},
            "pSubId": {"name": "Compliance"},
            "pCategoryId": {"name": "Legal"}
        },
        {
            "_id": "p2",
            "policyName": {"name": "Annual Leave", "desc": "time off and holidays"},
            "pSubId": {"name": "HR"},
            "pCategoryId": {"name": "People"}
        }
    ]
}"#;

pub const POLICY_BASE: &str = "https://policies.test/policies/4/6";

/// One scripted answer to a run poll
#[derive(Debug, Clone, Copy)]
pub enum Step {
    Status(RunStatus),
    Unavailable,
}

/// Assistant provider double driven by a poll script
pub struct FakeAssistant {
    steps: Mutex<VecDeque<Step>>,
    after_script: RunStatus,
    reply: Option<String>,
    pub submitted: Mutex<Vec<(String, String)>>,
    pub runs_started: AtomicUsize,
    pub polls: AtomicUsize,
    pub threads_created: AtomicUsize,
    pub fail_submit: AtomicBool,
    /// Stamp provider objects in whole seconds like the hosted API does
    pub whole_seconds: AtomicBool,
}

impl FakeAssistant {
    pub fn scripted(steps: Vec<Step>, after_script: RunStatus, reply: Option<&str>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            after_script,
            reply: reply.map(str::to_string),
            submitted: Mutex::new(Vec::new()),
            runs_started: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            threads_created: AtomicUsize::new(0),
            fail_submit: AtomicBool::new(false),
            whole_seconds: AtomicBool::new(false),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        let now = Utc::now();
        if self.whole_seconds.load(Ordering::SeqCst) {
            DateTime::from_timestamp(now.timestamp(), 0).unwrap()
        } else {
            now
        }
    }

    /// Pending for `pending` polls, then completed
    pub fn completing_after(pending: usize, reply: &str) -> Self {
        Self::scripted(
            vec![Step::Status(RunStatus::InProgress); pending],
            RunStatus::Completed,
            Some(reply),
        )
    }

    pub fn never_finishing() -> Self {
        Self::scripted(Vec::new(), RunStatus::InProgress, None)
    }

    pub fn submitted_texts(&self) -> Vec<String> {
        self.submitted
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl AssistantClient for FakeAssistant {
    async fn create_thread(&self) -> Result<ThreadHandle, ProviderError> {
        let n = self.threads_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ThreadHandle {
            id: format!("thread_new_{}", n),
            created_at: Utc::now(),
        })
    }

    async fn add_message(&self, thread_id: &str, content: &str) -> Result<MessageHandle, ProviderError> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("connection reset".into()));
        }
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push((thread_id.to_string(), content.to_string()));
        Ok(MessageHandle {
            id: format!("msg_{}", submitted.len()),
            thread_id: thread_id.to_string(),
            created_at: self.now(),
        })
    }

    async fn create_run(&self, thread_id: &str) -> Result<RunHandle, ProviderError> {
        let n = self.runs_started.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RunHandle {
            id: format!("run_{}", n),
            thread_id: thread_id.to_string(),
            status: RunStatus::Queued,
        })
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<RunHandle, ProviderError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Step::Status(self.after_script));
        match step {
            Step::Status(status) => Ok(RunHandle {
                id: run_id.to_string(),
                thread_id: thread_id.to_string(),
                status,
            }),
            Step::Unavailable => Err(ProviderError::Unavailable("502 Bad Gateway".into())),
        }
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<AssistantTurn>, ProviderError> {
        let mut turns = Vec::new();
        if let Some(reply) = &self.reply {
            turns.push(AssistantTurn {
                id: "msg_reply".into(),
                role: "assistant".into(),
                text: reply.clone(),
                created_at: self.now(),
            });
        }
        turns.push(AssistantTurn {
            id: format!("{}_user", thread_id),
            role: "user".into(),
            text: "earlier".into(),
            created_at: self.now(),
        });
        Ok(turns)
    }
}

/// Classifier double; `None` simulates malformed model output
pub struct FakeClassifier(pub Option<IntentClassification>);

#[async_trait]
impl IntentClassifier for FakeClassifier {
    async fn classify(&self, _text: &str) -> Result<IntentClassification, ClassifyError> {
        self.0
            .clone()
            .ok_or_else(|| ClassifyError::Malformed("not json".into()))
    }
}

/// Treats messages containing the keyword as policy requests
pub struct KeywordClassifier(pub &'static str);

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<IntentClassification, ClassifyError> {
        if text.contains(self.0) {
            Ok(IntentClassification::policy(self.0))
        } else {
            Ok(IntentClassification::not_policy())
        }
    }
}

pub struct FakeMatcher {
    verdict: Option<MatcherVerdict>,
    pub calls: AtomicUsize,
}

impl FakeMatcher {
    pub fn answering(policy_id: Option<&str>, reason: &str) -> Self {
        Self {
            verdict: Some(MatcherVerdict {
                policy_id: policy_id.map(str::to_string),
                policy_name: None,
                reason: reason.to_string(),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn broken() -> Self {
        Self {
            verdict: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PolicyMatcher for FakeMatcher {
    async fn match_policy(
        &self,
        _query: &str,
        _catalog: &[PolicyRecord],
    ) -> Result<MatcherVerdict, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict
            .clone()
            .ok_or_else(|| ClassifyError::Malformed("I think it's the leave one".into()))
    }
}

pub struct FakeValidator(pub bool);

#[async_trait]
impl RelevanceValidator for FakeValidator {
    async fn validate(&self, _text: &str) -> Result<Relevance, ClassifyError> {
        Ok(Relevance {
            is_relevant: self.0,
            explanation: if self.0 {
                "yes, it is a budget".into()
            } else {
                "no, it is a recipe".into()
            },
        })
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("smtp refused");
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

pub struct Harness {
    pub engine: ChatEngine,
    pub assistant: Arc<FakeAssistant>,
    pub store: Arc<InMemoryStore>,
    pub matcher: Arc<FakeMatcher>,
    pub mailer: Arc<RecordingMailer>,
}

pub struct HarnessOptions {
    pub intent: Option<IntentClassification>,
    /// Replaces the fixed `intent` answer when set
    pub classifier: Option<Arc<dyn IntentClassifier>>,
    pub matcher: FakeMatcher,
    pub relevant_uploads: bool,
    pub waiter: WaiterConfig,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            intent: Some(IntentClassification::not_policy()),
            classifier: None,
            matcher: FakeMatcher::broken(),
            relevant_uploads: true,
            waiter: WaiterConfig::default().with_late_completion_attempts(0),
        }
    }
}

pub fn harness(assistant: FakeAssistant) -> Harness {
    harness_with(assistant, HarnessOptions::default())
}

pub fn harness_with(assistant: FakeAssistant, options: HarnessOptions) -> Harness {
    let assistant = Arc::new(assistant);
    let store = Arc::new(InMemoryStore::new());
    let matcher = Arc::new(options.matcher);
    let mailer = Arc::new(RecordingMailer::default());
    let policies = PolicyIndex::new(parse_catalog(CATALOG).unwrap(), POLICY_BASE)
        .with_index_url("https://policies.test/policies");

    let classifier: Arc<dyn IntentClassifier> = match options.classifier {
        Some(classifier) => classifier,
        None => Arc::new(FakeClassifier(options.intent)),
    };

    let engine = ChatEngine::builder()
        .assistant_client(assistant.clone())
        .intent_classifier(classifier)
        .policy_matcher(matcher.clone())
        .relevance_validator(Arc::new(FakeValidator(options.relevant_uploads)))
        .conversation_store(store.clone())
        .user_store(store.clone())
        .mailer(mailer.clone())
        .policy_index(policies)
        .waiter_config(options.waiter)
        .consultation(Some("ops@example.com".into()), "Acme")
        .build()
        .unwrap();

    Harness {
        engine,
        assistant,
        store,
        matcher,
        mailer,
    }
}

/// Register an owned thread directly in the store
pub async fn owned_thread(store: &InMemoryStore, thread_id: &str, owner_id: &str) {
    store
        .create_thread(Thread::new(thread_id, Some(owner_id.to_string()), Utc::now()))
        .await
        .unwrap();
}
