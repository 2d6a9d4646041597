pub mod builder;
pub mod classifier;
pub mod consultation;
pub mod engine;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod notifier;
pub mod policy;
pub mod router;
pub mod uploads;
pub mod waiter;

pub use builder::EngineBuilder;
pub use classifier::{
    ClassifyError, IntentClassification, IntentClassifier, LlmClassifier, MatcherVerdict,
    PolicyMatcher, Relevance, RelevanceValidator,
};
pub use consultation::{ConsultationDesk, Mailer, OutgoingEmail};
pub use engine::{ChatEngine, ThreadAssignment, UploadRequest, DEFAULT_UPLOAD_QUERY};
pub use error::{EngineError, Result};
pub use gateway::{AssistantGateway, LatestReply};
pub use notifier::{ConnectionId, RealtimeNotifier};
pub use policy::{load_catalog, parse_catalog, PolicyDetails, PolicyIndex, PolicyMatch, PolicyRecord};
pub use router::{Caller, MessageRouter};
pub use uploads::{UploadGuard, UploadRegistry};
pub use waiter::{RunCompletionWaiter, RunJob, RunOutcome};
