use parley_llm::ProviderError;
use parley_persist::PersistError;
use thiserror::Error;

/// Failures surfaced by the conversation engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Thread missing or not owned by the caller
    #[error("Invalid threadId")]
    InvalidThread,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The provider reported the run as failed
    #[error("Assistant failed")]
    AssistantFailed,

    /// Polling budget exhausted; the run may still finish later
    #[error("Timed out")]
    TimedOut,

    #[error("Previous upload still processing")]
    UploadBusy,

    #[error("{0}")]
    UnsupportedFile(String),

    #[error("Uploaded file contains no text")]
    EmptyUpload,

    #[error("User not found")]
    UserNotFound,

    #[error("Failed to send email: {0}")]
    Mail(String),

    #[error("Storage error: {0}")]
    Store(#[from] PersistError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
