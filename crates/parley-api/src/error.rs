use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parley_engine::EngineError;
use parley_persist::PersistError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn internal(message: impl std::fmt::Display) -> Self {
        Self::Internal(message.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::BadRequest(format!("Invalid upload: {}", e.body_text()))
    }
}

fn engine_status(error: &EngineError) -> (StatusCode, String) {
    match error {
        EngineError::InvalidThread
        | EngineError::UnsupportedFile(_)
        | EngineError::EmptyUpload => (StatusCode::BAD_REQUEST, error.to_string()),
        EngineError::UserNotFound => (StatusCode::NOT_FOUND, error.to_string()),
        EngineError::TimedOut => (StatusCode::REQUEST_TIMEOUT, error.to_string()),
        EngineError::UploadBusy => (StatusCode::TOO_MANY_REQUESTS, error.to_string()),
        EngineError::Mail(_) => {
            tracing::error!("Mail error: {}", error);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to send email".to_string(),
            )
        }
        EngineError::AssistantFailed | EngineError::Provider(_) => {
            tracing::error!("Assistant error: {}", error);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                EngineError::AssistantFailed.to_string(),
            )
        }
        EngineError::Store(_) | EngineError::Internal(_) => {
            tracing::error!("Engine error: {}", error);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.to_string()),
            ApiError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Engine(ref e) => engine_status(e),
            ApiError::Persist(ref e) => {
                tracing::error!("Persistence error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            ApiError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
