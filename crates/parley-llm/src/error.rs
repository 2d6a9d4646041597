use thiserror::Error;

/// Failure talking to the upstream AI provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport failure, timeout, throttling or a 5xx answer. Worth retrying later.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// The provider refused the request or answered with something unusable
    #[error("Provider rejected request: {0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    pub(crate) fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Self::Unavailable(format!("{}: {}", status, body))
        } else {
            Self::Rejected(format!("{}: {}", status, body))
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Rejected(format!("Malformed provider response: {}", err))
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}
