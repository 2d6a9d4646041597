pub mod auth;
pub mod consultation;
pub mod health;
pub mod messages;
pub mod policies;
pub mod realtime;
pub mod threads;
pub mod uploads;

use axum_extra::extract::CookieJar;
use parley_engine::Caller;
use parley_types::Reply;
use serde::{Deserialize, Serialize};

use crate::auth::MaybeUser;

/// Cookie carrying an anonymous caller's thread
pub const TEMP_THREAD_COOKIE: &str = "tempThreadId";

/// Body of every route that ends in an assistant turn
#[derive(Debug, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub messages: Vec<Reply>,
}

impl From<Reply> for MessagesResponse {
    fn from(reply: Reply) -> Self {
        Self {
            messages: vec![reply],
        }
    }
}

/// Owners are identified by their token, everyone else by the session cookie
pub(crate) fn caller_from(user: &MaybeUser, jar: &CookieJar) -> Caller {
    match user.id() {
        Some(id) => Caller::owner(id),
        None => Caller::anonymous(
            jar.get(TEMP_THREAD_COOKIE)
                .map(|cookie| cookie.value().to_string())
                .filter(|value| !value.is_empty()),
        ),
    }
}

/// Trimmed, non-empty string field
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
