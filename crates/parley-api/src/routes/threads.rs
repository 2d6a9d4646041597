use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use parley_persist::StoredMessage;
use parley_types::Role;
use serde::{Deserialize, Serialize};

use super::{caller_from, TEMP_THREAD_COOKIE};
use crate::auth::MaybeUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadResponse {
    pub thread_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub thread_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<StoredMessage> for MessageView {
    fn from(message: StoredMessage) -> Self {
        Self {
            owner_id: message.owner_id,
            thread_id: message.thread_id,
            role: message.role,
            content: message.content,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<MessageView>,
}

fn session_cookie(thread_id: String) -> Cookie<'static> {
    Cookie::build((TEMP_THREAD_COOKIE, thread_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(24))
        .build()
}

/// The caller's current thread, created on first contact
///
/// Anonymous callers get the new thread pinned in a session cookie.
pub async fn get_thread(
    State(state): State<AppState>,
    user: MaybeUser,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<ThreadResponse>)> {
    let caller = caller_from(&user, &jar);
    let assignment = state.engine.current_thread(&caller).await?;

    let jar = if assignment.created && caller.owner_id().is_none() {
        tracing::info!(thread_id = %assignment.thread_id, "new anonymous session thread");
        jar.add(session_cookie(assignment.thread_id.clone()))
    } else {
        jar
    };

    Ok((
        jar,
        Json(ThreadResponse {
            thread_id: assignment.thread_id,
        }),
    ))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    user: MaybeUser,
    jar: CookieJar,
) -> ApiResult<Json<HistoryResponse>> {
    let caller = caller_from(&user, &jar);
    let messages = state.engine.history(&thread_id, &caller).await?;
    Ok(Json(HistoryResponse {
        messages: messages.into_iter().map(MessageView::from).collect(),
    }))
}
