use axum::{extract::State, Json};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::{caller_from, present, MessagesResponse};
use crate::auth::MaybeUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageRequest {
    pub message: Option<String>,
    pub thread_id: Option<String>,
}

/// Route one user message and wait for the assistant's answer
pub async fn post_message(
    State(state): State<AppState>,
    user: MaybeUser,
    jar: CookieJar,
    Json(req): Json<PostMessageRequest>,
) -> ApiResult<Json<MessagesResponse>> {
    let thread_id = present(req.thread_id).ok_or(ApiError::bad_request("Invalid threadId"))?;
    let message = req
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Message required"))?;

    let caller = caller_from(&user, &jar);
    let reply = state.engine.send_message(&thread_id, &message, &caller).await?;
    Ok(Json(reply.into()))
}
