use axum::{extract::State, Json};
use serde::Deserialize;

use super::{present, MessagesResponse};
use crate::auth::RequiredUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationRequest {
    pub thread_id: Option<String>,
    pub description: Option<String>,
}

pub async fn request_consultation(
    State(state): State<AppState>,
    user: RequiredUser,
    Json(req): Json<ConsultationRequest>,
) -> ApiResult<Json<MessagesResponse>> {
    let (Some(thread_id), Some(description)) = (present(req.thread_id), present(req.description))
    else {
        return Err(ApiError::bad_request("Thread ID and description required"));
    };

    tracing::info!(user_id = %user.id, thread_id = %thread_id, "consultation requested");
    let reply = state
        .engine
        .request_consultation(&thread_id, &user.id, &description)
        .await?;
    Ok(Json(reply.into()))
}
