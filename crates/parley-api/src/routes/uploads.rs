use axum::{
    extract::{Multipart, State},
    Json,
};
use parley_engine::{EngineError, UploadRequest};

use super::{present, MessagesResponse};
use crate::auth::RequiredUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

struct UploadForm {
    thread_id: Option<String>,
    query: Option<String>,
    file: Option<(String, Vec<u8>)>,
}

async fn read_form(mut multipart: Multipart) -> ApiResult<UploadForm> {
    let mut form = UploadForm {
        thread_id: None,
        query: None,
        file: None,
    };

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                form.file = Some((file_name, bytes.to_vec()));
            }
            Some("threadId") => form.thread_id = Some(field.text().await?),
            Some("query") => form.query = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(form)
}

/// Relay a `.txt` or `.pdf` file into the caller's thread
pub async fn upload_file(
    State(state): State<AppState>,
    user: RequiredUser,
    multipart: Multipart,
) -> ApiResult<Json<MessagesResponse>> {
    // Refuse before streaming the body; the engine guard still settles races
    if state.engine.uploads().is_busy(&user.id) {
        tracing::info!(user_id = %user.id, "upload refused before reading body");
        return Err(EngineError::UploadBusy.into());
    }

    let form = read_form(multipart).await?;
    let (Some(thread_id), Some((file_name, bytes))) = (present(form.thread_id), form.file) else {
        return Err(ApiError::bad_request("Thread ID and file required"));
    };

    tracing::info!(
        user_id = %user.id,
        thread_id = %thread_id,
        file_name = %file_name,
        size = bytes.len(),
        "upload received"
    );

    let reply = state
        .engine
        .upload(UploadRequest {
            thread_id,
            owner_id: user.id,
            file_name,
            bytes,
            query: form.query,
        })
        .await?;
    Ok(Json(reply.into()))
}
