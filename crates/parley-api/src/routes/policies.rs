use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::MaybeUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

impl SearchQuery {
    fn term(self) -> ApiResult<String> {
        self.search
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("Search term required"))
    }
}

/// Link to the first policy matching the search term
pub async fn find_policy(
    State(state): State<AppState>,
    _user: MaybeUser,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Value>> {
    let term = query.term()?;
    let policies = state.engine.policies();

    let body = match policies.lookup(&term) {
        Some(record) => json!({
            "status": "success",
            "url": policies.url_for(record),
            "message": "Policy found",
        }),
        None => json!({
            "status": "error",
            "message": format!("No policy found for \"{}\"", term),
        }),
    };
    Ok(Json(body))
}

pub async fn policy_details(
    State(state): State<AppState>,
    _user: MaybeUser,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Value>> {
    let term = query.term()?;
    let policies = state.engine.policies();

    let body = match policies.lookup(&term) {
        Some(record) => json!({
            "status": "success",
            "policy": policies.details(record),
        }),
        None => json!({
            "status": "error",
            "message": "No policy found",
        }),
    };
    Ok(Json(body))
}

/// Raw catalog record by id
pub async fn policy_by_id(
    State(state): State<AppState>,
    _user: MaybeUser,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    match state.engine.policies().get(&id) {
        Some(record) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "policy": record.raw,
            })),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "status": "error",
                "message": "Policy not found",
            })),
        ),
    }
}
