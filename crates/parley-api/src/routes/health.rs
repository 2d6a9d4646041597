use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

/// Health check endpoint
///
/// Reports which backends this process was started with.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut services = HashMap::new();

    let storage = if state.config.mongodb_uri.is_some() {
        "mongodb"
    } else {
        "memory"
    };
    services.insert("storage".to_string(), storage.to_string());

    let mail = if state.config.email_user.is_some() {
        "smtp"
    } else {
        "log"
    };
    services.insert("mail".to_string(), mail.to_string());

    services.insert(
        "policies".to_string(),
        format!("{} loaded", state.engine.policies().len()),
    );

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    })
}
