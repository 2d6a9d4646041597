//! HTTP and WebSocket surface of the Parley conversation broker.

pub mod auth;
pub mod config;
pub mod error;
pub mod mail;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::CorsConfig;
use crate::routes::{auth as auth_routes, consultation, health, messages, policies, realtime, threads, uploads};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let upload_limit = state.config.server.upload_limit_bytes;
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    let cors = build_cors_layer(&state.config.cors);

    Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Accounts
        .route("/auth/register", post(auth_routes::register))
        .route("/auth/login", post(auth_routes::login))
        .route("/auth/subscription/status", get(auth_routes::subscription_status))
        // Conversation
        .route("/thread", get(threads::get_thread))
        .route("/thread/messages/:threadId", get(threads::get_messages))
        .route("/message", post(messages::post_message))
        .route(
            "/upload",
            post(uploads::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/consultation", post(consultation::request_consultation))
        // Policy catalog
        .route("/api/policy", get(policies::find_policy))
        .route("/api/policy/details", get(policies::policy_details))
        .route("/policies/4/6/:id", get(policies::policy_by_id))
        // Realtime
        .route("/ws", get(realtime::connect))
        .layer(from_fn(middleware::logging::log_request))
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled {
        return CorsLayer::permissive();
    }

    let cors = CorsLayer::new().allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ]);

    if config.origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any).allow_headers(Any);
    }

    // The session cookie needs credentialed requests, which rule out wildcards
    let origins: Vec<HeaderValue> = config
        .origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
