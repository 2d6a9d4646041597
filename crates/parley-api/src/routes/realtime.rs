//! WebSocket channel for `newMessage` pushes.
//!
//! A socket joins thread groups with `{"event":"joinThread","threadId":..}`
//! frames. Joins go through the same ownership check as the REST routes, so
//! a socket only hears threads its caller could read.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use futures::{SinkExt, StreamExt};
use parley_engine::{Caller, ConnectionId, EngineError};
use parley_types::{ClientEvent, ServerEvent};
use serde::Deserialize;

use super::TEMP_THREAD_COOKIE;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

pub async fn connect(
    State(state): State<AppState>,
    Query(query): Query<ConnectQuery>,
    jar: CookieJar,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let caller = match query.token.filter(|t| !t.is_empty()) {
        Some(token) => match state.keys.verify(&token) {
            Ok(claims) => Caller::owner(claims.id),
            Err(e) => {
                tracing::debug!(error = %e, "websocket token rejected");
                return ApiError::Unauthorized("Invalid token").into_response();
            }
        },
        None => Caller::anonymous(
            jar.get(TEMP_THREAD_COOKIE)
                .map(|cookie| cookie.value().to_string()),
        ),
    };

    match upgrade {
        Ok(ws) => ws.on_upgrade(move |socket| serve_socket(socket, state, caller)),
        Err(rejection) => rejection.into_response(),
    }
}

async fn serve_socket(socket: WebSocket, state: AppState, caller: Caller) {
    let notifier = state.engine.notifier().clone();
    let (conn, mut events) = notifier.connect();
    tracing::info!(connection = %conn, owner_id = ?caller.owner_id(), "realtime client connected");

    let (mut sink, mut stream) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode realtime frame");
                    continue;
                }
            };
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            match message {
                Message::Text(text) => handle_frame(&recv_state, conn, &caller, &text).await,
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    notifier.disconnect(conn);
    tracing::info!(connection = %conn, "realtime client disconnected");
}

/// Apply one client frame and answer the sending connection
pub async fn handle_frame(state: &AppState, conn: ConnectionId, caller: &Caller, text: &str) {
    let notifier = state.engine.notifier();
    let reply = match serde_json::from_str::<ClientEvent>(text) {
        Ok(ClientEvent::JoinThread { thread_id }) => {
            match state.engine.authorize_thread(&thread_id, caller).await {
                Ok(()) => {
                    notifier.subscribe(conn, &thread_id);
                    ServerEvent::Joined { thread_id }
                }
                Err(EngineError::InvalidThread) => ServerEvent::Error {
                    message: EngineError::InvalidThread.to_string(),
                },
                Err(e) => {
                    tracing::error!(connection = %conn, error = %e, "join check failed");
                    ServerEvent::Error {
                        message: "Internal server error".to_string(),
                    }
                }
            }
        }
        Err(e) => {
            tracing::debug!(connection = %conn, error = %e, "unreadable client frame");
            ServerEvent::Error {
                message: "Unknown event".to_string(),
            }
        }
    };
    notifier.notify(conn, reply);
}
