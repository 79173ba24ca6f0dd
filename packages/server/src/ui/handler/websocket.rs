//! WebSocket connection handlers.
//!
//! The authentication gate runs before the upgrade: a connection without a
//! valid token is rejected with 401 and never reaches the hub, so no room
//! ever observes a membership from an unauthenticated connection.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    auth::Claims,
    hub::{Hub, SessionCtx},
    protocol::ClientEvent,
};

use super::super::state::AppState;

/// Query parameters for the WebSocket handshake.
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let token = match query.token {
        Some(token) => token,
        None => {
            tracing::warn!("Connection attempt without token. Rejecting.");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    let claims = match state.verifier.verify(&token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!("Connection attempt with invalid token. Rejecting: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    Ok(ws.on_upgrade(|socket| handle_socket(socket, state, claims)))
}

pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>, claims: Claims) {
    let (mut sender, mut receiver) = socket.split();

    // Channel feeding this connection's writer task; the hub fans out by
    // pushing into it.
    let (tx, mut rx) = mpsc::unbounded_channel();

    let ctx = state.hub.connect(&claims, tx).await;
    tracing::info!(
        "User '{}' connected with connection {}",
        ctx.user_id,
        ctx.connection_id
    );

    let hub = state.hub.clone();
    let recv_ctx = ctx.clone();

    // Commands from this client, processed in transport order
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let event = match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            // Malformed commands are dropped; the connection
                            // stays alive.
                            tracing::warn!(
                                "User '{}' sent a malformed command, ignoring: {}",
                                recv_ctx.user_id,
                                e
                            );
                            continue;
                        }
                    };
                    dispatch(&hub, &recv_ctx, event).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("User '{}' requested close", recv_ctx.user_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Events from the hub, pushed to this client
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.hub.disconnect(&ctx).await;
    tracing::info!("User '{}' disconnected", ctx.user_id);
}

async fn dispatch(hub: &Hub, ctx: &SessionCtx, event: ClientEvent) {
    match event {
        ClientEvent::JoinChatRoom(room_id) => hub.join_chat(ctx, &room_id).await,
        ClientEvent::LeaveChatRoom(room_id) => hub.leave_chat(ctx, &room_id).await,
        ClientEvent::SendMessage(cmd) => hub.relay_message(ctx, cmd).await,
        ClientEvent::TypingStart(room_id) => hub.typing(ctx, &room_id, true).await,
        ClientEvent::TypingStop(room_id) => hub.typing(ctx, &room_id, false).await,
        ClientEvent::StatusUpdate(status) => hub.set_status(ctx, status).await,
        ClientEvent::MarkNotificationRead(id) => hub.mark_notification_read(ctx, &id).await,
    }
}
