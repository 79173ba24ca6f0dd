//! The in-memory core of the gateway.
//!
//! A [`Hub`] owns the connection registry and the room membership tables and
//! implements every command of the realtime protocol: join/leave, message
//! relay, typing indicators, and presence broadcasts. Handlers receive the
//! hub by reference through the application state — there is no ambient
//! global state.
//!
//! Every command is fire-and-forget: a push failure to one subscriber only
//! reduces the recipient set, and a disconnect never cancels an in-flight
//! broadcast.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use agora_shared::time::Clock;

use crate::auth::Claims;
use crate::notify::Notifier;
use crate::protocol::{
    ChatMessageEvent, ConnectedUser, PresenceEvent, PresenceStatus, SendMessage, ServerEvent,
    TypingEvent,
};
use crate::registry::{ConnectionEntry, ConnectionId, ConnectionRegistry, OutboundSender};
use crate::rooms::{RoomDirectory, RoomKey};

/// Per-connection context handed to command handlers after authentication.
#[derive(Clone)]
pub struct SessionCtx {
    pub connection_id: ConnectionId,
    pub user_id: String,
    pub cohort_id: Option<String>,
    pub sender: OutboundSender,
}

/// Registry, membership, relay, and presence broadcasting behind one object.
pub struct Hub {
    registry: ConnectionRegistry,
    rooms: RoomDirectory,
    clock: Arc<dyn Clock>,
}

impl Hub {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            rooms: RoomDirectory::new(),
            clock,
        }
    }

    /// Register an authenticated connection and auto-join its identity and
    /// cohort rooms. These two memberships last for the connection's
    /// lifetime; the command surface can only name chat rooms.
    ///
    /// A reconnect for the same user supersedes the previous registry entry
    /// while the superseded socket keeps its room subscriptions.
    pub async fn connect(&self, claims: &Claims, sender: OutboundSender) -> SessionCtx {
        let connection_id = ConnectionId::new();
        let entry = ConnectionEntry {
            connection_id,
            user_id: claims.user_id.clone(),
            role: claims.role,
            cohort_id: claims.cohort_id.clone(),
            status: PresenceStatus::Online,
            sender: sender.clone(),
        };
        if self.registry.register(entry).await.is_some() {
            tracing::debug!(
                "user '{}' reconnected, previous session superseded",
                claims.user_id
            );
        }

        self.rooms
            .join(RoomKey::User(claims.user_id.clone()), connection_id, sender.clone())
            .await;
        if let Some(cohort_id) = &claims.cohort_id {
            self.rooms
                .join(RoomKey::Cohort(cohort_id.clone()), connection_id, sender.clone())
                .await;
        }

        SessionCtx {
            connection_id,
            user_id: claims.user_id.clone(),
            cohort_id: claims.cohort_id.clone(),
            sender,
        }
    }

    /// Drop all room memberships and the registry entry, then tell the
    /// cohort the user went offline.
    ///
    /// The offline broadcast is skipped when the registry entry already
    /// belongs to a newer connection of the same user — that user is still
    /// online, just on another socket.
    pub async fn disconnect(&self, ctx: &SessionCtx) {
        self.rooms.cleanup(ctx.connection_id).await;
        let removed = self.registry.remove(&ctx.user_id, ctx.connection_id).await;

        if removed.is_some()
            && let Some(cohort_id) = &ctx.cohort_id
        {
            let event = ServerEvent::UserStatusChanged(PresenceEvent {
                user_id: ctx.user_id.clone(),
                status: PresenceStatus::Offline,
            });
            self.broadcast_except(&RoomKey::Cohort(cohort_id.clone()), ctx.connection_id, &event)
                .await;
        }
    }

    /// Join `chat:<room_id>` and ack back to the caller. Idempotent: a
    /// duplicate join produces the same ack without duplicating membership.
    pub async fn join_chat(&self, ctx: &SessionCtx, room_id: &str) {
        self.rooms
            .join(
                RoomKey::Chat(room_id.to_string()),
                ctx.connection_id,
                ctx.sender.clone(),
            )
            .await;
        self.push(ctx, &ServerEvent::JoinedChatRoom(room_id.to_string()));
        tracing::info!("user '{}' joined chat room {}", ctx.user_id, room_id);
    }

    /// Leave `chat:<room_id>` and ack back to the caller. Leaving a
    /// non-joined room still acks.
    pub async fn leave_chat(&self, ctx: &SessionCtx, room_id: &str) {
        self.rooms
            .leave(&RoomKey::Chat(room_id.to_string()), ctx.connection_id)
            .await;
        self.push(ctx, &ServerEvent::LeftChatRoom(room_id.to_string()));
        tracing::info!("user '{}' left chat room {}", ctx.user_id, room_id);
    }

    /// Relay a chat message to every member of the target room, sender
    /// included. The sender must have joined the room; a non-member send is
    /// dropped without a broadcast.
    ///
    /// The stamped `id` is a placeholder token — message persistence belongs
    /// to the platform's data store, not this layer.
    pub async fn relay_message(&self, ctx: &SessionCtx, cmd: SendMessage) {
        let room = RoomKey::Chat(cmd.chat_room_id.clone());
        if !self.rooms.is_member(&room, ctx.connection_id).await {
            tracing::warn!(
                "user '{}' sent to {} without joining, dropping",
                ctx.user_id,
                room
            );
            return;
        }

        let event = ServerEvent::NewMessage(ChatMessageEvent {
            id: format!("temp-{}", Uuid::new_v4()),
            chat_room_id: cmd.chat_room_id,
            sender_id: ctx.user_id.clone(),
            message: cmd.message,
            kind: cmd.kind,
            created_at: self.clock.now_millis(),
        });
        self.broadcast(&room, &event).await;
    }

    /// Update the user's presence and broadcast it to the cohort room only
    /// — status is scoped to cohort-mates, never global. A user with no
    /// cohort produces no broadcast.
    pub async fn set_status(&self, ctx: &SessionCtx, status: PresenceStatus) {
        self.registry.set_status(&ctx.user_id, status).await;

        if let Some(cohort_id) = &ctx.cohort_id {
            let event = ServerEvent::UserStatusChanged(PresenceEvent {
                user_id: ctx.user_id.clone(),
                status,
            });
            self.broadcast_except(&RoomKey::Cohort(cohort_id.clone()), ctx.connection_id, &event)
                .await;
        }
    }

    /// Broadcast a typing indicator to the room's other members. The state
    /// is ephemeral: nothing is stored and nothing auto-clears it, so a
    /// client that disconnects mid-typing leaves peers with a stale
    /// indicator until their own UI times it out.
    pub async fn typing(&self, ctx: &SessionCtx, chat_room_id: &str, started: bool) {
        let indicator = TypingEvent {
            user_id: ctx.user_id.clone(),
            chat_room_id: chat_room_id.to_string(),
        };
        let event = if started {
            ServerEvent::UserTyping(indicator)
        } else {
            ServerEvent::UserStoppedTyping(indicator)
        };
        self.broadcast_except(
            &RoomKey::Chat(chat_room_id.to_string()),
            ctx.connection_id,
            &event,
        )
        .await;
    }

    /// Ack a notification-read command back to the caller. The read flag
    /// itself is persisted by the notification store, outside this layer.
    pub async fn mark_notification_read(&self, ctx: &SessionCtx, notification_id: &str) {
        self.push(
            ctx,
            &ServerEvent::NotificationMarkedRead(notification_id.to_string()),
        );
    }

    /// Snapshot of connected users and their presence.
    pub async fn connected_users(&self) -> Vec<ConnectedUser> {
        self.registry
            .list_all()
            .await
            .into_iter()
            .map(|entry| ConnectedUser {
                user_id: entry.user_id,
                role: entry.role,
                cohort_id: entry.cohort_id,
                status: entry.status,
            })
            .collect()
    }

    pub async fn is_online(&self, user_id: &str) -> bool {
        self.registry.is_online(user_id).await
    }

    fn push(&self, ctx: &SessionCtx, event: &ServerEvent) {
        if ctx.sender.send(event.to_json()).is_err() {
            tracing::warn!("failed to push to connection {}", ctx.connection_id);
        }
    }

    async fn broadcast(&self, room: &RoomKey, event: &ServerEvent) {
        let payload = event.to_json();
        for (connection_id, sender) in self.rooms.members(room).await {
            if sender.send(payload.clone()).is_err() {
                tracing::warn!("failed to push to connection {} in {}", connection_id, room);
            }
        }
    }

    async fn broadcast_except(
        &self,
        room: &RoomKey,
        excluded: ConnectionId,
        event: &ServerEvent,
    ) {
        let payload = event.to_json();
        for (connection_id, sender) in self.rooms.members(room).await {
            if connection_id == excluded {
                continue;
            }
            if sender.send(payload.clone()).is_err() {
                tracing::warn!("failed to push to connection {} in {}", connection_id, room);
            }
        }
    }
}

#[async_trait]
impl Notifier for Hub {
    async fn notify_user(&self, user_id: &str, payload: Value) {
        self.broadcast(
            &RoomKey::User(user_id.to_string()),
            &ServerEvent::Notification(payload),
        )
        .await;
    }

    async fn notify_cohort(&self, cohort_id: &str, payload: Value) {
        self.broadcast(
            &RoomKey::Cohort(cohort_id.to_string()),
            &ServerEvent::Notification(payload),
        )
        .await;
    }
}
