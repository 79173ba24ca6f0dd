//! Wire protocol for the realtime gateway.
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`.
//! Client commands and server events are each a single tagged enum so a
//! malformed frame fails to parse as a whole and can be dropped without
//! touching any state. Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::Role;

/// Self-reported presence of a connected user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Away,
    Busy,
    Offline,
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PresenceStatus::Online => "online",
            PresenceStatus::Away => "away",
            PresenceStatus::Busy => "busy",
            PresenceStatus::Offline => "offline",
        };
        f.write_str(s)
    }
}

/// Commands a client may issue after authentication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinChatRoom(String),
    LeaveChatRoom(String),
    SendMessage(SendMessage),
    TypingStart(String),
    TypingStop(String),
    StatusUpdate(PresenceStatus),
    MarkNotificationRead(String),
}

/// Events the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    JoinedChatRoom(String),
    LeftChatRoom(String),
    NewMessage(ChatMessageEvent),
    UserTyping(TypingEvent),
    UserStoppedTyping(TypingEvent),
    UserStatusChanged(PresenceEvent),
    Notification(Value),
    NotificationMarkedRead(String),
}

impl ServerEvent {
    /// Serialize for the wire. Server events are plain data and always
    /// serializable.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("server event serialization")
    }
}

/// Payload of a `send_message` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub chat_room_id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A relayed chat message as delivered to room members.
///
/// `id` is a placeholder token, not a durable identifier; persistence is
/// deferred to the platform's data store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageEvent {
    pub id: String,
    pub chat_room_id: String,
    pub sender_id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Unix timestamp in milliseconds (UTC)
    pub created_at: i64,
}

/// Ephemeral typing indicator, broadcast to room peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingEvent {
    pub user_id: String,
    pub chat_room_id: String,
}

/// Status change broadcast to a cohort room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEvent {
    pub user_id: String,
    pub status: PresenceStatus,
}

/// One entry of the connected-users snapshot exposed over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedUser {
    pub user_id: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cohort_id: Option<String>,
    pub status: PresenceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_command_event_names_match_the_protocol() {
        // given:
        let frame = r#"{"event":"join_chat_room","data":"room1"}"#;

        // when:
        let event: ClientEvent = serde_json::from_str(frame).unwrap();

        // then:
        assert_eq!(event, ClientEvent::JoinChatRoom("room1".to_string()));
    }

    #[test]
    fn test_send_message_payload_uses_camel_case_and_type_field() {
        // given:
        let frame = r#"{"event":"send_message","data":{"chatRoomId":"room1","message":"hi","type":"text"}}"#;

        // when:
        let event: ClientEvent = serde_json::from_str(frame).unwrap();

        // then:
        assert_eq!(
            event,
            ClientEvent::SendMessage(SendMessage {
                chat_room_id: "room1".to_string(),
                message: "hi".to_string(),
                kind: "text".to_string(),
            })
        );
    }

    #[test]
    fn test_status_update_accepts_lowercase_statuses() {
        // given:
        let frame = r#"{"event":"status_update","data":"busy"}"#;

        // when:
        let event: ClientEvent = serde_json::from_str(frame).unwrap();

        // then:
        assert_eq!(event, ClientEvent::StatusUpdate(PresenceStatus::Busy));
    }

    #[test]
    fn test_new_message_serializes_with_wire_field_names() {
        // given:
        let event = ServerEvent::NewMessage(ChatMessageEvent {
            id: "temp-123".to_string(),
            chat_room_id: "room1".to_string(),
            sender_id: "alice".to_string(),
            message: "hi".to_string(),
            kind: "text".to_string(),
            created_at: 1672531200000,
        });

        // when:
        let value: Value = serde_json::from_str(&event.to_json()).unwrap();

        // then:
        assert_eq!(value["event"], "new_message");
        assert_eq!(
            value["data"],
            json!({
                "id": "temp-123",
                "chatRoomId": "room1",
                "senderId": "alice",
                "message": "hi",
                "type": "text",
                "createdAt": 1672531200000i64,
            })
        );
    }

    #[test]
    fn test_user_status_changed_serializes_status_lowercase() {
        // given:
        let event = ServerEvent::UserStatusChanged(PresenceEvent {
            user_id: "alice".to_string(),
            status: PresenceStatus::Away,
        });

        // when:
        let value: Value = serde_json::from_str(&event.to_json()).unwrap();

        // then:
        assert_eq!(value["event"], "user_status_changed");
        assert_eq!(value["data"], json!({"userId": "alice", "status": "away"}));
    }

    #[test]
    fn test_notification_carries_arbitrary_payload() {
        // given:
        let payload = json!({"kind": "assignment_graded", "courseId": "rust-101"});
        let event = ServerEvent::Notification(payload.clone());

        // when:
        let value: Value = serde_json::from_str(&event.to_json()).unwrap();

        // then:
        assert_eq!(value["event"], "notification");
        assert_eq!(value["data"], payload);
    }

    #[test]
    fn test_malformed_frame_fails_to_parse() {
        // given: a frame with an unknown event name
        let frame = r#"{"event":"drop_all_tables","data":"room1"}"#;

        // when:
        let result = serde_json::from_str::<ClientEvent>(frame);

        // then:
        assert!(result.is_err());
    }
}
