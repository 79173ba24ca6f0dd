//! Message formatting utilities for client display.

use agora_server::protocol::{
    ChatMessageEvent, PresenceEvent, ServerEvent, TypingEvent,
};
use agora_shared::time::timestamp_to_rfc3339;
use serde_json::Value;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format one server event for the terminal.
    pub fn format_event(event: &ServerEvent) -> String {
        match event {
            ServerEvent::JoinedChatRoom(room_id) => Self::format_joined(room_id),
            ServerEvent::LeftChatRoom(room_id) => Self::format_left(room_id),
            ServerEvent::NewMessage(msg) => Self::format_chat_message(msg),
            ServerEvent::UserTyping(event) => Self::format_typing(event, true),
            ServerEvent::UserStoppedTyping(event) => Self::format_typing(event, false),
            ServerEvent::UserStatusChanged(event) => Self::format_status_change(event),
            ServerEvent::Notification(payload) => Self::format_notification(payload),
            ServerEvent::NotificationMarkedRead(id) => {
                format!("\n✓ notification {} marked read\n", id)
            }
        }
    }

    /// Format a room-join acknowledgment
    pub fn format_joined(room_id: &str) -> String {
        format!("\n+ joined room '{}'\n", room_id)
    }

    /// Format a room-leave acknowledgment
    pub fn format_left(room_id: &str) -> String {
        format!("\n- left room '{}'\n", room_id)
    }

    /// Format a relayed chat message
    pub fn format_chat_message(msg: &ChatMessageEvent) -> String {
        let timestamp_str = timestamp_to_rfc3339(msg.created_at);
        format!(
            "\n\n------------------------------------------------------------\n\
             [{}] @{}: {}\n\
             sent at {}\n\
             ------------------------------------------------------------\n",
            msg.chat_room_id, msg.sender_id, msg.message, timestamp_str
        )
    }

    /// Format a typing indicator
    pub fn format_typing(event: &TypingEvent, started: bool) -> String {
        let verb = if started { "is typing" } else { "stopped typing" };
        format!("\n~ {} {} in '{}'\n", event.user_id, verb, event.chat_room_id)
    }

    /// Format a cohort-mate's presence change
    pub fn format_status_change(event: &PresenceEvent) -> String {
        format!("\n* {} is now {}\n", event.user_id, event.status)
    }

    /// Format an out-of-band notification
    pub fn format_notification(payload: &Value) -> String {
        format!("\n! notification: {}\n", payload)
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }
}
