//! Room membership: namespaced broadcast groups over live connections.
//!
//! Rooms have no storage of their own — a room exists exactly as long as it
//! has subscribers, and an empty member set is an absent key. Membership is
//! tracked per connection, so two sockets of the same user count as two
//! members.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tokio::sync::Mutex;

use crate::registry::{ConnectionId, OutboundSender};

/// Namespaced key identifying a broadcast group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoomKey {
    /// Private room of one user, target of direct notifications.
    User(String),
    /// Shared room of a cohort, target of presence broadcasts.
    Cohort(String),
    /// Chat room, joined and left explicitly by clients.
    Chat(String),
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomKey::User(id) => write!(f, "user:{}", id),
            RoomKey::Cohort(id) => write!(f, "cohort:{}", id),
            RoomKey::Chat(id) => write!(f, "chat:{}", id),
        }
    }
}

#[derive(Default)]
struct RoomTables {
    /// room key → member connections and their outbound channels
    members: HashMap<RoomKey, HashMap<ConnectionId, OutboundSender>>,
    /// reverse index for disconnect cleanup
    joined: HashMap<ConnectionId, HashSet<RoomKey>>,
}

/// Membership tables for all rooms of the process.
#[derive(Default)]
pub struct RoomDirectory {
    tables: Mutex<RoomTables>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the connection to the room. Idempotent: joining an already-joined
    /// room leaves the membership unchanged.
    pub async fn join(&self, room: RoomKey, connection_id: ConnectionId, sender: OutboundSender) {
        let mut tables = self.tables.lock().await;
        tables
            .members
            .entry(room.clone())
            .or_default()
            .insert(connection_id, sender);
        tables.joined.entry(connection_id).or_default().insert(room);
    }

    /// Remove the connection from the room. Idempotent: leaving a non-joined
    /// room is a no-op. The room key disappears with its last member.
    pub async fn leave(&self, room: &RoomKey, connection_id: ConnectionId) {
        let mut tables = self.tables.lock().await;
        if let Some(members) = tables.members.get_mut(room) {
            members.remove(&connection_id);
            if members.is_empty() {
                tables.members.remove(room);
            }
        }
        if let Some(joined) = tables.joined.get_mut(&connection_id) {
            joined.remove(room);
            if joined.is_empty() {
                tables.joined.remove(&connection_id);
            }
        }
    }

    pub async fn is_member(&self, room: &RoomKey, connection_id: ConnectionId) -> bool {
        let tables = self.tables.lock().await;
        tables
            .members
            .get(room)
            .is_some_and(|members| members.contains_key(&connection_id))
    }

    /// Whether the room currently has any subscribers.
    pub async fn contains(&self, room: &RoomKey) -> bool {
        let tables = self.tables.lock().await;
        tables.members.contains_key(room)
    }

    /// Snapshot of the room's members at this instant. Broadcasts iterate
    /// the snapshot, so a concurrent leave only affects later broadcasts.
    pub async fn members(&self, room: &RoomKey) -> Vec<(ConnectionId, OutboundSender)> {
        let tables = self.tables.lock().await;
        tables
            .members
            .get(room)
            .map(|members| {
                members
                    .iter()
                    .map(|(id, sender)| (*id, sender.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All chat rooms the connection has joined, for presence inspection.
    pub async fn chat_rooms_of(&self, connection_id: ConnectionId) -> Vec<String> {
        let tables = self.tables.lock().await;
        tables
            .joined
            .get(&connection_id)
            .map(|rooms| {
                rooms
                    .iter()
                    .filter_map(|room| match room {
                        RoomKey::Chat(id) => Some(id.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Remove the connection from every room it joined. Returns the rooms
    /// left.
    pub async fn cleanup(&self, connection_id: ConnectionId) -> Vec<RoomKey> {
        let mut tables = self.tables.lock().await;
        let rooms: Vec<RoomKey> = tables
            .joined
            .remove(&connection_id)
            .map(|rooms| rooms.into_iter().collect())
            .unwrap_or_default();
        for room in &rooms {
            if let Some(members) = tables.members.get_mut(room) {
                members.remove(&connection_id);
                if members.is_empty() {
                    tables.members.remove(room);
                }
            }
        }
        rooms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn test_sender() -> OutboundSender {
        let (sender, _receiver) = mpsc::unbounded_channel();
        sender
    }

    #[test]
    fn test_room_key_display_is_namespaced() {
        assert_eq!(RoomKey::User("u1".to_string()).to_string(), "user:u1");
        assert_eq!(RoomKey::Cohort("c1".to_string()).to_string(), "cohort:c1");
        assert_eq!(RoomKey::Chat("r1".to_string()).to_string(), "chat:r1");
    }

    #[tokio::test]
    async fn test_join_makes_the_connection_a_member() {
        // given:
        let rooms = RoomDirectory::new();
        let room = RoomKey::Chat("room1".to_string());
        let connection_id = ConnectionId::new();

        // when:
        rooms.join(room.clone(), connection_id, test_sender()).await;

        // then:
        assert!(rooms.is_member(&room, connection_id).await);
        assert_eq!(rooms.members(&room).await.len(), 1);
    }

    #[tokio::test]
    async fn test_join_is_idempotent() {
        // given:
        let rooms = RoomDirectory::new();
        let room = RoomKey::Chat("room1".to_string());
        let connection_id = ConnectionId::new();
        rooms.join(room.clone(), connection_id, test_sender()).await;

        // when: the same connection joins again
        rooms.join(room.clone(), connection_id, test_sender()).await;

        // then: membership is not duplicated, and one leave removes it
        assert_eq!(rooms.members(&room).await.len(), 1);
        rooms.leave(&room, connection_id).await;
        assert!(!rooms.is_member(&room, connection_id).await);
    }

    #[tokio::test]
    async fn test_leave_non_joined_room_is_a_noop() {
        // given:
        let rooms = RoomDirectory::new();
        let room = RoomKey::Chat("room1".to_string());
        let member = ConnectionId::new();
        rooms.join(room.clone(), member, test_sender()).await;

        // when: a connection that never joined leaves
        rooms.leave(&room, ConnectionId::new()).await;

        // then: the existing membership is untouched
        assert!(rooms.is_member(&room, member).await);
    }

    #[tokio::test]
    async fn test_empty_room_key_is_absent() {
        // given:
        let rooms = RoomDirectory::new();
        let room = RoomKey::Chat("room1".to_string());
        let connection_id = ConnectionId::new();
        rooms.join(room.clone(), connection_id, test_sender()).await;

        // when: the last member leaves
        rooms.leave(&room, connection_id).await;

        // then: the room no longer exists
        assert!(!rooms.contains(&room).await);
    }

    #[tokio::test]
    async fn test_two_connections_of_one_user_are_two_members() {
        // given:
        let rooms = RoomDirectory::new();
        let room = RoomKey::User("alice".to_string());

        // when: two sockets subscribe to the same user room
        rooms.join(room.clone(), ConnectionId::new(), test_sender()).await;
        rooms.join(room.clone(), ConnectionId::new(), test_sender()).await;

        // then:
        assert_eq!(rooms.members(&room).await.len(), 2);
    }

    #[tokio::test]
    async fn test_cleanup_removes_the_connection_from_every_room() {
        // given: a connection in its user room, cohort room, and two chats
        let rooms = RoomDirectory::new();
        let connection_id = ConnectionId::new();
        let keys = vec![
            RoomKey::User("alice".to_string()),
            RoomKey::Cohort("c1".to_string()),
            RoomKey::Chat("room1".to_string()),
            RoomKey::Chat("room2".to_string()),
        ];
        for key in &keys {
            rooms.join(key.clone(), connection_id, test_sender()).await;
        }

        // when:
        let left = rooms.cleanup(connection_id).await;

        // then:
        assert_eq!(left.len(), 4);
        for key in &keys {
            assert!(!rooms.is_member(key, connection_id).await);
        }
    }

    #[tokio::test]
    async fn test_cleanup_keeps_other_members() {
        // given:
        let rooms = RoomDirectory::new();
        let room = RoomKey::Chat("room1".to_string());
        let leaving = ConnectionId::new();
        let staying = ConnectionId::new();
        rooms.join(room.clone(), leaving, test_sender()).await;
        rooms.join(room.clone(), staying, test_sender()).await;

        // when:
        rooms.cleanup(leaving).await;

        // then:
        assert!(rooms.is_member(&room, staying).await);
    }

    #[tokio::test]
    async fn test_chat_rooms_of_filters_out_auto_joined_rooms() {
        // given:
        let rooms = RoomDirectory::new();
        let connection_id = ConnectionId::new();
        rooms
            .join(RoomKey::User("alice".to_string()), connection_id, test_sender())
            .await;
        rooms
            .join(RoomKey::Cohort("c1".to_string()), connection_id, test_sender())
            .await;
        rooms
            .join(RoomKey::Chat("room1".to_string()), connection_id, test_sender())
            .await;

        // when:
        let chats = rooms.chat_rooms_of(connection_id).await;

        // then:
        assert_eq!(chats, vec!["room1".to_string()]);
    }
}
