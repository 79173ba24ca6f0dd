//! Connection registry: user id → active realtime session.
//!
//! At most one entry per user — a reconnect silently supersedes the previous
//! entry (last write wins) while the superseded socket stays connected. The
//! registry is process-local and never persisted.

use std::collections::HashMap;
use std::fmt;

use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use crate::auth::Role;
use crate::protocol::PresenceStatus;

/// Outbound channel feeding one connection's writer task.
pub type OutboundSender = mpsc::UnboundedSender<String>;

/// Identifier of a single socket, distinct from the user identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One authenticated realtime session.
#[derive(Clone)]
pub struct ConnectionEntry {
    pub connection_id: ConnectionId,
    pub user_id: String,
    pub role: Role,
    pub cohort_id: Option<String>,
    pub status: PresenceStatus,
    pub sender: OutboundSender,
}

/// In-memory map of connected users.
#[derive(Default)]
pub struct ConnectionRegistry {
    entries: Mutex<HashMap<String, ConnectionEntry>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the entry for the user, superseding any previous connection.
    /// Returns the superseded entry, if any.
    pub async fn register(&self, entry: ConnectionEntry) -> Option<ConnectionEntry> {
        let mut entries = self.entries.lock().await;
        entries.insert(entry.user_id.clone(), entry)
    }

    /// Remove the user's entry, but only if it still belongs to
    /// `connection_id`. A disconnect of a superseded socket must not evict
    /// the entry of the connection that replaced it.
    pub async fn remove(
        &self,
        user_id: &str,
        connection_id: ConnectionId,
    ) -> Option<ConnectionEntry> {
        let mut entries = self.entries.lock().await;
        if entries
            .get(user_id)
            .is_some_and(|entry| entry.connection_id == connection_id)
        {
            entries.remove(user_id)
        } else {
            None
        }
    }

    pub async fn get(&self, user_id: &str) -> Option<ConnectionEntry> {
        let entries = self.entries.lock().await;
        entries.get(user_id).cloned()
    }

    /// Snapshot of all current entries, sorted by user id for consistent
    /// ordering.
    pub async fn list_all(&self) -> Vec<ConnectionEntry> {
        let entries = self.entries.lock().await;
        let mut all: Vec<ConnectionEntry> = entries.values().cloned().collect();
        all.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        all
    }

    /// Update the user's presence. Returns false when the user has no live
    /// entry.
    pub async fn set_status(&self, user_id: &str, status: PresenceStatus) -> bool {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(user_id) {
            Some(entry) => {
                entry.status = status;
                true
            }
            None => false,
        }
    }

    pub async fn is_online(&self, user_id: &str) -> bool {
        let entries = self.entries.lock().await;
        entries.contains_key(user_id)
    }
}
