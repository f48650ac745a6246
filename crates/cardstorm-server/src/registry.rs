//! Connection registry: session tracking and room bindings.
//!
//! Maps each live connection to the room it currently occupies, if
//! any. A connection occupies at most one room at a time, so the
//! binding is a plain map rather than a subscription set. A missing
//! binding means "not in any room" - callers must treat it as normal,
//! not as an error (it is expected during disconnect races).

use std::collections::{HashMap, HashSet};

use cardstorm_proto::RoomId;

/// Registry of live sessions and their room bindings.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// All registered session IDs.
    sessions: HashSet<u64>,
    /// Session ID → the room it occupies.
    bindings: HashMap<u64, RoomId>,
}

impl ConnectionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session with no room membership.
    ///
    /// Returns `false` if the session is already registered.
    pub fn register_session(&mut self, session_id: u64) -> bool {
        self.sessions.insert(session_id)
    }

    /// Unregister a session, returning the room it was bound to.
    ///
    /// Returns `None` if the session was not registered.
    pub fn unregister_session(&mut self, session_id: u64) -> Option<Option<RoomId>> {
        if !self.sessions.remove(&session_id) {
            return None;
        }
        Some(self.bindings.remove(&session_id))
    }

    /// Check if a session is registered.
    pub fn has_session(&self, session_id: u64) -> bool {
        self.sessions.contains(&session_id)
    }

    /// Record that a session occupies a room.
    ///
    /// Returns any binding that was overwritten. A `Some` return
    /// indicates a caller bug (a session joined a room without leaving
    /// its previous one) and should be logged.
    pub fn bind(&mut self, session_id: u64, room_id: RoomId) -> Option<RoomId> {
        self.bindings.insert(session_id, room_id)
    }

    /// The room a session currently occupies, if any. O(1).
    pub fn lookup(&self, session_id: u64) -> Option<RoomId> {
        self.bindings.get(&session_id).copied()
    }

    /// Remove a session's room binding. Idempotent.
    pub fn unbind(&mut self, session_id: u64) -> Option<RoomId> {
        self.bindings.remove(&session_id)
    }

    /// Total number of registered sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
