//! Room store: the authoritative collection of active rooms.
//!
//! Rooms are keyed by identity and exist only in memory - nothing here
//! survives a process restart (finished matches are reported to the
//! match recorder before the room is discarded). Identifiers come from
//! the environment RNG, collision-resistant for the process lifetime.

use std::collections::HashMap;

use cardstorm_proto::{RoomId, RoomStateKind, RoomSummary};

use crate::{
    env::Environment,
    room::{PlayerSlot, Room},
};

/// All active rooms, keyed by identity.
#[derive(Debug, Default)]
pub struct RoomStore {
    rooms: HashMap<RoomId, Room>,
}

impl RoomStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh room with the given host.
    ///
    /// The room starts `Waiting` with no guest, round 1, turn count 0.
    pub fn create<E: Environment>(
        &mut self,
        name: impl Into<String>,
        host: PlayerSlot,
        env: &E,
    ) -> RoomId {
        let id = RoomId::new(env.random_u128());
        let room = Room::new(id, name, host, env.wall_clock_secs());
        self.rooms.insert(id, room);
        id
    }

    /// Look up a room.
    pub fn get(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    /// Look up a room for mutation.
    pub fn get_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(&id)
    }

    /// Remove a room, returning it if it existed.
    pub fn remove(&mut self, id: RoomId) -> Option<Room> {
        self.rooms.remove(&id)
    }

    /// Lobby projection: summaries of rooms awaiting a second player.
    ///
    /// A room is visible here if and only if it is `Waiting`. Sorted
    /// by creation time so the listing is stable across rebroadcasts.
    pub fn list_waiting(&self) -> Vec<RoomSummary> {
        let mut summaries: Vec<RoomSummary> = self
            .rooms
            .values()
            .filter(|room| room.state() == RoomStateKind::Waiting)
            .map(Room::summary)
            .collect();
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        summaries
    }

    /// Number of active rooms in any state.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_env::FixedEnv;

    #[test]
    fn create_allocates_distinct_ids() {
        let env = FixedEnv::new();
        let mut store = RoomStore::new();

        let a = store.create("Arena", PlayerSlot::new(1, "Alice"), &env);
        let b = store.create("Pit", PlayerSlot::new(2, "Bob"), &env);

        assert_ne!(a, b);
        assert_eq!(store.room_count(), 2);
        assert_eq!(store.get(a).map(|r| r.host().session_id), Some(1));
    }

    #[test]
    fn remove_deletes_the_room() {
        let env = FixedEnv::new();
        let mut store = RoomStore::new();

        let id = store.create("Arena", PlayerSlot::new(1, "Alice"), &env);
        assert!(store.remove(id).is_some());
        assert!(store.get(id).is_none());
        assert!(store.remove(id).is_none());
    }

    #[test]
    fn lobby_lists_waiting_rooms_only() {
        let env = FixedEnv::new();
        let mut store = RoomStore::new();

        let waiting = store.create("Waiting", PlayerSlot::new(1, "Alice"), &env);
        let playing = store.create("Playing", PlayerSlot::new(2, "Bob"), &env);

        {
            let room = store.get_mut(playing).unwrap();
            room.join(3, "Carol").unwrap();
            room.toggle_ready(2, &env);
            room.toggle_ready(3, &env);
        }

        let listed: Vec<RoomId> = store.list_waiting().iter().map(|s| s.id).collect();
        assert_eq!(listed, vec![waiting]);

        // The playing room comes back once its guest leaves.
        store.get_mut(playing).unwrap().leave(3);
        assert_eq!(store.list_waiting().len(), 2);
    }
}
