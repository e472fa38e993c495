//! Room registry: the single authority on which rooms exist.
//!
//! Two levels of locking:
//!
//! - the registry map, held only long enough to insert, look up or remove
//!   an `Arc`, never while game logic runs;
//! - one lock per room, held for the whole read-modify-write of a room
//!   operation.
//!
//! Lock order is always map → room. Nothing takes the map lock while
//! holding a room lock, so the two cannot deadlock.

use std::collections::HashMap;
use std::sync::Arc;

use noughts_protocol::{Handle, RoomId};
use tokio::sync::Mutex;

use crate::{JoinOutcome, Room, RoomError};

/// A room behind its own lock, shared between the registry and in-flight
/// requests.
pub type SharedRoom = Arc<Mutex<Room>>;

/// Process-wide mapping from room id to room.
///
/// Rooms are created lazily by the first join that names them and torn
/// down as soon as their last participant leaves.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<RoomId, SharedRoom>>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the room with this id, creating a `Waiting` room if none
    /// exists. Never fails.
    pub async fn get_or_create(&self, room_id: &RoomId) -> SharedRoom {
        let mut rooms = self.rooms.lock().await;
        if let Some(room) = rooms.get(room_id) {
            return Arc::clone(room);
        }
        let room = Arc::new(Mutex::new(Room::new(room_id.clone())));
        rooms.insert(room_id.clone(), Arc::clone(&room));
        tracing::info!(%room_id, rooms = rooms.len(), "room created");
        room
    }

    /// Returns the room with this id.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if no such room exists.
    pub async fn get(&self, room_id: &RoomId) -> Result<SharedRoom, RoomError> {
        self.rooms
            .lock()
            .await
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))
    }

    /// Seats `handle` in the named room, creating the room if needed.
    ///
    /// If the room is torn down between lookup and join, the join is
    /// retried against a freshly created room instead of seating the
    /// participant in a room nobody can reach.
    pub async fn join(&self, room_id: &RoomId, handle: &Handle) -> Result<JoinOutcome, RoomError> {
        loop {
            let room = self.get_or_create(room_id).await;
            let mut room = room.lock().await;
            if room.is_closed() {
                continue;
            }
            return room.join(handle);
        }
    }

    /// Tears the room down if nobody is seated. Returns `true` if it was
    /// removed.
    ///
    /// The room is marked closed under its own lock before it leaves the
    /// map, so a request that fetched it a moment earlier fails with
    /// `NotFound` instead of mutating an orphan.
    pub async fn remove_if_empty(&self, room_id: &RoomId) -> bool {
        let mut rooms = self.rooms.lock().await;
        let Some(room) = rooms.get(room_id) else {
            return false;
        };
        {
            let mut room = room.lock().await;
            if !room.is_empty() {
                return false;
            }
            room.close();
        }
        rooms.remove(room_id);
        tracing::info!(%room_id, rooms = rooms.len(), "room destroyed");
        true
    }

    /// Returns `true` if a room with this id exists.
    pub async fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.lock().await.contains_key(room_id)
    }

    /// Returns the number of live rooms.
    pub async fn len(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Returns `true` if no rooms exist.
    pub async fn is_empty(&self) -> bool {
        self.rooms.lock().await.is_empty()
    }

    /// Lists all live room ids.
    pub async fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.lock().await.keys().cloned().collect()
    }
}
