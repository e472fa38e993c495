//! The connection directory: connection id → (handle, room).
//!
//! # Concurrency note
//!
//! `ConnectionDirectory` is a plain pair of maps with no locking of its
//! own. The router owns it behind a mutex and holds that mutex only for
//! individual lookups and updates.

use std::collections::{BTreeSet, HashMap};

use noughts_protocol::{Handle, RoomId};
use noughts_transport::ConnectionId;

use crate::DirectoryError;

/// The participant and room a connection is currently speaking for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binding {
    pub handle: Handle,
    pub room: RoomId,
}

impl Binding {
    pub fn new(handle: Handle, room: RoomId) -> Self {
        Self { handle, room }
    }
}

/// Tracks every connection that has joined a room.
///
/// A connection has at most one binding; binding again replaces it.
#[derive(Debug, Default)]
pub struct ConnectionDirectory {
    bindings: HashMap<ConnectionId, Binding>,

    /// Reverse index: which connections are bound into each room. Kept in
    /// sync with `bindings` and used to address room broadcasts.
    members: HashMap<RoomId, BTreeSet<ConnectionId>>,
}

impl ConnectionDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `conn` to `(handle, room)`, replacing any previous binding.
    ///
    /// Returns the previous binding, if there was one.
    pub fn bind(&mut self, conn: ConnectionId, handle: Handle, room: RoomId) -> Option<Binding> {
        let previous = self.remove(conn);

        self.members.entry(room.clone()).or_default().insert(conn);
        tracing::debug!(%conn, %handle, room_id = %room, "connection bound");
        self.bindings.insert(conn, Binding::new(handle, room));

        previous
    }

    /// Returns the binding for `conn`.
    ///
    /// # Errors
    /// [`DirectoryError::NotBound`] if the connection never joined or was
    /// already unbound.
    pub fn resolve(&self, conn: ConnectionId) -> Result<&Binding, DirectoryError> {
        self.bindings
            .get(&conn)
            .ok_or(DirectoryError::NotBound(conn))
    }

    /// Removes and returns the binding for `conn`.
    ///
    /// # Errors
    /// [`DirectoryError::NotBound`] if there was nothing to remove.
    pub fn unbind(&mut self, conn: ConnectionId) -> Result<Binding, DirectoryError> {
        let binding = self.remove(conn).ok_or(DirectoryError::NotBound(conn))?;
        tracing::debug!(%conn, handle = %binding.handle, room_id = %binding.room, "connection unbound");
        Ok(binding)
    }

    /// Unbinds every connection holding exactly this binding and returns
    /// them in ascending id order.
    pub fn release(&mut self, binding: &Binding) -> Vec<ConnectionId> {
        let holders: Vec<ConnectionId> = self
            .connections_in(&binding.room)
            .into_iter()
            .filter(|conn| self.bindings.get(conn) == Some(binding))
            .collect();
        for conn in &holders {
            self.remove(*conn);
        }
        if !holders.is_empty() {
            tracing::debug!(
                handle = %binding.handle,
                room_id = %binding.room,
                released = holders.len(),
                "binding released"
            );
        }
        holders
    }

    /// Returns every connection bound into `room`, in ascending id order.
    pub fn connections_in(&self, room: &RoomId) -> Vec<ConnectionId> {
        self.members
            .get(room)
            .map(|conns| conns.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns `true` if any connection is bound to exactly this binding.
    ///
    /// Used on disconnect: a participant that already reconnected on a
    /// new socket keeps its seat when the old socket is reaped.
    pub fn is_held(&self, binding: &Binding) -> bool {
        self.members.get(&binding.room).is_some_and(|conns| {
            conns
                .iter()
                .any(|conn| self.bindings.get(conn) == Some(binding))
        })
    }

    /// Returns the number of bound connections.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if no connection is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn remove(&mut self, conn: ConnectionId) -> Option<Binding> {
        let binding = self.bindings.remove(&conn)?;
        if let Some(conns) = self.members.get_mut(&binding.room) {
            conns.remove(&conn);
            if conns.is_empty() {
                self.members.remove(&binding.room);
            }
        }
        Some(binding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn binding(handle: &str, room: &str) -> Binding {
        Binding::new(Handle::from(handle), RoomId::from(room))
    }

    fn bind(dir: &mut ConnectionDirectory, id: u64, handle: &str, room: &str) -> Option<Binding> {
        dir.bind(conn(id), Handle::from(handle), RoomId::from(room))
    }

    #[test]
    fn test_resolve_unbound_is_not_bound() {
        let dir = ConnectionDirectory::new();
        assert_eq!(dir.resolve(conn(1)), Err(DirectoryError::NotBound(conn(1))));
    }

    #[test]
    fn test_bind_then_resolve() {
        let mut dir = ConnectionDirectory::new();
        assert_eq!(bind(&mut dir, 1, "alice", "r1"), None);
        assert_eq!(dir.resolve(conn(1)), Ok(&binding("alice", "r1")));
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_rebind_same_connection_replaces_not_duplicates() {
        let mut dir = ConnectionDirectory::new();
        bind(&mut dir, 1, "alice", "r1");
        let previous = bind(&mut dir, 1, "alice", "r2");

        assert_eq!(previous, Some(binding("alice", "r1")));
        assert_eq!(dir.len(), 1);
        assert_eq!(dir.resolve(conn(1)), Ok(&binding("alice", "r2")));
        assert!(dir.connections_in(&RoomId::from("r1")).is_empty());
        assert_eq!(dir.connections_in(&RoomId::from("r2")), vec![conn(1)]);
    }

    #[test]
    fn test_bind_is_idempotent() {
        let mut dir = ConnectionDirectory::new();
        bind(&mut dir, 1, "alice", "r1");
        bind(&mut dir, 1, "alice", "r1");
        assert_eq!(dir.len(), 1);
        assert_eq!(dir.connections_in(&RoomId::from("r1")), vec![conn(1)]);
    }

    #[test]
    fn test_unbind_removes_binding() {
        let mut dir = ConnectionDirectory::new();
        bind(&mut dir, 1, "alice", "r1");

        assert_eq!(dir.unbind(conn(1)), Ok(binding("alice", "r1")));
        assert_eq!(dir.unbind(conn(1)), Err(DirectoryError::NotBound(conn(1))));
        assert!(dir.is_empty());
        assert!(dir.connections_in(&RoomId::from("r1")).is_empty());
    }

    #[test]
    fn test_connections_in_lists_room_members_in_order() {
        let mut dir = ConnectionDirectory::new();
        bind(&mut dir, 3, "bob", "r1");
        bind(&mut dir, 1, "alice", "r1");
        bind(&mut dir, 2, "carol", "r2");

        assert_eq!(dir.connections_in(&RoomId::from("r1")), vec![conn(1), conn(3)]);
        assert_eq!(dir.connections_in(&RoomId::from("r2")), vec![conn(2)]);
    }

    #[test]
    fn test_release_unbinds_only_matching_connections() {
        let mut dir = ConnectionDirectory::new();
        bind(&mut dir, 1, "alice", "r1");
        bind(&mut dir, 2, "alice", "r1");
        bind(&mut dir, 3, "bob", "r1");

        assert_eq!(dir.release(&binding("alice", "r1")), vec![conn(1), conn(2)]);
        assert_eq!(dir.connections_in(&RoomId::from("r1")), vec![conn(3)]);
        assert!(dir.release(&binding("alice", "r1")).is_empty());
    }

    #[test]
    fn test_is_held_tracks_other_connections() {
        let mut dir = ConnectionDirectory::new();
        bind(&mut dir, 1, "alice", "r1");
        bind(&mut dir, 2, "alice", "r1");

        dir.unbind(conn(1)).unwrap();
        assert!(dir.is_held(&binding("alice", "r1")));

        dir.unbind(conn(2)).unwrap();
        assert!(!dir.is_held(&binding("alice", "r1")));
    }
}
