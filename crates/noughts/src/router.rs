//! Event routing: inbound event → room operation → outbound deliveries.
//!
//! The router owns the [`RoomRegistry`] and the [`ConnectionDirectory`].
//! It never writes to a socket. Each call returns the list of
//! [`Delivery`]s the caller should hand to an [`Outbox`](crate::Outbox),
//! computed after every lock has been released.
//!
//! Errors never escape: a failed operation becomes an `invalid_move`
//! addressed to the requesting connection only.

use noughts_protocol::{Handle, InboundEvent, OutboundEvent, RoomId, Symbol};
use noughts_room::{Departure, RoomError, RoomRegistry, Verdict};
use noughts_session::{Binding, ConnectionDirectory, GameOutcome, NullSink, OutcomeSink};
use noughts_transport::ConnectionId;
use tokio::sync::Mutex;

/// One outbound event and the connections it is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub recipients: Vec<ConnectionId>,
    pub event: OutboundEvent,
}

impl Delivery {
    pub fn new(recipients: Vec<ConnectionId>, event: OutboundEvent) -> Self {
        Self { recipients, event }
    }

    /// A delivery to a single connection.
    pub fn to(conn: ConnectionId, event: OutboundEvent) -> Self {
        Self::new(vec![conn], event)
    }

    fn rejection(conn: ConnectionId, reason: impl std::fmt::Display) -> Vec<Self> {
        vec![Self::to(conn, OutboundEvent::invalid(reason))]
    }
}

/// Dispatches inbound events against rooms and computes who hears what.
///
/// Share it behind an `Arc`; every method takes `&self`. Operations on one
/// room are serialized by that room's lock, operations on different rooms
/// run in parallel.
pub struct EventRouter<S: OutcomeSink = NullSink> {
    registry: RoomRegistry,
    directory: Mutex<ConnectionDirectory>,
    sink: S,
}

impl Default for EventRouter<NullSink> {
    fn default() -> Self {
        Self::new(NullSink)
    }
}

impl<S: OutcomeSink> EventRouter<S> {
    /// Creates a router that reports finished games to `sink`.
    pub fn new(sink: S) -> Self {
        Self {
            registry: RoomRegistry::new(),
            directory: Mutex::new(ConnectionDirectory::new()),
            sink,
        }
    }

    /// The rooms this router manages.
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Returns what `conn` is currently bound to, if anything.
    pub async fn binding(&self, conn: ConnectionId) -> Option<Binding> {
        self.directory.lock().await.resolve(conn).ok().cloned()
    }

    /// Applies one inbound event from `conn`.
    pub async fn handle(&self, conn: ConnectionId, event: InboundEvent) -> Vec<Delivery> {
        tracing::debug!(%conn, event = event.name(), room_id = %event.room(), "inbound event");

        match event {
            InboundEvent::Join { room, username } => self.join(conn, room, username).await,
            InboundEvent::MakeMove {
                room,
                index,
                player,
            } => self.make_move(conn, room, index, player).await,
            InboundEvent::StartGame { room } => self.start_game(conn, room).await,
            InboundEvent::Reset { room } => self.reset(conn, room).await,
            InboundEvent::Leave { room, username } => self.leave(conn, room, username).await,
        }
    }

    /// Cleans up after a connection that went away.
    ///
    /// The participant is removed from its room unless another connection
    /// still speaks for the same handle in the same room. A connection that
    /// never joined produces nothing.
    pub async fn disconnect(&self, conn: ConnectionId) -> Vec<Delivery> {
        let unbound = self.directory.lock().await.unbind(conn);
        match unbound {
            Ok(binding) => {
                tracing::info!(%conn, handle = %binding.handle, room_id = %binding.room, "connection dropped");
                self.vacate(binding).await
            }
            Err(e) => {
                tracing::debug!(%conn, error = %e, "disconnect before join");
                Vec::new()
            }
        }
    }

    async fn join(&self, conn: ConnectionId, room_id: RoomId, handle: Handle) -> Vec<Delivery> {
        // The connection is bound before the seat lock is released, so a
        // second joiner filling the room always finds it among the members.
        let (joined, previous) = loop {
            let room = self.registry.get_or_create(&room_id).await;
            let mut room = room.lock().await;
            if room.is_closed() {
                continue;
            }
            let joined = match room.join(&handle) {
                Ok(joined) => joined,
                Err(e) => {
                    tracing::debug!(%conn, %handle, %room_id, error = %e, "join rejected");
                    return Delivery::rejection(conn, e);
                }
            };
            let previous = self
                .directory
                .lock()
                .await
                .bind(conn, handle.clone(), room_id.clone());
            break (joined, previous);
        };
        tracing::debug!(%conn, %handle, %room_id, rejoined = joined.rejoined, "connection joined");

        let binding = Binding::new(handle, room_id.clone());
        let mut deliveries = Vec::new();
        if let Some(previous) = previous.filter(|previous| *previous != binding) {
            deliveries.extend(self.vacate(previous).await);
        }

        deliveries.push(Delivery::to(
            conn,
            OutboundEvent::Joined {
                role: joined.role,
                board: joined.board,
            },
        ));
        if joined.started {
            deliveries.push(Delivery::new(
                self.members(&room_id).await,
                OutboundEvent::StartGame {},
            ));
        }
        deliveries
    }

    async fn make_move(
        &self,
        conn: ConnectionId,
        room_id: RoomId,
        index: usize,
        claimed: Option<Symbol>,
    ) -> Vec<Delivery> {
        let room = match self.registry.get(&room_id).await {
            Ok(room) => room,
            Err(e) => return Delivery::rejection(conn, e),
        };

        // The mover is whoever this connection joined as, and only in the
        // room it joined.
        let mover = self
            .directory
            .lock()
            .await
            .resolve(conn)
            .ok()
            .filter(|binding| binding.room == room_id)
            .map(|binding| binding.handle.clone());
        let Some(mover) = mover else {
            return Delivery::rejection(conn, RoomError::NotYourTurn);
        };

        let result = {
            let mut room = room.lock().await;
            match claimed {
                Some(symbol) if room.symbol_of(&mover) != Some(symbol) => {
                    Err(RoomError::NotYourTurn)
                }
                _ => room.make_move(&mover, index),
            }
        };
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::debug!(%conn, handle = %mover, %room_id, index, error = %e, "move rejected");
                return Delivery::rejection(conn, e);
            }
        };

        let members = self.members(&room_id).await;
        let mut deliveries = vec![Delivery::new(
            members.clone(),
            OutboundEvent::UpdateBoard {
                index: outcome.index,
                player: outcome.symbol,
                next_turn: outcome.next_turn,
            },
        )];

        let finished = match outcome.verdict {
            Verdict::Ongoing => None,
            Verdict::Win { winner, loser } => Some(GameOutcome::Win {
                room: room_id.clone(),
                winner,
                loser,
            }),
            Verdict::Draw => Some(GameOutcome::Draw {
                room: room_id.clone(),
            }),
        };
        if let Some(finished) = finished {
            deliveries.push(Delivery::new(
                members,
                OutboundEvent::GameOver {
                    winner: finished.winner().cloned(),
                },
            ));
            self.sink.record(finished).await;
        }
        deliveries
    }

    async fn start_game(&self, conn: ConnectionId, room_id: RoomId) -> Vec<Delivery> {
        let room = match self.registry.get(&room_id).await {
            Ok(room) => room,
            Err(e) => return Delivery::rejection(conn, e),
        };
        let restarted = room.lock().await.restart();
        match restarted {
            Ok(starting_player) => {
                tracing::info!(%conn, %room_id, "game restarted");
                vec![Delivery::new(
                    self.members(&room_id).await,
                    OutboundEvent::GameStarted { starting_player },
                )]
            }
            Err(e) => Delivery::rejection(conn, e),
        }
    }

    async fn reset(&self, conn: ConnectionId, room_id: RoomId) -> Vec<Delivery> {
        let room = match self.registry.get(&room_id).await {
            Ok(room) => room,
            Err(e) => return Delivery::rejection(conn, e),
        };
        let reset = room.lock().await.reset();
        match reset {
            Ok(_) => vec![Delivery::new(
                self.members(&room_id).await,
                OutboundEvent::ResetBoard {},
            )],
            Err(e) => Delivery::rejection(conn, e),
        }
    }

    async fn leave(&self, conn: ConnectionId, room_id: RoomId, handle: Handle) -> Vec<Delivery> {
        let remaining = match self.depart(&room_id, &handle).await {
            Ok(remaining) => remaining,
            Err(e) => {
                tracing::debug!(%conn, %handle, %room_id, error = %e, "leave rejected");
                return Delivery::rejection(conn, e);
            }
        };
        tracing::debug!(%conn, %handle, %room_id, "left room");

        // Anyone still speaking for the departed participant stops doing so.
        self.directory
            .lock()
            .await
            .release(&Binding::new(handle.clone(), room_id.clone()));

        let mut deliveries = vec![Delivery::to(
            conn,
            OutboundEvent::PlayerLeft {
                username: handle.clone(),
            },
        )];
        if remaining {
            deliveries.push(self.opponent_left(&room_id, handle).await);
        }
        deliveries
    }

    /// Removes a participant whose last connection went away or moved on.
    ///
    /// The directory is consulted under the room lock, so a join that
    /// rebinds the handle either lands first and keeps the seat or finds
    /// the seat already freed.
    async fn vacate(&self, binding: Binding) -> Vec<Delivery> {
        let room = match self.registry.get(&binding.room).await {
            Ok(room) => room,
            Err(e) => {
                tracing::debug!(handle = %binding.handle, room_id = %binding.room, error = %e, "nothing to vacate");
                return Vec::new();
            }
        };
        let departure = {
            let mut room = room.lock().await;
            if self.directory.lock().await.is_held(&binding) {
                tracing::debug!(handle = %binding.handle, room_id = %binding.room, "still held by another connection");
                return Vec::new();
            }
            room.leave(&binding.handle)
        };
        match self.settle(&binding.room, departure).await {
            Ok(true) => vec![self.opponent_left(&binding.room, binding.handle).await],
            Ok(false) => Vec::new(),
            Err(e) => {
                tracing::debug!(handle = %binding.handle, room_id = %binding.room, error = %e, "nothing to vacate");
                Vec::new()
            }
        }
    }

    /// Takes `handle` out of the room. Returns `true` if someone is still
    /// seated; otherwise the room has been torn down.
    async fn depart(&self, room_id: &RoomId, handle: &Handle) -> Result<bool, RoomError> {
        let room = self.registry.get(room_id).await?;
        let departure = room.lock().await.leave(handle);
        self.settle(room_id, departure).await
    }

    async fn settle(
        &self,
        room_id: &RoomId,
        departure: Result<Departure, RoomError>,
    ) -> Result<bool, RoomError> {
        match departure? {
            Departure::Remaining { .. } => Ok(true),
            Departure::Emptied => {
                self.registry.remove_if_empty(room_id).await;
                Ok(false)
            }
        }
    }

    async fn opponent_left(&self, room_id: &RoomId, handle: Handle) -> Delivery {
        let message = format!("Your opponent {handle} left the game.");
        Delivery::new(
            self.members(room_id).await,
            OutboundEvent::OpponentLeft {
                username: handle,
                message,
            },
        )
    }

    async fn members(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.directory.lock().await.connections_in(room_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn join(room: &str, username: &str) -> InboundEvent {
        InboundEvent::Join {
            room: RoomId::from(room),
            username: Handle::from(username),
        }
    }

    #[tokio::test]
    async fn test_first_join_gets_x_and_no_start() {
        let router = EventRouter::new(NullSink);
        let deliveries = router.handle(conn(1), join("r1", "alice")).await;

        assert_eq!(
            deliveries,
            vec![Delivery::to(
                conn(1),
                OutboundEvent::Joined {
                    role: Symbol::X,
                    board: Default::default(),
                },
            )]
        );
        assert_eq!(
            router.binding(conn(1)).await,
            Some(Binding::new(Handle::from("alice"), RoomId::from("r1")))
        );
    }

    #[tokio::test]
    async fn test_unbound_move_is_not_your_turn() {
        let router = EventRouter::new(NullSink);
        router.handle(conn(1), join("r1", "alice")).await;

        let deliveries = router
            .handle(
                conn(2),
                InboundEvent::MakeMove {
                    room: RoomId::from("r1"),
                    index: 0,
                    player: None,
                },
            )
            .await;
        assert_eq!(deliveries, Delivery::rejection(conn(2), "Not your turn"));
    }

    #[tokio::test]
    async fn test_disconnect_of_unknown_connection_is_silent() {
        let router = EventRouter::new(NullSink);
        assert!(router.disconnect(conn(42)).await.is_empty());
    }
}
