//! Per-connection outbound queues.
//!
//! Every live connection registers an unbounded channel here; a writer
//! task drains it onto the socket. The router never touches sockets, so
//! a slow client can only back up its own queue.

use std::collections::HashMap;

use noughts_protocol::OutboundEvent;
use noughts_transport::ConnectionId;
use tokio::sync::{Mutex, mpsc};

use crate::Delivery;

/// Sending half of a connection's queue.
pub type Outlet = mpsc::UnboundedSender<OutboundEvent>;

/// Routes outbound events to the queues of live connections.
#[derive(Default)]
pub struct Outbox {
    outlets: Mutex<HashMap<ConnectionId, Outlet>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a queue for `conn`, replacing any earlier one, and returns the
    /// receiving half.
    pub async fn register(&self, conn: ConnectionId) -> mpsc::UnboundedReceiver<OutboundEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.outlets.lock().await.insert(conn, tx);
        rx
    }

    /// Closes the queue for `conn`. Events already queued are still
    /// drained by the writer.
    pub async fn unregister(&self, conn: ConnectionId) {
        self.outlets.lock().await.remove(&conn);
    }

    /// Queues one event for one connection.
    ///
    /// Returns `false` if the connection is gone.
    pub async fn send(&self, conn: ConnectionId, event: OutboundEvent) -> bool {
        let outlets = self.outlets.lock().await;
        match outlets.get(&conn) {
            Some(outlet) => outlet.send(event).is_ok(),
            None => false,
        }
    }

    /// Queues every delivery, in order. Recipients that have gone away are
    /// skipped; a broadcast never fails because one member disconnected.
    pub async fn deliver(&self, deliveries: Vec<Delivery>) {
        if deliveries.is_empty() {
            return;
        }
        let outlets = self.outlets.lock().await;
        for Delivery { recipients, event } in deliveries {
            for conn in recipients {
                let sent = outlets
                    .get(&conn)
                    .is_some_and(|outlet| outlet.send(event.clone()).is_ok());
                if !sent {
                    tracing::trace!(%conn, event = event.name(), "recipient gone, dropping event");
                }
            }
        }
    }

    /// Returns the number of registered connections.
    pub async fn len(&self) -> usize {
        self.outlets.lock().await.len()
    }

    /// Returns `true` if no connection is registered.
    pub async fn is_empty(&self) -> bool {
        self.outlets.lock().await.is_empty()
    }
}
