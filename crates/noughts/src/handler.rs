//! Per-connection handler: outbound writer, inbound loop, cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register an outbound queue and spawn the writer that drains it and
//!      pings the peer on an interval
//!   2. Loop: receive frames → decode → route → queue deliveries
//!   3. On close, or when the transport fails in either direction, the
//!      guard runs disconnect cleanup
//!
//! A connection that is merely quiet is never reaped.

use std::sync::Arc;

use noughts_protocol::{Codec, InboundEvent, OutboundEvent};
use noughts_session::OutcomeSink;
use noughts_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

use crate::server::ServerState;
use crate::NoughtsError;

/// Drop guard that runs disconnect cleanup when the handler exits.
///
/// Cleanup happens even if the handler panics. Since `Drop` is
/// synchronous, the async part is spawned as a fire-and-forget task.
struct ConnectionGuard<S: OutcomeSink, C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<S, C>>,
}

impl<S: OutcomeSink, C: Codec> Drop for ConnectionGuard<S, C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.outbox.unregister(conn_id).await;
            let deliveries = state.router.disconnect(conn_id).await;
            state.outbox.deliver(deliveries).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<S, C>>,
) -> Result<(), NoughtsError>
where
    S: OutcomeSink,
    C: Codec,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let outbound = state.outbox.register(conn_id).await;
    let _guard = ConnectionGuard {
        conn_id,
        state: Arc::clone(&state),
    };
    let mut writer = tokio::spawn(write_loop(Arc::clone(&conn), outbound, Arc::clone(&state)));

    loop {
        let data = tokio::select! {
            received = conn.recv() => match received {
                Ok(Some(data)) => data,
                Ok(None) => {
                    tracing::info!(%conn_id, "connection closed cleanly");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "recv error");
                    break;
                }
            },
            _ = &mut writer => {
                tracing::info!(%conn_id, "transport lost");
                break;
            }
        };

        let event: InboundEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode event");
                state
                    .outbox
                    .send(conn_id, OutboundEvent::invalid(format!("Malformed event: {e}")))
                    .await;
                continue;
            }
        };

        let deliveries = state.router.handle(conn_id, event).await;
        state.outbox.deliver(deliveries).await;
    }

    writer.abort();
    // _guard drops here → disconnect cleanup fires.
    Ok(())
}

/// Drains a connection's queue onto its socket and pings the peer every
/// `ping_interval`. Returns when the queue closes or the transport rejects
/// a send or a ping.
async fn write_loop<S, C>(
    conn: Arc<WebSocketConnection>,
    mut outbound: mpsc::UnboundedReceiver<OutboundEvent>,
    state: Arc<ServerState<S, C>>,
) where
    S: OutcomeSink,
    C: Codec,
{
    let conn_id = conn.id();
    let mut keepalive = time::interval_at(
        time::Instant::now() + state.config.ping_interval,
        state.config.ping_interval,
    );
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            event = outbound.recv() => {
                let Some(event) = event else { break };
                let bytes = match state.codec.encode(&event) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::warn!(%conn_id, event = event.name(), error = %e, "failed to encode event");
                        continue;
                    }
                };
                if let Err(e) = conn.send(&bytes).await {
                    tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
                    break;
                }
            }
            _ = keepalive.tick() => {
                if let Err(e) = conn.ping().await {
                    tracing::debug!(%conn_id, error = %e, "keepalive failed, stopping writer");
                    break;
                }
            }
        }
    }
}
