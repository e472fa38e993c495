//! `NoughtsServer` builder and server loop.
//!
//! This is the entry point for running a noughts server. It ties together
//! all the layers: transport → protocol → router → rooms.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use noughts_protocol::{Codec, JsonCodec};
use noughts_session::OutcomeSink;
use noughts_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{EventRouter, NoughtsError, Outbox, ServerConfig};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The router
/// and outbox do their own locking.
pub(crate) struct ServerState<S: OutcomeSink, C: Codec> {
    pub(crate) router: EventRouter<S>,
    pub(crate) outbox: Outbox,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a noughts server.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use noughts::prelude::*;
///
/// # async fn serve() -> Result<(), NoughtsError> {
/// let server = NoughtsServer::builder()
///     .bind("0.0.0.0:8080")
///     .ping_interval(Duration::from_secs(10))
///     .build(NullSink)
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct NoughtsServerBuilder {
    config: ServerConfig,
}

impl NoughtsServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets how often each connection is pinged.
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.config.ping_interval = interval;
        self
    }

    /// Replaces every setting at once.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the listener and returns a server that reports finished
    /// games to `sink`.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`. A zero ping interval is
    /// a [`NoughtsError::Config`].
    pub async fn build<S: OutcomeSink>(
        self,
        sink: S,
    ) -> Result<NoughtsServer<S, JsonCodec>, NoughtsError> {
        if self.config.ping_interval.is_zero() {
            return Err(NoughtsError::Config(
                "ping interval must be greater than zero".into(),
            ));
        }
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let state = Arc::new(ServerState {
            router: EventRouter::new(sink),
            outbox: Outbox::new(),
            codec: JsonCodec,
            config: self.config,
        });

        Ok(NoughtsServer { transport, state })
    }
}

impl Default for NoughtsServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound noughts server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct NoughtsServer<S: OutcomeSink, C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<S, C>>,
}

impl NoughtsServer<noughts_session::NullSink> {
    /// Creates a new builder.
    pub fn builder() -> NoughtsServerBuilder {
        NoughtsServerBuilder::new()
    }
}

impl<S, C> NoughtsServer<S, C>
where
    S: OutcomeSink,
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, NoughtsError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), NoughtsError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Connections already open keep running after the loop stops.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), NoughtsError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "noughts server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested, no longer accepting");
                    return Ok(());
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }
    }
}
