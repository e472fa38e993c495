//! # noughts
//!
//! Real-time session manager for two-player noughts and crosses over
//! persistent connections.
//!
//! Many rooms run at once. Each room seats two participants, keeps the
//! board and whose turn it is, and stays consistent while moves, joins and
//! disconnects arrive concurrently on independent connections. Operations
//! on one room are serialized; operations on different rooms are not.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use noughts::prelude::*;
//!
//! # async fn serve() -> Result<(), NoughtsError> {
//! let server = NoughtsServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(NullSink)
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! The [`EventRouter`] can also be driven directly, without any transport:
//! feed it [`InboundEvent`](noughts_protocol::InboundEvent)s and inspect
//! the [`Delivery`] list it returns.

mod config;
mod error;
mod handler;
mod outbox;
mod router;
mod server;

pub use config::ServerConfig;
pub use error::NoughtsError;
pub use outbox::{Outbox, Outlet};
pub use router::{Delivery, EventRouter};
pub use server::{NoughtsServer, NoughtsServerBuilder};

/// Everything needed to run a server or drive a router.
pub mod prelude {
    pub use crate::{
        Delivery, EventRouter, NoughtsError, NoughtsServer, NoughtsServerBuilder, Outbox,
        ServerConfig,
    };
    pub use noughts_protocol::{
        Cell, Codec, Handle, InboundEvent, JsonCodec, OutboundEvent, RoomId, Symbol,
    };
    pub use noughts_room::{RoomRegistry, RoomSnapshot, RoomStatus};
    pub use noughts_session::{Binding, GameOutcome, NullSink, OutcomeSink};
    pub use noughts_transport::ConnectionId;
}
