//! Wire protocol for the noughts game server.
//!
//! Everything a client and the server say to each other is a named event
//! with a payload:
//!
//! - **Vocabulary** ([`RoomId`], [`Handle`], [`Symbol`], [`Cell`]) shared by
//!   every layer above.
//! - **Events** ([`InboundEvent`], [`OutboundEvent`]) in their wire shape,
//!   `{"event": "<name>", "data": {...}}`.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) converting events to and
//!   from frame bytes.
//!
//! ```text
//! Transport (frames) → Protocol (events) → Router (rooms)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{BOARD_CELLS, Cell, Handle, InboundEvent, OutboundEvent, RoomId, Symbol};
