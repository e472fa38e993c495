//! Connection bookkeeping and collaborator hooks for noughts.
//!
//! 1. **Bindings**: which participant, in which room, each live connection
//!    speaks for ([`ConnectionDirectory`]). Lets a bare disconnect be
//!    resolved to the seat it should free.
//! 2. **Outcomes**: the hook through which finished games reach whatever
//!    keeps win/loss records ([`OutcomeSink`]). The server itself persists
//!    nothing.
//!
//! # How it fits in the stack
//!
//! ```text
//! Router (above)  ← resolves connections, reports outcomes
//!     ↕
//! Session layer (this crate)
//!     ↕
//! Protocol + transport (below)  ← Handle, RoomId, ConnectionId
//! ```

mod directory;
mod error;
mod outcome;

pub use directory::{Binding, ConnectionDirectory};
pub use error::DirectoryError;
pub use outcome::{GameOutcome, NullSink, OutcomeSink};
