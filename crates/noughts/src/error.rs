//! Unified error type for the noughts server.

use noughts_protocol::ProtocolError;
use noughts_room::RoomError;
use noughts_session::DirectoryError;
use noughts_transport::TransportError;

/// Top-level error that wraps every layer's errors.
///
/// Room and directory errors never end a connection; the router turns
/// them into `invalid_move` events. They appear here so callers using the
/// registry or directory directly can still use `?`.
#[derive(Debug, thiserror::Error)]
pub enum NoughtsError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An encode/decode error.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, not found, not your turn).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A connection that was never bound.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// A configuration value could not be used.
    #[error("invalid configuration: {0}")]
    Config(String),
}
