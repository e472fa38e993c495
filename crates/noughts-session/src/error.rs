//! Error types for the session layer.

use noughts_transport::ConnectionId;

/// Errors from looking up connection bindings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// The connection never joined a room, or its binding was already
    /// removed. Callers resolving a disconnect treat this as a no-op.
    #[error("connection {0} is not bound to a room")]
    NotBound(ConnectionId),
}
