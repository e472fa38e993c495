//! Error types for the room layer.
//!
//! Every variant is local to one request. The room is left exactly as it
//! was before the failed call. The `Display` text is what the requester
//! sees in `invalid_move`, so it is phrased for players, not operators.

use noughts_protocol::{Handle, RoomId};

/// Errors that can occur during room operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist, or was torn down while the request was
    /// in flight.
    #[error("Room no longer exists")]
    NotFound(RoomId),

    /// Both seats are held by other participants.
    #[error("Room is full")]
    RoomFull(RoomId),

    /// The mover holds no seat, holds the other symbol, or no game is
    /// running.
    #[error("Not your turn")]
    NotYourTurn,

    /// The index is outside the board.
    #[error("Invalid cell index {0}")]
    InvalidMove(usize),

    /// The target cell already holds a symbol.
    #[error("Cell {0} is already occupied")]
    CellOccupied(usize),

    /// The participant holds no seat in this room.
    #[error("{0} is not in room {1}")]
    NotInRoom(Handle, RoomId),

    /// A restart needs both seats filled.
    #[error("Waiting for an opponent")]
    NotEnoughPlayers(RoomId),
}
