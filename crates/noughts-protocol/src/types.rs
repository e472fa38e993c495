//! Core protocol types: identities, board vocabulary, and events.
//!
//! Every type here travels on the wire, so the serde attributes are part
//! of the contract. Changing a rename breaks clients.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of cells on the board.
pub const BOARD_CELLS: usize = 9;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Externally supplied identifier of a game room.
///
/// Opaque to the server: any string names a room, and the first join that
/// names an unseen id brings the room into existence. Serialized as a plain
/// string (`"r1"`, not `{"0":"r1"}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps a raw room identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An authenticated participant's external identity.
///
/// The identity layer has already verified it by the time it reaches the
/// server; here it is only compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    /// Wraps a raw participant handle.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Returns the handle as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Handle {
    fn from(handle: &str) -> Self {
        Self::new(handle)
    }
}

impl From<String> for Handle {
    fn from(handle: String) -> Self {
        Self(handle)
    }
}

// ---------------------------------------------------------------------------
// Board vocabulary
// ---------------------------------------------------------------------------

/// A participant's marker. `X` always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    /// Returns the opposing symbol.
    pub fn other(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => f.write_str("X"),
            Self::O => f.write_str("O"),
        }
    }
}

/// One square of the board.
///
/// Serialized as `""`, `"X"` or `"O"`, so a whole board is a flat JSON
/// array of nine strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    #[serde(rename = "")]
    Empty,
    X,
    O,
}

impl Cell {
    /// Returns `true` if no symbol has been placed here.
    pub fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the symbol occupying this cell, if any.
    pub fn symbol(self) -> Option<Symbol> {
        match self {
            Self::Empty => None,
            Self::X => Some(Symbol::X),
            Self::O => Some(Symbol::O),
        }
    }
}

impl From<Symbol> for Cell {
    fn from(symbol: Symbol) -> Self {
        match symbol {
            Symbol::X => Self::X,
            Symbol::O => Self::O,
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events a client sends to the server.
///
/// Adjacently tagged: `{"event": "make_move", "data": {"room": "r1",
/// "index": 4, "player": "X"}}`. Disconnects are not on the wire; the
/// transport reports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Take (or retake) a seat in a room, creating the room if needed.
    Join { room: RoomId, username: Handle },

    /// Place the mover's symbol at `index` (0-8, row-major).
    ///
    /// `player` is the symbol the client believes it holds. When present it
    /// must match the seat the server assigned.
    MakeMove {
        room: RoomId,
        index: usize,
        #[serde(default)]
        player: Option<Symbol>,
    },

    /// Start a fresh game with both seated participants.
    StartGame { room: RoomId },

    /// Clear the board.
    Reset { room: RoomId },

    /// Give up a seat.
    Leave { room: RoomId, username: Handle },
}

impl InboundEvent {
    /// The wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::MakeMove { .. } => "make_move",
            Self::StartGame { .. } => "start_game",
            Self::Reset { .. } => "reset",
            Self::Leave { .. } => "leave",
        }
    }

    /// The room the event targets.
    pub fn room(&self) -> &RoomId {
        match self {
            Self::Join { room, .. }
            | Self::MakeMove { room, .. }
            | Self::StartGame { room }
            | Self::Reset { room }
            | Self::Leave { room, .. } => room,
        }
    }
}

/// Events the server sends to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// To the joiner only: the seat it holds and the current board.
    Joined {
        role: Symbol,
        board: [Cell; BOARD_CELLS],
    },

    /// To the room: the second seat was just filled.
    StartGame {},

    /// To the room: a restart was requested and `starting_player` moves.
    GameStarted { starting_player: Symbol },

    /// To the room: a move was accepted. `next_turn` is `null` once the
    /// game has ended.
    UpdateBoard {
        index: usize,
        player: Symbol,
        next_turn: Option<Symbol>,
    },

    /// To the room: the game ended. `winner` is `null` on a draw.
    GameOver { winner: Option<Handle> },

    /// To the room: the board was cleared.
    ResetBoard {},

    /// To the leaver only: the leave was processed.
    PlayerLeft { username: Handle },

    /// To whoever remains: a participant left or disconnected.
    OpponentLeft { username: Handle, message: String },

    /// To the requester only: the request was rejected.
    InvalidMove { message: String },
}

impl OutboundEvent {
    /// Builds an `invalid_move` carrying the display text of `reason`.
    pub fn invalid(reason: impl fmt::Display) -> Self {
        Self::InvalidMove {
            message: reason.to_string(),
        }
    }

    /// The wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Joined { .. } => "joined",
            Self::StartGame {} => "start_game",
            Self::GameStarted { .. } => "game_started",
            Self::UpdateBoard { .. } => "update_board",
            Self::GameOver { .. } => "game_over",
            Self::ResetBoard {} => "reset_board",
            Self::PlayerLeft { .. } => "player_left",
            Self::OpponentLeft { .. } => "opponent_left",
            Self::InvalidMove { .. } => "invalid_move",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
