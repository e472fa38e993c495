//! Game core for noughts: board rules, the per-room state machine, and the
//! registry that owns every live room.
//!
//! # Key types
//!
//! - [`Board`]: nine cells and win/draw evaluation
//! - [`Room`]: one game's seats, board, turn and status; all mutation
//!   goes through it and each operation returns what changed
//! - [`RoomRegistry`]: room id → room, each room behind its own lock
//! - [`RoomStatus`]: lifecycle state machine
//!
//! Nothing in this crate sends anything anywhere. Callers turn the
//! returned outcomes into outbound events after releasing the room lock.

mod board;
mod error;
mod registry;
mod room;
mod status;

pub use board::{Board, Evaluation, LINES};
pub use error::RoomError;
pub use registry::{RoomRegistry, SharedRoom};
pub use room::{Departure, JoinOutcome, MoveOutcome, Room, RoomSnapshot, Verdict};
pub use status::RoomStatus;
