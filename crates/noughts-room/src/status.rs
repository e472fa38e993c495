//! Room lifecycle state machine.

use serde::Serialize;

/// The lifecycle state of a room.
///
/// ```text
/// Waiting ──(second seat filled)──→ InProgress ──(win/draw)──→ Finished
///    ↑                                   ↑                        │
///    └────────(reset, one seat)──────────┴──(reset, two seats)────┘
/// ```
///
/// - **Waiting**: zero or one participant, no moves accepted.
/// - **InProgress**: two participants, moves accepted in turn.
/// - **Finished**: a win or draw was reached; awaiting reset or teardown.
///
/// A participant leaving mid-game does not move the room anywhere; the
/// status stays as it was until the seat is refilled or the board reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Waiting,
    InProgress,
    Finished,
}

impl RoomStatus {
    /// Returns `true` while moves are being accepted.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// Returns `true` once a win or draw has been reached.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "WAITING"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Finished => write!(f, "FINISHED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_in_progress_is_active() {
        assert!(!RoomStatus::Waiting.is_active());
        assert!(RoomStatus::InProgress.is_active());
        assert!(!RoomStatus::Finished.is_active());
    }

    #[test]
    fn test_only_finished_is_terminal() {
        assert!(!RoomStatus::Waiting.is_terminal());
        assert!(!RoomStatus::InProgress.is_terminal());
        assert!(RoomStatus::Finished.is_terminal());
    }

    #[test]
    fn test_display_matches_serialized_form() {
        for status in [RoomStatus::Waiting, RoomStatus::InProgress, RoomStatus::Finished] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }
}
