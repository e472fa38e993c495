//! Hook for reporting finished games to a statistics collaborator.
//!
//! The server does not keep win/loss records. Whoever does implements
//! [`OutcomeSink`] and receives one [`GameOutcome`] per finished game.

use std::future::Future;

use noughts_protocol::{Handle, RoomId};

/// How a game ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameOutcome {
    /// `winner` completed a line. `loser` is `None` if the other seat was
    /// empty when the game ended.
    Win {
        room: RoomId,
        winner: Handle,
        loser: Option<Handle>,
    },
    /// The board filled with no line.
    Draw { room: RoomId },
}

impl GameOutcome {
    /// The room the game was played in.
    pub fn room(&self) -> &RoomId {
        match self {
            Self::Win { room, .. } | Self::Draw { room } => room,
        }
    }

    /// The winning handle, or `None` for a draw.
    pub fn winner(&self) -> Option<&Handle> {
        match self {
            Self::Win { winner, .. } => Some(winner),
            Self::Draw { .. } => None,
        }
    }
}

/// Receives finished games.
///
/// Called after the room's lock is released, once per game-ending move.
/// Implementations that talk to a database should not hold up the caller
/// longer than a single write.
///
/// # Example
///
/// ```rust
/// use noughts_session::{GameOutcome, OutcomeSink};
///
/// struct PrintSink;
///
/// impl OutcomeSink for PrintSink {
///     async fn record(&self, outcome: GameOutcome) {
///         println!("{} finished: {:?}", outcome.room(), outcome.winner());
///     }
/// }
/// ```
pub trait OutcomeSink: Send + Sync + 'static {
    /// Records one finished game.
    fn record(&self, outcome: GameOutcome) -> impl Future<Output = ()> + Send;
}

/// A sink that discards every outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl OutcomeSink for NullSink {
    async fn record(&self, _outcome: GameOutcome) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_accessors() {
        let outcome = GameOutcome::Win {
            room: RoomId::from("r1"),
            winner: Handle::from("alice"),
            loser: Some(Handle::from("bob")),
        };
        assert_eq!(outcome.room().as_str(), "r1");
        assert_eq!(outcome.winner(), Some(&Handle::from("alice")));
    }

    #[test]
    fn test_draw_has_no_winner() {
        let outcome = GameOutcome::Draw {
            room: RoomId::from("r1"),
        };
        assert_eq!(outcome.winner(), None);
    }

    #[tokio::test]
    async fn test_null_sink_accepts_outcomes() {
        NullSink
            .record(GameOutcome::Draw {
                room: RoomId::from("r1"),
            })
            .await;
    }
}
