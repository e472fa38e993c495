//! A single game's state machine.
//!
//! `Room` owns its seats, board, turn and status, and is the only code that
//! mutates them. Every operation either fails and leaves the room exactly as
//! it was, or succeeds and returns an outcome describing what changed. The
//! caller decides what to broadcast; the room never talks to connections.
//!
//! Rooms are not synchronized themselves. The registry wraps each one in
//! its own lock and a caller holds that lock for the whole call.

use noughts_protocol::{BOARD_CELLS, Cell, Handle, RoomId, Symbol};
use serde::Serialize;

use crate::{Board, Evaluation, RoomError, RoomStatus};

/// The two seats of a room, one per symbol.
///
/// Keying seats by symbol makes "at most two participants" and "distinct
/// symbols" structural rather than checked.
#[derive(Debug, Clone, Default)]
struct Seats {
    x: Option<Handle>,
    o: Option<Handle>,
}

impl Seats {
    fn holder(&self, symbol: Symbol) -> Option<&Handle> {
        match symbol {
            Symbol::X => self.x.as_ref(),
            Symbol::O => self.o.as_ref(),
        }
    }

    fn slot(&mut self, symbol: Symbol) -> &mut Option<Handle> {
        match symbol {
            Symbol::X => &mut self.x,
            Symbol::O => &mut self.o,
        }
    }

    fn symbol_of(&self, handle: &Handle) -> Option<Symbol> {
        [Symbol::X, Symbol::O]
            .into_iter()
            .find(|symbol| self.holder(*symbol) == Some(handle))
    }

    /// The symbol a newcomer would get: `X` if free, else `O` if free.
    fn vacant(&self) -> Option<Symbol> {
        [Symbol::X, Symbol::O]
            .into_iter()
            .find(|symbol| self.holder(*symbol).is_none())
    }

    fn vacate(&mut self, handle: &Handle) -> Option<Symbol> {
        let symbol = self.symbol_of(handle)?;
        *self.slot(symbol) = None;
        Some(symbol)
    }

    fn count(&self) -> usize {
        usize::from(self.x.is_some()) + usize::from(self.o.is_some())
    }

    fn occupants(&self) -> Vec<(Handle, Symbol)> {
        [Symbol::X, Symbol::O]
            .into_iter()
            .filter_map(|symbol| self.holder(symbol).map(|h| (h.clone(), symbol)))
            .collect()
    }
}

/// Result of a successful [`Room::join`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// The symbol the participant holds.
    pub role: Symbol,
    /// The board as the participant should see it.
    pub board: [Cell; BOARD_CELLS],
    /// The join filled the second seat and a new game began.
    pub started: bool,
    /// The participant already held this seat.
    pub rejoined: bool,
}

/// How an accepted move left the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Play continues with the other symbol.
    Ongoing,
    /// The mover completed a line. `loser` is `None` if the other seat
    /// was empty at the time.
    Win {
        winner: Handle,
        loser: Option<Handle>,
    },
    /// The board filled with no line.
    Draw,
}

/// Result of a successful [`Room::make_move`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub index: usize,
    pub symbol: Symbol,
    /// The symbol to move next, or `None` if the game just ended.
    pub next_turn: Option<Symbol>,
    pub verdict: Verdict,
}

impl MoveOutcome {
    /// Returns `true` if this move ended the game.
    pub fn is_terminal(&self) -> bool {
        !matches!(self.verdict, Verdict::Ongoing)
    }
}

/// Result of a successful [`Room::leave`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    /// Nobody is left; the registry should tear the room down.
    Emptied,
    /// The other participant is still seated.
    Remaining { handle: Handle },
}

/// An owned, point-in-time copy of a room, safe to hand to broadcasters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub status: RoomStatus,
    pub turn: Option<Symbol>,
    pub board: [Cell; BOARD_CELLS],
    pub participants: Vec<(Handle, Symbol)>,
}

/// One game instance.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    seats: Seats,
    board: Board,
    turn: Option<Symbol>,
    status: RoomStatus,
    /// Set by the registry when the room is removed. A caller that fetched
    /// the room just before removal must not resurrect it.
    closed: bool,
}

impl Room {
    /// Creates an empty room in `Waiting` with a fresh board.
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            seats: Seats::default(),
            board: Board::new(),
            turn: None,
            status: RoomStatus::Waiting,
            closed: false,
        }
    }

    /// Seats `handle`, or returns the seat it already holds.
    ///
    /// The first participant gets `X`, the second whichever symbol is
    /// free. Filling the second seat clears the board and starts a game
    /// with `X` to move.
    ///
    /// # Errors
    /// - [`RoomError::RoomFull`] if two other participants hold the seats
    /// - [`RoomError::NotFound`] if the room was torn down
    pub fn join(&mut self, handle: &Handle) -> Result<JoinOutcome, RoomError> {
        self.ensure_open()?;

        if let Some(role) = self.seats.symbol_of(handle) {
            tracing::debug!(room_id = %self.id, %handle, %role, "participant rejoined");
            return Ok(JoinOutcome {
                role,
                board: self.board.cells(),
                started: false,
                rejoined: true,
            });
        }

        let role = self
            .seats
            .vacant()
            .ok_or_else(|| RoomError::RoomFull(self.id.clone()))?;
        *self.seats.slot(role) = Some(handle.clone());

        tracing::info!(
            room_id = %self.id,
            %handle,
            %role,
            participants = self.seats.count(),
            "participant joined"
        );

        let started = self.seats.count() == 2;
        if started {
            self.start();
        }

        Ok(JoinOutcome {
            role,
            board: self.board.cells(),
            started,
            rejoined: false,
        })
    }

    /// Places the mover's symbol at `index`.
    ///
    /// Accepted only while the game is in progress, the mover's symbol is
    /// the one to move, and the cell is empty. A handle with no seat is
    /// treated as moving out of turn.
    ///
    /// # Errors
    /// - [`RoomError::NotYourTurn`] for a seatless mover, the wrong
    ///   symbol, or a game that is not running
    /// - [`RoomError::InvalidMove`] / [`RoomError::CellOccupied`] from the
    ///   board
    /// - [`RoomError::NotFound`] if the room was torn down
    pub fn make_move(&mut self, handle: &Handle, index: usize) -> Result<MoveOutcome, RoomError> {
        self.ensure_open()?;

        let symbol = self.seats.symbol_of(handle).ok_or(RoomError::NotYourTurn)?;
        if !self.status.is_active() || self.turn != Some(symbol) {
            return Err(RoomError::NotYourTurn);
        }

        self.board.place(index, symbol)?;

        let verdict = match self.board.evaluate() {
            Evaluation::Win(line) => {
                self.finish();
                Verdict::Win {
                    winner: handle.clone(),
                    loser: self.seats.holder(line.other()).cloned(),
                }
            }
            Evaluation::Draw => {
                self.finish();
                Verdict::Draw
            }
            Evaluation::Ongoing => {
                self.turn = Some(symbol.other());
                Verdict::Ongoing
            }
        };

        tracing::debug!(room_id = %self.id, %handle, index, %symbol, "move accepted");
        match &verdict {
            Verdict::Win { winner, .. } => {
                tracing::info!(room_id = %self.id, %winner, "game won");
            }
            Verdict::Draw => tracing::info!(room_id = %self.id, "game drawn"),
            Verdict::Ongoing => {}
        }

        Ok(MoveOutcome {
            index,
            symbol,
            next_turn: self.turn,
            verdict,
        })
    }

    /// Clears the board.
    ///
    /// Allowed in any state. With both seats filled a new game starts with
    /// `X` to move; otherwise the room goes back to `Waiting`. Returns the
    /// resulting status.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if the room was torn down.
    pub fn reset(&mut self) -> Result<RoomStatus, RoomError> {
        self.ensure_open()?;

        if self.seats.count() == 2 {
            self.start();
        } else {
            self.board.reset();
            self.turn = None;
            self.status = RoomStatus::Waiting;
        }
        tracing::info!(room_id = %self.id, status = %self.status, "board reset");
        Ok(self.status)
    }

    /// Starts a fresh game with both seated participants. Returns the
    /// symbol that moves first.
    ///
    /// # Errors
    /// - [`RoomError::NotEnoughPlayers`] unless both seats are filled
    /// - [`RoomError::NotFound`] if the room was torn down
    pub fn restart(&mut self) -> Result<Symbol, RoomError> {
        self.ensure_open()?;

        if self.seats.count() != 2 {
            return Err(RoomError::NotEnoughPlayers(self.id.clone()));
        }
        self.start();
        Ok(Symbol::X)
    }

    /// Frees the seat held by `handle`.
    ///
    /// Status and turn are left alone: a game abandoned mid-way stays
    /// where it was, with no winner assigned.
    ///
    /// # Errors
    /// - [`RoomError::NotInRoom`] if `handle` holds no seat
    /// - [`RoomError::NotFound`] if the room was torn down
    pub fn leave(&mut self, handle: &Handle) -> Result<Departure, RoomError> {
        self.ensure_open()?;

        let symbol = self
            .seats
            .vacate(handle)
            .ok_or_else(|| RoomError::NotInRoom(handle.clone(), self.id.clone()))?;

        tracing::info!(
            room_id = %self.id,
            %handle,
            %symbol,
            participants = self.seats.count(),
            "participant left"
        );

        match self.seats.holder(symbol.other()) {
            Some(remaining) => Ok(Departure::Remaining {
                handle: remaining.clone(),
            }),
            None => Ok(Departure::Emptied),
        }
    }

    /// Returns an owned copy of the room's current state.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id.clone(),
            status: self.status,
            turn: self.turn,
            board: self.board.cells(),
            participants: self.seats.occupants(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn turn(&self) -> Option<Symbol> {
        self.turn
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the symbol `handle` holds here, if any.
    pub fn symbol_of(&self, handle: &Handle) -> Option<Symbol> {
        self.seats.symbol_of(handle)
    }

    /// Returns the handle seated as `symbol`, if any.
    pub fn holder(&self, symbol: Symbol) -> Option<&Handle> {
        self.seats.holder(symbol)
    }

    pub fn participant_count(&self) -> usize {
        self.seats.count()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.count() == 0
    }

    /// Returns `true` once the registry has torn the room down.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    fn ensure_open(&self) -> Result<(), RoomError> {
        if self.closed {
            return Err(RoomError::NotFound(self.id.clone()));
        }
        Ok(())
    }

    fn start(&mut self) {
        self.board.reset();
        self.turn = Some(Symbol::X);
        self.status = RoomStatus::InProgress;
        tracing::info!(room_id = %self.id, "game started");
    }

    fn finish(&mut self) {
        self.turn = None;
        self.status = RoomStatus::Finished;
    }
}
