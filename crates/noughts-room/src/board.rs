//! The 3×3 board and its win/draw evaluation.

use noughts_protocol::{BOARD_CELLS, Cell, Symbol};

use crate::RoomError;

/// The eight index triples that win: rows, columns, then diagonals.
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Result of evaluating a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Some line holds three of this symbol.
    Win(Symbol),
    /// Every cell is filled and no line won.
    Draw,
    /// Neither of the above.
    Ongoing,
}

/// Nine cells in row-major order.
///
/// Cells only ever go from empty to a symbol. The one way back is
/// [`reset`](Board::reset), which empties all nine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board {
    cells: [Cell; BOARD_CELLS],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties every cell.
    pub fn reset(&mut self) {
        self.cells = [Cell::Empty; BOARD_CELLS];
    }

    /// Places `symbol` at `index`.
    ///
    /// # Errors
    /// - [`RoomError::InvalidMove`] if `index` is not in `0..9`
    /// - [`RoomError::CellOccupied`] if the cell already holds a symbol
    pub fn place(&mut self, index: usize, symbol: Symbol) -> Result<(), RoomError> {
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(RoomError::InvalidMove(index))?;
        if !cell.is_empty() {
            return Err(RoomError::CellOccupied(index));
        }
        *cell = Cell::from(symbol);
        Ok(())
    }

    /// Evaluates the board. A completed line always wins, even on a full
    /// board.
    pub fn evaluate(&self) -> Evaluation {
        for [a, b, c] in LINES {
            if let Some(symbol) = self.cells[a].symbol() {
                if self.cells[b] == self.cells[a] && self.cells[c] == self.cells[a] {
                    return Evaluation::Win(symbol);
                }
            }
        }
        if self.is_full() {
            Evaluation::Draw
        } else {
            Evaluation::Ongoing
        }
    }

    /// Returns `true` if no cell is empty.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_empty())
    }

    /// Returns the cell at `index`, or `None` if out of range.
    pub fn cell(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// Returns a copy of all nine cells.
    pub fn cells(&self) -> [Cell; BOARD_CELLS] {
        self.cells
    }
}

impl From<[Cell; BOARD_CELLS]> for Board {
    fn from(cells: [Cell; BOARD_CELLS]) -> Self {
        Self { cells }
    }
}
