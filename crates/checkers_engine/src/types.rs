//! Core value types for the checkers engine
//!
//! The board is an 8x8 grid where only squares of odd `(row + col)` parity
//! ("dark" squares) are playable. `Square` is constructor-validated so every
//! value held by the engine is already inside the board; wire coordinates are
//! converted through [`Square::new`] at the transport boundary.
//!
//! Red's forward direction is decreasing row (crown row 0), Black's is
//! increasing row (crown row 7).

use crate::error::EngineError;
use std::fmt;

/// Side length of the board.
pub const BOARD_SIZE: usize = 8;

/// Pieces per color in the initial position.
pub const PIECES_PER_SIDE: usize = 12;

/// Piece color. Red joins first and starts on rows 5-7.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Color {
    Red,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    /// Row delta of a regular piece's forward movement.
    pub fn forward(self) -> i8 {
        match self {
            Color::Red => -1,
            Color::Black => 1,
        }
    }

    /// The farthest row for this color; reaching it promotes.
    pub fn crown_row(self) -> u8 {
        match self {
            Color::Red => 0,
            Color::Black => (BOARD_SIZE - 1) as u8,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => write!(f, "red"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// A piece on the board. `is_king` flips once on promotion, never reverts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Piece {
    pub color: Color,
    pub is_king: bool,
}

impl Piece {
    pub fn new(color: Color) -> Piece {
        Piece {
            color,
            is_king: false,
        }
    }

    pub fn king(color: Color) -> Piece {
        Piece {
            color,
            is_king: true,
        }
    }
}

/// A validated board coordinate, 0-indexed row and column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    /// Build a square, rejecting coordinates outside the 8x8 board.
    pub fn new(row: u8, col: u8) -> Result<Square, EngineError> {
        if row as usize >= BOARD_SIZE || col as usize >= BOARD_SIZE {
            return Err(EngineError::OutOfBounds { row, col });
        }
        Ok(Square { row, col })
    }

    #[inline]
    pub fn row(self) -> u8 {
        self.row
    }

    #[inline]
    pub fn col(self) -> u8 {
        self.col
    }

    /// Only dark squares (odd row+col parity) are playable.
    #[inline]
    pub fn is_dark(self) -> bool {
        (self.row + self.col) % 2 == 1
    }

    /// Offset by a row/column delta, `None` when the result leaves the board.
    pub fn offset(self, dr: i8, dc: i8) -> Option<Square> {
        let row = self.row as i16 + dr as i16;
        let col = self.col as i16 + dc as i16;
        if (0..BOARD_SIZE as i16).contains(&row) && (0..BOARD_SIZE as i16).contains(&col) {
            Some(Square {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A single capture: the jumping piece's origin, the jumped square, and the
/// empty landing square two steps along the same diagonal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Capture {
    pub from: Square,
    pub over: Square,
    pub to: Square,
}

/// A single non-capturing diagonal step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepMove {
    pub from: Square,
    pub to: Square,
}

/// Outcome of [`crate::api::apply_move`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveApplied {
    /// Square the captured piece was removed from, if the move was a jump.
    pub captured: Option<Square>,
    /// Whether the moved piece was promoted on the landing square.
    pub promoted: bool,
}
