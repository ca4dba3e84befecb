//! Error types for the checkers engine
//!
//! Engine errors cover programming-level misuse only: coordinates outside
//! the board, an empty source square, or non-diagonal geometry handed to
//! move execution. Rule violations (wrong turn, mandatory capture, ...) are
//! not errors here; the session layer reports those as typed rejections.

use crate::types::Square;
use thiserror::Error;

/// Errors that can occur in the checkers engine
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// Coordinate outside the 8x8 board
    #[error("square ({row}, {col}) is outside the 8x8 board")]
    OutOfBounds { row: u8, col: u8 },

    /// No piece at the move's source square
    #[error("no piece on source square {square}")]
    EmptySource { square: Square },

    /// Move geometry is not a diagonal step or jump
    #[error("move from {from} to {to} is not a diagonal step or jump")]
    NotDiagonal { from: Square, to: Square },
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
