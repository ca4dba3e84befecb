//! Step and capture enumeration
//!
//! A regular piece moves along its color's two forward diagonals only;
//! direction checks are strict, so it can never step or capture backward.
//! A king uses all four diagonals. A capture needs an opposing piece on the
//! adjacent diagonal square and an empty in-bounds square two steps along
//! the same diagonal.

use crate::board::Board;
use crate::types::{Capture, Color, Piece, Square, StepMove};

const KING_DIRECTIONS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// Diagonal directions available to a piece.
fn directions_for(piece: Piece) -> &'static [(i8, i8)] {
    const RED_DIRECTIONS: [(i8, i8); 2] = [(-1, -1), (-1, 1)];
    const BLACK_DIRECTIONS: [(i8, i8); 2] = [(1, -1), (1, 1)];
    if piece.is_king {
        &KING_DIRECTIONS
    } else {
        match piece.color {
            Color::Red => &RED_DIRECTIONS,
            Color::Black => &BLACK_DIRECTIONS,
        }
    }
}

/// Captures available to the piece at `from`. Empty when the square is
/// empty or no jump is legal.
pub fn capture_moves_from(board: &Board, from: Square) -> Vec<Capture> {
    let Some(piece) = board.piece_at(from) else {
        return Vec::new();
    };

    let mut captures = Vec::new();
    for &(dr, dc) in directions_for(piece) {
        let Some(over) = from.offset(dr, dc) else {
            continue;
        };
        let Some(to) = from.offset(2 * dr, 2 * dc) else {
            continue;
        };
        let jumped_enemy = board
            .piece_at(over)
            .map(|p| p.color == piece.color.opponent())
            .unwrap_or(false);
        if jumped_enemy && board.is_empty(to) {
            captures.push(Capture { from, over, to });
        }
    }
    captures
}

/// Single-step moves available to the piece at `from`.
pub fn step_moves_from(board: &Board, from: Square) -> Vec<StepMove> {
    let Some(piece) = board.piece_at(from) else {
        return Vec::new();
    };

    let mut steps = Vec::new();
    for &(dr, dc) in directions_for(piece) {
        if let Some(to) = from.offset(dr, dc) {
            if board.is_empty(to) {
                steps.push(StepMove { from, to });
            }
        }
    }
    steps
}

/// All captures available to a color. A non-empty result makes capturing
/// mandatory for that color this turn.
pub fn captures_available(board: &Board, color: Color) -> Vec<Capture> {
    let mut captures = Vec::new();
    for square in board.squares_with(color) {
        captures.extend(capture_moves_from(board, square));
    }
    captures
}

/// Whether the color has any legal move at all; a color with pieces but no
/// moves has lost.
pub fn has_any_legal_move(board: &Board, color: Color) -> bool {
    for square in board.squares_with(color) {
        if !capture_moves_from(board, square).is_empty() {
            return true;
        }
        if !step_moves_from(board, square).is_empty() {
            return true;
        }
    }
    false
}
