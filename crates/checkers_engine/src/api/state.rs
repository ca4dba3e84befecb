//! Terminal detection
//!
//! A color with zero remaining pieces loses immediately; otherwise the
//! color to move with no legal move loses. No draws are modeled.

use crate::board::Board;
use crate::move_gen::has_any_legal_move;
use crate::types::Color;

/// Winner, if the game is over with `to_move` about to play.
pub fn evaluate_winner(board: &Board, to_move: Color) -> Option<Color> {
    if board.count(to_move) == 0 {
        return Some(to_move.opponent());
    }
    if !has_any_legal_move(board, to_move) {
        return Some(to_move.opponent());
    }
    None
}
