//! Move execution
//!
//! `apply_move` performs a step or jump that has already been validated
//! against the rules; it only checks the geometry it needs to execute.
//! The session layer runs the full rule checks (turn, mandatory capture,
//! continuation) before calling in.

use crate::board::Board;
use crate::error::{EngineError, EngineResult};
use crate::types::{MoveApplied, Square};

/// Execute a move on the board.
///
/// Relocates the piece at `from` to `to`; on a jump the square in between
/// is cleared; a non-king landing on its crown row is promoted. Returns the
/// captured square (if any) and whether promotion occurred.
///
/// # Errors
///
/// `EmptySource` when `from` holds no piece; `NotDiagonal` when the move is
/// not a diagonal step or jump. Rule legality is not checked here.
pub fn apply_move(board: &mut Board, from: Square, to: Square) -> EngineResult<MoveApplied> {
    let dr = to.row() as i16 - from.row() as i16;
    let dc = to.col() as i16 - from.col() as i16;
    if dr.abs() != dc.abs() || !(dr.abs() == 1 || dr.abs() == 2) {
        return Err(EngineError::NotDiagonal { from, to });
    }

    let mut piece = board
        .clear(from)
        .ok_or(EngineError::EmptySource { square: from })?;

    let captured = if dr.abs() == 2 {
        let over = from
            .offset((dr / 2) as i8, (dc / 2) as i8)
            .expect("midpoint of two in-bounds squares is in bounds");
        board.clear(over).map(|_| over)
    } else {
        None
    };

    let promoted = !piece.is_king && to.row() == piece.color.crown_row();
    if promoted {
        piece.is_king = true;
    }
    board.set(to, piece);

    Ok(MoveApplied { captured, promoted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Color, Piece};
    use pretty_assertions::assert_eq;

    fn sq(row: u8, col: u8) -> Square {
        Square::new(row, col).expect("test square in bounds")
    }

    #[test]
    fn step_relocates_the_piece() {
        let mut board = Board::empty();
        board.set(sq(5, 4), Piece::new(Color::Red));

        let applied = apply_move(&mut board, sq(5, 4), sq(4, 3)).expect("legal step");
        assert_eq!(applied, MoveApplied { captured: None, promoted: false });
        assert!(board.is_empty(sq(5, 4)));
        assert_eq!(board.piece_at(sq(4, 3)), Some(Piece::new(Color::Red)));
    }

    #[test]
    fn jump_clears_the_captured_square() {
        let mut board = Board::empty();
        board.set(sq(5, 5), Piece::king(Color::Red));
        board.set(sq(4, 4), Piece::new(Color::Black));

        let applied = apply_move(&mut board, sq(5, 5), sq(3, 3)).expect("legal jump");
        assert_eq!(applied.captured, Some(sq(4, 4)));
        assert!(board.is_empty(sq(4, 4)));
        assert_eq!(board.piece_at(sq(3, 3)), Some(Piece::king(Color::Red)));
    }

    #[test]
    fn landing_on_crown_row_promotes() {
        let mut board = Board::empty();
        board.set(sq(1, 2), Piece::new(Color::Red));

        let applied = apply_move(&mut board, sq(1, 2), sq(0, 1)).expect("legal step");
        assert!(applied.promoted);
        assert_eq!(board.piece_at(sq(0, 1)), Some(Piece::king(Color::Red)));
    }

    #[test]
    fn king_crossing_crown_row_does_not_repromote() {
        let mut board = Board::empty();
        board.set(sq(1, 2), Piece::king(Color::Red));

        let applied = apply_move(&mut board, sq(1, 2), sq(0, 1)).expect("legal step");
        assert!(!applied.promoted);
    }

    #[test]
    fn empty_source_is_an_error() {
        let mut board = Board::empty();
        assert_eq!(
            apply_move(&mut board, sq(5, 4), sq(4, 3)),
            Err(EngineError::EmptySource { square: sq(5, 4) })
        );
    }

    #[test]
    fn non_diagonal_geometry_is_an_error() {
        let mut board = Board::empty();
        board.set(sq(5, 4), Piece::new(Color::Red));
        assert!(apply_move(&mut board, sq(5, 4), sq(5, 6)).is_err());
        assert!(apply_move(&mut board, sq(5, 4), sq(2, 1)).is_err());
    }
}
