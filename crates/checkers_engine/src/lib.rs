//! Checkers rules engine
//!
//! Pure board logic for 8x8 checkers: board setup, move and capture
//! enumeration, move execution with promotion, and terminal detection.
//! No I/O and no concurrency concerns; the multiplayer session layer in
//! `backend` drives this crate and owns all turn/rule sequencing.
//!
//! ## Module Organization
//!
//! - `types` - Core value types (Color, Piece, Square, move descriptors)
//! - `board` - The 8x8 grid and its setup/query operations
//! - `move_gen` - Step and capture enumeration
//! - `api` - Move execution and terminal detection
//! - `error` - Engine error types

pub mod api;
pub mod board;
pub mod error;
pub mod move_gen;
pub mod types;

pub use api::{apply_move, evaluate_winner};
pub use board::Board;
pub use error::{EngineError, EngineResult};
pub use move_gen::{capture_moves_from, captures_available, has_any_legal_move, step_moves_from};
pub use types::{Capture, Color, MoveApplied, Piece, Square, StepMove, BOARD_SIZE};
