//! Messages exchanged between clients and the room server
//!
//! Everything travels as JSON over the WebSocket. Inbound coordinates are
//! raw `(row, col)` pairs; the transport validates them into engine
//! `Square`s before the session sees them, so malformed coordinates never
//! reach game logic.

use checkers_engine::{Board, Color, Square};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Identifies one WebSocket connection for the lifetime of the socket.
pub type ConnId = Uuid;

/// Client → Server commands.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum ClientMessage {
    CreateRoom { name: String },
    JoinRoom { code: String, name: String },
    LeaveRoom,
    SubmitMove { from: (u8, u8), to: (u8, u8) },
    ChooseTurnOrder { choice: String },
    RequestNewGame,
    CancelNewGame,
    QueryLegalMoves { cell: (u8, u8) },
}

/// Server → Client events.
///
/// `RoomJoined`, `MoveRejected`, `LegalMoves`, and `Error` go to a single
/// connection; everything else is broadcast to the whole room.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum ServerMessage {
    RoomJoined {
        code: String,
        your_color: Color,
    },
    PlayerJoined {
        id: ConnId,
        name: String,
        color: Color,
    },
    PlayerLeft {
        id: ConnId,
        name: String,
    },
    State(GameSnapshot),
    MoveApplied(MoveBroadcast),
    TurnOrderPending {
        chooser: ConnId,
    },
    TurnOrderResolved {
        first: Color,
    },
    NewGameRequested {
        by: ConnId,
    },
    NewGameCancelled {
        by: ConnId,
    },
    NewGameApplied,
    GameOver {
        winner: Color,
    },
    MoveRejected {
        reason: RejectReason,
    },
    LegalMoves {
        from: (u8, u8),
        moves: Vec<MoveOption>,
    },
    Error {
        message: String,
    },
}

/// Broadcast payload for an accepted move.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct MoveBroadcast {
    pub by: Color,
    pub from: Square,
    pub to: Square,
    pub captured: Option<Square>,
    pub promoted: bool,
    /// The mover must keep capturing with the same piece.
    pub turn_continues: bool,
    pub next_turn: Option<Color>,
    pub winner: Option<Color>,
}

/// One legal destination for a queried piece.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct MoveOption {
    pub to: Square,
    /// Square of the piece this move would capture, if it is a jump.
    pub captures: Option<Square>,
}

/// Room lifecycle phase.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    AwaitingPlayers,
    AwaitingTurnOrderChoice,
    Playing,
    Finished,
}

/// A seated player as seen by clients.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PlayerInfo {
    pub name: String,
    pub color: Color,
}

/// Full authoritative room state, broadcast after every accepted mutation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GameSnapshot {
    pub room_code: String,
    pub players: HashMap<ConnId, PlayerInfo>,
    pub current_turn: Option<Color>,
    pub phase: Phase,
    pub winner: Option<Color>,
    pub board: Board,
    pub must_capture_with: Option<Square>,
    pub pending_new_game: Vec<ConnId>,
    pub turn_order_chooser: Option<ConnId>,
}

/// Why a command was refused. Rejections go only to the requester and leave
/// the room state untouched.
#[derive(Error, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    #[error("not your turn")]
    NotYourTurn,
    #[error("invalid source position")]
    InvalidSource,
    #[error("destination not empty")]
    DestinationOccupied,
    #[error("can only move to dark squares")]
    WrongSquareColor,
    #[error("must continue capturing with the same piece")]
    MustContinueCapture,
    #[error("must capture when possible")]
    MustCapture,
    #[error("no piece to capture")]
    NoPieceToCapture,
    #[error("invalid move distance")]
    InvalidDistance,
    #[error("invalid turn order choice")]
    InvalidTurnOrderChoice,
    #[error("not authorized")]
    NotAuthorized,
}

/// Parsed form of the turn-order choice string sent by clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnOrderChoice {
    /// The chooser moves first.
    Myself,
    /// The opponent moves first.
    Opponent,
}

impl FromStr for TurnOrderChoice {
    type Err = RejectReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "self" => Ok(TurnOrderChoice::Myself),
            "opponent" => Ok(TurnOrderChoice::Opponent),
            _ => Err(RejectReason::InvalidTurnOrderChoice),
        }
    }
}
