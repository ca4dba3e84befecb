//! The per-room authoritative game session
//!
//! One `Session` owns the canonical board for one room and sequences every
//! engine operation under the multiplayer rules: seat assignment, the
//! pre-game turn-order choice, mandatory captures, piece-bound multi-jump
//! continuation, win detection, and the unanimous new-game handshake.
//!
//! Commands are synchronous and never panic on bad input: every rule
//! violation comes back as a tagged `Rejected` variant for the transport to
//! route to the requester alone, and a command from a connection that is
//! not seated in the room is a no-op (`UnknownConnection`). Only the two
//! invariants the command contracts make unreachable (a third seat, a color
//! seated twice) are guarded as fatal programming errors.

use checkers_engine::{
    apply_move, capture_moves_from, captures_available, evaluate_winner, step_moves_from, Board,
    Color, Square,
};
use shared::protocol::{
    ConnId, GameSnapshot, MoveBroadcast, MoveOption, Phase, PlayerInfo, RejectReason,
    TurnOrderChoice,
};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// A seated player.
#[derive(Clone, Debug)]
pub struct PlayerSlot {
    pub name: String,
    pub color: Color,
}

/// Result of [`Session::join`].
#[derive(Clone, Debug, PartialEq)]
pub enum JoinOutcome {
    Joined { color: Color },
    Full,
}

/// Result of [`Session::leave`].
#[derive(Clone, Debug, PartialEq)]
pub enum LeaveOutcome {
    Left {
        name: String,
        color: Color,
        remaining: usize,
    },
    UnknownConnection,
}

/// Result of [`Session::choose_turn_order`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TurnOrderOutcome {
    Started { first: Color },
    Rejected(RejectReason),
    UnknownConnection,
}

/// Result of [`Session::make_move`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MoveOutcome {
    Accepted(MoveBroadcast),
    Rejected(RejectReason),
    UnknownConnection,
}

/// Result of [`Session::request_new_game`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NewGameOutcome {
    /// Consensus reached (or only one player seated); the room was reset.
    Applied,
    /// Vote recorded; the other player has not agreed yet.
    Pending,
    UnknownConnection,
}

/// Result of [`Session::cancel_new_game`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CancelOutcome {
    Cancelled,
    NotPending,
    UnknownConnection,
}

/// Server-held authoritative state for one room.
pub struct Session {
    room_code: String,
    players: HashMap<ConnId, PlayerSlot>,
    board: Board,
    current: Option<Color>,
    phase: Phase,
    winner: Option<Color>,
    /// Landing square of a capture whose piece still has a jump; while set,
    /// only that piece may move and only by capturing.
    must_capture_with: Option<Square>,
    turn_order_chooser: Option<ConnId>,
    pending_new_game: HashSet<ConnId>,
    last_activity: Instant,
}

impl Session {
    pub fn new(room_code: String) -> Session {
        Session {
            room_code,
            players: HashMap::new(),
            board: Board::initial(),
            current: None,
            phase: Phase::AwaitingPlayers,
            winner: None,
            must_capture_with: None,
            turn_order_chooser: None,
            pending_new_game: HashSet::new(),
            last_activity: Instant::now(),
        }
    }

    pub fn room_code(&self) -> &str {
        &self.room_code
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    pub fn turn_order_chooser(&self) -> Option<ConnId> {
        self.turn_order_chooser
    }

    pub fn player(&self, conn: ConnId) -> Option<&PlayerSlot> {
        self.players.get(&conn)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Connection ids of everyone seated in the room, for broadcast fan-out.
    pub fn connections(&self) -> Vec<ConnId> {
        self.players.keys().copied().collect()
    }

    /// Mark the room as active; the expiry sweep removes rooms idle too long.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    /// Seat a player. The first entrant is Red, the second Black, never
    /// renegotiated. The second join opens the turn-order choice and grants
    /// the choosing right to Red's connection.
    pub fn join(&mut self, conn: ConnId, name: String) -> JoinOutcome {
        if self.players.len() >= 2 {
            return JoinOutcome::Full;
        }
        debug_assert!(
            !self.players.contains_key(&conn),
            "connection {conn} seated twice"
        );

        let color = if self.players.values().any(|p| p.color == Color::Red) {
            Color::Black
        } else {
            Color::Red
        };
        self.players.insert(conn, PlayerSlot { name, color });

        if self.players.len() == 2 && self.phase == Phase::AwaitingPlayers {
            self.phase = Phase::AwaitingTurnOrderChoice;
            self.turn_order_chooser = self.seat_of(Color::Red);
        }
        JoinOutcome::Joined { color }
    }

    /// Unseat a player. An emptied room is marked `Finished` so the expiry
    /// sweep can reclaim it; a mid-game departure leaves the game as-is (no
    /// forfeiture).
    pub fn leave(&mut self, conn: ConnId) -> LeaveOutcome {
        let Some(slot) = self.players.remove(&conn) else {
            return LeaveOutcome::UnknownConnection;
        };
        self.pending_new_game.remove(&conn);

        if self.players.is_empty() {
            self.phase = Phase::Finished;
            self.turn_order_chooser = None;
        } else if self.phase == Phase::AwaitingTurnOrderChoice {
            // The match never started; wait for a second player again.
            self.phase = Phase::AwaitingPlayers;
            self.turn_order_chooser = None;
        }

        LeaveOutcome::Left {
            name: slot.name,
            color: slot.color,
            remaining: self.players.len(),
        }
    }

    /// Resolve who moves first. Only the designated chooser may call this,
    /// and only while the choice is open.
    pub fn choose_turn_order(&mut self, conn: ConnId, choice: &str) -> TurnOrderOutcome {
        let Some(slot) = self.players.get(&conn) else {
            return TurnOrderOutcome::UnknownConnection;
        };
        if self.phase != Phase::AwaitingTurnOrderChoice || self.turn_order_chooser != Some(conn) {
            return TurnOrderOutcome::Rejected(RejectReason::NotAuthorized);
        }
        let choice: TurnOrderChoice = match choice.parse() {
            Ok(choice) => choice,
            Err(reason) => return TurnOrderOutcome::Rejected(reason),
        };

        let first = match choice {
            TurnOrderChoice::Myself => slot.color,
            TurnOrderChoice::Opponent => slot.color.opponent(),
        };
        self.current = Some(first);
        self.phase = Phase::Playing;
        TurnOrderOutcome::Started { first }
    }

    /// Validate and execute one move request.
    ///
    /// Rejections leave the session untouched and are reported to the
    /// requester only. An accepted capture whose piece still has a jump
    /// (and was not just promoted) keeps the turn and binds further moves
    /// to the landing square; otherwise the turn flips and win detection
    /// runs for the incoming color.
    pub fn make_move(&mut self, conn: ConnId, from: Square, to: Square) -> MoveOutcome {
        let Some(slot) = self.players.get(&conn) else {
            return MoveOutcome::UnknownConnection;
        };
        let mover = slot.color;

        if self.phase != Phase::Playing || self.current != Some(mover) {
            return MoveOutcome::Rejected(RejectReason::NotYourTurn);
        }
        let Some(piece) = self.board.piece_at(from) else {
            return MoveOutcome::Rejected(RejectReason::InvalidSource);
        };
        if piece.color != mover {
            return MoveOutcome::Rejected(RejectReason::InvalidSource);
        }
        if !to.is_dark() {
            return MoveOutcome::Rejected(RejectReason::WrongSquareColor);
        }
        if !self.board.is_empty(to) {
            return MoveOutcome::Rejected(RejectReason::DestinationOccupied);
        }
        if let Some(bound) = self.must_capture_with {
            if from != bound {
                return MoveOutcome::Rejected(RejectReason::MustContinueCapture);
            }
        }

        // Shape check: a diagonal of one (step) or two (jump), and never
        // backward for a regular piece.
        let dr = to.row() as i16 - from.row() as i16;
        let dc = to.col() as i16 - from.col() as i16;
        if dr.abs() != dc.abs() {
            return MoveOutcome::Rejected(RejectReason::InvalidDistance);
        }
        if !piece.is_king && dr.signum() as i8 != mover.forward() {
            return MoveOutcome::Rejected(RejectReason::InvalidDistance);
        }
        let is_capture = match dr.abs() {
            1 => false,
            2 => true,
            _ => return MoveOutcome::Rejected(RejectReason::InvalidDistance),
        };

        if is_capture {
            let over = from
                .offset((dr / 2) as i8, (dc / 2) as i8)
                .expect("midpoint of two in-bounds squares is in bounds");
            match self.board.piece_at(over) {
                Some(p) if p.color == mover.opponent() => {}
                _ => return MoveOutcome::Rejected(RejectReason::NoPieceToCapture),
            }
        } else if !captures_available(&self.board, mover).is_empty() {
            return MoveOutcome::Rejected(RejectReason::MustCapture);
        }

        let applied = apply_move(&mut self.board, from, to)
            .expect("validated move must apply");

        // Promotion on the landing square ends the turn even when another
        // jump would be geometrically available.
        let chain_continues = applied.captured.is_some()
            && !applied.promoted
            && !capture_moves_from(&self.board, to).is_empty();

        let (turn_continues, next_turn, winner) = if chain_continues {
            self.must_capture_with = Some(to);
            (true, Some(mover), None)
        } else {
            self.must_capture_with = None;
            let next = mover.opponent();
            self.current = Some(next);
            match evaluate_winner(&self.board, next) {
                Some(winner) => {
                    self.phase = Phase::Finished;
                    self.winner = Some(winner);
                    (false, None, Some(winner))
                }
                None => (false, Some(next), None),
            }
        };

        MoveOutcome::Accepted(MoveBroadcast {
            by: mover,
            from,
            to,
            captured: applied.captured,
            promoted: applied.promoted,
            turn_continues,
            next_turn,
            winner,
        })
    }

    /// Record a new-game vote. Resets immediately with a single player
    /// seated; with two, both connections must be pending (unanimous
    /// consent, not simple majority).
    pub fn request_new_game(&mut self, conn: ConnId) -> NewGameOutcome {
        if !self.players.contains_key(&conn) {
            return NewGameOutcome::UnknownConnection;
        }
        if self.players.len() < 2 {
            self.reset();
            return NewGameOutcome::Applied;
        }
        self.pending_new_game.insert(conn);
        if self
            .players
            .keys()
            .all(|id| self.pending_new_game.contains(id))
        {
            self.reset();
            return NewGameOutcome::Applied;
        }
        NewGameOutcome::Pending
    }

    /// Withdraw a new-game vote. No other side effects.
    pub fn cancel_new_game(&mut self, conn: ConnId) -> CancelOutcome {
        if !self.players.contains_key(&conn) {
            return CancelOutcome::UnknownConnection;
        }
        if self.pending_new_game.remove(&conn) {
            CancelOutcome::Cancelled
        } else {
            CancelOutcome::NotPending
        }
    }

    /// Legal destinations for the piece at `from`, for client-side hints.
    /// Honors the mandatory-capture and continuation rules; empty when it
    /// is not the requester's turn or not their piece. Never an error.
    pub fn legal_moves_from(&self, conn: ConnId, from: Square) -> Vec<MoveOption> {
        let Some(slot) = self.players.get(&conn) else {
            return Vec::new();
        };
        if self.phase != Phase::Playing || self.current != Some(slot.color) {
            return Vec::new();
        }
        let Some(piece) = self.board.piece_at(from) else {
            return Vec::new();
        };
        if piece.color != slot.color {
            return Vec::new();
        }

        if let Some(bound) = self.must_capture_with {
            if from != bound {
                return Vec::new();
            }
            return Self::capture_options(&self.board, from);
        }
        if !captures_available(&self.board, slot.color).is_empty() {
            return Self::capture_options(&self.board, from);
        }
        step_moves_from(&self.board, from)
            .into_iter()
            .map(|step| MoveOption {
                to: step.to,
                captures: None,
            })
            .collect()
    }

    /// Full authoritative state for broadcast.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            room_code: self.room_code.clone(),
            players: self
                .players
                .iter()
                .map(|(id, slot)| {
                    (
                        *id,
                        PlayerInfo {
                            name: slot.name.clone(),
                            color: slot.color,
                        },
                    )
                })
                .collect(),
            current_turn: self.current,
            phase: self.phase,
            winner: self.winner,
            board: self.board.clone(),
            must_capture_with: self.must_capture_with,
            pending_new_game: self.pending_new_game.iter().copied().collect(),
            turn_order_chooser: self.turn_order_chooser,
        }
    }

    fn capture_options(board: &Board, from: Square) -> Vec<MoveOption> {
        capture_moves_from(board, from)
            .into_iter()
            .map(|capture| MoveOption {
                to: capture.to,
                captures: Some(capture.over),
            })
            .collect()
    }

    fn seat_of(&self, color: Color) -> Option<ConnId> {
        self.players
            .iter()
            .find(|(_, slot)| slot.color == color)
            .map(|(id, _)| *id)
    }

    /// Reinitialize the board and every per-game flag. With two players
    /// seated the turn-order choice reopens (chooser is Red's connection);
    /// with fewer the room waits for players again.
    fn reset(&mut self) {
        self.board = Board::initial();
        self.current = None;
        self.winner = None;
        self.must_capture_with = None;
        self.pending_new_game.clear();
        if self.players.len() == 2 {
            self.phase = Phase::AwaitingTurnOrderChoice;
            self.turn_order_chooser = self.seat_of(Color::Red);
        } else {
            self.phase = Phase::AwaitingPlayers;
            self.turn_order_chooser = None;
        }
    }
}
