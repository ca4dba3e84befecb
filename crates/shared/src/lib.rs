//! Wire types shared between the checkers server and its clients.

pub mod protocol;

pub use protocol::{
    ClientMessage, ConnId, GameSnapshot, MoveBroadcast, MoveOption, Phase, PlayerInfo,
    RejectReason, ServerMessage, TurnOrderChoice,
};
