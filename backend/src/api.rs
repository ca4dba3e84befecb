//! WebSocket transport and command dispatch
//!
//! Each socket gets a fresh connection id and an outbound channel; inbound
//! frames parse into `ClientMessage` commands, run against the session
//! under the registry lock, and fan back out as `(connection, message)`
//! pairs once the lock is released. Rule rejections and protocol errors go
//! to the requester only; accepted mutations broadcast to the whole room,
//! each followed by a full state snapshot so clients never drift.

use crate::rooms::RoomRegistry;
use crate::session::{
    CancelOutcome, JoinOutcome, LeaveOutcome, MoveOutcome, NewGameOutcome, TurnOrderOutcome,
};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use checkers_engine::Square;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use shared::protocol::{ClientMessage, ConnId, Phase, ServerMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use uuid::Uuid;

type Outbound = Vec<(ConnId, ServerMessage)>;

/// Shared transport state: the room registry and the per-connection
/// outbound senders.
#[derive(Clone)]
pub struct AppState {
    pub rooms: RoomRegistry,
    peers: Arc<Mutex<HashMap<ConnId, UnboundedSender<ServerMessage>>>>,
}

impl AppState {
    pub fn new(rooms: RoomRegistry) -> AppState {
        AppState {
            rooms,
            peers: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn = Uuid::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.peers.lock().insert(conn, tx);
    tracing::info!(%conn, "client connected");

    let (mut sink, mut stream) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to serialize server message");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        let Ok(msg) = frame else {
            break;
        };
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(cmd) => {
                    let outbound = dispatch(&state, conn, cmd);
                    deliver(&state, outbound);
                }
                Err(err) => {
                    tracing::debug!(%conn, error = %err, "unparseable client message");
                    deliver(&state, vec![(conn, protocol_error("malformed message"))]);
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    // A dropped socket is an implicit LeaveRoom.
    let outbound = dispatch(&state, conn, ClientMessage::LeaveRoom);
    deliver(&state, outbound);
    state.peers.lock().remove(&conn);
    writer.abort();
    tracing::info!(%conn, "client disconnected");
}

fn deliver(state: &AppState, outbound: Outbound) {
    let peers = state.peers.lock();
    for (target, msg) in outbound {
        if let Some(tx) = peers.get(&target) {
            let _ = tx.send(msg);
        }
    }
}

/// Execute one client command and produce the messages to deliver.
///
/// Runs synchronously under the registry lock; the returned fan-out list is
/// delivered after the lock drops, in the order the session produced it.
pub fn dispatch(state: &AppState, conn: ConnId, cmd: ClientMessage) -> Outbound {
    match cmd {
        ClientMessage::CreateRoom { name } => {
            if state.rooms.room_of(conn).is_some() {
                return vec![(conn, protocol_error("already in a room"))];
            }
            let code = state.rooms.create_room();
            join_room(state, conn, code, name)
        }
        ClientMessage::JoinRoom { code, name } => join_room(state, conn, code, name),
        ClientMessage::LeaveRoom => leave_room(state, conn),
        ClientMessage::SubmitMove { from, to } => submit_move(state, conn, from, to),
        ClientMessage::ChooseTurnOrder { choice } => choose_turn_order(state, conn, choice),
        ClientMessage::RequestNewGame => request_new_game(state, conn),
        ClientMessage::CancelNewGame => cancel_new_game(state, conn),
        ClientMessage::QueryLegalMoves { cell } => query_legal_moves(state, conn, cell),
    }
}

fn join_room(state: &AppState, conn: ConnId, code: String, name: String) -> Outbound {
    if state.rooms.room_of(conn).is_some() {
        return vec![(conn, protocol_error("already in a room"))];
    }

    let result = state.rooms.with_session(&code, |session| {
        match session.join(conn, name.clone()) {
            JoinOutcome::Full => None,
            JoinOutcome::Joined { color } => {
                let mut out: Outbound = vec![(
                    conn,
                    ServerMessage::RoomJoined {
                        code: session.room_code().to_string(),
                        your_color: color,
                    },
                )];
                let conns = session.connections();
                for c in &conns {
                    out.push((
                        *c,
                        ServerMessage::PlayerJoined {
                            id: conn,
                            name: name.clone(),
                            color,
                        },
                    ));
                }
                if session.phase() == Phase::AwaitingTurnOrderChoice {
                    if let Some(chooser) = session.turn_order_chooser() {
                        for c in &conns {
                            out.push((*c, ServerMessage::TurnOrderPending { chooser }));
                        }
                    }
                }
                let snapshot = session.snapshot();
                for c in &conns {
                    out.push((*c, ServerMessage::State(snapshot.clone())));
                }
                Some(out)
            }
        }
    });

    match result {
        None => vec![(conn, protocol_error("room not found"))],
        Some(None) => vec![(conn, protocol_error("room is full"))],
        Some(Some(out)) => {
            state.rooms.bind(conn, &code);
            out
        }
    }
}

fn leave_room(state: &AppState, conn: ConnId) -> Outbound {
    let Some(code) = state.rooms.unbind(conn) else {
        // Never joined anything; nothing to tell anyone.
        return Vec::new();
    };

    let result = state.rooms.with_session(&code, |session| {
        match session.leave(conn) {
            LeaveOutcome::UnknownConnection => (Vec::new(), session.player_count()),
            LeaveOutcome::Left {
                name, remaining, ..
            } => {
                let mut out: Outbound = Vec::new();
                let conns = session.connections();
                for c in &conns {
                    out.push((*c, ServerMessage::PlayerLeft { id: conn, name: name.clone() }));
                }
                let snapshot = session.snapshot();
                for c in &conns {
                    out.push((*c, ServerMessage::State(snapshot.clone())));
                }
                (out, remaining)
            }
        }
    });

    match result {
        None => Vec::new(),
        Some((out, remaining)) => {
            if remaining == 0 {
                state.rooms.remove_room(&code);
            }
            out
        }
    }
}

fn submit_move(state: &AppState, conn: ConnId, from: (u8, u8), to: (u8, u8)) -> Outbound {
    let (Ok(from), Ok(to)) = (Square::new(from.0, from.1), Square::new(to.0, to.1)) else {
        return vec![(conn, protocol_error("coordinates out of bounds"))];
    };
    let Some(code) = state.rooms.room_of(conn) else {
        return vec![(conn, protocol_error("not in a room"))];
    };

    state
        .rooms
        .with_session(&code, |session| match session.make_move(conn, from, to) {
            MoveOutcome::UnknownConnection => vec![(conn, protocol_error("not in this room"))],
            MoveOutcome::Rejected(reason) => {
                vec![(conn, ServerMessage::MoveRejected { reason })]
            }
            MoveOutcome::Accepted(broadcast) => {
                let conns = session.connections();
                let mut out: Outbound = conns
                    .iter()
                    .map(|c| (*c, ServerMessage::MoveApplied(broadcast)))
                    .collect();
                if let Some(winner) = broadcast.winner {
                    out.extend(conns.iter().map(|c| (*c, ServerMessage::GameOver { winner })));
                }
                let snapshot = session.snapshot();
                out.extend(
                    conns
                        .iter()
                        .map(|c| (*c, ServerMessage::State(snapshot.clone()))),
                );
                out
            }
        })
        .unwrap_or_else(|| vec![(conn, protocol_error("room not found"))])
}

fn choose_turn_order(state: &AppState, conn: ConnId, choice: String) -> Outbound {
    let Some(code) = state.rooms.room_of(conn) else {
        return vec![(conn, protocol_error("not in a room"))];
    };

    state
        .rooms
        .with_session(&code, |session| {
            match session.choose_turn_order(conn, &choice) {
                TurnOrderOutcome::UnknownConnection => {
                    vec![(conn, protocol_error("not in this room"))]
                }
                TurnOrderOutcome::Rejected(reason) => {
                    vec![(conn, ServerMessage::MoveRejected { reason })]
                }
                TurnOrderOutcome::Started { first } => {
                    let conns = session.connections();
                    let mut out: Outbound = conns
                        .iter()
                        .map(|c| (*c, ServerMessage::TurnOrderResolved { first }))
                        .collect();
                    let snapshot = session.snapshot();
                    out.extend(
                        conns
                            .iter()
                            .map(|c| (*c, ServerMessage::State(snapshot.clone()))),
                    );
                    out
                }
            }
        })
        .unwrap_or_else(|| vec![(conn, protocol_error("room not found"))])
}

fn request_new_game(state: &AppState, conn: ConnId) -> Outbound {
    let Some(code) = state.rooms.room_of(conn) else {
        return vec![(conn, protocol_error("not in a room"))];
    };

    state
        .rooms
        .with_session(&code, |session| match session.request_new_game(conn) {
            NewGameOutcome::UnknownConnection => {
                vec![(conn, protocol_error("not in this room"))]
            }
            NewGameOutcome::Pending => {
                let conns = session.connections();
                conns
                    .iter()
                    .map(|c| (*c, ServerMessage::NewGameRequested { by: conn }))
                    .collect()
            }
            NewGameOutcome::Applied => {
                let conns = session.connections();
                let mut out: Outbound = conns
                    .iter()
                    .map(|c| (*c, ServerMessage::NewGameApplied))
                    .collect();
                if session.phase() == Phase::AwaitingTurnOrderChoice {
                    if let Some(chooser) = session.turn_order_chooser() {
                        for c in &conns {
                            out.push((*c, ServerMessage::TurnOrderPending { chooser }));
                        }
                    }
                }
                let snapshot = session.snapshot();
                out.extend(
                    conns
                        .iter()
                        .map(|c| (*c, ServerMessage::State(snapshot.clone()))),
                );
                out
            }
        })
        .unwrap_or_else(|| vec![(conn, protocol_error("room not found"))])
}

fn cancel_new_game(state: &AppState, conn: ConnId) -> Outbound {
    let Some(code) = state.rooms.room_of(conn) else {
        return vec![(conn, protocol_error("not in a room"))];
    };

    state
        .rooms
        .with_session(&code, |session| match session.cancel_new_game(conn) {
            CancelOutcome::UnknownConnection => {
                vec![(conn, protocol_error("not in this room"))]
            }
            // Withdrawing a vote that was never cast changes nothing.
            CancelOutcome::NotPending => Vec::new(),
            CancelOutcome::Cancelled => session
                .connections()
                .iter()
                .map(|c| (*c, ServerMessage::NewGameCancelled { by: conn }))
                .collect(),
        })
        .unwrap_or_else(|| vec![(conn, protocol_error("room not found"))])
}

fn query_legal_moves(state: &AppState, conn: ConnId, cell: (u8, u8)) -> Outbound {
    let Ok(from) = Square::new(cell.0, cell.1) else {
        return vec![(conn, protocol_error("coordinates out of bounds"))];
    };
    let Some(code) = state.rooms.room_of(conn) else {
        return vec![(conn, protocol_error("not in a room"))];
    };

    state
        .rooms
        .with_session(&code, |session| {
            let moves = session.legal_moves_from(conn, from);
            vec![(conn, ServerMessage::LegalMoves { from: cell, moves })]
        })
        .unwrap_or_else(|| vec![(conn, protocol_error("room not found"))])
}

fn protocol_error(message: &str) -> ServerMessage {
    ServerMessage::Error {
        message: message.to_string(),
    }
}
