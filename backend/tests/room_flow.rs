//! End-to-end command flow through the dispatch layer: two players create
//! and join a room, negotiate turn order, trade opening moves under the
//! mandatory-capture rule, and agree on a rematch. Exercises the same code
//! path the WebSocket handler runs, minus the sockets.

use backend::api::{dispatch, AppState};
use backend::rooms::RoomRegistry;
use shared::protocol::{ClientMessage, ConnId, Phase, RejectReason, ServerMessage};
use uuid::Uuid;

use checkers_engine::Color;

fn msgs_for(out: &[(ConnId, ServerMessage)], conn: ConnId) -> Vec<&ServerMessage> {
    out.iter()
        .filter(|(target, _)| *target == conn)
        .map(|(_, msg)| msg)
        .collect()
}

fn joined_room_code(out: &[(ConnId, ServerMessage)]) -> String {
    out.iter()
        .find_map(|(_, msg)| match msg {
            ServerMessage::RoomJoined { code, .. } => Some(code.clone()),
            _ => None,
        })
        .expect("join should answer with RoomJoined")
}

fn latest_snapshot(out: &[(ConnId, ServerMessage)], conn: ConnId) -> shared::protocol::GameSnapshot {
    msgs_for(out, conn)
        .into_iter()
        .rev()
        .find_map(|msg| match msg {
            ServerMessage::State(snapshot) => Some(snapshot.clone()),
            _ => None,
        })
        .expect("accepted mutations should carry a state snapshot")
}

#[test]
fn full_room_flow() {
    let state = AppState::new(RoomRegistry::new());
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let carol = Uuid::new_v4();

    // Alice opens a room and takes the red seat.
    let out = dispatch(
        &state,
        alice,
        ClientMessage::CreateRoom {
            name: "alice".to_string(),
        },
    );
    let code = joined_room_code(&out);
    assert!(msgs_for(&out, alice).iter().any(|msg| matches!(
        msg,
        ServerMessage::RoomJoined { your_color: Color::Red, .. }
    )));
    assert_eq!(latest_snapshot(&out, alice).phase, Phase::AwaitingPlayers);

    // Joining a room that does not exist is a protocol error to the caller.
    let out = dispatch(
        &state,
        bob,
        ClientMessage::JoinRoom {
            code: "NOSUCH".to_string(),
            name: "bob".to_string(),
        },
    );
    assert_eq!(out.len(), 1);
    assert!(matches!(out[0], (target, ServerMessage::Error { .. }) if target == bob));

    // Bob takes the black seat; both players learn about it and the
    // turn-order choice opens for Alice.
    let out = dispatch(
        &state,
        bob,
        ClientMessage::JoinRoom {
            code: code.clone(),
            name: "bob".to_string(),
        },
    );
    assert!(msgs_for(&out, bob).iter().any(|msg| matches!(
        msg,
        ServerMessage::RoomJoined { your_color: Color::Black, .. }
    )));
    for conn in [alice, bob] {
        assert!(msgs_for(&out, conn).iter().any(|msg| matches!(
            msg,
            ServerMessage::TurnOrderPending { chooser } if *chooser == alice
        )));
        assert_eq!(
            latest_snapshot(&out, conn).phase,
            Phase::AwaitingTurnOrderChoice
        );
    }

    // A third player bounces off the full room.
    let out = dispatch(
        &state,
        carol,
        ClientMessage::JoinRoom {
            code: code.clone(),
            name: "carol".to_string(),
        },
    );
    assert_eq!(out.len(), 1);
    assert!(matches!(out[0], (target, ServerMessage::Error { .. }) if target == carol));

    // Only the designated chooser resolves the turn order, and only the
    // requester hears about the refusal.
    let out = dispatch(
        &state,
        bob,
        ClientMessage::ChooseTurnOrder {
            choice: "self".to_string(),
        },
    );
    assert_eq!(out.len(), 1);
    assert!(matches!(
        out[0],
        (target, ServerMessage::MoveRejected { reason: RejectReason::NotAuthorized })
            if target == bob
    ));

    let out = dispatch(
        &state,
        alice,
        ClientMessage::ChooseTurnOrder {
            choice: "self".to_string(),
        },
    );
    for conn in [alice, bob] {
        assert!(msgs_for(&out, conn).iter().any(|msg| matches!(
            msg,
            ServerMessage::TurnOrderResolved { first: Color::Red }
        )));
        assert_eq!(latest_snapshot(&out, conn).phase, Phase::Playing);
    }

    // Opening moves: red advances, black advances into range.
    let out = dispatch(
        &state,
        alice,
        ClientMessage::SubmitMove {
            from: (5, 2),
            to: (4, 3),
        },
    );
    for conn in [alice, bob] {
        assert!(msgs_for(&out, conn).iter().any(|msg| matches!(
            msg,
            ServerMessage::MoveApplied(mv)
                if mv.captured.is_none() && mv.next_turn == Some(Color::Black)
        )));
    }

    dispatch(
        &state,
        bob,
        ClientMessage::SubmitMove {
            from: (2, 5),
            to: (3, 4),
        },
    );

    // Red now has a jump, so a quiet step is refused (requester only).
    let out = dispatch(
        &state,
        alice,
        ClientMessage::SubmitMove {
            from: (5, 6),
            to: (4, 7),
        },
    );
    assert_eq!(out.len(), 1);
    assert!(matches!(
        out[0],
        (target, ServerMessage::MoveRejected { reason: RejectReason::MustCapture })
            if target == alice
    ));

    // The jump itself goes through and both sides see the capture.
    let out = dispatch(
        &state,
        alice,
        ClientMessage::SubmitMove {
            from: (4, 3),
            to: (2, 5),
        },
    );
    for conn in [alice, bob] {
        assert!(msgs_for(&out, conn).iter().any(|msg| matches!(
            msg,
            ServerMessage::MoveApplied(mv)
                if mv.captured.is_some() && !mv.turn_continues
        )));
    }
    let snapshot = latest_snapshot(&out, bob);
    assert_eq!(snapshot.board.count(Color::Black), 11);
    assert_eq!(snapshot.current_turn, Some(Color::Black));

    // Rematch needs both players; the first request only records a vote.
    let out = dispatch(&state, alice, ClientMessage::RequestNewGame);
    for conn in [alice, bob] {
        assert!(msgs_for(&out, conn).iter().any(|msg| matches!(
            msg,
            ServerMessage::NewGameRequested { by } if *by == alice
        )));
    }
    let out = dispatch(&state, bob, ClientMessage::RequestNewGame);
    for conn in [alice, bob] {
        assert!(msgs_for(&out, conn)
            .iter()
            .any(|msg| matches!(msg, ServerMessage::NewGameApplied)));
    }
    let snapshot = latest_snapshot(&out, alice);
    assert_eq!(snapshot.phase, Phase::AwaitingTurnOrderChoice);
    assert_eq!(snapshot.board.count(Color::Black), 12);
    assert_eq!(snapshot.current_turn, None);

    // Bob departs; Alice is told, Bob is not.
    let out = dispatch(&state, bob, ClientMessage::LeaveRoom);
    assert!(msgs_for(&out, bob).is_empty());
    assert!(msgs_for(&out, alice).iter().any(|msg| matches!(
        msg,
        ServerMessage::PlayerLeft { id, .. } if *id == bob
    )));

    // The last departure dissolves the room.
    dispatch(&state, alice, ClientMessage::LeaveRoom);
    assert_eq!(state.rooms.room_count(), 0);
    let out = dispatch(
        &state,
        alice,
        ClientMessage::SubmitMove {
            from: (5, 0),
            to: (4, 1),
        },
    );
    assert!(matches!(out[0].1, ServerMessage::Error { .. }));
}

#[test]
fn out_of_range_coordinates_never_reach_the_session() {
    let state = AppState::new(RoomRegistry::new());
    let alice = Uuid::new_v4();
    let out = dispatch(
        &state,
        alice,
        ClientMessage::CreateRoom {
            name: "alice".to_string(),
        },
    );
    let _code = joined_room_code(&out);

    let out = dispatch(
        &state,
        alice,
        ClientMessage::SubmitMove {
            from: (9, 9),
            to: (10, 10),
        },
    );
    assert_eq!(out.len(), 1);
    assert!(matches!(out[0], (target, ServerMessage::Error { .. }) if target == alice));

    let out = dispatch(&state, alice, ClientMessage::QueryLegalMoves { cell: (8, 0) });
    assert!(matches!(out[0].1, ServerMessage::Error { .. }));
}

#[test]
fn legal_move_query_answers_the_requester_only() {
    let state = AppState::new(RoomRegistry::new());
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let out = dispatch(
        &state,
        alice,
        ClientMessage::CreateRoom {
            name: "alice".to_string(),
        },
    );
    let code = joined_room_code(&out);
    dispatch(
        &state,
        bob,
        ClientMessage::JoinRoom {
            code,
            name: "bob".to_string(),
        },
    );
    dispatch(
        &state,
        alice,
        ClientMessage::ChooseTurnOrder {
            choice: "self".to_string(),
        },
    );

    let out = dispatch(&state, alice, ClientMessage::QueryLegalMoves { cell: (5, 2) });
    assert_eq!(out.len(), 1);
    let (target, msg) = &out[0];
    assert_eq!(*target, alice);
    match msg {
        ServerMessage::LegalMoves { from, moves } => {
            assert_eq!(*from, (5, 2));
            assert_eq!(moves.len(), 2, "an open red piece has two opening steps");
            assert!(moves.iter().all(|m| m.captures.is_none()));
        }
        other => panic!("expected LegalMoves, got {:?}", other),
    }

    // Querying out of turn yields an empty hint list, not an error.
    let out = dispatch(&state, bob, ClientMessage::QueryLegalMoves { cell: (2, 1) });
    match &out[0].1 {
        ServerMessage::LegalMoves { moves, .. } => assert!(moves.is_empty()),
        other => panic!("expected LegalMoves, got {:?}", other),
    }
}
