//! Integration tests for the server, handler, and full connection flow.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use noughts::prelude::*;
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    start_server_with(NoughtsServerBuilder::new()).await
}

async fn start_server_with(builder: NoughtsServerBuilder) -> String {
    let server = builder
        .bind("127.0.0.1:0")
        .build(NullSink)
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, event: Value) {
    ws.send(Message::text(event.to_string()))
        .await
        .expect("send event");
}

/// Waits for the next text frame and parses it.
async fn next_event(ws: &mut ClientWs) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .expect("recv error");
        if msg.is_text() || msg.is_binary() {
            return serde_json::from_slice(&msg.into_data()).expect("decode");
        }
    }
}

async fn join(ws: &mut ClientWs, room: &str, username: &str) -> Value {
    send(
        ws,
        json!({"event": "join", "data": {"room": room, "username": username}}),
    )
    .await;
    next_event(ws).await
}

fn empty_board() -> Value {
    json!(["", "", "", "", "", "", "", "", ""])
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_join_assigns_x_to_first_player() {
    let addr = start_server().await;
    let mut alice = connect(&addr).await;

    let joined = join(&mut alice, "r1", "alice").await;
    assert_eq!(
        joined,
        json!({"event": "joined", "data": {"role": "X", "board": empty_board()}})
    );
}

#[tokio::test]
async fn test_second_join_starts_game_for_both() {
    let addr = start_server().await;
    let mut alice = connect(&addr).await;
    let mut bob = connect(&addr).await;

    join(&mut alice, "r1", "alice").await;
    let joined = join(&mut bob, "r1", "bob").await;
    assert_eq!(joined["data"]["role"], "O");

    let start = json!({"event": "start_game", "data": {}});
    assert_eq!(next_event(&mut alice).await, start);
    assert_eq!(next_event(&mut bob).await, start);
}

#[tokio::test]
async fn test_full_game_over_the_wire() {
    let addr = start_server().await;
    let mut alice = connect(&addr).await;
    let mut bob = connect(&addr).await;

    join(&mut alice, "r1", "alice").await;
    join(&mut bob, "r1", "bob").await;
    next_event(&mut alice).await; // start_game
    next_event(&mut bob).await; // start_game

    // X: 0, 4, 8   O: 1, 2
    let moves = [(0, "X"), (1, "O"), (4, "X"), (2, "O"), (8, "X")];
    for (i, (index, player)) in moves.into_iter().enumerate() {
        let mover = if player == "X" { &mut alice } else { &mut bob };
        send(
            mover,
            json!({"event": "make_move", "data": {"room": "r1", "index": index, "player": player}}),
        )
        .await;

        let next_turn = if i == moves.len() - 1 {
            Value::Null
        } else if player == "X" {
            json!("O")
        } else {
            json!("X")
        };
        let update = json!({
            "event": "update_board",
            "data": {"index": index, "player": player, "next_turn": next_turn}
        });
        assert_eq!(next_event(&mut alice).await, update);
        assert_eq!(next_event(&mut bob).await, update);
    }

    let over = json!({"event": "game_over", "data": {"winner": "alice"}});
    assert_eq!(next_event(&mut alice).await, over);
    assert_eq!(next_event(&mut bob).await, over);
}

#[tokio::test]
async fn test_room_full_goes_to_requester_only() {
    let addr = start_server().await;
    let mut alice = connect(&addr).await;
    let mut bob = connect(&addr).await;
    let mut carol = connect(&addr).await;

    join(&mut alice, "r1", "alice").await;
    join(&mut bob, "r1", "bob").await;
    next_event(&mut alice).await;
    next_event(&mut bob).await;

    let rejected = join(&mut carol, "r1", "carol").await;
    assert_eq!(
        rejected,
        json!({"event": "invalid_move", "data": {"message": "Room is full"}})
    );

    // alice hears nothing about carol; her next event is her own move.
    send(
        &mut alice,
        json!({"event": "make_move", "data": {"room": "r1", "index": 4}}),
    )
    .await;
    assert_eq!(next_event(&mut alice).await["event"], "update_board");
}

#[tokio::test]
async fn test_malformed_frame_is_reported_and_connection_survives() {
    let addr = start_server().await;
    let mut alice = connect(&addr).await;

    alice
        .send(Message::text("not json"))
        .await
        .expect("send garbage");
    let reply = next_event(&mut alice).await;
    assert_eq!(reply["event"], "invalid_move");
    assert!(
        reply["data"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Malformed event:")
    );

    let joined = join(&mut alice, "r1", "alice").await;
    assert_eq!(joined["event"], "joined");
}

#[tokio::test]
async fn test_negative_index_is_malformed() {
    let addr = start_server().await;
    let mut alice = connect(&addr).await;
    join(&mut alice, "r1", "alice").await;

    send(
        &mut alice,
        json!({"event": "make_move", "data": {"room": "r1", "index": -1}}),
    )
    .await;
    let reply = next_event(&mut alice).await;
    assert_eq!(reply["event"], "invalid_move");
    assert!(
        reply["data"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Malformed event:")
    );
}

#[tokio::test]
async fn test_dropped_connection_notifies_opponent() {
    let addr = start_server().await;
    let mut alice = connect(&addr).await;
    let mut bob = connect(&addr).await;

    join(&mut alice, "r1", "alice").await;
    join(&mut bob, "r1", "bob").await;
    next_event(&mut alice).await;
    next_event(&mut bob).await;

    bob.close(None).await.expect("close");
    drop(bob);

    assert_eq!(
        next_event(&mut alice).await,
        json!({
            "event": "opponent_left",
            "data": {"username": "bob", "message": "Your opponent bob left the game."}
        })
    );
}

#[tokio::test]
async fn test_server_pings_connected_clients() {
    let addr =
        start_server_with(NoughtsServerBuilder::new().ping_interval(Duration::from_millis(50)))
            .await;
    let mut ws = connect(&addr).await;

    let pinged = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Ping(_))) => return true,
                Some(Ok(_)) => {}
                Some(Err(_)) | None => return false,
            }
        }
    })
    .await;
    assert!(matches!(pinged, Ok(true)), "client should see a ping frame");
}

#[tokio::test]
async fn test_silent_pair_keeps_seats() {
    let addr =
        start_server_with(NoughtsServerBuilder::new().ping_interval(Duration::from_millis(50)))
            .await;
    let mut alice = connect(&addr).await;
    let mut bob = connect(&addr).await;

    join(&mut alice, "r1", "alice").await;
    join(&mut bob, "r1", "bob").await;
    next_event(&mut alice).await;
    next_event(&mut bob).await;

    // Several keepalive rounds pass with neither player sending anything.
    tokio::time::sleep(Duration::from_millis(400)).await;

    let mut carol = connect(&addr).await;
    assert_eq!(
        join(&mut carol, "r1", "carol").await,
        json!({"event": "invalid_move", "data": {"message": "Room is full"}})
    );

    send(
        &mut alice,
        json!({"event": "make_move", "data": {"room": "r1", "index": 4}}),
    )
    .await;
    assert_eq!(next_event(&mut alice).await["event"], "update_board");
    assert_eq!(next_event(&mut bob).await["event"], "update_board");
}

#[tokio::test]
async fn test_zero_ping_interval_fails_to_build() {
    let result = NoughtsServerBuilder::new()
        .bind("127.0.0.1:0")
        .ping_interval(Duration::ZERO)
        .build(NullSink)
        .await;
    assert!(matches!(result, Err(NoughtsError::Config(_))));
}

#[tokio::test]
async fn test_run_until_stops_accepting() {
    let server = NoughtsServer::builder()
        .bind("127.0.0.1:0")
        .build(NullSink)
        .await
        .expect("server should build");
    let addr = server.local_addr().expect("local addr");

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let running = tokio::spawn(server.run_until(async {
        let _ = stop_rx.await;
    }));

    stop_tx.send(()).expect("server still running");
    let result = tokio::time::timeout(Duration::from_secs(2), running)
        .await
        .expect("server should stop")
        .expect("task should not panic");
    assert!(result.is_ok());

    let refused = tokio_tungstenite::connect_async(format!("ws://{addr}")).await;
    assert!(refused.is_err());
}
