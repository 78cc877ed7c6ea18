use super::*;

use scrawlboard_shared::{Point, Shape, ShapeId};
use tokio::time::{timeout, Duration};

use crate::chat::ChatClient;

fn test_state() -> AppState {
    AppState::new(ChatClient::new(None, None, None).expect("chat client should build"))
}

fn pen_shape(id: &str) -> Shape {
    Shape::pen(ShapeId::new(id), Point::new(10.0, 10.0), "#000000".into(), 5.0)
}

async fn join_room(
    state: &AppState,
    room: &str,
) -> (Uuid, mpsc::UnboundedReceiver<ServerEvent>, Vec<String>) {
    let conn = Uuid::new_v4();
    let (tx, rx) = mpsc::unbounded_channel();
    let mut joined = Vec::new();
    apply_client_event(
        state,
        conn,
        &tx,
        &mut joined,
        ClientEvent::JoinRoom {
            room_id: room.to_string(),
        },
    )
    .await;
    (conn, rx, joined)
}

async fn send_event(state: &AppState, sender: Uuid, event: ClientEvent) {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut joined = Vec::new();
    apply_client_event(state, sender, &tx, &mut joined, event).await;
}

async fn recv_event(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> ServerEvent {
    timeout(Duration::from_millis(500), rx.recv())
        .await
        .expect("broadcast receive timed out")
        .expect("broadcast channel closed unexpectedly")
}

async fn assert_no_event(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) {
    assert!(
        timeout(Duration::from_millis(80), rx.recv()).await.is_err(),
        "expected no broadcast"
    );
}

#[tokio::test]
async fn draw_shape_reaches_the_peer_but_never_the_sender() {
    let state = test_state();
    let (sender, mut sender_rx, _) = join_room(&state, "room-a").await;
    let (_peer, mut peer_rx, _) = join_room(&state, "room-a").await;

    let shape = pen_shape("s1");
    send_event(
        &state,
        sender,
        ClientEvent::DrawShape {
            room_id: "room-a".into(),
            shape: shape.clone(),
        },
    )
    .await;

    assert_eq!(recv_event(&mut peer_rx).await, ServerEvent::DrawShape { shape });
    assert_no_event(&mut sender_rx).await;
}

#[tokio::test]
async fn peers_in_other_rooms_never_receive_the_event() {
    let state = test_state();
    let (sender, mut sender_rx, _) = join_room(&state, "room-a").await;
    let (_same, mut same_rx, _) = join_room(&state, "room-a").await;
    let (_other, mut other_rx, _) = join_room(&state, "room-b").await;

    send_event(
        &state,
        sender,
        ClientEvent::DrawShape {
            room_id: "room-a".into(),
            shape: pen_shape("s1"),
        },
    )
    .await;

    assert!(matches!(
        recv_event(&mut same_rx).await,
        ServerEvent::DrawShape { .. }
    ));
    assert_no_event(&mut other_rx).await;
    assert_no_event(&mut sender_rx).await;
}

#[tokio::test]
async fn each_peer_receives_exactly_one_copy() {
    let state = test_state();
    let (sender, _sender_rx, _) = join_room(&state, "room-a").await;
    let (_p2, mut rx2, _) = join_room(&state, "room-a").await;
    let (_p3, mut rx3, _) = join_room(&state, "room-a").await;

    send_event(
        &state,
        sender,
        ClientEvent::DrawShape {
            room_id: "room-a".into(),
            shape: pen_shape("s1"),
        },
    )
    .await;

    recv_event(&mut rx2).await;
    recv_event(&mut rx3).await;
    assert_no_event(&mut rx2).await;
    assert_no_event(&mut rx3).await;
}

#[tokio::test]
async fn rejoining_replaces_the_peer_without_duplicate_delivery() {
    let state = test_state();
    let conn = Uuid::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut joined = Vec::new();
    for _ in 0..2 {
        apply_client_event(
            &state,
            conn,
            &tx,
            &mut joined,
            ClientEvent::JoinRoom {
                room_id: "room-a".into(),
            },
        )
        .await;
    }
    assert_eq!(joined, vec!["room-a".to_string()]);

    let (peer, _peer_rx, _) = join_room(&state, "room-a").await;
    send_event(
        &state,
        peer,
        ClientEvent::DrawShape {
            room_id: "room-a".into(),
            shape: pen_shape("s1"),
        },
    )
    .await;

    recv_event(&mut rx).await;
    assert_no_event(&mut rx).await;
}

#[tokio::test]
async fn events_for_unknown_rooms_are_dropped() {
    let state = test_state();
    let (sender, _sender_rx, _) = join_room(&state, "room-a").await;
    let (_peer, mut peer_rx, _) = join_room(&state, "room-a").await;

    send_event(
        &state,
        sender,
        ClientEvent::DrawShape {
            room_id: "ghost".into(),
            shape: pen_shape("s1"),
        },
    )
    .await;

    assert_no_event(&mut peer_rx).await;
    assert!(!state.rooms.read().await.contains_key("ghost"));
}

#[tokio::test]
async fn forwarding_does_not_require_the_sender_to_be_a_member() {
    let state = test_state();
    let (_peer, mut peer_rx, _) = join_room(&state, "room-a").await;

    send_event(
        &state,
        Uuid::new_v4(),
        ClientEvent::ClearCanvas {
            room_id: "room-a".into(),
        },
    )
    .await;

    assert_eq!(recv_event(&mut peer_rx).await, ServerEvent::ClearCanvas);
}

#[tokio::test]
async fn cursor_move_passes_coordinates_through() {
    let state = test_state();
    let (sender, mut sender_rx, _) = join_room(&state, "room-a").await;
    let (_peer, mut peer_rx, _) = join_room(&state, "room-a").await;

    send_event(
        &state,
        sender,
        ClientEvent::CursorMove {
            room_id: "room-a".into(),
            user_id: "u-1".into(),
            x: 31.5,
            y: 62.25,
        },
    )
    .await;

    assert_eq!(
        recv_event(&mut peer_rx).await,
        ServerEvent::CursorMove {
            user_id: "u-1".into(),
            x: 31.5,
            y: 62.25,
        }
    );
    assert_no_event(&mut sender_rx).await;
}

#[tokio::test]
async fn update_shape_forwards_the_replacement_payload() {
    let state = test_state();
    let (sender, _sender_rx, _) = join_room(&state, "room-a").await;
    let (_peer, mut peer_rx, _) = join_room(&state, "room-a").await;

    let mut shape = pen_shape("s1");
    shape.fill_color = Some("#ff0000".into());
    send_event(
        &state,
        sender,
        ClientEvent::UpdateShape {
            room_id: "room-a".into(),
            shape: shape.clone(),
        },
    )
    .await;

    assert_eq!(
        recv_event(&mut peer_rx).await,
        ServerEvent::UpdateShape { shape }
    );
}

#[tokio::test]
async fn closed_peer_channels_are_swept_on_broadcast() {
    let state = test_state();
    let (sender, _sender_rx, _) = join_room(&state, "room-a").await;
    let (_gone, gone_rx, _) = join_room(&state, "room-a").await;
    let (_live, mut live_rx, _) = join_room(&state, "room-a").await;
    drop(gone_rx);

    send_event(
        &state,
        sender,
        ClientEvent::DrawShape {
            room_id: "room-a".into(),
            shape: pen_shape("s1"),
        },
    )
    .await;

    recv_event(&mut live_rx).await;
    let rooms = state.rooms.read().await;
    let room = rooms.get("room-a").expect("room should exist");
    assert_eq!(room.read().await.peers.len(), 2);
}

#[tokio::test]
async fn leave_all_removes_the_peer_and_drops_empty_rooms() {
    let state = test_state();
    let conn = Uuid::new_v4();
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut joined = Vec::new();
    for room in ["room-a", "room-b"] {
        apply_client_event(
            &state,
            conn,
            &tx,
            &mut joined,
            ClientEvent::JoinRoom {
                room_id: room.into(),
            },
        )
        .await;
    }
    let (_peer, mut peer_rx, _) = join_room(&state, "room-a").await;

    leave_all(&state, conn, &joined).await;

    {
        let rooms = state.rooms.read().await;
        assert!(!rooms.contains_key("room-b"));
        let room = rooms.get("room-a").expect("room-a should survive");
        assert_eq!(room.read().await.peers.len(), 1);
    }

    send_event(
        &state,
        Uuid::new_v4(),
        ClientEvent::ClearCanvas {
            room_id: "room-a".into(),
        },
    )
    .await;
    assert_eq!(recv_event(&mut peer_rx).await, ServerEvent::ClearCanvas);
}

#[tokio::test]
async fn invalid_room_ids_are_rejected_on_join() {
    let state = test_state();
    let conn = Uuid::new_v4();
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut joined = Vec::new();

    for bad in [String::new(), "x".repeat(MAX_ROOM_ID_LEN + 1)] {
        apply_client_event(
            &state,
            conn,
            &tx,
            &mut joined,
            ClientEvent::JoinRoom { room_id: bad },
        )
        .await;
    }

    assert!(joined.is_empty());
    assert!(state.rooms.read().await.is_empty());
}

#[test]
fn room_ids_are_trimmed_and_bounded() {
    assert_eq!(
        normalize_room_id("  default-room  ").as_deref(),
        Some("default-room")
    );
    let max = "x".repeat(MAX_ROOM_ID_LEN);
    assert_eq!(normalize_room_id(&max).as_deref(), Some(max.as_str()));
    assert!(normalize_room_id("   ").is_none());
    assert!(normalize_room_id(&"x".repeat(MAX_ROOM_ID_LEN + 1)).is_none());
}
