use std::sync::Arc;

use scrawlboard_shared::{ClientEvent, ServerEvent};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::state::{AppState, Room, MAX_ROOM_ID_LEN};

/// Routes one inbound event. `joined` is the connection's membership list,
/// appended on join so the disconnect path knows which rooms to clean up.
pub async fn apply_client_event(
    state: &AppState,
    sender: Uuid,
    sender_tx: &mpsc::UnboundedSender<ServerEvent>,
    joined: &mut Vec<String>,
    event: ClientEvent,
) {
    match event {
        ClientEvent::JoinRoom { room_id } => {
            let Some(room_id) = normalize_room_id(&room_id) else {
                warn!(conn = %sender, "rejecting join with invalid room id");
                return;
            };
            let room = get_or_create_room(state, &room_id).await;
            room.write().await.peers.insert(sender, sender_tx.clone());
            if !joined.contains(&room_id) {
                joined.push(room_id);
            }
        }
        ClientEvent::DrawShape { room_id, shape } => {
            forward(state, &room_id, sender, ServerEvent::DrawShape { shape }).await;
        }
        ClientEvent::UpdateShape { room_id, shape } => {
            forward(state, &room_id, sender, ServerEvent::UpdateShape { shape }).await;
        }
        ClientEvent::ClearCanvas { room_id } => {
            forward(state, &room_id, sender, ServerEvent::ClearCanvas).await;
        }
        ClientEvent::CursorMove {
            room_id,
            user_id,
            x,
            y,
        } => {
            forward(state, &room_id, sender, ServerEvent::CursorMove { user_id, x, y }).await;
        }
    }
}

pub fn normalize_room_id(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.len() > MAX_ROOM_ID_LEN {
        return None;
    }
    Some(value.to_string())
}

async fn get_or_create_room(state: &AppState, room_id: &str) -> Arc<RwLock<Room>> {
    if let Some(room) = state.rooms.read().await.get(room_id).cloned() {
        return room;
    }
    let room = Arc::new(RwLock::new(Room::default()));
    let mut rooms = state.rooms.write().await;
    let entry = rooms
        .entry(room_id.to_string())
        .or_insert_with(|| room.clone());
    entry.clone()
}

/// Fan one event out to the peers of `room_id`. Events naming a room nobody
/// has joined are dropped.
async fn forward(state: &AppState, room_id: &str, sender: Uuid, event: ServerEvent) {
    let Some(room) = state.rooms.read().await.get(room_id).cloned() else {
        debug!(room = room_id, "dropping event for unknown room");
        return;
    };
    broadcast_except(&room, sender, event).await;
}

/// Sends `event` once to every peer except the sender. Peers whose channel has
/// closed are removed afterwards.
pub async fn broadcast_except(room: &Arc<RwLock<Room>>, sender: Uuid, event: ServerEvent) {
    let mut stale = Vec::new();
    {
        let room = room.read().await;
        for (id, tx) in room.peers.iter() {
            if *id == sender {
                continue;
            }
            if tx.send(event.clone()).is_err() {
                stale.push(*id);
            }
        }
    }

    if !stale.is_empty() {
        debug!(count = stale.len(), "sweeping stale peers");
        let mut room = room.write().await;
        for id in stale {
            room.peers.remove(&id);
        }
    }
}

/// Disconnect cleanup: removes the peer from every room it joined and drops
/// rooms whose membership reaches zero.
pub async fn leave_all(state: &AppState, sender: Uuid, joined: &[String]) {
    for room_id in joined {
        let Some(room) = state.rooms.read().await.get(room_id).cloned() else {
            continue;
        };
        let now_empty = {
            let mut room = room.write().await;
            room.peers.remove(&sender);
            room.peers.is_empty()
        };
        if now_empty {
            let mut rooms = state.rooms.write().await;
            if let Some(current) = rooms.get(room_id) {
                if Arc::ptr_eq(current, &room) {
                    rooms.remove(room_id);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "relay_test.rs"]
mod tests;
