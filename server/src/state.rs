use std::collections::HashMap;
use std::sync::Arc;

use scrawlboard_shared::ServerEvent;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::chat::ChatClient;

pub const MAX_ROOM_ID_LEN: usize = 64;

#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<String, Arc<RwLock<Room>>>>>,
    pub chat: Arc<ChatClient>,
}

/// Live membership of one board. Holds no shape data; every connected peer
/// keeps its own replica.
#[derive(Default)]
pub struct Room {
    pub peers: HashMap<Uuid, mpsc::UnboundedSender<ServerEvent>>,
}

impl AppState {
    pub fn new(chat: ChatClient) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            chat: Arc::new(chat),
        }
    }
}
