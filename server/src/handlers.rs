use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use futures_util::{SinkExt, StreamExt};
use scrawlboard_shared::{ClientEvent, ServerEvent};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::chat::{ChatError, ChatReply, ChatRequest};
use crate::relay::{apply_client_event, leave_all};
use crate::state::AppState;

pub async fn ping_handler() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

pub async fn root_handler() -> impl IntoResponse {
    Redirect::to(&format!("/b/{}", Uuid::new_v4()))
}

pub async fn board_handler(
    Path(board_id): Path<String>,
    axum::Extension(index_file): axum::Extension<std::path::PathBuf>,
) -> impl IntoResponse {
    if Uuid::parse_str(&board_id).is_err() {
        return StatusCode::NOT_FOUND.into_response();
    }
    match tokio::fs::read_to_string(index_file).await {
        Ok(contents) => Html(contents).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    match state.chat.reply(&request.message).await {
        Ok(reply) => Json(ChatReply { reply }).into_response(),
        Err(error) => {
            warn!(%error, "chat request failed");
            let status = match &error {
                ChatError::Unconfigured => StatusCode::SERVICE_UNAVAILABLE,
                ChatError::ApiRequest(_) | ChatError::ApiResponse { .. } => StatusCode::BAD_GATEWAY,
                ChatError::HttpClientBuild(_) | ChatError::ApiParse(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (
                status,
                Json(serde_json::json!({ "error": "Error fetching AI response" })),
            )
                .into_response()
        }
    }
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut socket_sender, mut socket_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let connection_id = Uuid::new_v4();
    info!(conn = %connection_id, "websocket connected");

    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Ok(payload) = serde_json::to_string(&event) {
                if socket_sender.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
        }
    });

    let mut joined = Vec::new();
    while let Some(Ok(message)) = socket_receiver.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    apply_client_event(&state, connection_id, &tx, &mut joined, event).await;
                }
                Err(error) => {
                    warn!(conn = %connection_id, %error, "dropping unparseable frame");
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    leave_all(&state, connection_id, &joined).await;
    send_task.abort();
    info!(conn = %connection_id, rooms = joined.len(), "websocket disconnected");
}
