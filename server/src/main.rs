use std::net::SocketAddr;
use std::path::PathBuf;

use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use tower_http::services::ServeDir;
use tracing::{info, warn};

mod chat;
mod handlers;
mod relay;
mod state;

use crate::chat::ChatClient;
use crate::handlers::{board_handler, chat_handler, ping_handler, root_handler, ws_handler};
use crate::state::AppState;

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long)]
    public_dir: Option<PathBuf>,
    /// Override the chat-completions endpoint (defaults to Groq).
    #[arg(long)]
    chat_url: Option<String>,
    #[arg(long)]
    chat_model: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scrawlboard_server=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    let api_key = std::env::var("GROQ_API_KEY")
        .ok()
        .filter(|key| !key.is_empty());
    if api_key.is_none() {
        warn!("GROQ_API_KEY is not set; /api/chat will answer with an error");
    }
    let chat = ChatClient::new(api_key, args.chat_url, args.chat_model)
        .expect("Failed to build chat client");
    let state = AppState::new(chat);

    let public_dir = args
        .public_dir
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../public"));
    let index_file = public_dir.join("index.html");

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/b/:board_id", get(board_handler))
        .route("/ws", get(ws_handler))
        .route("/ping", get(ping_handler))
        .route("/api/chat", post(chat_handler))
        .fallback_service(ServeDir::new(public_dir).append_index_html_on_directories(true))
        .layer(axum::Extension(index_file))
        .with_state(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("scrawlboard running at http://localhost:{port}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server");
    axum::serve(listener, app).await.expect("Server crashed");
}
