//! 1:1 랜덤 매칭 시그널링 서버

mod config;
mod error;
mod handlers;
mod lobby;
mod protocol;
mod state;

use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::HeaderValue,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use config::Config;
use futures::{SinkExt, StreamExt};
use protocol::ServerFrame;
use state::AppState;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = Arc::new(AppState::new(config.clone()));

    // 라우터 설정
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config)),
        );

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Pairing signaling server started");
    tracing::info!("Address: {}", addr);
    tracing::info!("WebSocket: ws://{}/ws", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// CORS 설정
fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.allows_any_origin() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(origins)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

async fn index_handler() -> Html<&'static str> {
    Html("<h1>Pairing Signaling Server</h1><p>WebSocket endpoint: /ws</p>")
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let (peers, queued, rooms) = {
        let lobby = state.lobby.lock().await;
        (lobby.peer_count(), lobby.queued_count(), lobby.room_count())
    };

    Json(serde_json::json!({
        "status": "ok",
        "server": "pairing-signaling-rs",
        "timestamp": std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default(),
        "peers": peers,
        "queued": queued,
        "rooms": rooms,
    }))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerFrame>();

    // 연결 처리 (대기열 등록 + 매칭)
    let peer_id = handlers::handle_connection(state.clone(), tx).await;

    // 송신 태스크
    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match frame.to_text() {
                Ok(text) => {
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Failed to serialize frame"),
            }
        }
    });

    // 수신 처리
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                handlers::handle_client_text(&state, &peer_id, &text).await;
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::debug!(peer_id = %peer_id, error = %e, "WebSocket receive error");
                break;
            }
            _ => {}
        }
    }

    // 연결 해제
    handlers::handle_disconnect(state, &peer_id).await;
    send_task.abort();
}
