use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use shared::protocol::{Command, ServerResponse};
use tower_http::services::ServeDir;
use tracing::{info, warn};

mod config;
mod player;

use config::load_settings;
use player::{OsaScriptPlayer, Player};

#[derive(Clone)]
struct AppState {
    player: Arc<dyn Player>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let state = AppState {
        player: Arc::new(OsaScriptPlayer),
    };
    let app = build_router(Arc::new(state), &settings.static_dir);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, static_dir = %settings.static_dir, "remote control server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, static_dir: &str) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: Arc<AppState>, mut socket: WebSocket) {
    info!("remote control client connected");
    if send_response(&mut socket, &ServerResponse::status("connected"))
        .await
        .is_err()
    {
        return;
    }

    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };
        let reply = handle_frame(state.player.as_ref(), &text).await;
        if send_response(&mut socket, &reply).await.is_err() {
            break;
        }
    }
    info!("remote control client disconnected");
}

async fn send_response(
    socket: &mut WebSocket,
    response: &ServerResponse,
) -> Result<(), axum::Error> {
    let Ok(text) = serde_json::to_string(response) else {
        return Ok(());
    };
    socket.send(Message::Text(text)).await
}

/// One inbound frame, one reply. Every failure answers the client
/// and keeps the connection.
async fn handle_frame(player: &dyn Player, text: &str) -> ServerResponse {
    let command: Command = match serde_json::from_str(text) {
        Ok(command) => command,
        Err(error) => {
            warn!(%error, "failed to parse command");
            return ServerResponse::error("invalid command format");
        }
    };

    info!(action = %command.action, "executing command");
    match player.execute(&command).await {
        Ok(()) => ServerResponse::status("command executed"),
        Err(error) => {
            warn!(%error, action = %command.action, "command failed");
            ServerResponse::error(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{body::Body, http::{Request, StatusCode}};
    use futures::{SinkExt, StreamExt};
    use crate::player::PlayerError;
    use shared::protocol::actions;
    use std::sync::Mutex as StdMutex;
    use tokio_tungstenite::{connect_async, tungstenite};
    use tower::ServiceExt;

    struct RecordingPlayer {
        executed: StdMutex<Vec<Command>>,
    }

    impl RecordingPlayer {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                executed: StdMutex::new(Vec::new()),
            })
        }

        fn executed(&self) -> Vec<Command> {
            self.executed.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl Player for RecordingPlayer {
        async fn execute(&self, command: &Command) -> Result<(), PlayerError> {
            self.executed.lock().expect("lock").push(command.clone());
            Ok(())
        }
    }

    struct FailingPlayer;

    #[async_trait]
    impl Player for FailingPlayer {
        async fn execute(&self, _command: &Command) -> Result<(), PlayerError> {
            Err(PlayerError::MissingUrl)
        }
    }

    #[tokio::test]
    async fn healthz_responds_ok() {
        let app = build_router(
            Arc::new(AppState {
                player: RecordingPlayer::new(),
            }),
            "web/static",
        );
        let response = app
            .oneshot(Request::get("/healthz").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn undecodable_frame_answers_invalid_command_format() {
        let player = RecordingPlayer::new();
        let reply = handle_frame(player.as_ref(), "definitely not json").await;
        assert_eq!(reply, ServerResponse::error("invalid command format"));
        assert!(player.executed().is_empty());
    }

    #[tokio::test]
    async fn valid_command_is_executed_and_acknowledged() {
        let player = RecordingPlayer::new();
        let reply = handle_frame(player.as_ref(), r#"{"action":"play"}"#).await;
        assert_eq!(reply, ServerResponse::status("command executed"));
        assert_eq!(player.executed(), vec![Command::new(actions::PLAY)]);
    }

    #[tokio::test]
    async fn execution_failure_is_reported_to_the_client() {
        let reply = handle_frame(&FailingPlayer, r#"{"action":"open"}"#).await;
        assert_eq!(reply, ServerResponse::error("no URL provided"));
    }

    #[tokio::test]
    async fn ws_session_welcomes_replies_and_survives_bad_frames() {
        let player = RecordingPlayer::new();
        let app = build_router(
            Arc::new(AppState {
                player: Arc::clone(&player) as Arc<dyn Player>,
            }),
            "web/static",
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let (mut socket, _) = connect_async(format!("ws://{addr}/ws"))
            .await
            .expect("connect");

        let welcome = socket.next().await.expect("welcome").expect("frame");
        assert_eq!(
            welcome.into_text().expect("text"),
            r#"{"status":"connected"}"#
        );

        socket
            .send(tungstenite::Message::Text("garbage".into()))
            .await
            .expect("send");
        let reply = socket.next().await.expect("reply").expect("frame");
        assert_eq!(
            reply.into_text().expect("text"),
            r#"{"error":"invalid command format"}"#
        );

        // The connection survived the bad frame.
        socket
            .send(tungstenite::Message::Text(r#"{"action":"next"}"#.into()))
            .await
            .expect("send");
        let reply = socket.next().await.expect("reply").expect("frame");
        assert_eq!(
            reply.into_text().expect("text"),
            r#"{"status":"command executed"}"#
        );
        assert_eq!(player.executed(), vec![Command::new(actions::NEXT)]);
    }
}
