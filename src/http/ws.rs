use super::messages::{ClientMessage, ControlAction, ServerMessage};
use super::state::AppState;
use crate::error::SessionError;
use crate::session::Session;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::IntoResponse,
};
use base64::Engine;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// GET /interviews/:session_id/ws
/// Per-session duplex transport: inbound audio/control frames in,
/// session events out.
pub async fn ws_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let session = match state.registry.get(&session_id).await {
        Ok(session) => session,
        Err(e) => {
            return (StatusCode::NOT_FOUND, e.to_string()).into_response();
        }
    };
    ws.on_upgrade(move |socket| handle_socket(socket, session))
        .into_response()
}

async fn handle_socket(socket: WebSocket, session: Arc<Session>) {
    let session_id = session.id().to_string();
    info!(session_id = %session_id, "WebSocket connected");

    let (mut sink, mut stream) = socket.split();
    let mut events = session.subscribe().await;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let msg = ServerMessage::from(event);
                    let payload = match serde_json::to_string(&msg) {
                        Ok(p) => p,
                        Err(e) => {
                            warn!(session_id = %session_id, "Failed to encode event: {}", e);
                            continue;
                        }
                    };
                    if sink.send(Message::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(session_id = %session_id, skipped, "WebSocket consumer lagged");
                }
                // Session completed; the outbound stream is closed.
                Err(RecvError::Closed) => break,
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    handle_client_message(&session, &text).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // binary/ping/pong frames are not part of the protocol
                Some(Err(e)) => {
                    debug!(session_id = %session_id, "WebSocket receive error: {}", e);
                    break;
                }
            },
        }
    }

    let _ = sink.close().await;
    info!(session_id = %session_id, "WebSocket disconnected");
}

async fn handle_client_message(session: &Session, text: &str) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(m) => m,
        Err(e) => {
            warn!(session_id = %session.id(), "Unparseable client frame: {}", e);
            return;
        }
    };

    match message {
        ClientMessage::AudioChunk { data } => {
            match base64::engine::general_purpose::STANDARD.decode(&data) {
                Ok(bytes) => session.push_audio(bytes).await,
                Err(e) => {
                    warn!(session_id = %session.id(), "Bad audio chunk encoding: {}", e);
                }
            }
        }
        ClientMessage::Control { action } => match action {
            ControlAction::Start => match session.start().await {
                Ok(()) | Err(SessionError::AlreadyStarted(_)) => {}
                Err(e) => {
                    warn!(session_id = %session.id(), "Start via control frame failed: {}", e);
                }
            },
            ControlAction::End => session.end().await,
        },
    }
}
