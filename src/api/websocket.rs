use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use super::state::AppState;
use crate::models::RecordingSession;

#[derive(Debug, Deserialize)]
struct WsIncoming {
    #[serde(rename = "type")]
    msg_type: String,
}

#[derive(Debug, Serialize)]
struct WsOutgoing {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<serde_json::Value>,
}

impl WsOutgoing {
    fn session(session: &RecordingSession) -> Self {
        Self {
            msg_type: "session".to_string(),
            session: Some(serde_json::to_value(session).unwrap_or_default()),
        }
    }

    fn pong() -> Self {
        Self {
            msg_type: "pong".to_string(),
            session: None,
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Push the session record now and after every change
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let client_id = Uuid::new_v4().to_string();
    state.client_connected(&client_id);

    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.control.subscribe();

    let current = WsOutgoing::session(&rx.borrow_and_update().clone());
    if send(&mut sender, &current).await {
        loop {
            tokio::select! {
                update = next_session_update(&mut rx) => {
                    let Some(update) = update else {
                        break;
                    };
                    if !send(&mut sender, &update).await {
                        break;
                    }
                }
                incoming = receiver.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let is_ping = serde_json::from_str::<WsIncoming>(&text)
                            .map(|m| m.msg_type == "ping")
                            .unwrap_or(false);
                        if is_ping && !send(&mut sender, &WsOutgoing::pong()).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.client_disconnected(&client_id);
}

/// Wait for the next change to the record. `None` once the store is gone.
async fn next_session_update(rx: &mut watch::Receiver<RecordingSession>) -> Option<WsOutgoing> {
    rx.changed().await.ok()?;
    let session = rx.borrow_and_update().clone();
    Some(WsOutgoing::session(&session))
}

/// Returns false once the client is gone
async fn send(sender: &mut SplitSink<WebSocket, Message>, msg: &WsOutgoing) -> bool {
    let json = match serde_json::to_string(msg) {
        Ok(j) => j,
        Err(_) => return true,
    };
    sender.send(Message::Text(json.into())).await.is_ok()
}
