use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use tracing::{info, warn};

use crate::models::notification::Notification;
use crate::state::AppState;

/// How much history a freshly connected client receives before the live
/// stream takes over.
const BACKLOG_LIMIT: usize = 20;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before snapshotting the backlog so nothing falls between.
    let mut rx = state.notification_events_tx.subscribe();

    let backlog: Vec<Notification> = {
        let log = state.notifications.read().await;
        log.iter().rev().take(BACKLOG_LIMIT).rev().cloned().collect()
    };

    info!("notification stream client connected");

    let send_task = tokio::spawn(async move {
        for notification in &backlog {
            match serde_json::to_string(notification) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        return;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "failed to serialize backlog notification");
                }
            }
        }

        while let Ok(notification) = rx.recv().await {
            let json = match serde_json::to_string(&notification) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize notification for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    info!("notification stream client disconnected");
}
