//! WebSocket endpoint pushing live monitor events.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::timeout;

use crate::monitor::MonitorEvent;

use super::handlers::AppState;

/// Commands a subscriber may send over the socket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SubscriberCommand {
    /// Request an immediate active-calls snapshot.
    GetActiveCalls,
}

/// GET /ws - WebSocket upgrade handler.
pub async fn ws_monitor(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let keepalive = Duration::from_secs(state.service.config().live.keepalive_secs.max(1));
    let (sender, receiver) = socket.split();

    tracing::info!("subscriber connected");
    drive_subscriber(sender, receiver, state, keepalive).await;
    tracing::info!("subscriber disconnected");
}

/// Drive one subscriber connection until it closes.
///
/// Broadcast events are forwarded as they arrive; when the client stays
/// silent for the keepalive interval a keepalive event is sent so dead
/// connections surface as send failures. Generic over the socket halves
/// rather than tied to `WebSocket`.
async fn drive_subscriber<K, S>(mut sender: K, mut receiver: S, state: AppState, keepalive: Duration)
where
    K: Sink<Message> + Unpin,
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let mut events = state.service.subscribe();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if !send_event(&mut sender, &event).await {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "subscriber lagged behind event stream");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = timeout(keepalive, receiver.next()) => match incoming {
                Err(_) => {
                    if !send_event(&mut sender, &MonitorEvent::Keepalive).await {
                        break;
                    }
                }
                Ok(Some(Ok(Message::Text(text)))) => {
                    handle_command(&text, &state, &mut sender).await;
                }
                Ok(Some(Ok(Message::Ping(data)))) => {
                    if sender.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Ok(Some(Ok(Message::Close(_)))) | Ok(None) => break,
                Ok(Some(Ok(_))) => {}
                Ok(Some(Err(e))) => {
                    tracing::debug!(error = %e, "subscriber socket error");
                    break;
                }
            }
        }
    }
}

async fn handle_command<K>(text: &str, state: &AppState, sender: &mut K)
where
    K: Sink<Message> + Unpin,
{
    match serde_json::from_str::<SubscriberCommand>(text) {
        Ok(SubscriberCommand::GetActiveCalls) => {
            let snapshot = MonitorEvent::ActiveCalls {
                calls: state.service.active_calls(),
            };
            let _ = send_event(sender, &snapshot).await;
        }
        Err(e) => {
            tracing::debug!(error = %e, "unrecognized subscriber command");
        }
    }
}

/// Serialize and send one event. Returns false when the socket is gone.
async fn send_event<K>(sender: &mut K, event: &MonitorEvent) -> bool
where
    K: Sink<Message> + Unpin,
{
    let Ok(json) = serde_json::to_string(event) else {
        return true;
    };
    sender.send(Message::Text(json)).await.is_ok()
}
