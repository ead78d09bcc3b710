//! Websocket subscriber endpoint: `NEW → ACCEPTED → REGISTERED →
//! (FORWARDING)* → UNREGISTERED`, with `UNREGISTERED` reachable from any
//! prior state via the deregistration guard below.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use tracing::{debug, info};

use crate::broadcaster::{Broadcaster, Subscriber};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub broadcaster: Arc<Broadcaster>,
    pub config: Arc<Config>,
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Deregisters its subscriber on drop, so deregistration happens on every
/// exit path from `handle_socket` — normal return, peer disconnect, or a
/// panic unwinding through this task.
struct Deregister {
    broadcaster: Arc<Broadcaster>,
    subscriber: Arc<Subscriber>,
}

impl Drop for Deregister {
    fn drop(&mut self) {
        self.broadcaster.remove(&self.subscriber);
    }
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let subscriber = state.broadcaster.add(state.config.subscriber_queue_capacity);
    let _guard = Deregister {
        broadcaster: state.broadcaster.clone(),
        subscriber: subscriber.clone(),
    };
    info!("subscriber connected");

    loop {
        match subscriber.recv(state.config.subscriber_idle_timeout).await {
            Some(message) => {
                if socket.send(Message::Text(message)).await.is_err() {
                    debug!("subscriber disconnected");
                    return;
                }
            }
            None => {
                info!("subscriber idle for {:?}, closing with code 1001", state.config.subscriber_idle_timeout);
                let _ = socket
                    .send(Message::Close(Some(CloseFrame {
                        code: 1001,
                        reason: "idle timeout".into(),
                    })))
                    .await;
                return;
            }
        }
    }
}
