//! Chat WebSocket (`/ws/chat`)
//!
//! Message Format:
//! ```json
//! { "id": "msg-123", "cmd": "send_message", "data": { "message": "hi" } }
//! ```
//!
//! Inbound commands: `send_message`, `ping`. Outbound events are the
//! `ChatEvent` variants.

use std::sync::Arc;
use std::time::Duration;

use axum::{
	extract::ws::{Message, WebSocket, WebSocketUpgrade},
	extract::State,
	response::Response,
};
use futures::sink::SinkExt;
use futures::stream::StreamExt;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::prelude::*;
use crate::service;
use mapmart_core::chat_room::{ChatCommand, ChatEvent};
use mapmart_core::{OptionalAuth, SessionCtx};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

pub async fn get_chat_ws(
	State(app): State<App>,
	OptionalAuth(session): OptionalAuth,
	ws: WebSocketUpgrade,
) -> Response {
	ws.on_upgrade(move |socket| handle_chat_connection(socket, app, session))
}

/// Handle a chat connection
pub async fn handle_chat_connection(ws: WebSocket, app: App, session: Option<SessionCtx>) {
	let conn_id = Uuid::new_v4().to_string();
	info!(
		"Chat connection: {} (conn={})",
		session.map_or_else(|| "anonymous".to_string(), |s| s.user_id.to_string()),
		&conn_id[..8]
	);

	let room_rx = service::connect(&app, &conn_id, session).await;

	let (ws_tx, ws_rx) = ws.split();
	let ws_tx = Arc::new(tokio::sync::Mutex::new(ws_tx));

	// Heartbeat task - sends ping frames to keep connection alive
	let ws_tx_heartbeat = ws_tx.clone();
	let heartbeat_task = tokio::spawn(async move {
		let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
		loop {
			interval.tick().await;
			let mut tx = ws_tx_heartbeat.lock().await;
			if tx.send(Message::Ping(vec![].into())).await.is_err() {
				debug!("Chat client disconnected during heartbeat");
				return;
			}
		}
	});

	// WebSocket receive task - handles incoming commands
	let app_recv = app.clone();
	let conn_id_recv = conn_id.clone();
	let ws_tx_recv = ws_tx.clone();
	let ws_recv_task = tokio::spawn(async move {
		let mut ws_rx = ws_rx;
		while let Some(msg) = ws_rx.next().await {
			let ws_msg = match msg {
				Ok(Message::Close(_)) => break,
				Ok(m) => m,
				Err(e) => {
					debug!("Chat connection error: {}", e);
					break;
				}
			};

			let cmd = match ChatCommand::from_ws_message(&ws_msg) {
				Ok(Some(cmd)) => cmd,
				Ok(None) => continue,
				Err(e) => {
					warn!("Failed to parse chat frame: {}", e);
					continue;
				}
			};

			match cmd.cmd.as_str() {
				"send_message" => {
					let text = cmd.data.get("message").and_then(|v| v.as_str()).unwrap_or_default();
					service::send_message(&app_recv, &conn_id_recv, session, text).await;
				}
				"ping" => {
					let ack = ChatEvent::Ack { status: "pong".into() };
					let frame = ack.to_frame_with_id(cmd.id.unwrap_or_default());
					if let Ok(frame) = frame {
						let mut tx = ws_tx_recv.lock().await;
						if tx.send(Message::Text(frame.to_string().into())).await.is_err() {
							break;
						}
					}
				}
				other => {
					debug!("Unknown chat command: {}", other);
					app_recv
						.chat_room
						.send_to(&conn_id_recv, ChatEvent::error(format!("Unknown command: {}", other)))
						.await;
				}
			}
		}
	});

	// Room task - forwards room events to the WebSocket
	let ws_tx_room = ws_tx.clone();
	let room_task = tokio::spawn(async move {
		let mut rx = room_rx;
		loop {
			match rx.recv().await {
				Ok(event) => match event.to_ws_message() {
					Ok(ws_msg) => {
						let mut tx = ws_tx_room.lock().await;
						if tx.send(ws_msg).await.is_err() {
							debug!("Chat client disconnected while forwarding");
							return;
						}
					}
					Err(e) => warn!("Failed to serialize chat event: {}", e),
				},
				Err(RecvError::Lagged(n)) => {
					warn!("Chat receiver lagged, skipped {} events", n);
				}
				Err(RecvError::Closed) => return,
			}
		}
	});

	supervise(ws_recv_task, room_task, heartbeat_task).await;
	service::disconnect(&app, &conn_id).await;
	info!("Chat connection closed (conn={})", &conn_id[..8]);
}

/// Wait until the receive or the room task ends, then stop every task of the
/// connection. Returns only after all of them are gone.
async fn supervise(
	mut ws_recv_task: JoinHandle<()>,
	mut room_task: JoinHandle<()>,
	heartbeat_task: JoinHandle<()>,
) {
	tokio::select! {
		_ = &mut ws_recv_task => {
			debug!("Chat receive task ended");
		}
		_ = &mut room_task => {
			debug!("Chat room task ended");
		}
	}

	heartbeat_task.abort();
	ws_recv_task.abort();
	room_task.abort();
	for task in [ws_recv_task, room_task, heartbeat_task] {
		let _ = task.await;
	}
}


// vim: ts=4
