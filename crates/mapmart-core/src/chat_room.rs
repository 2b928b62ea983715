//! Chat room state
//!
//! Tracks the live chat connections and fans events out to them. Each
//! connection owns a broadcast channel; the WebSocket task of the connection
//! drains it. A user may hold several connections (tabs, devices).
//!
//! Frame format on the wire:
//! ```json
//! { "id": "…", "cmd": "new_message", "data": { … } }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use axum::extract::ws::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::chat_limit::ChatLimitConfig;
use crate::prelude::*;

#[derive(Clone, Debug)]
pub struct ChatConfig {
	pub limit: ChatLimitConfig,
	/// Events buffered per connection before a slow reader starts lagging
	pub buffer_size: usize,
	/// Messages older than this are purged
	pub retention: Duration,
	/// Maximum number of messages returned by the history endpoint
	pub history_limit: u32,
	/// Maximum message length in characters, after trimming
	pub max_message_len: usize,
	pub purge_interval: Duration,
}

impl Default for ChatConfig {
	fn default() -> Self {
		Self {
			limit: ChatLimitConfig::default(),
			buffer_size: 128,
			retention: Duration::from_secs(24 * 3600),
			history_limit: 100,
			max_message_len: 500,
			purge_interval: Duration::from_secs(3600),
		}
	}
}

/// Events pushed to chat clients
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "data", rename_all = "snake_case")]
pub enum ChatEvent {
	UserConnected {
		user_name: Box<str>,
		message: Box<str>,
	},
	UserDisconnected {
		user_name: Box<str>,
		message: Box<str>,
	},
	NewMessage {
		id: i64,
		username: Box<str>,
		user_photo: Box<str>,
		message: Box<str>,
		timestamp: String,
	},
	Error {
		message: Box<str>,
	},
	Ack {
		status: Box<str>,
	},
}

impl ChatEvent {
	pub fn error(message: impl Into<Box<str>>) -> Self {
		ChatEvent::Error { message: message.into() }
	}

	/// Serializes into a frame with a fresh id
	pub fn to_frame(&self) -> ClResult<Value> {
		self.to_frame_with_id(Uuid::new_v4().to_string())
	}

	pub fn to_frame_with_id(&self, id: String) -> ClResult<Value> {
		let mut frame = serde_json::to_value(self)?;
		if let Value::Object(map) = &mut frame {
			map.insert("id".into(), Value::String(id));
		}
		Ok(frame)
	}

	pub fn to_ws_message(&self) -> ClResult<Message> {
		Ok(Message::Text(self.to_frame()?.to_string().into()))
	}
}

/// Frame received from a chat client
#[derive(Clone, Debug, Deserialize)]
pub struct ChatCommand {
	#[serde(default)]
	pub id: Option<String>,
	pub cmd: String,
	#[serde(default)]
	pub data: Value,
}

impl ChatCommand {
	/// `Ok(None)` for control and binary frames
	pub fn from_ws_message(msg: &Message) -> ClResult<Option<Self>> {
		match msg {
			Message::Text(text) => Ok(Some(serde_json::from_str(text)?)),
			_ => Ok(None),
		}
	}
}

#[derive(Debug)]
pub struct ChatConnection {
	pub conn_id: Box<str>,
	/// `None` for anonymous listeners
	pub user_id: Option<UserId>,
	pub connected_at: Timestamp,
	sender: broadcast::Sender<ChatEvent>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChatRoomStats {
	pub connections: usize,
	pub users: usize,
}

/// The set of live chat connections
#[derive(Debug)]
pub struct ChatRoom {
	connections: RwLock<HashMap<Box<str>, ChatConnection>>,
	buffer_size: usize,
}

impl ChatRoom {
	pub fn new(buffer_size: usize) -> Self {
		Self { connections: RwLock::new(HashMap::new()), buffer_size: buffer_size.max(1) }
	}

	/// Registers a connection, returns the receiver its socket task drains
	pub async fn join(
		&self,
		conn_id: &str,
		user_id: Option<UserId>,
	) -> broadcast::Receiver<ChatEvent> {
		let (sender, receiver) = broadcast::channel(self.buffer_size);
		let connection = ChatConnection {
			conn_id: conn_id.into(),
			user_id,
			connected_at: mapmart_types::types::now(),
			sender,
		};
		self.connections.write().await.insert(conn_id.into(), connection);
		debug!(conn_id = %conn_id, user_id = ?user_id, "Chat connection joined");
		receiver
	}

	/// Removes a connection, returns the user it belonged to
	pub async fn leave(&self, conn_id: &str) -> Option<UserId> {
		let removed = self.connections.write().await.remove(conn_id);
		debug!(conn_id = %conn_id, "Chat connection left");
		removed.and_then(|c| c.user_id)
	}

	/// Sends `event` to every connection, returns how many received it
	pub async fn broadcast(&self, event: ChatEvent) -> usize {
		let connections = self.connections.read().await;
		connections.values().filter(|conn| conn.sender.send(event.clone()).is_ok()).count()
	}

	/// Sends `event` to a single connection
	pub async fn send_to(&self, conn_id: &str, event: ChatEvent) -> bool {
		let connections = self.connections.read().await;
		connections.get(conn_id).is_some_and(|conn| conn.sender.send(event).is_ok())
	}

	pub async fn stats(&self) -> ChatRoomStats {
		let connections = self.connections.read().await;
		let mut users: Vec<UserId> = connections.values().filter_map(|c| c.user_id).collect();
		users.sort_unstable();
		users.dedup();
		ChatRoomStats { connections: connections.len(), users: users.len() }
	}

	/// Drops connections whose receiver is gone, returns the number removed
	pub async fn cleanup(&self) -> usize {
		let mut connections = self.connections.write().await;
		let before = connections.len();
		connections.retain(|_, conn| conn.sender.receiver_count() > 0);
		before - connections.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_broadcast_reaches_all_connections() {
		let room = ChatRoom::new(16);
		let mut rx1 = room.join("c1", Some(UserId(1))).await;
		let mut rx2 = room.join("c2", None).await;

		let delivered = room.broadcast(ChatEvent::error("hello")).await;
		assert_eq!(delivered, 2);
		assert_eq!(rx1.recv().await.unwrap(), ChatEvent::error("hello"));
		assert_eq!(rx2.recv().await.unwrap(), ChatEvent::error("hello"));
	}

	#[tokio::test]
	async fn test_send_to_single_connection() {
		let room = ChatRoom::new(16);
		let mut rx1 = room.join("c1", Some(UserId(1))).await;
		let mut rx2 = room.join("c2", Some(UserId(2))).await;

		assert!(room.send_to("c1", ChatEvent::error("slow down")).await);
		assert!(!room.send_to("missing", ChatEvent::error("x")).await);
		assert_eq!(rx1.recv().await.unwrap(), ChatEvent::error("slow down"));
		assert!(rx2.try_recv().is_err());
	}

	#[tokio::test]
	async fn test_leave_and_stats() {
		let room = ChatRoom::new(16);
		let _rx1 = room.join("c1", Some(UserId(1))).await;
		let _rx2 = room.join("c2", Some(UserId(1))).await;
		let _rx3 = room.join("c3", None).await;
		assert_eq!(room.stats().await, ChatRoomStats { connections: 3, users: 1 });

		assert_eq!(room.leave("c1").await, Some(UserId(1)));
		assert_eq!(room.stats().await, ChatRoomStats { connections: 2, users: 1 });
		assert_eq!(room.leave("c2").await, Some(UserId(1)));
		assert_eq!(room.stats().await, ChatRoomStats { connections: 1, users: 0 });
		assert_eq!(room.leave("c3").await, None);
	}

	#[tokio::test]
	async fn test_cleanup_drops_dead_connections() {
		let room = ChatRoom::new(16);
		let rx = room.join("c1", None).await;
		let _rx2 = room.join("c2", None).await;
		drop(rx);
		assert_eq!(room.cleanup().await, 1);
		assert_eq!(room.stats().await.connections, 1);
	}

	#[test]
	fn test_frame_shape() {
		let event = ChatEvent::UserConnected { user_name: "Ana".into(), message: "Ana joined".into() };
		let frame = event.to_frame_with_id("m1".into()).unwrap();
		assert_eq!(
			frame,
			serde_json::json!({
				"id": "m1",
				"cmd": "user_connected",
				"data": { "user_name": "Ana", "message": "Ana joined" }
			})
		);
	}

	#[test]
	fn test_parse_command() {
		let msg = Message::Text(r#"{"id":"1","cmd":"send_message","data":{"message":"hi"}}"#.into());
		let cmd = ChatCommand::from_ws_message(&msg).unwrap().unwrap();
		assert_eq!(cmd.cmd, "send_message");
		assert_eq!(cmd.data["message"], "hi");
		assert!(ChatCommand::from_ws_message(&Message::Ping(vec![].into())).unwrap().is_none());
	}
}

// vim: ts=4
