//! Chat service: presence, message posting, retention and history

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::prelude::*;
use mapmart_core::chat_limit::ChatSendDecision;
use mapmart_core::chat_room::ChatEvent;
use mapmart_core::SessionCtx;
use mapmart_types::meta_adapter::ChatMessage;
use mapmart_types::utils::escape_angle_brackets;

pub const MSG_NOT_AUTHENTICATED: &str = "Not authenticated";
pub const MSG_SLOW_DOWN: &str = "Too many messages. Please wait a moment.";
pub const MSG_USER_NOT_FOUND: &str = "User not found";
pub const MSG_EMPTY: &str = "Empty message";
pub const MSG_SEND_FAILED: &str = "Could not send message";

// Presence
//**********

/// Registers a connection and announces the user to the room
///
/// Anonymous connections and sessions whose user no longer exists are
/// accepted silently: they receive room traffic but announce nothing.
pub async fn connect(
	app: &App,
	conn_id: &str,
	session: Option<SessionCtx>,
) -> broadcast::Receiver<ChatEvent> {
	let rx = app.chat_room.join(conn_id, session.map(|s| s.user_id)).await;

	if let Some(session) = session {
		match app.meta_adapter.read_user(session.user_id).await {
			Ok(user) => {
				info!("User connected to chat: {}", user.name);
				let message = format!("{} joined the chat", user.name);
				app.chat_room
					.broadcast(ChatEvent::UserConnected { user_name: user.name, message: message.into() })
					.await;
			}
			Err(Error::NotFound) => debug!(user_id = %session.user_id, "Chat session for unknown user"),
			Err(err) => warn!("Failed to resolve chat user {}: {}", session.user_id, err),
		}
	}

	rx
}

/// Unregisters a connection and announces the departure
pub async fn disconnect(app: &App, conn_id: &str) {
	let Some(user_id) = app.chat_room.leave(conn_id).await else {
		return;
	};

	match app.meta_adapter.read_user(user_id).await {
		Ok(user) => {
			info!("User disconnected from chat: {}", user.name);
			let message = format!("{} left the chat", user.name);
			app.chat_room
				.broadcast(ChatEvent::UserDisconnected { user_name: user.name, message: message.into() })
				.await;
		}
		Err(err) => debug!("Skipping departure notice for {}: {}", user_id, err),
	}
}

// Messages
//**********

/// Validates, stores and broadcasts a chat message
///
/// Problems are reported to the sending connection only, as an `error`
/// event. Nothing is broadcast unless the message was stored.
pub async fn send_message(app: &App, conn_id: &str, session: Option<SessionCtx>, text: &str) {
	send_message_at(app, conn_id, session, text, Utc::now()).await;
}

pub async fn send_message_at(
	app: &App,
	conn_id: &str,
	session: Option<SessionCtx>,
	text: &str,
	now: DateTime<Utc>,
) {
	match post_message(app, session, text, now).await {
		Ok(event) => {
			app.chat_room.broadcast(event).await;
		}
		Err(message) => {
			app.chat_room.send_to(conn_id, ChatEvent::error(message)).await;
		}
	}
}

async fn post_message(
	app: &App,
	session: Option<SessionCtx>,
	text: &str,
	now: DateTime<Utc>,
) -> Result<ChatEvent, String> {
	let Some(session) = session else {
		return Err(MSG_NOT_AUTHENTICATED.into());
	};

	if let ChatSendDecision::Deny { .. } = app.chat_limiter.register_send_at(session.user_id, now) {
		return Err(MSG_SLOW_DOWN.into());
	}

	let user = app.meta_adapter.read_user(session.user_id).await.map_err(|err| {
		debug!("Chat sender {} not resolved: {}", session.user_id, err);
		MSG_USER_NOT_FOUND.to_string()
	})?;

	let text = text.trim();
	if text.is_empty() {
		return Err(MSG_EMPTY.into());
	}
	let max_len = app.opts.chat.max_message_len;
	if text.chars().count() > max_len {
		return Err(format!("Message too long (max {} characters)", max_len));
	}
	let text = escape_angle_brackets(text);

	let stored = app
		.meta_adapter
		.create_chat_message(user.user_id, &text, Timestamp::from_datetime(now))
		.await
		.map_err(|err| {
			error!("Failed to store chat message from {}: {}", user.user_id, err);
			MSG_SEND_FAILED.to_string()
		})?;

	info!("Chat message sent by {}", user.name);
	Ok(ChatEvent::NewMessage {
		id: stored.msg_id,
		username: user.name,
		user_photo: user.profile_picture,
		message: stored.message,
		timestamp: stored.created_at.to_iso(),
	})
}

// Retention
//***********

fn retention_cutoff(app: &App, now: Timestamp) -> Timestamp {
	now.sub_seconds(app.opts.chat.retention.as_secs() as i64)
}

/// Deletes messages past the retention period, returns the number removed
pub async fn purge_expired_at(app: &App, now: Timestamp) -> ClResult<u64> {
	let deleted = app.meta_adapter.delete_chat_messages_before(retention_cutoff(app, now)).await?;
	if deleted > 0 {
		info!("Purged {} expired chat messages", deleted);
	}
	Ok(deleted)
}

/// Recent messages in chronological order, after purging expired ones
pub async fn history_at(app: &App, now: Timestamp) -> ClResult<Vec<ChatMessage>> {
	purge_expired_at(app, now).await?;
	let mut messages = app
		.meta_adapter
		.list_chat_messages(retention_cutoff(app, now), app.opts.chat.history_limit)
		.await?;
	messages.reverse();
	Ok(messages)
}

/// Periodic purge of expired messages and idle send windows
pub fn spawn_retention_task(app: App) -> JoinHandle<()> {
	tokio::spawn(async move {
		let mut interval = tokio::time::interval(app.opts.chat.purge_interval);
		loop {
			interval.tick().await;
			let now = Utc::now();
			if let Err(err) = purge_expired_at(&app, Timestamp::from_datetime(now)).await {
				warn!("Chat retention sweep failed: {}", err);
			}
			let idle = app.chat_limiter.purge_expired_at(now);
			let dead = app.chat_room.cleanup().await;
			debug!(idle_windows = idle, dead_connections = dead, "Chat housekeeping done");
		}
	})
}

// vim: ts=4
