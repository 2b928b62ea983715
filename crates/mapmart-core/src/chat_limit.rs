//! Per-user send limiter for the chat channel.
//!
//! Fixed window anchored at the first message: once `window` has elapsed
//! since the window start, the next message opens a new window. A denied
//! message does not count.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;

use crate::prelude::*;

#[derive(Clone, Debug)]
pub struct ChatLimitConfig {
	pub max_messages: u32,
	pub window: Duration,
}

impl Default for ChatLimitConfig {
	fn default() -> Self {
		Self { max_messages: 10, window: Duration::from_secs(60) }
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatSendDecision {
	Allow,
	Deny { retry_after: Duration },
}

#[derive(Clone, Copy, Debug)]
struct SendWindow {
	count: u32,
	start: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ChatRateLimiter {
	max_messages: u32,
	window: TimeDelta,
	windows: Mutex<HashMap<UserId, SendWindow>>,
}

impl ChatRateLimiter {
	pub fn new(config: &ChatLimitConfig) -> Self {
		Self {
			max_messages: config.max_messages,
			window: TimeDelta::from_std(config.window).unwrap_or(TimeDelta::MAX),
			windows: Mutex::new(HashMap::new()),
		}
	}

	pub fn register_send(&self, user_id: UserId) -> ChatSendDecision {
		self.register_send_at(user_id, Utc::now())
	}

	pub fn register_send_at(&self, user_id: UserId, now: DateTime<Utc>) -> ChatSendDecision {
		let mut windows = self.windows.lock();
		let entry = windows.entry(user_id).or_insert(SendWindow { count: 0, start: now });

		if now - entry.start >= self.window {
			*entry = SendWindow { count: 0, start: now };
		}

		if entry.count >= self.max_messages {
			let retry_after = entry
				.start
				.checked_add_signed(self.window)
				.and_then(|end| (end - now).to_std().ok())
				.unwrap_or_default();
			warn!(user_id = %user_id, "Chat message rate exceeded");
			return ChatSendDecision::Deny { retry_after };
		}

		entry.count += 1;
		ChatSendDecision::Allow
	}

	/// Forgets users whose window has elapsed, returns the number removed
	pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
		let mut windows = self.windows.lock();
		let before = windows.len();
		windows.retain(|_, w| now - w.start < self.window);
		before - windows.len()
	}
}


// vim: ts=4
