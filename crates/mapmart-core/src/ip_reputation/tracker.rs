//! IP reputation tracker
//!
//! Blocked set and suspicious table live under one lock: `clear_all` and the
//! promotion of an address from suspicious to blocked are atomic.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::prelude::*;
use crate::rate_limit::RateLimitError;

#[derive(Clone, Debug)]
pub struct ReputationConfig {
	/// Requests within one window above which an address gets blocked
	pub suspicious_threshold: u32,
	pub suspicious_window: Duration,
	/// `None` blocks until an admin lifts it
	pub block_duration: Option<Duration>,
	/// Stale records are swept whenever the table size is a multiple of this
	pub sweep_every: usize,
	/// Capacity bound of the suspicious table
	pub max_tracked: usize,
}

impl Default for ReputationConfig {
	fn default() -> Self {
		Self {
			suspicious_threshold: 100,
			suspicious_window: Duration::from_secs(60),
			block_duration: None,
			sweep_every: 1000,
			max_tracked: 100_000,
		}
	}
}

impl ReputationConfig {
	pub fn validate(&self) -> ClResult<()> {
		if self.suspicious_threshold == 0 {
			return Err(Error::ConfigError("suspicious_threshold must be positive".into()));
		}
		if self.suspicious_window.is_zero() {
			return Err(Error::ConfigError("suspicious_window must be positive".into()));
		}
		if self.block_duration.is_some_and(|d| d.is_zero()) {
			return Err(Error::ConfigError(
				"block_duration must be positive, use None for a permanent block".into(),
			));
		}
		if self.max_tracked == 0 {
			return Err(Error::ConfigError("max_tracked must be positive".into()));
		}
		Ok(())
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReputationDecision {
	Allow,
	/// Address was already blocked
	RejectBlocked { remaining: Option<Duration> },
	/// This request crossed the threshold
	RejectNewlyBlocked,
}

impl ReputationDecision {
	pub fn is_allowed(&self) -> bool {
		matches!(self, ReputationDecision::Allow)
	}

	/// Rejection to send back, if any
	pub fn rejection(self) -> Option<RateLimitError> {
		match self {
			ReputationDecision::Allow => None,
			ReputationDecision::RejectBlocked { remaining } => {
				Some(RateLimitError::Blocked { remaining })
			}
			ReputationDecision::RejectNewlyBlocked => Some(RateLimitError::NewlyBlocked),
		}
	}
}

#[derive(Clone, Copy, Debug)]
struct BlockEntry {
	expires_at: Option<DateTime<Utc>>,
}

impl BlockEntry {
	fn is_active_at(&self, now: DateTime<Utc>) -> bool {
		self.expires_at.is_none_or(|exp| now < exp)
	}

	fn remaining_at(&self, now: DateTime<Utc>) -> Option<Duration> {
		self.expires_at.and_then(|exp| (exp - now).to_std().ok())
	}
}

#[derive(Clone, Copy, Debug)]
struct SuspiciousRecord {
	count: u32,
	window_start: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct ReputationState {
	blocked: HashMap<Box<str>, BlockEntry>,
	suspicious: HashMap<Box<str>, SuspiciousRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SuspiciousInfo {
	pub requests: u32,
	pub first_seen: String,
}

/// Admin view of the tracker
#[derive(Clone, Debug, Serialize)]
pub struct ReputationSnapshot {
	pub blocked_ips: Vec<Box<str>>,
	pub count: usize,
	pub suspicious_ips: BTreeMap<Box<str>, SuspiciousInfo>,
}

#[derive(Debug)]
pub struct IpReputationTracker {
	config: ReputationConfig,
	window: TimeDelta,
	block_duration: Option<TimeDelta>,
	state: Mutex<ReputationState>,
}

fn to_delta(d: Duration) -> TimeDelta {
	TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX)
}

impl IpReputationTracker {
	pub fn new(config: ReputationConfig) -> Self {
		Self {
			window: to_delta(config.suspicious_window),
			block_duration: config.block_duration.map(to_delta),
			config,
			state: Mutex::new(ReputationState::default()),
		}
	}

	pub fn config(&self) -> &ReputationConfig {
		&self.config
	}

	pub fn check_and_record(&self, client: &str) -> ReputationDecision {
		self.check_and_record_at(client, Utc::now())
	}

	pub fn check_and_record_at(&self, client: &str, now: DateTime<Utc>) -> ReputationDecision {
		let mut guard = self.state.lock();
		let state = &mut *guard;

		if let Some(entry) = state.blocked.get(client) {
			if entry.is_active_at(now) {
				warn!(ip = client, "Blocked IP attempted access");
				return ReputationDecision::RejectBlocked { remaining: entry.remaining_at(now) };
			}
			state.blocked.remove(client);
			info!(ip = client, "IP block expired");
		}

		match state.suspicious.get_mut(client) {
			Some(record) if now - record.window_start > self.window => {
				*record = SuspiciousRecord { count: 1, window_start: now };
			}
			Some(record) => {
				record.count = record.count.saturating_add(1);
				if record.count > self.config.suspicious_threshold {
					let count = record.count;
					state.suspicious.remove(client);
					state.blocked.insert(client.into(), self.new_block(now));
					error!(ip = client, requests = count, "IP blocked for suspicious activity");
					return ReputationDecision::RejectNewlyBlocked;
				}
			}
			None => {
				if state.suspicious.len() >= self.config.max_tracked {
					self.sweep(state, now);
					if state.suspicious.len() >= self.config.max_tracked {
						warn!(ip = client, "Suspicious table full, request passes unrecorded");
						return ReputationDecision::Allow;
					}
				}
				state.suspicious.insert(client.into(), SuspiciousRecord { count: 1, window_start: now });
			}
		}

		let size = state.suspicious.len();
		if self.config.sweep_every > 0 && size > 0 && size % self.config.sweep_every == 0 {
			self.sweep(state, now);
		}

		ReputationDecision::Allow
	}

	fn new_block(&self, now: DateTime<Utc>) -> BlockEntry {
		BlockEntry { expires_at: self.block_duration.and_then(|d| now.checked_add_signed(d)) }
	}

	/// Drops suspicious records older than two windows and expired blocks
	fn sweep(&self, state: &mut ReputationState, now: DateTime<Utc>) {
		let horizon = self.window * 2;
		let before = state.suspicious.len();
		state.suspicious.retain(|_, rec| now - rec.window_start <= horizon);
		state.blocked.retain(|_, entry| entry.is_active_at(now));
		debug!(removed = before - state.suspicious.len(), "Swept suspicious IP records");
	}

	pub fn is_blocked(&self, client: &str) -> bool {
		self.is_blocked_at(client, Utc::now())
	}

	pub fn is_blocked_at(&self, client: &str, now: DateTime<Utc>) -> bool {
		self.state.lock().blocked.get(client).is_some_and(|entry| entry.is_active_at(now))
	}

	/// Blocks `client` and forgets its suspicious record
	pub fn block(&self, client: &str) {
		self.block_at(client, Utc::now());
	}

	pub fn block_at(&self, client: &str, now: DateTime<Utc>) {
		let mut state = self.state.lock();
		state.suspicious.remove(client);
		state.blocked.insert(client.into(), self.new_block(now));
	}

	/// Returns `false` if `client` was not blocked
	pub fn unblock(&self, client: &str) -> bool {
		self.state.lock().blocked.remove(client).is_some()
	}

	/// Empties both tables, returns the number of addresses that were blocked
	pub fn clear_all(&self) -> usize {
		let mut state = self.state.lock();
		let count = state.blocked.len();
		state.blocked.clear();
		state.suspicious.clear();
		count
	}

	pub fn list(&self) -> ReputationSnapshot {
		self.list_at(Utc::now())
	}

	pub fn list_at(&self, now: DateTime<Utc>) -> ReputationSnapshot {
		let state = self.state.lock();
		let mut blocked_ips: Vec<Box<str>> = state
			.blocked
			.iter()
			.filter(|(_, entry)| entry.is_active_at(now))
			.map(|(ip, _)| ip.clone())
			.collect();
		blocked_ips.sort();

		let suspicious_ips = state
			.suspicious
			.iter()
			.map(|(ip, rec)| {
				let info = SuspiciousInfo {
					requests: rec.count,
					first_seen: Timestamp::from_datetime(rec.window_start).to_iso(),
				};
				(ip.clone(), info)
			})
			.collect();

		ReputationSnapshot { count: blocked_ips.len(), blocked_ips, suspicious_ips }
	}
}


// vim: ts=4
