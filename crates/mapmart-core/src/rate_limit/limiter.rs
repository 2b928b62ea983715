//! Fixed-window rate limiter
//!
//! Counters are keyed by (scope, client address, granularity) and reset at
//! clock-aligned window boundaries. A burst straddling a boundary is allowed
//! (up to twice the limit across two adjacent windows).

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::config::{RateLimitConfig, WindowGranularity};
use super::error::RateLimitError;
use crate::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct CounterKey {
	scope: &'static str,
	client: IpAddr,
	granularity: WindowGranularity,
}

#[derive(Clone, Copy, Debug)]
struct WindowCounter {
	count: u32,
	/// Window start in unix milliseconds
	window_start: i64,
}

/// Quota state of the tightest limit after a successful check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitStatus {
	pub limit: u32,
	pub remaining: u32,
	/// Seconds until the tightest window resets
	pub reset_secs: u64,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RateLimiterStats {
	pub tracked_keys: usize,
	pub total_limited: u64,
	pub total_untracked: u64,
}

pub struct RateLimiter {
	config: RateLimitConfig,
	counters: Mutex<HashMap<CounterKey, WindowCounter>>,
	total_limited: AtomicU64,
	total_untracked: AtomicU64,
}

impl std::fmt::Debug for RateLimiter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RateLimiter").field("config", &self.config).finish_non_exhaustive()
	}
}

fn window_start(now_ms: i64, len_ms: i64) -> i64 {
	now_ms.div_euclid(len_ms) * len_ms
}

fn ceil_secs(ms: i64) -> u64 {
	(ms.max(0) as u64).div_ceil(1000)
}

impl RateLimiter {
	pub fn new(config: RateLimitConfig) -> ClResult<Self> {
		config.validate()?;
		Ok(Self {
			config,
			counters: Mutex::new(HashMap::new()),
			total_limited: AtomicU64::new(0),
			total_untracked: AtomicU64::new(0),
		})
	}

	pub fn config(&self) -> &RateLimitConfig {
		&self.config
	}

	pub fn check(
		&self,
		scope: &'static str,
		client: IpAddr,
	) -> Result<Option<RateLimitStatus>, RateLimitError> {
		self.check_at(scope, client, Utc::now())
	}

	/// Records one request of `client` on `scope` at `now`
	///
	/// Every applicable window is incremented, then the request is rejected
	/// if any of them went over its maximum. Returns `Ok(None)` when the
	/// counter table is full and the request passes untracked.
	pub fn check_at(
		&self,
		scope: &'static str,
		client: IpAddr,
		now: DateTime<Utc>,
	) -> Result<Option<RateLimitStatus>, RateLimitError> {
		let limits = self.config.limits_for(scope);
		let now_ms = now.timestamp_millis();
		let mut counters = self.counters.lock();

		let missing = limits
			.iter()
			.filter(|l| {
				!counters.contains_key(&CounterKey { scope, client, granularity: l.granularity })
			})
			.count();
		if missing > 0 && counters.len() + missing > self.config.max_tracked_keys {
			purge_expired(&mut counters, now_ms);
			if counters.len() + missing > self.config.max_tracked_keys {
				self.total_untracked.fetch_add(1, Ordering::Relaxed);
				warn!(scope = scope, client = %client, "Rate limit table full, request passes untracked");
				return Ok(None);
			}
		}

		let mut rejection: Option<(WindowGranularity, i64)> = None;
		let mut tightest: Option<RateLimitStatus> = None;

		for limit in limits {
			let len_ms = limit.granularity.length_ms();
			let start = window_start(now_ms, len_ms);
			let key = CounterKey { scope, client, granularity: limit.granularity };
			let counter = counters.entry(key).or_insert(WindowCounter { count: 0, window_start: start });
			if counter.window_start != start {
				*counter = WindowCounter { count: 0, window_start: start };
			}
			counter.count = counter.count.saturating_add(1);

			let reset_ms = start + len_ms - now_ms;
			if counter.count > limit.max_count {
				// The client has to wait for the longest exhausted window
				if rejection.is_none_or(|(_, ms)| reset_ms > ms) {
					rejection = Some((limit.granularity, reset_ms));
				}
			} else {
				let remaining = limit.max_count - counter.count;
				if tightest.is_none_or(|t| remaining < t.remaining) {
					tightest = Some(RateLimitStatus {
						limit: limit.max_count,
						remaining,
						reset_secs: ceil_secs(reset_ms),
					});
				}
			}
		}

		if let Some((window, reset_ms)) = rejection {
			self.total_limited.fetch_add(1, Ordering::Relaxed);
			let retry_after = Duration::from_secs(ceil_secs(reset_ms).max(1));
			warn!(scope = scope, client = %client, window = window.as_str(), "Rate limit exceeded");
			return Err(RateLimitError::RateLimited { scope, window, retry_after });
		}

		Ok(tightest)
	}

	/// Drops counters whose window has ended, returns the number removed
	pub fn purge_expired(&self) -> usize {
		self.purge_expired_at(Utc::now())
	}

	pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
		let mut counters = self.counters.lock();
		purge_expired(&mut counters, now.timestamp_millis())
	}

	pub fn stats(&self) -> RateLimiterStats {
		RateLimiterStats {
			tracked_keys: self.counters.lock().len(),
			total_limited: self.total_limited.load(Ordering::Relaxed),
			total_untracked: self.total_untracked.load(Ordering::Relaxed),
		}
	}
}

fn purge_expired(counters: &mut HashMap<CounterKey, WindowCounter>, now_ms: i64) -> usize {
	let before = counters.len();
	counters.retain(|key, counter| counter.window_start + key.granularity.length_ms() > now_ms);
	before - counters.len()
}


// vim: ts=4
