//! Rate Limiting Configuration
//!
//! The limits table is a typed structure, validated once at startup.

use chrono::TimeDelta;
use serde::Serialize;

use crate::prelude::*;

/// Scope names used by the router
pub mod scope {
	pub const LOGIN: &str = "login";
	pub const REGISTER: &str = "register";
	pub const PASSWORD_RESET_REQUEST: &str = "password_reset_request";
	pub const PASSWORD_RESET_COMPLETE: &str = "password_reset_complete";
	pub const OAUTH_LOGIN: &str = "oauth_login";
	pub const PROFILE_PICTURE_UPLOAD: &str = "profile_picture_upload";
	pub const ACCOUNT_DELETION: &str = "account_deletion";

	// Routes below use the default limits, each with its own budget
	pub const SESSION: &str = "session";
	pub const LOGOUT: &str = "logout";
	pub const MAP_LIST: &str = "map_list";
	pub const MAP_DETAIL: &str = "map_detail";
	pub const MAP_COMMENTS: &str = "map_comments";
	pub const COMMENT_POST: &str = "comment_post";
	pub const CHAT_HISTORY: &str = "chat_history";
	pub const CHAT_WS: &str = "chat_ws";
	pub const HEALTH: &str = "health";
	pub const PROFILE: &str = "profile";
	pub const ADMIN: &str = "admin";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowGranularity {
	Minute,
	Hour,
	Day,
}

impl WindowGranularity {
	pub fn as_str(self) -> &'static str {
		match self {
			WindowGranularity::Minute => "minute",
			WindowGranularity::Hour => "hour",
			WindowGranularity::Day => "day",
		}
	}

	pub fn length(self) -> TimeDelta {
		match self {
			WindowGranularity::Minute => TimeDelta::minutes(1),
			WindowGranularity::Hour => TimeDelta::hours(1),
			WindowGranularity::Day => TimeDelta::days(1),
		}
	}

	/// Window length in milliseconds
	pub fn length_ms(self) -> i64 {
		self.length().num_milliseconds()
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowLimit {
	pub granularity: WindowGranularity,
	pub max_count: u32,
}

impl WindowLimit {
	pub const fn per_minute(max_count: u32) -> Self {
		Self { granularity: WindowGranularity::Minute, max_count }
	}

	pub const fn per_hour(max_count: u32) -> Self {
		Self { granularity: WindowGranularity::Hour, max_count }
	}

	pub const fn per_day(max_count: u32) -> Self {
		Self { granularity: WindowGranularity::Day, max_count }
	}
}

/// Override for one scope. When present it replaces the defaults entirely.
#[derive(Clone, Debug)]
pub struct RouteLimits {
	pub scope: &'static str,
	pub limits: Vec<WindowLimit>,
}

impl RouteLimits {
	pub fn new(scope: &'static str, limits: Vec<WindowLimit>) -> Self {
		Self { scope, limits }
	}
}

#[derive(Clone, Debug)]
pub struct RateLimitConfig {
	pub default_limits: Vec<WindowLimit>,
	pub route_limits: Vec<RouteLimits>,
	/// Upper bound on live counters. When reached and nothing can be
	/// reclaimed, new clients pass untracked.
	pub max_tracked_keys: usize,
}

impl Default for RateLimitConfig {
	fn default() -> Self {
		Self {
			default_limits: vec![
				WindowLimit::per_day(500),
				WindowLimit::per_hour(100),
				WindowLimit::per_minute(20),
			],
			route_limits: vec![
				RouteLimits::new(scope::LOGIN, vec![WindowLimit::per_minute(5)]),
				RouteLimits::new(scope::REGISTER, vec![WindowLimit::per_hour(3)]),
				RouteLimits::new(scope::PASSWORD_RESET_REQUEST, vec![WindowLimit::per_hour(3)]),
				RouteLimits::new(scope::PASSWORD_RESET_COMPLETE, vec![WindowLimit::per_hour(5)]),
				RouteLimits::new(scope::OAUTH_LOGIN, vec![WindowLimit::per_minute(10)]),
				RouteLimits::new(scope::PROFILE_PICTURE_UPLOAD, vec![WindowLimit::per_hour(10)]),
				RouteLimits::new(scope::ACCOUNT_DELETION, vec![WindowLimit::per_day(2)]),
			],
			max_tracked_keys: 200_000,
		}
	}
}

impl RateLimitConfig {
	/// Limits that apply to `scope`
	pub fn limits_for(&self, scope: &str) -> &[WindowLimit] {
		self.route_limits
			.iter()
			.find(|r| r.scope == scope)
			.map_or(self.default_limits.as_slice(), |r| r.limits.as_slice())
	}

	pub fn validate(&self) -> ClResult<()> {
		validate_limits("default", &self.default_limits)?;

		let mut seen: Vec<&str> = Vec::with_capacity(self.route_limits.len());
		for route in &self.route_limits {
			if seen.contains(&route.scope) {
				return Err(Error::ConfigError(format!(
					"duplicate rate limit scope: {}",
					route.scope
				)));
			}
			seen.push(route.scope);
			validate_limits(route.scope, &route.limits)?;
		}

		if self.max_tracked_keys == 0 {
			return Err(Error::ConfigError("max_tracked_keys must be positive".into()));
		}
		Ok(())
	}
}

fn validate_limits(scope: &str, limits: &[WindowLimit]) -> ClResult<()> {
	if limits.is_empty() {
		return Err(Error::ConfigError(format!("no limits configured for scope {}", scope)));
	}
	for (i, limit) in limits.iter().enumerate() {
		if limit.max_count == 0 {
			return Err(Error::ConfigError(format!(
				"zero {} limit for scope {}",
				limit.granularity.as_str(),
				scope
			)));
		}
		if limits[..i].iter().any(|l| l.granularity == limit.granularity) {
			return Err(Error::ConfigError(format!(
				"duplicate {} limit for scope {}",
				limit.granularity.as_str(),
				scope
			)));
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_config_is_valid() {
		assert!(RateLimitConfig::default().validate().is_ok());
	}

	#[test]
	fn test_override_replaces_defaults() {
		let config = RateLimitConfig::default();
		assert_eq!(config.limits_for(scope::LOGIN), &[WindowLimit::per_minute(5)]);
		assert_eq!(config.limits_for(scope::ACCOUNT_DELETION), &[WindowLimit::per_day(2)]);
		assert_eq!(config.limits_for(scope::MAP_LIST).len(), 3);
		assert_eq!(config.limits_for("unknown").len(), 3);
	}

	#[test]
	fn test_validate_rejects_zero_and_duplicates() {
		let mut config = RateLimitConfig::default();
		config.route_limits.push(RouteLimits::new("x", vec![WindowLimit::per_hour(0)]));
		assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

		let mut config = RateLimitConfig::default();
		config.route_limits.push(RouteLimits::new(
			"x",
			vec![WindowLimit::per_hour(1), WindowLimit::per_hour(2)],
		));
		assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

		let mut config = RateLimitConfig::default();
		config.route_limits.push(RouteLimits::new(scope::LOGIN, vec![WindowLimit::per_hour(1)]));
		assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
	}
}

// vim: ts=4
