//! Rate Limiting Error Types
//!
//! Policy rejections produced by the rate limiter and the IP reputation
//! tracker. They carry their own response shape instead of going through
//! the generic `Error`.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::config::WindowGranularity;

#[derive(Debug)]
pub enum RateLimitError {
	/// A window counter of `scope` went over its maximum
	RateLimited {
		scope: &'static str,
		window: WindowGranularity,
		/// Time until the offending window ends
		retry_after: Duration,
	},
	/// Client address is on the block list
	Blocked {
		/// `None` for a permanent block
		remaining: Option<Duration>,
	},
	/// This request pushed the client over the suspicious threshold
	NewlyBlocked,
}

impl std::fmt::Display for RateLimitError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			RateLimitError::RateLimited { scope, window, retry_after } => {
				write!(
					f,
					"Rate limited on {} ({} window), retry after {:?}",
					scope,
					window.as_str(),
					retry_after
				)
			}
			RateLimitError::Blocked { remaining } => {
				if let Some(dur) = remaining {
					write!(f, "Address blocked for {:?}", dur)
				} else {
					write!(f, "Address blocked permanently")
				}
			}
			RateLimitError::NewlyBlocked => write!(f, "Address blocked after excessive requests"),
		}
	}
}

impl std::error::Error for RateLimitError {}

impl IntoResponse for RateLimitError {
	fn into_response(self) -> Response {
		match self {
			RateLimitError::RateLimited { scope, window, retry_after } => {
				let retry_secs = retry_after.as_secs().max(1);
				let body = serde_json::json!({
					"error": {
						"code": "E-RATE-LIMITED",
						"message": "Too many requests. Please slow down.",
						"details": {
							"scope": scope,
							"window": window.as_str(),
							"retryAfter": retry_secs
						}
					}
				});

				let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();

				if let Ok(val) = retry_secs.to_string().parse() {
					response.headers_mut().insert("Retry-After", val);
				}

				response
			}
			RateLimitError::Blocked { remaining } => {
				let body = serde_json::json!({
					"error": {
						"code": "E-IP-BLOCKED",
						"message": "Access denied.",
						"details": {
							"remainingSecs": remaining.map(|d| d.as_secs())
						}
					}
				});
				(StatusCode::FORBIDDEN, Json(body)).into_response()
			}
			RateLimitError::NewlyBlocked => {
				let body = serde_json::json!({
					"error": {
						"code": "E-IP-BLOCKED",
						"message": "Too many requests. Your address has been blocked."
					}
				});
				(StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
			}
		}
	}
}


// vim: ts=4
