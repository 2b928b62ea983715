//! Session tokens
//!
//! A session is an HS256 JWT carrying the user id and the admin flag. The
//! browser keeps it in the `session` cookie; API clients may send it as a
//! bearer token instead.

use std::time::Duration;

use axum::http::{header, HeaderMap};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::prelude::*;

pub const SESSION_COOKIE: &str = "session";

#[derive(Clone, Debug, Serialize, Deserialize)]
struct SessionClaims {
	sub: i64,
	#[serde(default)]
	adm: bool,
	exp: i64,
}

/// Authenticated caller of a request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SessionCtx {
	#[serde(rename = "userId")]
	pub user_id: UserId,
	#[serde(rename = "isAdmin")]
	pub is_admin: bool,
}

pub struct SessionKeys {
	encoding: EncodingKey,
	decoding: DecodingKey,
	ttl: Duration,
}

impl std::fmt::Debug for SessionKeys {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionKeys").field("ttl", &self.ttl).finish_non_exhaustive()
	}
}

impl SessionKeys {
	pub fn new(secret: &[u8], ttl: Duration) -> ClResult<Self> {
		if secret.len() < 16 {
			return Err(Error::ConfigError("session secret must be at least 16 bytes".into()));
		}
		Ok(Self {
			encoding: EncodingKey::from_secret(secret),
			decoding: DecodingKey::from_secret(secret),
			ttl,
		})
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	pub fn issue(&self, ctx: SessionCtx) -> ClResult<String> {
		self.issue_at(ctx, mapmart_types::types::now())
	}

	pub fn issue_at(&self, ctx: SessionCtx, now: Timestamp) -> ClResult<String> {
		let claims = SessionClaims {
			sub: ctx.user_id.0,
			adm: ctx.is_admin,
			exp: now.add_seconds(self.ttl.as_secs() as i64).0,
		};
		jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|err| {
			error!("Failed to sign session token: {}", err);
			Error::Internal("session token signing failed".into())
		})
	}

	pub fn verify(&self, token: &str) -> ClResult<SessionCtx> {
		let data = jsonwebtoken::decode::<SessionClaims>(
			token,
			&self.decoding,
			&Validation::new(Algorithm::HS256),
		)
		.map_err(|err| {
			debug!("Rejected session token: {}", err);
			Error::Unauthorized
		})?;

		Ok(SessionCtx { user_id: UserId(data.claims.sub), is_admin: data.claims.adm })
	}

	/// `Set-Cookie` value installing `token`
	pub fn cookie(&self, token: &str) -> String {
		format!(
			"{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
			SESSION_COOKIE,
			token,
			self.ttl.as_secs()
		)
	}

	/// `Set-Cookie` value removing the session
	pub fn clear_cookie() -> String {
		format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
	}
}

/// Session token from `Authorization: Bearer` or the session cookie
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
	let bearer = headers
		.get(header::AUTHORIZATION)
		.and_then(|h| h.to_str().ok())
		.and_then(|h| h.strip_prefix("Bearer "))
		.map(str::trim)
		.filter(|t| !t.is_empty());
	if bearer.is_some() {
		return bearer;
	}

	headers
		.get_all(header::COOKIE)
		.iter()
		.filter_map(|h| h.to_str().ok())
		.flat_map(|h| h.split(';'))
		.find_map(|pair| {
			let (name, value) = pair.trim().split_once('=')?;
			(name == SESSION_COOKIE && !value.is_empty()).then_some(value)
		})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn keys() -> SessionKeys {
		SessionKeys::new(b"0123456789abcdef0123456789abcdef", Duration::from_secs(3600)).unwrap()
	}

	#[test]
	fn test_issue_and_verify() {
		let keys = keys();
		let ctx = SessionCtx { user_id: UserId(42), is_admin: true };
		let token = keys.issue(ctx).unwrap();
		assert_eq!(keys.verify(&token).unwrap(), ctx);
	}

	#[test]
	fn test_expired_and_foreign_tokens_rejected() {
		let keys = keys();
		let ctx = SessionCtx { user_id: UserId(1), is_admin: false };
		let old = keys.issue_at(ctx, Timestamp(1_000_000)).unwrap();
		assert!(matches!(keys.verify(&old), Err(Error::Unauthorized)));

		let other = SessionKeys::new(b"another-secret-of-enough-length", Duration::from_secs(60)).unwrap();
		let token = other.issue(ctx).unwrap();
		assert!(matches!(keys.verify(&token), Err(Error::Unauthorized)));
		assert!(matches!(keys.verify("garbage"), Err(Error::Unauthorized)));
	}

	#[test]
	fn test_short_secret_rejected() {
		assert!(SessionKeys::new(b"short", Duration::from_secs(60)).is_err());
	}

	#[test]
	fn test_token_from_headers() {
		let mut headers = HeaderMap::new();
		headers.insert(header::COOKIE, "theme=dark; session=abc.def.ghi".parse().unwrap());
		assert_eq!(token_from_headers(&headers), Some("abc.def.ghi"));

		headers.insert(header::AUTHORIZATION, "Bearer xyz".parse().unwrap());
		assert_eq!(token_from_headers(&headers), Some("xyz"));

		assert_eq!(token_from_headers(&HeaderMap::new()), None);
	}
}

// vim: ts=4
