//! Custom extractors for MapMart-specific data

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::prelude::*;
use crate::session::SessionCtx;

// Auth //
//******//
/// Authenticated session, installed by the `optional_auth` middleware
#[derive(Debug, Clone, Copy)]
pub struct Auth(pub SessionCtx);

impl<S> FromRequestParts<S> for Auth
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		parts.extensions.get::<Auth>().copied().ok_or(Error::Unauthorized)
	}
}

// OptionalAuth //
//***************//
/// Optional auth extractor that doesn't fail if auth is missing
#[derive(Debug, Clone, Copy)]
pub struct OptionalAuth(pub Option<SessionCtx>);

impl<S> FromRequestParts<S> for OptionalAuth
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		Ok(OptionalAuth(parts.extensions.get::<Auth>().map(|a| a.0)))
	}
}

// vim: ts=4
