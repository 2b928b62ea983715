//! Admin permission middleware

use axum::{
	extract::{Request, State},
	middleware::Next,
	response::Response,
};

use mapmart_core::extract::Auth;

use crate::prelude::*;

/// Middleware that lets only administrators through
///
/// The admin flag in the session is confirmed against the user record, so a
/// demoted or deleted admin loses access before their token expires.
pub async fn require_admin(
	State(app): State<App>,
	Auth(auth): Auth,
	req: Request,
	next: Next,
) -> Result<Response, Error> {
	if !auth.is_admin {
		warn!(user_id = %auth.user_id, "Admin permission denied");
		return Err(Error::PermissionDenied);
	}

	let user = match app.meta_adapter.read_user(auth.user_id).await {
		Ok(user) => user,
		Err(Error::NotFound) => return Err(Error::Unauthorized),
		Err(err) => return Err(err),
	};
	if !user.is_admin {
		warn!(user_id = %auth.user_id, "Admin permission denied - flag revoked");
		return Err(Error::PermissionDenied);
	}

	Ok(next.run(req).await)
}

// vim: ts=4
