//! Account deletion

use axum::{
	extract::State,
	http::{header, StatusCode},
	response::IntoResponse,
	Json,
};
use serde::Deserialize;

use crate::password::check_password;
use crate::prelude::*;
use mapmart_core::session::SessionKeys;
use mapmart_core::Auth;
use mapmart_types::meta_adapter::AuthProvider;

#[derive(Debug, Default, Deserialize)]
pub struct DeleteAccountReq {
	password: Option<String>,
}

/// DELETE /api/account
///
/// Local accounts confirm with their password. Administrator accounts
/// cannot be deleted this way.
pub async fn delete_account(
	State(app): State<App>,
	Auth(auth): Auth,
	Json(req): Json<DeleteAccountReq>,
) -> ClResult<impl IntoResponse> {
	let user = app.meta_adapter.read_user(auth.user_id).await?;
	if user.is_admin {
		warn!("Refused deletion of administrator account {}", user.user_id);
		return Err(Error::PermissionDenied);
	}

	if user.auth_provider == AuthProvider::Local {
		let Some(password) = req.password.filter(|p| !p.is_empty()) else {
			return Err(Error::ValidationError("Password required".into()));
		};
		let Some(password_hash) = user.password_hash.clone() else {
			return Err(Error::PermissionDenied);
		};
		check_password(&app.worker, password.into(), password_hash).await.map_err(|_| {
			warn!("Account deletion with wrong password for user {}", user.user_id);
			Error::PermissionDenied
		})?;
	}

	app.meta_adapter.delete_user(user.user_id).await?;
	mapmart_profile::picture::remove_custom_picture(&app, &user.profile_picture).await;

	info!("Account deleted: user {}", user.user_id);
	Ok(([(header::SET_COOKIE, SessionKeys::clear_cookie())], StatusCode::NO_CONTENT))
}

// vim: ts=4
