//! Password reset
//!
//! A reset request stores a single-use token valid for one hour. Handing
//! the token to the user is left to the mail collaborator.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::handler::MessageRes;
use crate::password::{hash_password, normalize_email, validate_password};
use crate::prelude::*;
use mapmart_types::meta_adapter::UpdateUserData;
use mapmart_types::types::{now, ApiResponse};
use mapmart_types::utils::random_token;

const RESET_TOKEN_LENGTH: usize = 48;
const RESET_TOKEN_TTL: i64 = 3600;

const MSG_RESET_REQUESTED: &str = "If the address is registered, a reset link has been sent";
const MSG_RESET_DONE: &str = "Password has been reset";

fn invalid_token() -> Error {
	Error::ValidationError("Invalid or expired token".into())
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetReq {
	email: String,
}

/// POST /api/auth/password-reset
///
/// Answers the same way whether or not the address is registered.
pub async fn post_password_reset(
	State(app): State<App>,
	Json(req): Json<PasswordResetReq>,
) -> ClResult<Json<ApiResponse<MessageRes>>> {
	let email = normalize_email(&req.email)?;

	match app.meta_adapter.read_user_by_email(&email).await {
		Ok(user) => {
			let token = random_token(RESET_TOKEN_LENGTH)?;
			let expires_at = now().add_seconds(RESET_TOKEN_TTL);
			app.meta_adapter.create_password_reset_token(&token, &email, expires_at).await?;
			info!("Password reset token issued for user {}", user.user_id);
		}
		Err(Error::NotFound) => debug!("Password reset requested for unknown address"),
		Err(err) => return Err(err),
	}

	Ok(Json(ApiResponse::new(MessageRes { message: MSG_RESET_REQUESTED })))
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetCompleteReq {
	token: String,
	#[serde(rename = "newPassword")]
	new_password: String,
}

/// POST /api/auth/password-reset/complete
pub async fn post_password_reset_complete(
	State(app): State<App>,
	Json(req): Json<PasswordResetCompleteReq>,
) -> ClResult<Json<ApiResponse<MessageRes>>> {
	let token = req.token.trim();
	if token.is_empty() {
		return Err(invalid_token());
	}
	validate_password(&req.new_password)?;

	let reset = match app.meta_adapter.read_password_reset_token(token).await {
		Ok(reset) => reset,
		Err(Error::NotFound) => return Err(invalid_token()),
		Err(err) => return Err(err),
	};
	if !reset.is_valid_at(now()) {
		debug!("Rejected used or expired reset token");
		return Err(invalid_token());
	}

	let user = app.meta_adapter.read_user_by_email(&reset.email).await?;
	let password_hash = hash_password(&app.worker, req.new_password.into()).await?;
	app.meta_adapter
		.update_user(
			user.user_id,
			&UpdateUserData { password_hash: Some(password_hash), ..Default::default() },
		)
		.await?;
	app.meta_adapter.mark_password_reset_token_used(token).await?;

	info!("Password reset completed for user {}", user.user_id);
	Ok(Json(ApiResponse::new(MessageRes { message: MSG_RESET_DONE })))
}

// vim: ts=4
