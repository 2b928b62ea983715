//! Profile handlers

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::prelude::*;
use mapmart_core::Auth;
use mapmart_types::meta_adapter::{UpdateUserData, User};
use mapmart_types::types::ApiResponse;
use mapmart_types::utils::escape_angle_brackets;

/// GET /api/profile
pub async fn get_profile(
	State(app): State<App>,
	Auth(auth): Auth,
) -> ClResult<Json<ApiResponse<User>>> {
	let user = app.meta_adapter.read_user(auth.user_id).await?;
	Ok(Json(ApiResponse::new(user)))
}

#[derive(Debug, Deserialize)]
pub struct ProfilePatch {
	name: Option<String>,
}

/// PATCH /api/profile
pub async fn patch_profile(
	State(app): State<App>,
	Auth(auth): Auth,
	Json(patch): Json<ProfilePatch>,
) -> ClResult<Json<ApiResponse<User>>> {
	let Some(name) = patch.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
		return Err(Error::ValidationError("Nothing to update".into()));
	};
	let len = name.chars().count();
	if !(2..=50).contains(&len) {
		return Err(Error::ValidationError("Name must be 2 to 50 characters".into()));
	}

	let update = UpdateUserData { name: Some(escape_angle_brackets(name).into()), ..Default::default() };
	app.meta_adapter.update_user(auth.user_id, &update).await?;
	let user = app.meta_adapter.read_user(auth.user_id).await?;

	info!("User {} updated their profile", auth.user_id);
	Ok(Json(ApiResponse::new(user)))
}

// vim: ts=4
