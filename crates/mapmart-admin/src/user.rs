//! User moderation and dashboard statistics

use axum::{
	extract::{Path, Query, State},
	Json,
};
use serde::{Deserialize, Serialize};

use crate::ip::AdminActionRes;
use crate::prelude::*;
use mapmart_auth::password::{hash_password, validate_password};
use mapmart_core::Auth;
use mapmart_types::meta_adapter::{AuthProvider, ListUserOptions, UpdateUserData, User};
use mapmart_types::types::{ApiResponse, UserId};

#[derive(Debug, Serialize)]
pub struct UserListRes {
	users: Vec<User>,
	total: u64,
}

/// GET /api/admin/users
pub async fn list_users(
	State(app): State<App>,
	Query(opts): Query<ListUserOptions>,
) -> ClResult<Json<ApiResponse<UserListRes>>> {
	let users = app.meta_adapter.list_users(&opts).await?;
	let total = app.meta_adapter.count_users().await?;
	Ok(Json(ApiResponse::new(UserListRes { users, total })))
}

/// POST /api/admin/users/{user_id}/toggle-admin
///
/// A promoted user gets admin access with their next login; a demoted one
/// loses it at once.
pub async fn post_toggle_admin(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(user_id): Path<UserId>,
) -> ClResult<Json<AdminActionRes>> {
	if user_id == auth.user_id {
		return Err(Error::ValidationError("You cannot change your own admin role".into()));
	}
	let user = app.meta_adapter.read_user(user_id).await?;
	let is_admin = !user.is_admin;
	let update = UpdateUserData { is_admin: Some(is_admin), ..Default::default() };
	app.meta_adapter.update_user(user_id, &update).await?;

	let role = if is_admin { "an administrator" } else { "a regular user" };
	warn!("Admin {} made user {} {}", auth.user_id, user_id, role);
	Ok(Json(AdminActionRes::new(format!("{} is now {}", user.name, role))))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordReq {
	#[serde(rename = "newPassword")]
	new_password: String,
}

/// POST /api/admin/users/{user_id}/password
pub async fn post_change_password(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(user_id): Path<UserId>,
	Json(req): Json<ChangePasswordReq>,
) -> ClResult<Json<AdminActionRes>> {
	validate_password(&req.new_password)?;
	let user = app.meta_adapter.read_user(user_id).await?;
	if user.auth_provider == AuthProvider::Google {
		return Err(Error::ValidationError("Cannot change the password of a Google account".into()));
	}

	let password_hash = hash_password(&app.worker, req.new_password.into()).await?;
	let update = UpdateUserData { password_hash: Some(password_hash), ..Default::default() };
	app.meta_adapter.update_user(user_id, &update).await?;

	warn!("Admin {} changed the password of user {}", auth.user_id, user_id);
	Ok(Json(AdminActionRes::new(format!("Password updated for {}", user.name))))
}

#[derive(Debug, Serialize)]
pub struct StatsRes {
	users: u64,
	maps: u64,
	comments: u64,
	#[serde(rename = "chatMessages")]
	chat_messages: u64,
	#[serde(rename = "blockedIps")]
	blocked_ips: usize,
	#[serde(rename = "chatConnections")]
	chat_connections: usize,
}

/// GET /api/admin/stats
pub async fn get_stats(State(app): State<App>) -> ClResult<Json<ApiResponse<StatsRes>>> {
	let stats = StatsRes {
		users: app.meta_adapter.count_users().await?,
		maps: app.meta_adapter.count_maps().await?,
		comments: app.meta_adapter.count_comments().await?,
		chat_messages: app.meta_adapter.count_chat_messages().await?,
		blocked_ips: app.ip_reputation.list().count,
		chat_connections: app.chat_room.stats().await.connections,
	};
	Ok(Json(ApiResponse::new(stats)))
}

// vim: ts=4
