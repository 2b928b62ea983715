//! Login, registration and session handlers

use axum::{
	extract::State,
	http::{header, StatusCode},
	response::IntoResponse,
	Json,
};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::password::{check_password, hash_password, normalize_email, validate_password};
use crate::prelude::*;
use mapmart_core::session::SessionKeys;
use mapmart_core::{OptionalAuth, SessionCtx};
use mapmart_types::meta_adapter::{AuthProvider, CreateUser, User};
use mapmart_types::types::ApiResponse;
use mapmart_types::utils::escape_angle_brackets;

pub(crate) const DEFAULT_NAME: &str = "User";
pub(crate) const NAME_LENGTH: std::ops::RangeInclusive<usize> = 2..=50;

/// Plain acknowledgement body
#[derive(Debug, Serialize)]
pub struct MessageRes {
	pub message: &'static str,
}

// Login
//*******
#[derive(Debug, Deserialize)]
pub struct LoginReq {
	email: String,
	password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginRes {
	pub(crate) token: String,
	pub(crate) user: User,
}

/// POST /api/auth/login
pub async fn post_login(
	State(app): State<App>,
	Json(req): Json<LoginReq>,
) -> ClResult<impl IntoResponse> {
	let email = normalize_email(&req.email)?;
	if req.password.is_empty() {
		return Err(Error::ValidationError("Email and password required".into()));
	}

	let user = match app.meta_adapter.read_user_by_email(&email).await {
		Ok(user) => user,
		Err(Error::NotFound) => {
			warn!("Failed login attempt: {}", email);
			return Err(Error::Unauthorized);
		}
		Err(err) => return Err(err),
	};
	let Some(password_hash) = user.password_hash.clone() else {
		warn!("Password login attempted for {} account: {}", user.auth_provider.as_str(), email);
		return Err(Error::Unauthorized);
	};
	check_password(&app.worker, req.password.into(), password_hash)
		.await
		.inspect_err(|_| warn!("Failed login attempt: {}", email))?;

	let token = app.sessions.issue(SessionCtx { user_id: user.user_id, is_admin: user.is_admin })?;
	let cookie = app.sessions.cookie(&token);

	info!("Login: {}", email);
	Ok(([(header::SET_COOKIE, cookie)], Json(ApiResponse::new(LoginRes { token, user }))))
}

/// POST /api/auth/logout
pub async fn post_logout(OptionalAuth(auth): OptionalAuth) -> impl IntoResponse {
	if let Some(auth) = auth {
		info!("Logout: user {}", auth.user_id);
	}
	([(header::SET_COOKIE, SessionKeys::clear_cookie())], StatusCode::NO_CONTENT)
}

// Registration
//**************
#[derive(Debug, Deserialize)]
pub struct RegisterReq {
	email: String,
	password: String,
	name: Option<String>,
}

/// POST /api/auth/register
pub async fn post_register(
	State(app): State<App>,
	Json(req): Json<RegisterReq>,
) -> ClResult<(StatusCode, Json<ApiResponse<User>>)> {
	let email = normalize_email(&req.email)?;
	validate_password(&req.password)?;

	let name = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty()).unwrap_or(DEFAULT_NAME);
	if !NAME_LENGTH.contains(&name.chars().count()) {
		return Err(Error::ValidationError("Name must be 2 to 50 characters".into()));
	}
	let name = escape_angle_brackets(name);

	// Duplicates are rejected before hashing
	match app.meta_adapter.read_user_by_email(&email).await {
		Ok(_) => return Err(Error::Conflict("Email already registered".into())),
		Err(Error::NotFound) => {}
		Err(err) => return Err(err),
	}

	let password_hash = hash_password(&app.worker, req.password.into()).await?;
	let user_id = app
		.meta_adapter
		.create_user(CreateUser {
			email: &email,
			name: &name,
			password_hash: Some(&password_hash),
			auth_provider: AuthProvider::Local,
			is_admin: false,
		})
		.await?;
	let user = app.meta_adapter.read_user(user_id).await?;

	info!("New user registered: {}", email);
	Ok((StatusCode::CREATED, Json(ApiResponse::new(user))))
}

// Session
//*********
#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct SessionRes {
	#[serde(rename = "loggedIn")]
	logged_in: bool,
	user: Option<User>,
}

/// GET /api/auth/session
pub async fn get_session(
	State(app): State<App>,
	OptionalAuth(auth): OptionalAuth,
) -> ClResult<Json<ApiResponse<SessionRes>>> {
	let user = match auth {
		Some(auth) => match app.meta_adapter.read_user(auth.user_id).await {
			Ok(user) => Some(user),
			// Valid token, deleted account
			Err(Error::NotFound) => None,
			Err(err) => return Err(err),
		},
		None => None,
	};

	Ok(Json(ApiResponse::new(SessionRes { logged_in: user.is_some(), user })))
}

// vim: ts=4
