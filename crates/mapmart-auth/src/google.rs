//! Google sign-in

use axum::{extract::State, http::header, response::IntoResponse, Json};
use serde::Deserialize;

use crate::handler::{LoginRes, DEFAULT_NAME, NAME_LENGTH};
use crate::password::normalize_email;
use crate::prelude::*;
use mapmart_core::id_token::IdentityClaims;
use mapmart_core::SessionCtx;
use mapmart_profile::picture::remove_custom_picture;
use mapmart_types::meta_adapter::{AuthProvider, CreateUser, UpdateUserData, User};
use mapmart_types::types::ApiResponse;
use mapmart_types::utils::escape_angle_brackets;

#[derive(Debug, Deserialize)]
pub struct GoogleLoginReq {
	token: String,
}

/// Display name for a new account: the Google profile name, or the local
/// part of the email address
fn account_name(identity: &IdentityClaims) -> String {
	let name = identity
		.name
		.as_deref()
		.map(str::trim)
		.filter(|n| NAME_LENGTH.contains(&n.chars().count()))
		.or_else(|| {
			identity
				.email
				.split_once('@')
				.map(|(local, _)| local)
				.filter(|n| NAME_LENGTH.contains(&n.chars().count()))
		})
		.unwrap_or(DEFAULT_NAME);
	escape_angle_brackets(name)
}

async fn find_user(app: &App, identity: &IdentityClaims, email: &str) -> ClResult<Option<User>> {
	match app.meta_adapter.read_user_by_google_id(&identity.subject).await {
		Ok(user) => return Ok(Some(user)),
		Err(Error::NotFound) => {}
		Err(err) => return Err(err),
	}
	match app.meta_adapter.read_user_by_email(email).await {
		Ok(user) => Ok(Some(user)),
		Err(Error::NotFound) => Ok(None),
		Err(err) => Err(err),
	}
}

/// POST /api/auth/google
pub async fn post_google_login(
	State(app): State<App>,
	Json(req): Json<GoogleLoginReq>,
) -> ClResult<impl IntoResponse> {
	let Some(verifier) = app.opts.google_signin.clone() else {
		return Err(Error::ServiceUnavailable("Google sign-in is not configured".into()));
	};
	if req.token.is_empty() {
		return Err(Error::ValidationError("Token required".into()));
	}
	let identity = verifier.verify(&req.token)?;
	let email = normalize_email(&identity.email)?;

	let link = UpdateUserData {
		google_id: Some(identity.subject.clone()),
		auth_provider: Some(AuthProvider::Google),
		profile_picture: identity.picture.clone(),
		..UpdateUserData::default()
	};

	let user_id = match find_user(&app, &identity, &email).await? {
		Some(user) => {
			app.meta_adapter.update_user(user.user_id, &link).await?;
			if identity.picture.is_some() {
				remove_custom_picture(&app, &user.profile_picture).await;
			}
			if user.google_id.is_none() {
				info!("Linked Google account to {}", email);
			}
			user.user_id
		}
		None => {
			let name = account_name(&identity);
			let user_id = app
				.meta_adapter
				.create_user(CreateUser {
					email: &email,
					name: &name,
					password_hash: None,
					auth_provider: AuthProvider::Google,
					is_admin: false,
				})
				.await?;
			app.meta_adapter.update_user(user_id, &link).await?;
			info!("New user registered with Google: {}", email);
			user_id
		}
	};

	let user = app.meta_adapter.read_user(user_id).await?;
	let token = app.sessions.issue(SessionCtx { user_id: user.user_id, is_admin: user.is_admin })?;
	let cookie = app.sessions.cookie(&token);

	info!("Google login: {}", email);
	Ok(([(header::SET_COOKIE, cookie)], Json(ApiResponse::new(LoginRes { token, user }))))
}


// vim: ts=4
