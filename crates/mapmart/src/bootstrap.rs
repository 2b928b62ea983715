//! Startup bootstrap: makes sure the configured administrator exists

use crate::meta_adapter::{AuthProvider, CreateUser, UpdateUserData};
use crate::prelude::*;
use mapmart_auth::hash_password;
use mapmart_auth::password::{normalize_email, validate_password};

/// Creates the admin account, or promotes an existing account with the same
/// address. An existing account keeps its password.
pub async fn ensure_admin(app: &App, email: &str, password: Box<str>) -> ClResult<UserId> {
	let email = normalize_email(email)?;

	match app.meta_adapter.read_user_by_email(&email).await {
		Ok(user) if user.is_admin => {
			debug!("Admin account {} present", email);
			Ok(user.user_id)
		}
		Ok(user) => {
			let update = UpdateUserData { is_admin: Some(true), ..Default::default() };
			app.meta_adapter.update_user(user.user_id, &update).await?;
			warn!("Promoted existing account {} to administrator", email);
			Ok(user.user_id)
		}
		Err(Error::NotFound) => {
			validate_password(&password)?;
			let password_hash = hash_password(&app.worker, password).await?;
			let user_id = app
				.meta_adapter
				.create_user(CreateUser {
					email: &email,
					name: "Admin",
					password_hash: Some(&password_hash),
					auth_provider: AuthProvider::Local,
					is_admin: true,
				})
				.await?;
			info!("Created administrator account {}", email);
			Ok(user_id)
		}
		Err(err) => Err(err),
	}
}

// vim: ts=4
