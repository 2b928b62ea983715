//! Password hashing
//!
//! bcrypt is CPU bound: hashing and verification run on the worker pool.

use mapmart_types::worker::WorkerPool;

use crate::prelude::*;

const BCRYPT_COST: u32 = 10;
pub const MIN_PASSWORD_LENGTH: usize = 8;

fn hash_password_sync(password: Box<str>) -> ClResult<Box<str>> {
	let hash = bcrypt::hash(password.as_ref(), BCRYPT_COST).map_err(|err| {
		error!("bcrypt hash failed: {}", err);
		Error::Internal("password hashing failed".into())
	})?;

	Ok(hash.into())
}

pub async fn hash_password(worker: &WorkerPool, password: Box<str>) -> ClResult<Box<str>> {
	worker.try_run_immed(move || hash_password_sync(password)).await
}

fn check_password_sync(password: Box<str>, password_hash: Box<str>) -> ClResult<()> {
	let res = bcrypt::verify(password.as_ref(), &password_hash).map_err(|err| {
		warn!("Unusable password hash: {}", err);
		Error::Unauthorized
	})?;
	if res { Ok(()) } else { Err(Error::Unauthorized) }
}

/// Fails with `Unauthorized` when the password does not match
pub async fn check_password(
	worker: &WorkerPool,
	password: Box<str>,
	password_hash: Box<str>,
) -> ClResult<()> {
	worker.try_run_immed(move || check_password_sync(password, password_hash)).await
}

pub fn validate_password(password: &str) -> ClResult<()> {
	if password.chars().count() < MIN_PASSWORD_LENGTH {
		return Err(Error::ValidationError(format!(
			"Password must be at least {} characters",
			MIN_PASSWORD_LENGTH
		)));
	}
	Ok(())
}

/// Lower-cased, trimmed e-mail address, if it looks like one
pub fn normalize_email(email: &str) -> ClResult<String> {
	let email = email.trim().to_lowercase();
	let valid = match email.split_once('@') {
		Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
		None => false,
	};
	if !valid {
		return Err(Error::ValidationError("Invalid email address".into()));
	}
	Ok(email)
}


// vim: ts=4
