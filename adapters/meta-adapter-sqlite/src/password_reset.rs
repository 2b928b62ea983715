//! Password reset token operations

use sqlx::{Row, SqlitePool};

use crate::utils::*;
use mapmart_types::meta_adapter::*;
use mapmart_types::prelude::*;

pub(crate) async fn create(
	db: &SqlitePool,
	token: &str,
	email: &str,
	expires_at: Timestamp,
) -> ClResult<()> {
	sqlx::query(
		"INSERT INTO password_reset_tokens (token, email, expires_at, used, created_at)
		VALUES (?, ?, ?, 0, unixepoch())",
	)
	.bind(token)
	.bind(email)
	.bind(expires_at.0)
	.execute(db)
	.await
	.map_err(db_err)?;
	Ok(())
}

pub(crate) async fn read(db: &SqlitePool, token: &str) -> ClResult<PasswordResetToken> {
	let res = sqlx::query(
		"SELECT token, email, expires_at, used, created_at FROM password_reset_tokens WHERE token = ?",
	)
	.bind(token)
	.fetch_one(db)
	.await;

	map_res(res, |row| {
		Ok(PasswordResetToken {
			token: row.try_get("token")?,
			email: row.try_get("email")?,
			expires_at: row.try_get("expires_at").map(Timestamp)?,
			used: row.try_get("used")?,
			created_at: row.try_get("created_at").map(Timestamp)?,
		})
	})
}

pub(crate) async fn mark_used(db: &SqlitePool, token: &str) -> ClResult<()> {
	let res = sqlx::query("UPDATE password_reset_tokens SET used = 1 WHERE token = ?")
		.bind(token)
		.execute(db)
		.await
		.map_err(db_err)?;
	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	Ok(())
}

pub(crate) async fn delete_expired(db: &SqlitePool, now: Timestamp) -> ClResult<u64> {
	let res = sqlx::query("DELETE FROM password_reset_tokens WHERE expires_at <= ? OR used = 1")
		.bind(now.0)
		.execute(db)
		.await
		.map_err(db_err)?;
	Ok(res.rows_affected())
}

// vim: ts=4
