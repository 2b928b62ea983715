//! User account operations

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::utils::*;
use mapmart_types::meta_adapter::*;
use mapmart_types::prelude::*;

const USER_COLUMNS: &str = "user_id, email, name, password_hash, profile_picture, is_admin,
	auth_provider, google_id, created_at";

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
	let provider: &str = row.try_get("auth_provider")?;
	Ok(User {
		user_id: UserId(row.try_get("user_id")?),
		email: row.try_get("email")?,
		name: row.try_get("name")?,
		password_hash: row.try_get("password_hash")?,
		google_id: row.try_get("google_id")?,
		profile_picture: row.try_get("profile_picture")?,
		is_admin: row.try_get("is_admin")?,
		auth_provider: AuthProvider::parse(provider)
			.map_err(|_| sqlx::Error::Decode(format!("invalid auth provider: {}", provider).into()))?,
		created_at: row.try_get("created_at").map(Timestamp)?,
	})
}

pub(crate) async fn create(db: &SqlitePool, user: CreateUser<'_>) -> ClResult<UserId> {
	let res = sqlx::query(
		"INSERT INTO users (email, name, password_hash, is_admin, auth_provider, created_at)
		VALUES (?, ?, ?, ?, ?, unixepoch())",
	)
	.bind(user.email)
	.bind(user.name)
	.bind(user.password_hash)
	.bind(user.is_admin)
	.bind(user.auth_provider.as_str())
	.execute(db)
	.await;

	match res {
		Ok(res) => Ok(UserId(res.last_insert_rowid())),
		Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
			Err(Error::Conflict("Email already registered".into()))
		}
		Err(err) => Err(db_err(err)),
	}
}

pub(crate) async fn read(db: &SqlitePool, user_id: UserId) -> ClResult<User> {
	let res = sqlx::query(&format!("SELECT {} FROM users WHERE user_id = ?", USER_COLUMNS))
		.bind(user_id.0)
		.fetch_one(db)
		.await;
	map_res(res, |row| user_from_row(&row))
}

pub(crate) async fn read_by_email(db: &SqlitePool, email: &str) -> ClResult<User> {
	let res = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
		.bind(email)
		.fetch_one(db)
		.await;
	map_res(res, |row| user_from_row(&row))
}

pub(crate) async fn read_by_google_id(db: &SqlitePool, google_id: &str) -> ClResult<User> {
	let res = sqlx::query(&format!("SELECT {} FROM users WHERE google_id = ?", USER_COLUMNS))
		.bind(google_id)
		.fetch_one(db)
		.await;
	map_res(res, |row| user_from_row(&row))
}

pub(crate) async fn update(db: &SqlitePool, user_id: UserId, data: &UpdateUserData) -> ClResult<()> {
	let mut query = sqlx::QueryBuilder::new("UPDATE users SET ");
	let mut has_updates = false;
	{
		let mut fields = query.separated(", ");
		if let Some(name) = &data.name {
			fields.push("name = ").push_bind_unseparated(name.as_ref());
			has_updates = true;
		}
		if let Some(picture) = &data.profile_picture {
			fields.push("profile_picture = ").push_bind_unseparated(picture.as_ref());
			has_updates = true;
		}
		if let Some(hash) = &data.password_hash {
			fields.push("password_hash = ").push_bind_unseparated(hash.as_ref());
			has_updates = true;
		}
		if let Some(is_admin) = data.is_admin {
			fields.push("is_admin = ").push_bind_unseparated(is_admin);
			has_updates = true;
		}
		if let Some(google_id) = &data.google_id {
			fields.push("google_id = ").push_bind_unseparated(google_id.as_ref());
			has_updates = true;
		}
		if let Some(provider) = data.auth_provider {
			fields.push("auth_provider = ").push_bind_unseparated(provider.as_str());
			has_updates = true;
		}
	}
	if !has_updates {
		return Ok(());
	}
	query.push(" WHERE user_id = ").push_bind(user_id.0);

	match query.build().execute(db).await {
		Ok(res) if res.rows_affected() == 0 => Err(Error::NotFound),
		Ok(_) => Ok(()),
		Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
			Err(Error::Conflict("Identity already linked to another account".into()))
		}
		Err(err) => Err(db_err(err)),
	}
}

/// Deletes the user and every record they own
pub(crate) async fn delete(db: &SqlitePool, user_id: UserId) -> ClResult<()> {
	let mut tx = db.begin().await.map_err(db_err)?;

	for table in ["chat_messages", "purchases", "comments", "notifications"] {
		sqlx::query(&format!("DELETE FROM {} WHERE user_id = ?", table))
			.bind(user_id.0)
			.execute(&mut *tx)
			.await
			.map_err(db_err)?;
	}

	let res = sqlx::query("DELETE FROM users WHERE user_id = ?")
		.bind(user_id.0)
		.execute(&mut *tx)
		.await
		.map_err(db_err)?;
	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}

	tx.commit().await.map_err(db_err)
}

pub(crate) async fn list(db: &SqlitePool, opts: &ListUserOptions) -> ClResult<Vec<User>> {
	let (limit, offset) = paging(opts.limit, opts.offset, 50, 500);
	let rows = sqlx::query(&format!(
		"SELECT {} FROM users ORDER BY user_id LIMIT ? OFFSET ?",
		USER_COLUMNS
	))
	.bind(limit)
	.bind(offset)
	.fetch_all(db)
	.await
	.map_err(db_err)?;

	collect_res(rows.iter().map(user_from_row))
}

pub(crate) async fn count(db: &SqlitePool) -> ClResult<u64> {
	let count: i64 = sqlx::query_scalar("SELECT count(*) FROM users")
		.fetch_one(db)
		.await
		.map_err(db_err)?;
	Ok(count as u64)
}

// vim: ts=4
