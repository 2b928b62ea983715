//! SQLite implementation of the MapMart `MetaAdapter`

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

mod chat;
mod comment;
mod map;
mod password_reset;
mod schema;
mod user;
mod utils;

use async_trait::async_trait;
use sqlx::sqlite::{self, SqlitePool};
use std::path::Path;

use mapmart_types::meta_adapter::{self, MetaAdapter};
use mapmart_types::prelude::*;

pub const DB_FILE: &str = "meta.db";

#[derive(Debug)]
pub struct MetaAdapterSqlite {
	db: SqlitePool,
}

impl MetaAdapterSqlite {
	/// Opens (or creates) `meta.db` inside `db_dir`
	pub async fn new(db_dir: impl AsRef<Path>) -> ClResult<Self> {
		let db_dir = db_dir.as_ref();
		tokio::fs::create_dir_all(db_dir).await?;

		let opts = sqlite::SqliteConnectOptions::new()
			.filename(db_dir.join(DB_FILE))
			.create_if_missing(true)
			.foreign_keys(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(|err| error!("DbError: {:#?}", err))
			.or(Err(Error::DbError))?;

		schema::init_db(&db)
			.await
			.inspect_err(|err| error!("DbError: {:#?}", err))
			.or(Err(Error::DbError))?;

		Ok(Self { db })
	}
}

#[async_trait]
impl MetaAdapter for MetaAdapterSqlite {
	async fn ping(&self) -> ClResult<()> {
		sqlx::query("SELECT 1").execute(&self.db).await.map_err(utils::db_err)?;
		Ok(())
	}

	// Users
	//*******
	async fn create_user(&self, user: meta_adapter::CreateUser<'_>) -> ClResult<UserId> {
		user::create(&self.db, user).await
	}

	async fn read_user(&self, user_id: UserId) -> ClResult<meta_adapter::User> {
		user::read(&self.db, user_id).await
	}

	async fn read_user_by_email(&self, email: &str) -> ClResult<meta_adapter::User> {
		user::read_by_email(&self.db, email).await
	}

	async fn read_user_by_google_id(&self, google_id: &str) -> ClResult<meta_adapter::User> {
		user::read_by_google_id(&self.db, google_id).await
	}

	async fn update_user(
		&self,
		user_id: UserId,
		data: &meta_adapter::UpdateUserData,
	) -> ClResult<()> {
		user::update(&self.db, user_id, data).await
	}

	async fn delete_user(&self, user_id: UserId) -> ClResult<()> {
		user::delete(&self.db, user_id).await
	}

	async fn list_users(
		&self,
		opts: &meta_adapter::ListUserOptions,
	) -> ClResult<Vec<meta_adapter::User>> {
		user::list(&self.db, opts).await
	}

	async fn count_users(&self) -> ClResult<u64> {
		user::count(&self.db).await
	}

	// Maps
	//******
	async fn create_map(&self, map: meta_adapter::CreateMap<'_>) -> ClResult<i64> {
		map::create(&self.db, map).await
	}

	async fn read_map(&self, map_id: i64) -> ClResult<meta_adapter::Map> {
		map::read(&self.db, map_id).await
	}

	async fn list_maps(
		&self,
		opts: &meta_adapter::ListMapOptions,
	) -> ClResult<Vec<meta_adapter::Map>> {
		map::list(&self.db, opts).await
	}

	async fn count_maps(&self) -> ClResult<u64> {
		map::count(&self.db).await
	}

	async fn update_map(&self, map_id: i64, data: &meta_adapter::UpdateMapData) -> ClResult<()> {
		map::update(&self.db, map_id, data).await
	}

	async fn delete_map(&self, map_id: i64) -> ClResult<()> {
		map::delete(&self.db, map_id).await
	}

	// Comments
	//**********
	async fn create_comment(
		&self,
		comment: meta_adapter::CreateComment<'_>,
	) -> ClResult<meta_adapter::Comment> {
		comment::create(&self.db, comment).await
	}

	async fn list_map_comments(&self, map_id: i64) -> ClResult<Vec<meta_adapter::Comment>> {
		comment::list_by_map(&self.db, map_id).await
	}

	async fn delete_comment(&self, comment_id: i64) -> ClResult<()> {
		comment::delete(&self.db, comment_id).await
	}

	async fn count_comments(&self) -> ClResult<u64> {
		comment::count(&self.db).await
	}

	// Chat
	//******
	async fn create_chat_message(
		&self,
		user_id: UserId,
		message: &str,
		created_at: Timestamp,
	) -> ClResult<meta_adapter::ChatMessage> {
		chat::create(&self.db, user_id, message, created_at).await
	}

	async fn list_chat_messages(
		&self,
		since: Timestamp,
		limit: u32,
	) -> ClResult<Vec<meta_adapter::ChatMessage>> {
		chat::list(&self.db, since, limit).await
	}

	async fn delete_chat_messages_before(&self, cutoff: Timestamp) -> ClResult<u64> {
		chat::delete_before(&self.db, cutoff).await
	}

	async fn count_chat_messages(&self) -> ClResult<u64> {
		chat::count(&self.db).await
	}

	// Password reset tokens
	//***********************
	async fn create_password_reset_token(
		&self,
		token: &str,
		email: &str,
		expires_at: Timestamp,
	) -> ClResult<()> {
		password_reset::create(&self.db, token, email, expires_at).await
	}

	async fn read_password_reset_token(
		&self,
		token: &str,
	) -> ClResult<meta_adapter::PasswordResetToken> {
		password_reset::read(&self.db, token).await
	}

	async fn mark_password_reset_token_used(&self, token: &str) -> ClResult<()> {
		password_reset::mark_used(&self.db, token).await
	}

	async fn delete_expired_password_reset_tokens(&self, now: Timestamp) -> ClResult<u64> {
		password_reset::delete_expired(&self.db, now).await
	}
}

// vim: ts=4
