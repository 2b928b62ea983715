//! Chat message operations

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::utils::*;
use mapmart_types::meta_adapter::*;
use mapmart_types::prelude::*;

const CHAT_SELECT: &str = "SELECT m.msg_id, m.user_id, u.name, u.profile_picture, m.message, m.created_at
	FROM chat_messages m JOIN users u ON u.user_id = m.user_id";

fn message_from_row(row: &SqliteRow) -> Result<ChatMessage, sqlx::Error> {
	Ok(ChatMessage {
		msg_id: row.try_get("msg_id")?,
		user_id: UserId(row.try_get("user_id")?),
		user_name: row.try_get("name")?,
		user_picture: row.try_get("profile_picture")?,
		message: row.try_get("message")?,
		created_at: row.try_get("created_at").map(Timestamp)?,
	})
}

pub(crate) async fn create(
	db: &SqlitePool,
	user_id: UserId,
	message: &str,
	created_at: Timestamp,
) -> ClResult<ChatMessage> {
	let res = sqlx::query("INSERT INTO chat_messages (user_id, message, created_at) VALUES (?, ?, ?)")
		.bind(user_id.0)
		.bind(message)
		.bind(created_at.0)
		.execute(db)
		.await
		.map_err(db_err)?;

	let res = sqlx::query(&format!("{} WHERE m.msg_id = ?", CHAT_SELECT))
		.bind(res.last_insert_rowid())
		.fetch_one(db)
		.await;
	map_res(res, |row| message_from_row(&row))
}

pub(crate) async fn list(db: &SqlitePool, since: Timestamp, limit: u32) -> ClResult<Vec<ChatMessage>> {
	let rows = sqlx::query(&format!(
		"{} WHERE m.created_at >= ? ORDER BY m.created_at DESC, m.msg_id DESC LIMIT ?",
		CHAT_SELECT
	))
	.bind(since.0)
	.bind(i64::from(limit))
	.fetch_all(db)
	.await
	.map_err(db_err)?;

	collect_res(rows.iter().map(message_from_row))
}

pub(crate) async fn delete_before(db: &SqlitePool, cutoff: Timestamp) -> ClResult<u64> {
	let res = sqlx::query("DELETE FROM chat_messages WHERE created_at < ?")
		.bind(cutoff.0)
		.execute(db)
		.await
		.map_err(db_err)?;
	Ok(res.rows_affected())
}

pub(crate) async fn count(db: &SqlitePool) -> ClResult<u64> {
	let count: i64 = sqlx::query_scalar("SELECT count(*) FROM chat_messages")
		.fetch_one(db)
		.await
		.map_err(db_err)?;
	Ok(count as u64)
}

// vim: ts=4
