//! Map comment operations

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::utils::*;
use mapmart_types::meta_adapter::*;
use mapmart_types::prelude::*;

const COMMENT_SELECT: &str = "SELECT c.comment_id, c.map_id, c.user_id, u.name, u.profile_picture,
	c.content, c.rating, c.created_at
	FROM comments c JOIN users u ON u.user_id = c.user_id";

fn comment_from_row(row: &SqliteRow) -> Result<Comment, sqlx::Error> {
	Ok(Comment {
		comment_id: row.try_get("comment_id")?,
		map_id: row.try_get("map_id")?,
		user_id: UserId(row.try_get("user_id")?),
		user_name: row.try_get("name")?,
		user_picture: row.try_get("profile_picture")?,
		text: row.try_get("content")?,
		rating: row.try_get("rating")?,
		created_at: row.try_get("created_at").map(Timestamp)?,
	})
}

pub(crate) async fn create(db: &SqlitePool, comment: CreateComment<'_>) -> ClResult<Comment> {
	let res = sqlx::query(
		"INSERT INTO comments (user_id, map_id, content, rating, created_at)
		VALUES (?, ?, ?, ?, unixepoch())",
	)
	.bind(comment.user_id.0)
	.bind(comment.map_id)
	.bind(comment.text)
	.bind(comment.rating)
	.execute(db)
	.await;

	let comment_id = match res {
		Ok(res) => res.last_insert_rowid(),
		Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
			return Err(Error::Conflict("Map already commented by this user".into()));
		}
		Err(sqlx::Error::Database(err)) if err.is_foreign_key_violation() => {
			return Err(Error::NotFound);
		}
		Err(err) => return Err(db_err(err)),
	};

	let res = sqlx::query(&format!("{} WHERE c.comment_id = ?", COMMENT_SELECT))
		.bind(comment_id)
		.fetch_one(db)
		.await;
	map_res(res, |row| comment_from_row(&row))
}

pub(crate) async fn list_by_map(db: &SqlitePool, map_id: i64) -> ClResult<Vec<Comment>> {
	let rows = sqlx::query(&format!(
		"{} WHERE c.map_id = ? ORDER BY c.created_at DESC, c.comment_id DESC",
		COMMENT_SELECT
	))
	.bind(map_id)
	.fetch_all(db)
	.await
	.map_err(db_err)?;

	collect_res(rows.iter().map(comment_from_row))
}

pub(crate) async fn delete(db: &SqlitePool, comment_id: i64) -> ClResult<()> {
	let res = sqlx::query("DELETE FROM comments WHERE comment_id = ?")
		.bind(comment_id)
		.execute(db)
		.await
		.map_err(db_err)?;
	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	Ok(())
}

pub(crate) async fn count(db: &SqlitePool) -> ClResult<u64> {
	let count: i64 = sqlx::query_scalar("SELECT count(*) FROM comments")
		.fetch_one(db)
		.await
		.map_err(db_err)?;
	Ok(count as u64)
}

// vim: ts=4
