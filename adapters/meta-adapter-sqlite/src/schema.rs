//! Database schema initialization

use sqlx::SqlitePool;

/// Initialize the database schema with all required tables and indexes
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	// Users
	//*******
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS users (
		user_id integer NOT NULL,
		email text NOT NULL,
		name text NOT NULL,
		password_hash text,
		profile_picture text NOT NULL DEFAULT 'default.jpg',
		is_admin boolean NOT NULL DEFAULT 0,
		auth_provider text NOT NULL DEFAULT 'local',
		google_id text,
		created_at integer NOT NULL DEFAULT (unixepoch()),
		PRIMARY KEY(user_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email)")
		.execute(&mut *tx)
		.await?;
	sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_users_google_id ON users(google_id)")
		.execute(&mut *tx)
		.await?;

	// Catalog
	//*********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS maps (
		map_id integer NOT NULL,
		title text NOT NULL,
		description text NOT NULL,
		price real NOT NULL,
		image text NOT NULL,
		features text,
		is_featured boolean NOT NULL DEFAULT 0,
		is_premium boolean NOT NULL DEFAULT 0,
		created_at integer NOT NULL DEFAULT (unixepoch()),
		PRIMARY KEY(map_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Records owned by users. Purchase and notification handlers live outside
	// this server; the tables exist so account deletion can clean them up.
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS purchases (
		purchase_id integer NOT NULL,
		user_id integer NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
		map_id integer NOT NULL REFERENCES maps(map_id) ON DELETE CASCADE,
		price real NOT NULL,
		status text NOT NULL DEFAULT 'completed',
		created_at integer NOT NULL DEFAULT (unixepoch()),
		PRIMARY KEY(purchase_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS comments (
		comment_id integer NOT NULL,
		user_id integer NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
		map_id integer NOT NULL REFERENCES maps(map_id) ON DELETE CASCADE,
		content text NOT NULL,
		rating integer NOT NULL,
		created_at integer NOT NULL DEFAULT (unixepoch()),
		PRIMARY KEY(comment_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE UNIQUE INDEX IF NOT EXISTS idx_comments_user_map ON comments(user_id, map_id)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_map ON comments(map_id, created_at)")
		.execute(&mut *tx)
		.await?;
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS notifications (
		notification_id integer NOT NULL,
		user_id integer NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
		message text NOT NULL,
		is_read boolean NOT NULL DEFAULT 0,
		created_at integer NOT NULL DEFAULT (unixepoch()),
		PRIMARY KEY(notification_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Chat
	//******
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS chat_messages (
		msg_id integer NOT NULL,
		user_id integer NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
		message text NOT NULL,
		created_at integer NOT NULL,
		PRIMARY KEY(msg_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_chat_messages_created_at ON chat_messages(created_at)",
	)
	.execute(&mut *tx)
	.await?;

	// Password reset
	//****************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS password_reset_tokens (
		token text NOT NULL,
		email text NOT NULL,
		expires_at integer NOT NULL,
		used boolean NOT NULL DEFAULT 0,
		created_at integer NOT NULL DEFAULT (unixepoch()),
		PRIMARY KEY(token)
	) WITHOUT ROWID",
	)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;

	Ok(())
}

// vim: ts=4
