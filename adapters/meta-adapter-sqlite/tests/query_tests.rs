//! Chat message queries: ordering, windowing and retention deletes

use mapmart_meta_adapter_sqlite::MetaAdapterSqlite;
use mapmart_types::meta_adapter::{AuthProvider, CreateUser, MetaAdapter};
use mapmart_types::types::{Timestamp, UserId};
use tempfile::TempDir;

async fn create_test_adapter() -> (MetaAdapterSqlite, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = MetaAdapterSqlite::new(temp_dir.path()).await.expect("Failed to create adapter");
	(adapter, temp_dir)
}

async fn create_user(adapter: &MetaAdapterSqlite, email: &str, name: &str) -> UserId {
	adapter
		.create_user(CreateUser {
			email,
			name,
			password_hash: None,
			auth_provider: AuthProvider::Google,
			is_admin: false,
		})
		.await
		.expect("Should create user")
}

#[tokio::test]
async fn test_chat_message_joined_with_author() {
	let (adapter, _temp) = create_test_adapter().await;
	let user_id = create_user(&adapter, "ana@example.com", "Ana").await;

	let msg = adapter.create_chat_message(user_id, "hello &lt;b&gt;", Timestamp(1000)).await.unwrap();
	assert_eq!(msg.user_id, user_id);
	assert_eq!(msg.user_name.as_ref(), "Ana");
	assert_eq!(msg.user_picture.as_ref(), "default.jpg");
	assert_eq!(msg.message.as_ref(), "hello &lt;b&gt;");
	assert_eq!(msg.created_at, Timestamp(1000));
}

#[tokio::test]
async fn test_list_newest_first_with_limit_and_since() {
	let (adapter, _temp) = create_test_adapter().await;
	let user_id = create_user(&adapter, "ana@example.com", "Ana").await;

	for i in 0..5 {
		adapter.create_chat_message(user_id, &format!("m{}", i), Timestamp(1000 + i)).await.unwrap();
	}

	let msgs = adapter.list_chat_messages(Timestamp(0), 3).await.unwrap();
	let texts: Vec<&str> = msgs.iter().map(|m| m.message.as_ref()).collect();
	assert_eq!(texts, vec!["m4", "m3", "m2"]);

	let msgs = adapter.list_chat_messages(Timestamp(1003), 100).await.unwrap();
	assert_eq!(msgs.len(), 2);
}

#[tokio::test]
async fn test_delete_before_is_strict_and_idempotent() {
	let (adapter, _temp) = create_test_adapter().await;
	let user_id = create_user(&adapter, "ana@example.com", "Ana").await;

	adapter.create_chat_message(user_id, "old", Timestamp(100)).await.unwrap();
	adapter.create_chat_message(user_id, "edge", Timestamp(200)).await.unwrap();
	adapter.create_chat_message(user_id, "new", Timestamp(300)).await.unwrap();

	assert_eq!(adapter.delete_chat_messages_before(Timestamp(200)).await.unwrap(), 1);
	assert_eq!(adapter.delete_chat_messages_before(Timestamp(200)).await.unwrap(), 0);
	assert_eq!(adapter.count_chat_messages().await.unwrap(), 2);
}

#[tokio::test]
async fn test_ping() {
	let (adapter, _temp) = create_test_adapter().await;
	assert!(adapter.ping().await.is_ok());
}

// vim: ts=4
