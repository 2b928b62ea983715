//! Meta adapter CRUD operation tests
//!
//! Tests Create, Read, Update, Delete operations for users, maps, comments
//! and password reset tokens

use mapmart_meta_adapter_sqlite::MetaAdapterSqlite;
use mapmart_types::error::Error;
use mapmart_types::meta_adapter::{
	AuthProvider, CreateComment, CreateMap, CreateUser, ListMapOptions, MetaAdapter,
	UpdateMapData, UpdateUserData, DEFAULT_PROFILE_PICTURE,
};
use mapmart_types::types::{Timestamp, UserId};
use tempfile::TempDir;

async fn create_test_adapter() -> (MetaAdapterSqlite, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = MetaAdapterSqlite::new(temp_dir.path()).await.expect("Failed to create adapter");
	(adapter, temp_dir)
}

fn local_user<'a>(email: &'a str, name: &'a str) -> CreateUser<'a> {
	CreateUser {
		email,
		name,
		password_hash: Some("$2b$10$hash"),
		auth_provider: AuthProvider::Local,
		is_admin: false,
	}
}

#[tokio::test]
async fn test_create_and_read_user() {
	let (adapter, _temp) = create_test_adapter().await;

	let user_id = adapter.create_user(local_user("ana@example.com", "Ana")).await.unwrap();
	let user = adapter.read_user(user_id).await.unwrap();

	assert_eq!(user.user_id, user_id);
	assert_eq!(user.email.as_ref(), "ana@example.com");
	assert_eq!(user.name.as_ref(), "Ana");
	assert_eq!(user.password_hash.as_deref(), Some("$2b$10$hash"));
	assert_eq!(user.profile_picture.as_ref(), DEFAULT_PROFILE_PICTURE);
	assert_eq!(user.auth_provider, AuthProvider::Local);
	assert!(!user.is_admin);

	let by_email = adapter.read_user_by_email("ana@example.com").await.unwrap();
	assert_eq!(by_email.user_id, user_id);
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
	let (adapter, _temp) = create_test_adapter().await;

	adapter.create_user(local_user("dup@example.com", "First")).await.unwrap();
	let res = adapter.create_user(local_user("dup@example.com", "Second")).await;
	assert!(matches!(res, Err(Error::Conflict(_))));
	assert_eq!(adapter.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_missing_user_not_found() {
	let (adapter, _temp) = create_test_adapter().await;

	assert!(matches!(adapter.read_user(UserId(999)).await, Err(Error::NotFound)));
	assert!(matches!(adapter.read_user_by_email("nobody@example.com").await, Err(Error::NotFound)));
	assert!(matches!(adapter.delete_user(UserId(999)).await, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_update_user_fields() {
	let (adapter, _temp) = create_test_adapter().await;
	let user_id = adapter.create_user(local_user("bob@example.com", "Bob")).await.unwrap();

	let data = UpdateUserData {
		name: Some("Robert".into()),
		profile_picture: Some("profile_1_abc.jpg".into()),
		..Default::default()
	};
	adapter.update_user(user_id, &data).await.unwrap();

	let user = adapter.read_user(user_id).await.unwrap();
	assert_eq!(user.name.as_ref(), "Robert");
	assert_eq!(user.profile_picture.as_ref(), "profile_1_abc.jpg");
	assert_eq!(user.password_hash.as_deref(), Some("$2b$10$hash"));

	// Empty update is a no-op
	adapter.update_user(user_id, &UpdateUserData::default()).await.unwrap();

	let res = adapter.update_user(UserId(999), &data).await;
	assert!(matches!(res, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_delete_user_removes_chat_messages() {
	let (adapter, _temp) = create_test_adapter().await;
	let keep = adapter.create_user(local_user("keep@example.com", "Keep")).await.unwrap();
	let gone = adapter.create_user(local_user("gone@example.com", "Gone")).await.unwrap();

	adapter.create_chat_message(keep, "hello", Timestamp(1000)).await.unwrap();
	adapter.create_chat_message(gone, "bye", Timestamp(1001)).await.unwrap();

	adapter.delete_user(gone).await.unwrap();

	assert!(matches!(adapter.read_user(gone).await, Err(Error::NotFound)));
	assert_eq!(adapter.count_chat_messages().await.unwrap(), 1);
	assert_eq!(adapter.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_map_catalog() {
	let (adapter, _temp) = create_test_adapter().await;

	let plain = adapter
		.create_map(CreateMap {
			title: "City",
			description: "Streets",
			price: 4.5,
			image: "city.jpg",
			features: None,
			is_featured: false,
			is_premium: false,
		})
		.await
		.unwrap();
	let featured = adapter
		.create_map(CreateMap {
			title: "World",
			description: "Everything",
			price: 19.99,
			image: "world.jpg",
			features: Some("Topography, Borders"),
			is_featured: true,
			is_premium: true,
		})
		.await
		.unwrap();

	let map = adapter.read_map(featured).await.unwrap();
	assert_eq!(map.title.as_ref(), "World");
	assert!((map.price - 19.99).abs() < f64::EPSILON);
	assert_eq!(map.features.as_deref(), Some("Topography, Borders"));

	let all = adapter.list_maps(&ListMapOptions::default()).await.unwrap();
	assert_eq!(all.iter().map(|m| m.map_id).collect::<Vec<_>>(), vec![featured, plain]);

	let only_featured = adapter
		.list_maps(&ListMapOptions { featured: Some(true), ..Default::default() })
		.await
		.unwrap();
	assert_eq!(only_featured.len(), 1);

	adapter.delete_map(plain).await.unwrap();
	assert_eq!(adapter.count_maps().await.unwrap(), 1);
	assert!(matches!(adapter.read_map(plain).await, Err(Error::NotFound)));
}

fn sample_map(title: &str) -> CreateMap<'_> {
	CreateMap {
		title,
		description: "Sample",
		price: 0.0,
		image: "/static/image/HBU.jpg",
		features: None,
		is_featured: false,
		is_premium: false,
	}
}

#[tokio::test]
async fn test_update_map_fields() {
	let (adapter, _temp) = create_test_adapter().await;
	let map_id = adapter.create_map(sample_map("Lakes")).await.unwrap();

	let data = UpdateMapData {
		title: Some("Great Lakes".into()),
		price: Some(7.5),
		is_premium: Some(true),
		is_featured: Some(true),
		..Default::default()
	};
	adapter.update_map(map_id, &data).await.unwrap();

	let map = adapter.read_map(map_id).await.unwrap();
	assert_eq!(map.title.as_ref(), "Great Lakes");
	assert_eq!(map.description.as_ref(), "Sample");
	assert!((map.price - 7.5).abs() < f64::EPSILON);
	assert!(map.is_premium && map.is_featured);

	adapter.update_map(map_id, &UpdateMapData::default()).await.unwrap();
	assert!(matches!(adapter.update_map(999, &data).await, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_comments_one_per_user_and_map() {
	let (adapter, _temp) = create_test_adapter().await;
	let ana = adapter.create_user(local_user("ana@example.com", "Ana")).await.unwrap();
	let bob = adapter.create_user(local_user("bob@example.com", "Bob")).await.unwrap();
	let map_id = adapter.create_map(sample_map("Rivers")).await.unwrap();

	let first = adapter
		.create_comment(CreateComment { user_id: ana, map_id, text: "Great", rating: 5 })
		.await
		.unwrap();
	assert_eq!(first.user_name.as_ref(), "Ana");
	assert_eq!(first.rating, 5);

	let again = adapter
		.create_comment(CreateComment { user_id: ana, map_id, text: "Again", rating: 1 })
		.await;
	assert!(matches!(again, Err(Error::Conflict(_))));

	let second = adapter
		.create_comment(CreateComment { user_id: bob, map_id, text: "Fine", rating: 3 })
		.await
		.unwrap();

	let missing_map = adapter
		.create_comment(CreateComment { user_id: bob, map_id: 999, text: "?", rating: 3 })
		.await;
	assert!(matches!(missing_map, Err(Error::NotFound)));

	// Same second: the later insert still comes first
	let comments = adapter.list_map_comments(map_id).await.unwrap();
	let ids: Vec<i64> = comments.iter().map(|c| c.comment_id).collect();
	assert_eq!(ids, vec![second.comment_id, first.comment_id]);
	assert_eq!(adapter.count_comments().await.unwrap(), 2);

	adapter.delete_comment(first.comment_id).await.unwrap();
	assert!(matches!(adapter.delete_comment(first.comment_id).await, Err(Error::NotFound)));

	// Deleting the map takes its comments along
	adapter.delete_map(map_id).await.unwrap();
	assert_eq!(adapter.count_comments().await.unwrap(), 0);
}

#[tokio::test]
async fn test_google_identity_link() {
	let (adapter, _temp) = create_test_adapter().await;
	let ana = adapter.create_user(local_user("ana@example.com", "Ana")).await.unwrap();
	let bob = adapter.create_user(local_user("bob@example.com", "Bob")).await.unwrap();

	assert!(matches!(adapter.read_user_by_google_id("g-123").await, Err(Error::NotFound)));

	let link = UpdateUserData {
		google_id: Some("g-123".into()),
		auth_provider: Some(AuthProvider::Google),
		..Default::default()
	};
	adapter.update_user(ana, &link).await.unwrap();

	let user = adapter.read_user_by_google_id("g-123").await.unwrap();
	assert_eq!(user.user_id, ana);
	assert_eq!(user.auth_provider, AuthProvider::Google);
	assert_eq!(user.google_id.as_deref(), Some("g-123"));

	let res = adapter.update_user(bob, &link).await;
	assert!(matches!(res, Err(Error::Conflict(_))));
}

#[tokio::test]
async fn test_password_reset_tokens() {
	let (adapter, _temp) = create_test_adapter().await;

	adapter.create_password_reset_token("tok-1", "ana@example.com", Timestamp(5000)).await.unwrap();
	adapter.create_password_reset_token("tok-2", "ana@example.com", Timestamp(100)).await.unwrap();

	let token = adapter.read_password_reset_token("tok-1").await.unwrap();
	assert_eq!(token.email.as_ref(), "ana@example.com");
	assert!(token.is_valid_at(Timestamp(4999)));
	assert!(!token.is_valid_at(Timestamp(5000)));

	adapter.mark_password_reset_token_used("tok-1").await.unwrap();
	let token = adapter.read_password_reset_token("tok-1").await.unwrap();
	assert!(token.used);
	assert!(!token.is_valid_at(Timestamp(10)));

	// Used and expired tokens are both removed
	assert_eq!(adapter.delete_expired_password_reset_tokens(Timestamp(200)).await.unwrap(), 2);
	assert!(matches!(adapter.read_password_reset_token("tok-2").await, Err(Error::NotFound)));
}

// vim: ts=4
