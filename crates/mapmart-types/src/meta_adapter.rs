//! Relational store contract.
//!
//! The server never owns a schema: every persistent record (users, the map
//! catalog, comments, chat messages, password reset tokens) is reached
//! through this trait. Implementations live in `adapters/`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::prelude::*;

pub const DEFAULT_PROFILE_PICTURE: &str = "default.jpg";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
	Local,
	Google,
}

impl AuthProvider {
	pub fn as_str(&self) -> &'static str {
		match self {
			AuthProvider::Local => "local",
			AuthProvider::Google => "google",
		}
	}

	pub fn parse(s: &str) -> ClResult<Self> {
		match s {
			"local" => Ok(AuthProvider::Local),
			"google" => Ok(AuthProvider::Google),
			_ => Err(Error::Parse),
		}
	}
}

// Users //
//*******//
#[derive(Clone, Debug, Serialize)]
pub struct User {
	#[serde(rename = "id")]
	pub user_id: UserId,
	pub email: Box<str>,
	pub name: Box<str>,
	#[serde(skip)]
	pub password_hash: Option<Box<str>>,
	/// Subject of the federated identity linked to this account
	#[serde(skip)]
	pub google_id: Option<Box<str>>,
	#[serde(rename = "profilePicture")]
	pub profile_picture: Box<str>,
	#[serde(rename = "isAdmin")]
	pub is_admin: bool,
	#[serde(rename = "authProvider")]
	pub auth_provider: AuthProvider,
	#[serde(rename = "createdAt")]
	pub created_at: Timestamp,
}

#[derive(Debug)]
pub struct CreateUser<'a> {
	pub email: &'a str,
	pub name: &'a str,
	pub password_hash: Option<&'a str>,
	pub auth_provider: AuthProvider,
	pub is_admin: bool,
}

/// Fields left as `None` are not touched
#[derive(Debug, Default)]
pub struct UpdateUserData {
	pub name: Option<Box<str>>,
	pub profile_picture: Option<Box<str>>,
	pub password_hash: Option<Box<str>>,
	pub is_admin: Option<bool>,
	pub google_id: Option<Box<str>>,
	pub auth_provider: Option<AuthProvider>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListUserOptions {
	pub limit: Option<u32>,
	pub offset: Option<u32>,
}

// Maps //
//******//
#[derive(Clone, Debug, Serialize)]
pub struct Map {
	#[serde(rename = "id")]
	pub map_id: i64,
	pub title: Box<str>,
	pub description: Box<str>,
	pub price: f64,
	pub image: Box<str>,
	pub features: Option<Box<str>>,
	#[serde(rename = "isFeatured")]
	pub is_featured: bool,
	#[serde(rename = "isPremium")]
	pub is_premium: bool,
	#[serde(rename = "createdAt")]
	pub created_at: Timestamp,
}

#[derive(Debug)]
pub struct CreateMap<'a> {
	pub title: &'a str,
	pub description: &'a str,
	pub price: f64,
	pub image: &'a str,
	pub features: Option<&'a str>,
	pub is_featured: bool,
	pub is_premium: bool,
}

/// Fields left as `None` are not touched
#[derive(Debug, Default)]
pub struct UpdateMapData {
	pub title: Option<Box<str>>,
	pub description: Option<Box<str>>,
	pub price: Option<f64>,
	pub image: Option<Box<str>>,
	pub features: Option<Box<str>>,
	pub is_featured: Option<bool>,
	pub is_premium: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListMapOptions {
	pub featured: Option<bool>,
	pub limit: Option<u32>,
	pub offset: Option<u32>,
}

// Comments //
//**********//
/// A map review joined with its author's public fields
#[derive(Clone, Debug, Serialize)]
pub struct Comment {
	#[serde(rename = "id")]
	pub comment_id: i64,
	#[serde(rename = "mapId")]
	pub map_id: i64,
	#[serde(rename = "userId")]
	pub user_id: UserId,
	#[serde(rename = "userName")]
	pub user_name: Box<str>,
	#[serde(rename = "userPicture")]
	pub user_picture: Box<str>,
	pub text: Box<str>,
	pub rating: u8,
	#[serde(rename = "createdAt")]
	pub created_at: Timestamp,
}

#[derive(Debug)]
pub struct CreateComment<'a> {
	pub user_id: UserId,
	pub map_id: i64,
	pub text: &'a str,
	pub rating: u8,
}

// Chat //
//******//
/// A persisted chat message joined with its author's public fields
#[derive(Clone, Debug, Serialize)]
pub struct ChatMessage {
	#[serde(rename = "id")]
	pub msg_id: i64,
	#[serde(rename = "userId")]
	pub user_id: UserId,
	#[serde(rename = "userName")]
	pub user_name: Box<str>,
	#[serde(rename = "userPicture")]
	pub user_picture: Box<str>,
	pub message: Box<str>,
	#[serde(rename = "createdAt")]
	pub created_at: Timestamp,
}

// Password reset //
//****************//
#[derive(Clone, Debug)]
pub struct PasswordResetToken {
	pub token: Box<str>,
	pub email: Box<str>,
	pub expires_at: Timestamp,
	pub used: bool,
	pub created_at: Timestamp,
}

impl PasswordResetToken {
	pub fn is_valid_at(&self, now: Timestamp) -> bool {
		!self.used && now < self.expires_at
	}
}

#[async_trait]
pub trait MetaAdapter: Debug + Send + Sync {
	/// Cheap round trip used by the health check
	async fn ping(&self) -> ClResult<()>;

	// Users
	//*******
	async fn create_user(&self, user: CreateUser<'_>) -> ClResult<UserId>;
	async fn read_user(&self, user_id: UserId) -> ClResult<User>;
	async fn read_user_by_email(&self, email: &str) -> ClResult<User>;
	async fn read_user_by_google_id(&self, google_id: &str) -> ClResult<User>;
	async fn update_user(&self, user_id: UserId, data: &UpdateUserData) -> ClResult<()>;
	/// Deletes the user together with the chat messages they authored
	async fn delete_user(&self, user_id: UserId) -> ClResult<()>;
	async fn list_users(&self, opts: &ListUserOptions) -> ClResult<Vec<User>>;
	async fn count_users(&self) -> ClResult<u64>;

	// Maps
	//******
	async fn create_map(&self, map: CreateMap<'_>) -> ClResult<i64>;
	async fn read_map(&self, map_id: i64) -> ClResult<Map>;
	async fn list_maps(&self, opts: &ListMapOptions) -> ClResult<Vec<Map>>;
	async fn count_maps(&self) -> ClResult<u64>;
	async fn update_map(&self, map_id: i64, data: &UpdateMapData) -> ClResult<()>;
	/// Deletes the map together with its comments
	async fn delete_map(&self, map_id: i64) -> ClResult<()>;

	// Comments
	//**********
	/// Fails with `Conflict` if the user already commented on the map
	async fn create_comment(&self, comment: CreateComment<'_>) -> ClResult<Comment>;
	/// Comments of one map, newest first
	async fn list_map_comments(&self, map_id: i64) -> ClResult<Vec<Comment>>;
	async fn delete_comment(&self, comment_id: i64) -> ClResult<()>;
	async fn count_comments(&self) -> ClResult<u64>;

	// Chat
	//******
	async fn create_chat_message(
		&self,
		user_id: UserId,
		message: &str,
		created_at: Timestamp,
	) -> ClResult<ChatMessage>;
	/// Messages created at or after `since`, newest first, at most `limit`
	async fn list_chat_messages(&self, since: Timestamp, limit: u32) -> ClResult<Vec<ChatMessage>>;
	/// Deletes messages created strictly before `cutoff`, returns the number removed
	async fn delete_chat_messages_before(&self, cutoff: Timestamp) -> ClResult<u64>;
	async fn count_chat_messages(&self) -> ClResult<u64>;

	// Password reset tokens
	//***********************
	async fn create_password_reset_token(
		&self,
		token: &str,
		email: &str,
		expires_at: Timestamp,
	) -> ClResult<()>;
	async fn read_password_reset_token(&self, token: &str) -> ClResult<PasswordResetToken>;
	async fn mark_password_reset_token_used(&self, token: &str) -> ClResult<()>;
	async fn delete_expired_password_reset_tokens(&self, now: Timestamp) -> ClResult<u64>;
}

// vim: ts=4
