//! Map comments and ratings
//!
//! A signed-in user may leave one comment with a 1-5 rating per map.
//! Listing is public and carries the average rating.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	Json,
};
use serde::{Deserialize, Serialize};

use crate::prelude::*;
use mapmart_core::Auth;
use mapmart_types::meta_adapter::{Comment, CreateComment};
use mapmart_types::types::ApiResponse;
use mapmart_types::utils::escape_angle_brackets;

pub const MAX_COMMENT_LENGTH: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct CommentReq {
	rating: Option<i64>,
	comment: Option<String>,
}

impl CommentReq {
	/// Rating and sanitized text
	fn validate(&self) -> ClResult<(u8, String)> {
		let text = self.comment.as_deref().map(str::trim).unwrap_or_default();
		let Some(rating) = self.rating else {
			return Err(Error::ValidationError("Incomplete data".into()));
		};
		if text.is_empty() {
			return Err(Error::ValidationError("Incomplete data".into()));
		}
		if text.chars().count() > MAX_COMMENT_LENGTH {
			return Err(Error::ValidationError("Comment too long".into()));
		}
		let rating = u8::try_from(rating)
			.ok()
			.filter(|r| (1..=5).contains(r))
			.ok_or_else(|| Error::ValidationError("Invalid rating".into()))?;
		Ok((rating, escape_angle_brackets(text)))
	}
}

/// POST /api/maps/{map_id}/comments
pub async fn post_comment(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(map_id): Path<i64>,
	Json(req): Json<CommentReq>,
) -> ClResult<(StatusCode, Json<ApiResponse<Comment>>)> {
	let (rating, text) = req.validate()?;
	app.meta_adapter.read_map(map_id).await?;

	let comment = app
		.meta_adapter
		.create_comment(CreateComment { user_id: auth.user_id, map_id, text: &text, rating })
		.await?;

	info!("User {} rated map {} with {}", auth.user_id, map_id, rating);
	Ok((StatusCode::CREATED, Json(ApiResponse::new(comment))))
}

#[derive(Debug, Serialize)]
pub struct CommentListRes {
	comments: Vec<Comment>,
	#[serde(rename = "averageRating")]
	average_rating: Option<f64>,
	#[serde(rename = "commentCount")]
	comment_count: usize,
}

fn average_rating(comments: &[Comment]) -> Option<f64> {
	let count = u32::try_from(comments.len()).ok().filter(|n| *n > 0)?;
	let sum: u32 = comments.iter().map(|c| u32::from(c.rating)).sum();
	Some(f64::from(sum) / f64::from(count))
}

/// GET /api/maps/{map_id}/comments - newest first
pub async fn list_comments(
	State(app): State<App>,
	Path(map_id): Path<i64>,
) -> ClResult<Json<ApiResponse<CommentListRes>>> {
	app.meta_adapter.read_map(map_id).await?;
	let comments = app.meta_adapter.list_map_comments(map_id).await?;

	Ok(Json(ApiResponse::new(CommentListRes {
		average_rating: average_rating(&comments),
		comment_count: comments.len(),
		comments,
	})))
}

#[derive(Debug, Serialize)]
pub struct DeletedRes {
	id: i64,
}

impl DeletedRes {
	pub fn new(id: i64) -> Self {
		Self { id }
	}
}

/// DELETE /api/admin/comments/{comment_id}
pub async fn delete_comment(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(comment_id): Path<i64>,
) -> ClResult<Json<ApiResponse<DeletedRes>>> {
	app.meta_adapter.delete_comment(comment_id).await?;

	info!("Admin {} deleted comment {}", auth.user_id, comment_id);
	Ok(Json(ApiResponse::new(DeletedRes::new(comment_id))))
}


// vim: ts=4
