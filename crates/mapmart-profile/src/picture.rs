//! Profile picture upload
//!
//! The uploaded image is decoded and scaled on the worker pool to fit in an
//! 800x800 box, then stored as JPEG under `<upload_dir>/profiles`. The user
//! record points at it through a `/uploads/profiles/...` URL.

use axum::{
	extract::{Multipart, State},
	Json,
};
use serde::Serialize;

use crate::prelude::*;
use mapmart_core::Auth;
use mapmart_file::form::UploadForm;
use mapmart_file::image::resize_to_jpeg_sync;
use mapmart_file::store;
use mapmart_types::meta_adapter::UpdateUserData;
use mapmart_types::types::ApiResponse;

pub const MAX_PICTURE_SIZE: usize = 5 * 1024 * 1024;
/// Request body limit for the upload route: the picture plus multipart framing
pub const UPLOAD_BODY_LIMIT: usize = MAX_PICTURE_SIZE + 64 * 1024;
pub const PICTURE_MAX_DIM: u32 = 800;
pub const PICTURE_URL_PREFIX: &str = "/uploads/profiles/";

const PICTURE_DIR: &str = "profiles";

/// Deletes a previously uploaded picture. Default and external pictures
/// are left alone.
pub async fn remove_custom_picture(app: &App, picture: &str) {
	store::remove_upload(app, PICTURE_DIR, picture).await;
}

#[derive(Debug, Serialize)]
pub struct PictureRes {
	#[serde(rename = "profilePicture")]
	profile_picture: Box<str>,
}

/// POST /api/profile/picture - multipart upload, field `file`
pub async fn post_profile_picture(
	State(app): State<App>,
	Auth(auth): Auth,
	mut multipart: Multipart,
) -> ClResult<Json<ApiResponse<PictureRes>>> {
	let mut form = UploadForm::read(&mut multipart, "file", MAX_PICTURE_SIZE).await?;
	let Some(file) = form.take_file() else {
		return Err(Error::ValidationError("No image sent".into()));
	};
	file.check_image(MAX_PICTURE_SIZE)?;

	let user = app.meta_adapter.read_user(auth.user_id).await?;

	// The user waits on this one: immediate queue
	let data = file.data;
	let jpeg = app
		.worker
		.run_immed(move || resize_to_jpeg_sync(&data, PICTURE_MAX_DIM, PICTURE_MAX_DIM))
		.await?
		.map_err(|err| {
			info!("Rejected undecodable profile picture from user {}: {}", auth.user_id, err);
			Error::ValidationError("Invalid image".into())
		})?;

	let prefix = format!("user_{}", user.user_id);
	let picture = store::store_jpeg(&app, PICTURE_DIR, &prefix, &jpeg).await?;
	let update = UpdateUserData { profile_picture: Some(picture.clone()), ..Default::default() };
	if let Err(err) = app.meta_adapter.update_user(user.user_id, &update).await {
		remove_custom_picture(&app, &picture).await;
		return Err(err);
	}
	remove_custom_picture(&app, &user.profile_picture).await;

	info!("Profile picture updated for user {} ({} bytes)", user.user_id, jpeg.len());
	Ok(Json(ApiResponse::new(PictureRes { profile_picture: picture })))
}

// vim: ts=4
