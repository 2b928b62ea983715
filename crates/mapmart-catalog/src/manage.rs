//! Admin catalog management: create, edit, delete maps
//!
//! Create and edit take multipart forms with text fields `title`,
//! `description`, `price`, `features`, `is_premium`, `is_featured` and an
//! optional `image`. Images are scaled to fit 1200x800 on the worker pool's
//! normal queue and stored under `<upload_dir>/maps`.

use axum::{
	extract::{Multipart, Path, State},
	http::StatusCode,
	Json,
};

use crate::comment::DeletedRes;
use crate::prelude::*;
use mapmart_core::Auth;
use mapmart_file::form::{UploadForm, UploadedFile};
use mapmart_file::image::resize_to_jpeg_sync;
use mapmart_file::store;
use mapmart_types::meta_adapter::{CreateMap, Map, UpdateMapData};
use mapmart_types::types::ApiResponse;

pub const MAX_MAP_IMAGE_SIZE: usize = 16 * 1024 * 1024;
/// Request body limit for map forms: the image plus text fields and framing
pub const MAP_FORM_BODY_LIMIT: usize = MAX_MAP_IMAGE_SIZE + 256 * 1024;
pub const MAP_IMAGE_MAX_WIDTH: u32 = 1200;
pub const MAP_IMAGE_MAX_HEIGHT: u32 = 800;
/// Shown for maps uploaded without an image
pub const DEFAULT_MAP_IMAGE: &str = "/static/image/HBU.jpg";

const MAP_IMAGE_DIR: &str = "maps";

fn parse_price(value: &str) -> ClResult<f64> {
	value
		.trim()
		.parse::<f64>()
		.ok()
		.filter(|p| p.is_finite() && *p >= 0.0)
		.ok_or_else(|| Error::ValidationError("Invalid price".into()))
}

fn required_text(form: &UploadForm, name: &str) -> Option<Box<str>> {
	form.text(name).map(str::trim).filter(|v| !v.is_empty()).map(Box::from)
}

/// Resizes and stores the image, returns its URL
async fn store_map_image(app: &App, file: UploadedFile) -> ClResult<Box<str>> {
	file.check_image(MAX_MAP_IMAGE_SIZE)?;
	let data = file.data;
	let jpeg = app
		.worker
		.try_run(move || {
			resize_to_jpeg_sync(&data, MAP_IMAGE_MAX_WIDTH, MAP_IMAGE_MAX_HEIGHT).map_err(|err| {
				info!("Rejected undecodable map image: {}", err);
				Error::ValidationError("Invalid image".into())
			})
		})
		.await?;
	store::store_jpeg(app, MAP_IMAGE_DIR, "map", &jpeg).await
}

/// POST /api/admin/maps
pub async fn post_map(
	State(app): State<App>,
	Auth(auth): Auth,
	mut multipart: Multipart,
) -> ClResult<(StatusCode, Json<ApiResponse<Map>>)> {
	let mut form = UploadForm::read(&mut multipart, "image", MAX_MAP_IMAGE_SIZE).await?;

	let (Some(title), Some(description)) =
		(required_text(&form, "title"), required_text(&form, "description"))
	else {
		return Err(Error::ValidationError("Incomplete data".into()));
	};
	let is_premium = form.flag("is_premium").unwrap_or(true);
	let is_featured = form.flag("is_featured").unwrap_or(false);
	// Free maps cost nothing, whatever the form says
	let price = match form.text("price") {
		Some(price) if is_premium => parse_price(price)?,
		_ => 0.0,
	};
	let features = required_text(&form, "features");

	let image = match form.take_file() {
		Some(file) => store_map_image(&app, file).await?,
		None => DEFAULT_MAP_IMAGE.into(),
	};

	let created = app
		.meta_adapter
		.create_map(CreateMap {
			title: &title,
			description: &description,
			price,
			image: &image,
			features: features.as_deref(),
			is_featured,
			is_premium,
		})
		.await;
	let map_id = match created {
		Ok(map_id) => map_id,
		Err(err) => {
			store::remove_upload(&app, MAP_IMAGE_DIR, &image).await;
			return Err(err);
		}
	};

	let map = app.meta_adapter.read_map(map_id).await?;
	info!("Admin {} created map {} ({})", auth.user_id, map_id, map.title);
	Ok((StatusCode::CREATED, Json(ApiResponse::new(map))))
}

/// PATCH /api/admin/maps/{map_id} - fields left out stay unchanged
pub async fn patch_map(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(map_id): Path<i64>,
	mut multipart: Multipart,
) -> ClResult<Json<ApiResponse<Map>>> {
	let mut form = UploadForm::read(&mut multipart, "image", MAX_MAP_IMAGE_SIZE).await?;
	let current = app.meta_adapter.read_map(map_id).await?;

	let mut data = UpdateMapData {
		title: required_text(&form, "title"),
		description: required_text(&form, "description"),
		price: form.text("price").map(parse_price).transpose()?,
		features: form.text("features").map(|f| f.trim().into()),
		is_premium: form.flag("is_premium"),
		is_featured: form.flag("is_featured"),
		image: None,
	};
	if !data.is_premium.unwrap_or(current.is_premium) {
		data.price = Some(0.0);
	}
	if let Some(file) = form.take_file() {
		data.image = Some(store_map_image(&app, file).await?);
	}

	if let Err(err) = app.meta_adapter.update_map(map_id, &data).await {
		if let Some(image) = &data.image {
			store::remove_upload(&app, MAP_IMAGE_DIR, image).await;
		}
		return Err(err);
	}
	if data.image.is_some() {
		store::remove_upload(&app, MAP_IMAGE_DIR, &current.image).await;
	}

	let map = app.meta_adapter.read_map(map_id).await?;
	info!("Admin {} updated map {}", auth.user_id, map_id);
	Ok(Json(ApiResponse::new(map)))
}

/// DELETE /api/admin/maps/{map_id} - comments go with the map
pub async fn delete_map(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(map_id): Path<i64>,
) -> ClResult<Json<ApiResponse<DeletedRes>>> {
	let map = app.meta_adapter.read_map(map_id).await?;
	app.meta_adapter.delete_map(map_id).await?;
	store::remove_upload(&app, MAP_IMAGE_DIR, &map.image).await;

	warn!("Admin {} deleted map {} ({})", auth.user_id, map_id, map.title);
	Ok(Json(ApiResponse::new(DeletedRes::new(map_id))))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_price() {
		assert!((parse_price(" 4.50 ").unwrap() - 4.5).abs() < f64::EPSILON);
		assert!(parse_price("0").is_ok());
		for bad in ["-1", "abc", "NaN", "inf", ""] {
			assert!(matches!(parse_price(bad), Err(Error::ValidationError(_))), "{}", bad);
		}
	}
}

// vim: ts=4
