//! Catalog browsing

use axum::{
	extract::{Path, Query, State},
	Json,
};

use crate::prelude::*;
use mapmart_types::meta_adapter::{ListMapOptions, Map};
use mapmart_types::types::ApiResponse;

/// GET /api/maps
pub async fn list_maps(
	State(app): State<App>,
	Query(opts): Query<ListMapOptions>,
) -> ClResult<Json<ApiResponse<Vec<Map>>>> {
	let maps = app.meta_adapter.list_maps(&opts).await?;
	Ok(Json(ApiResponse::new(maps)))
}

/// GET /api/maps/{map_id}
pub async fn get_map(
	State(app): State<App>,
	Path(map_id): Path<i64>,
) -> ClResult<Json<ApiResponse<Map>>> {
	let map = app.meta_adapter.read_map(map_id).await?;
	Ok(Json(ApiResponse::new(map)))
}

// vim: ts=4
