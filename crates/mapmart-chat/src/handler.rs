use axum::{extract::State, Json};

use crate::prelude::*;
use crate::service;
use mapmart_types::meta_adapter::ChatMessage;
use mapmart_types::types::{now, ApiResponse};

/// GET /api/chat/messages
pub async fn get_messages(State(app): State<App>) -> ClResult<Json<ApiResponse<Vec<ChatMessage>>>> {
	let messages = service::history_at(&app, now()).await?;
	Ok(Json(ApiResponse::new(messages)))
}

// vim: ts=4
