//! Health check

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::app::VERSION;
use crate::prelude::*;
use crate::types::now;

#[derive(Debug, Serialize)]
pub struct HealthRes {
	status: &'static str,
	database: &'static str,
	version: &'static str,
	time: Timestamp,
}

/// GET /health - 503 when the store does not answer
pub async fn get_health(State(app): State<App>) -> (StatusCode, Json<HealthRes>) {
	match app.meta_adapter.ping().await {
		Ok(()) => (
			StatusCode::OK,
			Json(HealthRes { status: "healthy", database: "connected", version: VERSION, time: now() }),
		),
		Err(err) => {
			error!("Health check failed: {}", err);
			(
				StatusCode::SERVICE_UNAVAILABLE,
				Json(HealthRes {
					status: "unhealthy",
					database: "disconnected",
					version: VERSION,
					time: now(),
				}),
			)
		}
	}
}

// vim: ts=4
