//! IP reputation moderation: list, block, unblock, clear

use std::net::IpAddr;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::prelude::*;
use mapmart_core::ip_reputation::ReputationSnapshot;
use mapmart_core::Auth;
use mapmart_types::types::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct IpReq {
	ip: Option<String>,
}

impl IpReq {
	/// Canonical textual form, as the reputation layer records it
	fn address(&self) -> ClResult<String> {
		let Some(ip) = self.ip.as_deref().map(str::trim).filter(|ip| !ip.is_empty()) else {
			return Err(Error::ValidationError("IP not specified".into()));
		};
		let addr: IpAddr =
			ip.parse().map_err(|_| Error::ValidationError("Invalid IP address".into()))?;
		Ok(addr.to_string())
	}
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct AdminActionRes {
	success: bool,
	message: String,
	count: Option<usize>,
}

impl AdminActionRes {
	pub fn new(message: String) -> Self {
		Self { success: true, message, count: None }
	}
}

/// GET /api/admin/blocked-ips
pub async fn get_blocked_ips(State(app): State<App>) -> Json<ApiResponse<ReputationSnapshot>> {
	Json(ApiResponse::new(app.ip_reputation.list()))
}

/// POST /api/admin/block-ip
pub async fn post_block_ip(
	State(app): State<App>,
	Auth(auth): Auth,
	Json(req): Json<IpReq>,
) -> ClResult<Json<AdminActionRes>> {
	let ip = req.address()?;
	app.ip_reputation.block(&ip);

	warn!("Admin {} blocked IP {}", auth.user_id, ip);
	Ok(Json(AdminActionRes::new(format!("IP {} blocked", ip))))
}

/// POST /api/admin/unblock-ip
pub async fn post_unblock_ip(
	State(app): State<App>,
	Auth(auth): Auth,
	Json(req): Json<IpReq>,
) -> ClResult<Json<AdminActionRes>> {
	let ip = req.address()?;
	if !app.ip_reputation.unblock(&ip) {
		return Err(Error::NotFound);
	}

	info!("Admin {} unblocked IP {}", auth.user_id, ip);
	Ok(Json(AdminActionRes::new(format!("IP {} unblocked", ip))))
}

/// POST /api/admin/clear-all-blocks
pub async fn post_clear_all_blocks(
	State(app): State<App>,
	Auth(auth): Auth,
) -> Json<AdminActionRes> {
	let count = app.ip_reputation.clear_all();

	info!("Admin {} cleared {} blocked IPs", auth.user_id, count);
	Json(AdminActionRes {
		success: true,
		message: format!("Unblocked {} IPs", count),
		count: Some(count),
	})
}

// vim: ts=4
