//! HTTP routes
//!
//! Layer order, outermost first: request log, IP reputation, session
//! decoding, then the per-route rate limit of each endpoint.

use axum::{
	extract::DefaultBodyLimit,
	middleware,
	routing::{delete, get, patch, post},
	Router,
};
use tower_http::services::{ServeDir, ServeFile};

use crate::prelude::*;
use crate::{admin, auth, catalog, chat, health, profile};
use mapmart_core::ip_reputation::IpReputationLayer;
use mapmart_core::middleware::{optional_auth, request_log};
use mapmart_core::rate_limit::{scope, RateLimitLayer};

pub fn init(app: App) -> Router {
	let limit =
		|scope: &'static str| RateLimitLayer::new(app.rate_limiter.clone(), scope, app.opts.mode);

	// Auth
	let auth_router = Router::new()
		.route("/api/auth/login", post(auth::handler::post_login).route_layer(limit(scope::LOGIN)))
		.route(
			"/api/auth/register",
			post(auth::handler::post_register).route_layer(limit(scope::REGISTER)),
		)
		.route(
			"/api/auth/google",
			post(auth::google::post_google_login).route_layer(limit(scope::OAUTH_LOGIN)),
		)
		.route("/api/auth/logout", post(auth::handler::post_logout).route_layer(limit(scope::LOGOUT)))
		.route("/api/auth/session", get(auth::handler::get_session).route_layer(limit(scope::SESSION)))
		.route(
			"/api/auth/password-reset",
			post(auth::reset::post_password_reset)
				.route_layer(limit(scope::PASSWORD_RESET_REQUEST)),
		)
		.route(
			"/api/auth/password-reset/complete",
			post(auth::reset::post_password_reset_complete)
				.route_layer(limit(scope::PASSWORD_RESET_COMPLETE)),
		)
		.route(
			"/api/account",
			delete(auth::account::delete_account).route_layer(limit(scope::ACCOUNT_DELETION)),
		);

	// Profile
	let profile_router = Router::new()
		.route(
			"/api/profile",
			get(profile::handler::get_profile)
				.patch(profile::handler::patch_profile)
				.route_layer(limit(scope::PROFILE)),
		)
		.route(
			"/api/profile/picture",
			post(profile::picture::post_profile_picture)
				.layer(DefaultBodyLimit::max(profile::picture::UPLOAD_BODY_LIMIT))
				.route_layer(limit(scope::PROFILE_PICTURE_UPLOAD)),
		);

	// Catalog and chat
	let public_router = Router::new()
		.route("/api/maps", get(catalog::map::list_maps).route_layer(limit(scope::MAP_LIST)))
		.route(
			"/api/maps/{map_id}",
			get(catalog::map::get_map).route_layer(limit(scope::MAP_DETAIL)),
		)
		.route(
			"/api/maps/{map_id}/comments",
			get(catalog::comment::list_comments)
				.route_layer(limit(scope::MAP_COMMENTS))
				.merge(post(catalog::comment::post_comment).route_layer(limit(scope::COMMENT_POST))),
		)
		.route(
			"/api/chat/messages",
			get(chat::handler::get_messages).route_layer(limit(scope::CHAT_HISTORY)),
		)
		.route("/ws/chat", get(chat::websocket::get_chat_ws).route_layer(limit(scope::CHAT_WS)))
		.route("/health", get(health::get_health).route_layer(limit(scope::HEALTH)));

	// Admin
	let admin_router = Router::new()
		.route("/api/admin/blocked-ips", get(admin::ip::get_blocked_ips))
		.route("/api/admin/block-ip", post(admin::ip::post_block_ip))
		.route("/api/admin/unblock-ip", post(admin::ip::post_unblock_ip))
		.route("/api/admin/clear-all-blocks", post(admin::ip::post_clear_all_blocks))
		.route(
			"/api/admin/maps",
			post(catalog::manage::post_map)
				.layer(DefaultBodyLimit::max(catalog::manage::MAP_FORM_BODY_LIMIT)),
		)
		.route(
			"/api/admin/maps/{map_id}",
			patch(catalog::manage::patch_map)
				.delete(catalog::manage::delete_map)
				.layer(DefaultBodyLimit::max(catalog::manage::MAP_FORM_BODY_LIMIT)),
		)
		.route("/api/admin/comments/{comment_id}", delete(catalog::comment::delete_comment))
		.route("/api/admin/users", get(admin::user::list_users))
		.route("/api/admin/users/{user_id}/toggle-admin", post(admin::user::post_toggle_admin))
		.route("/api/admin/users/{user_id}/password", post(admin::user::post_change_password))
		.route("/api/admin/stats", get(admin::user::get_stats))
		.route_layer(middleware::from_fn_with_state(app.clone(), admin::perm::require_admin))
		.route_layer(limit(scope::ADMIN));

	let mut router = Router::new()
		.merge(auth_router)
		.merge(profile_router)
		.merge(public_router)
		.merge(admin_router)
		.nest_service("/uploads", ServeDir::new(&app.opts.upload_dir));

	if let Some(dist_dir) = &app.opts.dist_dir {
		let index = dist_dir.join("index.html");
		router = router.fallback_service(ServeDir::new(dist_dir).fallback(ServeFile::new(index)));
	}

	router
		.layer(middleware::from_fn_with_state(app.clone(), optional_auth))
		.layer(IpReputationLayer::new(app.ip_reputation.clone(), app.opts.mode))
		.layer(middleware::from_fn(request_log))
		.with_state(app)
}

// vim: ts=4
