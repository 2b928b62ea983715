//! Router and request helpers for the auth tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::middleware::from_fn_with_state;
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;

use mapmart_auth::{account, google, handler, hash_password, reset};
use mapmart_core::id_token::IdTokenVerifier;
use mapmart_core::middleware::optional_auth;
use mapmart_core::{App, AppOpts, AppState};
use mapmart_meta_adapter_sqlite::MetaAdapterSqlite;
use mapmart_types::meta_adapter::{AuthProvider, CreateUser, MetaAdapter};
use mapmart_types::types::UserId;
use mapmart_types::worker::WorkerPool;

pub struct TestEnv {
	pub app: App,
	pub router: Router,
	_temp: TempDir,
}

pub async fn setup() -> TestEnv {
	setup_with_google(None).await
}

pub async fn setup_with_google(google_signin: Option<Arc<dyn IdTokenVerifier>>) -> TestEnv {
	let temp = TempDir::new().unwrap();
	let adapter = Arc::new(MetaAdapterSqlite::new(temp.path()).await.unwrap());
	let opts = AppOpts { upload_dir: temp.path().join("uploads").into(), google_signin, ..AppOpts::default() };
	let app = AppState::new(opts, b"auth-test-secret-0123456789abcdef", adapter, Arc::new(WorkerPool::new(1, 2)))
		.unwrap();

	let router = Router::new()
		.route("/api/auth/login", post(handler::post_login))
		.route("/api/auth/logout", post(handler::post_logout))
		.route("/api/auth/register", post(handler::post_register))
		.route("/api/auth/google", post(google::post_google_login))
		.route("/api/auth/session", get(handler::get_session))
		.route("/api/auth/password-reset", post(reset::post_password_reset))
		.route("/api/auth/password-reset/complete", post(reset::post_password_reset_complete))
		.route("/api/account", delete(account::delete_account))
		.layer(from_fn_with_state(app.clone(), optional_auth))
		.with_state(app.clone());

	TestEnv { app, router, _temp: temp }
}

/// Creates a local user directly in the store
pub async fn seed_user(app: &App, email: &str, password: &str, is_admin: bool) -> UserId {
	let hash = hash_password(&app.worker, password.into()).await.unwrap();
	app.meta_adapter
		.create_user(CreateUser {
			email,
			name: "Seeded",
			password_hash: Some(&hash),
			auth_provider: AuthProvider::Local,
			is_admin,
		})
		.await
		.unwrap()
}

pub fn json_request(method: &str, uri: &str, body: &Value, cookie: Option<&str>) -> Request<Body> {
	let mut req = Request::builder()
		.method(method)
		.uri(uri)
		.header(header::CONTENT_TYPE, "application/json");
	if let Some(cookie) = cookie {
		req = req.header(header::COOKIE, cookie);
	}
	req.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
	let mut req = Request::get(uri);
	if let Some(cookie) = cookie {
		req = req.header(header::COOKIE, cookie);
	}
	req.body(Body::empty()).unwrap()
}

/// `name=value` part of the response's `Set-Cookie` header
pub fn session_cookie(res: &Response) -> String {
	let set_cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
	set_cookie.split(';').next().unwrap().to_string()
}

pub async fn body_json(res: Response) -> Value {
	let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
	if bytes.is_empty() {
		return Value::Null;
	}
	serde_json::from_slice(&bytes).unwrap()
}

// vim: ts=4
