//! Full router: abuse control layers in front of the feature handlers

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use mapmart::meta_adapter::{AuthProvider, CreateMap, CreateUser, MetaAdapter};
use mapmart::worker::WorkerPool;
use mapmart::{routes, App, AppBuilder};
use mapmart_core::ip_reputation::ReputationConfig;
use mapmart_core::SessionCtx;
use mapmart_meta_adapter_sqlite::MetaAdapterSqlite;

struct TestEnv {
	app: App,
	router: Router,
	_temp: TempDir,
}

async fn setup(reputation: ReputationConfig) -> TestEnv {
	let temp = TempDir::new().unwrap();
	let adapter = Arc::new(MetaAdapterSqlite::new(temp.path()).await.unwrap());

	let app = AppBuilder::new()
		.meta_adapter(adapter)
		.session_secret(b"router-test-secret-0123456789".as_slice())
		.upload_dir(temp.path().join("uploads"))
		.worker(Arc::new(WorkerPool::new(1, 1)))
		.reputation(reputation)
		.build()
		.unwrap();
	let router = routes::init(app.clone());

	TestEnv { app, router, _temp: temp }
}

fn request(method: &str, peer: &str, uri: &str, body: Option<Value>) -> Request<Body> {
	let req = Request::builder().method(method).uri(uri);
	let mut req = match body {
		Some(body) => req.header(header::CONTENT_TYPE, "application/json").body(Body::from(body.to_string())),
		None => req.body(Body::empty()),
	}
	.unwrap();
	let addr: SocketAddr = peer.parse().unwrap();
	req.extensions_mut().insert(ConnectInfo(addr));
	req
}

async fn send(env: &TestEnv, req: Request<Body>) -> Response {
	env.router.clone().oneshot(req).await.unwrap()
}

async fn seed_map(env: &TestEnv, title: &str, featured: bool) -> i64 {
	env.app
		.meta_adapter
		.create_map(CreateMap {
			title,
			description: "A map",
			price: 4.5,
			image: "map.jpg",
			features: None,
			is_featured: featured,
			is_premium: false,
		})
		.await
		.unwrap()
}

async fn body_json(res: Response) -> Value {
	let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
	serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_and_catalog() {
	let env = setup(ReputationConfig::default()).await;
	for (title, featured) in [("Old Town", false), ("Coastline", true)] {
		seed_map(&env, title, featured).await;
	}

	let res = send(&env, request("GET", "198.51.100.1:5000", "/health", None)).await;
	assert_eq!(res.status(), StatusCode::OK);
	assert_eq!(body_json(res).await["status"], "healthy");

	let res = send(&env, request("GET", "198.51.100.1:5000", "/api/maps", None)).await;
	assert_eq!(res.status(), StatusCode::OK);
	assert_eq!(res.headers()["X-RateLimit-Limit"], "20");
	let maps = body_json(res).await;
	assert_eq!(maps["data"].as_array().unwrap().len(), 2);
	assert_eq!(maps["data"][0]["title"], "Coastline");

	let res = send(&env, request("GET", "198.51.100.1:5000", "/api/maps?featured=true", None)).await;
	assert_eq!(body_json(res).await["data"].as_array().unwrap().len(), 1);

	let res = send(&env, request("GET", "198.51.100.1:5000", "/api/maps/999", None)).await;
	assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_login_rate_limited() {
	let env = setup(ReputationConfig::default()).await;
	let body = json!({ "email": "nobody@example.com", "password": "password1" });

	for _ in 0..5 {
		let res = send(&env, request("POST", "198.51.100.7:5000", "/api/auth/login", Some(body.clone()))).await;
		assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
	}

	let res = send(&env, request("POST", "198.51.100.7:5000", "/api/auth/login", Some(body.clone()))).await;
	assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
	assert!(res.headers().contains_key(header::RETRY_AFTER));

	// Other clients and other routes are unaffected
	let res = send(&env, request("POST", "198.51.100.8:5000", "/api/auth/login", Some(body))).await;
	assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
	let res = send(&env, request("GET", "198.51.100.7:5000", "/api/chat/messages", None)).await;
	assert_eq!(res.status(), StatusCode::OK);
	assert_eq!(body_json(res).await["data"], json!([]));
}

#[tokio::test]
async fn test_default_limits_on_session_logout_health_and_chat() {
	let env = setup(ReputationConfig::default()).await;

	let cases = [
		("GET", "/api/auth/session", "198.51.100.31:5000"),
		("POST", "/api/auth/logout", "198.51.100.32:5000"),
		("GET", "/health", "198.51.100.33:5000"),
		("GET", "/ws/chat", "198.51.100.34:5000"),
	];
	for (method, uri, peer) in cases {
		for i in 0..20 {
			let res = send(&env, request(method, peer, uri, None)).await;
			assert_ne!(res.status(), StatusCode::TOO_MANY_REQUESTS, "{} {} request {}", method, uri, i + 1);
			assert_eq!(res.headers()["X-RateLimit-Limit"], "20", "{}", uri);
		}
		let res = send(&env, request(method, peer, uri, None)).await;
		assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS, "{} {}", method, uri);
	}
}

#[tokio::test]
async fn test_map_list_and_detail_budgets_are_separate() {
	let env = setup(ReputationConfig::default()).await;
	let map_id = seed_map(&env, "Old Town", false).await;
	let detail = format!("/api/maps/{}", map_id);

	for _ in 0..20 {
		let res = send(&env, request("GET", "198.51.100.40:5000", "/api/maps", None)).await;
		assert_eq!(res.status(), StatusCode::OK);
	}
	let res = send(&env, request("GET", "198.51.100.40:5000", "/api/maps", None)).await;
	assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);

	// Browsing the list used none of the detail budget
	let res = send(&env, request("GET", "198.51.100.40:5000", &detail, None)).await;
	assert_eq!(res.status(), StatusCode::OK);
	assert_eq!(res.headers()["X-RateLimit-Remaining"], "19");
	let res = send(&env, request("GET", "198.51.100.40:5000", &format!("{}/comments", detail), None)).await;
	assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_flooding_client_blocked_everywhere() {
	let env = setup(ReputationConfig { suspicious_threshold: 5, ..ReputationConfig::default() }).await;

	for _ in 0..5 {
		let res = send(&env, request("GET", "203.0.113.5:5000", "/health", None)).await;
		assert_eq!(res.status(), StatusCode::OK);
	}
	let res = send(&env, request("GET", "203.0.113.5:5000", "/health", None)).await;
	assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);

	// Blocked on every path, even ones that do not exist
	for uri in ["/api/maps", "/no/such/page", "/api/auth/session"] {
		let res = send(&env, request("GET", "203.0.113.5:5000", uri, None)).await;
		assert_eq!(res.status(), StatusCode::FORBIDDEN, "{}", uri);
	}

	let res = send(&env, request("GET", "203.0.113.6:5000", "/health", None)).await;
	assert_eq!(res.status(), StatusCode::OK);

	assert!(env.app.ip_reputation.unblock("203.0.113.5"));
	let res = send(&env, request("GET", "203.0.113.5:5000", "/health", None)).await;
	assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_routes_through_full_stack() {
	let env = setup(ReputationConfig::default()).await;
	let admin_id = mapmart::bootstrap::ensure_admin(&env.app, "root@example.com", "admin-password".into())
		.await
		.unwrap();
	// Idempotent
	let again = mapmart::bootstrap::ensure_admin(&env.app, "ROOT@example.com", "other-password".into())
		.await
		.unwrap();
	assert_eq!(admin_id, again);

	let body = json!({ "email": "root@example.com", "password": "admin-password" });
	let res = send(&env, request("POST", "198.51.100.20:5000", "/api/auth/login", Some(body))).await;
	assert_eq!(res.status(), StatusCode::OK);
	let cookie = res.headers()[header::SET_COOKIE].to_str().unwrap().split(';').next().unwrap().to_string();

	let mut req = request("POST", "198.51.100.20:5000", "/api/admin/block-ip", Some(json!({ "ip": "192.0.2.99" })));
	req.headers_mut().insert(header::COOKIE, cookie.parse().unwrap());
	let res = send(&env, req).await;
	assert_eq!(res.status(), StatusCode::OK);

	let res = send(&env, request("GET", "192.0.2.99:5000", "/health", None)).await;
	assert_eq!(res.status(), StatusCode::FORBIDDEN);

	// Without a session the admin API is closed
	let res = send(&env, request("GET", "198.51.100.21:5000", "/api/admin/blocked-ips", None)).await;
	assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_management_closed_to_regular_users() {
	let env = setup(ReputationConfig::default()).await;
	let user_id = env
		.app
		.meta_adapter
		.create_user(CreateUser {
			email: "ana@example.com",
			name: "Ana",
			password_hash: None,
			auth_provider: AuthProvider::Local,
			is_admin: false,
		})
		.await
		.unwrap();
	let token = env.app.sessions.issue(SessionCtx { user_id, is_admin: false }).unwrap();
	let map_id = seed_map(&env, "Old Town", false).await;

	let cases = [
		("POST", "/api/admin/maps".to_string()),
		("PATCH", format!("/api/admin/maps/{}", map_id)),
		("DELETE", format!("/api/admin/maps/{}", map_id)),
		("DELETE", "/api/admin/comments/1".to_string()),
		("GET", "/api/admin/users".to_string()),
		("POST", format!("/api/admin/users/{}/toggle-admin", user_id)),
		("POST", format!("/api/admin/users/{}/password", user_id)),
		("GET", "/api/admin/stats".to_string()),
	];
	for (method, uri) in cases {
		let mut req = request(method, "198.51.100.50:5000", &uri, None);
		req.headers_mut().insert(header::AUTHORIZATION, format!("Bearer {}", token).parse().unwrap());
		let res = send(&env, req).await;
		assert_eq!(res.status(), StatusCode::FORBIDDEN, "{} {}", method, uri);
	}
	assert!(env.app.meta_adapter.read_map(map_id).await.is_ok());
}

#[tokio::test]
async fn test_builder_requires_adapter_and_secret() {
	let res = AppBuilder::new().session_secret(b"0123456789abcdef".as_slice()).build();
	assert!(res.is_err());

	let temp = TempDir::new().unwrap();
	let adapter = Arc::new(MetaAdapterSqlite::new(temp.path()).await.unwrap());
	let res = AppBuilder::new().meta_adapter(adapter).session_ttl(Duration::from_secs(60)).build();
	assert!(res.is_err());
}

// vim: ts=4
