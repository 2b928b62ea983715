//! Shared helpers for the core integration tests

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;

/// Initializes a test subscriber once, so `RUST_LOG` output shows up
pub fn setup_test_logging() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// GET request as if it came from `peer`
pub fn request_from(peer: &str, uri: &str) -> Request<Body> {
	let mut req = Request::builder().uri(uri).body(Body::empty()).unwrap();
	let addr: SocketAddr = peer.parse().unwrap();
	req.extensions_mut().insert(ConnectInfo(addr));
	req
}

// vim: ts=4
