//! Custom middlewares

use axum::{
	body::Body,
	extract::State,
	http::{Request, Response},
	middleware::Next,
};
use std::time::Instant;

use crate::extract::Auth;
use crate::prelude::*;
use crate::session::token_from_headers;

/// Installs `Auth` when the request carries a valid session. Invalid or
/// expired tokens leave the request anonymous.
pub async fn optional_auth(State(app): State<App>, mut req: Request<Body>, next: Next) -> Response<Body> {
	let ctx = token_from_headers(req.headers()).and_then(|token| app.sessions.verify(token).ok());
	if let Some(ctx) = ctx {
		req.extensions_mut().insert(Auth(ctx));
	}

	next.run(req).await
}

/// One log line per request
pub async fn request_log(req: Request<Body>, next: Next) -> Response<Body> {
	let start = Instant::now();
	let method = req.method().clone();
	let path = req.uri().path().to_owned();

	let res = next.run(req).await;

	let status = res.status();
	let elapsed_ms = start.elapsed().as_millis();
	if status.is_server_error() {
		warn!("{} {} -> {} ({}ms)", method, path, status.as_u16(), elapsed_ms);
	} else if status.is_client_error() {
		info!("{} {} -> {} ({}ms)", method, path, status.as_u16(), elapsed_ms);
	} else {
		debug!("{} {} -> {} ({}ms)", method, path, status.as_u16(), elapsed_ms);
	}
	res
}

// vim: ts=4
