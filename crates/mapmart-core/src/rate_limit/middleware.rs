//! Rate Limiting Middleware
//!
//! Tower layer applied per route with `route_layer`, so the scope is fixed
//! at router construction time.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::HeaderValue;
use axum::response::IntoResponse;
use futures::future::BoxFuture;
use hyper::Request;
use tower::{Layer, Service};

use super::extractors::extract_client_ip;
use super::limiter::{RateLimitStatus, RateLimiter};
use crate::app::ServerMode;

#[derive(Clone)]
pub struct RateLimitLayer {
	limiter: Arc<RateLimiter>,
	scope: &'static str,
	mode: ServerMode,
}

impl RateLimitLayer {
	pub fn new(limiter: Arc<RateLimiter>, scope: &'static str, mode: ServerMode) -> Self {
		Self { limiter, scope, mode }
	}
}

impl<S> Layer<S> for RateLimitLayer {
	type Service = RateLimitService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		RateLimitService {
			inner,
			limiter: self.limiter.clone(),
			scope: self.scope,
			mode: self.mode,
		}
	}
}

#[derive(Clone)]
pub struct RateLimitService<S> {
	inner: S,
	limiter: Arc<RateLimiter>,
	scope: &'static str,
	mode: ServerMode,
}

fn insert_status_headers(res: &mut axum::response::Response, status: RateLimitStatus) {
	let headers = res.headers_mut();
	headers.insert("X-RateLimit-Limit", HeaderValue::from(status.limit));
	headers.insert("X-RateLimit-Remaining", HeaderValue::from(status.remaining));
	headers.insert("X-RateLimit-Reset", HeaderValue::from(status.reset_secs));
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
	S: Service<Request<Body>, Response = axum::response::Response> + Clone + Send + 'static,
	S::Future: Send + 'static,
{
	type Response = S::Response;
	type Error = S::Error;
	type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, req: Request<Body>) -> Self::Future {
		let limiter = self.limiter.clone();
		let scope = self.scope;
		let mode = self.mode;
		let mut inner = self.inner.clone();

		Box::pin(async move {
			// Unknown client identity is not limited
			let Some(client) = extract_client_ip(&req, mode) else {
				return inner.call(req).await;
			};

			match limiter.check(scope, client) {
				Err(error) => Ok(error.into_response()),
				Ok(status) => {
					let mut res = inner.call(req).await?;
					if let Some(status) = status {
						insert_status_headers(&mut res, status);
					}
					Ok(res)
				}
			}
		})
	}
}

// vim: ts=4
