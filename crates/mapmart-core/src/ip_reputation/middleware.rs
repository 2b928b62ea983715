//! IP reputation middleware
//!
//! Applied as the outermost layer of the router so it sees every request
//! before routing, auth or per-route limits.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::IntoResponse;
use futures::future::BoxFuture;
use hyper::Request;
use tower::{Layer, Service};

use super::tracker::IpReputationTracker;
use crate::app::ServerMode;
use crate::rate_limit::extract_client_ip;

#[derive(Clone)]
pub struct IpReputationLayer {
	tracker: Arc<IpReputationTracker>,
	mode: ServerMode,
}

impl IpReputationLayer {
	pub fn new(tracker: Arc<IpReputationTracker>, mode: ServerMode) -> Self {
		Self { tracker, mode }
	}
}

impl<S> Layer<S> for IpReputationLayer {
	type Service = IpReputationService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		IpReputationService { inner, tracker: self.tracker.clone(), mode: self.mode }
	}
}

#[derive(Clone)]
pub struct IpReputationService<S> {
	inner: S,
	tracker: Arc<IpReputationTracker>,
	mode: ServerMode,
}

impl<S> Service<Request<Body>> for IpReputationService<S>
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
		let tracker = self.tracker.clone();
		let mode = self.mode;
		let mut inner = self.inner.clone();

		Box::pin(async move {
			if let Some(ip) = extract_client_ip(&req, mode) {
				let decision = tracker.check_and_record(&ip.to_string());
				if let Some(rejection) = decision.rejection() {
					return Ok(rejection.into_response());
				}
			}

			inner.call(req).await
		})
	}
}

// vim: ts=4
