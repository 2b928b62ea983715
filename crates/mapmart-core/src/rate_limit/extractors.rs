//! Client address extraction
//!
//! Both the IP reputation hook and the per-route limiter key on the client
//! address. Behind a reverse proxy the peer address is the proxy itself, so
//! forwarding headers take precedence in proxy mode.

use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use hyper::Request;

use crate::app::ServerMode;

/// Client address of `req`, or `None` when it cannot be determined
///
/// - Standalone mode: peer address from `ConnectInfo`
/// - Proxy mode: `X-Forwarded-For`, `X-Real-IP`, `Forwarded`, then the peer
pub fn extract_client_ip<B>(req: &Request<B>, mode: ServerMode) -> Option<IpAddr> {
	let peer = || req.extensions().get::<ConnectInfo<SocketAddr>>().map(|ci| ci.0.ip());

	match mode {
		ServerMode::Standalone => peer(),
		ServerMode::Proxy => from_x_forwarded_for(req)
			.or_else(|| from_x_real_ip(req))
			.or_else(|| from_forwarded(req))
			.or_else(peer),
	}
}

fn header_str<'a, B>(req: &'a Request<B>, name: &str) -> Option<&'a str> {
	req.headers().get(name).and_then(|h| h.to_str().ok())
}

/// Leftmost entry of `X-Forwarded-For: client, proxy1, proxy2`
fn from_x_forwarded_for<B>(req: &Request<B>) -> Option<IpAddr> {
	header_str(req, "x-forwarded-for")?.split(',').next()?.trim().parse().ok()
}

fn from_x_real_ip<B>(req: &Request<B>) -> Option<IpAddr> {
	header_str(req, "x-real-ip")?.trim().parse().ok()
}

/// RFC 7239: `for=192.0.2.60;proto=http` or `for="[2001:db8::1]"`
fn from_forwarded<B>(req: &Request<B>) -> Option<IpAddr> {
	let value = header_str(req, "forwarded")?;
	let first = value.split(',').next()?;
	first.split(';').find_map(|part| {
		let (key, val) = part.trim().split_once('=')?;
		if !key.eq_ignore_ascii_case("for") {
			return None;
		}
		val.trim_matches('"').trim_start_matches('[').trim_end_matches(']').parse().ok()
	})
}


// vim: ts=4
