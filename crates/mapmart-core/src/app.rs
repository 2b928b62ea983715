//! App state type

use std::{path::Path, sync::Arc, time::Duration};

use mapmart_types::meta_adapter::MetaAdapter;
use mapmart_types::worker::WorkerPool;

use crate::chat_limit::ChatRateLimiter;
use crate::chat_room::{ChatConfig, ChatRoom};
use crate::id_token::IdTokenVerifier;
use crate::ip_reputation::{IpReputationTracker, ReputationConfig};
use crate::prelude::*;
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::session::SessionKeys;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
	/// Clients connect directly; the peer address identifies them
	Standalone,
	/// Behind a reverse proxy; forwarding headers identify the client
	Proxy,
}

#[derive(Debug)]
pub struct AppOpts {
	pub mode: ServerMode,
	pub listen: Box<str>,
	/// Static frontend files, served as fallback when set
	pub dist_dir: Option<Box<Path>>,
	/// Uploaded profile pictures
	pub upload_dir: Box<Path>,
	pub session_ttl: Duration,
	pub reputation: ReputationConfig,
	pub rate_limit: RateLimitConfig,
	pub chat: ChatConfig,
	/// Google sign-in, disabled when unset
	pub google_signin: Option<Arc<dyn IdTokenVerifier>>,
}

impl Default for AppOpts {
	fn default() -> Self {
		Self {
			mode: ServerMode::Standalone,
			listen: "127.0.0.1:8080".into(),
			dist_dir: None,
			upload_dir: Path::new("./data/uploads").into(),
			session_ttl: Duration::from_secs(7 * 24 * 3600),
			reputation: ReputationConfig::default(),
			rate_limit: RateLimitConfig::default(),
			chat: ChatConfig::default(),
			google_signin: None,
		}
	}
}

#[derive(Debug)]
pub struct AppState {
	pub opts: AppOpts,
	pub worker: Arc<WorkerPool>,
	pub meta_adapter: Arc<dyn MetaAdapter>,
	pub sessions: SessionKeys,

	// Abuse control
	pub ip_reputation: Arc<IpReputationTracker>,
	pub rate_limiter: Arc<RateLimiter>,
	pub chat_limiter: ChatRateLimiter,
	pub chat_room: ChatRoom,
}

pub type App = Arc<AppState>;

impl AppState {
	/// Builds the shared state. Fails if the abuse control settings or the
	/// session secret are invalid.
	pub fn new(
		opts: AppOpts,
		session_secret: &[u8],
		meta_adapter: Arc<dyn MetaAdapter>,
		worker: Arc<WorkerPool>,
	) -> ClResult<App> {
		opts.reputation.validate()?;
		let sessions = SessionKeys::new(session_secret, opts.session_ttl)?;
		let rate_limiter = Arc::new(RateLimiter::new(opts.rate_limit.clone())?);
		let ip_reputation = Arc::new(IpReputationTracker::new(opts.reputation.clone()));
		let chat_limiter = ChatRateLimiter::new(&opts.chat.limit);
		let chat_room = ChatRoom::new(opts.chat.buffer_size);

		Ok(Arc::new(Self {
			opts,
			worker,
			meta_adapter,
			sessions,
			ip_reputation,
			rate_limiter,
			chat_limiter,
			chat_room,
		}))
	}
}

// vim: ts=4
