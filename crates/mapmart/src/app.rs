//! App builder - constructs and runs the MapMart application

use std::{path::Path, sync::Arc, time::Duration};

use crate::meta_adapter::MetaAdapter;
use crate::prelude::*;
use crate::worker::WorkerPool;
use crate::{bootstrap, routes, webserver};
use mapmart_core::chat_room::ChatConfig;
use mapmart_core::id_token::IdTokenVerifier;
use mapmart_core::ip_reputation::ReputationConfig;
use mapmart_core::rate_limit::RateLimitConfig;
pub use mapmart_core::app::{App, AppOpts, AppState, ServerMode, VERSION};

/// Interval of the housekeeping sweep over rate limit windows and reset tokens
const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(300);

pub struct AppBuilder {
	opts: AppOpts,
	session_secret: Option<Box<[u8]>>,
	worker: Option<Arc<WorkerPool>>,
	meta_adapter: Option<Arc<dyn MetaAdapter>>,
	admin_account: Option<(Box<str>, Box<str>)>,
}

impl AppBuilder {
	pub fn new() -> Self {
		// A second builder in the same process keeps the first subscriber
		let _ = tracing_subscriber::fmt()
			.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
			.with_target(false)
			.try_init();
		AppBuilder {
			opts: AppOpts::default(),
			session_secret: None,
			worker: None,
			meta_adapter: None,
			admin_account: None,
		}
	}

	// Opts
	pub fn mode(&mut self, mode: ServerMode) -> &mut Self {
		self.opts.mode = mode;
		self
	}
	pub fn listen(&mut self, listen: impl Into<Box<str>>) -> &mut Self {
		self.opts.listen = listen.into();
		self
	}
	pub fn dist_dir(&mut self, dist_dir: impl Into<Box<Path>>) -> &mut Self {
		self.opts.dist_dir = Some(dist_dir.into());
		self
	}
	pub fn upload_dir(&mut self, upload_dir: impl Into<Box<Path>>) -> &mut Self {
		self.opts.upload_dir = upload_dir.into();
		self
	}
	pub fn session_ttl(&mut self, ttl: Duration) -> &mut Self {
		self.opts.session_ttl = ttl;
		self
	}
	pub fn session_secret(&mut self, secret: impl Into<Box<[u8]>>) -> &mut Self {
		self.session_secret = Some(secret.into());
		self
	}
	pub fn reputation(&mut self, reputation: ReputationConfig) -> &mut Self {
		self.opts.reputation = reputation;
		self
	}
	pub fn rate_limit(&mut self, rate_limit: RateLimitConfig) -> &mut Self {
		self.opts.rate_limit = rate_limit;
		self
	}
	pub fn chat(&mut self, chat: ChatConfig) -> &mut Self {
		self.opts.chat = chat;
		self
	}
	/// Enables Google sign-in with the given ID token verifier
	pub fn google_signin(&mut self, verifier: Arc<dyn IdTokenVerifier>) -> &mut Self {
		self.opts.google_signin = Some(verifier);
		self
	}
	pub fn worker(&mut self, worker: Arc<WorkerPool>) -> &mut Self {
		self.worker = Some(worker);
		self
	}
	/// Administrator account ensured at startup
	pub fn admin_account(
		&mut self,
		email: impl Into<Box<str>>,
		password: impl Into<Box<str>>,
	) -> &mut Self {
		self.admin_account = Some((email.into(), password.into()));
		self
	}

	// Adapters
	pub fn meta_adapter(&mut self, meta_adapter: Arc<dyn MetaAdapter>) -> &mut Self {
		self.meta_adapter = Some(meta_adapter);
		self
	}

	/// Assembles the app state without starting anything
	pub fn build(&mut self) -> ClResult<App> {
		let Some(meta_adapter) = self.meta_adapter.take() else {
			error!("FATAL: No meta adapter configured");
			return Err(Error::ConfigError("No meta adapter configured".into()));
		};
		let Some(secret) = self.session_secret.take() else {
			error!("FATAL: No session secret configured");
			return Err(Error::ConfigError("No session secret configured".into()));
		};
		let worker = self.worker.take().unwrap_or_else(|| Arc::new(WorkerPool::new(1, 2)));

		let opts = std::mem::take(&mut self.opts);
		AppState::new(opts, &secret, meta_adapter, worker).inspect_err(|err| {
			error!("FATAL: Invalid configuration: {}", err);
		})
	}

	pub async fn run(mut self) -> ClResult<()> {
		info!("  __  __              __  __            _");
		info!(" |  \\/  | __ _ _ __  |  \\/  | __ _ _ __| |_");
		info!(" | |\\/| |/ _` | '_ \\ | |\\/| |/ _` | '__| __|");
		info!(" | |  | | (_| | |_) || |  | | (_| | |  | |_");
		info!(" |_|  |_|\\__,_| .__/ |_|  |_|\\__,_|_|   \\__|");
		info!("              |_|");
		info!("V{}", VERSION);
		info!("");

		let admin_account = self.admin_account.take();
		let app = self.build()?;

		tokio::fs::create_dir_all(&app.opts.upload_dir).await.map_err(|e| {
			error!("FATAL: Cannot create upload dir: {}", e);
			Error::Internal(format!("Cannot create upload dir: {}", e))
		})?;

		if let Some((email, password)) = admin_account {
			bootstrap::ensure_admin(&app, &email, password).await.map_err(|e| {
				error!("FATAL: Bootstrap failed: {}", e);
				e
			})?;
		}

		info!(
			"Abuse control: block after {} requests / {}s, blocks {}",
			app.opts.reputation.suspicious_threshold,
			app.opts.reputation.suspicious_window.as_secs(),
			match app.opts.reputation.block_duration {
				Some(d) => format!("expire after {}s", d.as_secs()),
				None => "are permanent".to_string(),
			}
		);

		let router = routes::init(app.clone());
		let retention = mapmart_chat::spawn_retention_task(app.clone());
		let housekeeping = spawn_housekeeping(app.clone());

		let res = webserver::serve(&app, router).await;

		retention.abort();
		housekeeping.abort();
		info!("MapMart stopped");
		res
	}
}

impl Default for AppBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Periodic sweep of expired rate limit windows and password reset tokens
fn spawn_housekeeping(app: App) -> tokio::task::JoinHandle<()> {
	tokio::spawn(async move {
		let mut interval = tokio::time::interval(HOUSEKEEPING_INTERVAL);
		loop {
			interval.tick().await;
			let windows = app.rate_limiter.purge_expired();
			let stats = app.rate_limiter.stats();
			debug!(
				purged = windows,
				tracked = stats.tracked_keys,
				"Rate limiter sweep done"
			);

			match app.meta_adapter.delete_expired_password_reset_tokens(crate::types::now()).await {
				Ok(0) => {}
				Ok(n) => info!("Removed {} expired password reset tokens", n),
				Err(e) => warn!("Password reset token cleanup failed: {}", e),
			}
		}
	})
}

// vim: ts=4
