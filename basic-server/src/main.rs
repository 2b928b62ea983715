//! MapMart server configured from environment variables

use std::{env, path::PathBuf, process::ExitCode, str::FromStr, sync::Arc, time::Duration};

use tracing::error;

use mapmart::chat_limit::ChatLimitConfig;
use mapmart::chat_room::ChatConfig;
use mapmart::id_token::{IdTokenVerifier, JwksIdTokenVerifier};
use mapmart::error::{ClResult, Error};
use mapmart::ip_reputation::ReputationConfig;
use mapmart::worker::WorkerPool;
use mapmart::{AppBuilder, ServerMode};
use mapmart_meta_adapter_sqlite::MetaAdapterSqlite;

fn env_parse<T: FromStr>(name: &str, default: T) -> ClResult<T> {
	match env::var(name) {
		Ok(value) => value
			.trim()
			.parse()
			.map_err(|_| Error::ConfigError(format!("{} has an invalid value: {:?}", name, value))),
		Err(_) => Ok(default),
	}
}

fn env_secs(name: &str, default: u64) -> ClResult<Duration> {
	env_parse(name, default).map(Duration::from_secs)
}

fn retention_secs(hours: u64) -> ClResult<u64> {
	hours
		.checked_mul(3600)
		.ok_or_else(|| Error::ConfigError(format!("CHAT_RETENTION_HOURS is too large: {}", hours)))
}

fn parse_mode(value: &str) -> ClResult<ServerMode> {
	match value {
		"standalone" => Ok(ServerMode::Standalone),
		"proxy" => Ok(ServerMode::Proxy),
		other => Err(Error::ConfigError(format!("MODE must be standalone or proxy, not {:?}", other))),
	}
}

/// Google sign-in needs both the OAuth client id and a copy of Google's
/// published signing keys
async fn google_verifier() -> ClResult<Option<Arc<dyn IdTokenVerifier>>> {
	let (Ok(client_id), Ok(jwks_file)) = (env::var("GOOGLE_CLIENT_ID"), env::var("GOOGLE_JWKS_FILE"))
	else {
		return Ok(None);
	};
	let jwks = tokio::fs::read_to_string(&jwks_file)
		.await
		.map_err(|e| Error::ConfigError(format!("cannot read GOOGLE_JWKS_FILE {}: {}", jwks_file, e)))?;
	Ok(Some(Arc::new(JwksIdTokenVerifier::google(&client_id, &jwks)?)))
}

async fn run(mut builder: AppBuilder) -> ClResult<()> {
	let db_dir = PathBuf::from(env::var("DB_DIR").unwrap_or_else(|_| "./data".into()));
	let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "./data/uploads".into()));
	let Ok(session_secret) = env::var("SESSION_SECRET") else {
		return Err(Error::ConfigError("SESSION_SECRET is required".into()));
	};

	// Unset or zero: blocks last until an admin lifts them
	let block_duration = match env_parse("BLOCK_DURATION", 0u64)? {
		0 => None,
		secs => Some(Duration::from_secs(secs)),
	};
	let reputation = ReputationConfig {
		suspicious_threshold: env_parse("SUSPICIOUS_THRESHOLD", 100)?,
		suspicious_window: env_secs("SUSPICIOUS_WINDOW", 60)?,
		block_duration,
		..ReputationConfig::default()
	};
	let chat = ChatConfig {
		limit: ChatLimitConfig {
			max_messages: env_parse("CHAT_MAX_MESSAGES", 10)?,
			window: env_secs("CHAT_WINDOW", 60)?,
		},
		retention: Duration::from_secs(retention_secs(env_parse("CHAT_RETENTION_HOURS", 24u64)?)?),
		history_limit: env_parse("CHAT_HISTORY_LIMIT", 100)?,
		..ChatConfig::default()
	};

	let meta_adapter = Arc::new(MetaAdapterSqlite::new(&db_dir).await?);

	builder
		.mode(parse_mode(env::var("MODE").as_deref().unwrap_or("standalone"))?)
		.listen(env::var("LISTEN").unwrap_or_else(|_| "127.0.0.1:8080".into()))
		.upload_dir(data_dir)
		.session_secret(session_secret.into_bytes())
		.reputation(reputation)
		.chat(chat)
		.worker(Arc::new(WorkerPool::new(1, 2)))
		.meta_adapter(meta_adapter);

	if let Ok(dist_dir) = env::var("DIST_DIR") {
		builder.dist_dir(PathBuf::from(dist_dir));
	}
	if let Some(verifier) = google_verifier().await? {
		builder.google_signin(verifier);
	}
	if let (Ok(email), Ok(password)) = (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
		builder.admin_account(email, password);
	}

	builder.run().await
}

#[tokio::main]
async fn main() -> ExitCode {
	let builder = AppBuilder::new();
	match run(builder).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			error!("FATAL: {}", err);
			ExitCode::FAILURE
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_retention_hours_overflow() {
		assert_eq!(retention_secs(24).ok(), Some(86_400));
		assert!(matches!(retention_secs(u64::MAX / 1000), Err(Error::ConfigError(_))));
	}

	#[test]
	fn test_parse_mode() {
		assert_eq!(parse_mode("proxy").ok(), Some(ServerMode::Proxy));
		assert!(parse_mode("cluster").is_err());
	}
}

// vim: ts=4
