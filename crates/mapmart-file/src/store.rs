//! Upload storage
//!
//! Files live under `<upload_dir>/<dir>/` and are referenced by
//! `/uploads/<dir>/<name>` URLs. Names carry a random token so a replaced
//! file never shares a URL with its predecessor.

use crate::prelude::*;
use mapmart_types::utils::random_token;

pub const UPLOAD_URL_PREFIX: &str = "/uploads/";
const NAME_TOKEN_LENGTH: usize = 16;

/// Writes `data` as `<prefix>_<token>.jpg` under `dir`, returns its URL
pub async fn store_jpeg(app: &App, dir: &str, prefix: &str, data: &[u8]) -> ClResult<Box<str>> {
	let stored_name = format!("{}_{}.jpg", prefix, random_token(NAME_TOKEN_LENGTH)?);
	let path = app.opts.upload_dir.join(dir);
	tokio::fs::create_dir_all(&path).await?;
	tokio::fs::write(path.join(&stored_name), data).await?;
	debug!("Stored upload {}/{} ({} bytes)", dir, stored_name, data.len());
	Ok(format!("{}{}/{}", UPLOAD_URL_PREFIX, dir, stored_name).into())
}

/// File name of `url` if it points into `dir`, `None` for anything else
pub fn stored_name<'a>(dir: &str, url: &'a str) -> Option<&'a str> {
	url.strip_prefix(UPLOAD_URL_PREFIX)?.strip_prefix(dir)?.strip_prefix('/')
}

/// Deletes a previously stored upload. URLs outside `dir` (defaults,
/// external pictures) are left alone.
pub async fn remove_upload(app: &App, dir: &str, url: &str) {
	let Some(file_name) = stored_name(dir, url) else {
		return;
	};
	if file_name.is_empty() || file_name.starts_with('.') || file_name.contains(['/', '\\']) {
		warn!("Refusing to remove suspicious upload path: {}", url);
		return;
	}

	let path = app.opts.upload_dir.join(dir).join(file_name);
	match tokio::fs::remove_file(&path).await {
		Ok(()) => debug!("Removed upload {}", path.display()),
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
		Err(err) => warn!("Could not remove upload {}: {}", path.display(), err),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_stored_name() {
		assert_eq!(stored_name("maps", "/uploads/maps/map_abc.jpg"), Some("map_abc.jpg"));
		assert_eq!(stored_name("maps", "/uploads/profiles/user_1.jpg"), None);
		assert_eq!(stored_name("maps", "/uploads/mapsx/a.jpg"), None);
		assert_eq!(stored_name("maps", "/static/image/HBU.jpg"), None);
		assert_eq!(stored_name("profiles", "default.jpg"), None);
	}
}

// vim: ts=4
