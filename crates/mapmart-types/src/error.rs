//! Error type shared by every MapMart crate.
//!
//! Handlers return `ClResult<T>`; the `IntoResponse` impl turns an error into
//! a JSON body of the form `{"error": {"code": "E-...", "message": "..."}}`.

use axum::{http::StatusCode, response::IntoResponse, Json};

pub type ClResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	NotFound,
	PermissionDenied,
	Unauthorized,
	ValidationError(String),
	Conflict(String),
	PayloadTooLarge(String),
	DbError,
	Parse,
	ConfigError(String),
	ServiceUnavailable(String),
	Internal(String),

	// externals
	Io(std::io::Error),
}

impl Error {
	fn status(&self) -> StatusCode {
		match self {
			Error::NotFound => StatusCode::NOT_FOUND,
			Error::PermissionDenied => StatusCode::FORBIDDEN,
			Error::Unauthorized => StatusCode::UNAUTHORIZED,
			Error::ValidationError(_) | Error::Parse => StatusCode::BAD_REQUEST,
			Error::Conflict(_) => StatusCode::CONFLICT,
			Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
			Error::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
			Error::DbError | Error::ConfigError(_) | Error::Internal(_) | Error::Io(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}

	fn code(&self) -> &'static str {
		match self {
			Error::NotFound => "E-NOT-FOUND",
			Error::PermissionDenied => "E-PERMISSION-DENIED",
			Error::Unauthorized => "E-UNAUTHORIZED",
			Error::ValidationError(_) => "E-VALIDATION",
			Error::Parse => "E-PARSE",
			Error::Conflict(_) => "E-CONFLICT",
			Error::PayloadTooLarge(_) => "E-TOO-LARGE",
			Error::ServiceUnavailable(_) => "E-UNAVAILABLE",
			Error::DbError | Error::ConfigError(_) | Error::Internal(_) | Error::Io(_) => {
				"E-INTERNAL"
			}
		}
	}

	/// Message safe to show to clients. Internal details stay in the logs.
	fn public_message(&self) -> String {
		match self {
			Error::NotFound => "Not found".to_string(),
			Error::PermissionDenied => "Permission denied".to_string(),
			Error::Unauthorized => "Authentication required".to_string(),
			Error::ValidationError(msg) | Error::Conflict(msg) | Error::PayloadTooLarge(msg) => {
				msg.clone()
			}
			Error::Parse => "Malformed request".to_string(),
			Error::ServiceUnavailable(_) => "Service temporarily unavailable".to_string(),
			Error::DbError | Error::ConfigError(_) | Error::Internal(_) | Error::Io(_) => {
				"Internal server error".to_string()
			}
		}
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::PermissionDenied => write!(f, "permission denied"),
			Error::Unauthorized => write!(f, "unauthorized"),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::Conflict(msg) => write!(f, "conflict: {}", msg),
			Error::PayloadTooLarge(msg) => write!(f, "payload too large: {}", msg),
			Error::DbError => write!(f, "database error"),
			Error::Parse => write!(f, "parse error"),
			Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
			Error::ServiceUnavailable(msg) => write!(f, "service unavailable: {}", msg),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
			Error::Io(err) => write!(f, "io error: {}", err),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Error::Io(err) => Some(err),
			_ => None,
		}
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		tracing::debug!("JSON error: {}", err);
		Self::Parse
	}
}

impl From<std::num::ParseIntError> for Error {
	fn from(_err: std::num::ParseIntError) -> Self {
		Self::Parse
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		let status = self.status();
		if status.is_server_error() {
			tracing::warn!("Request failed: {}", self);
		}
		let body = serde_json::json!({
			"error": {
				"code": self.code(),
				"message": self.public_message(),
			}
		});
		(status, Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_mapping() {
		assert_eq!(Error::NotFound.status(), StatusCode::NOT_FOUND);
		assert_eq!(Error::Unauthorized.status(), StatusCode::UNAUTHORIZED);
		assert_eq!(Error::ValidationError("x".into()).status(), StatusCode::BAD_REQUEST);
		assert_eq!(Error::DbError.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}

	#[test]
	fn test_internal_details_hidden() {
		let err = Error::Internal("secret path /var/db".into());
		assert_eq!(err.public_message(), "Internal server error");
		assert!(err.to_string().contains("/var/db"));
	}
}

// vim: ts=4
