//! Federated sign-in: ID token verification
//!
//! Google signs its ID tokens with keys published as a JWK set. The
//! verifier keeps a copy of that set, picks the key named by the token's
//! `kid` header and lets the key decide the algorithm.

use std::str::FromStr;

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::prelude::*;

pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Identity asserted by a verified ID token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityClaims {
	/// Stable account id at the identity provider
	pub subject: Box<str>,
	pub email: Box<str>,
	pub name: Option<Box<str>>,
	pub picture: Option<Box<str>>,
}

pub trait IdTokenVerifier: std::fmt::Debug + Send + Sync {
	/// Fails with `Unauthorized` for any token that does not verify
	fn verify(&self, token: &str) -> ClResult<IdentityClaims>;
}

#[derive(Debug, Deserialize)]
struct GoogleClaims {
	sub: String,
	email: Option<String>,
	email_verified: Option<bool>,
	name: Option<String>,
	picture: Option<String>,
}

#[derive(Debug)]
pub struct JwksIdTokenVerifier {
	client_id: Box<str>,
	issuers: Vec<Box<str>>,
	keys: JwkSet,
}

fn rejected(reason: impl std::fmt::Display) -> Error {
	debug!("Rejected ID token: {}", reason);
	Error::Unauthorized
}

impl JwksIdTokenVerifier {
	/// Verifier for tokens issued by Google to `client_id`, checked against
	/// the JWK set in `jwks_json`
	pub fn google(client_id: &str, jwks_json: &str) -> ClResult<Self> {
		Self::new(client_id, &GOOGLE_ISSUERS, jwks_json)
	}

	pub fn new(client_id: &str, issuers: &[&str], jwks_json: &str) -> ClResult<Self> {
		if client_id.trim().is_empty() {
			return Err(Error::ConfigError("ID token client id is empty".into()));
		}
		let keys: JwkSet = serde_json::from_str(jwks_json)
			.map_err(|err| Error::ConfigError(format!("invalid JWK set: {}", err)))?;
		if keys.keys.is_empty() {
			return Err(Error::ConfigError("JWK set has no keys".into()));
		}
		Ok(Self {
			client_id: client_id.trim().into(),
			issuers: issuers.iter().map(|i| Box::from(*i)).collect(),
			keys,
		})
	}
}

impl IdTokenVerifier for JwksIdTokenVerifier {
	fn verify(&self, token: &str) -> ClResult<IdentityClaims> {
		let header = jsonwebtoken::decode_header(token).map_err(rejected)?;
		let kid = header.kid.ok_or_else(|| rejected("no key id"))?;
		let jwk = self.keys.find(&kid).ok_or_else(|| rejected(format!("unknown key {}", kid)))?;

		let algorithm = match &jwk.common.key_algorithm {
			Some(alg) => Algorithm::from_str(&alg.to_string()).map_err(rejected)?,
			None => Algorithm::RS256,
		};
		let key = DecodingKey::from_jwk(jwk).map_err(rejected)?;

		let mut validation = Validation::new(algorithm);
		validation.set_audience(&[self.client_id.as_ref()]);
		validation.set_issuer(&self.issuers);

		let claims = jsonwebtoken::decode::<GoogleClaims>(token, &key, &validation)
			.map_err(rejected)?
			.claims;
		if claims.email_verified == Some(false) {
			return Err(rejected("email not verified"));
		}
		let email = claims.email.filter(|e| !e.is_empty()).ok_or_else(|| rejected("no email"))?;
		if claims.sub.is_empty() {
			return Err(rejected("no subject"));
		}

		Ok(IdentityClaims {
			subject: claims.sub.into(),
			email: email.into(),
			name: claims.name.map(Into::into),
			picture: claims.picture.map(Into::into),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use jsonwebtoken::{EncodingKey, Header};
	use serde_json::json;

	// base64url("mapmart-id-token-test-secret-01")
	const SECRET: &[u8] = b"mapmart-id-token-test-secret-01";
	const JWKS: &str = r#"{"keys":[{"kty":"oct","kid":"k1","alg":"HS256","k":"bWFwbWFydC1pZC10b2tlbi10ZXN0LXNlY3JldC0wMQ"}]}"#;

	fn token(kid: Option<&str>, claims: &serde_json::Value) -> String {
		let mut header = Header::new(Algorithm::HS256);
		header.kid = kid.map(str::to_owned);
		jsonwebtoken::encode(&header, claims, &EncodingKey::from_secret(SECRET)).unwrap()
	}

	fn claims(aud: &str, iss: &str) -> serde_json::Value {
		json!({
			"sub": "1234567890",
			"email": "ana@example.com",
			"email_verified": true,
			"name": "Ana",
			"aud": aud,
			"iss": iss,
			"exp": mapmart_types::types::now().add_seconds(600).0,
		})
	}

	fn verifier() -> JwksIdTokenVerifier {
		JwksIdTokenVerifier::google("client-1", JWKS).unwrap()
	}

	#[test]
	fn test_valid_token() {
		let identity = verifier().verify(&token(Some("k1"), &claims("client-1", "accounts.google.com"))).unwrap();
		assert_eq!(identity.subject.as_ref(), "1234567890");
		assert_eq!(identity.email.as_ref(), "ana@example.com");
		assert_eq!(identity.name.as_deref(), Some("Ana"));
		assert_eq!(identity.picture, None);
	}

	#[test]
	fn test_rejections() {
		let v = verifier();
		let wrong_aud = token(Some("k1"), &claims("someone-else", "https://accounts.google.com"));
		let wrong_iss = token(Some("k1"), &claims("client-1", "https://evil.example.com"));
		let unknown_kid = token(Some("k2"), &claims("client-1", "accounts.google.com"));
		let no_kid = token(None, &claims("client-1", "accounts.google.com"));
		let mut unverified = claims("client-1", "accounts.google.com");
		unverified["email_verified"] = json!(false);
		let unverified = token(Some("k1"), &unverified);

		for t in [wrong_aud, wrong_iss, unknown_kid, no_kid, unverified, "garbage".to_string()] {
			assert!(matches!(v.verify(&t), Err(Error::Unauthorized)), "{}", t);
		}
	}

	#[test]
	fn test_bad_config() {
		assert!(matches!(JwksIdTokenVerifier::google("client-1", "{}"), Err(Error::ConfigError(_))));
		assert!(matches!(JwksIdTokenVerifier::google("client-1", r#"{"keys":[]}"#), Err(Error::ConfigError(_))));
		assert!(matches!(JwksIdTokenVerifier::google(" ", JWKS), Err(Error::ConfigError(_))));
	}
}

// vim: ts=4
