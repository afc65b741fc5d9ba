//! Password hashing and the bearer-token extractor.

use std::sync::LazyLock;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use memopal_core::{Error, Identity, inference::InferenceService, store::MemoPalStore};
use rand_core::OsRng;

use crate::{AppState, error::ApiError};

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

/// Check `password` against a stored PHC string. An unparseable hash never
/// matches.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(password_hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

/// Stands in for the stored hash when a login names no account, so both
/// failure paths pay for one argon2 verification.
static DECOY_HASH: LazyLock<String> =
  LazyLock::new(|| hash_password("memopal-decoy-password").unwrap_or_default());

/// Spend one argon2 verification on `password` without checking anything.
pub fn verify_decoy(password: &str) {
  std::hint::black_box(verify_password(password, &DECOY_HASH));
}

/// The token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

/// Present in a handler means the request carried a valid session token.
pub struct Authenticated(pub Identity);

impl<S, I> FromRequestParts<AppState<S, I>> for Authenticated
where
  S: MemoPalStore,
  I: InferenceService,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, I>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers).ok_or(Error::Unauthenticated)?;
    let identity = state.tokens.verify(token)?;
    Ok(Authenticated(identity))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  #[test]
  fn password_round_trip() {
    let hash = hash_password("secret1").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("secret1", &hash));
    assert!(!verify_password("secret2", &hash));
  }

  #[test]
  fn decoy_hash_is_a_real_argon2_hash() {
    assert!(DECOY_HASH.starts_with("$argon2"));
    assert!(PasswordHash::new(&DECOY_HASH).is_ok());
    assert!(!verify_password("secret1", &DECOY_HASH));
    verify_decoy("secret1");
  }

  #[test]
  fn malformed_hash_never_matches() {
    assert!(!verify_password("secret1", "not-a-phc-string"));
  }

  fn headers(value: &'static str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
    h
  }

  #[test]
  fn bearer_parsing() {
    assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
    assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
    assert_eq!(bearer_token(&headers("Bearer ")), None);
    assert_eq!(bearer_token(&HeaderMap::new()), None);
  }
}
