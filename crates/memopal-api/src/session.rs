//! Stateless session tokens.
//!
//! Tokens use the compact JWT layout with HS256:
//! `base64url(header).base64url(claims).base64url(signature)`, where the
//! claims are `{sub, iat, exp}`. Validity depends only on the signature and
//! the expiry, so verification never touches the store.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use memopal_core::{Error, Identity, Result};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Longest accepted session lifetime, in days.
pub const MAX_TTL_DAYS: i64 = 3650;

#[derive(Debug, Error)]
pub enum SignerError {
  #[error("token secret must not be empty")]
  EmptySecret,
  #[error("token ttl must be between one second and {} days", MAX_TTL_DAYS)]
  TtlOutOfRange,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
  sub: Uuid,
  iat: i64,
  exp: i64,
}

#[derive(Deserialize)]
struct Header {
  alg: String,
}

/// Issues and verifies session tokens with one shared secret.
#[derive(Clone)]
pub struct TokenSigner {
  mac: HmacSha256,
  ttl: Duration,
}

impl TokenSigner {
  pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Result<Self, SignerError> {
    let secret = secret.as_ref();
    if secret.is_empty() {
      return Err(SignerError::EmptySecret);
    }
    if ttl < Duration::seconds(1) || ttl > Duration::days(MAX_TTL_DAYS) {
      return Err(SignerError::TtlOutOfRange);
    }
    let mac =
      HmacSha256::new_from_slice(secret).map_err(|_| SignerError::EmptySecret)?;
    Ok(Self { mac, ttl })
  }

  pub fn issue(&self, user_id: Uuid) -> Result<String, ApiError> {
    self.issue_at(user_id, Utc::now())
  }

  fn issue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String, ApiError> {
    let exp = now
      .checked_add_signed(self.ttl)
      .ok_or_else(|| ApiError::Internal("token expiry out of range".into()))?;
    let claims = Claims { sub: user_id, iat: now.timestamp(), exp: exp.timestamp() };
    let claims = serde_json::to_vec(&claims).map_err(Error::from)?;
    let signing_input = format!("{}.{}", B64.encode(HEADER), B64.encode(claims));
    let mut mac = self.mac.clone();
    mac.update(signing_input.as_bytes());
    let signature = B64.encode(mac.finalize().into_bytes());
    Ok(format!("{signing_input}.{signature}"))
  }

  /// Resolve a token to the identity it was issued for. Every failure is
  /// [`Error::Unauthenticated`].
  pub fn verify(&self, token: &str) -> Result<Identity> {
    self.verify_at(token, Utc::now())
  }

  fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity> {
    let mut parts = token.split('.');
    let (Some(header), Some(claims), Some(signature), None) =
      (parts.next(), parts.next(), parts.next(), parts.next())
    else {
      return Err(Error::Unauthenticated);
    };

    let signature = B64.decode(signature).map_err(|_| Error::Unauthenticated)?;
    let mut mac = self.mac.clone();
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(claims.as_bytes());
    mac
      .verify_slice(&signature)
      .map_err(|_| Error::Unauthenticated)?;

    let header: Header = decode_segment(header)?;
    if header.alg != "HS256" {
      return Err(Error::Unauthenticated);
    }
    let claims: Claims = decode_segment(claims)?;
    if claims.exp <= now.timestamp() {
      return Err(Error::Unauthenticated);
    }
    Ok(Identity::new(claims.sub))
  }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T> {
  let raw = B64.decode(segment).map_err(|_| Error::Unauthenticated)?;
  serde_json::from_slice(&raw).map_err(|_| Error::Unauthenticated)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn signer() -> TokenSigner {
    TokenSigner::new("test-secret", Duration::days(30)).unwrap()
  }

  #[test]
  fn issued_token_verifies() {
    let id = Uuid::new_v4();
    let token = signer().issue(id).unwrap();
    assert_eq!(signer().verify(&token).unwrap().user_id(), id);
  }

  #[test]
  fn expired_token_is_rejected() {
    let s = signer();
    let issued = Utc::now() - Duration::days(31);
    let token = s.issue_at(Uuid::new_v4(), issued).unwrap();
    assert!(matches!(s.verify(&token), Err(Error::Unauthenticated)));
  }

  #[test]
  fn token_from_another_secret_is_rejected() {
    let other = TokenSigner::new("other-secret", Duration::days(30)).unwrap();
    let token = other.issue(Uuid::new_v4()).unwrap();
    assert!(matches!(signer().verify(&token), Err(Error::Unauthenticated)));
  }

  #[test]
  fn tampered_claims_are_rejected() {
    let s = signer();
    let token = s.issue(Uuid::new_v4()).unwrap();
    let mut parts: Vec<&str> = token.split('.').collect();
    let forged = B64.encode(format!(
      r#"{{"sub":"{}","iat":0,"exp":9999999999}}"#,
      Uuid::new_v4()
    ));
    parts[1] = &forged;
    assert!(matches!(s.verify(&parts.join(".")), Err(Error::Unauthenticated)));
  }

  #[test]
  fn garbage_is_rejected() {
    let s = signer();
    for token in ["", "abc", "a.b.c", "a.b.c.d"] {
      assert!(matches!(s.verify(token), Err(Error::Unauthenticated)), "{token}");
    }
  }

  #[test]
  fn empty_secret_is_refused() {
    assert!(matches!(
      TokenSigner::new("", Duration::days(1)),
      Err(SignerError::EmptySecret)
    ));
  }

  #[test]
  fn ttl_outside_bounds_is_refused() {
    let max = Duration::days(MAX_TTL_DAYS);
    for ttl in [Duration::zero(), Duration::days(-1), max + Duration::days(1)] {
      assert!(matches!(
        TokenSigner::new("secret", ttl),
        Err(SignerError::TtlOutOfRange)
      ));
    }
    assert!(TokenSigner::new("secret", max).is_ok());
  }

  #[test]
  fn expiry_overflow_is_an_error() {
    let s = signer();
    let late = DateTime::<Utc>::MAX_UTC - Duration::days(1);
    assert!(matches!(s.issue_at(Uuid::new_v4(), late), Err(ApiError::Internal(_))));
  }
}
