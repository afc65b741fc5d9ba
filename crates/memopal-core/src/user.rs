//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Minimum accepted password length at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// An opaque face-encoding vector produced by the inference service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceEncoding(pub Vec<f64>);

/// A registered user as exposed over the API. The password hash is kept in
/// [`UserCredentials`] and never serialised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id:         Uuid,
  pub name:       String,
  pub email:      String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub face_data:  Option<FaceEncoding>,
  pub created_at: DateTime<Utc>,
}

/// A user together with the stored argon2 PHC string.
#[derive(Debug, Clone)]
pub struct UserCredentials {
  pub user:          User,
  pub password_hash: String,
}

/// Input to [`crate::store::MemoPalStore::create_user`]. The store assigns
/// the id and creation time.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:          String,
  /// Already normalised with [`normalize_email`].
  pub email:         String,
  pub password_hash: String,
}

/// Canonical form used for storage and lookup.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

/// Check registration input before any hashing or store access.
pub fn validate_registration(
  name: &str,
  email: &str,
  password: &str,
) -> Result<()> {
  if name.trim().is_empty() {
    return Err(Error::validation("Please add a name"));
  }
  let email = email.trim();
  if email.is_empty() {
    return Err(Error::validation("Please add an email"));
  }
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
    _ => return Err(Error::validation("Please add a valid email")),
  }
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(Error::validation(format!(
      "Password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }
  Ok(())
}
