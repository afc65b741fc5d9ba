//! Error types for `memopal-core`.
//!
//! The messages double as the `error` field of the HTTP envelope, so they are
//! written for end users.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  Validation(String),

  #[error("Not authorized to access this route")]
  Unauthenticated,

  #[error("Not authorized to access this memory")]
  Forbidden,

  #[error("Memory not found")]
  NotFound(uuid::Uuid),

  #[error("User not found")]
  UserNotFound,

  #[error("User already exists")]
  DuplicateEmail,

  #[error("Invalid credentials")]
  InvalidCredentials,

  #[error("Face not recognized")]
  FaceNotRecognized,

  #[error("inference service error: {0}")]
  Upstream(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }
}

/// Convert a backend error into the core taxonomy; for use with `map_err`.
pub fn from_store<E: Into<Error>>(e: E) -> Error { e.into() }

pub type Result<T, E = Error> = std::result::Result<T, E>;
