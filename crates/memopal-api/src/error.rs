//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure is rendered as `{"success": false, "error": "<message>"}`.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use memopal_core::Error as CoreError;
use thiserror::Error;

use crate::reply::ErrorReply;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] CoreError),

  #[error("{0}")]
  BadRequest(String),

  #[error("{0}")]
  NotFound(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  /// For memory ids that cannot name a stored memory.
  pub fn memory_not_found() -> Self {
    ApiError::NotFound("Memory not found".to_string())
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Core(e) => match e {
        CoreError::Validation(_) | CoreError::DuplicateEmail => {
          StatusCode::BAD_REQUEST
        }
        CoreError::Unauthenticated
        | CoreError::InvalidCredentials
        | CoreError::FaceNotRecognized
        | CoreError::Forbidden => StatusCode::UNAUTHORIZED,
        CoreError::NotFound(_) | CoreError::UserNotFound => {
          StatusCode::NOT_FOUND
        }
        CoreError::Upstream(_)
        | CoreError::Serialization(_)
        | CoreError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  /// The text placed in the envelope. Server-side faults are logged here and
  /// replaced with a generic message.
  fn public_message(&self) -> String {
    match self {
      ApiError::Core(CoreError::Upstream(_)) => {
        "AI service unavailable".to_string()
      }
      ApiError::Core(CoreError::Store(_) | CoreError::Serialization(_))
      | ApiError::Internal(_) => {
        tracing::error!(error = %self, "request failed");
        "Server Error".to_string()
      }
      other => other.to_string(),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

/// Path parameters are only ever memory ids, so an unparseable one names a
/// memory that cannot exist.
impl From<PathRejection> for ApiError {
  fn from(_: PathRejection) -> Self { ApiError::memory_not_found() }
}

impl From<std::io::Error> for ApiError {
  fn from(e: std::io::Error) -> Self { ApiError::Internal(e.to_string()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = ErrorReply::new(self.public_message());
    (status, Json(body)).into_response()
  }
}
