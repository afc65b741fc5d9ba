//! Error type for `memopal-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain failure (not found, forbidden, validation, duplicate email).
  #[error(transparent)]
  Core(#[from] memopal_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl From<Error> for memopal_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(inner) => inner,
      other => {
        tracing::error!(error = %other, "store failure");
        memopal_core::Error::Store(Box::new(other))
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
