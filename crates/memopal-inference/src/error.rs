//! Error type for `memopal-inference`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Connection failure, timeout, or a request that could not be built.
  #[error("request to {path} failed: {source}")]
  Transport {
    path:   &'static str,
    #[source]
    source: reqwest::Error,
  },

  #[error("{path} answered {status}")]
  Status {
    path:   &'static str,
    status: reqwest::StatusCode,
  },

  /// The service answered 2xx but the body did not have the agreed shape.
  #[error("malformed reply from {path}: {reason}")]
  Malformed {
    path:   &'static str,
    reason: String,
  },
}

impl Error {
  pub fn is_timeout(&self) -> bool {
    matches!(self, Self::Transport { source, .. } if source.is_timeout())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
