//! Caller identity and the owner check every Memory operation goes through.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// The authenticated user a request acts on behalf of.
///
/// Only produced by verifying a session token; handlers never build one from
/// request input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(Uuid);

impl Identity {
  pub fn new(user_id: Uuid) -> Self { Self(user_id) }

  pub fn user_id(&self) -> Uuid { self.0 }
}

impl std::fmt::Display for Identity {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    self.0.fmt(f)
  }
}

/// Fail with [`Error::Forbidden`] unless `identity` owns the resource.
pub fn authorize_owner(identity: Identity, owner_id: Uuid) -> Result<()> {
  if identity.0 == owner_id {
    Ok(())
  } else {
    Err(Error::Forbidden)
  }
}
